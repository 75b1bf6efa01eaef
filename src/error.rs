//! Engine error taxonomy.
//!
//! Every variant is local and recoverable: operations clamp or no-op and the
//! error is logged. Nothing here is allowed to take down an interactive frame.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// An index or range fell outside the buffer. The operation is aborted
    /// with no mutation applied.
    #[error("range {start}..{end} is outside the buffer (len {len})")]
    InvalidRange {
        start: usize,
        end: usize,
        len: usize,
    },

    /// The color table length diverged from the text length. Resynchronized
    /// by resize+fill at the next edit or highlight boundary.
    #[error("color table holds {colors} entries for {text} characters")]
    ColorMismatch { colors: usize, text: usize },

    /// A tokenizer failed; previously committed colors are left untouched.
    #[error("tokenizer error: {0}")]
    Tokenize(String),

    /// An async highlight result no longer matches the live buffer or the
    /// open file and was discarded.
    #[error("stale highlight result discarded")]
    StaleResult,
}
