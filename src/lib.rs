//! quill-core: an interactive text-editing engine.
//!
//! The engine owns a rope-backed buffer paired with a per-character color
//! table, a cached line index derived from the text, caret and selection
//! state, animated viewport scrolling, undo/redo, and a background syntax
//! highlighter driven by tree-sitter. Rendering, fonts, and the window loop
//! stay outside; they talk to the engine through the [`session::EditorSession`]
//! facade and the collaborator traits in [`clipboard`] and [`metrics`].

pub mod buffer;
pub mod clipboard;
pub mod cursor;
pub mod error;
pub mod highlight;
pub mod history;
pub mod identity;
pub mod line_index;
pub mod metrics;
pub mod scroll;
pub mod session;

pub use buffer::{Buffer, SharedColors};
pub use clipboard::{Clipboard, MemoryClipboard, SystemClipboard};
pub use cursor::{Caret, Selection, SELECT_ALL_MAX};
pub use error::EngineError;
pub use highlight::{Color, HighlightScheduler, LexerKind, Theme, TokenStyle};
pub use history::{EditOp, History};
pub use identity::ActiveFile;
pub use line_index::LineIndex;
pub use metrics::{MonospaceMetrics, TextMetrics};
pub use scroll::ViewportScroller;
pub use session::EditorSession;
