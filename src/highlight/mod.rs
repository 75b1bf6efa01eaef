//! Syntax highlighting: themes, the closed lexer set, and the background
//! scheduler that keeps the per-character color table up to date.

pub mod lexer;
pub mod scheduler;
pub mod theme;

pub use lexer::LexerKind;
pub use scheduler::{CancelToken, HighlightScheduler, MAX_HIGHLIGHT_BYTES};
pub use theme::{Color, Theme, TokenStyle};
