//! Text buffer with a parallel per-character color table.
//!
//! The text lives in a rope; the colors live behind a mutex shared with the
//! background highlighter. After every committed operation the two stay in
//! lockstep: `colors.len() == text.len_chars()`.

use crate::error::EngineError;
use crate::highlight::Color;
use ropey::Rope;
use std::sync::{Arc, Mutex, MutexGuard};

/// Color table shared between the interaction thread and the background
/// highlight worker. All writes happen under this mutex.
pub type SharedColors = Arc<Mutex<Vec<Color>>>;

/// Locks a shared color table, recovering from a poisoned lock.
pub(crate) fn lock_colors(colors: &SharedColors) -> MutexGuard<'_, Vec<Color>> {
    colors.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// A text buffer plus its per-character highlight colors.
#[derive(Debug, Clone)]
pub struct Buffer {
    rope: Rope,
    colors: SharedColors,
    default_color: Color,
}

impl Buffer {
    /// Creates an empty buffer.
    pub fn new(default_color: Color) -> Self {
        Self {
            rope: Rope::new(),
            colors: Arc::new(Mutex::new(Vec::new())),
            default_color,
        }
    }

    /// Creates a buffer from a string, with every character default-colored.
    pub fn from_str(text: &str, default_color: Color) -> Self {
        let rope = Rope::from_str(text);
        let colors = vec![default_color; rope.len_chars()];
        Self {
            rope,
            colors: Arc::new(Mutex::new(colors)),
            default_color,
        }
    }

    /// Total number of characters.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// The underlying rope, for index building and highlight snapshots.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// A handle to the shared color table.
    pub fn colors(&self) -> SharedColors {
        Arc::clone(&self.colors)
    }

    /// Current color table length.
    pub fn colors_len(&self) -> usize {
        lock_colors(&self.colors).len()
    }

    /// The color assigned to freshly inserted characters.
    pub fn default_color(&self) -> Color {
        self.default_color
    }

    /// Returns the character at the given index, if it exists.
    pub fn char_at(&self, char_idx: usize) -> Option<char> {
        if char_idx < self.rope.len_chars() {
            Some(self.rope.char(char_idx))
        } else {
            None
        }
    }

    /// Returns the text in `[start, end)` as a string, clamped to the buffer.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let len = self.rope.len_chars();
        let end = end.min(len);
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }

    /// Returns the entire buffer as a string.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Inserts `text` at the given character index, along with one
    /// default-colored entry per inserted character.
    pub fn insert(&mut self, char_idx: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let idx = char_idx.min(self.rope.len_chars());
        self.rope.insert(idx, text);
        let n = text.chars().count();
        let mut colors = lock_colors(&self.colors);
        let at = idx.min(colors.len());
        colors.splice(at..at, std::iter::repeat(self.default_color).take(n));
    }

    /// Removes the characters and color entries in `[start, end)`.
    /// Out-of-range input is clamped; an empty range is a no-op.
    pub fn remove(&mut self, start: usize, end: usize) {
        let len = self.rope.len_chars();
        let end = end.min(len);
        let start = start.min(end);
        if start == end {
            return;
        }
        self.rope.remove(start..end);
        let mut colors = lock_colors(&self.colors);
        let ce = end.min(colors.len());
        let cs = start.min(ce);
        colors.drain(cs..ce);
    }

    /// Removes one character at `text_idx` and one color entry at
    /// `color_idx`. The two indices are allowed to differ: the lengths stay
    /// aligned either way and the next highlight pass rewrites the colors.
    pub fn remove_char(&mut self, text_idx: usize, color_idx: usize) {
        if text_idx >= self.rope.len_chars() {
            return;
        }
        self.rope.remove(text_idx..text_idx + 1);
        let mut colors = lock_colors(&self.colors);
        if colors.is_empty() {
            return;
        }
        let at = color_idx.min(colors.len() - 1);
        colors.remove(at);
    }

    /// Forces `colors.len() == text.len_chars()`, filling any growth with the
    /// default color. Returns the mismatch that was repaired, if any.
    pub fn sync_colors(&mut self) -> Option<EngineError> {
        let text_len = self.rope.len_chars();
        let mut colors = lock_colors(&self.colors);
        if colors.len() == text_len {
            return None;
        }
        let err = EngineError::ColorMismatch {
            colors: colors.len(),
            text: text_len,
        };
        log::warn!("resynchronizing colors: {err}");
        colors.resize(text_len, self.default_color);
        Some(err)
    }

    /// Next word boundary after `pos`: skips the current word run, then
    /// whitespace, landing at the start of the next token. At the end of the
    /// buffer this wraps around to offset 0.
    pub fn next_word_boundary(&self, pos: usize) -> usize {
        let len = self.rope.len_chars();
        if pos >= len {
            return 0;
        }
        let mut i = pos;
        while i < len && is_word_char(self.rope.char(i)) {
            i += 1;
        }
        if i == pos && !self.rope.char(i).is_whitespace() {
            i += 1;
        }
        while i < len && self.rope.char(i).is_whitespace() {
            i += 1;
        }
        i
    }

    /// Previous word boundary before `pos`: skips whitespace, then the word
    /// run, landing at the start of the previous token. At the start of the
    /// buffer this wraps around to the end.
    pub fn prev_word_boundary(&self, pos: usize) -> usize {
        let len = self.rope.len_chars();
        if pos == 0 {
            return len;
        }
        let mut i = pos.min(len);
        while i > 0 && self.rope.char(i - 1).is_whitespace() {
            i -= 1;
        }
        let run_end = i;
        while i > 0 && is_word_char(self.rope.char(i - 1)) {
            i -= 1;
        }
        if i == run_end && i > 0 {
            i -= 1;
        }
        i
    }

    /// First non-whitespace offset in `[start, end)`, if any.
    pub fn first_non_whitespace_in(&self, start: usize, end: usize) -> Option<usize> {
        let len = self.rope.len_chars();
        let end = end.min(len);
        let start = start.min(end);
        (start..end).find(|&i| !self.rope.char(i).is_whitespace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: Color = [1.0, 1.0, 1.0, 1.0];

    #[test]
    fn new_buffer_is_empty() {
        let buf = Buffer::new(DEFAULT);
        assert!(buf.is_empty());
        assert_eq!(buf.colors_len(), 0);
    }

    #[test]
    fn insert_keeps_colors_in_lockstep() {
        let mut buf = Buffer::new(DEFAULT);
        buf.insert(0, "hello");
        buf.insert(5, " world");
        assert_eq!(buf.text(), "hello world");
        assert_eq!(buf.colors_len(), buf.len_chars());
    }

    #[test]
    fn remove_keeps_colors_in_lockstep() {
        let mut buf = Buffer::from_str("hello world", DEFAULT);
        buf.remove(5, 11);
        assert_eq!(buf.text(), "hello");
        assert_eq!(buf.colors_len(), 5);
        // Clamped range
        buf.remove(3, 99);
        assert_eq!(buf.text(), "hel");
        assert_eq!(buf.colors_len(), 3);
    }

    #[test]
    fn remove_char_with_split_indices_keeps_lengths_equal() {
        let mut buf = Buffer::from_str("abcd", DEFAULT);
        buf.remove_char(2, 1);
        assert_eq!(buf.text(), "abd");
        assert_eq!(buf.colors_len(), 3);
    }

    #[test]
    fn sync_colors_repairs_mismatch() {
        let mut buf = Buffer::from_str("abc", DEFAULT);
        lock_colors(&buf.colors()).pop();
        assert_eq!(buf.colors_len(), 2);
        assert!(buf.sync_colors().is_some());
        assert_eq!(buf.colors_len(), 3);
        assert!(buf.sync_colors().is_none());
    }

    #[test]
    fn word_boundaries() {
        let buf = Buffer::from_str("foo bar_baz  qux", DEFAULT);
        assert_eq!(buf.next_word_boundary(0), 4);
        assert_eq!(buf.next_word_boundary(4), 13);
        assert_eq!(buf.prev_word_boundary(13), 4);
        assert_eq!(buf.prev_word_boundary(4), 0);
    }

    #[test]
    fn word_navigation_wraps_at_buffer_edges() {
        let buf = Buffer::from_str("ab cd", DEFAULT);
        assert_eq!(buf.next_word_boundary(5), 0);
        assert_eq!(buf.prev_word_boundary(0), 5);
    }

    #[test]
    fn word_boundary_over_punctuation_makes_progress() {
        let buf = Buffer::from_str("a.(b)", DEFAULT);
        let mut pos = 0;
        for _ in 0..16 {
            let next = buf.next_word_boundary(pos);
            if next == 0 {
                return; // wrapped, reached the end
            }
            assert!(next > pos);
            pos = next;
        }
        panic!("word-forward never reached the end");
    }

    #[test]
    fn first_non_whitespace() {
        let buf = Buffer::from_str("   x", DEFAULT);
        assert_eq!(buf.first_non_whitespace_in(0, 4), Some(3));
        assert_eq!(buf.first_non_whitespace_in(0, 3), None);
    }
}
