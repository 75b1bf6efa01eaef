//! Caret position and selection handling.

use crate::buffer::Buffer;
use crate::line_index::LineIndex;

/// Hard cap on select-all, bounding worst-case selection-render cost on
/// huge files.
pub const SELECT_ALL_MAX: usize = 100_000;

/// A selection with raw, unordered endpoints. `anchor` is where the
/// selection started; `cursor` is where the caret is. The stored order is
/// never rewritten; `start`/`end` normalize on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub cursor: usize,
}

impl Selection {
    /// A collapsed selection at `pos`.
    pub fn at(pos: usize) -> Self {
        Self {
            anchor: pos,
            cursor: pos,
        }
    }

    pub fn has_selection(&self) -> bool {
        self.anchor != self.cursor
    }

    /// Normalized start (min of the raw endpoints).
    pub fn start(&self) -> usize {
        self.anchor.min(self.cursor)
    }

    /// Normalized end (max of the raw endpoints).
    pub fn end(&self) -> usize {
        self.anchor.max(self.cursor)
    }

    /// The normalized `[start, end)` range, or None when collapsed.
    pub fn selected_range(&self) -> Option<(usize, usize)> {
        if self.has_selection() {
            Some((self.start(), self.end()))
        } else {
            None
        }
    }

    pub fn collapse(&mut self) {
        self.anchor = self.cursor;
    }

    /// Moves the caret. Without `extend` the anchor follows (Idle state);
    /// with `extend` the anchor stays fixed (Selecting state).
    pub fn set_cursor(&mut self, pos: usize, extend: bool) {
        self.cursor = pos;
        if !extend {
            self.anchor = pos;
        }
    }
}

/// Caret state machine: a selection plus the sticky column reused on
/// vertical moves. A zero preferred column means "reseed from the current
/// line on the next vertical move".
#[derive(Debug, Clone, Default)]
pub struct Caret {
    pub selection: Selection,
    preferred_column: usize,
}

impl Caret {
    /// Current caret offset.
    pub fn position(&self) -> usize {
        self.selection.cursor
    }

    pub fn has_selection(&self) -> bool {
        self.selection.has_selection()
    }

    pub fn selected_range(&self) -> Option<(usize, usize)> {
        self.selection.selected_range()
    }

    /// Sticky column used by vertical movement.
    pub fn preferred_column(&self) -> usize {
        self.preferred_column
    }

    /// Plain click: collapse to `pos` and reseed the sticky column from the
    /// clicked line.
    pub fn click(&mut self, pos: usize, index: &LineIndex) {
        let pos = pos.min(index.len_chars());
        self.selection = Selection::at(pos);
        let (_, col) = index.line_col(pos);
        self.preferred_column = col;
    }

    /// Shift+click or drag: the anchor stays, the caret tracks `pos`.
    pub fn extend_to(&mut self, pos: usize, index: &LineIndex) {
        let pos = pos.min(index.len_chars());
        self.selection.set_cursor(pos, true);
        let (_, col) = index.line_col(pos);
        self.preferred_column = col;
    }

    pub fn collapse_selection(&mut self) {
        self.selection.collapse();
    }

    /// Selects from the start of the buffer up to the select-all cap.
    pub fn select_all(&mut self, len: usize) {
        self.selection.anchor = 0;
        self.selection.cursor = len.min(SELECT_ALL_MAX);
    }

    pub fn move_left(&mut self, extend: bool, index: &LineIndex) {
        if !extend && self.has_selection() {
            let start = self.selection.start();
            self.selection = Selection::at(start);
        } else if self.position() > 0 {
            self.selection.set_cursor(self.position() - 1, extend);
        }
        self.reseed_column(index);
    }

    pub fn move_right(&mut self, extend: bool, index: &LineIndex) {
        if !extend && self.has_selection() {
            let end = self.selection.end();
            self.selection = Selection::at(end);
        } else if self.position() < index.len_chars() {
            self.selection.set_cursor(self.position() + 1, extend);
        }
        self.reseed_column(index);
    }

    pub fn move_up(&mut self, extend: bool, index: &LineIndex) {
        self.move_vertical(-1, extend, index);
    }

    pub fn move_down(&mut self, extend: bool, index: &LineIndex) {
        self.move_vertical(1, extend, index);
    }

    /// Moves by `delta` lines keeping the sticky column, clamped to the
    /// target line's length. Hitting the first/last line clamps to the
    /// buffer start/end.
    pub fn move_vertical(&mut self, delta: isize, extend: bool, index: &LineIndex) {
        let (line, col) = index.line_col(self.position());
        if self.preferred_column == 0 {
            self.preferred_column = col;
        }
        let target = line as isize + delta;
        if target < 0 {
            self.selection.set_cursor(0, extend);
            self.preferred_column = 0;
            return;
        }
        let target = target as usize;
        if target >= index.line_count() {
            self.selection.set_cursor(index.len_chars(), extend);
            return;
        }
        let start = index.line_start(target);
        let end = index.line_end(target);
        let pos = (start + self.preferred_column).min(end);
        self.selection.set_cursor(pos, extend);
    }

    pub fn move_word_left(&mut self, extend: bool, buffer: &Buffer, index: &LineIndex) {
        let pos = buffer.prev_word_boundary(self.position());
        self.selection.set_cursor(pos, extend);
        self.reseed_column(index);
    }

    pub fn move_word_right(&mut self, extend: bool, buffer: &Buffer, index: &LineIndex) {
        let pos = buffer.next_word_boundary(self.position());
        self.selection.set_cursor(pos, extend);
        self.reseed_column(index);
    }

    pub fn move_to_line_start(&mut self, extend: bool, index: &LineIndex) {
        let line = index.line_of(self.position());
        self.selection.set_cursor(index.line_start(line), extend);
        self.preferred_column = 0;
    }

    /// Smart Home: toggles between the first non-whitespace character and
    /// the line start.
    pub fn move_to_line_start_smart(&mut self, extend: bool, buffer: &Buffer, index: &LineIndex) {
        let line = index.line_of(self.position());
        let start = index.line_start(line);
        let end = index.line_end(line);
        match buffer.first_non_whitespace_in(start, end) {
            Some(first_non_ws) => {
                let pos = if self.position() == first_non_ws {
                    start
                } else {
                    first_non_ws
                };
                self.selection.set_cursor(pos, extend);
            }
            None => self.selection.set_cursor(start, extend),
        }
        self.reseed_column(index);
    }

    pub fn move_to_line_end(&mut self, extend: bool, index: &LineIndex) {
        let line = index.line_of(self.position());
        self.selection.set_cursor(index.line_end(line), extend);
        self.reseed_column(index);
    }

    pub fn move_to_buffer_start(&mut self, extend: bool) {
        self.selection.set_cursor(0, extend);
        self.preferred_column = 0;
    }

    pub fn move_to_buffer_end(&mut self, extend: bool, index: &LineIndex) {
        self.selection.set_cursor(index.len_chars(), extend);
    }

    pub fn move_page(&mut self, lines: isize, extend: bool, index: &LineIndex) {
        let step = lines.unsigned_abs().max(1) as isize;
        self.move_vertical(if lines < 0 { -step } else { step }, extend, index);
    }

    /// Clamps both endpoints to the buffer length.
    pub fn clamp_to(&mut self, len: usize) {
        self.selection.cursor = self.selection.cursor.min(len);
        self.selection.anchor = self.selection.anchor.min(len);
    }

    fn reseed_column(&mut self, index: &LineIndex) {
        let (_, col) = index.line_col(self.position());
        self.preferred_column = col;
    }
}
