//! The editing session: one buffer plus the collaborators that make it
//! interactive.
//!
//! Every mutation runs the same commit discipline: bracket the edit in the
//! history, apply the paired text/color change, rebuild the line index,
//! place the caret, then trigger a highlight pass and keep the caret inside
//! the viewport margins.

use crate::buffer::Buffer;
use crate::clipboard::{Clipboard, MemoryClipboard};
use crate::cursor::{Caret, Selection};
use crate::highlight::{HighlightScheduler, LexerKind, Theme};
use crate::history::{EditOp, History};
use crate::identity::ActiveFile;
use crate::line_index::LineIndex;
use crate::metrics::{MonospaceMetrics, TextMetrics};
use crate::scroll::ViewportScroller;
use std::path::Path;

/// Spaces treated as one indentation level when no tab is present.
const OUTDENT_SPACES: usize = 4;

pub struct EditorSession {
    buffer: Buffer,
    line_index: LineIndex,
    caret: Caret,
    scroller: ViewportScroller,
    scheduler: HighlightScheduler,
    history: History,
    clipboard: Box<dyn Clipboard>,
    metrics: Box<dyn TextMetrics>,
    active_file: ActiveFile,
    lexer: LexerKind,
    /// Absorbs the Enter keyup that confirmed a jump dialog, so it does not
    /// land in the buffer as a newline.
    suppress_newline: bool,
    modified: bool,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        let theme = Theme::dark();
        let buffer = Buffer::new(theme.foreground);
        Self {
            buffer,
            line_index: LineIndex::new(),
            caret: Caret::default(),
            scroller: ViewportScroller::new(800.0, 600.0),
            scheduler: HighlightScheduler::new(theme),
            history: History::default(),
            clipboard: Box::new(MemoryClipboard::default()),
            metrics: Box::new(MonospaceMetrics::default()),
            active_file: ActiveFile::new(),
            lexer: LexerKind::PlainText,
            suppress_newline: false,
            modified: false,
        }
    }

    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.clipboard = clipboard;
    }

    pub fn set_metrics(&mut self, metrics: Box<dyn TextMetrics>) {
        self.metrics = metrics;
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.scroller.set_viewport(width, height);
    }

    /// Replaces the session contents with a newly opened document. The file
    /// identity stamp is bumped first so any in-flight highlight of the old
    /// document is discarded on completion.
    pub fn open(&mut self, content: &str, path: Option<&Path>) {
        self.active_file.open(path);
        self.lexer = path.map(LexerKind::from_path).unwrap_or_default();
        let theme = self.scheduler.theme().clone();
        self.buffer = Buffer::from_str(content, theme.foreground);
        self.line_index.update(self.buffer.rope());
        self.caret = Caret::default();
        self.scroller.jump_to(0.0, 0.0);
        self.scroller.snap();
        self.history.clear();
        self.modified = false;
        self.suppress_newline = false;
        self.trigger_highlight(None);
    }

    // --- Editing ---------------------------------------------------------

    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.history.begin(self.caret.selection);
        self.erase_selection();
        let at = self.caret.position();
        self.buffer.insert(at, text);
        self.history.record(EditOp::Insert {
            at,
            text: text.to_string(),
        });
        self.refresh_index();
        self.caret.click(at + text.chars().count(), &self.line_index);
        self.finish_edit(None);
    }

    pub fn insert_newline(&mut self) {
        if self.suppress_newline {
            self.suppress_newline = false;
            return;
        }
        self.insert_text("\n");
    }

    /// Swallows the next `insert_newline`. Set when a jump dialog is
    /// confirmed with Enter while the buffer already has focus again.
    pub fn suppress_next_newline(&mut self) {
        self.suppress_newline = true;
    }

    pub fn backspace(&mut self) {
        self.history.begin(self.caret.selection);
        if self.erase_selection() {
            self.refresh_index();
            self.finish_edit(None);
            return;
        }
        let pos = self.caret.position();
        if pos == 0 {
            self.history.commit(self.caret.selection);
            return;
        }
        let removed = self.buffer.slice(pos - 1, pos);
        self.buffer.remove_char(pos - 1, pos - 1);
        self.history.record(EditOp::Delete {
            at: pos - 1,
            text: removed,
        });
        self.refresh_index();
        self.caret.click(pos - 1, &self.line_index);
        self.finish_edit(None);
    }

    pub fn delete_forward(&mut self) {
        self.history.begin(self.caret.selection);
        if self.erase_selection() {
            self.refresh_index();
            self.finish_edit(None);
            return;
        }
        let pos = self.caret.position();
        if pos >= self.buffer.len_chars() {
            self.history.commit(self.caret.selection);
            return;
        }
        let removed = self.buffer.slice(pos, pos + 1);
        // The color entry removed sits one slot behind the erased character;
        // lengths stay aligned and the highlight pass repaints the rest.
        self.buffer.remove_char(pos, pos.saturating_sub(1));
        self.history.record(EditOp::Delete { at: pos, text: removed });
        self.refresh_index();
        self.caret.click(pos, &self.line_index);
        self.finish_edit(None);
    }

    /// Tab: a multi-line selection indents every touched line. A single-line
    /// selection is ignored as a range: one tab lands at the caret, the
    /// selected text stays, and the selection collapses.
    pub fn indent(&mut self) {
        let Some((start, end)) = self.caret.selected_range() else {
            self.insert_text("\t");
            return;
        };
        let first = self.line_index.line_of(start);
        let last = self.line_index.line_of(end);
        if first == last {
            self.history.begin(self.caret.selection);
            let at = self.caret.position();
            self.buffer.insert(at, "\t");
            self.history.record(EditOp::Insert {
                at,
                text: "\t".to_string(),
            });
            self.refresh_index();
            self.caret.click(at + 1, &self.line_index);
            self.finish_edit(None);
            return;
        }

        self.history.begin(self.caret.selection);
        let mut selection = self.caret.selection;
        let mut shift = 0;
        for line in first..=last {
            let at = self.line_index.line_start(line) + shift;
            self.buffer.insert(at, "\t");
            self.history.record(EditOp::Insert {
                at,
                text: "\t".to_string(),
            });
            if selection.anchor >= at {
                selection.anchor += 1;
            }
            if selection.cursor >= at {
                selection.cursor += 1;
            }
            shift += 1;
        }
        self.refresh_index();
        self.caret.selection = selection;
        self.caret.clamp_to(self.buffer.len_chars());
        self.finish_edit(None);
    }

    /// Shift+Tab: removes one leading tab, or up to four leading spaces,
    /// from every line the selection touches.
    pub fn outdent(&mut self) {
        let (start, end) = self
            .caret
            .selected_range()
            .unwrap_or((self.caret.position(), self.caret.position()));
        let first = self.line_index.line_of(start);
        let last = self.line_index.line_of(end);

        self.history.begin(self.caret.selection);
        let mut selection = self.caret.selection;
        let mut shift = 0;
        let mut changed = false;
        for line in first..=last {
            let line_start = self.line_index.line_start(line) - shift;
            let line_end = self.line_index.line_end(line) - shift;
            let removed = leading_indent_run(&self.buffer, line_start, line_end);
            if removed == 0 {
                continue;
            }
            let text = self.buffer.slice(line_start, line_start + removed);
            self.buffer.remove(line_start, line_start + removed);
            self.history.record(EditOp::Delete {
                at: line_start,
                text,
            });
            selection.anchor = shift_after_removal(selection.anchor, line_start, removed);
            selection.cursor = shift_after_removal(selection.cursor, line_start, removed);
            shift += removed;
            changed = true;
        }
        if !changed {
            self.history.commit(self.caret.selection);
            return;
        }
        self.refresh_index();
        self.caret.selection = selection;
        self.caret.clamp_to(self.buffer.len_chars());
        self.finish_edit(None);
    }

    // --- Clipboard -------------------------------------------------------

    pub fn copy(&mut self) {
        if let Some((start, end)) = self.caret.selected_range() {
            self.clipboard.set_text(&self.buffer.slice(start, end));
        }
    }

    pub fn cut(&mut self) {
        if !self.caret.has_selection() {
            return;
        }
        self.copy();
        self.history.begin(self.caret.selection);
        self.erase_selection();
        self.refresh_index();
        self.finish_edit(None);
    }

    pub fn paste(&mut self) {
        let Some(text) = self.clipboard.get_text() else {
            return;
        };
        self.history.begin(self.caret.selection);
        self.erase_selection();
        let at = self.caret.position();
        self.buffer.insert(at, &text);
        let n = text.chars().count();
        self.history.record(EditOp::Insert { at, text });
        self.refresh_index();
        self.caret.click(at + n, &self.line_index);
        self.finish_edit(Some((at, at + n)));
    }

    // --- Undo/redo -------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) {
        if let Some((ops, selection)) = self.history.undo() {
            self.apply_history_ops(ops, selection);
        }
    }

    pub fn redo(&mut self) {
        if let Some((ops, selection)) = self.history.redo() {
            self.apply_history_ops(ops, selection);
        }
    }

    fn apply_history_ops(&mut self, ops: Vec<EditOp>, selection: Selection) {
        for op in ops {
            match op {
                EditOp::Insert { at, text } => self.buffer.insert(at, &text),
                EditOp::Delete { at, text } => {
                    self.buffer.remove(at, at + text.chars().count())
                }
            }
        }
        self.refresh_index();
        self.caret.selection = selection;
        self.caret.clamp_to(self.buffer.len_chars());
        self.modified = true;
        self.trigger_highlight(None);
        self.scroll_to_caret();
    }

    // --- Caret movement --------------------------------------------------

    pub fn move_left(&mut self, extend: bool) {
        self.caret.move_left(extend, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn move_right(&mut self, extend: bool) {
        self.caret.move_right(extend, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn move_up(&mut self, extend: bool) {
        self.caret.move_up(extend, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn move_down(&mut self, extend: bool) {
        self.caret.move_down(extend, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn move_word_left(&mut self, extend: bool) {
        self.caret.move_word_left(extend, &self.buffer, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn move_word_right(&mut self, extend: bool) {
        self.caret.move_word_right(extend, &self.buffer, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn move_line_start(&mut self, extend: bool) {
        self.caret
            .move_to_line_start_smart(extend, &self.buffer, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn move_line_end(&mut self, extend: bool) {
        self.caret.move_to_line_end(extend, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn move_buffer_start(&mut self, extend: bool) {
        self.caret.move_to_buffer_start(extend);
        self.scroll_to_caret();
    }

    pub fn move_buffer_end(&mut self, extend: bool) {
        self.caret.move_to_buffer_end(extend, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn move_page_up(&mut self, extend: bool) {
        let lines = self.visible_lines() as isize;
        self.caret.move_page(-lines, extend, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn move_page_down(&mut self, extend: bool) {
        let lines = self.visible_lines() as isize;
        self.caret.move_page(lines, extend, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn select_all(&mut self) {
        self.caret.select_all(self.buffer.len_chars());
    }

    // --- Pointer ---------------------------------------------------------

    /// Maps viewport pixel coordinates to a character offset. Clicks past
    /// the last line land on it; the horizontal midpoint of a glyph decides
    /// which side the caret takes.
    pub fn hit_test(&self, px: f32, py: f32) -> usize {
        let (ox, oy) = self.scroller.offset();
        let x = px + ox;
        let y = py + oy;
        let line_height = self.metrics.line_height();
        let line = ((y / line_height).floor().max(0.0) as usize)
            .min(self.line_index.line_count() - 1);
        let start = self.line_index.line_start(line);
        let end = self.line_index.line_end(line);
        let mut cursor_x = 0.0;
        for pos in start..end {
            let Some(ch) = self.buffer.char_at(pos) else {
                return pos;
            };
            let advance = self.metrics.advance(ch);
            if x < cursor_x + advance / 2.0 {
                return pos;
            }
            cursor_x += advance;
        }
        end
    }

    pub fn click(&mut self, px: f32, py: f32) {
        let pos = self.hit_test(px, py);
        self.caret.click(pos, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn shift_click(&mut self, px: f32, py: f32) {
        let pos = self.hit_test(px, py);
        self.caret.extend_to(pos, &self.line_index);
        self.scroll_to_caret();
    }

    pub fn drag_to(&mut self, px: f32, py: f32) {
        self.shift_click(px, py);
    }

    // --- Scrolling and frames --------------------------------------------

    /// Pixel position of the caret's top-left corner, in content space.
    pub fn caret_pixel_pos(&self) -> (f32, f32) {
        let pos = self.caret.position();
        let line = self.line_index.line_of(pos);
        let y = line as f32 * self.metrics.line_height();
        let mut x = 0.0;
        for i in self.line_index.line_start(line)..pos {
            if let Some(ch) = self.buffer.char_at(i) {
                x += self.metrics.advance(ch);
            }
        }
        (x, y)
    }

    /// Jumps the viewport to a one-based line number and places the caret at
    /// its start. The confirming Enter is absorbed.
    pub fn jump_to_line(&mut self, line_number: usize) {
        let line = line_number.saturating_sub(1).min(self.line_index.line_count() - 1);
        self.caret.click(self.line_index.line_start(line), &self.line_index);
        self.scroller
            .jump_to(0.0, line as f32 * self.metrics.line_height());
        self.suppress_newline = true;
    }

    /// Advances scroll animation by `dt` seconds. Returns true while another
    /// frame is needed. Newline suppression lasts one frame: an Enter that
    /// arrives after the jump's frame has ticked is a real Enter.
    pub fn update_frame(&mut self, dt: f32) -> bool {
        self.suppress_newline = false;
        self.scroller.tick(dt)
    }

    pub fn scroll_offset(&self) -> (f32, f32) {
        self.scroller.offset()
    }

    pub fn is_scrolling(&self) -> bool {
        self.scroller.is_animating()
    }

    /// Blocks until any in-flight highlight pass lands.
    pub fn flush_highlight(&mut self) {
        self.scheduler.flush();
    }

    // --- Accessors -------------------------------------------------------

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn selection(&self) -> Selection {
        self.caret.selection
    }

    pub fn caret_position(&self) -> usize {
        self.caret.position()
    }

    pub fn lexer(&self) -> LexerKind {
        self.lexer
    }

    pub fn theme(&self) -> &Theme {
        self.scheduler.theme()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    // --- Internals -------------------------------------------------------

    /// Deletes the selected range, recording it, and collapses the caret to
    /// the range start. Returns whether anything was removed.
    fn erase_selection(&mut self) -> bool {
        let Some((start, end)) = self.caret.selected_range() else {
            return false;
        };
        let text = self.buffer.slice(start, end);
        self.buffer.remove(start, end);
        self.history.record(EditOp::Delete { at: start, text });
        self.line_index.update(self.buffer.rope());
        self.caret.click(start, &self.line_index);
        true
    }

    fn refresh_index(&mut self) {
        self.buffer.sync_colors();
        self.line_index.update(self.buffer.rope());
    }

    /// The common tail of every mutation: commit the history bracket, mark
    /// the document dirty, repaint, and keep the caret visible.
    fn finish_edit(&mut self, span: Option<(usize, usize)>) {
        self.history.commit(self.caret.selection);
        self.modified = true;
        self.trigger_highlight(span);
        self.scroll_to_caret();
    }

    fn trigger_highlight(&mut self, span: Option<(usize, usize)>) {
        let len = self.buffer.len_chars();
        let (start, end) = span
            .map(|(s, e)| (s.min(len), e.min(len)))
            .unwrap_or((0, len));
        self.scheduler.trigger(
            self.buffer.rope(),
            &self.buffer.colors(),
            start,
            end,
            self.lexer,
            &self.active_file,
        );
    }

    fn scroll_to_caret(&mut self) {
        let (x, y) = self.caret_pixel_pos();
        self.scroller.ensure_visible(x, y, self.metrics.line_height());
    }

    fn visible_lines(&self) -> usize {
        let (_, height) = self.scroller.viewport();
        ((height / self.metrics.line_height()) as usize).max(1)
    }
}

/// Length of the indent run to strip from one line: a single leading tab,
/// or up to four leading spaces. Tab wins when both are present.
fn leading_indent_run(buffer: &Buffer, line_start: usize, line_end: usize) -> usize {
    match buffer.char_at(line_start) {
        Some('\t') => 1,
        Some(' ') => {
            let mut n = 1;
            while n < OUTDENT_SPACES
                && line_start + n < line_end
                && buffer.char_at(line_start + n) == Some(' ')
            {
                n += 1;
            }
            n
        }
        _ => 0,
    }
}

/// Shifts a selection endpoint left after `removed` characters were deleted
/// at `at`. Endpoints inside the removed run clamp to its start.
fn shift_after_removal(endpoint: usize, at: usize, removed: usize) -> usize {
    if endpoint >= at + removed {
        endpoint - removed
    } else if endpoint > at {
        at
    } else {
        endpoint
    }
}
