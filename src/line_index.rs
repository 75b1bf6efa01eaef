//! Line-start offset index.
//!
//! A pure function of the text, cached against a snapshot of it: `update`
//! no-ops when the text has not changed. `line_starts[0] == 0` and each later
//! entry is the offset immediately after a `\n`.

use ropey::Rope;

#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Snapshot of the text the table was built from (rope clones are cheap).
    snapshot: Rope,
    line_starts: Vec<usize>,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LineIndex {
    pub fn new() -> Self {
        Self {
            snapshot: Rope::new(),
            line_starts: vec![0],
        }
    }

    /// Rebuilds the table if `text` differs from the cached snapshot.
    /// Returns true if a recompute happened.
    pub fn update(&mut self, text: &Rope) -> bool {
        if self.snapshot == *text {
            return false;
        }
        self.snapshot = text.clone();
        self.line_starts.clear();
        self.line_starts.push(0);
        let mut offset = 0;
        for ch in text.chars() {
            offset += 1;
            if ch == '\n' {
                self.line_starts.push(offset);
            }
        }
        true
    }

    /// The raw ascending table of line-start offsets.
    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    /// Number of lines. Empty text has one line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Character length of the indexed text.
    pub fn len_chars(&self) -> usize {
        self.snapshot.len_chars()
    }

    /// Line containing `pos`: upper-bound search minus one. Valid for
    /// `pos == len` (end of buffer); out-of-range input is clamped.
    pub fn line_of(&self, pos: usize) -> usize {
        let pos = pos.min(self.snapshot.len_chars());
        self.line_starts.partition_point(|&start| start <= pos) - 1
    }

    /// Offset of the first character of `line`, clamped to the last line.
    pub fn line_start(&self, line: usize) -> usize {
        let line = line.min(self.line_starts.len() - 1);
        self.line_starts[line]
    }

    /// Offset just past the last character of `line` (before its newline).
    pub fn line_end(&self, line: usize) -> usize {
        let line = line.min(self.line_starts.len() - 1);
        match self.line_starts.get(line + 1) {
            Some(&next_start) => next_start - 1,
            None => self.snapshot.len_chars(),
        }
    }

    /// `(line, column)` of a character offset.
    pub fn line_col(&self, pos: usize) -> (usize, usize) {
        let pos = pos.min(self.snapshot.len_chars());
        let line = self.line_of(pos);
        (line, pos - self.line_starts[line])
    }

    /// Character offset of `(line, col)`, clamped to the line's length.
    pub fn pos_of(&self, line: usize, col: usize) -> usize {
        let start = self.line_start(line);
        let end = self.line_end(line.min(self.line_starts.len() - 1));
        (start + col).min(end)
    }
}
