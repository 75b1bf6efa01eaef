//! Undo/redo collaborator.
//!
//! The session reports every committed edit here as insert/delete records
//! carrying the changed range and the affected text. `undo`/`redo` hand back
//! the operations to replay plus the selection to restore; the session
//! applies them and resynchronizes colors itself.

use crate::cursor::Selection;
use std::time::{Duration, Instant};

/// Time window for coalescing consecutive single-character edits.
const COALESCE_WINDOW: Duration = Duration::from_millis(300);

/// Default maximum undo depth.
const DEFAULT_MAX_DEPTH: usize = 1000;

/// One recorded edit. `at` is the changed range's start; the changed range
/// is `[at, at + text.chars().count())`.
#[derive(Debug, Clone)]
pub enum EditOp {
    Insert { at: usize, text: String },
    Delete { at: usize, text: String },
}

impl EditOp {
    /// The inverse operation, for undo.
    pub fn inverse(&self) -> EditOp {
        match self {
            EditOp::Insert { at, text } => EditOp::Delete {
                at: *at,
                text: text.clone(),
            },
            EditOp::Delete { at, text } => EditOp::Insert {
                at: *at,
                text: text.clone(),
            },
        }
    }

    /// The `[start, end)` range this operation touched.
    pub fn changed_range(&self) -> (usize, usize) {
        let (at, text) = match self {
            EditOp::Insert { at, text } | EditOp::Delete { at, text } => (*at, text),
        };
        (at, at + text.chars().count())
    }
}

/// Operations committed together, undone together.
#[derive(Debug, Clone)]
struct EditGroup {
    ops: Vec<EditOp>,
    selection_before: Selection,
    selection_after: Selection,
    committed_at: Instant,
}

impl EditGroup {
    /// Whether `op` continues this group closely enough to merge into it:
    /// consecutive single-character typing (not across a newline) or
    /// consecutive backspaces, within the coalesce window.
    fn accepts(&self, op: &EditOp, now: Instant) -> bool {
        if now.duration_since(self.committed_at) > COALESCE_WINDOW {
            return false;
        }
        let Some(last) = self.ops.last() else {
            return false;
        };
        match (last, op) {
            (
                EditOp::Insert { at, text },
                EditOp::Insert {
                    at: next_at,
                    text: next_text,
                },
            ) => {
                text.chars().count() == 1
                    && next_text.chars().count() == 1
                    && *next_at == at + 1
                    && !text.ends_with('\n')
            }
            (
                EditOp::Delete { at, .. },
                EditOp::Delete {
                    at: next_at,
                    text: next_text,
                },
            ) => next_text.chars().count() == 1 && *next_at + 1 == *at,
            _ => false,
        }
    }
}

/// Bounded undo/redo stacks with single-character coalescing.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<EditGroup>,
    redo_stack: Vec<EditGroup>,
    pending: Option<(Vec<EditOp>, Selection)>,
    max_depth: usize,
    coalesce: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            pending: None,
            max_depth: max_depth.max(1),
            coalesce: true,
        }
    }

    pub fn set_coalesce_enabled(&mut self, enabled: bool) {
        self.coalesce = enabled;
    }

    /// Opens a new edit group. An unfinished one is committed first.
    pub fn begin(&mut self, selection_before: Selection) {
        if self.pending.is_some() {
            self.commit(selection_before);
        }
        self.pending = Some((Vec::new(), selection_before));
    }

    /// Records one operation of the current edit. The operation carries the
    /// changed `[start, end)` range via its position and text.
    pub fn record(&mut self, op: EditOp) {
        if let Some((ops, _)) = &mut self.pending {
            ops.push(op);
        } else {
            log::warn!("edit recorded outside a begin/commit bracket; dropped");
        }
    }

    /// Closes the current edit group, merging it into the previous group
    /// when it continues a typing or backspace run.
    pub fn commit(&mut self, selection_after: Selection) {
        let Some((ops, selection_before)) = self.pending.take() else {
            return;
        };
        if ops.is_empty() {
            return;
        }
        let now = Instant::now();
        self.redo_stack.clear();

        if self.coalesce && ops.len() == 1 {
            if let Some(last) = self.undo_stack.last_mut() {
                if last.accepts(&ops[0], now) {
                    last.ops.extend(ops);
                    last.selection_after = selection_after;
                    last.committed_at = now;
                    return;
                }
            }
        }

        self.undo_stack.push(EditGroup {
            ops,
            selection_before,
            selection_after,
            committed_at: now,
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pops the most recent group: returns its inverse operations (in
    /// reverse order) and the selection to restore.
    pub fn undo(&mut self) -> Option<(Vec<EditOp>, Selection)> {
        let group = self.undo_stack.pop()?;
        let ops: Vec<EditOp> = group.ops.iter().rev().map(EditOp::inverse).collect();
        let selection = group.selection_before;
        self.redo_stack.push(group);
        Some((ops, selection))
    }

    /// Pops the most recently undone group: returns its operations to
    /// replay and the selection to restore.
    pub fn redo(&mut self) -> Option<(Vec<EditOp>, Selection)> {
        let group = self.redo_stack.pop()?;
        let ops = group.ops.clone();
        let selection = group.selection_after;
        self.undo_stack.push(group);
        Some((ops, selection))
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(at: usize, text: &str) -> EditOp {
        EditOp::Insert {
            at,
            text: text.to_string(),
        }
    }

    #[test]
    fn undo_returns_inverse_ops_in_reverse_order() {
        let mut history = History::default();
        history.begin(Selection::at(0));
        history.record(insert(0, "ab"));
        history.record(EditOp::Delete {
            at: 2,
            text: "x".to_string(),
        });
        history.commit(Selection::at(2));

        let (ops, selection) = history.undo().unwrap();
        assert_eq!(selection, Selection::at(0));
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], EditOp::Insert { at: 2, text } if text == "x"));
        assert!(matches!(&ops[1], EditOp::Delete { at: 0, text } if text == "ab"));
    }

    #[test]
    fn redo_replays_original_ops() {
        let mut history = History::default();
        history.begin(Selection::at(0));
        history.record(insert(0, "hello"));
        history.commit(Selection::at(5));

        history.undo().unwrap();
        let (ops, selection) = history.redo().unwrap();
        assert_eq!(selection, Selection::at(5));
        assert!(matches!(&ops[0], EditOp::Insert { at: 0, text } if text == "hello"));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut history = History::default();
        history.begin(Selection::at(0));
        history.record(insert(0, "a"));
        history.commit(Selection::at(1));
        history.undo();
        assert!(history.can_redo());

        history.begin(Selection::at(0));
        history.record(insert(0, "b"));
        history.commit(Selection::at(1));
        assert!(!history.can_redo());
    }

    #[test]
    fn consecutive_single_chars_coalesce_into_one_group() {
        let mut history = History::default();
        for (i, ch) in ["a", "b", "c"].iter().enumerate() {
            history.begin(Selection::at(i));
            history.record(insert(i, ch));
            history.commit(Selection::at(i + 1));
        }
        let (ops, _) = history.undo().unwrap();
        assert_eq!(ops.len(), 3);
        assert!(!history.can_undo());
    }

    #[test]
    fn coalescing_breaks_after_newline() {
        let mut history = History::default();
        history.begin(Selection::at(0));
        history.record(insert(0, "\n"));
        history.commit(Selection::at(1));

        history.begin(Selection::at(1));
        history.record(insert(1, "b"));
        history.commit(Selection::at(2));

        let (ops, _) = history.undo().unwrap();
        assert_eq!(ops.len(), 1);
        assert!(history.can_undo());
    }

    #[test]
    fn backspace_runs_coalesce() {
        let mut history = History::default();
        for at in [4usize, 3, 2] {
            history.begin(Selection::at(at + 1));
            history.record(EditOp::Delete {
                at,
                text: "x".to_string(),
            });
            history.commit(Selection::at(at));
        }
        let (ops, _) = history.undo().unwrap();
        assert_eq!(ops.len(), 3);
    }

    #[test]
    fn coalescing_can_be_disabled() {
        let mut history = History::default();
        history.set_coalesce_enabled(false);
        for (i, ch) in ["a", "b"].iter().enumerate() {
            history.begin(Selection::at(i));
            history.record(insert(i, ch));
            history.commit(Selection::at(i + 1));
        }
        history.undo().unwrap();
        assert!(history.can_undo());
    }

    #[test]
    fn depth_is_bounded() {
        let mut history = History::new(2);
        history.set_coalesce_enabled(false);
        for i in 0..5 {
            history.begin(Selection::at(i));
            history.record(insert(i, "aa")); // two chars, never coalesces
            history.commit(Selection::at(i + 2));
        }
        assert!(history.undo().is_some());
        assert!(history.undo().is_some());
        assert!(history.undo().is_none());
    }
}
