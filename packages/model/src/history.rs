//! # History
//!
//! Undo and redo stacks of operation batches.
//!
//! ## Design
//!
//! - A batch is every operation one command applied, in application order
//! - Undo applies a batch's inverses in reverse order, then moves it to the
//!   redo stack; redo replays it and moves it back
//! - Saving a new batch clears the redo stack
//! - Consecutive typing (or backspacing) at one text merges into the open
//!   batch, so a word undoes in one step
//! - The undo stack is bounded; the oldest batch falls off first
//!
//! The stacks are shared between value snapshots and copied on write.

use crate::operation::Operation;
use std::sync::Arc;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Operations undone and redone together
pub type Batch = Vec<Operation>;

#[derive(Debug, Clone, PartialEq)]
pub struct History {
    undos: Arc<Vec<Batch>>,
    redos: Arc<Vec<Batch>>,

    /// Maximum undo depth; zero means unbounded
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undos: Arc::new(Vec::new()),
            redos: Arc::new(Vec::new()),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn undos(&self) -> &[Batch] {
        &self.undos
    }

    pub fn redos(&self) -> &[Batch] {
        &self.redos
    }

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    /// Record `op`, either into the most recent batch or as a new one.
    /// Returns true if it was merged.
    pub fn save(&mut self, op: Operation, merge: bool) -> bool {
        let undos = Arc::make_mut(&mut self.undos);
        let merged = match undos.last_mut() {
            Some(batch) if merge => {
                batch.push(op);
                true
            }
            _ => {
                undos.push(vec![op]);
                if self.limit > 0 && undos.len() > self.limit {
                    undos.remove(0);
                }
                false
            }
        };

        if !self.redos.is_empty() {
            self.redos = Arc::new(Vec::new());
        }
        merged
    }

    pub fn pop_undo(&mut self) -> Option<Batch> {
        Arc::make_mut(&mut self.undos).pop()
    }

    pub fn pop_redo(&mut self) -> Option<Batch> {
        Arc::make_mut(&mut self.redos).pop()
    }

    /// Push a batch that was just undone
    pub fn push_redo(&mut self, batch: Batch) {
        Self::push_bounded(Arc::make_mut(&mut self.redos), batch, self.limit);
    }

    /// Push a batch that was just redone; leaves the redo stack alone
    pub fn push_undo(&mut self, batch: Batch) {
        Self::push_bounded(Arc::make_mut(&mut self.undos), batch, self.limit);
    }

    fn push_bounded(stack: &mut Vec<Batch>, batch: Batch, limit: usize) {
        stack.push(batch);
        if limit > 0 && stack.len() > limit {
            stack.remove(0);
        }
    }

    pub fn clear(&mut self) {
        self.undos = Arc::new(Vec::new());
        self.redos = Arc::new(Vec::new());
    }

    /// The last operation saved, if any
    pub fn last_operation(&self) -> Option<&Operation> {
        self.undos.last().and_then(|batch| batch.last())
    }
}

/// Whether `next` continues the same run of edits as `prev`: typing right
/// after the previous insertion, deleting backward or forward from the same
/// spot in one text, or moving the caret again.
pub fn should_merge(prev: &Operation, next: &Operation) -> bool {
    match (prev, next) {
        (
            Operation::InsertText {
                path: p_path,
                offset: p_offset,
                text: p_text,
                ..
            },
            Operation::InsertText { path, offset, .. },
        ) => p_path == path && *offset == p_offset + p_text.chars().count(),

        (
            Operation::RemoveText {
                path: p_path,
                offset: p_offset,
                ..
            },
            Operation::RemoveText {
                path, offset, text, ..
            },
        ) => p_path == path && (offset + text.chars().count() == *p_offset || offset == p_offset),

        (Operation::SetSelection { .. }, Operation::SetSelection { .. }) => true,

        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::MarkSet;
    use crate::path::Path;

    fn typed(offset: usize, text: &str) -> Operation {
        Operation::InsertText {
            path: Path::from([0, 0]),
            offset,
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    fn removed(offset: usize, text: &str) -> Operation {
        Operation::RemoveText {
            path: Path::from([0, 0]),
            offset,
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    #[test]
    fn test_contiguous_typing_merges() {
        assert!(should_merge(&typed(0, "a"), &typed(1, "b")));
        assert!(should_merge(&typed(1, "bc"), &typed(3, "d")));
        assert!(!should_merge(&typed(0, "a"), &typed(5, "b")));
        assert!(!should_merge(&typed(0, "a"), &removed(0, "a")));
    }

    #[test]
    fn test_backspace_and_delete_merge() {
        // Backspacing walks the offset down.
        assert!(should_merge(&removed(4, "e"), &removed(3, "d")));
        // Forward delete keeps removing at the same offset.
        assert!(should_merge(&removed(2, "c"), &removed(2, "d")));
        assert!(!should_merge(&removed(4, "e"), &removed(1, "b")));
    }

    #[test]
    fn test_save_merges_and_clears_redo() {
        let mut history = History::new(10);
        assert!(!history.save(typed(0, "a"), false));
        assert!(history.save(typed(1, "b"), true));
        assert_eq!(history.undos().len(), 1);
        assert_eq!(history.undos()[0].len(), 2);

        let batch = history.pop_undo().unwrap();
        history.push_redo(batch);
        assert!(history.can_redo());

        history.save(typed(0, "x"), false);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.save(typed(i, "x"), false);
        }
        assert_eq!(history.undos().len(), 3);
        assert_eq!(history.undos()[0][0], typed(2, "x"));
    }

    #[test]
    fn test_redo_stack_respects_limit() {
        let mut history = History::new(2);
        for i in 0..4 {
            history.push_redo(vec![typed(i, "x")]);
        }
        assert_eq!(history.redos().len(), 2);
        assert_eq!(history.redos()[0][0], typed(2, "x"));
    }

    #[test]
    fn test_snapshots_share_stacks() {
        let mut history = History::default();
        history.save(typed(0, "a"), false);
        let snapshot = history.clone();
        history.save(typed(1, "b"), false);

        assert_eq!(snapshot.undos().len(), 1);
        assert_eq!(history.undos().len(), 2);
    }
}
