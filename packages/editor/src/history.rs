//! # Undo and redo
//!
//! Undo pops the newest batch and applies the inverse of each of its
//! operations, last first; redo applies the batch again as recorded. Both
//! replay with selection tracking off, since a batch already carries the
//! `set_selection` operations its command produced. Replayed selections
//! keep the editor's current focus state.
//!
//! Replays are not saved. Any repair the normalizer makes afterwards is not
//! saved either, so an undo never clears the redo stack.

use crate::editor::Editor;
use crate::errors::EditorResult;
use quire_model::Operation;
use tracing::{debug, instrument};

impl Editor {
    #[instrument(skip(self))]
    pub fn undo(&mut self) -> EditorResult<()> {
        let Some(batch) = self.value.history.pop_undo() else {
            return Ok(());
        };
        debug!(operations = batch.len(), "undo");

        let inverses = batch.iter().rev().map(Operation::invert).collect();
        self.replay(inverses)?;
        self.value.history.push_redo(batch);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn redo(&mut self) -> EditorResult<()> {
        let Some(batch) = self.value.history.pop_redo() else {
            return Ok(());
        };
        debug!(operations = batch.len(), "redo");

        self.replay(batch.clone())?;
        self.value.history.push_undo(batch);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.value.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.value.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        debug!("history cleared");
        self.value.history.clear();
    }

    fn replay(&mut self, operations: Vec<Operation>) -> EditorResult<()> {
        self.command(|editor| {
            editor.without_saving(|editor| {
                editor.without_normalizing(|editor| {
                    editor.replaying(|editor| {
                        for op in operations {
                            let op = editor.keep_focus(op);
                            editor.apply(op)?;
                        }
                        Ok(())
                    })
                })?;
                editor.normalize_dirty_paths()
            })
        })
    }

    fn keep_focus(&self, op: Operation) -> Operation {
        let Operation::SetSelection {
            properties,
            new_properties,
        } = op
        else {
            return op;
        };

        let is_focused = self.value.selection.as_ref().is_some_and(|s| s.is_focused);
        let new_properties = new_properties.map(|mut selection| {
            selection.is_focused = is_focused;
            selection
        });
        Operation::SetSelection {
            properties,
            new_properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Editor;
    use quire_model::{Node, Point, Range, Selection, Value};

    fn editor(texts: &[&str]) -> Editor {
        let blocks = texts
            .iter()
            .map(|text| Node::block("paragraph", vec![Node::new_text(*text)]))
            .collect();
        let value = Value::new(Node::document(blocks)).with_selection(Selection::collapsed(Point::new([0, 0], 0)));
        Editor::new(value).unwrap()
    }

    #[test]
    fn test_typing_undoes_as_one_batch() {
        let mut editor = editor(&[""]);
        for ch in ["a", "b", "c"] {
            editor.insert_text(ch).unwrap();
        }
        assert_eq!(editor.document().text(), "abc");
        assert_eq!(editor.history().undos().len(), 1);

        editor.undo().unwrap();
        assert_eq!(editor.document().text(), "");
        assert!(!editor.can_undo());
        assert!(editor.can_redo());
    }

    #[test]
    fn test_redo_restores_text_and_selection() {
        let mut editor = editor(&["one", "two"]);
        editor.move_to_end_of_document().unwrap();
        editor.split_block(1).unwrap();
        editor.insert_text("three").unwrap();
        let after = editor.document().text();
        let selection = editor.selection().cloned();

        editor.undo().unwrap();
        editor.undo().unwrap();
        assert_eq!(editor.document().nodes().len(), 2);

        editor.redo().unwrap();
        editor.redo().unwrap();
        assert_eq!(editor.document().text(), after);
        assert_eq!(editor.selection().map(|s| s.range()), selection.map(|s| s.range()));
    }

    #[test]
    fn test_undo_restores_expanded_selection() {
        let mut editor = editor(&["hello world"]);
        let range = Range::new(Point::new([0, 0], 0), Point::new([0, 0], 6));
        editor.select(range.clone()).unwrap();
        editor.delete().unwrap();
        assert_eq!(editor.document().text(), "world");

        editor.undo().unwrap();
        assert_eq!(editor.document().text(), "hello world");
        assert_eq!(editor.selection().unwrap().range(), range);
    }

    #[test]
    fn test_undo_keeps_focus_state() {
        let mut editor = editor(&["abc"]);
        editor.move_to_end_of_document().unwrap();
        editor.split_block(1).unwrap();
        editor.focus().unwrap();

        editor.undo().unwrap();
        assert!(editor.selection().unwrap().is_focused);
        editor.blur().unwrap();
        editor.redo().unwrap();
        assert!(!editor.selection().unwrap().is_focused);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut editor = editor(&[""]);
        editor.insert_text("a").unwrap();
        editor.undo().unwrap();
        assert!(editor.can_redo());

        editor.insert_text("b").unwrap();
        assert!(!editor.can_redo());
        editor.clear_history();
        assert!(!editor.can_undo());
    }
}
