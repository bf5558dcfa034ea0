//! Commands over the current selection. Each resolves the selection,
//! defers to its `_at_range` counterpart and leaves the caret where the
//! user expects it. Commands that replace an expanded selection snapshot it
//! first, so undo brings the selection back along with the text.

use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use crate::plugin::{Next, TransferData};
use quire_model::{Key, Mark, MarkSet, Node, NodeProperties, Range};
use tracing::{debug, instrument};

impl Editor {
    /// Delete the selected content and collapse to where it started
    #[instrument(skip(self))]
    pub fn delete(&mut self) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_collapsed() {
            return Ok(());
        }
        self.command(|editor| {
            editor.snapshot_selection()?;
            if let Some(point) = editor.collapse_range(&range)? {
                editor.move_to(point)?;
            }
            Ok(())
        })
    }

    pub fn delete_backward(&mut self, n: usize) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_expanded() {
            return self.delete();
        }
        self.delete_backward_at_range(&range, n)
    }

    pub fn delete_forward(&mut self, n: usize) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_expanded() {
            return self.delete();
        }
        self.delete_forward_at_range(&range, n)
    }

    pub fn delete_char_backward(&mut self) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_expanded() {
            return self.delete();
        }
        self.delete_char_backward_at_range(&range)
    }

    pub fn delete_char_forward(&mut self) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_expanded() {
            return self.delete();
        }
        self.delete_char_forward_at_range(&range)
    }

    pub fn delete_word_backward(&mut self) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_expanded() {
            return self.delete();
        }
        self.delete_word_backward_at_range(&range)
    }

    pub fn delete_word_forward(&mut self) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_expanded() {
            return self.delete();
        }
        self.delete_word_forward_at_range(&range)
    }

    pub fn delete_line_backward(&mut self) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_expanded() {
            return self.delete();
        }
        self.delete_line_backward_at_range(&range)
    }

    pub fn delete_line_forward(&mut self) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_expanded() {
            return self.delete();
        }
        self.delete_line_forward_at_range(&range)
    }

    /// Type `text` over the selection. Pending marks on the selection are
    /// used, and consumed, if there are any.
    pub fn insert_text(&mut self, text: &str) -> EditorResult<()> {
        let selection = self.selection().cloned().ok_or(EditorError::NoSelection)?;
        self.command(|editor| {
            let range = selection.range();
            let marks = match &selection.marks {
                Some(marks) => Some(marks.clone()),
                None if range.is_expanded() => Some(editor.insert_marks_at_range(&range)),
                None => None,
            };
            if range.is_expanded() {
                editor.snapshot_selection()?;
            }
            let after = editor.insert_text_at_range_to(&range, text, marks)?;
            let Some(after) = after else {
                return Ok(());
            };
            editor.move_to(after)?;
            if editor.selection().is_some_and(|s| s.marks.is_some()) {
                editor.update_selection(|s| s.marks = None)?;
            }
            Ok(())
        })
    }

    /// Insert `block` at the selection and put the caret at its end
    pub fn insert_block(&mut self, block: Node) -> EditorResult<()> {
        let selection = self.selection().cloned().ok_or(EditorError::NoSelection)?;
        let block = self.with_unique_keys(block);
        let key = block.key().clone();
        self.command(|editor| {
            if selection.is_expanded() {
                editor.snapshot_selection()?;
            }
            editor.insert_block_at_range(&selection.range(), block)?;
            editor.move_to_end_of_inserted(&key)
        })
    }

    pub fn insert_inline(&mut self, inline: Node) -> EditorResult<()> {
        let selection = self.selection().cloned().ok_or(EditorError::NoSelection)?;
        let inline = self.with_unique_keys(inline);
        let key = inline.key().clone();
        self.command(|editor| {
            if selection.is_expanded() {
                editor.snapshot_selection()?;
            }
            editor.insert_inline_at_range(&selection.range(), inline)?;
            editor.move_to_end_of_inserted(&key)
        })
    }

    /// Insert the content of `fragment` and put the caret right after it
    #[instrument(skip(self, fragment))]
    pub fn insert_fragment(&mut self, fragment: &Node) -> EditorResult<()> {
        let selection = self.selection().cloned().ok_or(EditorError::NoSelection)?;
        self.command(|editor| {
            if selection.is_expanded() {
                editor.snapshot_selection()?;
            }
            let after = editor.insert_fragment_at_range_to(&selection.range(), fragment)?;
            match after.and_then(|key| editor.document().path_by_key(&key)) {
                Some(path) => editor.move_to_start_of_node(&path),
                None => Ok(()),
            }
        })
    }

    /// Hand pasted or dropped content to the plugins. Text is inserted line
    /// by line unless a plugin handles it first.
    #[instrument(skip(self, data))]
    pub fn insert_data(&mut self, data: TransferData) -> EditorResult<()> {
        let next = Next::new(self.chain());
        self.command(|editor| next.insert_data(editor, &data))
    }

    pub(crate) fn core_insert_data(&mut self, data: &TransferData) -> EditorResult<()> {
        match data {
            TransferData::Fragment(fragment) => self.insert_fragment(fragment),
            TransferData::Text(text) => self.command(|editor| {
                let lines: Vec<&str> = text.split('\n').map(|line| line.trim_end_matches('\r')).collect();
                debug!(lines = lines.len(), "inserting text data");
                for (i, line) in lines.into_iter().enumerate() {
                    if i > 0 {
                        editor.split_block(1)?;
                    }
                    editor.insert_text(line)?;
                }
                Ok(())
            }),
        }
    }

    /// Split the block at the selection, and `height - 1` of its block
    /// ancestors. Marks at the caret carry over to the new block.
    pub fn split_block(&mut self, height: usize) -> EditorResult<()> {
        let selection = self.selection().cloned().ok_or(EditorError::NoSelection)?;
        self.command(|editor| {
            if selection.is_expanded() {
                editor.snapshot_selection()?;
            }
            let range = selection.range();
            let marks = match &selection.marks {
                Some(marks) => marks.clone(),
                None => editor.insert_marks_at_range(&range),
            };
            editor.split_block_at_range(&range, height)?;
            editor.move_to_end()?;
            if !marks.is_empty() {
                editor.update_selection(|s| s.marks = Some(marks))?;
            }
            Ok(())
        })
    }

    pub fn split_inline(&mut self, height: usize) -> EditorResult<()> {
        let selection = self.selection().cloned().ok_or(EditorError::NoSelection)?;
        self.command(|editor| {
            if selection.is_expanded() {
                editor.snapshot_selection()?;
            }
            editor.split_inline_at_range(&selection.range(), height)?;
            editor.move_to_end()
        })
    }

    pub fn set_blocks(&mut self, properties: NodeProperties) -> EditorResult<()> {
        let range = self.selected_range()?;
        self.set_blocks_at_range(&range, properties)
    }

    pub fn set_inlines(&mut self, properties: NodeProperties) -> EditorResult<()> {
        let range = self.selected_range()?;
        self.set_inlines_at_range(&range, properties)
    }

    /// Marks in effect at the selection: the pending marks if there are
    /// any, otherwise those every selected character has
    pub fn active_marks(&self) -> MarkSet {
        match self.selection() {
            Some(selection) => match &selection.marks {
                Some(marks) => marks.clone(),
                None => self.active_marks_at_range(&selection.range()),
            },
            None => MarkSet::new(),
        }
    }

    /// Add `mark` to the selected text. A collapsed selection keeps it
    /// pending for the next insert.
    pub fn add_mark(&mut self, mark: Mark) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_expanded() {
            return self.add_mark_at_range(&range, &mark);
        }
        let marks = self.active_marks().with(mark);
        self.update_selection(|s| s.marks = Some(marks))
    }

    pub fn remove_mark(&mut self, mark: Mark) -> EditorResult<()> {
        let range = self.selected_range()?;
        if range.is_expanded() {
            return self.remove_mark_at_range(&range, &mark);
        }
        let mut marks = self.active_marks();
        marks.remove(&mark);
        self.update_selection(|s| s.marks = Some(marks))
    }

    pub fn toggle_mark(&mut self, mark: Mark) -> EditorResult<()> {
        if self.active_marks().contains(&mark) {
            self.remove_mark(mark)
        } else {
            self.add_mark(mark)
        }
    }

    pub fn wrap_block(&mut self, block: &Node) -> EditorResult<()> {
        let range = self.selected_range()?;
        self.wrap_block_at_range(&range, block)
    }

    pub fn unwrap_block(&mut self, properties: &NodeProperties) -> EditorResult<()> {
        let range = self.selected_range()?;
        self.unwrap_block_at_range(&range, properties)
    }

    pub fn wrap_inline(&mut self, inline: &Node) -> EditorResult<()> {
        let range = self.selected_range()?;
        self.wrap_inline_at_range(&range, inline)
    }

    pub fn unwrap_inline(&mut self, properties: &NodeProperties) -> EditorResult<()> {
        let range = self.selected_range()?;
        self.unwrap_inline_at_range(&range, properties)
    }

    /// Surround the selection with `prefix` and `suffix`, keeping the same
    /// text selected
    pub fn wrap_text(&mut self, prefix: &str, suffix: &str) -> EditorResult<()> {
        let range = self.selected_range()?;
        let shift = prefix.chars().count();
        let (start, end) = range.edges();
        let wrapped_start = start.with_offset(start.offset + shift);
        let wrapped_end = if start.path == end.path {
            end.with_offset(end.offset + shift)
        } else {
            end.clone()
        };
        let next = if range.is_backward() {
            Range::new(wrapped_end, wrapped_start)
        } else {
            Range::new(wrapped_start, wrapped_end)
        };

        self.command(|editor| {
            editor.wrap_text_at_range(&range, prefix, suffix)?;
            editor.select(next)
        })
    }

    fn move_to_end_of_inserted(&mut self, key: &Key) -> EditorResult<()> {
        let Some(path) = self.document().path_by_key(key) else {
            return Ok(());
        };
        let has_text = self
            .document()
            .get_node(&path)
            .and_then(Node::get_last_text)
            .is_some();
        if !has_text {
            return Ok(());
        }
        self.move_to_end_of_node(&path)
    }
}
