//! Commands over a range.
//!
//! Commands that insert delete an expanded range first and insert where
//! its start ended up. A caret inside a void either removes the void whole
//! (deletes) or does nothing (inserts).
//!
//! ## Hanging ranges
//!
//! A range that starts at the very start of a block and ends at the very
//! start of a later block "hangs" into that later block without covering
//! any of it. Deleting it removes the start block instead of merging the
//! two, and setting block properties over it leaves the last block alone.

use super::emptied;
use crate::editor::Editor;
use crate::errors::EditorResult;
use quire_model::text_utils::{char_offset_backward, char_offset_forward, word_offset_backward, word_offset_forward};
use quire_model::{Affinity, Key, Mark, MarkSet, ModelError, Node, NodeProperties, Path, Point, Range};
use tracing::instrument;

impl Editor {
    #[instrument(skip(self))]
    pub fn delete_at_range(&mut self, range: &Range) -> EditorResult<()> {
        if range.is_collapsed() {
            return Ok(());
        }
        let range = self.resolve_range(range)?;
        self.without_normalizing(|editor| editor.delete_expanded(&range))
    }

    /// Delete `n` characters before a collapsed range, or the range itself
    /// if it is expanded
    pub fn delete_backward_at_range(&mut self, range: &Range, n: usize) -> EditorResult<()> {
        if n == 0 {
            return Ok(());
        }
        if range.is_expanded() {
            return self.delete_at_range(range);
        }

        let start = range.start().clone();
        if let Some(void) = self.closest_void(&start.path) {
            return self.remove_node_by_path(&void);
        }

        let document = self.document();
        if start.is_at_start_of(document, &Path::root()) {
            return Ok(());
        }

        let block = self.block_path(&start.path)?;
        let block_node = document.assert_node(&block)?;
        if document.nodes().len() != 1 && block_node.text_len() == 0 && block_node.nodes().len() == 1 {
            return self.remove_node_by_path(&block);
        }

        if start.offset == 0 {
            let mut previous = document.get_previous_text(&start.path);
            let in_inline = self.closest_inline(&start.path).is_some();
            if in_inline && matches!(&previous, Some((text, _)) if text.is_empty()) {
                previous = previous.and_then(|(_, path)| document.get_previous_text(&path));
            }
            let Some((text, path)) = previous else {
                return Ok(());
            };

            if let Some(void) = self.closest_void(&path) {
                return self.remove_node_by_path(&void);
            }
            if n == 1 && self.closest_block(&path).as_ref() != Some(&block) {
                let range = Range::new(Point::new(path, text.len()), start);
                return self.delete_at_range(&range);
            }
        }

        if n <= start.offset {
            let range = Range::new(start.with_offset(start.offset - n), start);
            return self.delete_at_range(&range);
        }

        let mut traversed = start.offset;
        let mut path = start.path.clone();
        let anchor = loop {
            let Some((text, previous)) = document.get_previous_text(&path) else {
                break Point::new(path, 0);
            };
            let next = traversed + text.len();
            if n <= next {
                break Point::new(previous, next - n);
            }
            traversed = next;
            path = previous;
        };
        self.delete_at_range(&Range::new(anchor, start))
    }

    /// Delete `n` characters after a collapsed range, or the range itself
    /// if it is expanded
    pub fn delete_forward_at_range(&mut self, range: &Range, n: usize) -> EditorResult<()> {
        if n == 0 {
            return Ok(());
        }
        if range.is_expanded() {
            return self.delete_at_range(range);
        }

        let start = range.start().clone();
        if let Some(void) = self.closest_void(&start.path) {
            return self.remove_node_by_path(&void);
        }

        let document = self.document();
        let block = self.block_path(&start.path)?;
        let block_node = document.assert_node(&block)?;
        if document.nodes().len() != 1 && block_node.text_len() == 0 && block_node.nodes().len() == 1 {
            let next = block_node
                .get_last_text()
                .and_then(|(_, last)| document.get_next_text(&block.concat(&last)))
                .map(|(text, _)| text.key.clone());
            return self.command(|editor| {
                editor.remove_node_by_path(&block)?;
                match next {
                    Some(key) => {
                        let path = editor.key_path(&key)?;
                        editor.move_to_start_of_node(&path)
                    }
                    None => Ok(()),
                }
            });
        }

        if start.is_at_end_of(document, &Path::root()) {
            return Ok(());
        }

        let text = document.assert_text(&start.path)?;
        if start.offset == text.len() {
            let Some((_, next)) = document.get_next_text(&start.path) else {
                return Ok(());
            };
            if let Some(void) = self.closest_void(&next) {
                return self.remove_node_by_path(&void);
            }
            if n == 1 && self.closest_block(&next).as_ref() != Some(&block) {
                let range = Range::new(start, Point::new(next, 0));
                return self.delete_at_range(&range);
            }
        }

        if n <= text.len() - start.offset {
            let range = Range::new(start.clone(), start.with_offset(start.offset + n));
            return self.delete_at_range(&range);
        }

        let mut traversed = text.len() - start.offset;
        let mut current = (start.path.clone(), text.len());
        let focus = loop {
            let Some((text, next)) = document.get_next_text(&current.0) else {
                break Point::new(current.0, current.1);
            };
            let reach = traversed + text.len();
            if n <= reach {
                break Point::new(next, n - traversed);
            }
            traversed = reach;
            current = (next, text.len());
        };
        self.delete_at_range(&Range::new(start, focus))
    }

    pub fn delete_char_backward_at_range(&mut self, range: &Range) -> EditorResult<()> {
        if range.is_expanded() {
            return self.delete_at_range(range);
        }
        let (text, offset) = self.block_text(range.start())?;
        let n = if offset == 0 {
            1
        } else {
            char_offset_backward(&text, offset)
        };
        self.delete_backward_at_range(range, n)
    }

    pub fn delete_char_forward_at_range(&mut self, range: &Range) -> EditorResult<()> {
        if range.is_expanded() {
            return self.delete_at_range(range);
        }
        let (text, offset) = self.block_text(range.start())?;
        let n = if offset == text.chars().count() {
            1
        } else {
            char_offset_forward(&text, offset)
        };
        self.delete_forward_at_range(range, n)
    }

    pub fn delete_word_backward_at_range(&mut self, range: &Range) -> EditorResult<()> {
        if range.is_expanded() {
            return self.delete_at_range(range);
        }
        let (text, offset) = self.block_text(range.start())?;
        let n = if offset == 0 {
            1
        } else {
            word_offset_backward(&text, offset)
        };
        self.delete_backward_at_range(range, n)
    }

    pub fn delete_word_forward_at_range(&mut self, range: &Range) -> EditorResult<()> {
        if range.is_expanded() {
            return self.delete_at_range(range);
        }
        let (text, offset) = self.block_text(range.start())?;
        let n = if offset == text.chars().count() {
            1
        } else {
            word_offset_forward(&text, offset)
        };
        self.delete_forward_at_range(range, n)
    }

    /// Delete back to the start of the block
    pub fn delete_line_backward_at_range(&mut self, range: &Range) -> EditorResult<()> {
        if range.is_expanded() {
            return self.delete_at_range(range);
        }
        let (_, offset) = self.block_text(range.start())?;
        self.delete_backward_at_range(range, offset)
    }

    /// Delete up to the end of the block
    pub fn delete_line_forward_at_range(&mut self, range: &Range) -> EditorResult<()> {
        if range.is_expanded() {
            return self.delete_at_range(range);
        }
        let (text, offset) = self.block_text(range.start())?;
        self.delete_forward_at_range(range, text.chars().count() - offset)
    }

    /// Insert `text` at the start of `range`. Without explicit `marks` the
    /// text takes the marks typing there would pick up.
    pub fn insert_text_at_range(&mut self, range: &Range, text: &str, marks: Option<MarkSet>) -> EditorResult<()> {
        self.insert_text_at_range_to(range, text, marks).map(|_| ())
    }

    /// Returns the position just after the inserted text
    pub(crate) fn insert_text_at_range_to(
        &mut self,
        range: &Range,
        text: &str,
        marks: Option<MarkSet>,
    ) -> EditorResult<Option<Point>> {
        if self.has_void_parent(&range.start().path) {
            return Ok(None);
        }
        self.without_normalizing(|editor| {
            let Some(point) = editor.collapse_range(range)? else {
                return Ok(None);
            };
            if editor.has_void_parent(&point.path) {
                return Ok(None);
            }
            let marks = marks.unwrap_or_else(|| editor.insert_marks_at_point(&point));
            editor.insert_text_by_path(&point.path, point.offset, text, Some(marks))?;
            Ok(Some(point.with_offset(point.offset + text.chars().count())))
        })
    }

    /// Insert `block` before, after or in the middle of the block at the
    /// start of `range`, splitting it in the last case
    pub fn insert_block_at_range(&mut self, range: &Range, block: Node) -> EditorResult<()> {
        self.without_normalizing(|editor| {
            let Some(point) = editor.collapse_range(range)? else {
                return Ok(());
            };
            let target = editor.block_path(&point.path)?;
            let parent = target.parent().ok_or(ModelError::RootOperation)?;
            let index = target.last().unwrap_or_default();

            match editor.block_placement(&target, &point)? {
                Placement::Before => editor.insert_node_by_path(&parent, index, block),
                Placement::After => editor.insert_node_by_path(&parent, index + 1, block),
                Placement::Split(point) => {
                    editor.split_descendants_by_path(&target, &point.path, point.offset)?;
                    editor.insert_node_by_path(&parent, index + 1, block)
                }
            }
        })
    }

    /// Split the text at the start of `range` and put `inline` between the
    /// halves
    pub fn insert_inline_at_range(&mut self, range: &Range, inline: Node) -> EditorResult<()> {
        self.without_normalizing(|editor| {
            let Some(point) = editor.collapse_range(range)? else {
                return Ok(());
            };
            let parent = point.path.parent().ok_or(ModelError::RootOperation)?;
            if editor.has_void_parent(&point.path) {
                return Ok(());
            }
            let index = point.path.last().unwrap_or_default();
            editor.split_node_by_path(&point.path, point.offset)?;
            editor.insert_node_by_path(&parent, index + 1, inline)
        })
    }

    #[instrument(skip(self, fragment))]
    pub fn insert_fragment_at_range(&mut self, range: &Range, fragment: &Node) -> EditorResult<()> {
        self.insert_fragment_at_range_to(range, fragment).map(|_| ())
    }

    /// Insert the blocks of `fragment` at the start of `range`. The first
    /// and last fragment blocks join the blocks on either side of the cut.
    /// A fragment of inline content is spliced into the text instead.
    ///
    /// Returns the key of the text that follows the inserted content.
    pub(crate) fn insert_fragment_at_range_to(&mut self, range: &Range, fragment: &Node) -> EditorResult<Option<Key>> {
        if fragment.nodes().is_empty() {
            return Ok(None);
        }
        self.without_normalizing(|editor| {
            let Some(point) = editor.collapse_range(range)? else {
                return Ok(None);
            };
            if editor.has_void_parent(&point.path) {
                return Ok(None);
            }

            let inline_content = match fragment.nodes() {
                nodes if nodes.iter().all(|n| !n.is_block()) => Some(fragment.clone()),
                [only] if is_leaf_block(only) => Some(only.clone()),
                _ => None,
            };

            if let Some(content) = inline_content {
                let parent = point.path.parent().ok_or(ModelError::RootOperation)?;
                let index = point.path.last().unwrap_or_default();
                editor.split_node_by_path(&point.path, point.offset)?;
                editor.insert_fragment_by_path(&parent, index + 1, &content)?;
                let after = parent.child(index + 1 + content.nodes().len());
                return Ok(editor.document().get_node(&after).map(|n| n.key().clone()));
            }

            let target = editor.block_path(&point.path)?;
            let parent = target.parent().ok_or(ModelError::RootOperation)?;
            let index = target.last().unwrap_or_default();
            editor.split_descendants_by_path(&target, &point.path, point.offset)?;

            let after = editor
                .document()
                .get_node(&parent.child(index + 1))
                .and_then(Node::get_first_text)
                .map(|(text, _)| text.key.clone());

            let count = fragment.nodes().len();
            editor.insert_fragment_by_path(&parent, index + 1, fragment)?;

            let document = editor.document();
            let leaf_at = |i: usize| document.get_node(&parent.child(i)).is_some_and(is_leaf_block);
            let join_last = leaf_at(index + count) && leaf_at(index + count + 1);
            let join_first = leaf_at(index) && leaf_at(index + 1);

            if join_last {
                editor.merge_node_by_path(&parent.child(index + count + 1))?;
            }
            if join_first {
                editor.merge_node_by_path(&parent.child(index + 1))?;
            }
            Ok(after)
        })
    }

    /// Split the block at the start of `range`, and `height - 1` of its
    /// block ancestors. A height of zero splits only the text.
    #[instrument(skip(self))]
    pub fn split_block_at_range(&mut self, range: &Range, height: usize) -> EditorResult<()> {
        self.without_normalizing(|editor| {
            let Some(point) = editor.collapse_range(range)? else {
                return Ok(());
            };
            let document = editor.document();
            let mut target = point.path.clone();
            for _ in 0..height {
                match document.get_closest_block(&target) {
                    Some((_, block)) => target = block,
                    None => break,
                }
            }
            editor.split_descendants_by_path(&target, &point.path, point.offset)
        })
    }

    /// Split the text at the start of `range` and up to `height` of its
    /// inline ancestors
    pub fn split_inline_at_range(&mut self, range: &Range, height: usize) -> EditorResult<()> {
        self.without_normalizing(|editor| {
            let Some(point) = editor.collapse_range(range)? else {
                return Ok(());
            };
            let mut target = point.path.clone();
            for _ in 0..height {
                match editor.closest_inline(&target) {
                    Some(inline) => target = inline,
                    None => break,
                }
            }
            editor.split_descendants_by_path(&target, &point.path, point.offset)
        })
    }

    /// Set type and data on the leaf blocks in `range`, leaving out the
    /// last one if the range is hanging
    pub fn set_blocks_at_range(&mut self, range: &Range, properties: NodeProperties) -> EditorResult<()> {
        let properties = NodeProperties { key: None, ..properties };
        let mut blocks = self.leaf_blocks_at_range(range);
        if !self.has_void_parent(&range.start().path) && range.is_hanging(self.document()) {
            blocks.pop();
        }
        self.without_normalizing(|editor| {
            for block in &blocks {
                editor.set_node_by_path(block, properties.clone())?;
            }
            Ok(())
        })
    }

    pub fn set_inlines_at_range(&mut self, range: &Range, properties: NodeProperties) -> EditorResult<()> {
        let properties = NodeProperties { key: None, ..properties };
        let inlines = self.inlines_at_range(range);
        self.without_normalizing(|editor| {
            for inline in &inlines {
                editor.set_node_by_path(inline, properties.clone())?;
            }
            Ok(())
        })
    }

    pub fn add_mark_at_range(&mut self, range: &Range, mark: &Mark) -> EditorResult<()> {
        let spans = self.text_spans(range);
        self.without_normalizing(|editor| {
            for (path, offset, length) in &spans {
                editor.add_mark_by_path(path, *offset, *length, mark)?;
            }
            Ok(())
        })
    }

    pub fn remove_mark_at_range(&mut self, range: &Range, mark: &Mark) -> EditorResult<()> {
        let spans = self.text_spans(range);
        self.without_normalizing(|editor| {
            for (path, offset, length) in &spans {
                editor.remove_mark_by_path(path, *offset, *length, mark)?;
            }
            Ok(())
        })
    }

    /// Remove `mark` if every character in `range` has it, add it otherwise
    pub fn toggle_mark_at_range(&mut self, range: &Range, mark: &Mark) -> EditorResult<()> {
        if range.is_collapsed() {
            return Ok(());
        }
        if self.active_marks_at_range(range).contains(mark) {
            self.remove_mark_at_range(range, mark)
        } else {
            self.add_mark_at_range(range, mark)
        }
    }

    /// Wrap the blocks touched by `range` in an empty copy of `block`. The
    /// wrapper goes at the level of their closest shared parent.
    pub fn wrap_block_at_range(&mut self, range: &Range, block: &Node) -> EditorResult<()> {
        let blocks = self.leaf_blocks_at_range(range);
        let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
            return Ok(());
        };

        let (parent, from, to) = if first == last {
            let parent = first.parent().ok_or(ModelError::RootOperation)?;
            let index = first.last().unwrap_or_default();
            (parent, index, index)
        } else {
            let common = first.common(last);
            let depth = common.len();
            (common, first.get(depth).unwrap_or_default(), last.get(depth).unwrap_or_default())
        };

        let wrapper = emptied(block);
        self.without_normalizing(|editor| {
            editor.insert_node_by_path(&parent, from, wrapper)?;
            for i in 0..=(to - from) {
                editor.move_node_by_path(&parent.child(from + 1), &parent.child(from), i)?;
            }
            Ok(())
        })
    }

    /// Lift the blocks touched by `range` out of their closest ancestor
    /// matching `properties`, splitting that ancestor around them
    pub fn unwrap_block_at_range(&mut self, range: &Range, properties: &NodeProperties) -> EditorResult<()> {
        let document = self.document();
        let blocks: Vec<Key> = self
            .leaf_blocks_at_range(range)
            .iter()
            .filter_map(|path| document.get_node(path).map(|n| n.key().clone()))
            .collect();

        let mut wrappers: Vec<Key> = Vec::new();
        for block in &blocks {
            let path = document.assert_path_by_key(block)?;
            let found = document.get_closest(&path, |n| n.is_block() && matches_properties(n, properties));
            if let Some((wrapper, _)) = found {
                if !wrappers.contains(wrapper.key()) {
                    wrappers.push(wrapper.key().clone());
                }
            }
        }

        self.without_normalizing(|editor| {
            for wrapper in &wrappers {
                let path = editor.key_path(wrapper)?;
                let node = editor.document().assert_node(&path)?;
                let held: Vec<usize> = node
                    .nodes()
                    .iter()
                    .enumerate()
                    .filter(|(_, child)| blocks.iter().any(|key| child.path_by_key(key).is_some()))
                    .map(|(i, _)| i)
                    .collect();
                let (Some(&first), Some(&last)) = (held.first(), held.last()) else {
                    continue;
                };
                let count = node.nodes().len();

                if last + 1 < count {
                    editor.split_node_by_path(&path, last + 1)?;
                }
                let target = if first > 0 {
                    editor.split_node_by_path(&path, first)?;
                    path.next().ok_or(ModelError::RootOperation)?
                } else {
                    path
                };
                editor.unwrap_children_by_path(&target)?;
            }
            Ok(())
        })
    }

    /// Wrap the content of `range` in each block it touches in an empty
    /// copy of `inline`
    pub fn wrap_inline_at_range(&mut self, range: &Range, inline: &Node) -> EditorResult<()> {
        if range.is_collapsed() {
            return Ok(());
        }
        let (start, end) = range.edges();
        let blocks = self.leaf_blocks_at_range(range);

        self.without_normalizing(|editor| {
            for (i, block) in blocks.iter().enumerate() {
                let wrapper = if i == 0 {
                    emptied(inline)
                } else {
                    emptied(&inline.regenerate_keys())
                };
                editor.wrap_inline_in_block(block, &start, &end, wrapper)?;
            }
            Ok(())
        })
    }

    /// Replace each inline touched by `range` that matches `properties`
    /// with its children
    pub fn unwrap_inline_at_range(&mut self, range: &Range, properties: &NodeProperties) -> EditorResult<()> {
        let document = self.document();
        let mut inlines: Vec<Key> = Vec::new();
        for text in self.texts_at_range(range) {
            let found = document.get_closest(&text, |n| self.is_inline(n) && matches_properties(n, properties));
            if let Some((inline, _)) = found {
                if !inlines.contains(inline.key()) {
                    inlines.push(inline.key().clone());
                }
            }
        }

        self.without_normalizing(|editor| {
            for inline in &inlines {
                let path = editor.key_path(inline)?;
                editor.unwrap_children_by_path(&path)?;
            }
            Ok(())
        })
    }

    /// Surround `range` with `prefix` and `suffix`, unformatted
    pub fn wrap_text_at_range(&mut self, range: &Range, prefix: &str, suffix: &str) -> EditorResult<()> {
        let (start, end) = range.edges();
        let end = if start.path == end.path {
            end.with_offset(end.offset + prefix.chars().count())
        } else {
            end
        };
        self.without_normalizing(|editor| {
            editor.insert_text_at_range(&Range::collapsed(start), prefix, Some(MarkSet::new()))?;
            editor.insert_text_at_range(&Range::collapsed(end), suffix, Some(MarkSet::new()))
        })
    }

    // -- helpers --------------------------------------------------------------

    fn delete_expanded(&mut self, range: &Range) -> EditorResult<()> {
        let (start, end) = range.edges();
        let document = self.document();
        let mut start_key = document.assert_text(&start.path)?.key.clone();
        let mut end_key = document.assert_text(&end.path)?.key.clone();
        let mut start_offset = start.offset;
        let mut end_offset = end.offset;
        let mut start_void = self.has_void_parent(&start.path);
        let mut end_void = self.has_void_parent(&end.path);
        let hanging = !start_void && range.is_hanging(document);

        // A hanging range ending in a void never meant to cover the void.
        if hanging && end_void {
            if let Some((text, path)) = document.get_previous_text(&end.path) {
                end_key = text.key.clone();
                end_offset = text.len();
                end_void = self.has_void_parent(&path);
            }
        }

        while start_void {
            let path = self.key_path(&start_key)?;
            let Some(void) = self.closest_void(&path) else {
                break;
            };
            let document = self.document();
            let next = document
                .get_node(&void)
                .and_then(Node::get_last_text)
                .and_then(|(_, last)| document.get_next_text(&void.concat(&last)))
                .map(|(text, _)| text.key.clone());

            self.remove_node_by_path(&void)?;
            if self.document().path_by_key(&end_key).is_none() {
                return Ok(());
            }
            let Some(next) = next else {
                return Ok(());
            };
            start_key = next;
            start_offset = 0;
            start_void = self.has_void_parent(&self.key_path(&start_key)?);
        }

        while end_void {
            let path = self.key_path(&end_key)?;
            let Some(void) = self.closest_void(&path) else {
                break;
            };
            let document = self.document();
            let previous = document
                .get_node(&void)
                .and_then(Node::get_first_text)
                .and_then(|(_, first)| document.get_previous_text(&void.concat(&first)))
                .map(|(text, _)| (text.key.clone(), text.len()));

            self.remove_node_by_path(&void)?;
            if self.document().path_by_key(&start_key).is_none() {
                return Ok(());
            }
            let Some((previous, len)) = previous else {
                return Ok(());
            };
            end_key = previous;
            end_offset = len;
            end_void = self.has_void_parent(&self.key_path(&end_key)?);
        }

        let start_path = self.key_path(&start_key)?;
        let end_path = self.key_path(&end_key)?;
        if start_key == end_key {
            if hanging {
                let block = self.block_path(&start_path)?;
                return self.remove_node_by_path(&block);
            }
            return self.remove_text_by_path(&start_path, start_offset, end_offset.saturating_sub(start_offset));
        }

        let document = self.document();
        let start_block_key = document.assert_node(&self.block_path(&start_path)?)?.key().clone();
        let end_block_key = document.assert_node(&self.block_path(&end_path)?)?.key().clone();
        let start_len = document.assert_text(&start_path)?.len().saturating_sub(start_offset);

        // Everything strictly between the two texts, collected as keys
        // before any of it is removed.
        let ancestor = start_path.common(&end_path);
        let depth = ancestor.len() + 1;
        let start_child = start_path.slice(depth);
        let end_child = end_path.slice(depth);
        let mut doomed: Vec<Key> = Vec::new();

        let mut child = start_path.clone();
        while child != start_child {
            let parent = child.parent().ok_or(ModelError::RootOperation)?;
            let index = child.last().unwrap_or_default();
            let siblings = document.assert_node(&parent)?.nodes();
            doomed.extend(siblings.get(index + 1..).unwrap_or_default().iter().map(|n| n.key().clone()));
            child = parent;
        }

        let first = start_child.last().unwrap_or_default();
        let last = end_child.last().unwrap_or_default();
        let middles = document.assert_node(&ancestor)?.nodes();
        doomed.extend(middles.get(first + 1..last).unwrap_or_default().iter().map(|n| n.key().clone()));

        let mut child = end_path.clone();
        while child != end_child {
            let parent = child.parent().ok_or(ModelError::RootOperation)?;
            let index = child.last().unwrap_or_default();
            let siblings = document.assert_node(&parent)?.nodes();
            doomed.extend(siblings.get(..index).unwrap_or_default().iter().map(|n| n.key().clone()));
            child = parent;
        }

        for key in &doomed {
            self.remove_node_by_key(key)?;
        }
        if start_len > 0 {
            let path = self.key_path(&start_key)?;
            self.remove_text_by_path(&path, start_offset, start_len)?;
        }
        if end_offset > 0 {
            let path = self.key_path(&end_key)?;
            self.remove_text_by_path(&path, 0, end_offset)?;
        }
        if start_block_key == end_block_key {
            return Ok(());
        }

        // Bring the end block up beside the start block, then join them.
        let end_block = self.key_path(&end_block_key)?;
        let lone_ancestor = self.lone_ancestor(&end_block);
        let start_block = self.key_path(&start_block_key)?;
        let parent = start_block.parent().ok_or(ModelError::RootOperation)?;
        let index = start_block.last().unwrap_or_default() + 1;
        self.move_node_by_path(&end_block, &parent, index)?;

        if hanging {
            self.remove_node_by_key(&start_block_key)?;
        } else {
            self.merge_node_by_key(&end_block_key)?;
        }
        if let Some(key) = lone_ancestor {
            self.remove_node_by_key(&key)?;
        }
        Ok(())
    }

    /// The highest ancestor of `path` whose only descendant chain leads to
    /// it. It is left empty once that node moves out.
    fn lone_ancestor(&self, path: &Path) -> Option<Key> {
        let document = self.document();
        let mut found = None;
        let mut current = path.parent()?;
        while !current.is_root() {
            let node = document.get_node(&current)?;
            if node.nodes().len() != 1 {
                break;
            }
            found = Some(node.key().clone());
            current = current.parent()?;
        }
        found
    }

    /// Delete an expanded `range` and return where its start ended up. A
    /// collapsed range is returned as is.
    pub(crate) fn collapse_range(&mut self, range: &Range) -> EditorResult<Option<Point>> {
        let range = self.resolve_range(range)?;
        if range.is_collapsed() {
            return Ok(Some(range.start().clone()));
        }
        let (start, end) = range.edges();
        self.command(|editor| {
            let since = editor.operations().len();
            editor.delete_at_range(&range)?;
            let point = editor
                .track_point(&start, since, Affinity::Backward)
                .or_else(|| editor.track_point(&end, since, Affinity::Forward))
                .or_else(|| editor.selection().map(|s| s.start().clone()));
            Ok(point)
        })
    }

    /// Map `point` through the operations applied since `since` in the
    /// current command
    pub(crate) fn track_point(&self, point: &Point, since: usize, affinity: Affinity) -> Option<Point> {
        self.operations()
            .get(since..)?
            .iter()
            .try_fold(point.clone(), |point, op| point.transform_with(op, affinity))
    }

    pub(crate) fn key_path(&self, key: &Key) -> EditorResult<Path> {
        Ok(self.document().assert_path_by_key(key)?)
    }

    fn block_path(&self, path: &Path) -> EditorResult<Path> {
        self.closest_block(path)
            .ok_or_else(|| ModelError::InvalidPath(path.clone()).into())
    }

    /// The flattened text of the block holding `point`, and the point's
    /// offset within it
    fn block_text(&self, point: &Point) -> EditorResult<(String, usize)> {
        let block = self.block_path(&point.path)?;
        let node = self.document().assert_node(&block)?;
        let relative = point.path.relative(&block).unwrap_or_default();
        Ok((node.text(), node.get_offset(&relative) + point.offset))
    }

    /// The part of each text in `range` that it covers, as
    /// `(path, offset, length)`
    fn text_spans(&self, range: &Range) -> Vec<(Path, usize, usize)> {
        if range.is_collapsed() {
            return Vec::new();
        }
        let (start, end) = range.edges();
        let document = self.document();
        self.texts_at_range(range)
            .into_iter()
            .filter_map(|path| {
                let len = document.get_node(&path)?.text_len();
                let from = if path == start.path { start.offset } else { 0 };
                let to = if path == end.path { end.offset } else { len };
                (to > from).then_some((path, from, to - from))
            })
            .collect()
    }

    fn block_placement(&self, block: &Path, point: &Point) -> EditorResult<Placement> {
        let document = self.document();
        let node = document.assert_node(block)?;
        let inline = self.closest_inline(&point.path);

        let placement = if self.is_void(node) {
            if point.is_at_end_of(document, block) {
                Placement::After
            } else {
                Placement::Before
            }
        } else if inline.is_none() && node.text_len() == 0 {
            Placement::After
        } else if point.is_at_start_of(document, block) {
            Placement::Before
        } else if point.is_at_end_of(document, block) {
            Placement::After
        } else {
            match inline {
                // Never split a void inline; cut beside it.
                Some(path) if document.get_node(&path).is_some_and(|inline| self.is_void(inline)) => {
                    let beside = if point.is_at_end_of(document, &path) {
                        document.get_next_text(&path).map(|(_, p)| Point::new(p, 0))
                    } else {
                        document
                            .get_previous_text(&path)
                            .map(|(text, p)| Point::new(p, text.len()))
                    };
                    Placement::Split(beside.unwrap_or_else(|| point.clone()))
                }
                _ => Placement::Split(point.clone()),
            }
        };
        Ok(placement)
    }

    /// Wrap the part of the leaf block at `block` between `start` and `end`
    /// in `wrapper`. Either point may lie outside the block.
    fn wrap_inline_in_block(&mut self, block: &Path, start: &Point, end: &Point, wrapper: Node) -> EditorResult<()> {
        let depth = block.len() + 1;
        let count = self.document().assert_node(block)?.nodes().len();
        if count == 0 {
            return Ok(());
        }

        let mut last = count - 1;
        if block.is_ancestor_of(&end.path) {
            let child = end.path.slice(depth);
            self.split_descendants_by_path(&child, &end.path, end.offset)?;
            last = child.last().unwrap_or_default();
        }

        let mut first = 0;
        if block.is_ancestor_of(&start.path) {
            let child = start.path.slice(depth);
            self.split_descendants_by_path(&child, &start.path, start.offset)?;
            first = child.last().unwrap_or_default() + 1;
            last += 1;
        }

        if first > last {
            return Ok(());
        }
        self.insert_node_by_path(block, first, wrapper)?;
        let wrapper_path = block.child(first);
        for i in 0..=(last - first) {
            self.move_node_by_path(&block.child(first + 1), &wrapper_path, i)?;
        }
        Ok(())
    }
}

/// Where a block inserted at a point goes relative to the point's block
enum Placement {
    Before,
    After,
    Split(Point),
}

fn is_leaf_block(node: &Node) -> bool {
    node.is_block() && node.nodes().iter().all(|child| !child.is_block())
}

/// Whether `node` has the type of `properties`, if it names one, and every
/// data entry it names
fn matches_properties(node: &Node, properties: &NodeProperties) -> bool {
    let type_matches = properties.ty.as_deref().map_or(true, |ty| node.ty() == Some(ty));
    let data_matches = properties.data.as_ref().map_or(true, |wanted| {
        node.data()
            .is_some_and(|data| wanted.iter().all(|(key, value)| data.get(key) == Some(value)))
    });
    type_matches && data_matches
}
