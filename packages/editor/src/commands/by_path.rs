//! Commands addressed at a single node by path or key. These are the only
//! commands that build operations directly.

use super::emptied;
use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::queries::split_properties;
use quire_model::{Element, Key, Leaf, Mark, MarkSet, ModelError, Node, NodeProperties, Operation, Path};

impl Editor {
    /// Insert `node` as child `index` of `parent`. A node whose keys are
    /// already in the document goes in with fresh ones.
    pub fn insert_node_by_path(&mut self, parent: &Path, index: usize, node: Node) -> EditorResult<()> {
        let node = self.with_unique_keys(node);
        self.command(|editor| {
            editor.apply(Operation::InsertNode {
                path: parent.child(index),
                node,
            })
        })
    }

    pub fn insert_node_by_key(&mut self, parent: &Key, index: usize, node: Node) -> EditorResult<()> {
        let path = self.document().assert_path_by_key(parent)?;
        self.insert_node_by_path(&path, index, node)
    }

    /// Insert `text` into the text at `path`. Without explicit `marks` the
    /// text takes the marks of the character before `offset`.
    pub fn insert_text_by_path(
        &mut self,
        path: &Path,
        offset: usize,
        text: &str,
        marks: Option<MarkSet>,
    ) -> EditorResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let marks = match marks {
            Some(marks) => marks,
            None => self.document().assert_text(path)?.marks_at(offset),
        };
        self.command(|editor| {
            editor.apply(Operation::InsertText {
                path: path.clone(),
                offset,
                text: text.to_string(),
                marks,
            })
        })
    }

    /// Remove `length` chars. One operation is applied per run of equal
    /// marks, last run first, so each carries the marks it removed.
    pub fn remove_text_by_path(&mut self, path: &Path, offset: usize, length: usize) -> EditorResult<()> {
        if length == 0 {
            return Ok(());
        }
        let text = self.document().assert_text(path)?;
        let end = offset.saturating_add(length);
        if end > text.len() {
            return Err(ModelError::offset_out_of_range(path, end, text.len()).into());
        }

        let runs = runs_in(text.leaves_in(offset, length), offset);
        self.command(|editor| {
            for (start, leaf) in runs.into_iter().rev() {
                editor.apply(Operation::RemoveText {
                    path: path.clone(),
                    offset: start,
                    text: leaf.text,
                    marks: leaf.marks,
                })?;
            }
            Ok(())
        })
    }

    pub fn remove_node_by_path(&mut self, path: &Path) -> EditorResult<()> {
        let node = self.document().assert_node(path)?.clone();
        self.command(|editor| {
            editor.apply(Operation::RemoveNode {
                path: path.clone(),
                node,
            })
        })
    }

    pub fn remove_node_by_key(&mut self, key: &Key) -> EditorResult<()> {
        let path = self.document().assert_path_by_key(key)?;
        self.remove_node_by_path(&path)
    }

    /// Merge the node at `path` into its previous sibling
    pub fn merge_node_by_path(&mut self, path: &Path) -> EditorResult<()> {
        let document = self.document();
        let node = document.assert_node(path)?;
        let previous = path
            .previous()
            .and_then(|previous| document.get_node(&previous))
            .ok_or_else(|| ModelError::NoPreviousSibling(path.clone()))?;

        let op = Operation::MergeNode {
            path: path.clone(),
            position: previous.size(),
            properties: node.properties(),
        };
        self.command(|editor| editor.apply(op))
    }

    pub fn merge_node_by_key(&mut self, key: &Key) -> EditorResult<()> {
        let path = self.document().assert_path_by_key(key)?;
        self.merge_node_by_path(&path)
    }

    /// Split the node at `path` at `position`. The right half gets a new key
    /// and the same type and data.
    pub fn split_node_by_path(&mut self, path: &Path, position: usize) -> EditorResult<()> {
        self.document().assert_node(path)?;
        let properties = split_properties(self.document(), path);
        self.command(|editor| {
            editor.apply(Operation::SplitNode {
                path: path.clone(),
                position,
                properties,
            })
        })
    }

    /// Split every node from the text at `text_path` up to and including
    /// the node at `path`, so that `path` ends at `text_offset`
    pub fn split_descendants_by_path(&mut self, path: &Path, text_path: &Path, text_offset: usize) -> EditorResult<()> {
        if path == text_path {
            return self.split_node_by_path(path, text_offset);
        }
        if !path.is_ancestor_of(text_path) {
            return Err(ModelError::InvalidPath(text_path.clone()).into());
        }

        self.without_normalizing(|editor| {
            let mut target = text_path.clone();
            let mut position = text_offset;
            loop {
                editor.split_node_by_path(&target, position)?;
                if &target == path {
                    return Ok(());
                }
                position = target.last().unwrap_or_default() + 1;
                target = target.parent().ok_or(ModelError::RootOperation)?;
            }
        })
    }

    /// Move the node at `path` so it becomes child `index` of the node at
    /// `new_parent`. Both are addressed in the tree before the move.
    pub fn move_node_by_path(&mut self, path: &Path, new_parent: &Path, index: usize) -> EditorResult<()> {
        let new_path = new_parent.child(index);
        if &new_path == path {
            return Ok(());
        }
        self.command(|editor| {
            editor.apply(Operation::MoveNode {
                path: path.clone(),
                new_path,
            })
        })
    }

    pub fn move_node_by_key(&mut self, key: &Key, new_parent: &Key, index: usize) -> EditorResult<()> {
        let document = self.document();
        let path = document.assert_path_by_key(key)?;
        let parent = document.assert_path_by_key(new_parent)?;
        self.move_node_by_path(&path, &parent, index)
    }

    pub fn set_node_by_path(&mut self, path: &Path, properties: NodeProperties) -> EditorResult<()> {
        let node = self.document().assert_node(path)?;
        let op = Operation::SetNode {
            path: path.clone(),
            properties: node.pick_properties(&properties),
            new_properties: properties,
        };
        self.command(|editor| editor.apply(op))
    }

    pub fn set_node_by_key(&mut self, key: &Key, properties: NodeProperties) -> EditorResult<()> {
        let path = self.document().assert_path_by_key(key)?;
        self.set_node_by_path(&path, properties)
    }

    pub fn replace_node_by_path(&mut self, path: &Path, node: Node) -> EditorResult<()> {
        let parent = path.parent().ok_or(ModelError::RootOperation)?;
        let index = path.last().unwrap_or_default();
        self.without_normalizing(|editor| {
            editor.remove_node_by_path(path)?;
            editor.insert_node_by_path(&parent, index, node)
        })
    }

    /// Add `mark` to each run in the span that lacks it
    pub fn add_mark_by_path(&mut self, path: &Path, offset: usize, length: usize, mark: &Mark) -> EditorResult<()> {
        let runs = self.mark_runs(path, offset, length, |marks| !marks.contains(mark))?;
        self.command(|editor| {
            for (start, len) in runs {
                editor.apply(Operation::AddMark {
                    path: path.clone(),
                    offset: start,
                    length: len,
                    mark: mark.clone(),
                })?;
            }
            Ok(())
        })
    }

    /// Remove `mark` from each run in the span that has it
    pub fn remove_mark_by_path(&mut self, path: &Path, offset: usize, length: usize, mark: &Mark) -> EditorResult<()> {
        let runs = self.mark_runs(path, offset, length, |marks| marks.contains(mark))?;
        self.command(|editor| {
            for (start, len) in runs {
                editor.apply(Operation::RemoveMark {
                    path: path.clone(),
                    offset: start,
                    length: len,
                    mark: mark.clone(),
                })?;
            }
            Ok(())
        })
    }

    pub fn set_mark_by_path(
        &mut self,
        path: &Path,
        offset: usize,
        length: usize,
        mark: &Mark,
        new_mark: Mark,
    ) -> EditorResult<()> {
        let runs = self.mark_runs(path, offset, length, |marks| marks.contains(mark))?;
        let text = self.document().assert_text(path)?;
        let runs: Vec<(usize, usize, bool)> = runs
            .into_iter()
            .map(|(start, len)| {
                let both = *mark != new_mark && text.all_marks_in(start, len, |marks| marks.contains(&new_mark));
                (start, len, both)
            })
            .collect();

        self.command(|editor| {
            for (start, len, both) in runs {
                // Where the new mark is already present the old one just goes away.
                let op = if both {
                    Operation::RemoveMark {
                        path: path.clone(),
                        offset: start,
                        length: len,
                        mark: mark.clone(),
                    }
                } else {
                    Operation::SetMark {
                        path: path.clone(),
                        offset: start,
                        length: len,
                        properties: mark.clone(),
                        new_properties: new_mark.clone(),
                    }
                };
                editor.apply(op)?;
            }
            Ok(())
        })
    }

    /// Strip every mark from every text at or below `path`
    pub fn remove_all_marks_by_path(&mut self, path: &Path) -> EditorResult<()> {
        let node = self.document().assert_node(path)?;
        let texts: Vec<(Path, usize, MarkSet)> = match node {
            Node::Text(text) => vec![(path.clone(), text.len(), text.marks_in(0, text.len()))],
            node => node
                .texts()
                .map(|(text, relative)| (path.concat(&relative), text.len(), text.marks_in(0, text.len())))
                .collect(),
        };

        self.without_normalizing(|editor| {
            for (text_path, len, marks) in texts {
                for mark in &marks {
                    editor.remove_mark_by_path(&text_path, 0, len, mark)?;
                }
            }
            Ok(())
        })
    }

    /// Insert the children of `fragment` at `index` under `parent`, with
    /// fresh keys
    pub fn insert_fragment_by_path(&mut self, parent: &Path, index: usize, fragment: &Node) -> EditorResult<()> {
        self.without_normalizing(|editor| {
            for (i, node) in fragment.nodes().iter().enumerate() {
                editor.insert_node_by_path(parent, index + i, node.regenerate_keys())?;
            }
            Ok(())
        })
    }

    /// Put the node at `path` inside an empty copy of `wrapper`, which takes
    /// its place
    pub fn wrap_node_by_path(&mut self, path: &Path, wrapper: &Node) -> EditorResult<()> {
        let parent = path.parent().ok_or(ModelError::RootOperation)?;
        let index = path.last().unwrap_or_default();
        let wrapper = emptied(wrapper);
        self.without_normalizing(|editor| {
            editor.insert_node_by_path(&parent, index, wrapper)?;
            editor.move_node_by_path(&parent.child(index + 1), &parent.child(index), 0)
        })
    }

    pub fn wrap_block_by_path(&mut self, path: &Path, block: Element) -> EditorResult<()> {
        self.wrap_node_by_path(path, &Node::Block(block))
    }

    pub fn wrap_inline_by_path(&mut self, path: &Path, inline: Element) -> EditorResult<()> {
        self.wrap_node_by_path(path, &Node::Inline(inline))
    }

    /// Lift the node at `path` out of its parent, splitting the parent if
    /// the node is in the middle of it
    pub fn unwrap_node_by_path(&mut self, path: &Path) -> EditorResult<()> {
        let document = self.document();
        document.assert_node(path)?;
        let parent_path = path.parent().ok_or(ModelError::RootOperation)?;
        let grand = parent_path.parent().ok_or(ModelError::RootOperation)?;
        let count = document.assert_node(&parent_path)?.nodes().len();
        let index = path.last().unwrap_or_default();
        let parent_index = parent_path.last().unwrap_or_default();

        self.without_normalizing(|editor| {
            if count == 1 {
                editor.move_node_by_path(path, &grand, parent_index + 1)?;
                editor.remove_node_by_path(&parent_path)
            } else if index == 0 {
                editor.move_node_by_path(path, &grand, parent_index)
            } else if index == count - 1 {
                editor.move_node_by_path(path, &grand, parent_index + 1)
            } else {
                editor.split_node_by_path(&parent_path, index)?;
                let moved = grand.child(parent_index + 1).child(0);
                editor.move_node_by_path(&moved, &grand, parent_index + 1)
            }
        })
    }

    pub fn unwrap_node_by_key(&mut self, key: &Key) -> EditorResult<()> {
        let path = self.document().assert_path_by_key(key)?;
        self.unwrap_node_by_path(&path)
    }

    /// Replace the node at `path` with its children
    pub fn unwrap_children_by_path(&mut self, path: &Path) -> EditorResult<()> {
        let parent = path.parent().ok_or(ModelError::RootOperation)?;
        let index = path.last().unwrap_or_default();
        let count = self.document().assert_node(path)?.nodes().len();

        self.without_normalizing(|editor| {
            for child in (0..count).rev() {
                editor.move_node_by_path(&path.child(child), &parent, index + 1)?;
            }
            editor.remove_node_by_path(path)
        })
    }

    /// Runs of `[offset, offset + length)` in the text at `path` whose marks
    /// satisfy `wanted`, as `(offset, length)`
    fn mark_runs(
        &self,
        path: &Path,
        offset: usize,
        length: usize,
        wanted: impl Fn(&MarkSet) -> bool,
    ) -> EditorResult<Vec<(usize, usize)>> {
        let text = self.document().assert_text(path)?;
        let end = offset.saturating_add(length);
        if end > text.len() {
            return Err(ModelError::offset_out_of_range(path, end, text.len()).into());
        }
        Ok(runs_in(text.leaves_in(offset, length), offset)
            .into_iter()
            .filter(|(_, leaf)| !leaf.is_empty() && wanted(&leaf.marks))
            .map(|(start, leaf)| (start, leaf.len()))
            .collect())
    }
}

/// Pair each leaf with the offset it starts at
fn runs_in(leaves: Vec<Leaf>, offset: usize) -> Vec<(usize, Leaf)> {
    let mut start = offset;
    leaves
        .into_iter()
        .map(|leaf| {
            let at = start;
            start += leaf.len();
            (at, leaf)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::Editor;
    use pretty_assertions::assert_eq;
    use quire_model::{Element, Mark, MarkSet, Node, Object, Operation, Path, Value};

    fn editor(document: Node) -> Editor {
        Editor::new(Value::new(document)).unwrap()
    }

    fn paragraphs(texts: &[&str]) -> Node {
        Node::document(
            texts
                .iter()
                .map(|text| Node::block("paragraph", vec![Node::new_text(*text)]))
                .collect(),
        )
    }

    fn texts(editor: &Editor) -> Vec<String> {
        editor.document().nodes().iter().map(Node::text).collect()
    }

    #[test]
    fn test_split_then_merge_is_identity() {
        let mut editor = editor(paragraphs(&["hello"]));
        editor
            .without_normalizing(|editor| {
                editor.split_node_by_path(&Path::from([0, 0]), 2)?;
                assert_eq!(editor.document().nodes()[0].nodes().len(), 2);
                editor.merge_node_by_path(&Path::from([0, 1]))
            })
            .unwrap();

        let block = &editor.document().nodes()[0];
        assert_eq!(block.nodes().len(), 1);
        assert_eq!(block.nodes()[0].text(), "hello");
    }

    #[test]
    fn test_remove_text_emits_one_op_per_run() {
        let mut first = quire_model::Text::new("plain bold");
        first.add_mark(6, 4, &Mark::new("bold"));
        let mut editor = editor(Node::document(vec![Node::block("paragraph", vec![Node::Text(first)])]));

        editor.remove_text_by_path(&Path::from([0, 0]), 3, 5).unwrap();
        assert_eq!(editor.document().text(), "plald");

        let removed: Vec<(usize, String)> = editor
            .operations()
            .iter()
            .filter_map(|op| match op {
                Operation::RemoveText { offset, text, .. } => Some((*offset, text.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(removed, vec![(6, "bo".to_string()), (3, "in ".to_string())]);
    }

    #[test]
    fn test_add_mark_skips_runs_that_have_it() {
        let bold = Mark::new("bold");
        let mut editor = editor(Node::document(vec![Node::block(
            "paragraph",
            vec![Node::marked_text("ab", MarkSet::new().with(bold.clone())), Node::new_text("cd")],
        )]));
        // The two texts are merged by normalization into one text with two runs.
        let path = Path::from([0, 0]);
        editor.add_mark_by_path(&path, 0, 4, &bold).unwrap();

        let added = editor
            .operations()
            .iter()
            .filter(|op| matches!(op, Operation::AddMark { .. }))
            .count();
        assert_eq!(added, 1);
        let text = editor.document().assert_text(&path).unwrap();
        assert_eq!(text.leaves().len(), 1);
    }

    #[test]
    fn test_split_descendants() {
        let mut editor = editor(Node::document(vec![Node::block(
            "quote",
            vec![Node::block("paragraph", vec![Node::new_text("onetwo")])],
        )]));
        editor
            .split_descendants_by_path(&Path::from([0]), &Path::from([0, 0, 0]), 3)
            .unwrap();
        assert_eq!(texts(&editor), vec!["one", "two"]);
        assert_eq!(editor.document().nodes()[1].ty(), Some("quote"));
        assert_ne!(editor.document().nodes()[0].key(), editor.document().nodes()[1].key());
    }

    #[test]
    fn test_wrap_and_unwrap_children() {
        let mut editor = editor(paragraphs(&["a", "b"]));
        editor
            .wrap_block_by_path(&Path::from([1]), Element::new("quote", vec![]))
            .unwrap();
        let quote = &editor.document().nodes()[1];
        assert_eq!(quote.ty(), Some("quote"));
        assert_eq!(quote.nodes()[0].ty(), Some("paragraph"));

        editor.unwrap_children_by_path(&Path::from([1])).unwrap();
        assert_eq!(texts(&editor), vec!["a", "b"]);
        assert!(editor.document().nodes().iter().all(|n| n.ty() == Some("paragraph")));
    }

    #[test]
    fn test_unwrap_node_from_middle_splits_parent() {
        let mut editor = editor(Node::document(vec![Node::block(
            "list",
            vec![
                Node::block("item", vec![Node::new_text("1")]),
                Node::block("item", vec![Node::new_text("2")]),
                Node::block("item", vec![Node::new_text("3")]),
            ],
        )]));
        editor.unwrap_node_by_path(&Path::from([0, 1])).unwrap();

        let types: Vec<Option<&str>> = editor.document().nodes().iter().map(Node::ty).collect();
        assert_eq!(types, vec![Some("list"), Some("item"), Some("list")]);
        assert_eq!(texts(&editor), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_move_node_lands_at_index() {
        let mut editor = editor(paragraphs(&["a", "b", "c"]));
        editor.move_node_by_path(&Path::from([0]), &Path::root(), 2).unwrap();
        assert_eq!(texts(&editor), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_fragment_gets_fresh_keys() {
        let mut editor = editor(paragraphs(&["a"]));
        let fragment = editor.document().clone();
        editor.insert_fragment_by_path(&Path::root(), 1, &fragment).unwrap();

        let doc = editor.document();
        assert_eq!(doc.nodes().len(), 2);
        assert_ne!(doc.nodes()[0].key(), doc.nodes()[1].key());
        assert_eq!(doc.nodes()[1].object(), Object::Block);
    }

    #[test]
    fn test_merge_without_previous_sibling_fails() {
        let mut editor = editor(paragraphs(&["a"]));
        assert!(editor.merge_node_by_path(&Path::from([0])).is_err());
        assert_eq!(texts(&editor), vec!["a"]);
    }
}
