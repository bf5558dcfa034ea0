//! # Operations
//!
//! The primitive, invertible edits every change to a [`Value`] is made of.
//!
//! ## Semantics
//!
//! - `apply` is deterministic and returns a new value; the input survives
//!   untouched and shares every subtree the operation did not touch.
//! - `invert` produces the operation that undoes this one, so that
//!   `op.invert().apply(op.apply(v))` gives back `v`'s document.
//! - Structural operations never move the selection. Only `insert_text`
//!   and `remove_text` shift selection points that sit in the edited text;
//!   callers keep the selection valid across structural edits themselves.
//!
//! ### Split and merge
//! - `split_node` cuts the node at `path` at `position` (a char offset for
//!   text, a child index otherwise). The right half becomes the next sibling
//!   and takes `properties` as its own key, type and data.
//! - `merge_node` appends the node at `path` onto its previous sibling.
//!   `position` is the size of that sibling beforehand and `properties` are
//!   the merged node's, which makes the two exact inverses.
//!
//! ### Move
//! - `move_node` removes the node at `path` and reinserts it where
//!   `path.transform(op)` says it lands.

use crate::error::{ModelError, ModelResult};
use crate::key::Key;
use crate::mark::{Mark, MarkSet};
use crate::node::{Node, NodeProperties};
use crate::path::Path;
use crate::range::Selection;
use crate::text::Text;
use crate::value::{Value, ValueProperties};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Insert `node` so that it ends up at `path`
    InsertNode { path: Path, node: Node },

    /// Remove the node at `path`; `node` is a copy of what was removed
    RemoveNode { path: Path, node: Node },

    /// Append the node at `path` onto its previous sibling
    MergeNode {
        path: Path,
        position: usize,
        properties: NodeProperties,
    },

    /// Cut the node at `path` in two at `position`
    SplitNode {
        path: Path,
        position: usize,
        properties: NodeProperties,
    },

    MoveNode {
        path: Path,
        #[serde(rename = "newPath")]
        new_path: Path,
    },

    InsertText {
        path: Path,
        offset: usize,
        text: String,
        #[serde(default)]
        marks: MarkSet,
    },

    /// Remove `text` starting at `offset`. `marks` are those the removed
    /// characters carried, so that reinserting restores them.
    RemoveText {
        path: Path,
        offset: usize,
        text: String,
        #[serde(default)]
        marks: MarkSet,
    },

    AddMark {
        path: Path,
        offset: usize,
        length: usize,
        mark: Mark,
    },

    RemoveMark {
        path: Path,
        offset: usize,
        length: usize,
        mark: Mark,
    },

    /// Replace mark `properties` with `new_properties` over a range
    SetMark {
        path: Path,
        offset: usize,
        length: usize,
        properties: Mark,
        #[serde(rename = "newProperties")]
        new_properties: Mark,
    },

    SetNode {
        path: Path,
        properties: NodeProperties,
        #[serde(rename = "newProperties")]
        new_properties: NodeProperties,
    },

    SetSelection {
        properties: Option<Selection>,
        #[serde(rename = "newProperties")]
        new_properties: Option<Selection>,
    },

    SetValue {
        properties: ValueProperties,
        #[serde(rename = "newProperties")]
        new_properties: ValueProperties,
    },
}

impl Operation {
    /// The `type` tag used in JSON and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::InsertNode { .. } => "insert_node",
            Operation::RemoveNode { .. } => "remove_node",
            Operation::MergeNode { .. } => "merge_node",
            Operation::SplitNode { .. } => "split_node",
            Operation::MoveNode { .. } => "move_node",
            Operation::InsertText { .. } => "insert_text",
            Operation::RemoveText { .. } => "remove_text",
            Operation::AddMark { .. } => "add_mark",
            Operation::RemoveMark { .. } => "remove_mark",
            Operation::SetMark { .. } => "set_mark",
            Operation::SetNode { .. } => "set_node",
            Operation::SetSelection { .. } => "set_selection",
            Operation::SetValue { .. } => "set_value",
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Operation::InsertNode { path, .. }
            | Operation::RemoveNode { path, .. }
            | Operation::MergeNode { path, .. }
            | Operation::SplitNode { path, .. }
            | Operation::MoveNode { path, .. }
            | Operation::InsertText { path, .. }
            | Operation::RemoveText { path, .. }
            | Operation::AddMark { path, .. }
            | Operation::RemoveMark { path, .. }
            | Operation::SetMark { path, .. }
            | Operation::SetNode { path, .. } => Some(path),
            Operation::SetSelection { .. } | Operation::SetValue { .. } => None,
        }
    }

    /// Operations that add, remove or reorder nodes, and so may invalidate
    /// paths held elsewhere
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Operation::InsertNode { .. }
                | Operation::RemoveNode { .. }
                | Operation::MergeNode { .. }
                | Operation::SplitNode { .. }
                | Operation::MoveNode { .. }
        )
    }

    /// Operations that change the document, as opposed to selection or
    /// value data
    pub fn is_document_change(&self) -> bool {
        !matches!(self, Operation::SetSelection { .. } | Operation::SetValue { .. })
    }

    pub fn invert(&self) -> Operation {
        match self {
            Operation::InsertNode { path, node } => Operation::RemoveNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::RemoveNode { path, node } => Operation::InsertNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::MergeNode {
                path,
                position,
                properties,
            } => Operation::SplitNode {
                path: path.previous().unwrap_or_else(|| path.clone()),
                position: *position,
                properties: properties.clone(),
            },
            Operation::SplitNode {
                path,
                position,
                properties,
            } => Operation::MergeNode {
                path: path.next().unwrap_or_else(|| path.clone()),
                position: *position,
                properties: properties.clone(),
            },
            Operation::MoveNode { path, new_path } => invert_move(self, path, new_path),
            Operation::InsertText {
                path,
                offset,
                text,
                marks,
            } => Operation::RemoveText {
                path: path.clone(),
                offset: *offset,
                text: text.clone(),
                marks: marks.clone(),
            },
            Operation::RemoveText {
                path,
                offset,
                text,
                marks,
            } => Operation::InsertText {
                path: path.clone(),
                offset: *offset,
                text: text.clone(),
                marks: marks.clone(),
            },
            Operation::AddMark {
                path,
                offset,
                length,
                mark,
            } => Operation::RemoveMark {
                path: path.clone(),
                offset: *offset,
                length: *length,
                mark: mark.clone(),
            },
            Operation::RemoveMark {
                path,
                offset,
                length,
                mark,
            } => Operation::AddMark {
                path: path.clone(),
                offset: *offset,
                length: *length,
                mark: mark.clone(),
            },
            Operation::SetMark {
                path,
                offset,
                length,
                properties,
                new_properties,
            } => Operation::SetMark {
                path: path.clone(),
                offset: *offset,
                length: *length,
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
            Operation::SetNode {
                path,
                properties,
                new_properties,
            } => Operation::SetNode {
                path: path.clone(),
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
            Operation::SetSelection {
                properties,
                new_properties,
            } => Operation::SetSelection {
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
            Operation::SetValue {
                properties,
                new_properties,
            } => Operation::SetValue {
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
        }
    }

    /// Apply to `value`, returning the next value
    pub fn apply(&self, value: &Value) -> ModelResult<Value> {
        let mut next = value.clone();

        match self {
            Operation::InsertNode { path, node } => Self::apply_insert_node(&mut next.document, path, node)?,

            Operation::RemoveNode { path, .. } => {
                Self::apply_remove_node(&mut next.document, path)?;
            }

            Operation::MergeNode { path, .. } => Self::apply_merge_node(&mut next.document, path)?,

            Operation::SplitNode {
                path,
                position,
                properties,
            } => Self::apply_split_node(&mut next.document, path, *position, properties)?,

            Operation::MoveNode { path, new_path } => Self::apply_move_node(&mut next.document, self, path, new_path)?,

            Operation::InsertText {
                path,
                offset,
                text,
                marks,
            } => {
                let target = Self::text_mut(&mut next.document, path)?;
                check_offset(path, *offset, target.len())?;
                target.insert_text(*offset, text, marks);
                next.shift_selection(path, |point| {
                    if *offset <= point {
                        point + text.chars().count()
                    } else {
                        point
                    }
                });
            }

            Operation::RemoveText { path, offset, text, .. } => {
                let length = text.chars().count();
                let target = Self::text_mut(&mut next.document, path)?;
                check_offset(path, offset.saturating_add(length), target.len())?;
                target.remove_text(*offset, length);
                next.shift_selection(path, |point| {
                    if *offset <= point {
                        point - (point - offset).min(length)
                    } else {
                        point
                    }
                });
            }

            Operation::AddMark {
                path,
                offset,
                length,
                mark,
            } => {
                let target = Self::text_mut(&mut next.document, path)?;
                check_offset(path, offset.saturating_add(*length), target.len())?;
                // A mark already present on part of the range would not come back on invert.
                if !target.all_marks_in(*offset, *length, |marks| !marks.contains(mark)) {
                    return Err(ModelError::mark_mismatch(path, *offset, *length, &mark.ty));
                }
                target.add_mark(*offset, *length, mark);
            }

            Operation::RemoveMark {
                path,
                offset,
                length,
                mark,
            } => {
                let target = Self::text_mut(&mut next.document, path)?;
                check_offset(path, offset.saturating_add(*length), target.len())?;
                if !target.all_marks_in(*offset, *length, |marks| marks.contains(mark)) {
                    return Err(ModelError::mark_mismatch(path, *offset, *length, &mark.ty));
                }
                target.remove_mark(*offset, *length, mark);
            }

            Operation::SetMark {
                path,
                offset,
                length,
                properties,
                new_properties,
            } => {
                let target = Self::text_mut(&mut next.document, path)?;
                check_offset(path, offset.saturating_add(*length), target.len())?;
                let clean = target.all_marks_in(*offset, *length, |marks| {
                    marks.contains(properties) && (properties == new_properties || !marks.contains(new_properties))
                });
                if !clean {
                    return Err(ModelError::mark_mismatch(path, *offset, *length, &properties.ty));
                }
                target.set_mark(*offset, *length, properties, new_properties);
            }

            Operation::SetNode {
                path, new_properties, ..
            } => {
                next.document.assert_node_mut(path)?.set_properties(new_properties);
            }

            Operation::SetSelection { new_properties, .. } => {
                next.selection = new_properties.clone();
            }

            Operation::SetValue { new_properties, .. } => {
                if let Some(data) = &new_properties.data {
                    next.data = data.clone();
                }
            }
        }

        Ok(next)
    }

    fn text_mut<'a>(document: &'a mut Node, path: &Path) -> ModelResult<&'a mut Text> {
        document
            .assert_node_mut(path)?
            .as_text_mut()
            .ok_or_else(|| ModelError::NotText(path.clone()))
    }

    fn children_mut<'a>(document: &'a mut Node, parent: &Path) -> ModelResult<&'a mut Vec<Node>> {
        Ok(document
            .assert_node_mut(parent)?
            .as_element_mut()
            .ok_or_else(|| ModelError::NotElement(parent.clone()))?
            .nodes_mut())
    }

    fn apply_insert_node(document: &mut Node, path: &Path, node: &Node) -> ModelResult<()> {
        let (parent, index) = split_last(path)?;
        let children = Self::children_mut(document, &parent)?;
        if index > children.len() {
            return Err(ModelError::InvalidPath(path.clone()));
        }
        children.insert(index, node.clone());
        Ok(())
    }

    fn apply_remove_node(document: &mut Node, path: &Path) -> ModelResult<Node> {
        let (parent, index) = split_last(path)?;
        let children = Self::children_mut(document, &parent)?;
        if index >= children.len() {
            return Err(ModelError::InvalidPath(path.clone()));
        }
        Ok(children.remove(index))
    }

    fn apply_merge_node(document: &mut Node, path: &Path) -> ModelResult<()> {
        let (parent, index) = split_last(path)?;
        if index == 0 {
            return Err(ModelError::NoPreviousSibling(path.clone()));
        }
        let children = Self::children_mut(document, &parent)?;
        if index >= children.len() {
            return Err(ModelError::InvalidPath(path.clone()));
        }
        if children[index].object() != children[index - 1].object() {
            return Err(ModelError::MergeMismatch(path.clone()));
        }

        let node = children.remove(index);
        match (&mut children[index - 1], node) {
            (Node::Text(prev), Node::Text(text)) => prev.append_leaves(text.leaves().to_vec()),
            (prev, node) => {
                if let Some(element) = prev.as_element_mut() {
                    element.nodes_mut().extend(node.nodes().iter().cloned());
                }
            }
        }
        Ok(())
    }

    fn apply_split_node(
        document: &mut Node,
        path: &Path,
        position: usize,
        properties: &NodeProperties,
    ) -> ModelResult<()> {
        let (parent, index) = split_last(path)?;
        let children = Self::children_mut(document, &parent)?;
        let node = children
            .get_mut(index)
            .ok_or_else(|| ModelError::InvalidPath(path.clone()))?;

        let size = node.size();
        if position > size {
            return Err(ModelError::offset_out_of_range(path, position, size));
        }

        let key = properties.key.clone().unwrap_or_else(Key::generate);
        let mut right = if node.is_text() {
            let leaves = node.as_text_mut().map(|t| t.split_off(position)).unwrap_or_default();
            Node::Text(Text::from_leaves(key, leaves))
        } else {
            let mut right = node.clone();
            right.set_key(key);
            if let (Some(left), Some(new)) = (node.as_element_mut(), right.as_element_mut()) {
                let tail = left.nodes_mut().split_off(position);
                new.set_nodes(tail);
            }
            right
        };
        right.set_properties(&NodeProperties {
            key: None,
            ..properties.clone()
        });

        children.insert(index + 1, right);
        Ok(())
    }

    fn apply_move_node(document: &mut Node, op: &Operation, path: &Path, new_path: &Path) -> ModelResult<()> {
        if path == new_path {
            return Ok(());
        }
        if path.is_ancestor_of(new_path) {
            return Err(ModelError::CannotMoveIntoSelf {
                path: path.clone(),
                new_path: new_path.clone(),
            });
        }

        let node = Self::apply_remove_node(document, path)?;
        let landing = path
            .transform(op)
            .ok_or_else(|| ModelError::InvalidPath(new_path.clone()))?;
        Self::apply_insert_node(document, &landing, &node)
    }
}

fn split_last(path: &Path) -> ModelResult<(Path, usize)> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(ModelError::RootOperation),
    }
}

fn check_offset(path: &Path, offset: usize, length: usize) -> ModelResult<()> {
    if offset > length {
        return Err(ModelError::offset_out_of_range(path, offset, length));
    }
    Ok(())
}

fn invert_move(op: &Operation, path: &Path, new_path: &Path) -> Operation {
    if path == new_path {
        return op.clone();
    }

    // Sibling moves are stable with respect to each other.
    if path.is_sibling_of(new_path) {
        return Operation::MoveNode {
            path: new_path.clone(),
            new_path: path.clone(),
        };
    }

    // Otherwise find where the node landed, and where the slot it left now
    // sits, by pushing both addresses through the move itself.
    let landed = path.transform(op).unwrap_or_else(|| new_path.clone());
    let vacated = path
        .next()
        .and_then(|next| next.transform(op))
        .unwrap_or_else(|| path.clone());
    Operation::MoveNode {
        path: landed,
        new_path: vacated,
    }
}
