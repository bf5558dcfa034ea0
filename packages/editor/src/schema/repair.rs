//! The repair used when a failing rule has no `normalize` of its own.
//!
//! | codes                                             | repair                         |
//! |---------------------------------------------------|--------------------------------|
//! | `child_*`, `first_child_*`, `last_child_*`        | remove the child               |
//! | `child_min_invalid`, `node_text_invalid`, ...     | remove the node                |
//! | `parent_*`                                        | remove the misplaced node      |
//! | `previous_sibling_*`, `next_sibling_*`            | remove that sibling            |
//! | `node_data_invalid`                               | drop the key, or the node      |
//! | `node_mark_invalid`                               | strip the mark from every text |
//!
//! A text that is the only child of a block is never removed on its own;
//! the block goes instead, since an empty block would just get it back.

use super::{SchemaViolation, ViolationCode};
use crate::editor::Editor;
use crate::errors::EditorResult;
use quire_model::{Node, NodeProperties};
use tracing::trace;

pub(crate) fn default_normalize(editor: &mut Editor, violation: &SchemaViolation) -> EditorResult<()> {
    use ViolationCode::*;

    let node = &violation.node;
    trace!(code = violation.code(), path = %violation.path, "default repair");

    match &violation.code {
        ChildMaxInvalid | ChildObjectInvalid | ChildTypeInvalid | ChildDataInvalid | ChildUnknown
        | FirstChildObjectInvalid | FirstChildTypeInvalid | FirstChildDataInvalid | LastChildObjectInvalid
        | LastChildTypeInvalid | LastChildDataInvalid | AdjacentTexts | ExtraEmptyText => {
            let Some(child) = &violation.child else {
                return editor.remove_node_by_key(node.key());
            };
            if child.is_text() && node.is_block() && node.nodes().len() == 1 {
                editor.remove_node_by_key(node.key())
            } else {
                editor.remove_node_by_key(child.key())
            }
        }

        NextSiblingObjectInvalid | NextSiblingTypeInvalid | NextSiblingDataInvalid => match &violation.next {
            Some(next) => editor.remove_node_by_key(next.key()),
            None => Ok(()),
        },

        PreviousSiblingObjectInvalid | PreviousSiblingTypeInvalid | PreviousSiblingDataInvalid => {
            match &violation.previous {
                Some(previous) => editor.remove_node_by_key(previous.key()),
                None => Ok(()),
            }
        }

        NodeDataInvalid => {
            let key = violation.key.as_deref().unwrap_or_default();
            let missing = node.data().map_or(true, |d| !d.contains_key(key));
            if missing && !node.is_document() {
                return editor.remove_node_by_key(node.key());
            }
            let mut data = node.data().cloned().unwrap_or_default();
            data.remove(key);
            editor.set_node_by_key(
                node.key(),
                NodeProperties {
                    data: Some(data),
                    ..Default::default()
                },
            )
        }

        NodeMarkInvalid => {
            let Some(mark) = &violation.mark else {
                return Ok(());
            };
            let Some(path) = editor.document().path_by_key(node.key()) else {
                return Ok(());
            };
            editor.without_normalizing(|editor| {
                let texts: Vec<_> = match editor.document().get_node(&path) {
                    Some(Node::Text(text)) => vec![(path.clone(), text.len())],
                    Some(node) => node
                        .texts()
                        .map(|(text, relative)| (path.concat(&relative), text.len()))
                        .collect(),
                    None => Vec::new(),
                };
                for (text_path, len) in texts {
                    editor.remove_mark_by_path(&text_path, 0, len, mark)?;
                }
                Ok(())
            })
        }

        ChildMinInvalid | NodeTextInvalid | NodeObjectInvalid | NodeTypeInvalid | ParentObjectInvalid
        | ParentTypeInvalid | ParentDataInvalid | Custom(_) => {
            if node.is_document() {
                let keys: Vec<_> = node.nodes().iter().map(|n| n.key().clone()).collect();
                editor.without_normalizing(|editor| {
                    for key in &keys {
                        editor.remove_node_by_key(key)?;
                    }
                    Ok(())
                })
            } else {
                editor.remove_node_by_key(node.key())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{ChildGroup, Match, Rule, Schema, SchemaDefinition};
    use crate::Editor;
    use quire_model::{Mark, MarkSet, Node, Path, Value};
    use serde_json::json;

    fn build(definition: SchemaDefinition, document: Node) -> Editor {
        Editor::builder(Value::new(document))
            .schema(Schema::new(definition))
            .build()
            .unwrap()
    }

    #[test]
    fn test_removes_unexpected_child() {
        let mut definition = SchemaDefinition::default();
        definition.blocks.insert(
            "list".into(),
            Rule::default().with_nodes(vec![ChildGroup::new(vec![Match::block("item")])]),
        );
        let editor = build(
            definition,
            Node::document(vec![Node::block(
                "list",
                vec![
                    Node::block("item", vec![Node::new_text("one")]),
                    Node::block("paragraph", vec![Node::new_text("stray")]),
                    Node::block("item", vec![Node::new_text("two")]),
                ],
            )]),
        );

        let list = editor.document().get_node(&Path::from([0])).unwrap();
        assert_eq!(list.nodes().len(), 2);
        assert_eq!(list.text(), "onetwo");
    }

    #[test]
    fn test_strips_disallowed_marks() {
        let mut definition = SchemaDefinition::default();
        definition
            .blocks
            .insert("code".into(), Rule::default().with_marks(Vec::<String>::new()));
        let bold = MarkSet::new().with(Mark::new("bold"));
        let editor = build(
            definition,
            Node::document(vec![Node::block("code", vec![Node::marked_text("let", bold)])]),
        );

        assert!(!editor.document().has_mark_type("bold"));
        assert_eq!(editor.document().text(), "let");
    }

    #[test]
    fn test_invalid_data_key_is_dropped() {
        let mut definition = SchemaDefinition::default();
        definition.document = Some(Rule::default().with_data("version", |v| v.is_none()));
        let mut value = Value::new(Node::document(vec![Node::block("p", vec![Node::new_text("")])]));
        if let Node::Document(doc) = &mut value.document {
            doc.data.insert("version".into(), json!(2));
        }

        let editor = Editor::builder(value)
            .schema(Schema::new(definition))
            .build()
            .unwrap();
        assert!(editor.document().data().unwrap().get("version").is_none());
        assert_eq!(editor.document().nodes().len(), 1);
    }
}
