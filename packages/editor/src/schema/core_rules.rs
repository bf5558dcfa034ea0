//! Tree-shape rules every schema starts with.
//!
//! Each repairs every occurrence in the node at once, so a node full of
//! problems converges in one iteration per rule.

use super::{Match, Rule, SchemaViolation, ViolationCode};
use crate::editor::Editor;
use quire_model::{Node, Object, Path};

pub(super) fn rules() -> Vec<Rule> {
    vec![
        only_blocks_in_document(),
        uniform_block_children(),
        no_blocks_in_inlines(),
        filler_text(),
        no_empty_inlines(),
        texts_around_inlines(),
        merge_adjacent_texts(),
        no_extra_empty_texts(),
    ]
}

fn elements() -> Vec<Match> {
    vec![Match::object(Object::Block), Match::object(Object::Inline)]
}

/// Report the first child `invalid` accepts
fn first_invalid_child(
    node: &Node,
    path: &Path,
    code: ViolationCode,
    invalid: impl Fn(usize, &Node) -> bool,
) -> Option<SchemaViolation> {
    node.nodes()
        .iter()
        .enumerate()
        .find(|(i, child)| invalid(*i, child))
        .map(|(i, child)| SchemaViolation::new(code, node, path).with_child(child, i))
}

/// Remove every child of the violating node that `invalid` accepts
fn remove_children(editor: &mut Editor, violation: &SchemaViolation, invalid: impl Fn(&Editor, usize, &Node) -> bool) -> crate::EditorResult<()> {
    let Some(path) = editor.document().path_by_key(violation.node.key()) else {
        return Ok(());
    };
    let doomed: Vec<_> = editor
        .document()
        .get_node(&path)
        .map(|node| {
            node.nodes()
                .iter()
                .enumerate()
                .filter(|(i, child)| invalid(editor, *i, child))
                .map(|(_, child)| child.key().clone())
                .collect()
        })
        .unwrap_or_default();

    editor.without_normalizing(|editor| {
        for key in &doomed {
            editor.remove_node_by_key(key)?;
        }
        Ok(())
    })
}

fn only_blocks_in_document() -> Rule {
    Rule::new(vec![Match::object(Object::Document)])
        .with_validate(|_, node, path| {
            first_invalid_child(node, path, ViolationCode::ChildObjectInvalid, |_, child| !child.is_block())
        })
        .with_normalize(|editor, violation| remove_children(editor, violation, |_, _, child| !child.is_block()))
}

/// A block holds either blocks, or inlines and texts. The first child
/// decides which.
fn uniform_block_children() -> Rule {
    fn wants_blocks(node: &Node) -> bool {
        node.nodes().first().is_some_and(Node::is_block)
    }

    Rule::new(vec![Match::object(Object::Block)])
        .with_validate(|_, node, path| {
            let blocks = wants_blocks(node);
            first_invalid_child(node, path, ViolationCode::ChildObjectInvalid, |_, child| {
                child.is_block() != blocks
            })
        })
        .with_normalize(|editor, violation| {
            let blocks = wants_blocks(&violation.node);
            remove_children(editor, violation, |_, _, child| child.is_block() != blocks)
        })
}

fn no_blocks_in_inlines() -> Rule {
    Rule::new(vec![Match::object(Object::Inline)])
        .with_validate(|_, node, path| {
            first_invalid_child(node, path, ViolationCode::ChildObjectInvalid, |_, child| child.is_block())
        })
        .with_normalize(|editor, violation| remove_children(editor, violation, |_, _, child| child.is_block()))
}

fn filler_text() -> Rule {
    Rule::new(elements())
        .with_validate(|_, node, path| {
            node.nodes()
                .is_empty()
                .then(|| SchemaViolation::new(ViolationCode::ChildMinInvalid, node, path).with_index(0))
        })
        .with_normalize(|editor, violation| {
            editor.insert_node_by_key(violation.node.key(), 0, Node::new_text(""))
        })
}

fn no_empty_inlines() -> Rule {
    fn is_empty_inline(editor: &Editor, child: &Node) -> bool {
        editor.is_inline(child) && child.text_len() == 0 && !editor.is_void(child)
    }

    Rule::new(elements())
        .with_validate(|editor, node, path| {
            first_invalid_child(node, path, ViolationCode::ChildObjectInvalid, |_, child| {
                is_empty_inline(editor, child)
            })
        })
        .with_normalize(|editor, violation| {
            remove_children(editor, violation, |editor, _, child| is_empty_inline(editor, child))
        })
}

/// Every inline has a text on each side, so there is always somewhere to
/// put the caret next to it.
fn texts_around_inlines() -> Rule {
    fn needs_text_before(editor: &Editor, nodes: &[Node], i: usize) -> bool {
        editor.is_inline(&nodes[i]) && (i == 0 || !nodes[i - 1].is_text())
    }

    fn needs_text_after(editor: &Editor, nodes: &[Node], i: usize) -> bool {
        editor.is_inline(&nodes[i]) && nodes.get(i + 1).map_or(true, |next| !next.is_text())
    }

    Rule::new(elements())
        .with_validate(|editor, node, path| {
            let nodes = node.nodes();
            (0..nodes.len()).find_map(|i| {
                let before = needs_text_before(editor, nodes, i);
                let after = needs_text_after(editor, nodes, i);
                if before {
                    let previous = i.checked_sub(1).and_then(|p| nodes.get(p));
                    Some(
                        SchemaViolation::new(ViolationCode::PreviousSiblingObjectInvalid, node, path)
                            .with_child(&nodes[i], i)
                            .with_previous(previous),
                    )
                } else if after {
                    Some(
                        SchemaViolation::new(ViolationCode::NextSiblingObjectInvalid, node, path)
                            .with_child(&nodes[i], i)
                            .with_next(nodes.get(i + 1)),
                    )
                } else {
                    None
                }
            })
        })
        .with_normalize(|editor, violation| {
            let key = violation.node.key().clone();
            let Some(nodes) = editor
                .document()
                .path_by_key(&key)
                .and_then(|path| editor.document().get_node(&path))
                .map(|node| node.nodes().to_vec())
            else {
                return Ok(());
            };

            let needs: Vec<(bool, bool)> = (0..nodes.len())
                .map(|i| (needs_text_before(editor, &nodes, i), needs_text_after(editor, &nodes, i)))
                .collect();

            editor.without_normalizing(|editor| {
                // Back to front, so earlier indexes stay put.
                for (i, (before, after)) in needs.into_iter().enumerate().rev() {
                    if after {
                        editor.insert_node_by_key(&key, i + 1, Node::new_text(""))?;
                    }
                    if before {
                        editor.insert_node_by_key(&key, i, Node::new_text(""))?;
                    }
                }
                Ok(())
            })
        })
}

fn merge_adjacent_texts() -> Rule {
    fn adjacent(nodes: &[Node], i: usize) -> bool {
        i > 0 && nodes[i].is_text() && nodes[i - 1].is_text()
    }

    Rule::new(elements())
        .with_validate(|_, node, path| {
            let nodes = node.nodes();
            first_invalid_child(node, path, ViolationCode::AdjacentTexts, |i, _| adjacent(nodes, i))
        })
        .with_normalize(|editor, violation| {
            let Some(path) = editor.document().path_by_key(violation.node.key()) else {
                return Ok(());
            };
            let nodes = match editor.document().get_node(&path) {
                Some(node) => node.nodes().to_vec(),
                None => return Ok(()),
            };

            editor.without_normalizing(|editor| {
                for i in (1..nodes.len()).rev() {
                    if adjacent(&nodes, i) {
                        editor.merge_node_by_path(&path.child(i))?;
                    }
                }
                Ok(())
            })
        })
}

/// Empty texts are only kept as the sole child or as caret room beside an
/// inline.
fn no_extra_empty_texts() -> Rule {
    fn extra(editor: &Editor, nodes: &[Node], i: usize) -> bool {
        if nodes.len() <= 1 || !nodes[i].is_text() || nodes[i].text_len() > 0 {
            return false;
        }
        let previous_inline = i > 0 && editor.is_inline(&nodes[i - 1]);
        let next_inline = nodes.get(i + 1).is_some_and(|next| editor.is_inline(next));
        !previous_inline && !next_inline
    }

    Rule::new(elements())
        .with_validate(|editor, node, path| {
            let nodes = node.nodes();
            first_invalid_child(node, path, ViolationCode::ExtraEmptyText, |i, _| extra(editor, nodes, i))
        })
        .with_normalize(|editor, violation| {
            let nodes = violation.node.nodes().to_vec();
            remove_children(editor, violation, move |editor, i, _| extra(editor, &nodes, i))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Editor;
    use pretty_assertions::assert_eq;
    use quire_model::{JsonOptions, Value};
    use serde_json::json;

    fn normalized(document: Node) -> serde_json::Value {
        let editor = Editor::new(Value::new(document)).unwrap();
        editor.document().to_json(JsonOptions::default())
    }

    #[test]
    fn test_document_drops_non_blocks() {
        let json = normalized(Node::document(vec![
            Node::new_text("stray"),
            Node::block("paragraph", vec![Node::new_text("kept")]),
        ]));
        assert_eq!(json["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(json["nodes"][0]["type"], json!("paragraph"));
    }

    #[test]
    fn test_first_child_decides_block_content() {
        let json = normalized(Node::document(vec![Node::block(
            "quote",
            vec![
                Node::block("paragraph", vec![Node::new_text("a")]),
                Node::new_text("b"),
            ],
        )]));
        let quote = &json["nodes"][0];
        assert_eq!(quote["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(quote["nodes"][0]["object"], json!("block"));
    }

    #[test]
    fn test_empty_block_gets_text() {
        let json = normalized(Node::document(vec![Node::block("paragraph", vec![])]));
        assert_eq!(
            json["nodes"][0]["nodes"],
            json!([{ "object": "text", "text": "", "marks": [] }])
        );
    }

    #[test]
    fn test_inline_surrounded_and_texts_merged() {
        let json = normalized(Node::document(vec![Node::block(
            "paragraph",
            vec![
                Node::inline("link", vec![Node::new_text("here")]),
                Node::new_text("a"),
                Node::new_text("b"),
                Node::new_text(""),
            ],
        )]));
        let nodes = json["nodes"][0]["nodes"].as_array().unwrap();
        let shape: Vec<_> = nodes
            .iter()
            .map(|n| (n["object"].as_str().unwrap(), n["text"].as_str().unwrap_or("")))
            .collect();
        assert_eq!(shape, vec![("text", ""), ("inline", ""), ("text", "ab")]);
    }

    #[test]
    fn test_empty_inline_removed() {
        let json = normalized(Node::document(vec![Node::block(
            "paragraph",
            vec![
                Node::new_text("a"),
                Node::inline("link", vec![Node::new_text("")]),
                Node::new_text("b"),
            ],
        )]));
        let nodes = json["nodes"][0]["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0]["text"], json!("ab"));
    }
}
