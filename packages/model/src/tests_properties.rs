/// Whole-tree properties that must hold for every operation kind
use crate::*;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn sample() -> Value {
    let mut bold_text = Text::new("bold and plain");
    bold_text.add_mark(0, 4, &Mark::new("bold"));

    Value::new(Node::document(vec![
        Node::block("heading", vec![Node::new_text("Title")]),
        Node::block(
            "paragraph",
            vec![
                Node::Text(bold_text),
                Node::inline("link", vec![Node::new_text("here")]),
                Node::new_text("tail"),
            ],
        ),
        Node::block(
            "list",
            vec![
                Node::block("item", vec![Node::new_text("first")]),
                Node::block("item", vec![Node::new_text("second")]),
            ],
        ),
    ]))
}

fn operations(doc: &Node) -> Vec<Operation> {
    let node_at = |p: &[usize]| doc.get_node(&Path::from(p)).unwrap().clone();
    vec![
        Operation::InsertNode {
            path: Path::from([3]),
            node: Node::block("paragraph", vec![Node::new_text("end")]),
        },
        Operation::InsertNode {
            path: Path::from([2, 1]),
            node: Node::block("item", vec![Node::new_text("middle")]),
        },
        Operation::RemoveNode {
            path: Path::from([1, 1]),
            node: node_at(&[1, 1]),
        },
        Operation::RemoveNode {
            path: Path::from([0]),
            node: node_at(&[0]),
        },
        Operation::SplitNode {
            path: Path::from([1, 0]),
            position: 2,
            properties: NodeProperties::default(),
        },
        Operation::SplitNode {
            path: Path::from([2]),
            position: 1,
            properties: NodeProperties {
                key: Some(Key::new("list-tail")),
                ty: Some("list".into()),
                data: None,
            },
        },
        Operation::MergeNode {
            path: Path::from([2, 1]),
            position: 1,
            properties: node_at(&[2, 1]).properties(),
        },
        Operation::MoveNode {
            path: Path::from([0]),
            new_path: Path::from([2, 1]),
        },
        Operation::MoveNode {
            path: Path::from([2, 1]),
            new_path: Path::from([0]),
        },
        Operation::MoveNode {
            path: Path::from([1, 2]),
            new_path: Path::from([1, 0]),
        },
        Operation::InsertText {
            path: Path::from([1, 0]),
            offset: 4,
            text: "er".into(),
            marks: MarkSet::from(vec![Mark::new("bold")]),
        },
        Operation::RemoveText {
            path: Path::from([1, 2]),
            offset: 1,
            text: "ai".into(),
            marks: MarkSet::new(),
        },
        Operation::AddMark {
            path: Path::from([0, 0]),
            offset: 0,
            length: 5,
            mark: Mark::new("italic"),
        },
        Operation::RemoveMark {
            path: Path::from([1, 0]),
            offset: 0,
            length: 4,
            mark: Mark::new("bold"),
        },
        Operation::SetMark {
            path: Path::from([1, 0]),
            offset: 0,
            length: 4,
            properties: Mark::new("bold"),
            new_properties: Mark::new("strong"),
        },
        Operation::SetNode {
            path: Path::from([0]),
            properties: NodeProperties {
                ty: Some("heading".into()),
                ..Default::default()
            },
            new_properties: NodeProperties {
                ty: Some("title".into()),
                ..Default::default()
            },
        },
    ]
}

/// Every node's recomputed path is unique and agrees with traversal order
fn assert_paths_valid(doc: &Node) {
    let mut seen_keys = HashSet::new();
    let mut previous: Option<Path> = None;
    for (node, path) in doc.entries(NodesOptions::default()) {
        assert!(seen_keys.insert(node.key().clone()), "duplicate key {}", node.key());
        assert_eq!(doc.path_by_key(node.key()), Some(path.clone()));
        if let Some(prev) = previous {
            assert!(prev < path, "{} does not follow {}", path, prev);
        }
        previous = Some(path);
    }
}

#[test]
fn test_every_operation_inverts() {
    let value = sample();
    for op in operations(&value.document) {
        let applied = op.apply(&value).unwrap();
        let restored = op.invert().apply(&applied).unwrap();
        assert_eq!(restored.document, value.document, "{:?}", op);
    }
}

#[test]
fn test_mark_operations_over_mixed_runs_are_rejected() {
    // "bold and plain" carries bold on its first four chars only.
    let value = sample();
    let path = Path::from([1, 0]);
    let rejected = vec![
        Operation::AddMark {
            path: path.clone(),
            offset: 2,
            length: 6,
            mark: Mark::new("bold"),
        },
        Operation::RemoveMark {
            path: path.clone(),
            offset: 2,
            length: 6,
            mark: Mark::new("bold"),
        },
        Operation::SetMark {
            path: path.clone(),
            offset: 0,
            length: 8,
            properties: Mark::new("bold"),
            new_properties: Mark::new("strong"),
        },
        Operation::AddMark {
            path: path.clone(),
            offset: 1,
            length: usize::MAX,
            mark: Mark::new("italic"),
        },
    ];

    for op in rejected {
        assert!(op.apply(&value).is_err(), "{:?}", op);
    }

    // The same ranges split at the run boundary apply and invert cleanly.
    let add = Operation::AddMark {
        path: path.clone(),
        offset: 4,
        length: 4,
        mark: Mark::new("bold"),
    };
    let applied = add.apply(&value).unwrap();
    assert_eq!(add.invert().apply(&applied).unwrap().document, value.document);
}

#[test]
fn test_inverse_of_inverse_is_original() {
    let value = sample();
    for op in operations(&value.document) {
        if matches!(op, Operation::MoveNode { .. }) {
            // Moves invert to an equivalent move, not necessarily the same one.
            let applied = op.apply(&value).unwrap();
            let again = op.invert().invert().apply(&value).unwrap();
            assert_eq!(again.document, applied.document);
        } else {
            assert_eq!(op.invert().invert(), op);
        }
    }
}

#[test]
fn test_paths_stay_valid_after_each_operation() {
    let value = sample();
    assert_paths_valid(&value.document);
    for op in operations(&value.document) {
        let applied = op.apply(&value).unwrap();
        assert_paths_valid(&applied.document);
    }
}

#[test]
fn test_held_paths_follow_their_nodes() {
    let value = sample();
    let held: Vec<(Key, Path)> = value
        .document
        .entries(NodesOptions::default())
        .map(|(node, path)| (node.key().clone(), path))
        .collect();

    for op in operations(&value.document) {
        let applied = op.apply(&value).unwrap();
        for (key, path) in &held {
            let Some(moved) = path.transform(&op) else {
                continue;
            };
            // The left half of a split keeps the key; a merged node is gone.
            if let Operation::SplitNode { path: target, .. } | Operation::MergeNode { path: target, .. } = &op {
                if target == path {
                    continue;
                }
            }
            assert_eq!(
                applied.document.path_by_key(key),
                Some(moved.clone()),
                "{} via {} should land at {}",
                path,
                op.kind(),
                moved
            );
        }
    }
}

#[test]
fn test_json_round_trip_preserving_keys() {
    let value = sample();
    for op in operations(&value.document) {
        let doc = op.apply(&value).unwrap().document;
        let json = doc.to_json(JsonOptions { preserve_keys: true });
        assert_eq!(Node::from_json(&json).unwrap(), doc);
    }
}

#[test]
fn test_operation_json_round_trip() {
    let value = sample();
    for op in operations(&value.document) {
        let encoded = serde_json::to_value(&op).unwrap();
        let decoded: Operation = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, op);
    }
}
