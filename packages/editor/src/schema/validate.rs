use super::{first_mismatch, ChildGroup, Position, Rule, Schema, SchemaViolation, ViolationCode};
use crate::editor::Editor;
use quire_model::{Node, Path};

pub(super) fn validate_node(schema: &Schema, editor: &Editor, node: &Node, path: &Path) -> Option<SchemaViolation> {
    for (index, rule) in schema.rules().iter().enumerate() {
        if !rule.applies_to(node) {
            continue;
        }
        if let Some(mut violation) = validate_rule(editor, rule, node, path) {
            violation.rule = index;
            return Some(violation);
        }
    }

    // Rules also constrain the surroundings of the nodes they match, which
    // is checked from the parent so the repair can reach the siblings.
    let children = node.nodes();
    for (i, child) in children.iter().enumerate() {
        let previous = i.checked_sub(1).and_then(|p| children.get(p));
        let next = children.get(i + 1);
        for (index, rule) in schema.rules().iter().enumerate() {
            if !rule.applies_to(child) {
                continue;
            }
            if let Some(mut violation) = validate_context(rule, node, path, child, i, previous, next) {
                violation.rule = index;
                return Some(violation);
            }
        }
    }

    None
}

fn validate_rule(editor: &Editor, rule: &Rule, node: &Node, path: &Path) -> Option<SchemaViolation> {
    validate_data(rule, node, path)
        .or_else(|| validate_marks(rule, node, path))
        .or_else(|| validate_text(rule, node, path))
        .or_else(|| validate_edge(rule.first.as_deref(), Position::FirstChild, node, path, 0))
        .or_else(|| {
            let last = node.nodes().len().checked_sub(1)?;
            validate_edge(rule.last.as_deref(), Position::LastChild, node, path, last)
        })
        .or_else(|| rule.nodes.as_deref().and_then(|groups| validate_nodes(groups, node, path)))
        .or_else(|| rule.validate.as_ref().and_then(|validate| validate(editor, node, path)))
}

fn validate_data(rule: &Rule, node: &Node, path: &Path) -> Option<SchemaViolation> {
    let data = node.data();
    rule.data
        .iter()
        .find(|(key, validator)| !validator(data.and_then(|d| d.get(key.as_str()))))
        .map(|(key, _)| SchemaViolation::new(ViolationCode::NodeDataInvalid, node, path).with_key(key.clone()))
}

fn validate_marks(rule: &Rule, node: &Node, path: &Path) -> Option<SchemaViolation> {
    let allowed = rule.marks.as_ref()?;
    let texts: Vec<&quire_model::Text> = match node {
        Node::Text(text) => vec![text],
        _ => node.texts().map(|(text, _)| text).collect(),
    };
    texts
        .into_iter()
        .flat_map(|text| text.leaves().iter())
        .flat_map(|leaf| leaf.marks.iter())
        .find(|mark| !allowed.iter().any(|ty| ty == &mark.ty))
        .map(|mark| SchemaViolation::new(ViolationCode::NodeMarkInvalid, node, path).with_mark(mark))
}

fn validate_text(rule: &Rule, node: &Node, path: &Path) -> Option<SchemaViolation> {
    let pattern = rule.text.as_ref()?;
    if pattern.is_match(&node.text()) {
        return None;
    }
    Some(SchemaViolation::new(ViolationCode::NodeTextInvalid, node, path))
}

fn validate_edge(
    matches: Option<&[super::Match]>,
    position: Position,
    node: &Node,
    path: &Path,
    index: usize,
) -> Option<SchemaViolation> {
    let matches = matches?;
    let child = node.child(index)?;
    let mismatch = first_mismatch(matches, child)?;
    Some(SchemaViolation::new(ViolationCode::for_mismatch(position, mismatch), node, path).with_child(child, index))
}

/// Greedy sequence match of the children against `groups`. A child that
/// fails the current group moves on to the next group if the current one
/// already has its minimum, and is then retried there.
fn validate_nodes(groups: &[ChildGroup], node: &Node, path: &Path) -> Option<SchemaViolation> {
    let children = node.nodes();
    let mut group = 0;
    let mut count = 0;
    let mut i = 0;

    while i < children.len() {
        let child = &children[i];
        let Some(def) = groups.get(group) else {
            return Some(SchemaViolation::new(ViolationCode::ChildUnknown, node, path).with_child(child, i));
        };

        if def.max.is_some_and(|max| count >= max) {
            if group + 1 < groups.len() {
                group += 1;
                count = 0;
                continue;
            }
            return Some(SchemaViolation::new(ViolationCode::ChildMaxInvalid, node, path).with_child(child, i));
        }

        if let Some(mismatch) = first_mismatch(&def.matches, child) {
            if count >= def.min.unwrap_or(0) && group + 1 < groups.len() {
                group += 1;
                count = 0;
                continue;
            }
            let code = ViolationCode::for_mismatch(Position::Child, mismatch);
            return Some(SchemaViolation::new(code, node, path).with_child(child, i));
        }

        count += 1;
        i += 1;
    }

    for def in &groups[group.min(groups.len())..] {
        if count < def.min.unwrap_or(0) {
            return Some(SchemaViolation::new(ViolationCode::ChildMinInvalid, node, path).with_index(children.len()));
        }
        count = 0;
    }

    None
}

fn validate_context(
    rule: &Rule,
    node: &Node,
    path: &Path,
    child: &Node,
    index: usize,
    previous: Option<&Node>,
    next: Option<&Node>,
) -> Option<SchemaViolation> {
    if let Some(matches) = &rule.parent {
        if let Some(mismatch) = first_mismatch(matches, node) {
            let code = ViolationCode::for_mismatch(Position::Parent, mismatch);
            return Some(
                SchemaViolation::new(code, child, &path.child(index))
                    .with_parent(node)
                    .with_index(index),
            );
        }
    }

    if let (Some(matches), Some(previous)) = (&rule.previous, previous) {
        if let Some(mismatch) = first_mismatch(matches, previous) {
            let code = ViolationCode::for_mismatch(Position::PreviousSibling, mismatch);
            return Some(
                SchemaViolation::new(code, node, path)
                    .with_child(child, index)
                    .with_previous(Some(previous)),
            );
        }
    }

    if let (Some(matches), Some(next)) = (&rule.next, next) {
        if let Some(mismatch) = first_mismatch(matches, next) {
            let code = ViolationCode::for_mismatch(Position::NextSibling, mismatch);
            return Some(
                SchemaViolation::new(code, node, path)
                    .with_child(child, index)
                    .with_next(Some(next)),
            );
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Match, SchemaDefinition};
    use quire_model::{Mark, MarkSet, Object, Value};
    use regex::Regex;

    fn editor_with(definition: SchemaDefinition) -> Editor {
        let value = Value::new(Node::document(vec![Node::block("paragraph", vec![Node::new_text("")])]));
        Editor::builder(value)
            .schema(Schema::new(definition))
            .normalize_on_create(false)
            .build()
            .unwrap()
    }

    fn check(editor: &Editor, node: &Node) -> Option<ViolationCode> {
        editor
            .schema()
            .validate_node(editor, node, &Path::from([0]))
            .map(|v| v.code)
    }

    #[test]
    fn test_child_groups() {
        let mut definition = SchemaDefinition::default();
        definition.blocks.insert(
            "figure".into(),
            Rule::default().with_nodes(vec![
                ChildGroup::new(vec![Match::block("image")]).min(1).max(1),
                ChildGroup::new(vec![Match::block("caption")]).max(1),
            ]),
        );
        let editor = editor_with(definition);

        let image = || Node::block("image", vec![Node::new_text("")]);
        let caption = || Node::block("caption", vec![Node::new_text("")]);

        assert_eq!(check(&editor, &Node::block("figure", vec![image(), caption()])), None);
        assert_eq!(check(&editor, &Node::block("figure", vec![image()])), None);
        assert_eq!(
            check(&editor, &Node::block("figure", vec![caption()])),
            Some(ViolationCode::ChildTypeInvalid)
        );
        assert_eq!(
            check(&editor, &Node::block("figure", vec![image(), caption(), caption()])),
            Some(ViolationCode::ChildMaxInvalid)
        );
        assert_eq!(
            check(&editor, &Node::block("figure", vec![image(), image()])),
            Some(ViolationCode::ChildTypeInvalid)
        );
    }

    #[test]
    fn test_min_reported_after_children() {
        let mut definition = SchemaDefinition::default();
        definition.blocks.insert(
            "list".into(),
            Rule::default().with_nodes(vec![ChildGroup::new(vec![Match::block("item")]).min(2)]),
        );
        let editor = editor_with(definition);

        let list = Node::block("list", vec![Node::block("item", vec![Node::new_text("")])]);
        let violation = editor.schema().validate_node(&editor, &list, &Path::from([0])).unwrap();
        assert_eq!(violation.code, ViolationCode::ChildMinInvalid);
        assert_eq!(violation.index, Some(1));
    }

    #[test]
    fn test_first_last_and_text() {
        let mut definition = SchemaDefinition::default();
        definition.document = Some(
            Rule::default()
                .with_first(vec![Match::block("title")])
                .with_last(vec![Match::block("paragraph")]),
        );
        definition
            .blocks
            .insert("code".into(), Rule::default().with_text(Regex::new("^[^\t]*$").unwrap()));
        let editor = editor_with(definition);

        let doc = Node::document(vec![Node::block("paragraph", vec![Node::new_text("")])]);
        let violation = editor.schema().validate_node(&editor, &doc, &Path::root()).unwrap();
        assert_eq!(violation.code, ViolationCode::FirstChildTypeInvalid);
        assert_eq!(violation.index, Some(0));

        assert_eq!(
            check(&editor, &Node::block("code", vec![Node::new_text("a\tb")])),
            Some(ViolationCode::NodeTextInvalid)
        );
    }

    #[test]
    fn test_marks_and_data() {
        let mut definition = SchemaDefinition::default();
        definition.blocks.insert(
            "heading".into(),
            Rule::default()
                .with_marks(["italic"])
                .with_data("level", |v| v.and_then(|v| v.as_u64()).is_some()),
        );
        let editor = editor_with(definition);

        let bold = Node::marked_text("x", MarkSet::new().with(Mark::new("bold")));
        let violation = editor
            .schema()
            .validate_node(&editor, &Node::block("heading", vec![bold]), &Path::from([0]))
            .unwrap();
        assert_eq!(violation.code, ViolationCode::NodeDataInvalid);
        assert_eq!(violation.key.as_deref(), Some("level"));
    }

    #[test]
    fn test_parent_constraint_checked_from_parent() {
        let mut definition = SchemaDefinition::default();
        definition.blocks.insert(
            "item".into(),
            Rule::default().with_parent(vec![Match::block("list")]),
        );
        let editor = editor_with(definition);

        let quote = Node::block("quote", vec![Node::block("item", vec![Node::new_text("")])]);
        let violation = editor.schema().validate_node(&editor, &quote, &Path::from([0])).unwrap();
        assert_eq!(violation.code, ViolationCode::ParentTypeInvalid);
        assert_eq!(violation.node.ty(), Some("item"));
        assert_eq!(violation.path, Path::from([0, 0]));
        assert_eq!(violation.parent.as_ref().map(Node::object), Some(Object::Block));
    }
}
