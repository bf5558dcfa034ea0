//! # Schema
//!
//! Declarative constraints on the shape of the document, compiled into an
//! ordered rule list.
//!
//! ## Rules
//!
//! A rule applies to every node its `matches` accept and may constrain:
//! - the node's `data` (per key validators) and the mark types on its text
//! - its text content (a regex)
//! - its first and last child
//! - its children as an ordered sequence of groups with min/max counts
//! - the parent, previous sibling and next sibling of any node it matches
//!
//! Validation returns the first failure as a [`SchemaViolation`]. The
//! normalizer repairs it with the rule's own `normalize` if it has one, or
//! with the default repair in [`repair`].
//!
//! ## Compilation
//!
//! ```text
//! SchemaDefinition { rules, document, blocks, inlines, marks }
//!                     ↓
//! [core rules..., rules..., document, blocks..., inlines...]
//! ```
//!
//! Core rules come first, so user rules can add constraints but never relax
//! the tree shape every edit algorithm relies on.

mod core_rules;
pub(crate) mod repair;
mod validate;
mod violation;

pub use violation::{Mismatch, Position, SchemaViolation, ViolationCode};

use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::plugin::{Next, Plugin};
use quire_model::{Data, Mark, Node, Object, Path};
use regex::Regex;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type NodePredicate = Arc<dyn Fn(&Node) -> bool + Send + Sync>;
pub type DataValidator = Arc<dyn Fn(Option<&Json>) -> bool + Send + Sync>;
pub type ValidateFn = Arc<dyn Fn(&Editor, &Node, &Path) -> Option<SchemaViolation> + Send + Sync>;
pub type NormalizeFn = Arc<dyn Fn(&mut Editor, &SchemaViolation) -> EditorResult<()> + Send + Sync>;

/// Selects nodes by kind, type, data and an optional predicate. Every field
/// that is set must agree.
#[derive(Clone, Default)]
pub struct Match {
    pub object: Option<Object>,
    pub ty: Option<String>,
    pub data: Data,
    pub predicate: Option<NodePredicate>,
}

impl Match {
    pub fn object(object: Object) -> Self {
        Self {
            object: Some(object),
            ..Default::default()
        }
    }

    pub fn block(ty: impl Into<String>) -> Self {
        Self {
            object: Some(Object::Block),
            ty: Some(ty.into()),
            ..Default::default()
        }
    }

    pub fn inline(ty: impl Into<String>) -> Self {
        Self {
            object: Some(Object::Inline),
            ty: Some(ty.into()),
            ..Default::default()
        }
    }

    pub fn text() -> Self {
        Self::object(Object::Text)
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Json) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn with_predicate(mut self, predicate: impl Fn(&Node) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// The first part of this match `node` fails, if any
    pub fn check(&self, node: &Node) -> Option<Mismatch> {
        if let Some(object) = self.object {
            if node.object() != object {
                return Some(Mismatch::Object);
            }
        }
        if let Some(ty) = &self.ty {
            if node.ty() != Some(ty.as_str()) {
                return Some(Mismatch::Type);
            }
        }
        if !self.data.is_empty() {
            let data = node.data();
            let agrees = self
                .data
                .iter()
                .all(|(key, value)| data.and_then(|d| d.get(key)) == Some(value));
            if !agrees {
                return Some(Mismatch::Data);
            }
        }
        if let Some(predicate) = &self.predicate {
            if !predicate(node) {
                return Some(Mismatch::Object);
            }
        }
        None
    }

    pub fn matches(&self, node: &Node) -> bool {
        self.check(node).is_none()
    }
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("object", &self.object)
            .field("ty", &self.ty)
            .field("data", &self.data)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// `None` if any of `matches` accepts `node` (an empty list accepts
/// everything), otherwise how the first one failed.
pub fn first_mismatch(matches: &[Match], node: &Node) -> Option<Mismatch> {
    let mut first = None;
    for m in matches {
        match m.check(node) {
            None => return None,
            Some(mismatch) => {
                first.get_or_insert(mismatch);
            }
        }
    }
    first
}

/// One run of children in a `nodes` constraint
#[derive(Debug, Clone, Default)]
pub struct ChildGroup {
    pub matches: Vec<Match>,
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl ChildGroup {
    pub fn new(matches: Vec<Match>) -> Self {
        Self {
            matches,
            min: None,
            max: None,
        }
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }
}

#[derive(Clone, Default)]
pub struct Rule {
    pub matches: Vec<Match>,
    pub data: Vec<(String, DataValidator)>,
    pub first: Option<Vec<Match>>,
    pub last: Option<Vec<Match>>,
    pub previous: Option<Vec<Match>>,
    pub next: Option<Vec<Match>>,
    pub parent: Option<Vec<Match>>,
    pub nodes: Option<Vec<ChildGroup>>,

    /// Mark types allowed on the node's text
    pub marks: Option<Vec<String>>,
    pub text: Option<Regex>,
    pub is_void: Option<bool>,

    pub validate: Option<ValidateFn>,
    pub normalize: Option<NormalizeFn>,
}

impl Rule {
    pub fn new(matches: Vec<Match>) -> Self {
        Self {
            matches,
            ..Default::default()
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, validator: impl Fn(Option<&Json>) -> bool + Send + Sync + 'static) -> Self {
        self.data.push((key.into(), Arc::new(validator)));
        self
    }

    pub fn with_first(mut self, matches: Vec<Match>) -> Self {
        self.first = Some(matches);
        self
    }

    pub fn with_last(mut self, matches: Vec<Match>) -> Self {
        self.last = Some(matches);
        self
    }

    pub fn with_previous(mut self, matches: Vec<Match>) -> Self {
        self.previous = Some(matches);
        self
    }

    pub fn with_next(mut self, matches: Vec<Match>) -> Self {
        self.next = Some(matches);
        self
    }

    pub fn with_parent(mut self, matches: Vec<Match>) -> Self {
        self.parent = Some(matches);
        self
    }

    pub fn with_nodes(mut self, groups: Vec<ChildGroup>) -> Self {
        self.nodes = Some(groups);
        self
    }

    pub fn with_marks<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.marks = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_text(mut self, pattern: Regex) -> Self {
        self.text = Some(pattern);
        self
    }

    pub fn void(mut self, is_void: bool) -> Self {
        self.is_void = Some(is_void);
        self
    }

    pub fn with_validate(
        mut self,
        validate: impl Fn(&Editor, &Node, &Path) -> Option<SchemaViolation> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Arc::new(validate));
        self
    }

    pub fn with_normalize(
        mut self,
        normalize: impl Fn(&mut Editor, &SchemaViolation) -> EditorResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.normalize = Some(Arc::new(normalize));
        self
    }

    pub fn applies_to(&self, node: &Node) -> bool {
        first_mismatch(&self.matches, node).is_none()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("matches", &self.matches)
            .field("data", &self.data.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("first", &self.first)
            .field("last", &self.last)
            .field("previous", &self.previous)
            .field("next", &self.next)
            .field("parent", &self.parent)
            .field("nodes", &self.nodes)
            .field("marks", &self.marks)
            .field("text", &self.text.as_ref().map(Regex::as_str))
            .field("is_void", &self.is_void)
            .field("validate", &self.validate.is_some())
            .field("normalize", &self.normalize.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkRule {
    /// Typing at the end of a run of this mark does not extend it
    pub is_atomic: bool,
}

/// The shorthand form a schema is written in
#[derive(Debug, Clone, Default)]
pub struct SchemaDefinition {
    pub rules: Vec<Rule>,
    pub document: Option<Rule>,
    pub blocks: BTreeMap<String, Rule>,
    pub inlines: BTreeMap<String, Rule>,
    pub marks: BTreeMap<String, MarkRule>,
}

/// A compiled, ordered rule list
#[derive(Debug, Clone)]
pub struct Schema {
    rules: Vec<Rule>,
    marks: BTreeMap<String, MarkRule>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new(SchemaDefinition::default())
    }
}

impl Schema {
    pub fn new(definition: SchemaDefinition) -> Self {
        let SchemaDefinition {
            rules: user_rules,
            document,
            blocks,
            inlines,
            marks,
        } = definition;

        let mut rules = core_rules::rules();
        rules.extend(user_rules);

        if let Some(mut rule) = document {
            rule.matches = vec![Match::object(Object::Document)];
            rules.push(rule);
        }
        for (ty, mut rule) in blocks {
            rule.matches = vec![Match::block(ty)];
            rules.push(rule);
        }
        for (ty, mut rule) in inlines {
            rule.matches = vec![Match::inline(ty)];
            rules.push(rule);
        }

        Self { rules, marks }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn mark_rule(&self, ty: &str) -> Option<&MarkRule> {
        self.marks.get(ty)
    }

    /// The first constraint `node` breaks, if any
    pub fn validate_node(&self, editor: &Editor, node: &Node, path: &Path) -> Option<SchemaViolation> {
        validate::validate_node(self, editor, node, path)
    }

    /// Repair `violation` with its rule's normalizer or the default repair
    pub fn normalize(&self, editor: &mut Editor, violation: &SchemaViolation) -> EditorResult<()> {
        match self.rules.get(violation.rule).and_then(|r| r.normalize.clone()) {
            Some(normalize) => normalize(editor, violation),
            None => repair::default_normalize(editor, violation),
        }
    }

    /// Voidness declared by the first rule that matches `node` and says
    pub fn declared_void(&self, node: &Node) -> Option<bool> {
        self.rules
            .iter()
            .filter(|r| r.is_void.is_some())
            .find(|r| r.applies_to(node))
            .and_then(|r| r.is_void)
    }
}

impl Plugin for Schema {
    fn is_void(&self, editor: &Editor, node: &Node, next: Next) -> bool {
        match self.declared_void(node) {
            Some(is_void) => is_void,
            None => next.is_void(editor, node),
        }
    }

    fn is_atomic(&self, editor: &Editor, mark: &Mark, next: Next) -> bool {
        match self.marks.get(&mark.ty) {
            Some(rule) => rule.is_atomic,
            None => next.is_atomic(editor, mark),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_check_order() {
        let m = Match::block("quote").with_data("level", json!(1));
        assert_eq!(m.check(&Node::new_text("x")), Some(Mismatch::Object));
        assert_eq!(m.check(&Node::block("paragraph", vec![])), Some(Mismatch::Type));
        assert_eq!(m.check(&Node::block("quote", vec![])), Some(Mismatch::Data));

        let mut data = Data::new();
        data.insert("level".into(), json!(1));
        let quote = Node::Block(quire_model::Element::new("quote", vec![]).with_data(data));
        assert!(m.matches(&quote));
    }

    #[test]
    fn test_first_mismatch_accepts_any() {
        let matches = vec![Match::block("a"), Match::text()];
        assert_eq!(first_mismatch(&matches, &Node::new_text("")), None);
        assert_eq!(
            first_mismatch(&matches, &Node::inline("link", vec![])),
            Some(Mismatch::Object)
        );
        assert_eq!(first_mismatch(&[], &Node::new_text("")), None);
    }

    #[test]
    fn test_compile_order() {
        let mut definition = SchemaDefinition::default();
        definition.blocks.insert("image".into(), Rule::default().void(true));
        definition.rules.push(Rule::new(vec![Match::block("code")]));

        let core = Schema::default().rules().len();
        let schema = Schema::new(definition);
        assert_eq!(schema.rules().len(), core + 2);

        let image = Node::block("image", vec![]);
        assert_eq!(schema.declared_void(&image), Some(true));
        assert_eq!(schema.declared_void(&Node::block("code", vec![])), None);
        assert!(schema.rules()[core].applies_to(&Node::block("code", vec![])));
    }
}
