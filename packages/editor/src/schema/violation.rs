//! Structured results of a failed validation.
//!
//! A violation is not an error: normalization consumes it and repairs the
//! node. The `code()` strings are stable and match what custom rules see.

use quire_model::{Mark, Node, Path};
use std::fmt;

/// Which part of a [`Match`](super::Match) a node failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    Object,
    Type,
    Data,
}

/// Where the node that failed a match sits relative to the node being
/// validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Node,
    Child,
    FirstChild,
    LastChild,
    Parent,
    PreviousSibling,
    NextSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationCode {
    ChildMaxInvalid,
    ChildMinInvalid,
    ChildObjectInvalid,
    ChildTypeInvalid,
    ChildDataInvalid,
    ChildUnknown,
    FirstChildObjectInvalid,
    FirstChildTypeInvalid,
    FirstChildDataInvalid,
    LastChildObjectInvalid,
    LastChildTypeInvalid,
    LastChildDataInvalid,
    NextSiblingObjectInvalid,
    NextSiblingTypeInvalid,
    NextSiblingDataInvalid,
    PreviousSiblingObjectInvalid,
    PreviousSiblingTypeInvalid,
    PreviousSiblingDataInvalid,
    ParentObjectInvalid,
    ParentTypeInvalid,
    ParentDataInvalid,
    NodeDataInvalid,
    NodeMarkInvalid,
    NodeObjectInvalid,
    NodeTextInvalid,
    NodeTypeInvalid,
    AdjacentTexts,
    ExtraEmptyText,
    Custom(String),
}

impl ViolationCode {
    pub fn code(&self) -> &str {
        match self {
            ViolationCode::ChildMaxInvalid => "child_max_invalid",
            ViolationCode::ChildMinInvalid => "child_min_invalid",
            ViolationCode::ChildObjectInvalid => "child_object_invalid",
            ViolationCode::ChildTypeInvalid => "child_type_invalid",
            ViolationCode::ChildDataInvalid => "child_data_invalid",
            ViolationCode::ChildUnknown => "child_unknown",
            ViolationCode::FirstChildObjectInvalid => "first_child_object_invalid",
            ViolationCode::FirstChildTypeInvalid => "first_child_type_invalid",
            ViolationCode::FirstChildDataInvalid => "first_child_data_invalid",
            ViolationCode::LastChildObjectInvalid => "last_child_object_invalid",
            ViolationCode::LastChildTypeInvalid => "last_child_type_invalid",
            ViolationCode::LastChildDataInvalid => "last_child_data_invalid",
            ViolationCode::NextSiblingObjectInvalid => "next_sibling_object_invalid",
            ViolationCode::NextSiblingTypeInvalid => "next_sibling_type_invalid",
            ViolationCode::NextSiblingDataInvalid => "next_sibling_data_invalid",
            ViolationCode::PreviousSiblingObjectInvalid => "previous_sibling_object_invalid",
            ViolationCode::PreviousSiblingTypeInvalid => "previous_sibling_type_invalid",
            ViolationCode::PreviousSiblingDataInvalid => "previous_sibling_data_invalid",
            ViolationCode::ParentObjectInvalid => "parent_object_invalid",
            ViolationCode::ParentTypeInvalid => "parent_type_invalid",
            ViolationCode::ParentDataInvalid => "parent_data_invalid",
            ViolationCode::NodeDataInvalid => "node_data_invalid",
            ViolationCode::NodeMarkInvalid => "node_mark_invalid",
            ViolationCode::NodeObjectInvalid => "node_object_invalid",
            ViolationCode::NodeTextInvalid => "node_text_invalid",
            ViolationCode::NodeTypeInvalid => "node_type_invalid",
            ViolationCode::AdjacentTexts => "adjacent_texts",
            ViolationCode::ExtraEmptyText => "extra_empty_text",
            ViolationCode::Custom(code) => code,
        }
    }

    /// The code for a failed match at `position`
    pub fn for_mismatch(position: Position, mismatch: Mismatch) -> ViolationCode {
        use Mismatch::*;
        use Position::*;

        match (position, mismatch) {
            (Node, Object) => ViolationCode::NodeObjectInvalid,
            (Node, Type) => ViolationCode::NodeTypeInvalid,
            (Node, Data) => ViolationCode::NodeDataInvalid,
            (Child, Object) => ViolationCode::ChildObjectInvalid,
            (Child, Type) => ViolationCode::ChildTypeInvalid,
            (Child, Data) => ViolationCode::ChildDataInvalid,
            (FirstChild, Object) => ViolationCode::FirstChildObjectInvalid,
            (FirstChild, Type) => ViolationCode::FirstChildTypeInvalid,
            (FirstChild, Data) => ViolationCode::FirstChildDataInvalid,
            (LastChild, Object) => ViolationCode::LastChildObjectInvalid,
            (LastChild, Type) => ViolationCode::LastChildTypeInvalid,
            (LastChild, Data) => ViolationCode::LastChildDataInvalid,
            (Parent, Object) => ViolationCode::ParentObjectInvalid,
            (Parent, Type) => ViolationCode::ParentTypeInvalid,
            (Parent, Data) => ViolationCode::ParentDataInvalid,
            (PreviousSibling, Object) => ViolationCode::PreviousSiblingObjectInvalid,
            (PreviousSibling, Type) => ViolationCode::PreviousSiblingTypeInvalid,
            (PreviousSibling, Data) => ViolationCode::PreviousSiblingDataInvalid,
            (NextSibling, Object) => ViolationCode::NextSiblingObjectInvalid,
            (NextSibling, Type) => ViolationCode::NextSiblingTypeInvalid,
            (NextSibling, Data) => ViolationCode::NextSiblingDataInvalid,
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A failed validation with enough context for a repair to act on
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    pub code: ViolationCode,

    /// Index of the failing rule in the compiled schema
    pub rule: usize,

    /// The node the violation is about. For `parent_*` codes this is the
    /// child whose parent is wrong.
    pub node: Node,
    pub path: Path,

    pub child: Option<Node>,
    pub index: Option<usize>,
    pub previous: Option<Node>,
    pub next: Option<Node>,
    pub parent: Option<Node>,

    /// Data key that failed validation
    pub key: Option<String>,
    pub mark: Option<Mark>,
}

impl SchemaViolation {
    pub fn new(code: ViolationCode, node: &Node, path: &Path) -> Self {
        Self {
            code,
            rule: 0,
            node: node.clone(),
            path: path.clone(),
            child: None,
            index: None,
            previous: None,
            next: None,
            parent: None,
            key: None,
            mark: None,
        }
    }

    pub fn with_child(mut self, child: &Node, index: usize) -> Self {
        self.child = Some(child.clone());
        self.index = Some(index);
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_previous(mut self, previous: Option<&Node>) -> Self {
        self.previous = previous.cloned();
        self
    }

    pub fn with_next(mut self, next: Option<&Node>) -> Self {
        self.next = next.cloned();
        self
    }

    pub fn with_parent(mut self, parent: &Node) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_mark(mut self, mark: &Mark) -> Self {
        self.mark = Some(mark.clone());
        self
    }

    pub fn code(&self) -> &str {
        self.code.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_snake_case() {
        assert_eq!(ViolationCode::ChildMinInvalid.code(), "child_min_invalid");
        assert_eq!(
            ViolationCode::Custom("title_required".into()).to_string(),
            "title_required"
        );
    }

    #[test]
    fn test_mismatch_remapping() {
        assert_eq!(
            ViolationCode::for_mismatch(Position::FirstChild, Mismatch::Type),
            ViolationCode::FirstChildTypeInvalid
        );
        assert_eq!(
            ViolationCode::for_mismatch(Position::Parent, Mismatch::Object).code(),
            "parent_object_invalid"
        );
    }
}
