//! # Node tree
//!
//! The document is a persistent tree of four node kinds. Element children are
//! held behind an `Arc`, so cloning a node is cheap and an edit only copies
//! the sibling lists along the path it touches; every other subtree is
//! shared with the previous snapshot.
//!
//! ```text
//! Document ─┬─ Block ─┬─ Text
//!           │         ├─ Inline ── Text
//!           │         └─ Text
//!           └─ Block ─── Block ── Text
//! ```

use crate::error::{ModelError, ModelResult};
use crate::key::Key;
use crate::mark::{Data, Mark, MarkSet};
use crate::path::Path;
use crate::text::Text;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Discriminant of [`Node`], used by schema matching and JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Object {
    Document,
    Block,
    Inline,
    Text,
}

impl Object {
    pub fn as_str(&self) -> &'static str {
        match self {
            Object::Document => "document",
            Object::Block => "block",
            Object::Inline => "inline",
            Object::Text => "text",
        }
    }
}

/// Shared shape of the three non-text kinds
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub key: Key,
    pub ty: String,
    pub data: Data,
    nodes: Arc<Vec<Node>>,
}

impl Element {
    pub fn new(ty: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            key: Key::generate(),
            ty: ty.into(),
            data: Data::new(),
            nodes: Arc::new(nodes),
        }
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.key = key;
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Copy-on-write access to the children
    pub fn nodes_mut(&mut self) -> &mut Vec<Node> {
        Arc::make_mut(&mut self.nodes)
    }

    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = Arc::new(nodes);
    }

    /// True when this element and `other` share the same child list
    pub fn shares_nodes_with(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Document(Element),
    Block(Element),
    Inline(Element),
    Text(Text),
}

/// The non-child properties of a node, as carried by `set_node`,
/// `split_node` and `merge_node` operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

impl NodeProperties {
    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.ty.is_none() && self.data.is_none()
    }
}

impl Node {
    pub fn document(nodes: Vec<Node>) -> Self {
        Node::Document(Element::new("", nodes))
    }

    pub fn block(ty: impl Into<String>, nodes: Vec<Node>) -> Self {
        Node::Block(Element::new(ty, nodes))
    }

    pub fn inline(ty: impl Into<String>, nodes: Vec<Node>) -> Self {
        Node::Inline(Element::new(ty, nodes))
    }

    pub fn new_text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn marked_text(text: impl Into<String>, marks: MarkSet) -> Self {
        Node::Text(Text::with_marks(text, marks))
    }

    pub fn object(&self) -> Object {
        match self {
            Node::Document(_) => Object::Document,
            Node::Block(_) => Object::Block,
            Node::Inline(_) => Object::Inline,
            Node::Text(_) => Object::Text,
        }
    }

    pub fn key(&self) -> &Key {
        match self {
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => &e.key,
            Node::Text(t) => &t.key,
        }
    }

    pub fn set_key(&mut self, key: Key) {
        match self {
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => e.key = key,
            Node::Text(t) => t.key = key,
        }
    }

    /// Type tag of a block or inline
    pub fn ty(&self) -> Option<&str> {
        match self {
            Node::Block(e) | Node::Inline(e) => Some(&e.ty),
            Node::Document(_) | Node::Text(_) => None,
        }
    }

    pub fn data(&self) -> Option<&Data> {
        match self {
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => Some(&e.data),
            Node::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Node::Block(_))
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Node::Inline(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Node::Document(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Children of an element; empty for text
    pub fn nodes(&self) -> &[Node] {
        match self {
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => e.nodes(),
            Node::Text(_) => &[],
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.nodes().get(index)
    }

    /// Concatenated text of every descendant text node
    pub fn text(&self) -> String {
        match self {
            Node::Text(t) => t.text(),
            _ => self.nodes().iter().map(Node::text).collect(),
        }
    }

    /// Length in chars of [`Node::text`]
    pub fn text_len(&self) -> usize {
        match self {
            Node::Text(t) => t.len(),
            _ => self.nodes().iter().map(Node::text_len).sum(),
        }
    }

    /// Text length for text nodes, child count for elements. This is the
    /// unit `split_node` and `merge_node` positions are measured in.
    pub fn size(&self) -> usize {
        match self {
            Node::Text(t) => t.len(),
            _ => self.nodes().len(),
        }
    }

    pub fn properties(&self) -> NodeProperties {
        match self {
            Node::Document(e) => NodeProperties {
                key: Some(e.key.clone()),
                ty: None,
                data: Some(e.data.clone()),
            },
            Node::Block(e) | Node::Inline(e) => NodeProperties {
                key: Some(e.key.clone()),
                ty: Some(e.ty.clone()),
                data: Some(e.data.clone()),
            },
            Node::Text(t) => NodeProperties {
                key: Some(t.key.clone()),
                ty: None,
                data: None,
            },
        }
    }

    /// Apply the fields present in `props`
    pub fn set_properties(&mut self, props: &NodeProperties) {
        if let Some(key) = &props.key {
            self.set_key(key.clone());
        }
        if let Some(element) = self.as_element_mut() {
            if let Some(ty) = &props.ty {
                element.ty = ty.clone();
            }
            if let Some(data) = &props.data {
                element.data = data.clone();
            }
        }
    }

    /// The current values of the fields named in `props`
    pub fn pick_properties(&self, props: &NodeProperties) -> NodeProperties {
        let all = self.properties();
        NodeProperties {
            key: props.key.as_ref().and(all.key),
            ty: props.ty.as_ref().and(all.ty),
            data: props.data.as_ref().and(all.data),
        }
    }

    /// Deep copy with fresh keys everywhere
    pub fn regenerate_keys(&self) -> Node {
        let mut copy = self.clone();
        copy.set_key(Key::generate());
        if let Some(element) = copy.as_element_mut() {
            let nodes = element.nodes().iter().map(Node::regenerate_keys).collect();
            element.set_nodes(nodes);
        }
        copy
    }

    // -- lookup ------------------------------------------------------------

    pub fn get_node(&self, path: &Path) -> Option<&Node> {
        let mut node = self;
        for &index in path.as_slice() {
            node = node.nodes().get(index)?;
        }
        Some(node)
    }

    pub fn assert_node(&self, path: &Path) -> ModelResult<&Node> {
        self.get_node(path).ok_or_else(|| ModelError::InvalidPath(path.clone()))
    }

    pub fn has_node(&self, path: &Path) -> bool {
        self.get_node(path).is_some()
    }

    pub fn assert_text(&self, path: &Path) -> ModelResult<&Text> {
        self.assert_node(path)?
            .as_text()
            .ok_or_else(|| ModelError::NotText(path.clone()))
    }

    pub fn assert_element(&self, path: &Path) -> ModelResult<&Element> {
        self.assert_node(path)?
            .as_element()
            .ok_or_else(|| ModelError::NotElement(path.clone()))
    }

    /// Copy-on-write access to a descendant
    pub fn get_node_mut(&mut self, path: &Path) -> Option<&mut Node> {
        let mut node = self;
        for &index in path.as_slice() {
            node = node.as_element_mut()?.nodes_mut().get_mut(index)?;
        }
        Some(node)
    }

    pub fn assert_node_mut(&mut self, path: &Path) -> ModelResult<&mut Node> {
        self.get_node_mut(path).ok_or_else(|| ModelError::InvalidPath(path.clone()))
    }

    pub fn get_parent(&self, path: &Path) -> Option<&Node> {
        self.get_node(&path.parent()?)
    }

    pub fn path_by_key(&self, key: &Key) -> Option<Path> {
        if self.key() == key {
            return Some(Path::root());
        }
        self.entries(Default::default())
            .find(|(node, _)| node.key() == key)
            .map(|(_, path)| path)
    }

    pub fn assert_path_by_key(&self, key: &Key) -> ModelResult<Path> {
        self.path_by_key(key).ok_or_else(|| ModelError::UnknownKey(key.clone()))
    }

    /// Nearest proper ancestor of `path` that satisfies `predicate`
    pub fn get_closest(&self, path: &Path, predicate: impl Fn(&Node) -> bool) -> Option<(&Node, Path)> {
        path.ancestors()
            .into_iter()
            .rev()
            .filter_map(|p| self.get_node(&p).map(|n| (n, p)))
            .find(|(node, _)| predicate(node))
    }

    pub fn get_closest_block(&self, path: &Path) -> Option<(&Node, Path)> {
        self.get_closest(path, Node::is_block)
    }

    pub fn get_closest_inline(&self, path: &Path) -> Option<(&Node, Path)> {
        self.get_closest(path, Node::is_inline)
    }

    /// Deepest node containing both paths (either may be the answer)
    pub fn get_common_ancestor(&self, a: &Path, b: &Path) -> Option<(&Node, Path)> {
        let common = a.common(b);
        self.get_node(&common).map(|n| (n, common))
    }

    /// The child of `ancestor` on the way down to `path`
    pub fn get_furthest_child(&self, ancestor: &Path, path: &Path) -> Option<(&Node, Path)> {
        if !ancestor.is_ancestor_of(path) {
            return None;
        }
        let child = path.slice(ancestor.len() + 1);
        self.get_node(&child).map(|n| (n, child))
    }

    /// Outermost ancestor of `path` (below this node) satisfying `predicate`
    pub fn get_furthest(&self, path: &Path, predicate: impl Fn(&Node) -> bool) -> Option<(&Node, Path)> {
        path.ancestors()
            .into_iter()
            .skip(1)
            .filter_map(|p| self.get_node(&p).map(|n| (n, p)))
            .find(|(node, _)| predicate(node))
    }

    pub fn get_first_text(&self) -> Option<(&Text, Path)> {
        if let Node::Text(t) = self {
            return Some((t, Path::root()));
        }
        self.entries(Default::default())
            .find_map(|(node, path)| node.as_text().map(|t| (t, path)))
    }

    pub fn get_last_text(&self) -> Option<(&Text, Path)> {
        if let Node::Text(t) = self {
            return Some((t, Path::root()));
        }
        self.entries(crate::iter::NodesOptions {
            reverse: true,
            ..Default::default()
        })
        .find_map(|(node, path)| node.as_text().map(|t| (t, path)))
    }

    /// Every text node with its path, in document order
    pub fn texts(&self) -> impl Iterator<Item = (&Text, Path)> {
        self.entries(Default::default())
            .filter_map(|(node, path)| node.as_text().map(|t| (t, path)))
    }

    /// First text node after `path` that is not inside it
    pub fn get_next_text(&self, path: &Path) -> Option<(&Text, Path)> {
        let options = crate::iter::NodesOptions {
            from: Some(path.clone()),
            ..Default::default()
        };
        self.entries(options)
            .filter(|(_, p)| p.is_after(path))
            .find_map(|(node, p)| node.as_text().map(|t| (t, p)))
    }

    /// Last text node before `path` that is not inside it
    pub fn get_previous_text(&self, path: &Path) -> Option<(&Text, Path)> {
        let options = crate::iter::NodesOptions {
            from: Some(path.clone()),
            reverse: true,
            ..Default::default()
        };
        self.entries(options)
            .filter(|(_, p)| p.is_before(path))
            .find_map(|(node, p)| node.as_text().map(|t| (t, p)))
    }

    /// Offset of the node at `path` within this node's flattened text
    pub fn get_offset(&self, path: &Path) -> usize {
        self.texts()
            .take_while(|(_, p)| p.is_before(path))
            .map(|(t, _)| t.len())
            .sum()
    }

    /// Paths of texts from `start` to `end` inclusive
    pub fn get_texts_between(&self, start: &Path, end: &Path) -> Vec<Path> {
        self.texts()
            .map(|(_, p)| p)
            .filter(|p| p >= start && p <= end)
            .collect()
    }

    /// Blocks whose children are not blocks, touched by the texts between
    /// `start` and `end`, deduplicated in document order
    pub fn get_leaf_blocks_between(&self, start: &Path, end: &Path) -> Vec<Path> {
        let mut blocks: Vec<Path> = Vec::new();
        for text in self.get_texts_between(start, end) {
            if let Some((_, block)) = self.get_closest_block(&text) {
                if blocks.last() != Some(&block) {
                    blocks.push(block);
                }
            }
        }
        blocks
    }

    /// Innermost inlines wrapping the texts between `start` and `end`
    pub fn get_inlines_between(&self, start: &Path, end: &Path) -> Vec<Path> {
        let mut inlines: Vec<Path> = Vec::new();
        for text in self.get_texts_between(start, end) {
            if let Some((_, inline)) = self.get_closest_inline(&text) {
                if !inlines.contains(&inline) {
                    inlines.push(inline);
                }
            }
        }
        inlines
    }

    /// Walk from `path` to the root, yielding each ancestor node
    pub fn ancestors_of(&self, path: &Path) -> Vec<(&Node, Path)> {
        path.ancestors()
            .into_iter()
            .filter_map(|p| self.get_node(&p).map(|n| (n, p)))
            .collect()
    }

    /// Marks present on any character of the text at `path` in the range
    pub fn marks_in_text(&self, path: &Path, offset: usize, length: usize) -> MarkSet {
        self.get_node(path)
            .and_then(Node::as_text)
            .map(|t| t.marks_in(offset, length))
            .unwrap_or_default()
    }

    pub fn has_mark_type(&self, ty: &str) -> bool {
        self.texts()
            .any(|(t, _)| t.leaves().iter().any(|l| l.marks.has_type(ty)))
    }

    pub fn contains_mark(&self, mark: &Mark) -> bool {
        self.texts()
            .any(|(t, _)| t.leaves().iter().any(|l| l.marks.contains(mark)))
    }
}
