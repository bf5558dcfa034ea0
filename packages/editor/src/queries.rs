//! Read-only questions about the document that depend on the plugin hooks,
//! or that edit algorithms ask in terms of a range.

use crate::editor::Editor;
use quire_model::{Key, MarkSet, Node, NodeProperties, NodesOptions, Operation, Path, Point, Range, Value};
use std::collections::HashSet;

impl Editor {
    /// Nearest proper ancestor of `path` that is void
    pub fn closest_void(&self, path: &Path) -> Option<Path> {
        self.document()
            .get_closest(path, |node| !node.is_text() && self.is_void(node))
            .map(|(_, path)| path)
    }

    pub fn has_void_parent(&self, path: &Path) -> bool {
        self.closest_void(path).is_some()
    }

    /// `node` unchanged, or a copy with fresh keys when any key in it is
    /// already taken in the document
    pub(crate) fn with_unique_keys(&self, node: Node) -> Node {
        let whole = || NodesOptions {
            include_root: true,
            ..Default::default()
        };
        let taken: HashSet<&Key> = self.document().entries(whole()).map(|(node, _)| node.key()).collect();
        let clash = node.entries(whole()).any(|(child, _)| taken.contains(child.key()));
        if clash {
            node.regenerate_keys()
        } else {
            node
        }
    }

    /// Nearest proper ancestor of `path` that the plugins treat as inline
    pub fn closest_inline(&self, path: &Path) -> Option<Path> {
        self.document()
            .get_closest(path, |node| !node.is_text() && self.is_inline(node))
            .map(|(_, path)| path)
    }

    /// The block (or the document) that directly holds the text at `path`
    pub fn closest_block(&self, path: &Path) -> Option<Path> {
        self.document().get_closest_block(path).map(|(_, path)| path)
    }

    pub fn texts_at_range(&self, range: &Range) -> Vec<Path> {
        let (start, end) = range.edges();
        self.document().get_texts_between(&start.path, &end.path)
    }

    /// Blocks that contain text directly, touched by `range`
    pub fn leaf_blocks_at_range(&self, range: &Range) -> Vec<Path> {
        let (start, end) = range.edges();
        self.document().get_leaf_blocks_between(&start.path, &end.path)
    }

    /// Innermost inlines touched by `range`
    pub fn inlines_at_range(&self, range: &Range) -> Vec<Path> {
        let (start, end) = range.edges();
        self.document().get_inlines_between(&start.path, &end.path)
    }

    /// Every mark on any character in `range`, or the marks typing would
    /// pick up if it is collapsed
    pub fn marks_at_range(&self, range: &Range) -> MarkSet {
        if range.is_collapsed() {
            return self.insert_marks_at_point(range.start());
        }

        let (start, end) = range.edges();
        let mut marks = MarkSet::new();
        for path in self.texts_at_range(range) {
            let Some(text) = self.document().get_node(&path).and_then(Node::as_text) else {
                continue;
            };
            let from = if path == start.path { start.offset } else { 0 };
            let to = if path == end.path { end.offset } else { text.len() };
            if to > from {
                marks = marks.union(&text.marks_in(from, to - from));
            }
        }
        marks
    }

    /// Marks shared by every character in `range`
    pub fn active_marks_at_range(&self, range: &Range) -> MarkSet {
        if range.is_collapsed() {
            return self.insert_marks_at_point(range.start());
        }

        let document = self.document();
        let (mut start, mut end) = range.edges();

        // An edge sitting at the very end (or start) of its text contributes
        // no characters; look at the neighbouring text instead.
        if document.get_node(&start.path).map(Node::text_len) == Some(start.offset) {
            if start.path == end.path {
                return MarkSet::new();
            }
            match document.get_next_text(&start.path) {
                Some((_, path)) => start = Point::new(path, 0),
                None => return MarkSet::new(),
            }
        }
        if end.offset == 0 && end.path != start.path {
            match document.get_previous_text(&end.path) {
                Some((text, path)) => end = Point::new(path, text.len()),
                None => return MarkSet::new(),
            }
        }

        let mut active: Option<MarkSet> = None;
        for path in document.get_texts_between(&start.path, &end.path) {
            let Some(text) = document.get_node(&path).and_then(Node::as_text) else {
                continue;
            };
            let from = if path == start.path { start.offset } else { 0 };
            let to = if path == end.path { end.offset } else { text.len() };
            if to <= from {
                continue;
            }
            let marks = text.active_marks_in(from, to - from).unwrap_or_default();
            let next = match active {
                Some(current) => current.intersection(&marks),
                None => marks,
            };
            if next.is_empty() {
                return next;
            }
            active = Some(next);
        }
        active.unwrap_or_default()
    }

    /// Marks a character typed at `point` would carry. At the start of a
    /// text the previous text in the same block decides; atomic marks are
    /// not carried past the end of their run.
    pub fn insert_marks_at_point(&self, point: &Point) -> MarkSet {
        let document = self.document();
        let Some(text) = document.get_node(&point.path).and_then(Node::as_text) else {
            return MarkSet::new();
        };

        let (source, offset) = if point.offset == 0 {
            let previous = document
                .get_previous_text(&point.path)
                .filter(|(_, path)| self.closest_block(path) == self.closest_block(&point.path));
            match previous {
                Some((previous, _)) => (previous, previous.len()),
                None => (text, 0),
            }
        } else {
            (text, point.offset)
        };

        let marks = source.marks_at(offset);
        if offset == 0 {
            return marks;
        }
        let following = source.marks_in(offset, 1);
        marks
            .iter()
            .filter(|mark| following.contains(mark) || !self.is_atomic(mark))
            .cloned()
            .collect()
    }

    /// Marks text typed over `range` would carry. Typing over a selection
    /// keeps the formatting of its first character.
    pub fn insert_marks_at_range(&self, range: &Range) -> MarkSet {
        let start = range.start();
        if range.is_collapsed() {
            return self.insert_marks_at_point(start);
        }
        self.document()
            .get_node(&start.path)
            .and_then(Node::as_text)
            .map(|text| text.marks_at(start.offset + 1))
            .unwrap_or_default()
    }

    /// A document holding copies of the blocks covered by `range`, cut at
    /// its edges
    pub fn fragment_at_range(&self, range: &Range) -> Node {
        let (start, end) = range.edges();
        let mut scratch = Value::new(self.document().clone());

        let cuts = [(end.path.clone(), end.offset), (start.path.clone(), start.offset)];
        for (path, offset) in cuts {
            let mut target = path;
            let mut position = offset;
            while !target.is_root() {
                let index = target.last().unwrap_or_default();
                let split = Operation::SplitNode {
                    path: target.clone(),
                    position,
                    properties: split_properties(&scratch.document, &target),
                };
                match split.apply(&scratch) {
                    Ok(next) => scratch = next,
                    Err(_) => return Node::document(Vec::new()),
                }
                position = index + 1;
                target = target.parent().unwrap_or_default();
            }
        }

        let first = start.path.get(0).unwrap_or_default() + 1;
        let last = end.path.get(0).unwrap_or_default() + 1;
        let nodes = scratch.document.nodes().get(first..=last).unwrap_or_default().to_vec();
        Node::document(nodes)
    }
}

/// Type and data of the node at `path`, for the right half of a split
pub(crate) fn split_properties(document: &Node, path: &Path) -> NodeProperties {
    let mut properties = document.get_node(path).map(Node::properties).unwrap_or_default();
    properties.key = None;
    properties
}
