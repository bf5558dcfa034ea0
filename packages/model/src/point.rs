use crate::node::Node;
use crate::path::Path;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A caret position: a text node and a char offset inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }

    /// Document order; points at the same path order by offset
    pub fn compare(&self, other: &Point) -> Ordering {
        self.path.cmp(&other.path).then(self.offset.cmp(&other.offset))
    }

    pub fn is_before(&self, other: &Point) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn is_after(&self, other: &Point) -> bool {
        self.compare(other) == Ordering::Greater
    }

    pub fn with_offset(&self, offset: usize) -> Point {
        Point::new(self.path.clone(), offset)
    }

    pub fn is_at_start_of(&self, root: &Node, path: &Path) -> bool {
        match root.get_node(path).and_then(Node::get_first_text) {
            Some((_, first)) => self.offset == 0 && self.path == path.concat(&first),
            None => false,
        }
    }

    pub fn is_at_end_of(&self, root: &Node, path: &Path) -> bool {
        match root.get_node(path).and_then(Node::get_last_text) {
            Some((text, last)) => self.offset == text.len() && self.path == path.concat(&last),
            None => false,
        }
    }

    /// Resolve a point that addresses an element, or overshoots its text,
    /// to a point inside a text node. An element point's offset is read
    /// against the element's flattened text.
    pub fn normalize(&self, root: &Node) -> Option<Point> {
        let node = root.get_node(&self.path)?;
        if let Node::Text(text) = node {
            return Some(self.with_offset(self.offset.min(text.len())));
        }

        let mut remaining = self.offset;
        let mut last = None;
        for (text, relative) in node.texts() {
            if remaining <= text.len() {
                return Some(Point::new(self.path.concat(&relative), remaining));
            }
            remaining -= text.len();
            last = Some((text.len(), relative));
        }
        last.map(|(len, relative)| Point::new(self.path.concat(&relative), len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Node {
        Node::document(vec![
            Node::block("p", vec![Node::new_text("ab"), Node::inline("i", vec![Node::new_text("cd")]), Node::new_text("")]),
            Node::block("p", vec![Node::new_text("ef")]),
        ])
    }

    #[test]
    fn test_ordering() {
        let a = Point::new([0, 0], 2);
        let b = Point::new([0, 1, 0], 0);
        assert!(a.is_before(&b));
        assert!(Point::new([0, 0], 1).is_before(&a));
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_normalize_element_point() {
        let doc = doc();
        let point = Point::new([0], 3).normalize(&doc).unwrap();
        assert_eq!(point, Point::new([0, 1, 0], 1));

        let point = Point::new([0], 99).normalize(&doc).unwrap();
        assert_eq!(point, Point::new([0, 2], 0));

        let clamped = Point::new([1, 0], 10).normalize(&doc).unwrap();
        assert_eq!(clamped.offset, 2);

        assert!(Point::new([4], 0).normalize(&doc).is_none());
    }

    #[test]
    fn test_edges_of_node() {
        let doc = doc();
        assert!(Point::new([0, 0], 0).is_at_start_of(&doc, &Path::from([0])));
        assert!(Point::new([0, 2], 0).is_at_end_of(&doc, &Path::from([0])));
        assert!(!Point::new([0, 1, 0], 2).is_at_end_of(&doc, &Path::from([0])));
    }
}
