//! Ordered `(node, path)` iteration over a subtree.

use crate::node::Node;
use crate::path::Path;

#[derive(Debug, Clone, Default)]
pub struct NodesOptions {
    /// Start the walk at this path; its ancestors are still yielded on the way down
    pub from: Option<Path>,

    /// Stop once the walk moves past this path
    pub to: Option<Path>,

    /// Visit children last-to-first
    pub reverse: bool,

    /// Yield the node the walk starts from as `(root, [])`
    pub include_root: bool,
}

/// Pre-order walk. Every node is yielded once, before its children.
pub struct NodeEntries<'a> {
    root: &'a Node,
    node: Option<&'a Node>,
    path: Path,
    ascended: bool,
    from: Path,
    to: Option<Path>,
    reverse: bool,
    include_root: bool,
}

impl Node {
    pub fn entries(&self, options: NodesOptions) -> NodeEntries<'_> {
        NodeEntries {
            root: self,
            node: Some(self),
            path: Path::root(),
            ascended: false,
            from: options.from.unwrap_or_default(),
            to: options.to,
            reverse: options.reverse,
            include_root: options.include_root,
        }
    }
}

impl<'a> NodeEntries<'a> {
    fn advance(&mut self, node: &'a Node) {
        let children = node.nodes();
        if !self.ascended && !children.is_empty() {
            let mut index = if self.reverse { children.len() - 1 } else { 0 };
            if self.path.is_ancestor_of(&self.from) {
                if let Some(wanted) = self.from.get(self.path.len()) {
                    index = wanted.min(children.len() - 1);
                }
            }
            self.path = self.path.child(index);
            self.node = children.get(index);
            return;
        }

        if self.path.is_root() {
            self.node = None;
            return;
        }

        if !self.reverse {
            if let Some(next) = self.path.next() {
                if let Some(sibling) = self.root.get_node(&next) {
                    self.path = next;
                    self.node = Some(sibling);
                    self.ascended = false;
                    return;
                }
            }
        } else if let Some(previous) = self.path.previous() {
            self.node = self.root.get_node(&previous);
            self.path = previous;
            self.ascended = false;
            return;
        }

        // Climb back up; the parent was already yielded.
        let parent = self.path.parent().unwrap_or_default();
        self.node = self.root.get_node(&parent);
        self.path = parent;
        self.ascended = true;
    }
}

impl<'a> Iterator for NodeEntries<'a> {
    type Item = (&'a Node, Path);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.node?;

            if let Some(to) = &self.to {
                let past = if self.reverse {
                    self.path.is_before(to)
                } else {
                    self.path.is_after(to)
                };
                if past {
                    self.node = None;
                    return None;
                }
            }

            let item = (!self.ascended).then(|| (node, self.path.clone()));
            self.advance(node);

            match item {
                Some((_, ref path)) if path.is_root() && !self.include_root => continue,
                Some(item) => return Some(item),
                None => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::document(vec![
            Node::block("a", vec![Node::new_text("1"), Node::new_text("2")]),
            Node::block("b", vec![Node::block("c", vec![Node::new_text("3")])]),
            Node::block("d", vec![Node::new_text("4")]),
        ])
    }

    fn paths(entries: NodeEntries<'_>) -> Vec<Path> {
        entries.map(|(_, p)| p).collect()
    }

    #[test]
    fn test_forward_preorder() {
        let doc = sample();
        let all = paths(doc.entries(NodesOptions::default()));
        assert_eq!(
            all,
            vec![
                Path::from([0]),
                Path::from([0, 0]),
                Path::from([0, 1]),
                Path::from([1]),
                Path::from([1, 0]),
                Path::from([1, 0, 0]),
                Path::from([2]),
                Path::from([2, 0]),
            ]
        );

        // Forward pre-order agrees with the total order on paths.
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);
    }

    #[test]
    fn test_include_root() {
        let doc = sample();
        let first = doc
            .entries(NodesOptions {
                include_root: true,
                ..Default::default()
            })
            .next()
            .unwrap();
        assert_eq!(first.1, Path::root());
        assert!(first.0.is_document());
    }

    #[test]
    fn test_reverse() {
        let doc = sample();
        let all = paths(doc.entries(NodesOptions {
            reverse: true,
            ..Default::default()
        }));
        assert_eq!(
            all,
            vec![
                Path::from([2]),
                Path::from([2, 0]),
                Path::from([1]),
                Path::from([1, 0]),
                Path::from([1, 0, 0]),
                Path::from([0]),
                Path::from([0, 1]),
                Path::from([0, 0]),
            ]
        );
    }

    #[test]
    fn test_range_scoped() {
        let doc = sample();
        let scoped = paths(doc.entries(NodesOptions {
            from: Some(Path::from([0, 1])),
            to: Some(Path::from([1, 0, 0])),
            ..Default::default()
        }));
        assert_eq!(
            scoped,
            vec![
                Path::from([0]),
                Path::from([0, 1]),
                Path::from([1]),
                Path::from([1, 0]),
                Path::from([1, 0, 0]),
            ]
        );
    }

    #[test]
    fn test_text_leaf_root() {
        let text = Node::new_text("solo");
        assert_eq!(text.entries(NodesOptions::default()).count(), 0);
    }
}
