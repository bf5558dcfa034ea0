//! Map addresses held across an operation to where they point afterwards.
//!
//! An address is only valid against the tree it was taken from. Anything
//! that must survive an edit (the selection, dirty paths, a command's
//! bookkeeping) is pushed through each operation as it is applied.

use crate::operation::Operation;
use crate::path::Path;
use crate::point::Point;
use crate::range::{Range, Selection};

/// Which side an address sticks to when an edit lands exactly on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    #[default]
    Forward,
    Backward,
}

impl Path {
    /// The same node's path after `op`, or `None` if `op` removed it
    pub fn transform(&self, op: &Operation) -> Option<Path> {
        self.transform_with(op, Affinity::Forward)
    }

    pub fn transform_with(&self, op: &Operation, affinity: Affinity) -> Option<Path> {
        if self.is_root() {
            return Some(self.clone());
        }

        let mut p = self.clone();
        match op {
            Operation::InsertNode { path: op, .. } => {
                if op == &p || op.ends_before(&p) || op.is_ancestor_of(&p) {
                    p.indexes_mut()[op.len() - 1] += 1;
                }
            }

            Operation::RemoveNode { path: op, .. } => {
                if op == &p || op.is_ancestor_of(&p) {
                    return None;
                }
                if op.ends_before(&p) {
                    p.indexes_mut()[op.len() - 1] -= 1;
                }
            }

            Operation::MergeNode {
                path: op, position, ..
            } => {
                if op == &p || op.ends_before(&p) {
                    p.indexes_mut()[op.len() - 1] -= 1;
                } else if op.is_ancestor_of(&p) {
                    let depth = op.len();
                    let indexes = p.indexes_mut();
                    indexes[depth - 1] -= 1;
                    indexes[depth] += position;
                }
            }

            Operation::SplitNode {
                path: op, position, ..
            } => {
                if op == &p {
                    if affinity == Affinity::Forward {
                        let last = p.len() - 1;
                        p.indexes_mut()[last] += 1;
                    }
                } else if op.ends_before(&p) {
                    p.indexes_mut()[op.len() - 1] += 1;
                } else if op.is_ancestor_of(&p) && self.as_slice()[op.len()] >= *position {
                    let depth = op.len();
                    let indexes = p.indexes_mut();
                    indexes[depth - 1] += 1;
                    indexes[depth] -= position;
                }
            }

            Operation::MoveNode { path: op, new_path } => {
                if op == new_path {
                    return Some(p);
                }

                if op == &p || op.is_ancestor_of(&p) {
                    let mut landing = new_path.clone();
                    if op.ends_before(new_path) && op.len() < new_path.len() {
                        landing.indexes_mut()[op.len() - 1] -= 1;
                    }
                    return Some(landing.concat(&Path::from(&self.as_slice()[op.len()..])));
                }

                if op.is_sibling_of(new_path) && (new_path == &p || new_path.is_ancestor_of(&p)) {
                    if op.ends_before(&p) {
                        p.indexes_mut()[op.len() - 1] -= 1;
                    } else {
                        p.indexes_mut()[op.len() - 1] += 1;
                    }
                } else if new_path.ends_before(&p) || new_path == &p || new_path.is_ancestor_of(&p) {
                    if op.ends_before(&p) {
                        p.indexes_mut()[op.len() - 1] -= 1;
                    }
                    p.indexes_mut()[new_path.len() - 1] += 1;
                } else if op.ends_before(&p) {
                    if new_path == &p {
                        p.indexes_mut()[new_path.len() - 1] += 1;
                    }
                    p.indexes_mut()[op.len() - 1] -= 1;
                }
            }

            _ => {}
        }

        Some(p)
    }
}

impl Point {
    pub fn transform(&self, op: &Operation) -> Option<Point> {
        self.transform_with(op, Affinity::Forward)
    }

    /// The same caret position after `op`, or `None` if its text was removed
    pub fn transform_with(&self, op: &Operation, affinity: Affinity) -> Option<Point> {
        let mut point = self.clone();

        match op {
            Operation::InsertText { path, offset, text, .. } => {
                if path == &self.path
                    && (*offset < self.offset || (*offset == self.offset && affinity == Affinity::Forward))
                {
                    point.offset += text.chars().count();
                }
            }

            Operation::RemoveText { path, offset, text, .. } => {
                if path == &self.path && *offset <= self.offset {
                    point.offset -= (self.offset - offset).min(text.chars().count());
                }
            }

            Operation::MergeNode { path, position, .. } => {
                if path == &self.path {
                    point.offset += position;
                }
                point.path = self.path.transform_with(op, affinity)?;
            }

            Operation::SplitNode { path, position, .. } => {
                if path == &self.path {
                    if *position < self.offset || (*position == self.offset && affinity == Affinity::Forward) {
                        point.offset -= position;
                        point.path = self.path.transform_with(op, Affinity::Forward)?;
                    }
                } else {
                    point.path = self.path.transform_with(op, affinity)?;
                }
            }

            Operation::InsertNode { .. } | Operation::RemoveNode { .. } | Operation::MoveNode { .. } => {
                point.path = self.path.transform_with(op, affinity)?;
            }

            _ => {}
        }

        Some(point)
    }
}

impl Range {
    /// Transform both points, keeping them pulled inward: the start sticks
    /// forward and the end backward, unless the range is collapsed.
    pub fn transform(&self, op: &Operation) -> Option<Range> {
        let (anchor_affinity, focus_affinity) = self.affinities();
        let anchor = self.anchor.transform_with(op, anchor_affinity)?;
        let focus = self.focus.transform_with(op, focus_affinity)?;
        Some(Range::new(anchor, focus))
    }
}

impl Range {
    /// Affinities of `(anchor, focus)` that keep an expanded range from
    /// growing over text inserted at its edges
    pub fn affinities(&self) -> (Affinity, Affinity) {
        if self.is_collapsed() {
            (Affinity::Forward, Affinity::Forward)
        } else if self.is_backward() {
            (Affinity::Backward, Affinity::Forward)
        } else {
            (Affinity::Forward, Affinity::Backward)
        }
    }
}

impl Selection {
    pub fn transform(&self, op: &Operation) -> Option<Selection> {
        self.range().transform(op).map(|range| self.with_range(range))
    }
}
