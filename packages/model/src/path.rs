//! # Paths
//!
//! A path is the list of sibling indexes walked from the document root to a
//! node. Paths are only meaningful against the tree snapshot they were
//! computed from; anything that must outlive an operation either uses a
//! [`Key`](crate::Key) or maps the path through [`Path::transform`].
//!
//! The derived ordering is lexicographic, which is document pre-order: an
//! ancestor sorts before its descendants and siblings sort by index.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(indexes: Vec<usize>) -> Self {
        Self(indexes)
    }

    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn get(&self, depth: usize) -> Option<usize> {
        self.0.get(depth).copied()
    }

    pub(crate) fn indexes_mut(&mut self) -> &mut Vec<usize> {
        &mut self.0
    }

    /// Path of the child at `index` below this node
    pub fn child(&self, index: usize) -> Path {
        let mut indexes = self.0.clone();
        indexes.push(index);
        Path(indexes)
    }

    /// Append a relative path
    pub fn concat(&self, relative: &Path) -> Path {
        let mut indexes = self.0.clone();
        indexes.extend_from_slice(&relative.0);
        Path(indexes)
    }

    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Path(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn next(&self) -> Option<Path> {
        let last = self.last()?;
        let mut indexes = self.0.clone();
        *indexes.last_mut()? = last + 1;
        Some(Path(indexes))
    }

    pub fn previous(&self) -> Option<Path> {
        let last = self.last()?;
        if last == 0 {
            return None;
        }
        let mut indexes = self.0.clone();
        *indexes.last_mut()? = last - 1;
        Some(Path(indexes))
    }

    /// Every proper ancestor, root first
    pub fn ancestors(&self) -> Vec<Path> {
        (0..self.0.len()).map(|i| Path(self.0[..i].to_vec())).collect()
    }

    /// Truncate to the first `depth` indexes
    pub fn slice(&self, depth: usize) -> Path {
        Path(self.0[..depth.min(self.0.len())].to_vec())
    }

    /// Path of `self` relative to `ancestor`
    pub fn relative(&self, ancestor: &Path) -> Option<Path> {
        if !ancestor.is_ancestor_of(self) && ancestor != self {
            return None;
        }
        Some(Path(self.0[ancestor.len()..].to_vec()))
    }

    /// Deepest path that is an ancestor-or-self of both
    pub fn common(&self, other: &Path) -> Path {
        let shared = self
            .0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count();
        Path(self.0[..shared].to_vec())
    }

    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Alias kept for the "is above" phrasing used by edit algorithms
    pub fn is_above(&self, other: &Path) -> bool {
        self.is_ancestor_of(other)
    }

    pub fn is_descendant_of(&self, other: &Path) -> bool {
        other.is_ancestor_of(self)
    }

    pub fn is_sibling_of(&self, other: &Path) -> bool {
        !self.0.is_empty()
            && self.0.len() == other.0.len()
            && self.0[..self.0.len() - 1] == other.0[..other.0.len() - 1]
            && self != other
    }

    /// Compare two paths over their shared depth. Ancestors compare equal to
    /// their descendants here; use `Ord` for the total pre-order.
    pub fn compare_shallow(&self, other: &Path) -> Ordering {
        let depth = self.0.len().min(other.0.len());
        self.0[..depth].cmp(&other.0[..depth])
    }

    /// Strictly before `other` in document order and not one of its ancestors
    pub fn is_before(&self, other: &Path) -> bool {
        self.compare_shallow(other) == Ordering::Less
    }

    /// Strictly after `other` in document order and not one of its descendants
    pub fn is_after(&self, other: &Path) -> bool {
        self.compare_shallow(other) == Ordering::Greater
    }

    /// `self` is an earlier sibling of `other` or of one of its ancestors
    pub fn ends_before(&self, other: &Path) -> bool {
        let Some(i) = self.0.len().checked_sub(1) else {
            return false;
        };
        if other.0.len() <= i {
            return false;
        }
        self.0[..i] == other.0[..i] && self.0[i] < other.0[i]
    }

    /// `self` is a later sibling of `other` or of one of its ancestors
    pub fn ends_after(&self, other: &Path) -> bool {
        let Some(i) = self.0.len().checked_sub(1) else {
            return false;
        };
        if other.0.len() <= i {
            return false;
        }
        self.0[..i] == other.0[..i] && self.0[i] > other.0[i]
    }
}

impl From<Vec<usize>> for Path {
    fn from(indexes: Vec<usize>) -> Self {
        Self(indexes)
    }
}

impl From<&[usize]> for Path {
    fn from(indexes: &[usize]) -> Self {
        Self(indexes.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indexes: [usize; N]) -> Self {
        Self(indexes.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", index)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order_is_preorder() {
        let mut paths: Vec<Path> = vec![
            Path::from([1]),
            Path::from([0, 1]),
            Path::root(),
            Path::from([0]),
            Path::from([0, 0, 3]),
            Path::from([0, 0]),
        ];
        paths.sort();

        assert_eq!(
            paths,
            vec![
                Path::root(),
                Path::from([0]),
                Path::from([0, 0]),
                Path::from([0, 0, 3]),
                Path::from([0, 1]),
                Path::from([1]),
            ]
        );
    }

    #[test]
    fn test_ancestry_predicates() {
        let a = Path::from([0, 1]);
        let b = Path::from([0, 1, 2]);

        assert!(a.is_ancestor_of(&b));
        assert!(a.is_above(&b));
        assert!(b.is_descendant_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(!a.is_before(&b));
        assert!(!b.is_after(&a));
        assert!(Path::root().is_ancestor_of(&a));
    }

    #[test]
    fn test_before_after() {
        let a = Path::from([0, 1]);
        let b = Path::from([0, 2, 0]);

        assert!(a.is_before(&b));
        assert!(b.is_after(&a));
        assert!(a.ends_before(&b));
        assert!(b.ends_after(&Path::from([0, 1, 5])));
    }

    #[test]
    fn test_siblings_and_navigation() {
        let a = Path::from([2, 3]);

        assert_eq!(a.parent(), Some(Path::from([2])));
        assert_eq!(a.next(), Some(Path::from([2, 4])));
        assert_eq!(a.previous(), Some(Path::from([2, 2])));
        assert_eq!(Path::from([2, 0]).previous(), None);
        assert!(a.is_sibling_of(&Path::from([2, 0])));
        assert!(!a.is_sibling_of(&a));
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_common_and_relative() {
        let a = Path::from([1, 2, 3]);
        let b = Path::from([1, 2, 0, 4]);

        assert_eq!(a.common(&b), Path::from([1, 2]));
        assert_eq!(b.relative(&Path::from([1, 2])), Some(Path::from([0, 4])));
        assert_eq!(b.relative(&Path::from([3])), None);
        assert_eq!(a.ancestors(), vec![Path::root(), Path::from([1]), Path::from([1, 2])]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Path::from([0, 12, 3]).to_string(), "[0,12,3]");
        assert_eq!(Path::root().to_string(), "[]");
    }
}
