//! # Text nodes
//!
//! A text node stores its string as a list of leaves, each a run of
//! characters sharing one mark set. The leaf list is kept canonical after
//! every edit: no empty leaves (unless the whole text is empty, which is one
//! empty leaf) and no two neighbours with equal marks. Two texts with the same
//! characters and formatting therefore always compare equal.
//!
//! All offsets are counted in `char`s.

use crate::key::Key;
use crate::mark::{Mark, MarkSet};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Leaf {
    pub text: String,
    pub marks: MarkSet,
}

impl Leaf {
    pub fn new(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub key: Key,
    leaves: Vec<Leaf>,
}

/// Byte index of the `offset`th char, clamped to the end of the string
pub(crate) fn byte_index(s: &str, offset: usize) -> usize {
    s.char_indices().nth(offset).map(|(i, _)| i).unwrap_or(s.len())
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_marks(text, MarkSet::new())
    }

    pub fn empty() -> Self {
        Self::new("")
    }

    pub fn with_marks(text: impl Into<String>, marks: MarkSet) -> Self {
        Self::from_leaves(Key::generate(), vec![Leaf::new(text, marks)])
    }

    pub fn from_leaves(key: Key, leaves: Vec<Leaf>) -> Self {
        let mut text = Self { key, leaves };
        text.normalize_leaves();
        text
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.key = key;
        self
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn text(&self) -> String {
        self.leaves.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.leaves.iter().map(Leaf::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.iter().all(Leaf::is_empty)
    }

    /// Marks a character typed at `offset` would inherit: those of the
    /// character before it, or of the first character at offset 0.
    pub fn marks_at(&self, offset: usize) -> MarkSet {
        let mut start = 0;
        for leaf in &self.leaves {
            let end = start + leaf.len();
            if offset <= end && (offset > start || start == 0) {
                return leaf.marks.clone();
            }
            start = end;
        }
        self.leaves.last().map(|l| l.marks.clone()).unwrap_or_default()
    }

    /// Union of the marks of every character in `[offset, offset + length)`
    pub fn marks_in(&self, offset: usize, length: usize) -> MarkSet {
        let mut marks = MarkSet::new();
        self.for_each_leaf_in(offset, length, |leaf| marks = marks.union(&leaf.marks));
        marks
    }

    /// Marks shared by every character in `[offset, offset + length)`
    pub fn active_marks_in(&self, offset: usize, length: usize) -> Option<MarkSet> {
        let mut active: Option<MarkSet> = None;
        self.for_each_leaf_in(offset, length, |leaf| {
            active = Some(match &active {
                Some(current) => current.intersection(&leaf.marks),
                None => leaf.marks.clone(),
            });
        });
        active
    }

    /// Whether `predicate` holds for the marks of every character in
    /// `[offset, offset + length)`
    pub fn all_marks_in(&self, offset: usize, length: usize, predicate: impl Fn(&MarkSet) -> bool) -> bool {
        let mut all = true;
        self.for_each_leaf_in(offset, length, |leaf| all &= predicate(&leaf.marks));
        all
    }

    fn for_each_leaf_in(&self, offset: usize, length: usize, mut f: impl FnMut(&Leaf)) {
        let end = offset.saturating_add(length);
        let mut start = 0;
        for leaf in &self.leaves {
            let leaf_end = start + leaf.len();
            if leaf_end > offset && start < end {
                f(leaf);
            }
            start = leaf_end;
        }
    }

    /// Leaves covering `[offset, offset + length)`, cut at the range edges
    pub fn leaves_in(&self, offset: usize, length: usize) -> Vec<Leaf> {
        let mut copy = self.clone();
        let first = copy.split_leaf_at(offset);
        let last = copy.split_leaf_at(offset + length);
        copy.leaves[first..last].to_vec()
    }

    pub fn insert_text(&mut self, offset: usize, text: &str, marks: &MarkSet) {
        let index = self.split_leaf_at(offset);
        self.leaves.insert(index, Leaf::new(text, marks.clone()));
        self.normalize_leaves();
    }

    pub fn remove_text(&mut self, offset: usize, length: usize) {
        let first = self.split_leaf_at(offset);
        let last = self.split_leaf_at(offset + length);
        self.leaves.drain(first..last);
        self.normalize_leaves();
    }

    pub fn add_mark(&mut self, offset: usize, length: usize, mark: &Mark) {
        self.update_leaves(offset, length, |marks| {
            marks.insert(mark.clone());
        });
    }

    pub fn remove_mark(&mut self, offset: usize, length: usize, mark: &Mark) {
        self.update_leaves(offset, length, |marks| {
            marks.remove(mark);
        });
    }

    pub fn set_mark(&mut self, offset: usize, length: usize, old: &Mark, new: &Mark) {
        self.update_leaves(offset, length, |marks| {
            marks.replace(old, new.clone());
        });
    }

    fn update_leaves(&mut self, offset: usize, length: usize, mut f: impl FnMut(&mut MarkSet)) {
        let first = self.split_leaf_at(offset);
        let last = self.split_leaf_at(offset + length);
        for leaf in &mut self.leaves[first..last] {
            f(&mut leaf.marks);
        }
        self.normalize_leaves();
    }

    /// Cut the text at `position`, keeping the left part and returning the
    /// leaves of the right part.
    pub fn split_off(&mut self, position: usize) -> Vec<Leaf> {
        let index = self.split_leaf_at(position);
        let right = self.leaves.split_off(index);
        self.normalize_leaves();
        right
    }

    pub fn append_leaves(&mut self, leaves: Vec<Leaf>) {
        self.leaves.extend(leaves);
        self.normalize_leaves();
    }

    /// Ensure a leaf boundary at `offset` and return the index of the leaf
    /// that starts there (or the leaf count if `offset` is the end).
    fn split_leaf_at(&mut self, offset: usize) -> usize {
        let mut start = 0;
        for i in 0..self.leaves.len() {
            let len = self.leaves[i].len();
            if offset == start {
                return i;
            }
            if offset < start + len {
                let at = byte_index(&self.leaves[i].text, offset - start);
                let tail = self.leaves[i].text.split_off(at);
                let marks = self.leaves[i].marks.clone();
                self.leaves.insert(i + 1, Leaf::new(tail, marks));
                return i + 1;
            }
            start += len;
        }
        self.leaves.len()
    }

    fn normalize_leaves(&mut self) {
        let mut out: Vec<Leaf> = Vec::with_capacity(self.leaves.len());
        for leaf in self.leaves.drain(..) {
            if leaf.is_empty() {
                continue;
            }
            match out.last_mut() {
                Some(prev) if prev.marks == leaf.marks => prev.text.push_str(&leaf.text),
                _ => out.push(leaf),
            }
        }
        if out.is_empty() {
            out.push(Leaf::default());
        }
        self.leaves = out;
    }
}
