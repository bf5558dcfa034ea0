//! # Marks
//!
//! A mark is a zero-width formatting tag (`bold`, `link` with an href in its
//! data, ...) carried by runs of text. Marks compare by value only and live
//! on text leaves, never on nodes.

use serde::{Deserialize, Serialize};

/// Free-form property bag attached to nodes, marks and the value itself
pub type Data = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default, skip_serializing_if = "Data::is_empty")]
    pub data: Data,
}

impl Mark {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            data: Data::new(),
        }
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }
}

impl From<&str> for Mark {
    fn from(ty: &str) -> Self {
        Mark::new(ty)
    }
}

/// Unordered set of marks. Insertion order is kept for stable output but
/// plays no part in equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    pub fn contains(&self, mark: &Mark) -> bool {
        self.0.contains(mark)
    }

    pub fn has_type(&self, ty: &str) -> bool {
        self.0.iter().any(|m| m.ty == ty)
    }

    /// Returns false if the mark was already present
    pub fn insert(&mut self, mark: Mark) -> bool {
        if self.contains(&mark) {
            return false;
        }
        self.0.push(mark);
        true
    }

    /// Returns false if the mark was not present
    pub fn remove(&mut self, mark: &Mark) -> bool {
        let before = self.0.len();
        self.0.retain(|m| m != mark);
        self.0.len() != before
    }

    /// Swap `old` for `new` in place, keeping position
    pub fn replace(&mut self, old: &Mark, new: Mark) -> bool {
        match self.0.iter().position(|m| m == old) {
            Some(index) => {
                if self.contains(&new) {
                    self.0.remove(index);
                } else {
                    self.0[index] = new;
                }
                true
            }
            None => false,
        }
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.insert(mark);
        self
    }

    pub fn union(&self, other: &MarkSet) -> MarkSet {
        let mut out = self.clone();
        for mark in other.iter() {
            out.insert(mark.clone());
        }
        out
    }

    pub fn intersection(&self, other: &MarkSet) -> MarkSet {
        MarkSet(self.0.iter().filter(|m| other.contains(m)).cloned().collect())
    }
}

impl PartialEq for MarkSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|m| other.contains(m))
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        marks.into_iter().collect()
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut set = MarkSet::new();
        for mark in iter {
            set.insert(mark);
        }
        set
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equality_ignores_order() {
        let a: MarkSet = vec![Mark::new("bold"), Mark::new("italic")].into();
        let b: MarkSet = vec![Mark::new("italic"), Mark::new("bold")].into();
        assert_eq!(a, b);
    }

    #[test]
    fn test_marks_compare_by_data() {
        let mut data = Data::new();
        data.insert("href".into(), json!("https://example.com"));
        let link = Mark::new("link").with_data(data);

        assert_ne!(link, Mark::new("link"));

        let mut set = MarkSet::new();
        assert!(set.insert(link.clone()));
        assert!(!set.insert(link.clone()));
        assert!(set.insert(Mark::new("link")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_replace_collapses_duplicates() {
        let mut set: MarkSet = vec![Mark::new("bold"), Mark::new("italic")].into();
        assert!(set.replace(&Mark::new("bold"), Mark::new("italic")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_deserialize_dedupes() {
        let set: MarkSet = serde_json::from_value(json!([{"type": "bold"}, {"type": "bold"}])).unwrap();
        assert_eq!(set.len(), 1);
    }
}
