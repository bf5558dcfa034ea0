//! # Ranges and the selection
//!
//! A [`Range`] is an `anchor` and a `focus` point. The anchor is where the
//! range was started and the focus where it currently ends, so a range may
//! run backward; [`Range::start`] and [`Range::end`] give the ordered edges.
//! The [`Selection`] is the range the user is editing, plus UI focus and the
//! marks queued for the next typed character.

use crate::mark::MarkSet;
use crate::node::Node;
use crate::path::Path;
use crate::point::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    pub fn is_backward(&self) -> bool {
        self.focus.is_before(&self.anchor)
    }

    pub fn start(&self) -> &Point {
        if self.is_backward() {
            &self.focus
        } else {
            &self.anchor
        }
    }

    pub fn end(&self) -> &Point {
        if self.is_backward() {
            &self.anchor
        } else {
            &self.focus
        }
    }

    pub fn edges(&self) -> (Point, Point) {
        (self.start().clone(), self.end().clone())
    }

    /// True if `point` lies within the range, edges included
    pub fn includes(&self, point: &Point) -> bool {
        !point.is_before(self.start()) && !point.is_after(self.end())
    }

    /// True if the node at `path` has any text inside the range
    pub fn touches(&self, path: &Path) -> bool {
        let (start, end) = (self.start(), self.end());
        let inside = |p: &Path| p == path || path.is_ancestor_of(p);
        inside(&start.path) || inside(&end.path) || (start.path < *path && path.is_before(&end.path))
    }

    pub fn collapse_to_start(&self) -> Range {
        Range::collapsed(self.start().clone())
    }

    pub fn collapse_to_end(&self) -> Range {
        Range::collapsed(self.end().clone())
    }

    pub fn collapse_to_anchor(&self) -> Range {
        Range::collapsed(self.anchor.clone())
    }

    pub fn collapse_to_focus(&self) -> Range {
        Range::collapsed(self.focus.clone())
    }

    pub fn with_start(&self, start: Point) -> Range {
        if self.is_backward() {
            Range::new(self.anchor.clone(), start)
        } else {
            Range::new(start, self.focus.clone())
        }
    }

    pub fn with_end(&self, end: Point) -> Range {
        if self.is_backward() {
            Range::new(end, self.focus.clone())
        } else {
            Range::new(self.anchor.clone(), end)
        }
    }

    /// Both points resolved into text nodes, or `None` if either is dangling
    pub fn normalize(&self, root: &Node) -> Option<Range> {
        Some(Range::new(self.anchor.normalize(root)?, self.focus.normalize(root)?))
    }

    /// An expanded range that ends at the very start of a later block and
    /// starts at the very start of its own block. Edits treat it as ending at
    /// the close of the block before.
    pub fn is_hanging(&self, root: &Node) -> bool {
        if self.is_collapsed() {
            return false;
        }
        let (start, end) = (self.start(), self.end());
        if start.offset != 0 || end.offset != 0 {
            return false;
        }
        let (Some((_, start_block)), Some((_, end_block))) =
            (root.get_closest_block(&start.path), root.get_closest_block(&end.path))
        else {
            return false;
        };
        start_block != end_block
            && start.is_at_start_of(root, &start_block)
            && end.is_at_start_of(root, &end_block)
    }
}

/// The user's selection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,

    #[serde(default)]
    pub is_focused: bool,

    /// Marks to apply to the next inserted text, overriding the marks at the
    /// caret. Only meaningful while collapsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<MarkSet>,
}

impl Selection {
    pub fn from_range(range: Range) -> Self {
        Self {
            anchor: range.anchor,
            focus: range.focus,
            is_focused: false,
            marks: None,
        }
    }

    pub fn collapsed(point: Point) -> Self {
        Self::from_range(Range::collapsed(point))
    }

    pub fn range(&self) -> Range {
        Range::new(self.anchor.clone(), self.focus.clone())
    }

    /// Replace the points, keeping focus state and pending marks
    pub fn with_range(&self, range: Range) -> Selection {
        Selection {
            anchor: range.anchor,
            focus: range.focus,
            is_focused: self.is_focused,
            marks: self.marks.clone(),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    pub fn start(&self) -> &Point {
        if self.focus.is_before(&self.anchor) {
            &self.focus
        } else {
            &self.anchor
        }
    }

    pub fn end(&self) -> &Point {
        if self.focus.is_before(&self.anchor) {
            &self.anchor
        } else {
            &self.focus
        }
    }
}

impl From<Range> for Selection {
    fn from(range: Range) -> Self {
        Selection::from_range(range)
    }
}
