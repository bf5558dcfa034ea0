//! Selection commands. They only ever apply `set_selection`, and a change
//! that leaves the selection as it was applies nothing.
//!
//! Caret stepping moves one user-perceived character at a time. Empty
//! texts are passed over, a void is entered only at its edge and left in
//! one step, and moving from one block into the next costs one step.

use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use quire_model::text_utils::{char_offset_backward, char_offset_forward};
use quire_model::{ModelError, Operation, Path, Point, Range, Selection};

impl Editor {
    /// Select `range`. Pending marks are dropped if the points move.
    pub fn select(&mut self, range: Range) -> EditorResult<()> {
        let range = self.resolve_range(&range)?;
        let next = match self.selection() {
            Some(current) if current.range() == range => current.clone(),
            Some(current) => Selection {
                marks: None,
                ..current.with_range(range)
            },
            None => Selection::from_range(range),
        };
        self.set_selection(Some(next))
    }

    pub fn deselect(&mut self) -> EditorResult<()> {
        self.set_selection(None)
    }

    pub fn focus(&mut self) -> EditorResult<()> {
        self.update_selection(|selection| selection.is_focused = true)
    }

    pub fn blur(&mut self) -> EditorResult<()> {
        self.update_selection(|selection| selection.is_focused = false)
    }

    /// Record the current selection in history as the start of a new
    /// batch, so undoing what follows restores it
    pub fn snapshot_selection(&mut self) -> EditorResult<()> {
        let current = self.value.selection.clone();
        self.without_merging(|editor| {
            editor.command(|editor| {
                editor.apply(Operation::SetSelection {
                    properties: current.clone(),
                    new_properties: current,
                })
            })
        })
    }

    pub fn move_to(&mut self, point: Point) -> EditorResult<()> {
        self.select(Range::collapsed(point))
    }

    pub fn move_to_range_of_node(&mut self, path: &Path) -> EditorResult<()> {
        let (start, end) = self.node_edges(path)?;
        self.select(Range::new(start, end))
    }

    pub fn move_to_start_of_node(&mut self, path: &Path) -> EditorResult<()> {
        let (start, _) = self.node_edges(path)?;
        self.move_to(start)
    }

    pub fn move_to_end_of_node(&mut self, path: &Path) -> EditorResult<()> {
        let (_, end) = self.node_edges(path)?;
        self.move_to(end)
    }

    pub fn move_to_start_of_document(&mut self) -> EditorResult<()> {
        self.move_to_start_of_node(&Path::root())
    }

    pub fn move_to_end_of_document(&mut self) -> EditorResult<()> {
        self.move_to_end_of_node(&Path::root())
    }

    /// Collapse the selection to its start
    pub fn move_to_start(&mut self) -> EditorResult<()> {
        let start = self.selection().ok_or(EditorError::NoSelection)?.start().clone();
        self.move_to(start)
    }

    /// Collapse the selection to its end
    pub fn move_to_end(&mut self) -> EditorResult<()> {
        let end = self.selection().ok_or(EditorError::NoSelection)?.end().clone();
        self.move_to(end)
    }

    /// Step both points `n` characters forward
    pub fn move_forward(&mut self, n: usize) -> EditorResult<()> {
        let selection = self.selection().ok_or(EditorError::NoSelection)?;
        let anchor = self.step(&selection.anchor, n, Editor::next_point);
        let focus = self.step(&selection.focus, n, Editor::next_point);
        self.select(Range::new(anchor, focus))
    }

    /// Step both points `n` characters backward
    pub fn move_backward(&mut self, n: usize) -> EditorResult<()> {
        let selection = self.selection().ok_or(EditorError::NoSelection)?;
        let anchor = self.step(&selection.anchor, n, Editor::previous_point);
        let focus = self.step(&selection.focus, n, Editor::previous_point);
        self.select(Range::new(anchor, focus))
    }

    /// Step only the focus, extending or shrinking the selection
    pub fn extend_forward(&mut self, n: usize) -> EditorResult<()> {
        let selection = self.selection().ok_or(EditorError::NoSelection)?;
        let anchor = selection.anchor.clone();
        let focus = self.step(&selection.focus, n, Editor::next_point);
        self.select(Range::new(anchor, focus))
    }

    pub fn extend_backward(&mut self, n: usize) -> EditorResult<()> {
        let selection = self.selection().ok_or(EditorError::NoSelection)?;
        let anchor = selection.anchor.clone();
        let focus = self.step(&selection.focus, n, Editor::previous_point);
        self.select(Range::new(anchor, focus))
    }

    /// The caret position one character after `point`
    pub fn next_point(&self, point: &Point) -> Option<Point> {
        let document = self.document();

        if let Some(void) = self.closest_void(&point.path) {
            let (_, last) = document.get_node(&void)?.get_last_text()?;
            let (_, next) = document.get_next_text(&void.concat(&last))?;
            return Some(Point::new(next, 0));
        }

        let text = document.get_node(&point.path)?.as_text()?;
        if point.offset < text.len() {
            let step = char_offset_forward(&text.text(), point.offset).max(1);
            return Some(point.with_offset(point.offset + step));
        }

        let (_, next) = document.get_next_text(&point.path)?;
        let landing = Point::new(next, 0);
        if self.has_void_parent(&landing.path) || self.closest_block(&landing.path) != self.closest_block(&point.path) {
            return Some(landing);
        }
        self.next_point(&landing)
    }

    /// The caret position one character before `point`
    pub fn previous_point(&self, point: &Point) -> Option<Point> {
        let document = self.document();

        if let Some(void) = self.closest_void(&point.path) {
            let (_, first) = document.get_node(&void)?.get_first_text()?;
            let (text, previous) = document.get_previous_text(&void.concat(&first))?;
            return Some(Point::new(previous, text.len()));
        }

        let text = document.get_node(&point.path)?.as_text()?;
        if point.offset > 0 {
            let step = char_offset_backward(&text.text(), point.offset).max(1);
            return Some(point.with_offset(point.offset.saturating_sub(step)));
        }

        let (text, previous) = document.get_previous_text(&point.path)?;
        let landing = Point::new(previous, text.len());
        if self.has_void_parent(&landing.path) || self.closest_block(&landing.path) != self.closest_block(&point.path) {
            return Some(landing);
        }
        self.previous_point(&landing)
    }

    /// Resolve both points into text nodes
    pub(crate) fn resolve_range(&self, range: &Range) -> EditorResult<Range> {
        let document = self.document();
        let resolve = |point: &Point| {
            point
                .normalize(document)
                .ok_or_else(|| EditorError::from(ModelError::InvalidPath(point.path.clone())))
        };
        Ok(Range::new(resolve(&range.anchor)?, resolve(&range.focus)?))
    }

    /// The selection as a range, or an error if there is none
    pub(crate) fn selected_range(&self) -> EditorResult<Range> {
        self.selection().map(Selection::range).ok_or(EditorError::NoSelection)
    }

    pub(crate) fn set_selection(&mut self, next: Option<Selection>) -> EditorResult<()> {
        self.command(|editor| {
            if editor.value.selection == next {
                return Ok(());
            }
            let properties = editor.value.selection.clone();
            editor.apply(Operation::SetSelection {
                properties,
                new_properties: next,
            })
        })
    }

    pub(crate) fn update_selection(&mut self, update: impl FnOnce(&mut Selection)) -> EditorResult<()> {
        let mut next = self.selection().cloned().ok_or(EditorError::NoSelection)?;
        update(&mut next);
        self.set_selection(Some(next))
    }

    /// Start of the first text and end of the last text in the node at
    /// `path`
    fn node_edges(&self, path: &Path) -> EditorResult<(Point, Point)> {
        let node = self.document().assert_node(path)?;
        let first = node.get_first_text().map(|(_, p)| Point::new(path.concat(&p), 0));
        let last = node
            .get_last_text()
            .map(|(text, p)| Point::new(path.concat(&p), text.len()));
        match (first, last) {
            (Some(first), Some(last)) => Ok((first, last)),
            _ => Err(ModelError::NotText(path.clone()).into()),
        }
    }

    fn step(&self, point: &Point, n: usize, next: fn(&Editor, &Point) -> Option<Point>) -> Point {
        let mut point = point.clone();
        for _ in 0..n {
            match next(self, &point) {
                Some(stepped) => point = stepped,
                None => break,
            }
        }
        point
    }
}
