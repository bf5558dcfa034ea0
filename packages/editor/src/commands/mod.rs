//! # Commands
//!
//! Edits are layered. Each layer is written in terms of the one below and
//! every command runs inside [`Editor::command`], so normalization happens
//! once when the outermost command returns.
//!
//! ```text
//! at_selection   insert_text, delete_backward, toggle_mark, ...
//!      │             resolve the selection, snapshot it for undo
//!      ▼
//! at_range       insert_text_at_range, delete_at_range, ...
//!      │             hanging ranges, void ancestors, block splits
//!      ▼
//! by_path        split_node_by_path, remove_text_by_path, ...
//!      │             one node, expressed as primitive operations
//!      ▼
//! Editor::apply
//! ```
//!
//! Selection movement (`select`, `move_forward`, ...) lives in
//! `selection` and only ever applies `set_selection`.
//!
//! Commands are not transactional. An error part way through leaves the
//! operations already applied in place.

mod at_range;
mod at_selection;
mod by_path;
mod selection;

use quire_model::Node;

/// A copy of `node` with no children, for wrapping
pub(crate) fn emptied(node: &Node) -> Node {
    let mut node = node.clone();
    if let Some(element) = node.as_element_mut() {
        element.set_nodes(Vec::new());
    }
    node
}
