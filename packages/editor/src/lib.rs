//! # Quire Editor
//!
//! Editing engine for structured rich-text documents built on `quire-model`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ commands: at selection → at range → by path │
//! │  - Deletes, inserts, splits, marks, wraps   │
//! │  - Selection movement                       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: apply one operation                 │
//! │  - Next value, dirty paths                  │
//! │  - History batches, selection upkeep        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ normalize: schema repairs on dirty paths    │
//! │  - Core rules, then user rules              │
//! │  - Plugins answer void/inline/atomic first  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Operations are the only way in**: every change is a primitive
//!    operation that can be inverted and replayed
//! 2. **Normalize after, not during**: a command may leave the document
//!    invalid part way through; the outermost command repairs what it
//!    touched
//! 3. **Values are snapshots**: each operation produces a new [`Value`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_editor::Editor;
//! use quire_model::{Node, Point, Selection, Value};
//!
//! let value = Value::new(Node::document(vec![Node::block("paragraph", vec![Node::new_text("")])]))
//!     .with_selection(Selection::collapsed(Point::new([0, 0], 0)));
//! let mut editor = Editor::new(value)?;
//!
//! editor.insert_text("Hello")?;
//! editor.split_block(1)?;
//! editor.insert_text("world")?;
//! editor.undo()?;
//! ```
//!
//! [`Value`]: quire_model::Value

mod commands;
mod config;
mod editor;
mod errors;
mod history;
mod normalize;
mod plugin;
mod queries;
pub mod schema;

#[cfg(test)]
mod tests_editing;

#[cfg(test)]
mod tests_voids;

pub use config::EditorConfig;
pub use editor::{EditContext, Editor, EditorBuilder};
pub use errors::{EditorError, EditorResult};
pub use plugin::{Next, Plugin, TransferData};
pub use schema::{ChildGroup, Match, MarkRule, Rule, Schema, SchemaDefinition};
