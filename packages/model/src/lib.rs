pub mod error;
pub mod history;
pub mod iter;
pub mod json;
pub mod key;
pub mod mark;
pub mod node;
pub mod operation;
pub mod path;
pub mod point;
pub mod range;
pub mod text;
pub mod text_utils;
pub mod transform;
pub mod value;

#[cfg(test)]
mod tests_properties;

pub use error::{ModelError, ModelResult};
pub use history::{should_merge, Batch, History, DEFAULT_HISTORY_LIMIT};
pub use iter::{NodeEntries, NodesOptions};
pub use json::JsonOptions;
pub use key::Key;
pub use mark::{Data, Mark, MarkSet};
pub use node::{Element, Node, NodeProperties, Object};
pub use operation::Operation;
pub use path::Path;
pub use point::Point;
pub use range::{Range, Selection};
pub use text::{Leaf, Text};
pub use transform::Affinity;
pub use value::{Value, ValueProperties};
