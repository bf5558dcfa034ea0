use crate::key::Key;
use crate::path::Path;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised when an operation or query is handed an address that does
/// not exist in the tree it is resolved against. These are caller bugs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("No node at path {0}")]
    InvalidPath(Path),

    #[error("Node at path {0} is not a text node")]
    NotText(Path),

    #[error("Node at path {0} cannot contain children")]
    NotElement(Path),

    #[error("Node at path {0} has no previous sibling to merge into")]
    NoPreviousSibling(Path),

    #[error("Cannot merge node at path {0} into a sibling of a different kind")]
    MergeMismatch(Path),

    #[error("Offset {offset} is out of range for length {length} at {path}")]
    OffsetOutOfRange {
        path: Path,
        offset: usize,
        length: usize,
    },

    #[error("Mark {mark} does not apply cleanly to {offset}+{length} at {path}")]
    MarkMismatch {
        path: Path,
        offset: usize,
        length: usize,
        mark: String,
    },

    #[error("Cannot move node at {path} into its own descendant {new_path}")]
    CannotMoveIntoSelf { path: Path, new_path: Path },

    #[error("Operation cannot target the document root")]
    RootOperation,

    #[error("No node with key {0}")]
    UnknownKey(Key),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

impl ModelError {
    pub fn offset_out_of_range(path: &Path, offset: usize, length: usize) -> Self {
        Self::OffsetOutOfRange {
            path: path.clone(),
            offset,
            length,
        }
    }

    pub fn mark_mismatch(path: &Path, offset: usize, length: usize, mark: &str) -> Self {
        Self::MarkMismatch {
            path: path.clone(),
            offset,
            length,
            mark: mark.to_string(),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson(message.into())
    }
}
