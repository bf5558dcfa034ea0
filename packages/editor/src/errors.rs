//! Error types for the editor

use quire_model::{ModelError, Path};
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// A node kept failing validation. The schema's repairs do not converge.
    #[error("Normalization of node at {path} did not converge after {iterations} iterations")]
    NormalizationDiverged { path: Path, iterations: usize },

    #[error("Editor has no selection")]
    NoSelection,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
