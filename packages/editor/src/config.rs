use crate::errors::{EditorError, EditorResult};
use quire_model::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

/// Editor behaviour switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo depth; 0 keeps every batch
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Normalize the whole document when the editor is created
    #[serde(default = "default_true")]
    pub normalize_on_create: bool,

    /// Fold contiguous typing and deleting into one undo batch
    #[serde(default = "default_true")]
    pub merge_typing: bool,

    /// Extra passes allowed per node before normalization is declared
    /// divergent, on top of the rule and child counts
    #[serde(default)]
    pub iteration_floor: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_true() -> bool {
    true
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> EditorResult<Self> {
        serde_json::from_str(json).map_err(|e| EditorError::InvalidConfig(e.to_string()))
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            normalize_on_create: true,
            merge_typing: true,
            iteration_floor: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "historyLimit": 20,
            "normalizeOnCreate": false,
            "iterationFloor": 4
        }"#;

        let config = EditorConfig::from_json_str(json).unwrap();
        assert_eq!(config.history_limit, 20);
        assert!(!config.normalize_on_create);
        assert!(config.merge_typing);
        assert_eq!(config.iteration_floor, 4);
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.history_limit, 100);
        assert!(config.normalize_on_create);
        assert!(config.merge_typing);
        assert_eq!(config, EditorConfig::from_json_str("{}").unwrap());
    }

    #[test]
    fn test_invalid_config() {
        let err = EditorConfig::from_json_str(r#"{ "historyLimit": "lots" }"#).unwrap_err();
        assert!(matches!(err, EditorError::InvalidConfig(_)));
    }
}
