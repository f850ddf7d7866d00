//! Engine configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides:
//!
//! ```json
//! { "suggestion": { "max_transfer_qty": 6 }, "journal_path": "s2s.jsonl" }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Policy knobs for the suggestion engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionPolicy {
    /// Upper bound on units moved by a single suggestion.
    pub max_transfer_qty: u32,
    /// Minimum number of stores carrying a SKU before it is considered.
    pub min_locations: usize,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self {
            max_transfer_qty: 10,
            min_locations: 2,
        }
    }
}

/// Top-level configuration for a transfer desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub suggestion: SuggestionPolicy,
    /// Where the append-only journal lives.
    pub journal_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suggestion: SuggestionPolicy::default(),
            journal_path: PathBuf::from("transfer_journal.jsonl"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("min_locations must be at least 2, got {0}")]
    TooFewLocations(usize),
    #[error("max_transfer_qty must be positive")]
    ZeroTransferCap,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // A single location has nobody to transfer to.
        if self.suggestion.min_locations < 2 {
            return Err(ConfigError::TooFewLocations(self.suggestion.min_locations));
        }
        if self.suggestion.max_transfer_qty == 0 {
            return Err(ConfigError::ZeroTransferCap);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.suggestion.max_transfer_qty, 10);
        assert_eq!(config.suggestion.min_locations, 2);
    }

    #[test]
    fn test_partial_override() {
        let config =
            EngineConfig::from_json_str(r#"{ "suggestion": { "max_transfer_qty": 6 } }"#).unwrap();
        assert_eq!(config.suggestion.max_transfer_qty, 6);
        assert_eq!(config.suggestion.min_locations, 2);
        assert_eq!(config.journal_path, PathBuf::from("transfer_journal.jsonl"));
    }

    #[test]
    fn test_rejects_single_location() {
        let err = EngineConfig::from_json_str(r#"{ "suggestion": { "min_locations": 1 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::TooFewLocations(1)));
    }

    #[test]
    fn test_rejects_zero_transfer_cap() {
        let err = EngineConfig::from_json_str(r#"{ "suggestion": { "max_transfer_qty": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTransferCap));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_file("/nonexistent/transfer-engine.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
