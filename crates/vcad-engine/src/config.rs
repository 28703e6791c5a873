//! Engine configuration loaded from TOML.
//!
//! Every key is optional:
//!
//! ```toml
//! default_material = "default"
//! cache_capacity = 500
//! skip_clash_detection = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading an [`EngineConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config value for {key}: {reason}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Tunables for the evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Material used when neither an instance nor its part definition names one.
    pub default_material: String,
    /// Maximum number of entries kept in the cross-evaluation geometry cache.
    pub cache_capacity: usize,
    /// Skip the pairwise clash pass.
    pub skip_clash_detection: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_material: "default".to_string(),
            cache_capacity: crate::cache::DEFAULT_CAPACITY,
            skip_clash_detection: false,
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "cache_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.default_material.is_empty() {
            return Err(ConfigError::Invalid {
                key: "default_material",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.cache_capacity, 500);
        assert_eq!(config.default_material, "default");
    }

    #[test]
    fn partial_toml_overrides() {
        let config = EngineConfig::from_toml_str("skip_clash_detection = true\ncache_capacity = 8").unwrap();
        assert!(config.skip_clash_detection);
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.default_material, "default");
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = EngineConfig::from_toml_str("cache_capacity = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "cache_capacity", .. }));
    }

    #[test]
    fn rejects_bad_types() {
        let err = EngineConfig::from_toml_str("cache_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::from_path("/nonexistent/vcad-engine.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
