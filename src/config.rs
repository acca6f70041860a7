//! Engine configuration with defaults, TOML loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a [`crate::DiceEngine`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ceiling for the target score of newly created games. Mutable at
    /// runtime through the admin surface; this is the initial value.
    pub max_target_score: u32,

    /// Capacity of the broadcast channel carrying observable game events.
    /// Slow subscribers that fall more than this far behind lose events.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_target_score: 20,
            event_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text. Missing fields fall back to
    /// defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&raw)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_target_score == 0 {
            return Err(ConfigError::Invalid(
                "max_target_score must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration loading/validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
