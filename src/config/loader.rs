use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::StationConfig;

/// Errors that can occur when loading station configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse station config from {origin}: {source}")]
    ParseError {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl StationConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Missing keys fall back to their defaults; the result is validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, format!("'{}'", path.display()))
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "inline TOML".to_string())
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The snapshot buffer holds at least one state
    /// - The name is not blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream_capacity == 0 {
            return Err(ConfigError::ValidationError {
                message: "stream_capacity must be at least 1".to_string(),
            });
        }

        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "name must not be empty".to_string(),
            });
        }

        Ok(())
    }

    fn parse(content: &str, origin: String) -> Result<Self, ConfigError> {
        let config: StationConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError { origin, source: e })?;

        config.validate()?;
        Ok(config)
    }
}
