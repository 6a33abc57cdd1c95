//! Configuration for the SolverForge constraint network.
//!
//! Load network configuration from TOML or YAML to switch assertion modes
//! and tune queue sizing without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use solverforge_config::{EnvironmentMode, NetworkConfig};
//!
//! let config = NetworkConfig::from_toml_str(r#"
//!     environment_mode = "full_assert"
//!     queue_capacity = 64
//! "#).unwrap();
//!
//! assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
//! assert!(config.environment_mode.is_asserted());
//! assert_eq!(config.queue_capacity, 64);
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use solverforge_config::NetworkConfig;
//!
//! let config = NetworkConfig::load("network.toml").unwrap_or_default();
//! assert_eq!(config.queue_capacity, 1000);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default initial capacity of a node's propagation queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct NetworkConfig {
    /// Environment mode affecting assertions.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Initial capacity of each node's propagation queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment_mode: EnvironmentMode::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl NetworkConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()
    }

    /// Sets the environment mode.
    pub fn with_environment_mode(mut self, environment_mode: EnvironmentMode) -> Self {
        self.environment_mode = environment_mode;
        self
    }

    /// Sets the initial queue capacity.
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Environment mode affecting network behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// Non-reproducible mode with minimal overhead.
    #[default]
    NonReproducible,

    /// Reproducible mode with deterministic behavior.
    Reproducible,

    /// Fast assert mode with basic assertions.
    FastAssert,

    /// Full assert mode with comprehensive assertions.
    FullAssert,
}

impl EnvironmentMode {
    /// Returns true for the modes that enable internal assertions, such as
    /// detecting group keys whose hash changes while they are in use.
    pub fn is_asserted(self) -> bool {
        matches!(self, EnvironmentMode::FastAssert | EnvironmentMode::FullAssert)
    }
}

#[cfg(test)]
mod tests;
