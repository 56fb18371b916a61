//! Configuration errors.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config file {0}: {1}")]
    Io(String, #[source] std::io::Error),

    /// YAML parse failure
    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parse failure
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// File extension is not a supported format
    #[error("unsupported config format: {0} (expected yaml, yml, or toml)")]
    UnknownFormat(String),

    /// Configuration parsed but failed a semantic check
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
