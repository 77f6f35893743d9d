//! Core error types

use thiserror::Error;

/// Core error type for the piconet
#[derive(Debug, Error)]
pub enum CoreError {
    /// Node identity could not be parsed or encoded
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Configuration failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for [`Config`](crate::config::Config)
    #[cfg(feature = "toml")]
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
