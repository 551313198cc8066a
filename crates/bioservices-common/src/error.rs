//! Error types shared across the workspace

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for settings and shared helpers
pub type Result<T> = std::result::Result<T, BioError>;

/// Errors raised outside of a service call: settings, files, parsing of
/// shared enums.
#[derive(Error, Debug)]
pub enum BioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to parse settings file '{path}': {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    SettingsWrite(#[from] toml::ser::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown settings key: {0}")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {what}")]
    InvalidValue { what: String, value: String },
}

impl BioError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid value error
    pub fn invalid_value(what: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            what: what.into(),
            value: value.into(),
        }
    }
}
