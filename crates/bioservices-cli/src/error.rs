//! Error types for the bioservices CLI
//!
//! Messages are shown to the user as is, so each variant says what to
//! check next.

use bioservices::ServiceError;
use bioservices_common::BioError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// A remote service call failed
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// The settings file could not be read or written
    #[error("{0}. Check the file with 'bioservices config path'.")]
    Settings(#[from] BioError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Process exit code for this error
    ///
    /// 2 for bad input (invalid parameters, configuration), 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Service(e) if e.is_validation() => 2,
            Self::Config(_) | Self::Settings(_) => 2,
            _ => 1,
        }
    }
}
