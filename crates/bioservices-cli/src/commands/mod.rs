//! CLI command implementations

pub mod config;
pub mod download;
pub mod services;

use crate::error::Result;
use bioservices_common::Settings;
use std::path::{Path, PathBuf};

/// Settings file used by this invocation
///
/// `--config` wins, then `BIOSERVICES_CONFIG`, then the platform default.
pub fn settings_path(config: Option<&Path>) -> Result<PathBuf> {
    match config {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Settings::default_path()?),
    }
}

/// Load the settings file and apply environment overrides
pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let path = settings_path(config)?;
    Ok(Settings::load_from(&path)?.apply_env()?)
}
