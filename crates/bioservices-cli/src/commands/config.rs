//! `bioservices config` command implementation
//!
//! Reads and edits the settings file. `get` and `show` report the
//! effective values (file plus environment overrides); `set` and `init`
//! only touch the file.

use crate::commands::{load_settings, settings_path};
use crate::error::{CliError, Result};
use bioservices_common::Settings;
use colored::Colorize;
use std::path::Path;

/// Show the effective settings as TOML
pub fn show(config: Option<&Path>) -> Result<()> {
    let path = settings_path(config)?;
    let settings = load_settings(config)?;

    println!("{}", "bioservices settings:".cyan().bold());
    println!("{:<10} {}", "file:", path.display());
    if !path.exists() {
        println!("{:<10} {}", "", "(not created yet, showing defaults)".dimmed());
    }
    println!();
    print!("{}", toml::to_string_pretty(&settings)?);
    Ok(())
}

/// Print the settings file path
pub fn path(config: Option<&Path>) -> Result<()> {
    println!("{}", settings_path(config)?.display());
    Ok(())
}

/// Write a settings file with default values
pub fn init(config: Option<&Path>, force: bool) -> Result<()> {
    let path = settings_path(config)?;
    if path.exists() && !force {
        return Err(CliError::config(format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        )));
    }

    let mut settings = Settings::default();
    settings.general.cache_dir = Settings::suggested_cache_dir();
    settings.save(&path)?;

    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

/// Print one effective setting
pub fn get(config: Option<&Path>, key: &str) -> Result<()> {
    let settings = load_settings(config)?;
    println!("{}", settings.get(key)?);
    Ok(())
}

/// Update one setting in the settings file
pub fn set(config: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let path = settings_path(config)?;
    let mut settings = Settings::load_from(&path)?;
    settings.set(key, value)?;
    settings.save(&path)?;

    println!("{} {} = {}", "✓".green(), key, value);
    Ok(())
}
