//! User settings
//!
//! Settings live in a TOML file, by default
//! `~/.config/bioservices/bioservices.toml`:
//!
//! ```toml
//! [general]
//! timeout_secs = 30
//! cache = true
//! cache_expire_secs = 86400
//!
//! [tokens]
//! ncbi = "0123456789abcdef"
//! chemspider = "..."
//!
//! [urls]
//! uniprot = "https://rest.uniprot.org"
//! ```
//!
//! A missing file is not an error: every field has a default. Environment
//! variables are applied on top of the file (see [`Settings::apply_env`]).

use crate::error::{BioError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Settings Constants
// ============================================================================

/// Settings file name inside the config directory
pub const SETTINGS_FILE_NAME: &str = "bioservices.toml";

/// Environment variable pointing at an alternative settings file
pub const SETTINGS_PATH_ENV: &str = "BIOSERVICES_CONFIG";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One day
pub const DEFAULT_CACHE_EXPIRE_SECS: u64 = 86_400;

/// In-flight request bound used by batch fetches
pub const DEFAULT_CONCURRENCY: usize = 4;

const URL_ENV_PREFIX: &str = "BIOSERVICES_URL_";
const TOKEN_ENV_PREFIX: &str = "BIOSERVICES_TOKEN_";

/// Keys accepted by [`Settings::get`] and [`Settings::set`] besides the
/// `tokens.<name>` and `urls.<service>` families.
pub const GENERAL_KEYS: &[&str] = &[
    "timeout_secs",
    "user_agent",
    "cache",
    "cache_dir",
    "cache_expire_secs",
    "concurrency",
];

/// `[general]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Cache GET responses
    pub cache: bool,

    /// Where cached responses are written; in-memory only when unset
    pub cache_dir: Option<PathBuf>,

    /// Age after which a cached response is refetched
    pub cache_expire_secs: u64,

    /// Maximum in-flight requests for batch fetches
    pub concurrency: usize,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
            cache: false,
            cache_dir: None,
            cache_expire_secs: DEFAULT_CACHE_EXPIRE_SECS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

fn default_user_agent() -> String {
    format!("bioservices-rs/{}", env!("CARGO_PKG_VERSION"))
}

/// User settings: general options, API tokens and base URL overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,

    /// API tokens keyed by provider name (e.g. `ncbi`, `chemspider`)
    pub tokens: BTreeMap<String, String>,

    /// Base URL overrides keyed by lowercase service name
    pub urls: BTreeMap<String, String>,
}

impl Settings {
    /// Path of the settings file
    ///
    /// `BIOSERVICES_CONFIG` wins over the platform config directory.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let dir = dirs::config_dir()
            .ok_or_else(|| BioError::config("Could not determine the user config directory"))?;
        Ok(dir.join("bioservices").join(SETTINGS_FILE_NAME))
    }

    /// Load the settings file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)?.apply_env()
    }

    /// Load a settings file without looking at the environment
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&content).map_err(|source| BioError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Apply `BIOSERVICES_*` environment variables
    ///
    /// - `BIOSERVICES_TIMEOUT_SECS`
    /// - `BIOSERVICES_CACHE` (true/false/1/0)
    /// - `BIOSERVICES_CACHE_DIR`
    /// - `BIOSERVICES_URL_<SERVICE>`: base URL override, e.g. `BIOSERVICES_URL_ENA`
    /// - `BIOSERVICES_TOKEN_<NAME>`: API token, e.g. `BIOSERVICES_TOKEN_NCBI`
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var("BIOSERVICES_TIMEOUT_SECS") {
            self.set("timeout_secs", &value)?;
        }
        if let Ok(value) = std::env::var("BIOSERVICES_CACHE") {
            self.set("cache", &value)?;
        }
        if let Ok(value) = std::env::var("BIOSERVICES_CACHE_DIR") {
            self.set("cache_dir", &value)?;
        }

        for (key, value) in std::env::vars() {
            if let Some(service) = key.strip_prefix(URL_ENV_PREFIX) {
                self.urls.insert(service.to_lowercase(), value);
            } else if let Some(name) = key.strip_prefix(TOKEN_ENV_PREFIX) {
                self.tokens.insert(name.to_lowercase(), value);
            }
        }

        Ok(self)
    }

    /// Write the settings to `path`, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// API token for a provider
    pub fn token(&self, name: &str) -> Option<&str> {
        self.tokens.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Base URL override for a service
    pub fn base_url(&self, service: &str) -> Option<&str> {
        self.urls.get(&service.to_lowercase()).map(String::as_str)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.general.timeout_secs)
    }

    pub fn cache_expire(&self) -> Duration {
        Duration::from_secs(self.general.cache_expire_secs)
    }

    /// Directory for the on-disk response cache
    ///
    /// Only the configured directory is returned; the platform cache
    /// directory is a suggestion for `config init`, see
    /// [`Settings::suggested_cache_dir`].
    pub fn cache_dir(&self) -> Option<&Path> {
        self.general.cache_dir.as_deref()
    }

    /// Platform cache directory for bioservices, if one exists
    pub fn suggested_cache_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("bioservices"))
    }

    /// Read one setting by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        if let Some(name) = key.strip_prefix("tokens.") {
            return self
                .token(name)
                .map(str::to_string)
                .ok_or_else(|| BioError::UnknownKey(key.to_string()));
        }
        if let Some(service) = key.strip_prefix("urls.") {
            return self
                .base_url(service)
                .map(str::to_string)
                .ok_or_else(|| BioError::UnknownKey(key.to_string()));
        }

        let general = &self.general;
        let value = match key {
            "timeout_secs" => general.timeout_secs.to_string(),
            "user_agent" => general.user_agent.clone(),
            "cache" => general.cache.to_string(),
            "cache_dir" => general
                .cache_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "cache_expire_secs" => general.cache_expire_secs.to_string(),
            "concurrency" => general.concurrency.to_string(),
            _ => return Err(BioError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Update one setting by dotted key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(name) = key.strip_prefix("tokens.") {
            self.tokens.insert(name.to_lowercase(), value.to_string());
            return Ok(());
        }
        if let Some(service) = key.strip_prefix("urls.") {
            self.urls
                .insert(service.to_lowercase(), value.trim_end_matches('/').to_string());
            return Ok(());
        }

        let general = &mut self.general;
        match key {
            "timeout_secs" => general.timeout_secs = parse_number(key, value)?,
            "user_agent" => general.user_agent = value.to_string(),
            "cache" => general.cache = parse_bool(key, value)?,
            "cache_dir" => {
                general.cache_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            },
            "cache_expire_secs" => general.cache_expire_secs = parse_number(key, value)?,
            "concurrency" => {
                let n: usize = parse_number(key, value)?;
                if n == 0 {
                    return Err(BioError::invalid_value(key, value));
                }
                general.concurrency = n;
            },
            _ => return Err(BioError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BioError::invalid_value(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(BioError::invalid_value(key, value)),
    }
}
