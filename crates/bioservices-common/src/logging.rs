//! `tracing` subscriber setup for the bioservices binaries
//!
//! Events go to stderr so stdout stays free for the records, tables and
//! JSON the CLI prints. A daily rotated log file can be added next to (or
//! instead of) the console.
//!
//! ```no_run
//! use bioservices_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::cli(false).merge_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::warn!("only warnings and errors reach stderr");
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

const LEVEL_ENV: &str = "BIOSERVICES_LOG_LEVEL";
const OUTPUT_ENV: &str = "BIOSERVICES_LOG_OUTPUT";
const FORMAT_ENV: &str = "BIOSERVICES_LOG_FORMAT";
const DIR_ENV: &str = "BIOSERVICES_LOG_DIR";
const FILTER_ENV: &str = "BIOSERVICES_LOG_FILTER";

/// Where events are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stderr,
    File,
    Both,
}

impl FromStr for LogOutput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stderr" | "console" => Ok(Self::Stderr),
            "file" => Ok(Self::File),
            "both" => Ok(Self::Both),
            _ => Err(anyhow!("{} must be stderr, file or both, got '{}'", OUTPUT_ENV, s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(anyhow!("{} must be text or json, got '{}'", FORMAT_ENV, s)),
        }
    }
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub output: LogOutput,
    pub format: LogFormat,

    /// Directory of the rotated log file
    pub log_dir: PathBuf,

    /// File name prefix; the appender adds the date
    pub file_prefix: String,

    /// Extra directives such as `reqwest=warn,bioservices=trace`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            output: LogOutput::Stderr,
            format: LogFormat::Text,
            log_dir: PathBuf::from("logs"),
            file_prefix: "bioservices".to_string(),
            filter: None,
        }
    }
}

impl LogConfig {
    /// Stderr logging for the command line: warnings, or debug when verbose
    pub fn cli(verbose: bool) -> Self {
        let level = if verbose { Level::DEBUG } else { Level::WARN };
        Self::default().with_level(level)
    }

    /// Defaults overridden by the `BIOSERVICES_LOG_*` variables
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Apply `BIOSERVICES_LOG_LEVEL`, `_OUTPUT`, `_FORMAT`, `_DIR` and
    /// `_FILTER` on top of this configuration
    ///
    /// A variable holding an unknown value is an error.
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(level) = env_var(LEVEL_ENV) {
            self.level = level
                .parse()
                .map_err(|_| anyhow!("{} must be a tracing level, got '{}'", LEVEL_ENV, level))?;
        }
        if let Some(output) = env_var(OUTPUT_ENV) {
            self.output = output.parse()?;
        }
        if let Some(format) = env_var(FORMAT_ENV) {
            self.format = format.parse()?;
        }
        if let Some(dir) = env_var(DIR_ENV) {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(filter) = env_var(FILTER_ENV) {
            self.filter = Some(filter);
        }
        Ok(self)
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::from_default_env().add_directive(self.level.into());
        let extra = self.filter.as_deref().unwrap_or_default();
        for directive in extra.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let parsed = directive
                .parse()
                .with_context(|| format!("Bad log filter directive '{}'", directive))?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Flushes the log file when dropped
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn formatted<W>(layer: fmt::Layer<Registry, fmt::format::DefaultFields, fmt::format::Format, W>, format: LogFormat) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

/// Install the global subscriber
///
/// Fails when a subscriber is already installed or the filter does not
/// parse.
pub fn init_logging(config: &LogConfig) -> Result<LogGuard> {
    let filter = config.env_filter()?;
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut file_guard = None;

    if matches!(config.output, LogOutput::Stderr | LogOutput::Both) {
        layers.push(formatted(fmt::layer().with_writer(std::io::stderr), config.format));
    }

    if matches!(config.output, LogOutput::File | LogOutput::Both) {
        std::fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("Cannot create log directory {}", config.log_dir.display()))?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);
        layers.push(formatted(fmt::layer().with_writer(writer).with_ansi(false), config.format));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("A tracing subscriber is already installed")?;

    Ok(LogGuard { _file: file_guard })
}
