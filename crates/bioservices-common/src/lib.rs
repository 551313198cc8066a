//! bioservices common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, settings and logging for the bioservices workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`BioError`] and the [`Result`] alias
//! - **Settings**: the user settings file holding timeouts, cache options,
//!   API tokens and base URL overrides
//! - **Logging**: `tracing` subscriber setup shared by every binary
//! - **Types**: small enums shared by the transport layer and the CLI
//!
//! # Example
//!
//! ```no_run
//! use bioservices_common::settings::Settings;
//!
//! fn main() -> bioservices_common::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("timeout: {}s", settings.general.timeout_secs);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod settings;
pub mod types;

// Re-export commonly used types
pub use error::{BioError, Result};
pub use settings::Settings;
pub use types::{ResponseFormat, ServiceKind};
