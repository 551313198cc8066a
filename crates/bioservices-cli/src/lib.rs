//! bioservices CLI library
//!
//! Command-line front end for the bioservices clients.
//!
//! # Overview
//!
//! - **Downloads**: fetch a nucleotide FASTA record from ENA or NCBI
//!   (`bioservices download-accession`)
//! - **Configuration**: inspect and edit the settings file
//!   (`bioservices config`)
//! - **Services**: list the known services and their effective base URLs
//!   (`bioservices services`)

pub mod commands;
pub mod error;
pub mod progress;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bioservices - clients for biological web services
#[derive(Parser, Debug)]
#[command(name = "bioservices")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to ~/.config/bioservices/bioservices.toml)
    #[arg(long, env = "BIOSERVICES_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Print the CLI reference as markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a nucleotide FASTA record into a file
    DownloadAccession {
        /// Accession number (e.g. AB000263)
        #[arg(short, long)]
        accession: String,

        /// Service to fetch from
        #[arg(short, long, default_value = "ena", value_parser = ["ena", "eutils"])]
        method: String,

        /// Output file (defaults to <ACCESSION>.fa)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// List known services and their base URLs
    Services {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective settings
    Show,

    /// Print the settings file path
    Path,

    /// Write a settings file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Get a setting value
    Get {
        /// Setting key (e.g. timeout_secs, tokens.ncbi, urls.uniprot)
        key: String,
    },

    /// Set a setting value
    Set {
        /// Setting key
        key: String,

        /// Setting value
        value: String,
    },
}
