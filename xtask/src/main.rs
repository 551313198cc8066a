//! Build automation tasks for bioservices
//!
//! - `generate-cli-docs`: render the CLI reference from the clap definitions

use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for bioservices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<bioservices_cli::Cli>();

    let content = format!(
        r#"# bioservices CLI Reference

Generated from the CLI source on {}.

## Installation

```bash
cargo install --path crates/bioservices-cli
```

## Quick Start

```bash
# Download a nucleotide record from ENA into AB000263.fa
bioservices download-accession --accession AB000263

# Same record from NCBI EUtils, into a chosen file
bioservices download-accession --accession AB000263 --method eutils --output cortistatin.fa

# Store an NCBI API key and list the services
bioservices config set tokens.ncbi 0123456789abcdef
bioservices services
```

## Commands

{}

## Environment Variables

- `BIOSERVICES_CONFIG` - Settings file (default: `~/.config/bioservices/bioservices.toml`)
- `BIOSERVICES_TIMEOUT_SECS` - Request timeout in seconds
- `BIOSERVICES_CACHE` - Cache GET responses (`true`/`false`)
- `BIOSERVICES_CACHE_DIR` - Directory for cached responses
- `BIOSERVICES_URL_<SERVICE>` - Base URL override, e.g. `BIOSERVICES_URL_ENA`
- `BIOSERVICES_TOKEN_<NAME>` - API token, e.g. `BIOSERVICES_TOKEN_NCBI`
- `BIOSERVICES_LOG_LEVEL` - trace, debug, info, warn, error

---

*To update this file, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());
    Ok(())
}
