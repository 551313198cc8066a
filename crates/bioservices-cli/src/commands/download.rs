//! `bioservices download-accession` command implementation

use crate::commands::load_settings;
use crate::error::Result;
use crate::progress::{create_spinner, format_length};
use bioservices::apps::{default_output, download_accession, AccessionSource};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Fetch `accession` as FASTA and write it to `output` (or `<ACC>.fa`)
pub async fn run(
    config: Option<&Path>,
    accession: &str,
    method: &str,
    output: Option<&Path>,
) -> Result<()> {
    let source: AccessionSource = method.parse()?;
    let settings = load_settings(config)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_output(accession)));

    let spinner = create_spinner(&format!("Fetching {} from {}...", accession, source));
    let result = download_accession(&settings, accession, source, &output).await;
    spinner.finish_and_clear();
    let record = result?;

    println!(
        "{} {} ({}) -> {}",
        "✓".green(),
        record.accession().bold(),
        format_length(record.len()),
        output.display()
    );
    Ok(())
}
