//! `bioservices services` command implementation

use crate::commands::load_settings;
use crate::error::Result;
use bioservices::catalogue;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ServiceRow<'a> {
    name: &'a str,
    kind: String,
    url: &'a str,
}

/// Print the known services with the base URL each one would use
pub fn run(config: Option<&Path>, json: bool) -> Result<()> {
    let settings = load_settings(config)?;
    let services = catalogue();
    let rows: Vec<ServiceRow<'_>> = services
        .iter()
        .map(|info| ServiceRow {
            name: info.name,
            kind: info.kind.to_string(),
            url: info.effective_url(&settings),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<12} {:<6} {}", "SERVICE".bold(), "KIND".bold(), "URL".bold());
    for row in &rows {
        println!("{:<12} {:<6} {}", row.name.cyan(), row.kind, row.url);
    }
    Ok(())
}
