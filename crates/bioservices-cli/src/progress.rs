//! Progress indicators for long-running commands

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for requests of unknown duration
///
/// Drawn on stderr, so it never mixes with data written to stdout.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Format a sequence length as a human-readable string
pub fn format_length(bases: usize) -> String {
    const UNITS: &[&str] = &["bp", "kb", "Mb", "Gb"];
    let mut size = bases as f64;
    let mut unit_idx = 0;

    while size >= 1000.0 && unit_idx < UNITS.len() - 1 {
        size /= 1000.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bases, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
