//! FASTA records

use crate::error::{Result, ServiceError};
use serde::Serialize;

const LINE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastaRecord {
    /// Header line without the leading `>`
    pub header: String,
    pub sequence: String,
}

impl FastaRecord {
    pub fn new(header: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            sequence: sequence.into(),
        }
    }

    /// Accession from the header
    ///
    /// `sp|P43403|ZAP70_HUMAN` and `ENA|AB000263|AB000263.1` give the second
    /// field; plain headers give their first word.
    pub fn accession(&self) -> &str {
        let word = self.header.split_whitespace().next().unwrap_or_default();
        match word.split('|').nth(1) {
            Some(field) if !field.is_empty() => field,
            _ => word,
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// FASTA text with the sequence wrapped at 60 columns
    pub fn to_fasta(&self) -> String {
        let mut out = format!(">{}\n", self.header);
        let bytes = self.sequence.as_bytes();
        for chunk in bytes.chunks(LINE_WIDTH) {
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
        out
    }
}

/// Parse FASTA text
///
/// Blank lines are skipped. Text that has content but does not start with
/// a header is rejected, which catches HTML or error pages served with a
/// 200 status.
pub fn parse_fasta(text: &str) -> Result<Vec<FastaRecord>> {
    let mut records: Vec<FastaRecord> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(header) = line.strip_prefix('>') {
            records.push(FastaRecord::new(header.trim(), String::new()));
        } else if let Some(record) = records.last_mut() {
            record.sequence.push_str(line);
        } else {
            return Err(ServiceError::parse(format!(
                "not FASTA: text starts with '{}'",
                line.chars().take(40).collect::<String>()
            )));
        }
    }

    Ok(records)
}
