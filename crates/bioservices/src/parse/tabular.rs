//! Delimited text helpers
//!
//! Most services answer with tab-separated text: tables with a header
//! line (UniProt, BioMart, ENA portal), two-column mappings (KEGG `conv`
//! and `link`) or headerless rows (PSICQUIC MITAB).

use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Rows of delimited text, with optional column names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of a named column; short rows yield empty strings
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// One row keyed by column name
    pub fn record(&self, row: usize) -> Option<BTreeMap<&str, &str>> {
        let values = self.rows.get(row)?;
        Some(
            self.headers
                .iter()
                .zip(values)
                .map(|(h, v)| (h.as_str(), v.as_str()))
                .collect(),
        )
    }

    /// Append the rows of another table with the same columns
    pub fn append(&mut self, other: Table) {
        if self.headers.is_empty() {
            self.headers = other.headers;
        }
        self.rows.extend(other.rows);
    }

    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }
}

fn read_table(text: &str, delimiter: u8, has_headers: bool, quoting: bool) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .flexible(true)
        .quoting(quoting)
        .from_reader(text.as_bytes());

    let headers = if has_headers {
        reader.headers()?.iter().map(str::to_string).collect()
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

/// Tab-separated text; quotes are ordinary characters
pub fn parse_tsv(text: &str, has_headers: bool) -> Result<Table> {
    read_table(text, b'\t', has_headers, false)
}

/// Comma-separated text with a header line
pub fn parse_csv(text: &str) -> Result<Table> {
    read_table(text, b',', true, true)
}

/// "key<TAB>value" lines grouped by key
///
/// Repeated keys accumulate their values in order; lines without a tab
/// are ignored.
pub fn parse_mapping(text: &str) -> BTreeMap<String, Vec<String>> {
    let mut mapping: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in parse_pairs(text) {
        mapping.entry(key).or_default().push(value);
    }
    mapping
}

/// "key<TAB>rest" lines split on the first tab
pub fn parse_pairs(text: &str) -> Vec<(String, String)> {
    non_empty_lines(text)
        .into_iter()
        .filter_map(|line| line.split_once('\t'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// Lines with content, trailing whitespace removed
pub fn non_empty_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect()
}
