//! Channel-list input parsing.
//!
//! The operator supplies a small tabular file with a `Channel Username`
//! column. Validation failures here stop the run before any network call is
//! made; they are operator mistakes, not pipeline faults.

use std::path::Path;

use anyhow::{Context, Result, bail};

/// Column the input file must carry, non-empty.
pub const CHANNEL_COLUMN: &str = "Channel Username";

/// Reads channel identifiers from a CSV or TSV file (delimiter chosen by
/// extension). Returns them in file order, trimmed, blanks skipped.
pub fn read_channel_names(path: &Path) -> Result<Vec<String>> {
    let delimiter = match path.extension().and_then(|ext| ext.to_str()) {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Reading {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Reading header row of {}", path.display()))?;

    let Some(column_index) = headers.iter().position(|header| header.trim() == CHANNEL_COLUMN)
    else {
        bail!("Column not found in the input file: {CHANNEL_COLUMN}");
    };

    let mut channel_names = Vec::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("Reading rows of {}", path.display()))?;
        if let Some(value) = row.get(column_index) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                channel_names.push(trimmed.to_string());
            }
        }
    }

    if channel_names.is_empty() {
        bail!("Column is empty: {CHANNEL_COLUMN}");
    }

    Ok(channel_names)
}
