use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::warn;

use crate::retail::intake::error::{IntakeError, Result};

/// A single data row keyed by the header names of its table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CsvRecord {
    line: u64,
    fields: BTreeMap<String, String>,
}

impl CsvRecord {
    /// Creates a record from already-keyed fields.
    pub fn new(line: u64, fields: BTreeMap<String, String>) -> Self {
        Self { line, fields }
    }

    /// 1-based line on which the record starts in the source text.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Returns the value of `name`, or the empty string when the column is
    /// absent.
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Field name → value mapping for the whole row.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

/// A row that was dropped because it carried too few fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub field_count: usize,
    pub expected: usize,
}

/// Parsed CSV text: the header, the accepted rows and the rows that were
/// dropped as truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<CsvRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Parses CSV text whose first non-blank line names the columns.
///
/// Quoted fields may contain commas, line breaks and doubled quotes. Values
/// are trimmed and never coerced. A row may omit one trailing field; rows
/// shorter than that are reported in [`CsvTable::skipped`] and logged.
pub fn parse_table(text: &str) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut table = CsvTable::default();

    for result in reader.records() {
        let record = result?;
        if is_blank(&record) {
            continue;
        }

        let line = record.position().map(|pos| pos.line()).unwrap_or_default();

        if table.headers.is_empty() {
            table.headers = record.iter().map(clean_header).collect();
            continue;
        }

        let expected = table.headers.len();
        if record.len() + 1 < expected {
            warn!(
                line,
                fields = record.len(),
                expected,
                "dropping truncated CSV row"
            );
            table.skipped.push(SkippedRow {
                line,
                field_count: record.len(),
                expected,
            });
            continue;
        }

        let fields = table
            .headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = record.get(idx).unwrap_or_default();
                (header.clone(), value.to_string())
            })
            .collect();
        table.records.push(CsvRecord::new(line, fields));
    }

    Ok(table)
}

/// Parses CSV text and returns only the accepted rows.
pub fn parse_records(text: &str) -> Result<Vec<CsvRecord>> {
    Ok(parse_table(text)?.records)
}

/// Reads and parses a CSV file from disk.
pub fn read_table(path: &Path) -> Result<CsvTable> {
    if !path.exists() {
        return Err(IntakeError::MissingInput(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    parse_table(&text)
}

/// Splits one CSV line into trimmed fields, honouring quotes.
pub fn parse_line(line: &str) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(vec![String::new()]),
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty) && record.len() <= 1
}

fn clean_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}').trim().to_string()
}
