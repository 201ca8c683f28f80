use std::fs;
use std::path::Path;

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::retail::intake::error::{IntakeError, Result};
use crate::retail::intake::io::store::Fields;

fn writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| IntakeError::Io(err.into_error()))?;
    String::from_utf8(bytes).map_err(|err| IntakeError::Store(err.to_string()))
}

/// Renders uniform records as CSV text: a header row named after the record
/// fields, then one row per record. Fields containing a comma, quote or line
/// break are quoted with embedded quotes doubled.
pub fn to_csv_string<T: Serialize>(rows: &[T]) -> Result<String> {
    if rows.is_empty() {
        return Err(IntakeError::NoData);
    }

    let mut writer = writer();
    for row in rows {
        writer.serialize(row)?;
    }
    finish(writer)
}

/// Renders loosely shaped documents as CSV text. The columns are the keys of
/// the first row, in order; keys missing from a later row are left blank and
/// keys only later rows carry are not exported.
pub fn fields_to_csv_string(rows: &[Fields]) -> Result<String> {
    let Some(first) = rows.first() else {
        return Err(IntakeError::NoData);
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut writer = writer();
    writer.write_record(&headers)?;
    for row in rows {
        writer.write_record(headers.iter().map(|header| cell_text(row.get(*header))))?;
    }
    finish(writer)
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Writes `rows` as a CSV file at `path`.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let text = to_csv_string(rows)?;
    fs::write(path, text)?;
    Ok(())
}

pub fn write_fields_csv(path: &Path, rows: &[Fields]) -> Result<()> {
    fs::write(path, fields_to_csv_string(rows)?)?;
    Ok(())
}
