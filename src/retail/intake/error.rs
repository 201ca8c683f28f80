use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, IntakeError>;

/// Error type covering the different failure cases that can occur when the
/// tool loads reference data, transforms it, or writes exports.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when CSV text cannot be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a form-level check fails, e.g. a required field is blank.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Raised when a source row cannot be turned into a typed record.
    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    /// Raised when an update or delete targets an unknown document.
    #[error("no document '{id}' in collection {collection}")]
    NotFound { collection: String, id: String },

    /// Raised when the document store cannot serve a request.
    #[error("document store error: {0}")]
    Store(String),

    /// Raised when an export is requested for an empty record set.
    #[error("no data to export")]
    NoData,

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
