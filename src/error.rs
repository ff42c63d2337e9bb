//! Error types for expout-tables
//!
//! Malformed data and caller mistakes are distinct variants so orchestration
//! code can decide whether to skip a run or abort a whole batch.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// expout-tables error types
#[derive(Error, Debug)]
pub enum Error {
    /// A tagged line carried a value that could not be read as a number
    #[error("Parse error in {source_name} at line {line}: {message}")]
    Parse {
        /// File (or caller-supplied label) the text came from
        source_name: String,
        /// 1-based line number of the offending tagged line
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Filename stem does not split into the expected number of fields
    #[error(
        "Cannot parse {parts:?} to {names:?}, length mismatch ({} parts vs {} names) in file stem '{stem}'",
        .parts.len(),
        .names.len()
    )]
    FieldCountMismatch {
        /// Filename stem that was split
        stem: String,
        /// Parts produced by the split
        parts: Vec<String>,
        /// Expected field names
        names: Vec<String>,
    },

    /// A metric name outside the configured schema
    #[error("Unknown metric '{key}' in {source_name}\nAdd it to the metric schema or drop the schema to accept any key")]
    UnknownMetric {
        /// Normalized metric name
        key: String,
        /// File the metric came from
        source_name: String,
    },

    /// A record passed the predicate but lacks a row/column key field
    #[error("Record has no field '{field}' to use as a table key")]
    MissingField {
        /// Missing field name
        field: String,
    },

    /// Invalid argument or value shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
