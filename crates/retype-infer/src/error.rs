//! Inference error types

use thiserror::Error;

/// Result type for reading and converting tables
pub type InferResult<T> = std::result::Result<T, InferError>;

/// Errors that can occur while reading or converting a table
#[derive(Debug, Error)]
pub enum InferError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input contains NUL bytes, i.e. a binary workbook
    #[error("binary workbooks are not supported")]
    Binary,

    /// Header present but no data rows, or no header at all
    #[error("No Excel or CSV data")]
    Empty,

    /// Explicit conversion named a column the table does not have
    #[error("Unknown column: {0}")]
    UnknownField(String),

    /// Response encoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
