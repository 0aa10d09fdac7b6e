//! Error types for retype-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in retype-core
///
/// Formatters never produce these; a malformed cell always degrades to a
/// display sentinel instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A type change named a field that is not part of the column set
    #[error("Unknown column field: {0}")]
    UnknownField(String),

    /// Row payload could not be decoded
    #[error("Malformed row data: {0}")]
    MalformedData(#[from] serde_json::Error),

    /// Row payload decoded, but is not an array of objects
    #[error("Row data must be an array of objects, found {0}")]
    UnexpectedRowShape(&'static str),

    /// Unrecognized logical type name
    #[error("Unknown logical type: {0}")]
    UnknownLogicalType(String),

    /// Unrecognized locale tag
    #[error("Unknown locale: {0}")]
    UnknownLocale(String),
}
