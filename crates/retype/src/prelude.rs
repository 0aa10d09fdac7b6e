//! Prelude module - common imports for retype users
//!
//! ```rust
//! use retype::prelude::*;
//! ```

pub use crate::{
    // Backends
    Backend,
    CellValue,
    ChangeSet,
    ColumnChange,
    ColumnDescriptor,
    CsvReadOptions,
    DisplayLocale,
    // Error types
    Error,
    FormatOptions,
    Formatter,
    InferOptions,
    LocalBackend,
    // Catalog
    LogicalType,
    Notice,
    Result,
    // Session
    Session,
    SessionError,
    TransportError,
    UploadFile,
    UploadResponse,
};
