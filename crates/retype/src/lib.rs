//! # retype
//!
//! Upload a table, review the column types a backend inferred for it,
//! change them and have the backend reconvert.
//!
//! - [`Backend`] and [`LocalBackend`] - where uploads go and conversions run
//! - [`Session`] - selected file, busy flag, the loaded table and its edits
//!
//! ## Example
//!
//! ```rust
//! use retype::prelude::*;
//!
//! let mut backend = LocalBackend::new();
//! let mut session = Session::default();
//! session.select_file(UploadFile::new("scores.csv", "Score\n1709991489000\n75\n"));
//! session.upload_with(&mut backend).unwrap();
//!
//! assert_eq!(session.columns()[0].logical_type, LogicalType::Number);
//! assert_eq!(session.render_cell(1, "Score").as_deref(), Some("75"));
//!
//! // read the numbers as epoch milliseconds
//! session.on_column_type_change("Score", LogicalType::Date).unwrap();
//! assert_eq!(
//!     session.render_cell(0, "Score").as_deref(),
//!     Some("3/9/2024, 1:38:09 PM")
//! );
//! assert!(session.can_apply());
//! ```

pub mod backend;
pub mod prelude;
pub mod session;

pub use backend::{Backend, LocalBackend, TransportError, UploadFile};
pub use session::{
    Notice, PendingRequest, RequestPayload, Session, SessionError, SessionResult,
    FINISHED_MESSAGE, PROCESSING_MESSAGE, RETRY_MESSAGE,
};

// Re-export core types
pub use retype_core::{
    build, build_from_response, formatter_for, formatter_for_name, map_physical_type,
    parse_utc_offset, CellValue, ChangeSet, ColumnChange, ColumnDescriptor, DisplayLocale, Error,
    FormatContext, FormatOptions, Formatter, LogicalType, RawColumnDef, Result, RowRecord,
    TypeChangeTracker, UploadResponse,
};

// Re-export inference types
pub use retype_infer::{
    encode, infer_and_convert, CsvReadOptions, CsvReader, Dtype, Frame, InferError,
    InferOptions, InferResult,
};
