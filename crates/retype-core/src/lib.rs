//! # retype-core
//!
//! Column type reconciliation for retype.
//!
//! This crate provides the pieces between a backend's inferred column types
//! and what a grid shows:
//! - [`LogicalType`] and [`map_physical_type`] - the type catalog
//! - [`Formatter`] - per-type cell formatters that never fail
//! - [`ColumnDescriptor`] and [`build`] - descriptors and rows from a backend response
//! - [`TypeChangeTracker`] - user edits, dirty state and the [`ChangeSet`] to submit
//!
//! ## Example
//!
//! ```rust
//! use retype_core::{build, FormatOptions, LogicalType, RawColumnDef, TypeChangeTracker};
//! use serde_json::json;
//!
//! let ctx = FormatOptions::default().context();
//! let defs = vec![RawColumnDef::new("Score", "int64")];
//! let rows = vec![json!({"Score": 1709991489000i64}).as_object().unwrap().clone()];
//! let (columns, rows) = build(&defs, rows, &ctx);
//!
//! let mut tracker = TypeChangeTracker::new(columns);
//! tracker.on_column_type_change("Score", LogicalType::Date).unwrap();
//!
//! let column = tracker.column("Score").unwrap();
//! assert_eq!(
//!     column.render(rows[0].get("Score"), &ctx).as_deref(),
//!     Some("3/9/2024, 1:38:09 PM")
//! );
//! assert_eq!(tracker.build_change_set().len(), 1);
//! ```

pub mod catalog;
pub mod descriptor;
pub mod duration;
pub mod error;
pub mod formatter;
pub mod locale;
pub mod tracker;
pub mod value;
pub mod wire;

pub use catalog::{map_physical_type, LogicalType};
pub use descriptor::{
    build, build_from_response, column_width, ColumnDescriptor, RowRecord, MAX_COLUMN_WIDTH,
    MIN_COLUMN_WIDTH,
};
pub use duration::IsoDuration;
pub use error::{Error, Result};
pub use formatter::{
    format_complex, format_date, format_duration, format_number, format_text, formatter_for,
    formatter_for_name, Formatter, INVALID_DATE, INVALID_DURATION, ZERO_COMPLEX,
};
pub use locale::{
    parse_utc_offset, DateRenderer, DisplayLocale, FormatContext, FormatOptions, NumberFormatter,
};
pub use tracker::{ChangeSet, ColumnChange, ColumnSet, OriginalColumnSet, TypeChangeTracker};
pub use value::{parse_js_number, CellValue};
pub use wire::{ErrorBody, RawColumnDef, UploadResponse};
