//! Column descriptors and row records built from a backend response

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::catalog::{map_physical_type, LogicalType};
use crate::error::Result;
use crate::formatter::{formatter_for, Formatter};
use crate::locale::FormatContext;
use crate::value::CellValue;
use crate::wire::{RawColumnDef, UploadResponse};

/// Narrowest a column is laid out
pub const MIN_COLUMN_WIDTH: u32 = 150;

/// Widest a column is laid out
pub const MAX_COLUMN_WIDTH: u32 = 500;

/// One grid column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Stable key into row records
    pub field: String,
    /// Header text
    pub display_name: String,
    /// Current logical type
    pub logical_type: LogicalType,
    /// Formatter for `logical_type`
    pub formatter: Formatter,
    /// Layout hints, in pixels
    pub width: u32,
    pub min_width: u32,
    pub max_width: u32,
}

impl ColumnDescriptor {
    /// Build a descriptor from a backend column definition
    pub fn from_raw(def: &RawColumnDef) -> Self {
        let logical_type = map_physical_type(&def.physical_type);
        Self {
            field: def.field.clone(),
            display_name: def.field.clone(),
            logical_type,
            formatter: formatter_for(logical_type),
            width: column_width(&def.field, def.declared_char_width),
            min_width: MIN_COLUMN_WIDTH,
            max_width: MAX_COLUMN_WIDTH,
        }
    }

    /// Render a cell of this column
    pub fn render(&self, value: &CellValue, ctx: &FormatContext) -> Option<String> {
        self.formatter.format(value, ctx)
    }
}

/// Width that fits both the header and an inline type selector
pub fn column_width(field: &str, declared_char_width: Option<u64>) -> u32 {
    let chars = (field.chars().count() as u64).max(declared_char_width.unwrap_or(0));
    let width = chars.saturating_mul(10).saturating_add(100);
    width.clamp(u64::from(MIN_COLUMN_WIDTH), u64::from(MAX_COLUMN_WIDTH)) as u32
}

/// One grid row
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    /// Synthetic identity, 1-based and strictly increasing
    pub id: u64,
    cells: HashMap<String, CellValue>,
}

static MISSING: CellValue = CellValue::Null;

impl RowRecord {
    pub fn new(id: u64, cells: HashMap<String, CellValue>) -> Self {
        Self { id, cells }
    }

    /// Cell for a field; null when the row does not carry it
    pub fn get(&self, field: &str) -> &CellValue {
        self.cells.get(field).unwrap_or(&MISSING)
    }

    /// Number of cells in this row
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row carries no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Build column descriptors and row records.
///
/// Column order follows `defs`, row order follows `rows`. Cells of date
/// columns are parsed into instants here, once, so the date formatter always
/// sees a pre-parsed value for them.
pub fn build(
    defs: &[RawColumnDef],
    rows: Vec<Map<String, Value>>,
    ctx: &FormatContext,
) -> (Vec<ColumnDescriptor>, Vec<RowRecord>) {
    let mut columns: Vec<ColumnDescriptor> = Vec::with_capacity(defs.len());
    for def in defs {
        if columns.iter().any(|c| c.field == def.field) {
            tracing::warn!(field = %def.field, "duplicate column in response, keeping the first");
            continue;
        }
        columns.push(ColumnDescriptor::from_raw(def));
    }

    let date_fields: Vec<&str> = columns
        .iter()
        .filter(|c| c.logical_type == LogicalType::Date)
        .map(|c| c.field.as_str())
        .collect();

    let records = rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let cells = row
                .into_iter()
                .map(|(field, raw)| {
                    let mut value = CellValue::from_json(&raw);
                    if date_fields.contains(&field.as_str()) && !value.is_falsy() {
                        value = materialize_date(&value, ctx);
                    }
                    (field, value)
                })
                .collect();
            RowRecord::new(idx as u64 + 1, cells)
        })
        .collect();

    tracing::debug!(
        columns = columns.len(),
        date_columns = date_fields.len(),
        "built column descriptors"
    );
    (columns, records)
}

/// Decode a backend response and [`build`] from it
pub fn build_from_response(
    response: &UploadResponse,
    ctx: &FormatContext,
) -> Result<(Vec<ColumnDescriptor>, Vec<RowRecord>)> {
    let rows = response.rows()?;
    Ok(build(&response.columns_def, rows, ctx))
}

fn materialize_date(value: &CellValue, ctx: &FormatContext) -> CellValue {
    let instant = match value {
        CellValue::Text(s) => ctx.dates.parse_literal(s),
        CellValue::Number(n) => ctx.dates.from_epoch_millis(*n),
        CellValue::DateTime(dt) => Some(*dt),
        _ => None,
    };
    instant.map_or(CellValue::InvalidDate, CellValue::DateTime)
}
