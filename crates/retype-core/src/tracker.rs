//! Tracking user type edits against the server-confirmed column types

use serde::{Deserialize, Serialize};

use crate::catalog::LogicalType;
use crate::descriptor::ColumnDescriptor;
use crate::error::{Error, Result};
use crate::formatter::Formatter;

/// A requested reconversion of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChange {
    pub field: String,
    #[serde(rename = "type", alias = "newLogicalType")]
    pub logical_type: LogicalType,
}

impl ColumnChange {
    pub fn new<S: Into<String>>(field: S, logical_type: LogicalType) -> Self {
        Self {
            field: field.into(),
            logical_type,
        }
    }
}

/// Columns whose type differs from the server's, in column order
pub type ChangeSet = Vec<ColumnChange>;

/// Logical type per field as the server last reported it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalColumnSet {
    types: Vec<(String, LogicalType)>,
}

impl OriginalColumnSet {
    fn capture(columns: &[ColumnDescriptor]) -> Self {
        Self {
            types: columns
                .iter()
                .map(|c| (c.field.clone(), c.logical_type))
                .collect(),
        }
    }

    /// Server-confirmed type of a field
    pub fn get(&self, field: &str) -> Option<LogicalType> {
        self.types
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, ty)| *ty)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Live column descriptors plus a revision that changes whenever they do
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
    revision: u64,
}

impl ColumnSet {
    /// Descriptors in column order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Bumped on every effective edit and every replacement. Grids re-render
    /// when it changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Reconciles the server-confirmed column types with the user's edits.
///
/// Clean until an edit changes some column's type; clean again only when a
/// new response replaces the whole set.
#[derive(Debug, Clone)]
pub struct TypeChangeTracker {
    original: OriginalColumnSet,
    working: ColumnSet,
}

impl TypeChangeTracker {
    /// Start tracking a freshly built column set
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            original: OriginalColumnSet::capture(&columns),
            working: ColumnSet {
                columns,
                revision: 0,
            },
        }
    }

    /// Replace both the baseline and the working set with a new response's columns
    pub fn replace(&mut self, columns: Vec<ColumnDescriptor>) {
        self.original = OriginalColumnSet::capture(&columns);
        self.working = ColumnSet {
            columns,
            revision: self.working.revision + 1,
        };
        tracing::debug!(revision = self.working.revision, "column set replaced");
    }

    /// Change a column's logical type and its formatter.
    ///
    /// A date formatter gets the field's original type as its hint, so a
    /// number column switched to date reads values as epoch milliseconds.
    pub fn on_column_type_change(&mut self, field: &str, logical_type: LogicalType) -> Result<()> {
        let Some(idx) = self.working.columns.iter().position(|c| c.field == field) else {
            tracing::warn!(field, "type change for unknown column");
            return Err(Error::UnknownField(field.to_string()));
        };

        let origin = self.original.types[idx].1;
        let column = &mut self.working.columns[idx];
        if column.logical_type == logical_type {
            return Ok(());
        }

        column.logical_type = logical_type;
        column.formatter = Formatter::for_edit(logical_type, origin);
        self.working.revision += 1;

        tracing::debug!(
            field,
            from = %origin,
            to = %logical_type,
            revision = self.working.revision,
            "column type changed"
        );
        Ok(())
    }

    /// Whether any column's type differs from the server's.
    /// Drives whether the apply action is enabled.
    pub fn has_pending_changes(&self) -> bool {
        self.original
            .types
            .iter()
            .zip(&self.working.columns)
            .any(|((_, original), column)| *original != column.logical_type)
    }

    /// Changed columns only, in column order
    pub fn build_change_set(&self) -> ChangeSet {
        self.original
            .types
            .iter()
            .zip(&self.working.columns)
            .filter(|((_, original), column)| *original != column.logical_type)
            .map(|((field, _), column)| ColumnChange::new(field.clone(), column.logical_type))
            .collect()
    }

    /// Live descriptors in column order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.working.columns()
    }

    /// Live descriptor for a field
    pub fn column(&self, field: &str) -> Option<&ColumnDescriptor> {
        self.working.columns.iter().find(|c| c.field == field)
    }

    /// Live column set
    pub fn working(&self) -> &ColumnSet {
        &self.working
    }

    /// Server-confirmed types
    pub fn original(&self) -> &OriginalColumnSet {
        &self.original
    }

    /// Current revision of the live column set
    pub fn revision(&self) -> u64 {
        self.working.revision
    }
}
