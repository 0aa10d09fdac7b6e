//! Logical column types and the mapping from backend physical types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// User-facing classification of a column
///
/// Wire names follow the backend (`string` for text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    /// Free text (wire name `string`)
    #[serde(rename = "string", alias = "text")]
    Text,
    /// Integer or floating point number
    Number,
    /// Complex number (`real` + `imag`)
    Complex,
    /// Point in time
    Date,
    /// Elapsed time
    Duration,
    /// Low-cardinality labels
    Category,
}

impl LogicalType {
    /// Every logical type, in selector order
    pub const ALL: [LogicalType; 6] = [
        LogicalType::Text,
        LogicalType::Number,
        LogicalType::Complex,
        LogicalType::Date,
        LogicalType::Duration,
        LogicalType::Category,
    ];

    /// Name used on the wire
    pub fn wire_name(&self) -> &'static str {
        match self {
            LogicalType::Text => "string",
            LogicalType::Number => "number",
            LogicalType::Complex => "complex",
            LogicalType::Date => "date",
            LogicalType::Duration => "duration",
            LogicalType::Category => "category",
        }
    }

    /// Label shown in a type selector
    pub fn label(&self) -> &'static str {
        match self {
            LogicalType::Text => "Text",
            LogicalType::Number => "Number",
            LogicalType::Complex => "Complex",
            LogicalType::Date => "Date",
            LogicalType::Duration => "Duration",
            LogicalType::Category => "Category",
        }
    }

    /// Resolve a wire name or label, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Some(LogicalType::Text),
            "number" => Some(LogicalType::Number),
            "complex" => Some(LogicalType::Complex),
            "date" => Some(LogicalType::Date),
            "duration" => Some(LogicalType::Duration),
            "category" => Some(LogicalType::Category),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for LogicalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::UnknownLogicalType(s.to_string()))
    }
}

/// Map a backend physical type name (a dtype string) to a logical type.
///
/// Total: anything unrecognized is text. Checks run in order and the first
/// match wins, since prefixes overlap.
pub fn map_physical_type(physical: &str) -> LogicalType {
    if physical.starts_with("int") || physical.starts_with("uint") || physical.starts_with("float")
    {
        LogicalType::Number
    } else if physical.starts_with("complex") {
        LogicalType::Complex
    } else if physical.starts_with("datetime64[ns") {
        // naive and tz-qualified variants
        LogicalType::Date
    } else if physical == "timedelta64[ns]" {
        LogicalType::Duration
    } else if physical == "category" {
        LogicalType::Category
    } else {
        LogicalType::Text
    }
}
