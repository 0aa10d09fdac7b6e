//! Payloads exchanged with the data backend

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One column as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumnDef {
    /// Column key, unique within a response
    pub field: String,
    /// Storage type name, e.g. `int64` or `datetime64[ns, UTC]`
    #[serde(rename = "df_type", alias = "physicalType")]
    pub physical_type: String,
    /// Longest rendered value, in characters
    #[serde(rename = "width", alias = "declaredCharWidth", default)]
    pub declared_char_width: Option<u64>,
}

impl RawColumnDef {
    pub fn new<F: Into<String>, P: Into<String>>(field: F, physical_type: P) -> Self {
        Self {
            field: field.into(),
            physical_type: physical_type.into(),
            declared_char_width: None,
        }
    }

    /// Set the declared width
    pub fn with_width(mut self, width: u64) -> Self {
        self.declared_char_width = Some(width);
        self
    }
}

/// Response to an upload or an apply-conversion request.
///
/// The full table is always re-sent, never a delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub columns_def: Vec<RawColumnDef>,
    /// JSON-encoded array of row objects
    pub data: String,
}

impl UploadResponse {
    /// Decode the row payload
    pub fn rows(&self) -> Result<Vec<Map<String, Value>>> {
        let decoded: Value = serde_json::from_str(&self.data)?;
        let Value::Array(items) = decoded else {
            return Err(Error::UnexpectedRowShape(json_kind(&decoded)));
        };

        items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(Error::UnexpectedRowShape(json_kind(&other))),
            })
            .collect()
    }
}

/// Structured error body (`{"error": "..."}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
