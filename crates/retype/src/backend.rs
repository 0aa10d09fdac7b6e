//! Data backends: where uploads go and conversions run
//!
//! A [`Backend`] answers both requests with the full table. [`LocalBackend`]
//! does the work in-process with `retype-infer`.

use std::fs;
use std::io;
use std::path::Path;

use retype_core::{ChangeSet, ErrorBody, UploadResponse};
use retype_infer::{
    encode, infer_and_convert, is_binary, CsvReadOptions, CsvReader, Frame, InferError,
    InferOptions,
};
use thiserror::Error;

/// A file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new<S: Into<String>>(name: S, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { name, bytes })
    }
}

/// Failure of an upload or apply request. The three kinds are surfaced
/// differently to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The backend answered with `{"error": message}`
    #[error("{message}")]
    Structured { message: String },

    /// The backend answered with something else
    #[error("unstructured error response ({} bytes)", body.len())]
    Unstructured { body: String },

    /// No answer at all
    #[error("no response from backend")]
    NoResponse,
}

impl TransportError {
    /// Classify an error response body
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error }) => TransportError::Structured { message: error },
            Err(_) => TransportError::Unstructured {
                body: body.to_string(),
            },
        }
    }

    fn structured(message: impl Into<String>) -> Self {
        TransportError::Structured {
            message: message.into(),
        }
    }
}

/// Something that reads uploads and reconverts columns
pub trait Backend {
    /// Read an uploaded file, infer its column types and return the table
    fn upload(&mut self, file: &UploadFile) -> Result<UploadResponse, TransportError>;

    /// Re-run conversion on the last upload with explicit column types
    fn apply_conversion(&mut self, changes: &ChangeSet) -> Result<UploadResponse, TransportError>;
}

/// In-process backend.
///
/// Keeps the table as read from the last upload and converts from it on
/// every request, so earlier conversions never compound.
#[derive(Debug, Default)]
pub struct LocalBackend {
    read_options: CsvReadOptions,
    infer_options: InferOptions,
    stored: Option<Frame>,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CSV reading options
    pub fn with_read_options(mut self, options: CsvReadOptions) -> Self {
        self.read_options = options;
        self
    }

    /// Set the inference options
    pub fn with_infer_options(mut self, options: InferOptions) -> Self {
        self.infer_options = options;
        self
    }

    /// Whether a table from an earlier upload is stored
    pub fn has_table(&self) -> bool {
        self.stored.is_some()
    }

    fn convert(&self, frame: Frame, changes: &ChangeSet) -> Result<UploadResponse, TransportError> {
        infer_and_convert(frame, changes, &self.infer_options)
            .and_then(|frame| encode(&frame))
            .map_err(|e| {
                tracing::error!(error = %e, "conversion failed");
                TransportError::Unstructured {
                    body: e.to_string(),
                }
            })
    }
}

impl Backend for LocalBackend {
    fn upload(&mut self, file: &UploadFile) -> Result<UploadResponse, TransportError> {
        if file.bytes.is_empty() {
            return Err(TransportError::structured("No file uploaded"));
        }

        if is_binary(&file.bytes) {
            tracing::warn!(file = %file.name, "binary upload rejected");
            return Err(TransportError::structured(format!(
                "Failed to read Excel format: {}",
                InferError::Binary
            )));
        }

        let frame = match CsvReader::read(file.bytes.as_slice(), &self.read_options) {
            Ok(frame) => frame,
            Err(InferError::Empty) => {
                return Err(TransportError::structured(InferError::Empty.to_string()))
            }
            Err(e) => {
                return Err(TransportError::structured(format!(
                    "Failed to read CSV format: {e}"
                )))
            }
        };

        tracing::info!(
            file = %file.name,
            columns = frame.columns().len(),
            rows = frame.row_count(),
            "upload read"
        );
        self.stored = Some(frame.clone());
        self.convert(frame, &Vec::new())
    }

    fn apply_conversion(&mut self, changes: &ChangeSet) -> Result<UploadResponse, TransportError> {
        let Some(frame) = self.stored.clone() else {
            return Err(TransportError::structured(
                "Failed to read DataFrame from db: no table has been uploaded",
            ));
        };

        tracing::info!(changes = changes.len(), "applying conversion");
        self.convert(frame, changes)
    }
}
