//! Upload/edit/apply session state
//!
//! One request at a time: `begin_*` marks the session busy and hands back a
//! [`PendingRequest`], and [`Session::complete`] takes the backend's answer
//! and clears the busy flag whatever it was.

use retype_core::{
    build_from_response, ChangeSet, ColumnDescriptor, FormatContext, FormatOptions, LogicalType,
    RowRecord, TypeChangeTracker, UploadResponse,
};
use thiserror::Error;

use crate::backend::{Backend, TransportError, UploadFile};

/// Shown while a request is in flight
pub const PROCESSING_MESSAGE: &str = "Processing file on server...";
/// Shown after a successful request
pub const FINISHED_MESSAGE: &str = "Finished";
/// Shown when the backend never answered
pub const RETRY_MESSAGE: &str = "Failed. Try again.";

/// Errors from driving a session out of order
#[derive(Debug, Error)]
pub enum SessionError {
    /// A request is already in flight
    #[error("a request is already in flight")]
    Busy,

    /// Apply requested with no pending type changes
    #[error("no column type changes to apply")]
    NothingToApply,

    /// Upload requested with no file selected
    #[error("no file selected")]
    NoFile,

    /// Edit requested before any table was loaded
    #[error("no table loaded")]
    NoTable,

    /// Error from the column tracker
    #[error(transparent)]
    Core(#[from] retype_core::Error),
}

/// Result type for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// The one message a session shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    /// Message from the backend, shown verbatim
    Error(String),
    /// Raw error body, shown as diagnostic content
    Diagnostic(String),
}

/// What a pending request asks of the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPayload {
    Upload(UploadFile),
    Apply(ChangeSet),
}

/// A request handed out by `begin_*`, to be given back to [`Session::complete`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending request keeps the session busy until completed"]
pub struct PendingRequest {
    id: u64,
    payload: RequestPayload,
}

impl PendingRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn payload(&self) -> &RequestPayload {
        &self.payload
    }

    /// Send the request to a backend
    pub fn send<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<UploadResponse, TransportError> {
        match &self.payload {
            RequestPayload::Upload(file) => backend.upload(file),
            RequestPayload::Apply(changes) => backend.apply_conversion(changes),
        }
    }
}

#[derive(Debug)]
struct Table {
    tracker: TypeChangeTracker,
    rows: Vec<RowRecord>,
}

/// Session state: selected file, busy flag, the loaded table and a notice
#[derive(Debug)]
pub struct Session {
    ctx: FormatContext,
    file: Option<UploadFile>,
    busy: bool,
    table: Option<Table>,
    notice: Option<Notice>,
    next_request: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&FormatOptions::default())
    }
}

impl Session {
    pub fn new(options: &FormatOptions) -> Self {
        Self {
            ctx: options.context(),
            file: None,
            busy: false,
            table: None,
            notice: None,
            next_request: 0,
        }
    }

    /// Choose the file the next upload sends. Clears the notice.
    pub fn select_file(&mut self, file: UploadFile) {
        tracing::debug!(file = %file.name, bytes = file.bytes.len(), "file selected");
        self.notice = None;
        self.file = Some(file);
    }

    /// Start uploading the selected file
    pub fn begin_upload(&mut self) -> SessionResult<PendingRequest> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        let file = self.file.clone().ok_or(SessionError::NoFile)?;
        Ok(self.begin(RequestPayload::Upload(file)))
    }

    /// Start applying the pending type changes
    pub fn begin_apply(&mut self) -> SessionResult<PendingRequest> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        if !self.has_pending_changes() {
            return Err(SessionError::NothingToApply);
        }
        let changes = self.change_set();
        Ok(self.begin(RequestPayload::Apply(changes)))
    }

    fn begin(&mut self, payload: RequestPayload) -> PendingRequest {
        self.busy = true;
        self.next_request += 1;
        self.notice = Some(Notice::Info(PROCESSING_MESSAGE.to_string()));
        tracing::debug!(request = self.next_request, "request started");
        PendingRequest {
            id: self.next_request,
            payload,
        }
    }

    /// Take a backend answer for a pending request.
    ///
    /// On success the columns and rows are replaced wholesale. On failure
    /// the previous table stays and the error becomes the notice.
    pub fn complete(
        &mut self,
        request: PendingRequest,
        result: Result<UploadResponse, TransportError>,
    ) {
        self.busy = false;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(request = request.id, error = %e, "request failed");
                self.notice = Some(match e {
                    TransportError::Structured { message } => Notice::Error(message),
                    TransportError::Unstructured { body } => Notice::Diagnostic(body),
                    TransportError::NoResponse => Notice::Error(RETRY_MESSAGE.to_string()),
                });
                return;
            }
        };

        match build_from_response(&response, &self.ctx) {
            Ok((columns, rows)) => {
                tracing::debug!(
                    request = request.id,
                    columns = columns.len(),
                    rows = rows.len(),
                    "table loaded"
                );
                match &mut self.table {
                    Some(table) => {
                        table.tracker.replace(columns);
                        table.rows = rows;
                    }
                    None => {
                        self.table = Some(Table {
                            tracker: TypeChangeTracker::new(columns),
                            rows,
                        })
                    }
                }
                self.notice = Some(Notice::Info(FINISHED_MESSAGE.to_string()));
            }
            Err(e) => {
                tracing::warn!(request = request.id, error = %e, "malformed response");
                self.notice = Some(Notice::Diagnostic(response.data));
            }
        }
    }

    /// Upload the selected file and wait for the answer
    pub fn upload_with<B: Backend + ?Sized>(&mut self, backend: &mut B) -> SessionResult<()> {
        let request = self.begin_upload()?;
        let result = request.send(backend);
        self.complete(request, result);
        Ok(())
    }

    /// Apply the pending changes and wait for the answer
    pub fn apply_with<B: Backend + ?Sized>(&mut self, backend: &mut B) -> SessionResult<()> {
        let request = self.begin_apply()?;
        let result = request.send(backend);
        self.complete(request, result);
        Ok(())
    }

    /// Change a column's logical type locally
    pub fn on_column_type_change(
        &mut self,
        field: &str,
        logical_type: LogicalType,
    ) -> SessionResult<()> {
        let table = self.table.as_mut().ok_or(SessionError::NoTable)?;
        table.tracker.on_column_type_change(field, logical_type)?;
        Ok(())
    }

    /// Whether any column's type differs from the backend's
    pub fn has_pending_changes(&self) -> bool {
        self.table
            .as_ref()
            .is_some_and(|t| t.tracker.has_pending_changes())
    }

    /// Apply is enabled when there are changes and nothing is in flight
    pub fn can_apply(&self) -> bool {
        !self.busy && self.has_pending_changes()
    }

    /// Upload is enabled when a file is selected and nothing is in flight
    pub fn can_upload(&self) -> bool {
        !self.busy && self.file.is_some()
    }

    /// Changed columns, in column order
    pub fn change_set(&self) -> ChangeSet {
        self.table
            .as_ref()
            .map(|t| t.tracker.build_change_set())
            .unwrap_or_default()
    }

    /// Formatted text of one cell, `None` when the formatter yields nothing
    /// or the row or column does not exist
    pub fn render_cell(&self, row: usize, field: &str) -> Option<String> {
        let table = self.table.as_ref()?;
        let column = table.tracker.column(field)?;
        let record = table.rows.get(row)?;
        column.render(record.get(field), &self.ctx)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn selected_file(&self) -> Option<&UploadFile> {
        self.file.as_ref()
    }

    /// Live column descriptors, empty before the first load
    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.table
            .as_ref()
            .map(|t| t.tracker.columns())
            .unwrap_or_default()
    }

    pub fn rows(&self) -> &[RowRecord] {
        self.table
            .as_ref()
            .map(|t| t.rows.as_slice())
            .unwrap_or_default()
    }

    /// Revision of the live column set; grids re-render when it changes
    pub fn revision(&self) -> Option<u64> {
        self.table.as_ref().map(|t| t.tracker.revision())
    }

    pub fn format_context(&self) -> &FormatContext {
        &self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use retype_core::RawColumnDef;

    fn response() -> UploadResponse {
        UploadResponse {
            columns_def: vec![
                RawColumnDef::new("Score", "int64").with_width(13),
                RawColumnDef::new("Grade", "category").with_width(1),
            ],
            data: r#"[{"Score": 1709991489000, "Grade": "A"}, {"Score": 75, "Grade": "B"}]"#
                .to_string(),
        }
    }

    fn loaded() -> Session {
        let mut session = Session::default();
        session.select_file(UploadFile::new("s.csv", "x"));
        let request = session.begin_upload().unwrap();
        session.complete(request, Ok(response()));
        session
    }

    #[test]
    fn test_busy_gates_requests() {
        let mut session = Session::default();
        assert!(matches!(session.begin_upload(), Err(SessionError::NoFile)));

        session.select_file(UploadFile::new("s.csv", "x"));
        assert!(session.can_upload());
        let request = session.begin_upload().unwrap();
        assert!(session.is_busy());
        assert!(!session.can_upload());
        assert!(matches!(session.begin_upload(), Err(SessionError::Busy)));

        session.complete(request, Err(TransportError::NoResponse));
        assert!(!session.is_busy());
        assert_eq!(
            session.notice(),
            Some(&Notice::Error(RETRY_MESSAGE.to_string()))
        );
    }

    #[test]
    fn test_success_loads_table() {
        let session = loaded();
        assert_eq!(
            session.notice(),
            Some(&Notice::Info(FINISHED_MESSAGE.to_string()))
        );
        assert_eq!(session.columns().len(), 2);
        assert_eq!(session.rows()[1].id, 2);
        assert_eq!(session.render_cell(1, "Score").as_deref(), Some("75"));
        assert_eq!(session.render_cell(0, "Grade").as_deref(), Some("A"));
        assert_eq!(session.render_cell(2, "Score"), None);
        assert_eq!(session.render_cell(0, "Nope"), None);
    }

    #[test]
    fn test_apply_gating() {
        let mut session = loaded();
        assert!(!session.can_apply());
        assert!(matches!(
            session.begin_apply(),
            Err(SessionError::NothingToApply)
        ));

        session
            .on_column_type_change("Score", LogicalType::Date)
            .unwrap();
        assert!(session.can_apply());
        assert_eq!(
            session.render_cell(0, "Score").as_deref(),
            Some("3/9/2024, 1:38:09 PM")
        );

        let request = session.begin_apply().unwrap();
        assert_eq!(
            request.payload(),
            &RequestPayload::Apply(vec![retype_core::ColumnChange::new(
                "Score",
                LogicalType::Date
            )])
        );
        assert!(!session.can_apply());
        assert!(matches!(session.begin_apply(), Err(SessionError::Busy)));
        session.complete(request, Err(TransportError::NoResponse));
        assert!(session.can_apply());
    }

    #[test]
    fn test_failure_keeps_table() {
        let mut session = loaded();
        session
            .on_column_type_change("Grade", LogicalType::Text)
            .unwrap();

        let request = session.begin_apply().unwrap();
        session.complete(
            request,
            Err(TransportError::Structured {
                message: "Failed to read DataFrame from db: gone".into(),
            }),
        );
        assert_eq!(
            session.notice(),
            Some(&Notice::Error("Failed to read DataFrame from db: gone".into()))
        );
        assert!(session.has_pending_changes());
        assert_eq!(session.columns().len(), 2);

        let request = session.begin_apply().unwrap();
        session.complete(
            request,
            Err(TransportError::Unstructured {
                body: "<h1>Server Error</h1>".into(),
            }),
        );
        assert_eq!(
            session.notice(),
            Some(&Notice::Diagnostic("<h1>Server Error</h1>".into()))
        );
    }

    #[test]
    fn test_success_replaces_and_cleans() {
        let mut session = loaded();
        session
            .on_column_type_change("Score", LogicalType::Date)
            .unwrap();
        let before = session.revision().unwrap();

        let request = session.begin_apply().unwrap();
        session.complete(request, Ok(response()));
        assert!(!session.has_pending_changes());
        assert!(session.revision().unwrap() > before);
        assert_eq!(session.change_set(), vec![]);
    }

    #[test]
    fn test_malformed_rows_become_diagnostic() {
        let mut session = Session::default();
        session.select_file(UploadFile::new("s.csv", "x"));
        let request = session.begin_upload().unwrap();
        let bad = UploadResponse {
            columns_def: vec![],
            data: "oops".into(),
        };
        session.complete(request, Ok(bad));
        assert_eq!(session.notice(), Some(&Notice::Diagnostic("oops".into())));
        assert!(session.columns().is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_edit_without_table() {
        let mut session = Session::default();
        assert!(matches!(
            session.on_column_type_change("a", LogicalType::Text),
            Err(SessionError::NoTable)
        ));
        assert!(matches!(
            loaded().on_column_type_change("a", LogicalType::Text),
            Err(SessionError::Core(retype_core::Error::UnknownField(_)))
        ));
    }
}
