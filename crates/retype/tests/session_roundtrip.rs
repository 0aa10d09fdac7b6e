//! End-to-end tests: upload -> edit -> apply against the local backend

use pretty_assertions::assert_eq;
use retype::prelude::*;

const SAMPLE: &str = "Time,Name,Birthdate,Score,Grade,Sum
 01:30:00,Alice,1/01/1990,1709991489000,A,1+2E7j
 00:15:42,Bob,2023-09-15 12:30:45-05:00,75,B,2+3.33j
 02:00:00,Charlie,3/03/1992,85,A,3+2
 102:30:50,David,4/04/1993,70,B,7j
 01:30:00,P0DT1H30M,Not Available,Not Available,A,8
 nan,2+3j,2023-09-15 12:30:45+00:00,1500,B,abc
";

fn uploaded() -> (LocalBackend, Session) {
    let mut backend = LocalBackend::new();
    let mut session = Session::default();
    session.select_file(UploadFile::new("sample_data.csv", SAMPLE));
    session.upload_with(&mut backend).unwrap();
    (backend, session)
}

fn types(session: &Session) -> Vec<LogicalType> {
    session.columns().iter().map(|c| c.logical_type).collect()
}

/// Column and row order survive the trip through the backend
#[test]
fn test_upload_sample() {
    let (_, session) = uploaded();

    assert_eq!(
        session.notice(),
        Some(&Notice::Info(retype::FINISHED_MESSAGE.to_string()))
    );
    let fields: Vec<&str> = session.columns().iter().map(|c| c.field.as_str()).collect();
    assert_eq!(
        fields,
        vec!["Time", "Name", "Birthdate", "Score", "Grade", "Sum"]
    );
    assert_eq!(
        types(&session),
        vec![
            LogicalType::Duration,
            LogicalType::Text,
            LogicalType::Date,
            LogicalType::Number,
            LogicalType::Category,
            LogicalType::Complex,
        ]
    );

    let ids: Vec<u64> = session.rows().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert!(!session.has_pending_changes());
}

/// Every column type renders through its formatter
#[test]
fn test_rendered_cells() {
    let (_, session) = uploaded();
    let cell = |row: usize, field: &str| session.render_cell(row, field);

    assert_eq!(cell(0, "Time").as_deref(), Some("1 hour 30 minutes"));
    assert_eq!(cell(3, "Time").as_deref(), Some("4 days 6 hours 30 minutes"));
    assert_eq!(cell(5, "Time"), None);

    assert_eq!(cell(0, "Name").as_deref(), Some("Alice"));

    assert_eq!(cell(1, "Birthdate").as_deref(), Some("9/15/2023, 5:30:45 PM"));
    assert_eq!(cell(0, "Birthdate").as_deref(), Some("1/1/1990, 12:00:00 AM"));
    assert_eq!(cell(4, "Birthdate"), None);

    assert_eq!(cell(0, "Score").as_deref(), Some("1,709,991,489,000"));
    assert_eq!(cell(1, "Score").as_deref(), Some("75"));
    assert_eq!(cell(4, "Score"), None);

    assert_eq!(cell(2, "Grade").as_deref(), Some("A"));

    assert_eq!(cell(0, "Sum").as_deref(), Some("1+20,000,000j"));
    assert_eq!(cell(1, "Sum").as_deref(), Some("2+3.33j"));
    assert_eq!(cell(5, "Sum"), None);
}

/// Column widths come from the declared character widths
#[test]
fn test_column_widths() {
    let (_, session) = uploaded();
    for column in session.columns() {
        assert!(column.width >= column.min_width);
        assert!(column.width <= column.max_width);
    }
    // "1709991489000.0" is 15 characters
    let score = &session.columns()[3];
    assert_eq!(score.width, 250);
}

/// A number column switched to date reads values as epoch milliseconds
/// until the backend reconverts it
#[test]
fn test_number_to_date() {
    let (mut backend, mut session) = uploaded();
    session
        .on_column_type_change("Score", LogicalType::Date)
        .unwrap();

    assert_eq!(
        session.render_cell(0, "Score").as_deref(),
        Some("3/9/2024, 1:38:09 PM")
    );
    assert_eq!(
        session.change_set(),
        vec![ColumnChange::new("Score", LogicalType::Date)]
    );

    session.apply_with(&mut backend).unwrap();
    assert!(!session.has_pending_changes());
    assert_eq!(session.columns()[3].logical_type, LogicalType::Date);

    // the backend reads numbers as epoch seconds
    assert_eq!(
        session.render_cell(1, "Score").as_deref(),
        Some("1/1/1970, 12:01:15 AM")
    );
    assert_eq!(session.render_cell(0, "Score"), None);
}

/// Applying an empty change set reproduces the upload response
#[test]
fn test_empty_apply_is_a_round_trip() {
    let mut backend = LocalBackend::new();
    let first = backend
        .upload(&UploadFile::new("sample_data.csv", SAMPLE))
        .unwrap();
    let applied = backend.apply_conversion(&Vec::new()).unwrap();
    assert_eq!(applied, first);

    let (_, mut session) = uploaded();
    assert!(matches!(
        session.apply_with(&mut backend),
        Err(SessionError::NothingToApply)
    ));
}

/// The same change set applied twice gives the same table
#[test]
fn test_apply_is_idempotent() {
    let (mut backend, _) = uploaded();
    let changes = vec![
        ColumnChange::new("Grade", LogicalType::Text),
        ColumnChange::new("Sum", LogicalType::Complex),
    ];
    let first = backend.apply_conversion(&changes).unwrap();
    let second = backend.apply_conversion(&changes).unwrap();
    assert_eq!(first, second);

    let kinds: Vec<&str> = first
        .columns_def
        .iter()
        .map(|c| c.physical_type.as_str())
        .collect();
    assert_eq!(kinds[4], "object");
    assert_eq!(kinds[5], "complex128");
}

/// Text edits reconvert to text and stay clean afterwards
#[test]
fn test_apply_text() {
    let (mut backend, mut session) = uploaded();
    session
        .on_column_type_change("Grade", LogicalType::Text)
        .unwrap();
    session
        .on_column_type_change("Time", LogicalType::Text)
        .unwrap();
    assert_eq!(
        session
            .change_set()
            .iter()
            .map(|c| c.field.as_str())
            .collect::<Vec<_>>(),
        vec!["Time", "Grade"]
    );

    session.apply_with(&mut backend).unwrap();
    assert_eq!(session.columns()[0].logical_type, LogicalType::Text);
    assert_eq!(session.columns()[4].logical_type, LogicalType::Text);
    assert_eq!(session.render_cell(0, "Time").as_deref(), Some(" 01:30:00"));
    assert!(!session.has_pending_changes());
}

/// Structured backend errors are shown verbatim
#[test]
fn test_structured_errors() {
    let mut backend = LocalBackend::new();
    let mut session = Session::default();

    session.select_file(UploadFile::new("empty.csv", ""));
    session.upload_with(&mut backend).unwrap();
    assert_eq!(
        session.notice(),
        Some(&Notice::Error("No file uploaded".into()))
    );

    session.select_file(UploadFile::new("header.csv", "a,b\n"));
    session.upload_with(&mut backend).unwrap();
    assert_eq!(
        session.notice(),
        Some(&Notice::Error("No Excel or CSV data".into()))
    );

    session.select_file(UploadFile::new("book.xlsx", b"PK\x03\x04\x00\x00".to_vec()));
    session.upload_with(&mut backend).unwrap();
    assert!(
        matches!(session.notice(), Some(Notice::Error(m)) if m.starts_with("Failed to read Excel format"))
    );
    assert!(!session.is_busy());
    assert!(session.columns().is_empty());
}

struct Unreachable;

impl Backend for Unreachable {
    fn upload(&mut self, _: &UploadFile) -> std::result::Result<UploadResponse, TransportError> {
        Err(TransportError::NoResponse)
    }

    fn apply_conversion(
        &mut self,
        _: &ChangeSet,
    ) -> std::result::Result<UploadResponse, TransportError> {
        Err(TransportError::from_body("<html><h1>Server Error (500)</h1></html>"))
    }
}

/// Transport failures keep the loaded table and release the busy flag
#[test]
fn test_transport_failures() {
    let (_, mut session) = uploaded();
    session
        .on_column_type_change("Score", LogicalType::Text)
        .unwrap();

    session.apply_with(&mut Unreachable).unwrap();
    assert_eq!(
        session.notice(),
        Some(&Notice::Diagnostic(
            "<html><h1>Server Error (500)</h1></html>".into()
        ))
    );
    assert!(session.can_apply());
    assert_eq!(session.columns().len(), 6);

    session.upload_with(&mut Unreachable).unwrap();
    assert_eq!(
        session.notice(),
        Some(&Notice::Error(retype::RETRY_MESSAGE.into()))
    );
    assert!(!session.is_busy());
}

/// A second request cannot start while one is in flight
#[test]
fn test_busy_gating() {
    let (mut backend, mut session) = uploaded();
    let pending = session.begin_upload().unwrap();
    assert!(matches!(session.begin_upload(), Err(SessionError::Busy)));
    assert!(matches!(
        session.upload_with(&mut backend),
        Err(SessionError::Busy)
    ));

    let result = pending.send(&mut backend);
    session.complete(pending, result);
    assert!(!session.is_busy());
    assert_eq!(session.rows().len(), 6);
}
