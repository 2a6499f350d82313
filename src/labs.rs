//! Lab result reads, exports and session teardown.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core_state::{CoreError, CoreState};
use crate::export::{conversation_filename, render_conversation_pdf, ExportedFile};
use crate::models::{ExportFormat, LabResult};
use crate::pipeline::structuring::{summarize, LabSummary};

#[derive(Debug, Clone, Serialize)]
pub struct LabResultsView {
    #[serde(rename = "lab_data")]
    pub results: Vec<LabResult>,
    pub summary: LabSummary,
    pub filename: String,
    pub upload_time: DateTime<Utc>,
}

pub fn get_lab_results(state: &CoreState, session_id: &str) -> Result<LabResultsView, CoreError> {
    let record = state.sessions.get(session_id)?;
    let filename = if record.filename.is_empty() {
        "Unknown".to_string()
    } else {
        record.filename
    };
    Ok(LabResultsView {
        summary: summarize(&record.lab_data),
        results: record.lab_data,
        filename,
        upload_time: record.created_at,
    })
}

/// Render the session's lab results as `format` (`csv` or `pdf`, any case).
///
/// The session is looked up first, then the format is parsed; an unknown
/// format is rejected before any formatter runs.
pub fn export_results(
    state: &CoreState,
    session_id: &str,
    format: &str,
) -> Result<ExportedFile, CoreError> {
    let record = state.sessions.get(session_id)?;
    let format = ExportFormat::from_str(&format.trim().to_lowercase())
        .map_err(|_| CoreError::UnsupportedFormat(format.to_string()))?;

    let exported = state
        .formatters
        .export(format, session_id, &record.filename, &record.lab_data)?;
    tracing::info!(
        session_id,
        format = format.as_str(),
        bytes = exported.bytes.len(),
        "Lab results exported"
    );
    Ok(exported)
}

pub fn export_conversation(state: &CoreState, session_id: &str) -> Result<ExportedFile, CoreError> {
    let record = state.sessions.get(session_id)?;
    let bytes = render_conversation_pdf(&record.conversation)?;
    Ok(ExportedFile {
        bytes,
        filename: conversation_filename(session_id),
        content_type: "application/pdf",
    })
}

/// Drop a session. Unknown ids are not an error.
pub fn clear_session(state: &CoreState, session_id: &str) -> Result<(), CoreError> {
    if state.sessions.delete(session_id)? {
        state.persist_sessions();
        tracing::info!(session_id, "Session cleared");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_state::test_support::state;
    use crate::export::{ExportError, FormatterRegistry, ResultsFormatter};
    use crate::models::{LabStatus, SessionRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn lab(test: &str, status: LabStatus) -> LabResult {
        LabResult {
            test: test.into(),
            value: 1.0,
            unit: "u".into(),
            range: "0-2".into(),
            status,
            explanation: String::new(),
        }
    }

    fn seeded() -> CoreState {
        let state = state();
        let mut record = SessionRecord::new(
            "0123456789abcdef",
            "report.pdf",
            "text".into(),
            vec![
                lab("A", LabStatus::new("NORMAL")),
                lab("B", LabStatus::new("CRITICAL")),
                lab("C", LabStatus::new("HIGH")),
            ],
        );
        record.append_exchange("What is B?", "B is critical.");
        state.sessions.create_or_replace(record).unwrap();
        state
    }

    struct CountingFormatter(Arc<AtomicUsize>);

    impl ResultsFormatter for CountingFormatter {
        fn format(&self) -> ExportFormat {
            ExportFormat::Csv
        }

        fn content_type(&self) -> &'static str {
            "text/csv"
        }

        fn render(&self, _filename: &str, _results: &[LabResult]) -> Result<Vec<u8>, ExportError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(b"counted".to_vec())
        }
    }

    #[test]
    fn results_view_includes_summary() {
        let view = get_lab_results(&seeded(), "0123456789abcdef").unwrap();
        assert_eq!(view.results.len(), 3);
        assert_eq!(view.summary.total, 3);
        assert_eq!(view.summary.normal, 1);
        assert_eq!(view.summary.critical, 1);
        assert_eq!(view.filename, "report.pdf");
    }

    #[test]
    fn missing_filename_reads_as_unknown() {
        let state = state();
        state
            .sessions
            .create_or_replace(SessionRecord::new("s1", "", "text".into(), vec![]))
            .unwrap();
        let view = get_lab_results(&state, "s1").unwrap();
        assert_eq!(view.filename, "Unknown");
        assert_eq!(view.summary, LabSummary::default());
    }

    #[test]
    fn results_for_unknown_session_not_found() {
        assert!(matches!(get_lab_results(&state(), "nope"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn csv_export_names_file_by_session_prefix() {
        let file = export_results(&seeded(), "0123456789abcdef", "CSV").unwrap();
        assert_eq!(file.filename, "lab_results_01234567.csv");
        assert_eq!(file.content_type, "text/csv");
        let csv = String::from_utf8(file.bytes).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn pdf_export_is_a_pdf() {
        let file = export_results(&seeded(), "0123456789abcdef", "pdf").unwrap();
        assert_eq!(file.filename, "lab_results_01234567.pdf");
        assert!(file.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn unknown_format_is_rejected_before_any_formatter_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let state = seeded().with_formatters(
            FormatterRegistry::empty().with(Arc::new(CountingFormatter(calls.clone()))),
        );

        let err = export_results(&state, "0123456789abcdef", "xml").unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedFormat(f) if f == "xml"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        export_results(&state, "0123456789abcdef", "csv").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_session_wins_over_bad_format() {
        let err = export_results(&seeded(), "nope", "xml").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn conversation_export() {
        let file = export_conversation(&seeded(), "0123456789abcdef").unwrap();
        assert_eq!(file.filename, "medical_conversation_01234567.pdf");
        assert!(file.bytes.starts_with(b"%PDF"));
        assert!(matches!(export_conversation(&state(), "nope"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn clear_session_is_idempotent() {
        let state = seeded();
        clear_session(&state, "0123456789abcdef").unwrap();
        assert!(state.sessions.is_empty());
        clear_session(&state, "0123456789abcdef").unwrap();
    }
}
