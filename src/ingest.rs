//! Report upload: validate, extract text, extract lab data, store.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use crate::core_state::{CoreError, CoreState};
use crate::models::{LabResult, SessionRecord};

/// Characters of extracted text echoed back to the uploader.
pub const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub session_id: String,
    #[serde(rename = "lab_data")]
    pub lab_results: Vec<LabResult>,
    pub has_lab_data: bool,
    pub text_preview: String,
}

/// Only the final path component of a client-supplied name is kept.
fn base_filename(filename: &str) -> &str {
    let trimmed = filename.trim();
    Path::new(trimmed)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(trimmed)
}

fn validate_upload(bytes: &[u8], filename: &str) -> Result<(), CoreError> {
    if filename.is_empty() {
        return Err(CoreError::InvalidInput("No file selected".into()));
    }
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(CoreError::InvalidInput("File must be a PDF".into()));
    }
    if bytes.is_empty() {
        return Err(CoreError::InvalidInput("Uploaded file is empty".into()));
    }
    Ok(())
}

/// First `PREVIEW_CHARS` characters, with `...` when cut.
pub fn text_preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Write the upload to a temp file and run the extraction chain over it.
/// The temp file is removed when this returns.
fn extract_upload_text(state: &CoreState, bytes: &[u8]) -> Result<String, CoreError> {
    let mut upload = tempfile::Builder::new()
        .prefix("upload_")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| CoreError::Internal(format!("Failed to stage upload: {e}")))?;
    upload
        .write_all(bytes)
        .and_then(|_| upload.flush())
        .map_err(|e| CoreError::Internal(format!("Failed to stage upload: {e}")))?;

    Ok(state.extractor.extract(upload.path()))
}

/// Ingest an uploaded report.
///
/// With `session_id` naming an existing session, the report replaces that
/// session's text, lab data and filename while its conversation, language
/// and creation time are kept. Otherwise a session is created under the
/// given id, or a fresh one.
pub fn ingest_document(
    state: &CoreState,
    bytes: &[u8],
    filename: &str,
    session_id: Option<&str>,
) -> Result<IngestOutcome, CoreError> {
    let filename = base_filename(filename);
    validate_upload(bytes, filename)?;

    let session_id = session_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::info!(session_id = %session_id, filename, size = bytes.len(), "Ingesting report");

    let text = extract_upload_text(state, bytes)?;
    if text.trim().is_empty() {
        tracing::warn!(session_id = %session_id, filename, "No text extracted");
        return Err(CoreError::NoTextExtracted);
    }

    let lab_results = state.lab_extractor.extract_structured(&text);

    let replaced = state.sessions.upsert(
        &session_id,
        || {
            let mut record =
                SessionRecord::new(&session_id, filename, text.clone(), lab_results.clone());
            record.language = state.config.default_language.clone();
            record
        },
        |record| {
            record.source_text = text.clone();
            record.lab_data = lab_results.clone();
            record.filename = filename.to_string();
        },
    )?;
    state.persist_sessions();

    tracing::info!(
        session_id = %session_id,
        lab_tests = lab_results.len(),
        replaced = replaced.is_some(),
        "Report ingested"
    );

    Ok(IngestOutcome {
        has_lab_data: !lab_results.is_empty(),
        text_preview: text_preview(&text),
        session_id,
        lab_results,
    })
}
