//! Report upload endpoints.
//!
//! - `POST /upload_pdf`: multipart `file`, optional `session_id` to re-upload
//!   into an existing session
//! - `POST /upload`: multipart `file`, always a new session

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::ingest::{ingest_document, IngestOutcome};

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(flatten)]
    pub outcome: IngestOutcome,
}

#[derive(Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    session_id: Option<String>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Malformed upload: {}", e.body_text()))
    }
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.file = Some((filename, bytes.to_vec()));
            }
            Some("session_id") => {
                form.session_id = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn ingest(
    state: Arc<CoreState>,
    form: UploadForm,
    reuse_session: bool,
) -> Result<IngestOutcome, ApiError> {
    let (filename, bytes) = form
        .file
        .ok_or_else(|| ApiError::BadRequest("No file provided".into()))?;
    let session_id = if reuse_session { form.session_id } else { None };

    let outcome = tokio::task::spawn_blocking(move || {
        ingest_document(&state, &bytes, &filename, session_id.as_deref())
    })
    .await??;
    Ok(outcome)
}

/// `POST /upload_pdf`
pub async fn upload_pdf(
    State(state): State<Arc<CoreState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_upload_form(multipart).await?;
    let outcome = ingest(state, form, true).await?;
    Ok(Json(UploadResponse {
        success: true,
        message: "PDF processed successfully",
        outcome,
    }))
}

/// `POST /upload`
pub async fn upload_report(
    State(state): State<Arc<CoreState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_upload_form(multipart).await?;
    let outcome = ingest(state, form, false).await?;
    Ok(Json(UploadResponse {
        success: true,
        message: "Medical report processed successfully",
        outcome,
    }))
}
