//! Lab result reads and downloads.
//!
//! - `GET /api/results/:session_id`: results, summary, filename, upload time
//! - `GET /export_results/:session_id/:format`: CSV or PDF attachment
//! - `POST /export_conversation`: conversation transcript as PDF

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::endpoints::session::SessionRequest;
use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::export::ExportedFile;
use crate::labs::{self, LabResultsView};

#[derive(Serialize)]
pub struct ResultsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub view: LabResultsView,
}

/// Attachment response with the export's content type and download name.
fn attachment(file: ExportedFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.bytes,
    )
        .into_response()
}

pub async fn results(
    State(state): State<Arc<CoreState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let view = labs::get_lab_results(&state, &session_id)?;
    Ok(Json(ResultsResponse {
        success: true,
        view,
    }))
}

pub async fn export_results(
    State(state): State<Arc<CoreState>>,
    Path((session_id, format)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let file = tokio::task::spawn_blocking(move || {
        labs::export_results(&state, &session_id, &format)
    })
    .await??;
    Ok(attachment(file))
}

pub async fn export_conversation(
    State(state): State<Arc<CoreState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Response, ApiError> {
    let file = tokio::task::spawn_blocking(move || {
        labs::export_conversation(&state, &req.session_id)
    })
    .await??;
    Ok(attachment(file))
}
