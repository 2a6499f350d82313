//! Shared application state.
//!
//! `CoreState` is built once at startup, wrapped in `Arc`, and handed to
//! every boundary operation. The boundary operations themselves live in
//! `ingest`, `chat` and `labs` and are transport-agnostic: the HTTP layer
//! only decodes requests and maps `CoreError` to responses.

use std::sync::Arc;

use thiserror::Error;

use crate::config::AppConfig;
use crate::export::{ExportError, FormatterRegistry};
use crate::pipeline::chat::ChatResponder;
use crate::pipeline::extraction::DocumentExtractor;
use crate::pipeline::llm::{self, LlmClient};
use crate::pipeline::structuring::LabDataExtractor;
use crate::session_store::{SessionStore, SessionStoreError};

pub struct CoreState {
    pub config: AppConfig,
    pub sessions: SessionStore,
    pub extractor: DocumentExtractor,
    pub lab_extractor: LabDataExtractor,
    pub responder: ChatResponder,
    pub formatters: FormatterRegistry,
}

impl CoreState {
    /// Production wiring: restore sessions from disk, build the configured
    /// generation backend and the default extraction chain.
    pub fn from_config(config: AppConfig) -> Self {
        let sessions = SessionStore::restore(&config.session_file);
        let llm = llm::client_from_config(&config);
        let extractor = DocumentExtractor::from_config(&config);
        Self::with_parts(config, sessions, extractor, llm)
    }

    /// Wire explicit collaborators (tests, embedders).
    pub fn with_parts(
        config: AppConfig,
        sessions: SessionStore,
        extractor: DocumentExtractor,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        let primary = config
            .llm_models
            .first()
            .cloned()
            .unwrap_or_default();
        Self {
            lab_extractor: LabDataExtractor::new(llm.clone(), &primary),
            responder: ChatResponder::new(llm, config.llm_models.clone()),
            formatters: FormatterRegistry::standard(),
            config,
            sessions,
            extractor,
        }
    }

    pub fn with_formatters(mut self, formatters: FormatterRegistry) -> Self {
        self.formatters = formatters;
        self
    }

    pub fn llm_configured(&self) -> bool {
        self.lab_extractor.is_configured()
    }

    /// Persist after a mutation. Failure is logged, never surfaced: the
    /// in-memory state is already updated and the next mutation retries.
    pub fn persist_sessions(&self) {
        if let Err(e) = self.sessions.persist() {
            tracing::warn!(error = %e, "Failed to persist sessions");
        }
    }
}

// ═══════════════════════════════════════════════════════════
// CoreError: boundary operation failures
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No text could be extracted from the document")]
    NoTextExtracted,
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SessionStoreError> for CoreError {
    fn from(e: SessionStoreError) -> Self {
        match e {
            SessionStoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::pipeline::llm::MockLlmClient;

    pub const LAB_JSON: &str = r#"```json
[
  {"test": "Glucose", "value": 110, "unit": "mg/dL", "range": "70-100", "status": "SLIGHTLY_ABNORMAL", "explanation": "Blood sugar"},
  {"test": "Cholesterol", "value": 280, "unit": "mg/dL", "range": "<200", "status": "CRITICAL", "explanation": "Total cholesterol"},
  {"test": "Hemoglobin", "value": 14, "unit": "g/dL", "range": "12-16", "status": "NORMAL", "explanation": "Oxygen carrier"}
]
```"#;

    /// In-memory state backed by `mock` for both extraction and chat.
    pub fn state_with(mock: Arc<MockLlmClient>) -> CoreState {
        CoreState::with_parts(
            AppConfig::default(),
            SessionStore::in_memory(),
            DocumentExtractor::text_only(),
            Some(mock),
        )
    }

    pub fn state() -> CoreState {
        state_with(Arc::new(MockLlmClient::new(LAB_JSON)))
    }
}
