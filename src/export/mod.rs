//! Byte-stream renderings of lab results and conversations.

pub mod csv;
pub mod pdf;

pub use self::csv::CsvFormatter;
pub use self::pdf::{render_conversation_pdf, PdfFormatter};

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::models::{ExportFormat, LabResult};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("No formatter registered for {0}")]
    NoFormatter(&'static str),
}

/// Renders a list of lab results in one download format.
pub trait ResultsFormatter: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn content_type(&self) -> &'static str;

    /// `filename` is the uploaded report's name, used in document titles.
    fn render(&self, filename: &str, results: &[LabResult]) -> Result<Vec<u8>, ExportError>;
}

/// A rendered download.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

/// Formatters keyed by export format.
pub struct FormatterRegistry {
    formatters: HashMap<&'static str, Arc<dyn ResultsFormatter>>,
}

impl FormatterRegistry {
    pub fn empty() -> Self {
        Self {
            formatters: HashMap::new(),
        }
    }

    /// CSV and PDF.
    pub fn standard() -> Self {
        Self::empty()
            .with(Arc::new(CsvFormatter))
            .with(Arc::new(PdfFormatter))
    }

    pub fn with(mut self, formatter: Arc<dyn ResultsFormatter>) -> Self {
        self.formatters.insert(formatter.format().as_str(), formatter);
        self
    }

    pub fn get(&self, format: ExportFormat) -> Option<&Arc<dyn ResultsFormatter>> {
        self.formatters.get(format.as_str())
    }

    pub fn export(
        &self,
        format: ExportFormat,
        session_id: &str,
        filename: &str,
        results: &[LabResult],
    ) -> Result<ExportedFile, ExportError> {
        let formatter = self
            .get(format)
            .ok_or(ExportError::NoFormatter(format.as_str()))?;
        Ok(ExportedFile {
            bytes: formatter.render(filename, results)?,
            filename: results_filename(session_id, format),
            content_type: formatter.content_type(),
        })
    }
}

/// First eight characters of the session id, for download names.
fn short_id(session_id: &str) -> &str {
    match session_id.char_indices().nth(8) {
        Some((end, _)) => &session_id[..end],
        None => session_id,
    }
}

pub fn results_filename(session_id: &str, format: ExportFormat) -> String {
    format!("lab_results_{}.{}", short_id(session_id), format.as_str())
}

pub fn conversation_filename(session_id: &str) -> String {
    format!("medical_conversation_{}.pdf", short_id(session_id))
}
