use std::path::Path;
use std::sync::Arc;

use super::layout::LayoutTextStrategy;
use super::ocr::OcrStrategy;
use super::pdf::TextLayerStrategy;
use super::pdf_renderer::EmbeddedScanRenderer;
use super::types::{OcrEngine, TextStrategy};
use super::ExtractionError;
use crate::config::AppConfig;
use crate::pipeline::fallback::run_chain;

/// Turns a report file into plain text by trying each strategy in order.
///
/// The first strategy whose output is non-blank wins; outputs are never
/// merged. Extraction never fails: an unreadable file or an exhausted chain
/// comes back as an empty string.
pub struct DocumentExtractor {
    strategies: Vec<Box<dyn TextStrategy>>,
}

impl DocumentExtractor {
    pub fn new(strategies: Vec<Box<dyn TextStrategy>>) -> Self {
        Self { strategies }
    }

    /// Text layer, then the lopdf reader. No OCR.
    pub fn text_only() -> Self {
        Self::new(vec![Box::new(TextLayerStrategy), Box::new(LayoutTextStrategy)])
    }

    /// Append OCR of embedded page scans as the last resort.
    pub fn with_ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.strategies.push(Box::new(OcrStrategy::new(
            Arc::new(EmbeddedScanRenderer),
            engine,
        )));
        self
    }

    /// The chain used by the server: both text readers, plus Tesseract when
    /// the `ocr` feature is compiled in and its language data is present.
    pub fn from_config(config: &AppConfig) -> Self {
        let extractor = Self::text_only();

        #[cfg(feature = "ocr")]
        {
            match super::ocr::BundledTesseract::new(&config.tessdata_dir) {
                Ok(engine) => return extractor.with_ocr_engine(Arc::new(engine)),
                Err(e) => tracing::warn!(error = %e, "OCR unavailable, scanned reports will yield no text"),
            }
        }
        #[cfg(not(feature = "ocr"))]
        tracing::info!(
            tessdata = %config.tessdata_dir.display(),
            "Built without the ocr feature, scanned reports will yield no text"
        );

        extractor
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn extract(&self, path: &Path) -> String {
        match std::fs::read(path) {
            Ok(bytes) => self.extract_bytes(&bytes),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read document");
                String::new()
            }
        }
    }

    pub fn extract_bytes(&self, pdf_bytes: &[u8]) -> String {
        let outcome = run_chain(
            "text_extraction",
            self.strategies.iter(),
            |s| s.name().to_string(),
            |s| -> Result<Option<String>, ExtractionError> {
                let text = s.extract(pdf_bytes)?;
                Ok((!text.trim().is_empty()).then_some(text))
            },
        );

        match outcome {
            Ok(hit) => {
                tracing::info!(
                    strategy = %hit.label,
                    chars = hit.value.len(),
                    "Text extracted"
                );
                hit.value
            }
            Err(exhausted) => {
                tracing::warn!(
                    attempted = exhausted.failures.len(),
                    "No strategy produced text"
                );
                String::new()
            }
        }
    }
}
