use std::panic;

use super::types::TextStrategy;
use super::ExtractionError;

/// Embedded text layer, read with the pdf-extract crate.
/// Handles digital PDFs; scanned pages come back blank.
pub struct TextLayerStrategy;

impl TextStrategy for TextLayerStrategy {
    fn name(&self) -> &'static str {
        "text_layer"
    }

    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, ExtractionError> {
        // pdf-extract panics on some malformed documents (e.g. a `Tf` with no
        // font resources); those count as a failed read.
        let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(pdf_bytes))
            .map_err(|payload| ExtractionError::PdfParsing(panic_message(payload.as_ref())))?
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        let mut text = String::new();
        for page in &pages {
            text.push_str(page);
            text.push('\n');
        }

        tracing::debug!(pages = pages.len(), chars = text.len(), "Text layer read");
        Ok(text)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".into());
    format!("PDF text reader panicked: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::fixtures::{fontless_pdf, scanned_pdf, test_jpeg, text_pdf};

    #[test]
    fn reads_digital_pdf() {
        let pdf = text_pdf(&["Hemoglobin 13.5 g/dL"]);
        let text = TextLayerStrategy.extract(&pdf).unwrap();
        assert!(
            text.contains("Hemoglobin") || text.contains("13.5"),
            "Expected report text, got: {text}"
        );
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn scanned_page_has_no_text_layer() {
        let pdf = scanned_pdf(&test_jpeg(40, 60));
        let text = TextLayerStrategy.extract(&pdf).unwrap_or_default();
        assert!(text.trim().is_empty(), "got: {text:?}");
    }

    #[test]
    fn garbage_bytes_fail() {
        assert!(TextLayerStrategy.extract(b"not a pdf").is_err());
    }

    #[test]
    fn missing_font_resources_fail_without_panicking() {
        let err = TextLayerStrategy.extract(&fontless_pdf("Glucose 110")).unwrap_err();
        assert!(matches!(err, ExtractionError::PdfParsing(_)));
    }
}
