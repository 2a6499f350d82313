use lopdf::Document;

use super::types::TextStrategy;
use super::ExtractionError;

/// Second text reader built on lopdf's content-stream decoder.
///
/// Picks up PDFs whose fonts or encodings trip pdf-extract. Pages that fail
/// to decode are skipped rather than failing the whole document.
pub struct LayoutTextStrategy;

impl TextStrategy for LayoutTextStrategy {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, ExtractionError> {
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(format!("Failed to parse PDF: {e}")))?;

        let mut text = String::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    if !page_text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                Err(e) => {
                    tracing::debug!(page = page_number, error = %e, "Page text not decodable");
                }
            }
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::fixtures::{scanned_pdf, test_jpeg, text_pdf};

    #[test]
    fn reads_content_stream_text() {
        let pdf = text_pdf(&["Glucose 95 mg/dL", "Sodium 140 mmol/L"]);
        let text = LayoutTextStrategy.extract(&pdf).unwrap();
        assert!(text.contains("Glucose"), "got: {text}");
        assert!(text.contains("Sodium"), "got: {text}");
    }

    #[test]
    fn scanned_page_yields_blank() {
        let pdf = scanned_pdf(&test_jpeg(40, 60));
        let text = LayoutTextStrategy.extract(&pdf).unwrap();
        assert!(text.trim().is_empty());
    }

    #[test]
    fn unparsable_bytes_are_an_error() {
        let err = LayoutTextStrategy.extract(b"%PDF-garbage").unwrap_err();
        assert!(matches!(err, ExtractionError::PdfParsing(_)));
    }
}
