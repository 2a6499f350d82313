use super::ExtractionError;

/// One way of turning PDF bytes into plain text.
///
/// Strategies are tried in order by [`super::DocumentExtractor`]; an empty
/// string means "nothing found here", not failure.
pub trait TextStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine: Send + Sync {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Turns one PDF page into an image an [`OcrEngine`] can read.
pub trait PdfPageRenderer: Send + Sync {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError>;

    /// `page_index` is zero-based.
    fn render_page(&self, pdf_bytes: &[u8], page_index: usize) -> Result<Vec<u8>, ExtractionError>;
}
