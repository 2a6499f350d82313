use std::sync::Arc;

use super::types::{OcrEngine, PdfPageRenderer, TextStrategy};
use super::ExtractionError;

/// Rasterize every page and run it through an OCR engine.
///
/// Slowest strategy; only reached when neither text reader found anything.
/// A page that fails to render or recognize is skipped; the strategy fails
/// only when every page did.
pub struct OcrStrategy {
    renderer: Arc<dyn PdfPageRenderer>,
    engine: Arc<dyn OcrEngine>,
}

impl OcrStrategy {
    pub fn new(renderer: Arc<dyn PdfPageRenderer>, engine: Arc<dyn OcrEngine>) -> Self {
        Self { renderer, engine }
    }

    fn ocr_page(&self, pdf_bytes: &[u8], page_index: usize) -> Result<String, ExtractionError> {
        let image = self.renderer.render_page(pdf_bytes, page_index)?;
        self.engine.ocr_image(&image)
    }
}

impl TextStrategy for OcrStrategy {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, ExtractionError> {
        let page_count = self.renderer.page_count(pdf_bytes)?;

        let mut text = String::new();
        let mut last_error = None;
        for page_index in 0..page_count {
            match self.ocr_page(pdf_bytes, page_index) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => {
                    tracing::warn!(page = page_index, error = %e, "OCR failed for page");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if text.is_empty() => Err(e),
            _ => Ok(text),
        }
    }
}

/// Bundled Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct BundledTesseract {
    tessdata_dir: std::path::PathBuf,
    lang: String,
}

#[cfg(feature = "ocr")]
impl BundledTesseract {
    pub fn new(tessdata_dir: &std::path::Path) -> Result<Self, ExtractionError> {
        if !tessdata_dir.join("eng.traineddata").exists() {
            return Err(ExtractionError::TessdataNotFound(tessdata_dir.to_path_buf()));
        }
        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
            lang: "eng".to_string(),
        })
    }

    /// Set language(s) for OCR (e.g., "eng", "eng+fra")
    pub fn with_languages(mut self, langs: &str) -> Self {
        self.lang = langs.to_string();
        self
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for BundledTesseract {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        let tessdata = self
            .tessdata_dir
            .to_str()
            .ok_or_else(|| ExtractionError::OcrInit("Invalid tessdata path".into()))?;

        let mut tess = tesseract::Tesseract::new(Some(tessdata), Some(self.lang.as_str()))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        tess.get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))
    }
}

/// Mock OCR engine for unit testing without Tesseract.
pub struct MockOcrEngine {
    pub text: String,
    pub fail: bool,
}

impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            fail: true,
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<String, ExtractionError> {
        if self.fail {
            return Err(ExtractionError::OcrProcessing("mock OCR failure".into()));
        }
        Ok(self.text.clone())
    }
}
