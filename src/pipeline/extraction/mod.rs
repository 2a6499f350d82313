//! Report text extraction: an ordered chain of text readers with OCR of
//! embedded page scans as the last resort.

pub mod types;
pub mod pdf;
pub mod layout;
pub mod ocr;
pub mod pdf_renderer;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod fixtures;

pub use types::*;
pub use pdf::*;
pub use layout::*;
pub use ocr::*;
pub use pdf_renderer::*;
pub use orchestrator::*;

use std::path::PathBuf;

use thiserror::Error;

/// Why one extraction strategy produced nothing. Never surfaced past the
/// chain: the orchestrator logs it and moves on.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("PDF could not be read: {0}")]
    PdfParsing(String),

    #[error("Page image could not be decoded: {0}")]
    ImageProcessing(String),

    #[error("OCR engine failed to start: {0}")]
    OcrInit(String),

    #[error("OCR failed: {0}")]
    OcrProcessing(String),

    #[error("No OCR language data in {0}")]
    TessdataNotFound(PathBuf),
}
