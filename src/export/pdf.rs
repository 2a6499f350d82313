use std::io::BufWriter;

use printpdf::*;

use super::{ExportError, ResultsFormatter};
use crate::models::{ConversationRole, ConversationTurn, ExportFormat, LabResult};
use crate::pipeline::structuring::summarize;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP: f32 = 280.0;
const BOTTOM: f32 = 20.0;
const LEFT: f32 = 20.0;

/// A4 text layout over printpdf that starts a new page when the cursor
/// reaches the bottom margin.
struct TextDocument {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl TextDocument {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page1).get_layer(layer1);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(format!("PDF font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(format!("PDF font error: {e}")))?;

        Ok(Self {
            doc,
            layer,
            font,
            bold,
            y: TOP,
            pages: 1,
        })
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < BOTTOM {
            self.pages += 1;
            let (page, layer) = self.doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Layer {}", self.pages),
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
    }

    /// Write wrapped text. Line height scales with font size.
    fn text(&mut self, text: &str, size: f32, bold: bool, indent: f32, max_chars: usize) {
        let line_height = size * 0.5;
        for line in wrap_text(text, max_chars) {
            self.ensure_room(line_height);
            let font = if bold { &self.bold } else { &self.font };
            self.layer
                .use_text(line, size, Mm(LEFT + indent), Mm(self.y), font);
            self.y -= line_height;
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ExportError::Pdf(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ExportError::Pdf(format!("PDF buffer error: {e}")))
    }
}

/// Lab results report: title, status summary, one block per test.
pub struct PdfFormatter;

impl ResultsFormatter for PdfFormatter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, filename: &str, results: &[LabResult]) -> Result<Vec<u8>, ExportError> {
        let title = format!("Lab Results Analysis - {filename}");
        let mut doc = TextDocument::new(&title)?;

        doc.text(&title, 16.0, true, 0.0, 70);
        doc.gap(4.0);
        doc.text(&summarize(results).headline(), 11.0, true, 0.0, 90);
        doc.gap(6.0);

        for result in results {
            doc.text(&result.test, 12.0, true, 0.0, 80);
            doc.text(
                &format!("Value: {} {}", result.value, result.unit),
                10.0,
                false,
                4.0,
                95,
            );
            let range = if result.range.is_empty() { "N/A" } else { &result.range };
            doc.text(&format!("Reference Range: {range}"), 10.0, false, 4.0, 95);
            doc.text(&format!("Status: {}", result.status), 10.0, false, 4.0, 95);
            let explanation = if result.explanation.is_empty() {
                "No explanation available"
            } else {
                &result.explanation
            };
            doc.text(&format!("Explanation: {explanation}"), 10.0, false, 4.0, 95);
            doc.gap(5.0);
        }

        doc.finish()
    }
}

/// Conversation transcript with "You:" / "Medical Assistant:" paragraphs.
pub fn render_conversation_pdf(conversation: &[ConversationTurn]) -> Result<Vec<u8>, ExportError> {
    const TITLE: &str = "Medical Report Conversation";
    let mut doc = TextDocument::new(TITLE)?;

    doc.text(TITLE, 16.0, true, 0.0, 70);
    doc.gap(6.0);

    for turn in conversation {
        let speaker = match turn.role {
            ConversationRole::User => "You:",
            ConversationRole::Assistant => "Medical Assistant:",
        };
        doc.text(speaker, 11.0, true, 0.0, 90);
        for paragraph in turn.content.lines().filter(|l| !l.trim().is_empty()) {
            doc.text(paragraph, 10.0, false, 4.0, 95);
        }
        doc.gap(4.0);
    }

    doc.finish()
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
