//! Page rasterization for OCR without a PDF rendering engine.
//!
//! Scanned reports are almost always one image XObject per page, so the
//! "rendering" here is pulling that image back out with lopdf and
//! re-encoding it as PNG.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::types::PdfPageRenderer;
use super::ExtractionError;

/// Recovers the page scan embedded in each page of a scanned PDF.
pub struct EmbeddedScanRenderer;

impl PdfPageRenderer for EmbeddedScanRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
        Ok(load(pdf_bytes)?.get_pages().len())
    }

    fn render_page(&self, pdf_bytes: &[u8], page_index: usize) -> Result<Vec<u8>, ExtractionError> {
        let doc = load(pdf_bytes)?;
        let page_ids: Vec<ObjectId> = doc.page_iter().collect();
        let page_id = *page_ids.get(page_index).ok_or_else(|| {
            ExtractionError::PdfParsing(format!(
                "Page {page_index} not found (PDF has {} pages)",
                page_ids.len()
            ))
        })?;

        let img = largest_page_image(&doc, page_id)?;
        let png = encode_png(&img)?;
        tracing::debug!(
            page = page_index,
            width = img.width(),
            height = img.height(),
            png_size = png.len(),
            "Recovered page scan"
        );
        Ok(png)
    }
}

fn load(pdf_bytes: &[u8]) -> Result<Document, ExtractionError> {
    Document::load_mem(pdf_bytes)
        .map_err(|e| ExtractionError::PdfParsing(format!("Failed to parse PDF: {e}")))
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ExtractionError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encode failed: {e}")))?;
    Ok(buf.into_inner())
}

/// Page → /Resources → /XObject, keeping the image with the most pixels.
fn largest_page_image(doc: &Document, page_id: ObjectId) -> Result<DynamicImage, ExtractionError> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| ExtractionError::PdfParsing(format!("Page object error: {e}")))?;
    let resources = dict_entry(doc, page, b"Resources")?;
    let xobjects = dict_entry(doc, resources, b"XObject")?;

    let mut best: Option<DynamicImage> = None;
    for (_, entry) in xobjects.iter() {
        let Object::Stream(stream) = resolve(doc, entry) else {
            continue;
        };
        if !has_name(&stream.dict, b"Subtype", b"Image") {
            continue;
        }
        let img = match decode_image_stream(doc, stream) {
            Ok(img) => img,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable image XObject");
                continue;
            }
        };
        let pixels = u64::from(img.width()) * u64::from(img.height());
        if best
            .as_ref()
            .map_or(true, |b| pixels > u64::from(b.width()) * u64::from(b.height()))
        {
            best = Some(img);
        }
    }

    best.ok_or_else(|| ExtractionError::PdfParsing("No image XObjects found on this page".into()))
}

fn decode_image_stream(doc: &Document, stream: &Stream) -> Result<DynamicImage, ExtractionError> {
    // DCTDecode content is a complete JPEG file
    let content = if has_name(&stream.dict, b"Filter", b"DCTDecode") {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())
    };

    if let Ok(img) = image::load_from_memory(&content) {
        return Ok(img);
    }
    raw_pixels_to_image(doc, &stream.dict, content)
}

/// Rebuild an 8-bit image from raw samples using /Width, /Height and /ColorSpace.
fn raw_pixels_to_image(
    doc: &Document,
    dict: &Dictionary,
    pixels: Vec<u8>,
) -> Result<DynamicImage, ExtractionError> {
    let width = int_entry(dict, b"Width")? as u32;
    let height = int_entry(dict, b"Height")? as u32;
    let bits = int_entry(dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        return Err(ExtractionError::ImageProcessing(format!(
            "Unsupported bits per component: {bits}"
        )));
    }

    let too_small = || ExtractionError::ImageProcessing("Raw pixel buffer too small".into());
    match color_channels(doc, dict) {
        1 => image::GrayImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(too_small),
        3 => image::RgbImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(too_small),
        n => Err(ExtractionError::ImageProcessing(format!(
            "Unsupported channel count: {n}"
        ))),
    }
}

fn color_channels(doc: &Document, dict: &Dictionary) -> i64 {
    let Ok(space) = dict.get(b"ColorSpace") else {
        return 3;
    };
    match resolve(doc, space) {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" => 1,
            b"DeviceCMYK" => 4,
            _ => 3,
        },
        Object::Array(parts) => match parts.as_slice() {
            [Object::Name(kind), Object::Reference(id), ..] if kind == b"ICCBased" => doc
                .get_object(*id)
                .ok()
                .and_then(|o| o.as_stream().ok())
                .and_then(|s| s.dict.get(b"N").ok())
                .and_then(|n| n.as_i64().ok())
                .unwrap_or(3),
            [Object::Name(kind), ..] if kind == b"Indexed" => 1,
            _ => 3,
        },
        _ => 3,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn has_name(dict: &Dictionary, key: &[u8], expected: &[u8]) -> bool {
    match dict.get(key) {
        Ok(Object::Name(name)) => name == expected,
        Ok(Object::Array(items)) => items
            .iter()
            .any(|o| matches!(o, Object::Name(name) if name == expected)),
        _ => false,
    }
}

fn dict_entry<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Result<&'a Dictionary, ExtractionError> {
    let key_name = String::from_utf8_lossy(key);
    let obj = dict
        .get(key)
        .map_err(|_| ExtractionError::PdfParsing(format!("Missing /{key_name}")))?;
    resolve(doc, obj)
        .as_dict()
        .map_err(|_| ExtractionError::PdfParsing(format!("/{key_name} is not a dictionary")))
}

fn int_entry(dict: &Dictionary, key: &[u8]) -> Result<i64, ExtractionError> {
    dict.get(key)
        .and_then(Object::as_i64)
        .map_err(|_| {
            ExtractionError::PdfParsing(format!(
                "Missing integer /{}",
                String::from_utf8_lossy(key)
            ))
        })
}

/// Hands back the same image for every page of a fixed-size document.
pub struct MockPageRenderer {
    pub pages: usize,
    pub image: Vec<u8>,
}

impl MockPageRenderer {
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            image: b"\x89PNG mock page".to_vec(),
        }
    }
}

impl PdfPageRenderer for MockPageRenderer {
    fn page_count(&self, _pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
        Ok(self.pages)
    }

    fn render_page(&self, _pdf_bytes: &[u8], page_index: usize) -> Result<Vec<u8>, ExtractionError> {
        if page_index >= self.pages {
            return Err(ExtractionError::PdfParsing(format!("Page {page_index} not found")));
        }
        Ok(self.image.clone())
    }
}
