//! PDF builders shared by tests across the crate.

use lopdf::dictionary;
use lopdf::{Document, Object, ObjectId, Stream};

/// A one-page Helvetica PDF, one line of text per entry.
pub fn text_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut content = String::from("BT /F1 12 Tf 72 720 Td");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            content.push_str(" 0 -16 Td");
        }
        content.push_str(&format!(" ({line}) Tj"));
    }
    content.push_str(" ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    };

    finish_single_page(&mut doc, content_id, resources)
}

/// A one-page PDF that selects `/F1` but declares no font resources.
pub fn fontless_pdf(line: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let content = format!("BT /F1 12 Tf 72 720 Td ({line}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    finish_single_page(&mut doc, content_id, dictionary! {})
}

/// A one-page PDF whose only content is a full-page JPEG scan.
pub fn scanned_pdf(jpeg_bytes: &[u8]) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");

    let (width, height) = image::load_from_memory(jpeg_bytes)
        .map(|img| (img.width() as i64, img.height() as i64))
        .unwrap();

    let mut img_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg_bytes.to_vec(),
    );
    img_stream.allows_compression = false;
    let img_id = doc.add_object(Object::Stream(img_stream));

    let content = b"q 612 0 0 792 0 0 cm /Scan Do Q".to_vec();
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    let resources = dictionary! {
        "XObject" => dictionary! {
            "Scan" => img_id,
        },
    };

    finish_single_page(&mut doc, content_id, resources)
}

pub fn test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200u8, 200, 200]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

fn finish_single_page(doc: &mut Document, content_id: ObjectId, resources: lopdf::Dictionary) -> Vec<u8> {
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => resources,
    });

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });

    if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
