//! Page document encoding: canvas → JPEG → single-page PDF.
//!
//! The canvas is JPEG-compressed at the configured quality and embedded
//! unchanged as a `DCTDecode` image XObject that fills the whole page, so
//! the PDF viewer decodes the JPEG directly and no second lossy pass
//! happens. The page box is the canvas size at `page_dpi` (72 → one point
//! per pixel).

use crate::error::PageError;
use crate::pipeline::canvas::NormalizedPage;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use tracing::debug;

/// Name of the page image inside each page's resources.
pub const IMAGE_NAME: &str = "Im0";

/// One page's single-page PDF, tagged with the index that orders it in the
/// final document.
#[derive(Debug, Clone)]
pub struct PageDocument {
    /// 1-based page index.
    pub page: usize,
    /// 0 for the primary image, 1.. for included additional images.
    pub part: usize,
    pub bytes: Vec<u8>,
}

impl PageDocument {
    /// Sort key: page, then part.
    pub fn order_key(&self) -> (usize, usize) {
        (self.page, self.part)
    }
}

/// Encode a normalised page.
pub fn encode_page(
    page: &NormalizedPage,
    jpeg_quality: u8,
    page_dpi: f32,
) -> Result<PageDocument, PageError> {
    let bytes = encode_canvas(&page.canvas, jpeg_quality, page_dpi).map_err(|detail| {
        PageError::EncodeFailed {
            page: page.page,
            detail,
        }
    })?;
    debug!(
        "Page {}.{}: encoded → {} bytes PDF",
        page.page,
        page.part,
        bytes.len()
    );
    Ok(PageDocument {
        page: page.page,
        part: page.part,
        bytes,
    })
}

/// JPEG-compress an RGB canvas.
pub fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    canvas
        .write_with_encoder(encoder)
        .map_err(|e| format!("JPEG encoding failed: {e}"))?;
    Ok(buf)
}

/// Build a single-page PDF showing `canvas`.
pub fn encode_canvas(canvas: &RgbImage, jpeg_quality: u8, page_dpi: f32) -> Result<Vec<u8>, String> {
    let (width_px, height_px) = canvas.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err("canvas is empty".to_string());
    }
    let jpeg = encode_jpeg(canvas, jpeg_quality)?;

    let scale = 72.0 / page_dpi;
    let width_pt = width_px as f32 * scale;
    let height_pt = height_px as f32 * scale;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width_px))),
        ("Height", Object::Integer(i64::from(height_px))),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"DCTDecode".to_vec())),
    ]);
    let image_id = doc.add_object(Stream::new(image_dict, jpeg).with_compression(false));

    // Scale the unit-square image to the full page box.
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width_pt),
                    0.into(),
                    0.into(),
                    Object::Real(height_pt),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|e| format!("content stream encoding failed: {e}"))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content_bytes));

    let resources = Dictionary::from_iter([(
        "XObject",
        Object::Dictionary(Dictionary::from_iter([(
            IMAGE_NAME,
            Object::Reference(image_id),
        )])),
    )]);

    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Dictionary(resources)),
        (
            "MediaBox",
            Object::Array(vec![
                0.into(),
                0.into(),
                Object::Real(width_pt),
                Object::Real(height_pt),
            ]),
        ),
    ]));

    let pages = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ("Count", Object::Integer(1)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| format!("PDF write failed: {e}"))?;
    Ok(output)
}
