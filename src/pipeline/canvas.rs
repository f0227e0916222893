//! Canvas normalisation: every page becomes a 2800×3974 white RGB canvas.
//!
//! The source is pasted unscaled at its own bounding box, so the top-left of
//! a fully opaque image lands on the canvas origin. Anything beyond the
//! canvas edge is clipped; anything short of it stays white. Because every
//! canvas has the same size, every page of the merged document has the same
//! page box regardless of the portal's source resolution.

use crate::config::{CANVAS_HEIGHT, CANVAS_WIDTH};
use image::{imageops, DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// A page image on the fixed canvas.
#[derive(Debug, Clone)]
pub struct NormalizedPage {
    /// 1-based page index.
    pub page: usize,
    /// 0 for the primary image, 1.. for included additional images.
    pub part: usize,
    pub canvas: RgbImage,
}

/// Pixel rectangle of the non-transparent part of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Bounding box of the non-transparent pixels.
///
/// Images without an alpha channel are opaque everywhere, so their box is
/// the full image. Returns `None` for empty or fully transparent images.
pub fn bounding_box(image: &DynamicImage) -> Option<BoundingBox> {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return None;
    }
    if !image.color().has_alpha() {
        return Some(BoundingBox {
            x: 0,
            y: 0,
            width: w,
            height: h,
        });
    }

    let rgba = image.to_rgba8();
    let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
    let (mut max_x, mut max_y) = (0u32, 0u32);
    for (x, y, p) in rgba.enumerate_pixels() {
        if p[3] != 0 {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x == u32::MAX {
        return None;
    }
    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Paste `image` onto a fresh white canvas.
///
/// Partially transparent pixels are blended over the white background.
pub fn normalize(image: &DynamicImage) -> RgbImage {
    let Some(bbox) = bounding_box(image) else {
        return RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, WHITE);
    };
    let (x, y) = (i64::from(bbox.x), i64::from(bbox.y));

    if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        let region = imageops::crop_imm(&rgba, bbox.x, bbox.y, bbox.width, bbox.height).to_image();
        let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba([255, 255, 255, 255]));
        imageops::overlay(&mut canvas, &region, x, y);
        return DynamicImage::ImageRgba8(canvas).to_rgb8();
    }

    let rgb = image.to_rgb8();
    let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, WHITE);
    imageops::replace(&mut canvas, &rgb, x, y);
    canvas
}

/// Normalise one page's image.
pub fn normalize_page(page: usize, part: usize, image: &DynamicImage) -> NormalizedPage {
    NormalizedPage {
        page,
        part,
        canvas: normalize(image),
    }
}
