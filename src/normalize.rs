//! Icon normalization - turns fetched image bytes into fixed-size tiles
//!
//! Icons arrive in whatever size the data source serves (16x16 textures,
//! 150px wiki renders, non-square sprites). Every tile in the atlas must be
//! exactly `size x size`, so icons are scaled with nearest-neighbor (keeping
//! pixel art crisp) and centered on a transparent canvas.

use crate::item::{ItemRecord, Tile};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::{debug, warn};

/// Transparent color for tile background
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A fully transparent `size x size` tile.
pub fn transparent_tile(size: u32) -> RgbaImage {
    RgbaImage::from_pixel(size, size, TRANSPARENT)
}

/// Normalize optional image bytes into a `size x size` RGBA bitmap.
///
/// Absent or undecodable input yields a transparent tile instead of an error.
pub fn normalize(bytes: Option<&[u8]>, size: u32) -> RgbaImage {
    let Some(bytes) = bytes else {
        return transparent_tile(size);
    };

    match image::load_from_memory(bytes) {
        Ok(decoded) => fit_to_tile(&decoded.to_rgba8(), size),
        Err(e) => {
            warn!("could not decode icon ({} bytes): {}", bytes.len(), e);
            transparent_tile(size)
        }
    }
}

/// Build the atlas tile for a resolved record.
pub fn normalize_record(record: &ItemRecord, size: u32) -> Tile {
    if record.image_bytes.is_none() {
        debug!("{}: using transparent placeholder", record.identifier);
    }

    Tile {
        identifier: record.identifier.clone(),
        display_name: record.display_name.clone(),
        category: record.category,
        image: normalize(record.image_bytes.as_deref(), size),
    }
}

/// Scale an image so its longer side equals `size` and center it on a
/// transparent square canvas.
///
/// The scaled image is alpha-composited onto the canvas, so its own alpha
/// channel acts as the paste mask.
pub fn fit_to_tile(source: &RgbaImage, size: u32) -> RgbaImage {
    let (w, h) = source.dimensions();
    if w == 0 || h == 0 || size == 0 {
        return transparent_tile(size);
    }

    let (scaled_w, scaled_h) = scaled_dimensions(w, h, size);
    let scaled = if (scaled_w, scaled_h) == (w, h) {
        source.clone()
    } else {
        imageops::resize(source, scaled_w, scaled_h, FilterType::Nearest)
    };

    let mut canvas = transparent_tile(size);
    let x = (size - scaled_w) / 2;
    let y = (size - scaled_h) / 2;
    paste_masked(&mut canvas, &scaled, x, y);
    canvas
}

/// Composite `source` over `canvas` at (x, y), using the source alpha as mask.
fn paste_masked(canvas: &mut RgbaImage, source: &RgbaImage, x: u32, y: u32) {
    for (sx, sy, pixel) in source.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        if x + sx < canvas.width() && y + sy < canvas.height() {
            let dst = canvas.get_pixel_mut(x + sx, y + sy);
            *dst = blend_over(*dst, *pixel);
        }
    }
}

/// Source-over alpha blend of two straight-alpha pixels.
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    if src[3] == 255 || dst[3] == 0 {
        return src;
    }

    let sa = src[3] as u32;
    let da = dst[3] as u32 * (255 - sa) / 255;
    let out_a = sa + da;
    let mut out = [0u8; 4];
    for c in 0..3 {
        out[c] = ((src[c] as u32 * sa + dst[c] as u32 * da) / out_a) as u8;
    }
    out[3] = out_a as u8;
    Rgba(out)
}

/// Dimensions after scaling the longer side to `size`, keeping aspect ratio.
///
/// The shorter side is rounded to nearest and never drops below 1.
pub fn scaled_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let (long, short) = if width >= height { (width, height) } else { (height, width) };
    let scaled_short = ((short as u64 * size as u64 + long as u64 / 2) / long as u64).max(1) as u32;
    let scaled_short = scaled_short.min(size);

    if width >= height {
        (size, scaled_short)
    } else {
        (scaled_short, size)
    }
}
