//! Image decoding utilities.
//!
//! Turns encoded bytes (PNG, JPEG, WebP, GIF, SVG) and data URIs into
//! premultiplied tiny-skia pixmaps, and back into straight-alpha RGBA.

use base64::Engine;
use quote_core::Rgb;
use tiny_skia::{ColorU8, Pixmap, Transform};

use crate::error::{RenderError, RenderResult};

/// Whether `data` looks like an SVG document.
fn is_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{FEFF}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Decode an encoded image into a pixmap.
///
/// SVG documents are rasterized at their intrinsic size.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the bytes cannot be decoded.
pub fn decode_pixmap(data: &[u8]) -> RenderResult<Pixmap> {
    if is_svg(data) {
        return rasterize_svg(data, None);
    }

    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
    pixmap_from_rgba(&img.to_rgba8())
}

/// Convert straight-alpha RGBA into a premultiplied pixmap.
///
/// # Errors
///
/// Returns [`RenderError::Surface`] for an empty image.
pub fn pixmap_from_rgba(rgba: &image::RgbaImage) -> RenderResult<Pixmap> {
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Surface(format!("Invalid image size {width}x{height}")))?;

    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    Ok(pixmap)
}

/// Convert a premultiplied pixmap into straight-alpha RGBA.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if the buffer does not match the pixmap size.
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RenderResult<image::RgbaImage> {
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| RenderError::Export("Pixel buffer size mismatch".to_string()))
}

/// Decode the payload of a data URI.
///
/// Supports base64 (`data:image/png;base64,iVBORw0KGgo...`) and
/// percent-encoded payloads.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the data URI is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.contains(";base64") {
        decode_base64(encoded)
    } else {
        percent_decode(encoded)
    }
}

/// Decode standard base64, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] on invalid input.
pub fn decode_base64(encoded: &str) -> RenderResult<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut idx = 0;

    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let byte = bytes
                .get(idx + 1..idx + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            idx += 3;
        } else {
            result.push(bytes[idx]);
            idx += 1;
        }
    }

    Ok(result)
}

/// Rasterize an SVG document.
///
/// With `fit`, the image is scaled so its longer side is `fit` pixels.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the document cannot be parsed.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn rasterize_svg(data: &[u8], fit: Option<u32>) -> RenderResult<Pixmap> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(data, &opt)
        .map_err(|e| RenderError::Resource(format!("SVG parsing failed: {e}")))?;

    let size = tree.size();
    let scale = fit.map_or(1.0, |px| px as f32 / size.width().max(size.height()));
    let px_w = (size.width() * scale).ceil() as u32;
    let px_h = (size.height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(px_w.max(1), px_h.max(1))
        .ok_or_else(|| RenderError::Surface("Failed to create pixmap".to_string()))?;

    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    Ok(pixmap)
}

/// Create a square pixmap of a single opaque color.
///
/// # Errors
///
/// Returns [`RenderError::Surface`] if `size` is zero.
pub fn solid_square(size: u32, color: Rgb) -> RenderResult<Pixmap> {
    let mut pixmap = Pixmap::new(size, size)
        .ok_or_else(|| RenderError::Surface(format!("Invalid square size {size}")))?;
    pixmap.fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 255));
    Ok(pixmap)
}
