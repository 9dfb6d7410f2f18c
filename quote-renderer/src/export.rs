//! Sticker export: fit the card into the output box and encode it.

use image::{ExtendedColorType, ImageEncoder};
use tiny_skia::Pixmap;

use crate::error::{RenderError, RenderResult};
use crate::image::rgba_from_pixmap;

/// Encoded output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossless WebP, the sticker format.
    #[default]
    WebP,
    /// PNG.
    Png,
}

impl OutputFormat {
    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Png => "png",
        }
    }

    /// MIME type.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::WebP => "image/webp",
            Self::Png => "image/png",
        }
    }

    /// Parse from a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "webp" => Some(Self::WebP),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// An encoded image and its pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Encoding of `data`.
    pub format: OutputFormat,
    /// Encoded bytes.
    pub data: Vec<u8>,
}

/// Size of `width`×`height` scaled to fit the box, keeping the aspect ratio.
///
/// Images already inside the box keep their size.
#[must_use]
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale_x = f64::from(max_width) / f64::from(width);
    let scale_y = f64::from(max_height) / f64::from(height);
    let scale = scale_x.min(scale_y);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_width = (f64::from(width) * scale) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_height = (f64::from(height) * scale) as u32;

    (new_width.clamp(1, max_width.max(1)), new_height.clamp(1, max_height.max(1)))
}

/// Downscale `pixmap` into the box and encode it.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if encoding fails.
pub fn encode(
    pixmap: &Pixmap,
    max_width: u32,
    max_height: u32,
    format: OutputFormat,
) -> RenderResult<EncodedImage> {
    let rgba = rgba_from_pixmap(pixmap)?;
    let (width, height) = fit_within(rgba.width(), rgba.height(), max_width, max_height);

    let rgba = if (width, height) == rgba.dimensions() {
        rgba
    } else {
        image::imageops::resize(&rgba, width, height, image::imageops::FilterType::Lanczos3)
    };

    let mut buf = std::io::Cursor::new(Vec::new());
    let written = match format {
        OutputFormat::WebP => image::codecs::webp::WebPEncoder::new_lossless(&mut buf).write_image(
            rgba.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        OutputFormat::Png => image::codecs::png::PngEncoder::new(&mut buf).write_image(
            rgba.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    };
    written.map_err(|e| RenderError::Export(format!("{format:?} encoding failed: {e}")))?;

    tracing::debug!(width, height, ?format, "Encoded sticker");
    Ok(EncodedImage {
        width,
        height,
        format,
        data: buf.into_inner(),
    })
}
