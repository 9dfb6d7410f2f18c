//! Deterministic fixtures shared by unit and integration tests.
//!
//! Integration tests include this file by path, so items are named through
//! the `quote_renderer` crate name rather than `crate`.

use std::collections::HashMap;
use std::sync::Arc;

use quote_renderer::font::{FontFace, FontFamily, FontProvider, ShapedText};
use tiny_skia::{Pixmap, PathBuilder, Rect};

/// A font whose glyphs are solid blocks.
///
/// Every character advances `0.5 * size` (`0.6 * size` for monospace), so
/// layout numbers can be computed by hand.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct BlockFont;

impl BlockFont {
    pub(crate) fn char_width(face: FontFace, size: f32) -> f32 {
        match face.family {
            FontFamily::Proportional => size * 0.5,
            FontFamily::Monospace => size * 0.6,
        }
    }
}

impl FontProvider for BlockFont {
    #[allow(clippy::cast_precision_loss)]
    fn advance(&self, text: &str, face: FontFace, size: f32) -> f32 {
        text.chars().count() as f32 * Self::char_width(face, size)
    }

    fn shape(&self, text: &str, face: FontFace, size: f32, x: f32, baseline: f32) -> Option<ShapedText> {
        let step = Self::char_width(face, size);
        let mut builder = PathBuilder::new();
        let mut pen = x;
        for ch in text.chars() {
            if !ch.is_whitespace() {
                if let Some(rect) = Rect::from_xywh(pen + step * 0.1, baseline - size * 0.7, step * 0.8, size * 0.7) {
                    builder.push_rect(rect);
                }
            }
            pen += step;
        }
        builder.finish().map(|path| ShapedText { path, embolden: 0.0 })
    }
}

/// A square emoji image of one color.
pub(crate) fn emoji_pixmap(size: u32, rgba: [u8; 4]) -> Arc<Pixmap> {
    let mut pixmap = Pixmap::new(size, size).unwrap();
    pixmap.fill(tiny_skia::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
    Arc::new(pixmap)
}

/// Emoji lookup table holding a single red emoji.
pub(crate) fn red_emoji_table(key: &str) -> HashMap<String, Arc<Pixmap>> {
    HashMap::from([(key.to_string(), emoji_pixmap(8, [255, 0, 0, 255]))])
}

/// Premultiplied RGBA of the pixel at `(x, y)`.
pub(crate) fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
    let p = pixmap.pixel(x, y).unwrap();
    [p.red(), p.green(), p.blue(), p.alpha()]
}
