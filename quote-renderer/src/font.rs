//! Font selection, measurement and glyph outlines.
//!
//! The layout and glyph stages only talk to [`FontProvider`]; [`FontSet`] is
//! the production implementation over `ab_glyph`. Faces that were not
//! supplied are synthesized: bold by stroking the outline, italic by
//! shearing it.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, OutlineCurve};
use quote_core::{StyleSet, StyleTag};
use tiny_skia::PathBuilder;

use crate::error::{RenderError, RenderResult};

/// Horizontal shear applied to synthesized italics.
const OBLIQUE_SKEW: f32 = 0.2;

/// Stroke width of synthesized bold, relative to the font size.
const EMBOLDEN_RATIO: f32 = 0.03;

/// Typeface family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FontFamily {
    /// Proportional text face.
    #[default]
    Proportional,
    /// Fixed-width code face.
    Monospace,
}

/// A concrete face: family plus weight and slant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FontFace {
    /// Family.
    pub family: FontFamily,
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
}

impl FontFace {
    /// The regular proportional face.
    pub const REGULAR: Self = Self {
        family: FontFamily::Proportional,
        bold: false,
        italic: false,
    };

    /// The face a style set renders with.
    #[must_use]
    pub fn for_styles(styles: StyleSet) -> Self {
        Self {
            family: if styles.contains(StyleTag::Monospace) {
                FontFamily::Monospace
            } else {
                FontFamily::Proportional
            },
            bold: styles.contains(StyleTag::Bold),
            italic: styles.contains(StyleTag::Italic),
        }
    }
}

/// Glyph outlines of a text, positioned on a surface.
#[derive(Debug, Clone)]
pub struct ShapedText {
    /// Filled outline in surface coordinates.
    pub path: tiny_skia::Path,
    /// Stroke width to apply on top of the fill, 0 for none.
    pub embolden: f32,
}

/// Source of text metrics and outlines.
pub trait FontProvider: Send + Sync {
    /// Advance width of `text` at `size` pixels.
    fn advance(&self, text: &str, face: FontFace, size: f32) -> f32;

    /// Outlines of `text` with the pen starting at `x` on `baseline`.
    ///
    /// Returns `None` when the text has no visible glyphs.
    fn shape(&self, text: &str, face: FontFace, size: f32, x: f32, baseline: f32) -> Option<ShapedText>;
}

/// Font files making up a [`FontSet`].
#[derive(Debug, Clone, Default)]
pub struct FontPaths {
    /// Regular proportional face (required).
    pub regular: PathBuf,
    /// Bold face.
    pub bold: Option<PathBuf>,
    /// Italic face.
    pub italic: Option<PathBuf>,
    /// Bold italic face.
    pub bold_italic: Option<PathBuf>,
    /// Monospace face.
    pub monospace: Option<PathBuf>,
}

/// A face chosen for rendering, with the effects needed to fake the rest.
struct Selected<'a> {
    font: &'a FontArc,
    embolden: bool,
    oblique: bool,
}

/// `ab_glyph` fonts for every face the renderer draws.
#[derive(Clone)]
pub struct FontSet {
    regular: FontArc,
    bold: Option<FontArc>,
    italic: Option<FontArc>,
    bold_italic: Option<FontArc>,
    monospace: Option<FontArc>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("bold", &self.bold.is_some())
            .field("italic", &self.italic.is_some())
            .field("bold_italic", &self.bold_italic.is_some())
            .field("monospace", &self.monospace.is_some())
            .finish_non_exhaustive()
    }
}

impl FontSet {
    /// Build a set from the regular face alone; every other face is synthesized.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Font`] if the bytes are not a usable font.
    pub fn from_bytes(regular: Vec<u8>) -> RenderResult<Self> {
        Ok(Self {
            regular: parse_font(regular, "regular")?,
            bold: None,
            italic: None,
            bold_italic: None,
            monospace: None,
        })
    }

    /// Load every configured face from disk.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Font`] if a configured file is missing or invalid.
    pub fn load(paths: &FontPaths) -> RenderResult<Self> {
        let optional = |path: Option<&PathBuf>| path.map(|p| read_font(p)).transpose();
        let set = Self {
            regular: read_font(&paths.regular)?,
            bold: optional(paths.bold.as_ref())?,
            italic: optional(paths.italic.as_ref())?,
            bold_italic: optional(paths.bold_italic.as_ref())?,
            monospace: optional(paths.monospace.as_ref())?,
        };
        tracing::debug!(fonts = ?set, "Loaded font set");
        Ok(set)
    }

    fn select(&self, face: FontFace) -> Selected<'_> {
        let synth = |font, embolden, oblique| Selected {
            font,
            embolden,
            oblique,
        };
        if face.family == FontFamily::Monospace {
            let font = self.monospace.as_ref().unwrap_or(&self.regular);
            return synth(font, face.bold, face.italic);
        }
        match (face.bold, face.italic) {
            (false, false) => synth(&self.regular, false, false),
            (true, false) => self
                .bold
                .as_ref()
                .map_or_else(|| synth(&self.regular, true, false), |f| synth(f, false, false)),
            (false, true) => self
                .italic
                .as_ref()
                .map_or_else(|| synth(&self.regular, false, true), |f| synth(f, false, false)),
            (true, true) => {
                if let Some(font) = &self.bold_italic {
                    synth(font, false, false)
                } else if let Some(font) = &self.bold {
                    synth(font, false, true)
                } else if let Some(font) = &self.italic {
                    synth(font, true, false)
                } else {
                    synth(&self.regular, true, true)
                }
            }
        }
    }
}

fn read_font(path: &Path) -> RenderResult<FontArc> {
    let bytes = std::fs::read(path)
        .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
    parse_font(bytes, &path.display().to_string())
}

fn parse_font(bytes: Vec<u8>, name: &str) -> RenderResult<FontArc> {
    FontArc::try_from_vec(bytes).map_err(|e| RenderError::Font(format!("{name}: {e}")))
}

fn units_to_px(font: &FontArc, size: f32) -> f32 {
    size / font.units_per_em().unwrap_or(1000.0)
}

fn close_enough(a: ab_glyph::Point, b: ab_glyph::Point) -> bool {
    (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
}

impl FontProvider for FontSet {
    fn advance(&self, text: &str, face: FontFace, size: f32) -> f32 {
        let selected = self.select(face);
        let font = selected.font;
        let scale = units_to_px(font, size);
        let extra = if selected.embolden {
            size * EMBOLDEN_RATIO
        } else {
            0.0
        };

        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                width += font.kern_unscaled(prev, id) * scale;
            }
            width += font.h_advance_unscaled(id) * scale + extra;
            previous = Some(id);
        }
        width
    }

    fn shape(&self, text: &str, face: FontFace, size: f32, x: f32, baseline: f32) -> Option<ShapedText> {
        let selected = self.select(face);
        let font = selected.font;
        let scale = units_to_px(font, size);
        let skew = if selected.oblique { OBLIQUE_SKEW } else { 0.0 };
        let embolden = if selected.embolden {
            size * EMBOLDEN_RATIO
        } else {
            0.0
        };

        let mut builder = PathBuilder::new();
        let mut pen = x;
        let mut previous = None;

        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                pen += font.kern_unscaled(prev, id) * scale;
            }

            if let Some(outline) = font.outline(id) {
                // Font units are y-up; the surface is y-down.
                let map = |p: ab_glyph::Point| (pen + (p.x + p.y * skew) * scale, baseline - p.y * scale);
                let mut last: Option<ab_glyph::Point> = None;

                for curve in &outline.curves {
                    let (start, end) = match *curve {
                        OutlineCurve::Line(a, b) | OutlineCurve::Quad(a, _, b) | OutlineCurve::Cubic(a, _, _, b) => (a, b),
                    };
                    if !last.is_some_and(|l| close_enough(l, start)) {
                        if last.is_some() {
                            builder.close();
                        }
                        let (sx, sy) = map(start);
                        builder.move_to(sx, sy);
                    }
                    match *curve {
                        OutlineCurve::Line(_, b) => {
                            let (bx, by) = map(b);
                            builder.line_to(bx, by);
                        }
                        OutlineCurve::Quad(_, c, b) => {
                            let (cx, cy) = map(c);
                            let (bx, by) = map(b);
                            builder.quad_to(cx, cy, bx, by);
                        }
                        OutlineCurve::Cubic(_, c1, c2, b) => {
                            let (c1x, c1y) = map(c1);
                            let (c2x, c2y) = map(c2);
                            let (bx, by) = map(b);
                            builder.cubic_to(c1x, c1y, c2x, c2y, bx, by);
                        }
                    }
                    last = Some(end);
                }
                if last.is_some() {
                    builder.close();
                }
            }

            pen += font.h_advance_unscaled(id) * scale + embolden;
            previous = Some(id);
        }

        builder.finish().map(|path| ShapedText { path, embolden })
    }
}
