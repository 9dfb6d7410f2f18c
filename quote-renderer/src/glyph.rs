//! Drawing laid-out text onto raster surfaces.

use quote_core::{build_runs, styled_characters, Rgb, StyleSet, StyleTag, TextStyling};
use tiny_skia::{
    Color, FillRule, FilterQuality, LineJoin, Paint, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::emoji_assets::EmojiLookup;
use crate::error::{RenderError, RenderResult};
use crate::font::FontProvider;
use crate::wrap::{wrap_runs, PlacedRun, TextBlockLayout, WrapConfig};

/// Fixed colors that override the caller's text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccentColors {
    /// Code and preformatted text.
    pub monospace: Rgb,
    /// Links, mentions, hashtags and the like.
    pub mention: Rgb,
}

impl Default for AccentColors {
    fn default() -> Self {
        Self {
            monospace: Rgb::from_u32(0x0058_87a7),
            mention: Rgb::from_u32(0x006a_b7ec),
        }
    }
}

impl AccentColors {
    /// Fill color for a run; mention beats monospace beats `base`.
    #[must_use]
    pub fn fill_for(&self, styles: StyleSet, base: Rgb) -> Rgb {
        if styles.contains(StyleTag::Mention) {
            self.mention
        } else if styles.contains(StyleTag::Monospace) {
            self.monospace
        } else {
            base
        }
    }
}

fn paint_for(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(color.r, color.g, color.b, 255));
    paint.anti_alias = true;
    paint
}

/// Draws placed runs with fonts and emoji images.
pub struct GlyphRenderer<'a> {
    fonts: &'a dyn FontProvider,
    emoji: Option<&'a dyn EmojiLookup>,
    accents: AccentColors,
}

impl<'a> GlyphRenderer<'a> {
    /// Create a renderer without emoji images.
    #[must_use]
    pub fn new(fonts: &'a dyn FontProvider, accents: AccentColors) -> Self {
        Self {
            fonts,
            emoji: None,
            accents,
        }
    }

    /// Use `emoji` for emoji runs.
    #[must_use]
    pub fn with_emoji(mut self, emoji: Option<&'a dyn EmojiLookup>) -> Self {
        self.emoji = emoji;
        self
    }

    /// Draw one run with its baseline at `baseline`.
    pub fn draw_run(&self, surface: &mut Pixmap, run: &PlacedRun, baseline: f32, font_size: f32, base: Rgb) {
        if let Some(emoji) = &run.emoji {
            // A missing image leaves the advance blank.
            let Some(image) = self.emoji.and_then(|lookup| lookup.lookup(&emoji.asset_key)) else {
                return;
            };
            #[allow(clippy::cast_precision_loss)]
            let transform = Transform::from_row(
                font_size / image.width() as f32,
                0.0,
                0.0,
                font_size / image.height() as f32,
                run.x,
                baseline - font_size + font_size * 0.15,
            );
            let paint = PixmapPaint {
                quality: FilterQuality::Bicubic,
                ..PixmapPaint::default()
            };
            let image: &Pixmap = &image;
            surface.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
            return;
        }

        let paint = paint_for(self.accents.fill_for(run.styles, base));

        if let Some(shaped) = self.fonts.shape(&run.text, run.face(), font_size, run.x, baseline) {
            surface.fill_path(&shaped.path, &paint, FillRule::Winding, Transform::identity(), None);
            if shaped.embolden > 0.0 {
                let stroke = Stroke {
                    width: shaped.embolden,
                    line_join: LineJoin::Round,
                    ..Stroke::default()
                };
                surface.stroke_path(&shaped.path, &paint, &stroke, Transform::identity(), None);
            }
        }

        let bar = font_size * 0.1;
        if run.styles.contains(StyleTag::Strikethrough) {
            if let Some(rect) = Rect::from_xywh(run.x, baseline - font_size / 2.8, run.width, bar) {
                surface.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
        if run.styles.contains(StyleTag::Underline) {
            if let Some(rect) = Rect::from_xywh(run.x, baseline + 2.0, run.width, bar) {
                surface.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
    }

    /// Render a laid-out block onto a surface of exactly its size.
    ///
    /// Returns `None` for a block with no area.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if the surface cannot be allocated.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_block(&self, layout: &TextBlockLayout, base: Rgb) -> RenderResult<Option<Pixmap>> {
        let width = layout.width.ceil().max(0.0) as u32;
        let height = layout.height.ceil().max(0.0) as u32;
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let mut surface = Pixmap::new(width, height).ok_or_else(|| {
            RenderError::Surface(format!("Cannot allocate {width}x{height} text block"))
        })?;
        for line in &layout.lines {
            for run in &line.runs {
                self.draw_run(&mut surface, run, line.baseline, layout.font_size, base);
            }
        }
        Ok(Some(surface))
    }

    /// Style, wrap and render `text` in one go.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range entities or an unallocatable surface.
    pub fn render_text(
        &self,
        text: &str,
        styling: &TextStyling,
        config: &WrapConfig,
        base: Rgb,
    ) -> RenderResult<Option<Pixmap>> {
        let chars = styled_characters(text, styling)?;
        let runs = build_runs(&chars);
        let layout = wrap_runs(&runs, config, self.fonts);
        self.render_block(&layout, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pixel, red_emoji_table, BlockFont};
    use quote_core::{Entity, EntityKind};

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    fn render(text: &str, styling: &TextStyling) -> Pixmap {
        GlyphRenderer::new(&BlockFont, AccentColors::default())
            .render_text(text, styling, &WrapConfig::new(10.0, 1000.0, 1000.0), Rgb::WHITE)
            .unwrap()
            .unwrap()
    }

    fn spans(kinds: &[(EntityKind, usize, usize)]) -> TextStyling {
        TextStyling::Entities(
            kinds
                .iter()
                .map(|&(kind, offset, length)| Entity::new(kind, offset, length))
                .collect(),
        )
    }

    #[test]
    fn test_accent_precedence() {
        let accents = AccentColors::default();
        let both: StyleSet = [StyleTag::Monospace, StyleTag::Mention].into_iter().collect();
        assert_eq!(accents.fill_for(both, Rgb::WHITE).to_hex(), "#6ab7ec");
        assert_eq!(
            accents
                .fill_for(StyleSet::single(StyleTag::Monospace), Rgb::WHITE)
                .to_hex(),
            "#5887a7"
        );
        assert_eq!(
            accents.fill_for(StyleSet::single(StyleTag::Bold), Rgb::BLACK),
            Rgb::BLACK
        );
    }

    #[test]
    fn test_block_surface_matches_layout() {
        let surface = render("Hello", &TextStyling::default());
        assert_eq!((surface.width(), surface.height()), (25, 20));
        assert_eq!(pixel(&surface, 2, 6), WHITE);
        assert_eq!(pixel(&surface, 2, 15)[3], 0);
    }

    #[test]
    fn test_mention_color() {
        let surface = render("ab", &spans(&[(EntityKind::Url, 0, 1), (EntityKind::Code, 0, 2)]));
        assert_eq!(pixel(&surface, 2, 6), [0x6a, 0xb7, 0xec, 255]);
        // Monospace cells are 6 wide.
        assert_eq!(pixel(&surface, 8, 6), [0x58, 0x87, 0xa7, 255]);
    }

    #[test]
    fn test_underline_below_baseline() {
        let plain = render("ab", &TextStyling::default());
        assert_eq!(pixel(&plain, 2, 12)[3], 0);

        let underlined = render("ab", &spans(&[(EntityKind::Underline, 0, 2)]));
        assert_eq!(pixel(&underlined, 2, 12), WHITE);
    }

    #[test]
    fn test_strikethrough_crosses_spaces() {
        let plain = render("a b", &TextStyling::default());
        assert_eq!(pixel(&plain, 7, 6)[3], 0);

        let struck = render("a b", &spans(&[(EntityKind::Strikethrough, 0, 3)]));
        assert!(pixel(&struck, 7, 6)[3] > 0);
    }

    #[test]
    fn test_emoji_blit_and_miss() {
        let table = red_emoji_table("1f600");
        let renderer = GlyphRenderer::new(&BlockFont, AccentColors::default())
            .with_emoji(Some(&table as &dyn EmojiLookup));
        let config = WrapConfig::new(10.0, 1000.0, 1000.0);

        let hit = renderer
            .render_text("😀", &TextStyling::default(), &config, Rgb::WHITE)
            .unwrap()
            .unwrap();
        assert_eq!((hit.width(), hit.height()), (10, 20));
        let [r, g, _, a] = pixel(&hit, 5, 6);
        assert!(r > 250 && g < 5 && a > 250);

        let miss = renderer
            .render_text("😃", &TextStyling::default(), &config, Rgb::WHITE)
            .unwrap()
            .unwrap();
        assert_eq!(miss.width(), 10);
        assert_eq!(pixel(&miss, 5, 6)[3], 0);
    }

    #[test]
    fn test_empty_text_has_no_surface() {
        let renderer = GlyphRenderer::new(&BlockFont, AccentColors::default());
        let config = WrapConfig::new(10.0, 1000.0, 1000.0);
        assert!(renderer
            .render_text("", &TextStyling::default(), &config, Rgb::WHITE)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_bad_entity_is_rejected() {
        let renderer = GlyphRenderer::new(&BlockFont, AccentColors::default());
        let config = WrapConfig::new(10.0, 1000.0, 1000.0);
        let result = renderer.render_text(
            "ab",
            &spans(&[(EntityKind::Bold, 1, 5)]),
            &config,
            Rgb::WHITE,
        );
        assert!(matches!(result, Err(RenderError::Quote(_))));
    }
}
