//! Arranging the avatar, name and text blocks into one card.
//!
//! ```text
//!  ◄─ column ─►◄──────────── panel ─────────────►
//! ┌────────────╭──────────────────────────────────╮
//! │            │ indent  name                     │
//! │  ◯ avatar  │ indent  text text text text      │
//! │            │         text text                │
//! └────────────╰──────────────────────────────────╯
//! ```
//!
//! Every offset is a fixed multiple of the render scale.

use quote_core::Rgb;
use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Transform};

use crate::error::{RenderError, RenderResult};

/// Width of the avatar column, pre-scale.
const AVATAR_COLUMN: f32 = 55.0;
/// Padding around blocks, pre-scale.
const INDENT: f32 = 15.0;
/// Avatar edge length, pre-scale.
const AVATAR_SIZE: f32 = 50.0;
/// Corner radius of the panel, pre-scale.
const PANEL_RADIUS: f32 = 25.0;

/// Cubic Bézier handle length approximating a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Axis-aligned placement of one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

/// Where every layer of a card goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardGeometry {
    /// Card width.
    pub width: f32,
    /// Card height.
    pub height: f32,
    /// Avatar disc.
    pub avatar: Option<Placement>,
    /// Rounded background panel, present with a name.
    pub panel: Option<Placement>,
    /// Panel corner radius.
    pub panel_radius: f32,
    /// Name block.
    pub name: Option<Placement>,
    /// Text block.
    pub text: Option<Placement>,
}

#[allow(clippy::cast_precision_loss)]
fn size_of(pixmap: &Pixmap) -> (f32, f32) {
    (pixmap.width() as f32, pixmap.height() as f32)
}

/// Compute the card layout from the block sizes.
#[must_use]
pub fn card_geometry(
    has_avatar: bool,
    name: Option<(f32, f32)>,
    text: Option<(f32, f32)>,
    scale: f32,
) -> CardGeometry {
    let column = AVATAR_COLUMN * scale;
    let indent = INDENT * scale;
    let avatar_size = AVATAR_SIZE * scale;

    let name_w = name.map_or(0.0, |(w, _)| w);
    let text_w = text.map_or(0.0, |(w, _)| w + indent);
    let mut width = name_w.max(text_w) + column + 2.0 * indent;

    let mut height = match (name, text) {
        (Some((_, nh)), Some((_, th))) => nh + th,
        (Some((_, nh)), None) => nh + indent,
        (None, Some((_, th))) => indent + th,
        (None, None) => 2.0 * indent,
    };

    let name_place = name.map(|(w, h)| Placement {
        x: column + indent,
        y: indent,
        width: w,
        height: h,
    });
    let text_place = text.map(|(w, h)| Placement {
        x: column + indent,
        y: name.map_or(indent, |(_, nh)| nh),
        width: w,
        height: h,
    });
    let avatar_place = has_avatar.then_some(Placement {
        x: 0.0,
        y: indent,
        width: avatar_size,
        height: avatar_size,
    });

    // Never smaller than any layer.
    for place in [name_place, text_place, avatar_place].into_iter().flatten() {
        width = width.max(place.x + place.width);
        height = height.max(place.y + place.height);
    }

    CardGeometry {
        width,
        height,
        avatar: avatar_place,
        panel: name.map(|_| Placement {
            x: column,
            y: 0.0,
            width: width - column,
            height,
        }),
        panel_radius: PANEL_RADIUS * scale,
        name: name_place,
        text: text_place,
    }
}

/// Closed rounded rectangle, the radius clamped to half the shorter side.
#[must_use]
pub fn rounded_rect_path(place: Placement, radius: f32) -> Option<Path> {
    let Placement {
        x,
        y,
        width: w,
        height: h,
    } = place;
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    let k = r * KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Layers of a quote card.
#[derive(Debug, Clone, Copy)]
pub struct CardLayers<'a> {
    /// Circular avatar image, drawn scaled to the avatar size.
    pub avatar: Option<&'a Pixmap>,
    /// Rendered name block.
    pub name: Option<&'a Pixmap>,
    /// Rendered message text block.
    pub text: Option<&'a Pixmap>,
    /// Panel color.
    pub background: Rgb,
    /// Render scale.
    pub scale: f32,
}

fn draw_at(surface: &mut Pixmap, layer: &Pixmap, place: Placement) {
    let (w, h) = size_of(layer);
    let transform = Transform::from_row(place.width / w, 0.0, 0.0, place.height / h, place.x, place.y);
    surface.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), transform, None);
}

/// Compose the card from its layers.
///
/// # Errors
///
/// Returns [`RenderError::Surface`] if the card surface cannot be allocated.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compose_quote(layers: &CardLayers<'_>) -> RenderResult<Pixmap> {
    let geometry = card_geometry(
        layers.avatar.is_some(),
        layers.name.map(size_of),
        layers.text.map(size_of),
        layers.scale,
    );

    let width = geometry.width.ceil().max(1.0) as u32;
    let height = geometry.height.ceil().max(1.0) as u32;
    let mut surface = Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Surface(format!("Cannot allocate {width}x{height} card")))?;

    if let (Some(avatar), Some(place)) = (layers.avatar, geometry.avatar) {
        let mut paint = PixmapPaint::default();
        paint.quality = tiny_skia::FilterQuality::Bicubic;
        let (w, h) = size_of(avatar);
        let transform = Transform::from_row(place.width / w, 0.0, 0.0, place.height / h, place.x, place.y);
        surface.draw_pixmap(0, 0, avatar.as_ref(), &paint, transform, None);
    }

    if let Some(panel) = geometry.panel {
        if let Some(path) = rounded_rect_path(panel, geometry.panel_radius) {
            let mut paint = Paint::default();
            let bg = layers.background;
            paint.set_color(Color::from_rgba8(bg.r, bg.g, bg.b, 255));
            paint.anti_alias = true;
            surface.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    if let (Some(name), Some(place)) = (layers.name, geometry.name) {
        draw_at(&mut surface, name, place);
    }
    if let (Some(text), Some(place)) = (layers.text, geometry.text) {
        draw_at(&mut surface, text, place);
    }

    tracing::debug!(width, height, "Composed quote card");
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pixel;

    fn block(width: u32, height: u32, rgba: [u8; 4]) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        pixmap.fill(Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
        pixmap
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_geometry_name_and_text() {
        let g = card_geometry(false, Some((40.0, 20.0)), Some((60.0, 30.0)), 1.0);
        // max(40, 60 + 15) + 55 + 2 * 15
        assert!(approx(g.width, 160.0));
        assert!(approx(g.height, 50.0));
        let panel = g.panel.unwrap();
        assert!(approx(panel.x, 55.0) && approx(panel.width, 105.0) && approx(panel.height, 50.0));
        let name = g.name.unwrap();
        assert!(approx(name.x, 70.0) && approx(name.y, 15.0));
        let text = g.text.unwrap();
        assert!(approx(text.x, 70.0) && approx(text.y, 20.0));
        assert!(g.avatar.is_none());
    }

    #[test]
    fn test_geometry_text_only_has_no_panel() {
        let g = card_geometry(false, None, Some((100.0, 40.0)), 2.0);
        // max(0, 100 + 30) + 110 + 60
        assert!(approx(g.width, 300.0));
        assert!(approx(g.height, 70.0));
        assert!(g.panel.is_none());
        assert!(approx(g.text.unwrap().y, 30.0));
    }

    #[test]
    fn test_geometry_name_only_and_empty() {
        let g = card_geometry(false, Some((80.0, 44.0)), None, 1.0);
        assert!(approx(g.height, 59.0));
        assert!(approx(g.width, 80.0 + 55.0 + 30.0));

        let empty = card_geometry(false, None, None, 1.0);
        assert!(approx(empty.width, 85.0));
        assert!(approx(empty.height, 30.0));
    }

    #[test]
    fn test_geometry_grows_to_fit_avatar() {
        let g = card_geometry(true, Some((40.0, 20.0)), Some((60.0, 30.0)), 1.0);
        let avatar = g.avatar.unwrap();
        assert!(approx(avatar.y, 15.0) && approx(avatar.width, 50.0));
        assert!(approx(g.height, 65.0));
        assert!(approx(g.panel.unwrap().height, 65.0));
    }

    #[test]
    fn test_rounded_rect_clamps_radius() {
        let place = Placement {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 40.0,
        };
        let path = rounded_rect_path(place, 25.0).unwrap();
        let bounds = path.bounds();
        assert!(approx(bounds.width(), 10.0) && approx(bounds.height(), 40.0));
    }

    #[test]
    fn test_compose_draws_layers_in_order() {
        let avatar = block(10, 10, [255, 0, 0, 255]);
        let name = block(40, 20, [0, 255, 0, 255]);
        let text = block(60, 30, [0, 0, 255, 255]);
        let card = compose_quote(&CardLayers {
            avatar: Some(&avatar),
            name: Some(&name),
            text: Some(&text),
            background: Rgb::new(10, 20, 30),
            scale: 1.0,
        })
        .unwrap();

        assert_eq!((card.width(), card.height()), (160, 65));
        let [r, g, _, a] = pixel(&card, 25, 40);
        assert!(r > 250 && g < 5 && a > 250);
        assert_eq!(pixel(&card, 75, 17), [0, 255, 0, 255]);
        // Text is drawn over the lower part of the name block.
        assert_eq!(pixel(&card, 75, 25), [0, 0, 255, 255]);
        assert_eq!(pixel(&card, 150, 40), [10, 20, 30, 255]);
        // Rounded corner of the panel.
        assert_eq!(pixel(&card, 56, 0)[3], 0);
        // Avatar column outside the avatar.
        assert_eq!(pixel(&card, 25, 5)[3], 0);
    }

    #[test]
    fn test_compose_without_name_skips_panel() {
        let text = block(20, 10, [255, 255, 255, 255]);
        let card = compose_quote(&CardLayers {
            avatar: None,
            name: None,
            text: Some(&text),
            background: Rgb::new(10, 20, 30),
            scale: 1.0,
        })
        .unwrap();
        assert_eq!((card.width(), card.height()), (120, 25));
        assert_eq!(pixel(&card, 100, 5)[3], 0);
        assert_eq!(pixel(&card, 75, 20), [255, 255, 255, 255]);
    }
}
