//! # Quote Renderer
//!
//! Raster backend for quote cards, built on tiny-skia.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────────┐   ┌───────────┐
//! │ quote-core   │──►│ wrap_runs  │──►│ GlyphRenderer│──►│           │
//! │ runs         │   │ (lines)    │   │ (name, text) │   │ compose   │──► encode
//! └──────────────┘   └────────────┘   └──────────────┘   │ _quote    │   (WebP/PNG)
//!                        AvatarResolver (disc) ─────────►│           │
//!                                                        └───────────┘
//! ```
//!
//! Everything except avatar download is synchronous and CPU-bound.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod avatar;
pub mod cache;
pub mod composite;
pub mod emoji_assets;
pub mod error;
pub mod export;
pub mod font;
pub mod glyph;
pub mod image;
pub mod wrap;

#[cfg(test)]
extern crate self as quote_renderer;

#[cfg(test)]
mod testing;

pub use avatar::{
    AvatarCache, AvatarCacheConfig, AvatarFetchError, AvatarFetcher, AvatarResolver,
    HttpAvatarFetcher,
};
pub use cache::{CacheConfig, CacheStats, FlightCache};
pub use composite::{compose_quote, CardLayers};
pub use emoji_assets::{EmojiAssetConfig, EmojiAssetStore, EmojiLookup};
pub use error::{RenderError, RenderResult};
pub use export::{EncodedImage, OutputFormat};
pub use font::{FontFace, FontFamily, FontPaths, FontProvider, FontSet};
pub use glyph::{AccentColors, GlyphRenderer};
pub use wrap::{wrap_runs, TextBlockLayout, WrapConfig};

use std::sync::Arc;

use quote_core::color::parse_color;
use quote_core::{normalize, user_color, QuoteRenderRequest, Rgb, StyleTag, TextStyling};
use tiny_skia::Pixmap;

/// Configuration for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Width of the output bounding box.
    pub max_output_width: u32,
    /// Height of the output bounding box.
    pub max_output_height: u32,
    /// Output encoding.
    pub format: OutputFormat,
    /// Pre-scale font size of the author name.
    pub name_font_size: f32,
    /// Pre-scale font size of the message text.
    pub text_font_size: f32,
    /// Colors for monospace and mention runs.
    pub accents: AccentColors,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_output_width: 512,
            max_output_height: 512,
            format: OutputFormat::WebP,
            name_font_size: 22.0,
            text_font_size: 24.0,
            accents: AccentColors::default(),
        }
    }
}

/// Renders quote requests into encoded stickers.
pub struct QuoteRenderer {
    config: RendererConfig,
    fonts: Arc<dyn FontProvider>,
    emoji: Option<Arc<dyn EmojiLookup>>,
    avatars: Option<AvatarResolver>,
}

impl std::fmt::Debug for QuoteRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteRenderer")
            .field("config", &self.config)
            .field("emoji", &self.emoji.is_some())
            .field("avatars", &self.avatars)
            .finish_non_exhaustive()
    }
}

impl QuoteRenderer {
    /// Create a renderer without emoji images or avatars.
    #[must_use]
    pub fn new(config: RendererConfig, fonts: Arc<dyn FontProvider>) -> Self {
        Self {
            config,
            fonts,
            emoji: None,
            avatars: None,
        }
    }

    /// Draw emoji with images from `emoji`.
    #[must_use]
    pub fn with_emoji(mut self, emoji: Arc<dyn EmojiLookup>) -> Self {
        self.emoji = Some(emoji);
        self
    }

    /// Resolve avatars with `avatars` for messages that ask for one.
    #[must_use]
    pub fn with_avatars(mut self, avatars: AvatarResolver) -> Self {
        self.avatars = Some(avatars);
        self
    }

    /// The renderer configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Render `request` and encode it within the output box.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid scale, color or entity range, or when
    /// a surface cannot be allocated or encoded. Avatar and emoji problems
    /// are never errors.
    #[tracing::instrument(
        skip(self, request),
        fields(
            author_id = ?request.message.author.as_ref().map(|a| a.id),
            width = request.width,
            height = request.height,
            scale = request.scale,
        )
    )]
    pub async fn render(&self, request: &QuoteRenderRequest) -> RenderResult<EncodedImage> {
        request.effective_scale()?;

        let avatar = match (&self.avatars, &request.message.author) {
            (Some(resolver), Some(author)) if request.message.avatar_enabled => {
                resolver.resolve(author).await
            }
            _ => None,
        };

        let card = self.render_canvas(request, avatar.as_deref())?;
        export::encode(
            &card,
            self.config.max_output_width,
            self.config.max_output_height,
            self.config.format,
        )
    }

    /// Draw the full-size card for `request` with an already resolved avatar.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid scale, color or entity range, or when
    /// a surface cannot be allocated.
    #[allow(clippy::cast_precision_loss)]
    pub fn render_canvas(
        &self,
        request: &QuoteRenderRequest,
        avatar: Option<&Pixmap>,
    ) -> RenderResult<Pixmap> {
        let scale = request.effective_scale()?;
        let background = parse_color(&normalize(&request.background_color)?)?;
        let light = background.is_light();
        let (text, styling) = request.message.capped_text()?;

        let width = request.width as f32 * scale;
        let height = request.height as f32 * scale;
        let glyphs = GlyphRenderer::new(self.fonts.as_ref(), self.config.accents)
            .with_emoji(self.emoji.as_deref());

        let name = match &request.message.author {
            Some(author) => {
                tracing::debug!("Drawing name");
                let size = self.config.name_font_size * scale;
                let color = parse_color(user_color(request.message.chat_id.unwrap_or(1), light))?;
                glyphs.render_text(
                    &author.display_name(),
                    &TextStyling::Global(StyleTag::Bold),
                    &WrapConfig::new(size, width, size),
                    color,
                )?
            }
            None => None,
        };

        let body = if text.is_empty() {
            None
        } else {
            tracing::debug!(chars = text.chars().count(), "Drawing message");
            let size = self.config.text_font_size * scale;
            let color = if light { Rgb::BLACK } else { Rgb::WHITE };
            glyphs.render_text(&text, &styling, &WrapConfig::new(size, width, height - size), color)?
        };

        compose_quote(&CardLayers {
            avatar,
            name: name.as_ref(),
            text: body.as_ref(),
            background,
            scale,
        })
    }
}

/// Renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
