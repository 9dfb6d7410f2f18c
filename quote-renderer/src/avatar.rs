//! Author avatars: download, initials fallback and the circular crop.
//!
//! [`AvatarResolver::resolve`] never fails. A failed or unavailable download
//! degrades to a synthesized initials avatar, and results are kept in an
//! injected [`AvatarCache`] keyed by author id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quote_core::color::parse_color;
use quote_core::{user_avatar_color, Author, Rgb, TextStyling};
use reqwest::Client;
use thiserror::Error;
use tiny_skia::{FillRule, FilterQuality, Mask, PathBuilder, Pixmap, PixmapPaint, Transform};
use url::Url;

use crate::cache::{CacheConfig, FlightCache};
use crate::emoji_assets::EmojiLookup;
use crate::error::{RenderError, RenderResult};
use crate::font::FontProvider;
use crate::glyph::{AccentColors, GlyphRenderer};
use crate::image::{decode_pixmap, solid_square};
use crate::wrap::WrapConfig;

/// Public userpic mirror used when no base URL is configured.
pub const DEFAULT_AVATAR_BASE: &str = "https://telega.one/i/userpic/320/";

/// Edge length of synthesized avatars.
pub const INITIALS_AVATAR_SIZE: u32 = 500;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Limits of the avatar cache.
pub type AvatarCacheConfig = CacheConfig;

/// Circular avatars by author id; `None` records a failed synthesis.
pub type AvatarCache = FlightCache<i64, Option<Arc<Pixmap>>>;

/// Errors from an avatar download. These never leave the resolver.
#[derive(Debug, Error)]
pub enum AvatarFetchError {
    /// The author has nothing to download.
    #[error("author has no avatar available")]
    Unavailable,
    /// HTTP layer failed (connection, timeout, status).
    #[error("avatar request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The configured base URL is unusable.
    #[error("invalid avatar base URL: {0}")]
    InvalidUrl(String),
}

/// Source of avatar image bytes.
#[async_trait]
pub trait AvatarFetcher: Send + Sync {
    /// Encoded image bytes for `author`.
    async fn fetch(&self, author: &Author) -> Result<Vec<u8>, AvatarFetchError>;
}

/// Downloads `<base>/<username>.jpg`.
#[derive(Debug, Clone)]
pub struct HttpAvatarFetcher {
    http: Client,
    base: Url,
}

impl HttpAvatarFetcher {
    /// Create a fetcher rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AvatarFetchError::InvalidUrl`] if the URL cannot be parsed or
    /// cannot carry a path, and [`AvatarFetchError::Http`] if the client fails
    /// to build.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, AvatarFetchError> {
        let base = Url::parse(base_url.as_ref())
            .map_err(|e| AvatarFetchError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(AvatarFetchError::InvalidUrl(base.to_string()));
        }

        let http = Client::builder()
            .user_agent(concat!("haiku-quote/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()?;

        Ok(Self { http, base })
    }

    /// Address of `username`'s picture.
    ///
    /// # Errors
    ///
    /// Returns [`AvatarFetchError::InvalidUrl`] if the base cannot carry a path.
    pub fn url_for(&self, username: &str) -> Result<Url, AvatarFetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| AvatarFetchError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push(&format!("{username}.jpg"));
        Ok(url)
    }
}

#[async_trait]
impl AvatarFetcher for HttpAvatarFetcher {
    async fn fetch(&self, author: &Author) -> Result<Vec<u8>, AvatarFetchError> {
        let username = author
            .username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(AvatarFetchError::Unavailable)?;

        let url = self.url_for(username)?;
        tracing::debug!(%url, "Downloading avatar");
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Square `source` cropped to the inscribed circle, as tall as the source.
///
/// # Errors
///
/// Returns [`RenderError::Surface`] if the surface or mask cannot be allocated.
#[allow(clippy::cast_precision_loss)]
pub fn make_disc(source: &Pixmap) -> RenderResult<Pixmap> {
    let size = source.height();
    let mut disc = Pixmap::new(size, size)
        .ok_or_else(|| RenderError::Surface(format!("Cannot allocate {size}px avatar")))?;
    let mut mask = Mask::new(size, size)
        .ok_or_else(|| RenderError::Surface(format!("Cannot allocate {size}px avatar mask")))?;

    let edge = size as f32;
    let radius = edge / 2.0;
    let circle = PathBuilder::from_circle(radius, radius, radius)
        .ok_or_else(|| RenderError::Surface("Degenerate avatar circle".to_string()))?;
    mask.fill_path(&circle, FillRule::Winding, true, Transform::identity());

    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    let transform = Transform::from_scale(
        edge / source.width() as f32,
        edge / source.height() as f32,
    );
    disc.draw_pixmap(0, 0, source.as_ref(), &paint, transform, Some(&mask));
    Ok(disc)
}

/// Square avatar in the author's palette color with white initials.
///
/// # Errors
///
/// Returns an error if the palette color fails to parse or a surface cannot
/// be allocated.
#[allow(clippy::cast_precision_loss)]
pub fn synthesize_initials(
    author: &Author,
    fonts: &dyn FontProvider,
    emoji: Option<&dyn EmojiLookup>,
) -> RenderResult<Pixmap> {
    let size = INITIALS_AVATAR_SIZE as f32;
    let mut square = solid_square(INITIALS_AVATAR_SIZE, parse_color(user_avatar_color(author.id))?)?;

    let config = WrapConfig {
        font_size: size / 2.0,
        text_x: 0.0,
        text_y: size,
        max_width: size * 5.0,
        max_height: size * 5.0,
    };
    let letters = GlyphRenderer::new(fonts, AccentColors::default())
        .with_emoji(emoji)
        .render_text(&author.initials(), &TextStyling::default(), &config, Rgb::WHITE)?;

    if let Some(letters) = letters {
        let x = (size - letters.width() as f32) / 2.0;
        let y = (size - letters.height() as f32) / 1.5;
        square.draw_pixmap(
            0,
            0,
            letters.as_ref(),
            &PixmapPaint::default(),
            Transform::from_translate(x, y),
            None,
        );
    }
    Ok(square)
}

/// Resolves circular avatars, downloading when possible.
pub struct AvatarResolver {
    fetcher: Option<Arc<dyn AvatarFetcher>>,
    cache: AvatarCache,
    fonts: Arc<dyn FontProvider>,
    emoji: Option<Arc<dyn EmojiLookup>>,
}

impl std::fmt::Debug for AvatarResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarResolver")
            .field("fetcher", &self.fetcher.is_some())
            .field("cache_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl AvatarResolver {
    /// Create a resolver that only synthesizes.
    #[must_use]
    pub fn new(fonts: Arc<dyn FontProvider>, cache: AvatarCache) -> Self {
        Self {
            fetcher: None,
            cache,
            fonts,
            emoji: None,
        }
    }

    /// Download avatars with `fetcher` before falling back to initials.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn AvatarFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Draw emoji initials with `emoji`.
    #[must_use]
    pub fn with_emoji(mut self, emoji: Option<Arc<dyn EmojiLookup>>) -> Self {
        self.emoji = emoji;
        self
    }

    /// The cache this resolver fills.
    #[must_use]
    pub fn cache(&self) -> &AvatarCache {
        &self.cache
    }

    /// Circular avatar for `author`, or `None` if even synthesis failed.
    #[tracing::instrument(skip(self, author), fields(author_id = author.id))]
    pub async fn resolve(&self, author: &Author) -> Option<Arc<Pixmap>> {
        self.cache.get_or_init(author.id, || self.load(author)).await
    }

    async fn load(&self, author: &Author) -> Option<Arc<Pixmap>> {
        let square = match self.download(author).await {
            Some(photo) => photo,
            None => match synthesize_initials(author, self.fonts.as_ref(), self.emoji.as_deref()) {
                Ok(square) => square,
                Err(e) => {
                    tracing::warn!(error = %e, "Unable to synthesize avatar");
                    return None;
                }
            },
        };

        match make_disc(&square) {
            Ok(disc) => Some(Arc::new(disc)),
            Err(e) => {
                tracing::warn!(error = %e, "Unable to crop avatar");
                None
            }
        }
    }

    async fn download(&self, author: &Author) -> Option<Pixmap> {
        let fetcher = self.fetcher.as_ref()?;
        let bytes = match fetcher.fetch(author).await {
            Ok(bytes) => bytes,
            Err(AvatarFetchError::Unavailable) => {
                tracing::debug!("No avatar to download, using initials");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Avatar download failed, using initials");
                return None;
            }
        };
        match decode_pixmap(&bytes) {
            Ok(photo) => Some(photo),
            Err(e) => {
                tracing::warn!(error = %e, "Downloaded avatar is not an image, using initials");
                None
            }
        }
    }
}
