//! # haiku-quote
//!
//! Renders a message into a quote sticker file.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use quote_cli::{haiku_message, CliArgs, QuoteConfig};
use quote_renderer::{
    AvatarCache, AvatarResolver, EmojiAssetStore, EmojiLookup, FontProvider, FontSet,
    HttpAvatarFetcher, QuoteRenderer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,quote_renderer=debug,quote_core=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quote_renderer=debug,quote_core=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = QuoteConfig::from(CliArgs::parse());

    let mut message = config.message(std::io::stdin().lock())?;
    if config.haiku_only {
        match haiku_message(&message) {
            Some(haiku) => message = haiku,
            None => {
                tracing::info!("Text is not a haiku, nothing to render");
                return Ok(());
            }
        }
    }

    let fonts: Arc<dyn FontProvider> = Arc::new(
        FontSet::load(&config.fonts)
            .with_context(|| format!("loading fonts from {}", config.fonts.regular.display()))?,
    );
    let emoji: Arc<dyn EmojiLookup> = Arc::new(EmojiAssetStore::new(config.emoji.clone()));

    let mut avatars = AvatarResolver::new(Arc::clone(&fonts), AvatarCache::default())
        .with_emoji(Some(Arc::clone(&emoji)));
    if let Some(base) = &config.avatar_base {
        let fetcher = HttpAvatarFetcher::new(base).context("configuring avatar download")?;
        avatars = avatars.with_fetcher(Arc::new(fetcher));
    }

    let renderer = QuoteRenderer::new(config.renderer.clone(), fonts)
        .with_emoji(emoji)
        .with_avatars(avatars);

    let request = config.request(message);
    let encoded = renderer.render(&request).await.context("rendering quote")?;

    tokio::fs::write(&config.output, &encoded.data)
        .await
        .with_context(|| format!("writing {}", config.output.display()))?;

    tracing::info!(
        path = %config.output.display(),
        width = encoded.width,
        height = encoded.height,
        mime = encoded.format.mime_type(),
        bytes = encoded.data.len(),
        "Wrote quote sticker"
    );
    Ok(())
}
