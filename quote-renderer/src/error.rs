//! Renderer error types.

use quote_core::QuoteError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering a quote card.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The request was rejected by the text pipeline.
    #[error(transparent)]
    Quote(#[from] QuoteError),

    /// A font could not be loaded.
    #[error("Font error: {0}")]
    Font(String),

    /// A raster surface could not be allocated.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Encoding the final image failed.
    #[error("Export failed: {0}")]
    Export(String),
}
