//! Error types for quote text processing.

use thiserror::Error;

/// Result type for quote-core operations.
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Errors that can occur while preparing a quote for rendering.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Render scale must be strictly positive.
    #[error("Invalid scale {0}: scale must be greater than zero")]
    InvalidScale(f32),

    /// A color string could not be parsed.
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    /// An entity span points outside the text.
    #[error("Invalid entity range: offset {offset} + length {length} exceeds text length {text_len}")]
    InvalidEntityRange {
        /// Entity offset.
        offset: usize,
        /// Entity length.
        length: usize,
        /// Length of the text the entity was applied to.
        text_len: usize,
    },

    /// Message (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
