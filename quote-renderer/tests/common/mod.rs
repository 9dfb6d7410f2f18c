//! Shared fixtures for renderer integration tests.

#![allow(dead_code)]

#[path = "../../src/testing.rs"]
mod testing;

pub(crate) use testing::{pixel, BlockFont};

use quote_core::{Message, QuoteRenderRequest};

/// A request for `text` at `scale` with the default background.
pub fn request(text: &str, scale: f32) -> QuoteRenderRequest {
    let mut request = QuoteRenderRequest::new(Message::new(text));
    request.scale = scale;
    request
}
