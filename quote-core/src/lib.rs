//! # Quote Core
//!
//! Text pipeline for haiku quote cards. Everything here is pure and
//! allocation-local: no raster surfaces, no I/O, no process-wide mutable
//! state beyond constant tables.
//!
//! ## Pipeline
//!
//! ```text
//! text + entities ──► resolve_styles ──┐
//!                                      ├─► StyledCharacter[] ──► build_runs ──► Run[]
//! text ────────────► find_emoji ───────┘
//! ```
//!
//! Colors and per-user palettes live alongside, since the renderer and the
//! avatar synthesizer both draw from them.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod emoji;
pub mod entity;
pub mod error;
pub mod haiku;
pub mod message;
pub mod palette;
pub mod run;
pub mod style;

pub use color::{is_light, lighten, normalize, Rgb};
pub use emoji::{find_emoji, EmojiMatch};
pub use entity::{Entity, EntityKind, StyleSet, StyleTag, TextStyling};
pub use error::{QuoteError, QuoteResult};
pub use message::{Author, Message, QuoteRenderRequest};
pub use palette::{palette_index, user_avatar_color, user_color, user_palette, PaletteEntry};
pub use run::{build_runs, Run, RunKind};
pub use style::{resolve_styles, styled_characters, EmojiRef, StyledCharacter};

/// Quote core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
