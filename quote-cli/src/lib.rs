//! # Haiku Quote CLI
//!
//! Renders a chat message into a quote sticker.
//!
//! ## Usage
//!
//! ```bash
//! haiku-quote --font NotoSans-Regular.ttf --first-name Matsuo --last-name Basho \
//!     -o pond.webp "an old silent pond a frog jumps into the pond splash silence again"
//! ```
//!
//! ## Haiku mode
//!
//! ```bash
//! echo "an old silent pond ..." | haiku-quote --font NotoSans-Regular.ttf --haiku -o pond.webp
//! ```
//!
//! With `--haiku` the text is only rendered when it scans as 5-7-5, reflowed
//! onto three lines.
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `QuoteConfig` - Resolved configuration for fonts, assets, avatars and output
//! - `haiku_message` - Haiku filter applied before rendering

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use quote_core::message::{DEFAULT_BACKGROUND, DEFAULT_HEIGHT, DEFAULT_SCALE, DEFAULT_WIDTH};
use quote_core::haiku::detect_haiku;
use quote_core::{Author, Message, QuoteRenderRequest, TextStyling};
use quote_renderer::avatar::DEFAULT_AVATAR_BASE;
use quote_renderer::{EmojiAssetConfig, FontPaths, OutputFormat, RendererConfig};

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_extension(value).ok_or_else(|| format!("unsupported format {value:?}, expected webp or png"))
}

/// Command-line arguments for haiku-quote.
#[derive(Debug, Clone, Parser)]
#[command(name = "haiku-quote")]
#[command(about = "Render a message as a quote sticker")]
#[command(version)]
pub struct CliArgs {
    /// Message text; read from stdin when neither this nor --message is given
    #[arg(conflicts_with = "message")]
    pub text: Option<String>,

    /// JSON file holding the full message (author, entities, avatar flag)
    #[arg(long)]
    pub message: Option<PathBuf>,

    /// Author id; selects the avatar color
    #[arg(long)]
    pub author_id: Option<i64>,

    /// Author first name
    #[arg(long)]
    pub first_name: Option<String>,

    /// Author last name
    #[arg(long)]
    pub last_name: Option<String>,

    /// Author username, also used to download the avatar
    #[arg(long)]
    pub username: Option<String>,

    /// Chat id; selects the name color
    #[arg(long)]
    pub chat_id: Option<i64>,

    /// Do not draw the author's avatar
    #[arg(long)]
    pub no_avatar: bool,

    /// Only render text that scans as a 5-7-5 haiku
    #[arg(long)]
    pub haiku: bool,

    /// Card background color
    #[arg(long, default_value = DEFAULT_BACKGROUND)]
    pub background: String,

    /// Pre-scale width budget in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// Pre-scale height budget in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// Render scale
    #[arg(long, default_value_t = DEFAULT_SCALE, allow_negative_numbers = true)]
    pub scale: f32,

    /// Output format (webp or png); defaults to the output file extension
    #[arg(long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Regular text font
    #[arg(long, env = "QUOTE_FONT_REGULAR")]
    pub font: PathBuf,

    /// Bold font; synthesized from the regular face when absent
    #[arg(long, env = "QUOTE_FONT_BOLD")]
    pub font_bold: Option<PathBuf>,

    /// Italic font; synthesized from the regular face when absent
    #[arg(long, env = "QUOTE_FONT_ITALIC")]
    pub font_italic: Option<PathBuf>,

    /// Bold italic font
    #[arg(long, env = "QUOTE_FONT_BOLD_ITALIC")]
    pub font_bold_italic: Option<PathBuf>,

    /// Monospace font for code
    #[arg(long, env = "QUOTE_FONT_MONO")]
    pub font_mono: Option<PathBuf>,

    /// JSON table of inline emoji images
    #[arg(long, env = "QUOTE_EMOJI_TABLE")]
    pub emoji_table: Option<PathBuf>,

    /// Directory of <key>.png / <key>.svg emoji images
    #[arg(long, env = "QUOTE_EMOJI_DIR")]
    pub emoji_dir: Option<PathBuf>,

    /// Base URL avatars are downloaded from
    #[arg(long, env = "QUOTE_AVATAR_URL", default_value = DEFAULT_AVATAR_BASE)]
    pub avatar_url: String,

    /// Never download avatars; always draw initials
    #[arg(long)]
    pub offline: bool,
}

/// Where the message comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageInput {
    /// A JSON message file.
    Json(PathBuf),
    /// Flags, with the text inline or on stdin.
    Inline {
        /// Text, `None` for stdin.
        text: Option<String>,
        /// Author built from the author flags.
        author: Option<Author>,
        /// Chat id.
        chat_id: Option<i64>,
        /// Whether to draw the avatar.
        avatar: bool,
    },
}

/// Resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    /// Message source.
    pub input: MessageInput,
    /// Card background color.
    pub background: String,
    /// Pre-scale width budget.
    pub width: u32,
    /// Pre-scale height budget.
    pub height: u32,
    /// Render scale.
    pub scale: f32,
    /// Skip text that is not a haiku.
    pub haiku_only: bool,
    /// Output file.
    pub output: PathBuf,
    /// Renderer settings.
    pub renderer: RendererConfig,
    /// Font files.
    pub fonts: FontPaths,
    /// Emoji image sources.
    pub emoji: EmojiAssetConfig,
    /// Avatar download base, `None` when offline.
    pub avatar_base: Option<String>,
}

impl From<CliArgs> for QuoteConfig {
    fn from(args: CliArgs) -> Self {
        let format = args
            .format
            .or_else(|| {
                args.output
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(OutputFormat::from_extension)
            })
            .unwrap_or_default();

        let input = match args.message {
            Some(path) => MessageInput::Json(path),
            None => {
                let named = args.first_name.is_some() || args.last_name.is_some() || args.username.is_some();
                let author = (named || args.author_id.is_some()).then(|| Author {
                    id: args.author_id.unwrap_or(1),
                    first_name: args.first_name,
                    last_name: args.last_name,
                    username: args.username,
                });
                MessageInput::Inline {
                    text: args.text,
                    author,
                    chat_id: args.chat_id,
                    avatar: !args.no_avatar,
                }
            }
        };

        Self {
            input,
            background: args.background,
            width: args.width,
            height: args.height,
            scale: args.scale,
            haiku_only: args.haiku,
            output: args.output,
            renderer: RendererConfig {
                format,
                ..RendererConfig::default()
            },
            fonts: FontPaths {
                regular: args.font,
                bold: args.font_bold,
                italic: args.font_italic,
                bold_italic: args.font_bold_italic,
                monospace: args.font_mono,
            },
            emoji: EmojiAssetConfig {
                table_path: args.emoji_table,
                asset_dir: args.emoji_dir,
            },
            avatar_base: (!args.offline).then_some(args.avatar_url),
        }
    }
}

impl QuoteConfig {
    /// Assemble the message, reading text from `stdin` when none was given.
    ///
    /// # Errors
    ///
    /// Returns an error if the message file or stdin cannot be read or parsed.
    pub fn message(&self, mut stdin: impl Read) -> anyhow::Result<Message> {
        match &self.input {
            MessageInput::Json(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading message file {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("parsing message file {}", path.display()))
            }
            MessageInput::Inline {
                text,
                author,
                chat_id,
                avatar,
            } => {
                let text = match text {
                    Some(text) => text.clone(),
                    None => {
                        let mut buf = String::new();
                        stdin.read_to_string(&mut buf).context("reading message text from stdin")?;
                        buf.trim_end_matches(['\n', '\r']).to_string()
                    }
                };
                Ok(Message {
                    chat_id: *chat_id,
                    author: author.clone(),
                    text,
                    entities: TextStyling::default(),
                    avatar_enabled: *avatar && author.is_some(),
                })
            }
        }
    }

    /// The render request for `message` under this configuration.
    #[must_use]
    pub fn request(&self, message: Message) -> QuoteRenderRequest {
        QuoteRenderRequest {
            background_color: self.background.clone(),
            message,
            width: self.width,
            height: self.height,
            scale: self.scale,
        }
    }
}

/// `message` reflowed onto three 5-7-5 lines, or `None` if it is no haiku.
///
/// Entities are dropped since their offsets no longer line up.
#[must_use]
pub fn haiku_message(message: &Message) -> Option<Message> {
    let lines = detect_haiku(&message.text)?;
    Some(Message {
        text: lines,
        entities: TextStyling::default(),
        ..message.clone()
    })
}
