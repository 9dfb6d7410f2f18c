//! Message input and render request types.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::entity::{Entity, TextStyling};
use crate::error::{QuoteError, QuoteResult};

/// Default pre-scale card width in pixels.
pub const DEFAULT_WIDTH: u32 = 512;
/// Default pre-scale card height in pixels.
pub const DEFAULT_HEIGHT: u32 = 512;
/// Default render scale.
pub const DEFAULT_SCALE: f32 = 2.0;
/// Upper bound on the render scale.
pub const MAX_SCALE: f32 = 20.0;
/// Characters of message text considered for rendering.
pub const MAX_TEXT_CHARS: usize = 4096;
/// Default card background.
pub const DEFAULT_BACKGROUND: &str = "#1b1429";

/// The author of a quoted message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    /// Numeric identity of the author.
    pub id: i64,
    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Username without the leading `@`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Author {
    /// Create an author with only an id.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Set the first and last name.
    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: Option<&str>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = last.map(str::to_string);
        self
    }

    /// Set the username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// The name shown above the quote.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (non_empty(self.first_name.as_deref()), non_empty(self.last_name.as_deref())) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            _ => non_empty(self.username.as_deref()).map_or_else(|| "Anonymous".to_string(), str::to_string),
        }
    }

    /// Initials for a synthesized avatar.
    ///
    /// First letters of first and last name when both exist; otherwise the
    /// first letters of the first and last word of the first name (or the
    /// username), or just the first letter for a single word. Letters are
    /// whole grapheme clusters, so multi-code-point characters survive.
    #[must_use]
    pub fn initials(&self) -> String {
        let letters = match (non_empty(self.first_name.as_deref()), non_empty(self.last_name.as_deref())) {
            (Some(first), Some(last)) => format!("{}{}", first_grapheme(first), first_grapheme(last)),
            (first, _) => {
                let source = first.or_else(|| non_empty(self.username.as_deref())).unwrap_or("?");
                let words: Vec<&str> = source.split_whitespace().collect();
                match words.as_slice() {
                    [] => "?".to_string(),
                    [only] => first_grapheme(only).to_string(),
                    [head, .., tail] => format!("{}{}", first_grapheme(head), first_grapheme(tail)),
                }
            }
        };
        letters.to_uppercase()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn first_grapheme(word: &str) -> &str {
    word.graphemes(true).next().unwrap_or_default()
}

/// A message to render as a quote card.
///
/// Entity offsets are in characters. The JSON form follows the chat API:
/// the author is `from`, the avatar flag is `avatar`, and entity offsets
/// are counted in UTF-16 code units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChatMessage", into = "ChatMessage")]
pub struct Message {
    /// Chat the message came from; selects the name color.
    pub chat_id: Option<i64>,
    /// Author of the message.
    pub author: Option<Author>,
    /// Message text.
    pub text: String,
    /// Entities or a global style.
    pub entities: TextStyling,
    /// Whether to draw the author's avatar.
    pub avatar_enabled: bool,
}

/// Wire form of a [`Message`].
#[derive(Serialize, Deserialize)]
struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chat_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<Author>,
    text: String,
    #[serde(default)]
    entities: TextStyling,
    #[serde(default)]
    avatar: bool,
}

impl TryFrom<ChatMessage> for Message {
    type Error = QuoteError;

    fn try_from(wire: ChatMessage) -> QuoteResult<Self> {
        let entities = match wire.entities {
            TextStyling::Entities(spans) => TextStyling::Entities(
                spans
                    .into_iter()
                    .map(|e| Entity::from_utf16(e.kind, e.offset, e.length, &wire.text))
                    .collect::<QuoteResult<_>>()?,
            ),
            global @ TextStyling::Global(_) => global,
        };
        Ok(Self {
            chat_id: wire.chat_id,
            author: wire.from,
            text: wire.text,
            entities,
            avatar_enabled: wire.avatar,
        })
    }
}

impl From<Message> for ChatMessage {
    fn from(message: Message) -> Self {
        let entities = match message.entities {
            TextStyling::Entities(spans) => TextStyling::Entities(
                spans.iter().map(|e| e.to_utf16(&message.text)).collect(),
            ),
            global @ TextStyling::Global(_) => global,
        };
        Self {
            chat_id: message.chat_id,
            from: message.author,
            text: message.text,
            entities,
            avatar: message.avatar_enabled,
        }
    }
}

impl Message {
    /// Create an unstyled message.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the author.
    #[must_use]
    pub fn with_author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    /// Set the text styling.
    #[must_use]
    pub fn with_styling(mut self, styling: TextStyling) -> Self {
        self.entities = styling;
        self
    }

    /// Enable or disable the avatar.
    #[must_use]
    pub fn with_avatar(mut self, enabled: bool) -> Self {
        self.avatar_enabled = enabled;
        self
    }

    /// Text and styling limited to [`MAX_TEXT_CHARS`] characters.
    ///
    /// Entities are validated against the full text, then clipped to the
    /// retained prefix; entities that fall entirely past it are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::InvalidEntityRange`] if any entity leaves the text.
    pub fn capped_text(&self) -> QuoteResult<(String, TextStyling)> {
        let total = self.text.chars().count();
        if let TextStyling::Entities(entities) = &self.entities {
            for entity in entities {
                entity.validate(total)?;
            }
        }
        if total <= MAX_TEXT_CHARS {
            return Ok((self.text.clone(), self.entities.clone()));
        }

        let text: String = self.text.chars().take(MAX_TEXT_CHARS).collect();
        let styling = match &self.entities {
            TextStyling::Global(tag) => TextStyling::Global(*tag),
            TextStyling::Entities(entities) => TextStyling::Entities(
                entities
                    .iter()
                    .filter(|e| e.offset < MAX_TEXT_CHARS)
                    .map(|e| {
                        let mut clipped = *e;
                        clipped.length = e.end().min(MAX_TEXT_CHARS) - e.offset;
                        clipped
                    })
                    .collect(),
            ),
        };
        Ok((text, styling))
    }
}

/// Everything needed to render one quote card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRenderRequest {
    /// Card background color, any normalizable color string.
    pub background_color: String,
    /// The quoted message.
    pub message: Message,
    /// Pre-scale width budget in pixels.
    pub width: u32,
    /// Pre-scale height budget in pixels.
    pub height: u32,
    /// Render scale; must be positive, clamped to [`MAX_SCALE`].
    pub scale: f32,
}

impl QuoteRenderRequest {
    /// Create a request with default size, scale and background.
    #[must_use]
    pub fn new(message: Message) -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND.to_string(),
            message,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scale: DEFAULT_SCALE,
        }
    }

    /// Validated scale, clamped to [`MAX_SCALE`].
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::InvalidScale`] if the scale is not positive.
    pub fn effective_scale(&self) -> QuoteResult<f32> {
        if self.scale.is_nan() || self.scale <= 0.0 {
            return Err(QuoteError::InvalidScale(self.scale));
        }
        Ok(self.scale.min(MAX_SCALE))
    }
}
