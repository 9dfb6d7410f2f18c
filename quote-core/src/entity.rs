//! Rich-text entities and the style tags they resolve to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QuoteError, QuoteResult};

/// Visual style applied to a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleTag {
    /// Bold weight.
    Bold,
    /// Italic slant.
    Italic,
    /// Bar through the middle of the text.
    Strikethrough,
    /// Bar under the baseline.
    Underline,
    /// Fixed-width family with the code accent color.
    Monospace,
    /// Link-like accent color.
    Mention,
}

impl StyleTag {
    /// All tags, in bit order.
    pub const ALL: [StyleTag; 6] = [
        StyleTag::Bold,
        StyleTag::Italic,
        StyleTag::Strikethrough,
        StyleTag::Underline,
        StyleTag::Monospace,
        StyleTag::Mention,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Entity kinds as delivered by the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Struck-through text.
    Strikethrough,
    /// Underlined text.
    Underline,
    /// Preformatted block.
    Pre,
    /// Inline code.
    Code,
    /// `@username` mention.
    Mention,
    /// Mention of a user without a username.
    TextMention,
    /// `#hashtag`.
    Hashtag,
    /// E-mail address.
    Email,
    /// Phone number.
    PhoneNumber,
    /// `/command`.
    BotCommand,
    /// Bare URL.
    Url,
    /// Text with an attached link.
    TextLink,
}

impl EntityKind {
    /// The style a span of this kind renders with.
    ///
    /// Code-like kinds collapse to [`StyleTag::Monospace`]; every link-like
    /// kind collapses to [`StyleTag::Mention`].
    #[must_use]
    pub const fn style_tag(self) -> StyleTag {
        match self {
            Self::Bold => StyleTag::Bold,
            Self::Italic => StyleTag::Italic,
            Self::Strikethrough => StyleTag::Strikethrough,
            Self::Underline => StyleTag::Underline,
            Self::Pre | Self::Code => StyleTag::Monospace,
            Self::Mention
            | Self::TextMention
            | Self::Hashtag
            | Self::Email
            | Self::PhoneNumber
            | Self::BotCommand
            | Self::Url
            | Self::TextLink => StyleTag::Mention,
        }
    }
}

/// A styled span over a text, in character (code point) offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Kind of the span.
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// First character covered.
    pub offset: usize,
    /// Number of characters covered.
    pub length: usize,
}

impl Entity {
    /// Create an entity over `offset..offset + length`.
    #[must_use]
    pub const fn new(kind: EntityKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
        }
    }

    /// Convert an entity reported in UTF-16 code units into character offsets.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::InvalidEntityRange`] if the span leaves the text,
    /// is empty, or starts or ends inside a surrogate pair.
    pub fn from_utf16(
        kind: EntityKind,
        offset: usize,
        length: usize,
        text: &str,
    ) -> QuoteResult<Self> {
        let invalid = || QuoteError::InvalidEntityRange {
            offset,
            length,
            text_len: text.encode_utf16().count(),
        };
        if length == 0 {
            return Err(invalid());
        }
        let end = offset.checked_add(length).ok_or_else(invalid)?;

        let mut start_char = None;
        let mut end_char = None;
        let mut units = 0;
        for (idx, ch) in text.chars().enumerate() {
            if units == offset {
                start_char = Some(idx);
            }
            if units == end {
                end_char = Some(idx);
                break;
            }
            units += ch.len_utf16();
        }
        if units == end && end_char.is_none() {
            end_char = Some(text.chars().count());
        }

        match (start_char, end_char) {
            (Some(start), Some(stop)) if stop > start => Ok(Self::new(kind, start, stop - start)),
            _ => Err(invalid()),
        }
    }

    /// The same span in UTF-16 code units over `text`.
    #[must_use]
    pub fn to_utf16(&self, text: &str) -> Self {
        let offset = text.chars().take(self.offset).map(char::len_utf16).sum();
        let length = text
            .chars()
            .skip(self.offset)
            .take(self.length)
            .map(char::len_utf16)
            .sum();
        Self::new(self.kind, offset, length)
    }

    /// One past the last character covered.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }

    /// Check that the entity lies within a text of `text_len` characters.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::InvalidEntityRange`] if it does not.
    pub fn validate(&self, text_len: usize) -> QuoteResult<()> {
        let fits = self
            .offset
            .checked_add(self.length)
            .is_some_and(|end| end <= text_len);
        if self.length == 0 || !fits {
            return Err(QuoteError::InvalidEntityRange {
                offset: self.offset,
                length: self.length,
                text_len,
            });
        }
        Ok(())
    }
}

/// How a message's text is styled: per-span entities or one style for all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextStyling {
    /// Overlapping entity spans.
    Entities(Vec<Entity>),
    /// A single style applied to every character.
    Global(StyleTag),
}

impl Default for TextStyling {
    fn default() -> Self {
        Self::Entities(Vec::new())
    }
}

/// A set of [`StyleTag`]s.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StyleSet(u8);

impl StyleSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// A set holding exactly one tag.
    #[must_use]
    pub const fn single(tag: StyleTag) -> Self {
        Self(tag.bit())
    }

    /// Add a tag.
    pub fn insert(&mut self, tag: StyleTag) {
        self.0 |= tag.bit();
    }

    /// Whether the set holds `tag`.
    #[must_use]
    pub const fn contains(self, tag: StyleTag) -> bool {
        self.0 & tag.bit() != 0
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate the tags in the set.
    pub fn iter(self) -> impl Iterator<Item = StyleTag> {
        StyleTag::ALL.into_iter().filter(move |tag| self.contains(*tag))
    }
}

impl FromIterator<StyleTag> for StyleSet {
    fn from_iter<I: IntoIterator<Item = StyleTag>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl fmt::Debug for StyleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
