//! Per-character style resolution.

use std::sync::Arc;

use crate::emoji::find_emoji;
use crate::entity::{StyleSet, TextStyling};
use crate::error::QuoteResult;

/// Reference from a character to the emoji sequence it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiRef {
    /// Index of the sequence among all emoji found in the text.
    pub group: usize,
    /// Asset key of the emoji image.
    pub asset_key: Arc<str>,
}

/// One character with its resolved styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledCharacter {
    /// The character.
    pub ch: char,
    /// Union of all styles covering the character.
    pub styles: StyleSet,
    /// Emoji sequence membership, if any.
    pub emoji: Option<EmojiRef>,
}

/// Resolve the style set of every character of `text`.
///
/// A global style applies to every character; entity spans are merged by
/// union, so overlapping spans accumulate rather than overwrite.
///
/// # Errors
///
/// Returns [`crate::QuoteError::InvalidEntityRange`] if any entity leaves the text.
pub fn resolve_styles(text: &str, styling: &TextStyling) -> QuoteResult<Vec<StyleSet>> {
    let len = text.chars().count();
    match styling {
        TextStyling::Global(tag) => Ok(vec![StyleSet::single(*tag); len]),
        TextStyling::Entities(entities) => {
            let mut styles = vec![StyleSet::EMPTY; len];
            for entity in entities {
                entity.validate(len)?;
                let tag = entity.kind.style_tag();
                for style in &mut styles[entity.offset..entity.end()] {
                    style.insert(tag);
                }
            }
            Ok(styles)
        }
    }
}

/// Build the styled character sequence for `text`.
///
/// Combines [`resolve_styles`] with emoji segmentation; characters inside
/// the same emoji sequence share one [`EmojiRef`].
///
/// # Errors
///
/// Returns [`crate::QuoteError::InvalidEntityRange`] if any entity leaves the text.
pub fn styled_characters(text: &str, styling: &TextStyling) -> QuoteResult<Vec<StyledCharacter>> {
    let styles = resolve_styles(text, styling)?;
    let mut chars: Vec<StyledCharacter> = text
        .chars()
        .zip(styles)
        .map(|(ch, styles)| StyledCharacter {
            ch,
            styles,
            emoji: None,
        })
        .collect();

    for (group, found) in find_emoji(text).into_iter().enumerate() {
        let emoji = EmojiRef {
            group,
            asset_key: Arc::from(found.asset_key),
        };
        for styled in &mut chars[found.offset..found.offset + found.length] {
            styled.emoji = Some(emoji.clone());
        }
    }

    Ok(chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityKind, StyleTag};
    use crate::QuoteError;

    #[test]
    fn test_global_style_covers_everything() {
        let styles = resolve_styles("Hello", &TextStyling::Global(StyleTag::Bold)).unwrap();
        assert_eq!(styles, vec![StyleSet::single(StyleTag::Bold); 5]);
    }

    #[test]
    fn test_overlapping_entities_merge() {
        let styling = TextStyling::Entities(vec![
            Entity::new(EntityKind::Bold, 0, 3),
            Entity::new(EntityKind::Italic, 2, 3),
            Entity::new(EntityKind::Url, 4, 1),
        ]);
        let styles = resolve_styles("abcde", &styling).unwrap();
        let bold = StyleSet::single(StyleTag::Bold);
        let italic = StyleSet::single(StyleTag::Italic);
        assert_eq!(styles[0], bold);
        assert_eq!(styles[1], bold);
        assert_eq!(styles[2], bold.union(italic));
        assert_eq!(styles[3], italic);
        assert_eq!(styles[4], italic.union(StyleSet::single(StyleTag::Mention)));
    }

    #[test]
    fn test_out_of_range_entity_fails() {
        let styling = TextStyling::Entities(vec![Entity::new(EntityKind::Bold, 3, 5)]);
        let err = resolve_styles("abcde", &styling).unwrap_err();
        assert!(matches!(
            err,
            QuoteError::InvalidEntityRange {
                offset: 3,
                length: 5,
                text_len: 5
            }
        ));
    }

    #[test]
    fn test_emoji_groups_are_shared() {
        let chars = styled_characters("a👍🏽b😀", &TextStyling::default()).unwrap();
        assert_eq!(chars.len(), 5);
        assert!(chars[0].emoji.is_none());
        let thumbs = chars[1].emoji.as_ref().unwrap();
        assert_eq!(thumbs.group, 0);
        assert_eq!(chars[2].emoji.as_ref().unwrap(), thumbs);
        assert!(chars[3].emoji.is_none());
        assert_eq!(chars[4].emoji.as_ref().unwrap().group, 1);
    }
}
