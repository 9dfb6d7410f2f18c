//! Emoji detection over grapheme clusters.
//!
//! Extended grapheme clusters already keep ZWJ sequences, skin-tone
//! modifiers, keycaps and regional-indicator flags together, so a cluster
//! is the unit of matching. A cluster is an emoji if it is a keycap, a
//! flag, carries an emoji presentation selector, or holds a pictograph that
//! presents as emoji by default. Text-default symbols such as `★` or `✓`
//! stay text unless followed by U+FE0F.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

const ZWJ: char = '\u{200D}';
const VARIATION_SELECTOR_16: char = '\u{FE0F}';
const COMBINING_KEYCAP: char = '\u{20E3}';

/// A detected emoji sequence, in character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiMatch {
    /// First character of the sequence.
    pub offset: usize,
    /// Number of characters in the sequence.
    pub length: usize,
    /// Asset key used to look up the emoji image.
    pub asset_key: String,
}

/// Find all emoji sequences in `text`, in order and non-overlapping.
#[must_use]
pub fn find_emoji(text: &str) -> Vec<EmojiMatch> {
    let mut matches = Vec::new();
    let mut offset = 0;
    for grapheme in text.graphemes(true) {
        let length = grapheme.chars().count();
        if is_emoji_grapheme(grapheme) {
            matches.push(EmojiMatch {
                offset,
                length,
                asset_key: asset_key(grapheme),
            });
        }
        offset += length;
    }
    matches
}

/// Whether a grapheme cluster renders as an emoji.
#[must_use]
pub fn is_emoji_grapheme(grapheme: &str) -> bool {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    if grapheme.contains(COMBINING_KEYCAP) {
        return matches!(first, '0'..='9' | '#' | '*');
    }
    if first.is_ascii() {
        return false;
    }
    if is_regional_indicator(first) {
        return grapheme.chars().filter(|&c| is_regional_indicator(c)).count() == 2;
    }
    grapheme.contains(VARIATION_SELECTOR_16) || grapheme.chars().any(has_emoji_presentation)
}

fn is_regional_indicator(c: char) -> bool {
    matches!(c, '\u{1F1E6}'..='\u{1F1FF}')
}

/// Pictographs that present as emoji without a selector.
///
/// Within the symbol blocks, default emoji presentation coincides with an
/// East Asian Width of Wide; text-default symbols are Neutral or Ambiguous.
fn has_emoji_presentation(c: char) -> bool {
    matches!(c as u32, 0x2300..=0x2BFF | 0x1F000..=0x1FAFF) && c.width() == Some(2)
}

/// Asset key for an emoji: lowercase hex code points joined by `-`.
///
/// Presentation selectors are dropped unless the sequence is a ZWJ
/// sequence, matching the usual emoji image set naming.
#[must_use]
pub fn asset_key(grapheme: &str) -> String {
    let keep_selectors = grapheme.contains(ZWJ);
    grapheme
        .chars()
        .filter(|&c| keep_selectors || c != VARIATION_SELECTOR_16)
        .map(|c| format!("{:x}", c as u32))
        .collect::<Vec<_>>()
        .join("-")
}
