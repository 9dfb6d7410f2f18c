//! Grouping styled characters into runs ("words").

use crate::entity::StyleSet;
use crate::style::{EmojiRef, StyledCharacter};

/// Literal break marker recognized inside text.
const BREAK_MARKER: &str = "<br>";

/// What a run holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Visible text sharing one style set.
    Text,
    /// Breaking whitespace.
    Whitespace,
    /// An explicit line break (`\n`, `\r`, `\r\n`, U+2028, U+2029 or `<br>`).
    Break,
    /// One emoji sequence, rendered as an image.
    Emoji,
}

/// A maximal span of characters that render the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// The run's characters.
    pub text: String,
    /// Styles shared by every character.
    pub styles: StyleSet,
    /// The emoji sequence this run renders, for [`RunKind::Emoji`].
    pub emoji: Option<EmojiRef>,
    /// Classification of the run.
    pub kind: RunKind,
}

impl Run {
    fn start(kind: RunKind, first: &StyledCharacter) -> Self {
        Self {
            text: first.ch.to_string(),
            styles: first.styles,
            emoji: first.emoji.clone(),
            kind,
        }
    }

    /// Whether the run is an emoji image.
    #[must_use]
    pub fn is_emoji(&self) -> bool {
        self.kind == RunKind::Emoji
    }

    /// Whether the run is breaking whitespace.
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        self.kind == RunKind::Whitespace
    }

    /// Whether the run forces a line break.
    #[must_use]
    pub fn is_break(&self) -> bool {
        self.kind == RunKind::Break
    }

    fn accepts(&self, kind: RunKind, next: &StyledCharacter) -> bool {
        if kind != self.kind {
            return false;
        }
        match kind {
            RunKind::Break => false,
            // An emoji sequence stays whole even if a span covers part of it.
            RunKind::Emoji => group_of(self.emoji.as_ref()) == group_of(next.emoji.as_ref()),
            RunKind::Text | RunKind::Whitespace => self.styles == next.styles,
        }
    }
}

/// Whitespace that allows a line break. Non-breaking spaces are excluded.
#[must_use]
pub fn is_breaking_space(c: char) -> bool {
    matches!(
        c,
        '\u{000C}'
            | '\n'
            | '\r'
            | '\t'
            | '\u{000B}'
            | ' '
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

fn group_of(emoji: Option<&EmojiRef>) -> Option<usize> {
    emoji.map(|e| e.group)
}

fn classify(c: &StyledCharacter) -> RunKind {
    if c.emoji.is_some() {
        RunKind::Emoji
    } else if is_breaking_space(c.ch) {
        RunKind::Whitespace
    } else {
        RunKind::Text
    }
}

/// Number of characters forming an explicit break at `idx`, or 0.
fn break_len_at(chars: &[StyledCharacter], idx: usize) -> usize {
    let here = &chars[idx];
    if here.emoji.is_some() {
        return 0;
    }
    match here.ch {
        '\r' if chars.get(idx + 1).is_some_and(|next| next.ch == '\n') => 2,
        '\n' | '\r' | '\u{2028}' | '\u{2029}' => 1,
        '<' => {
            let marker_len = BREAK_MARKER.len();
            let candidate = chars.get(idx..idx + marker_len);
            let is_marker = candidate.is_some_and(|window| {
                window
                    .iter()
                    .map(|c| c.ch)
                    .eq(BREAK_MARKER.chars())
            });
            if is_marker {
                marker_len
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Partition styled characters into runs.
///
/// A new run starts whenever emoji-group membership changes, an explicit
/// break occurs, the whitespace class changes, or the style set changes.
/// Concatenating the runs' text reproduces the input exactly.
#[must_use]
pub fn build_runs(chars: &[StyledCharacter]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut idx = 0;

    while idx < chars.len() {
        let current = &chars[idx];

        let break_len = break_len_at(chars, idx);
        if break_len > 0 {
            let mut run = Run::start(RunKind::Break, current);
            run.text = chars[idx..idx + break_len].iter().map(|c| c.ch).collect();
            runs.push(run);
            idx += break_len;
            continue;
        }

        let kind = classify(current);
        match runs.last_mut() {
            Some(last) if last.accepts(kind, current) => last.text.push(current.ch),
            _ => runs.push(Run::start(kind, current)),
        }
        idx += 1;
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityKind, StyleTag, TextStyling};
    use crate::style::styled_characters;

    fn runs_of(text: &str, styling: &TextStyling) -> Vec<Run> {
        build_runs(&styled_characters(text, styling).unwrap())
    }

    fn words(runs: &[Run]) -> Vec<&str> {
        runs.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_single_bold_word() {
        let runs = runs_of("Hello", &TextStyling::Global(StyleTag::Bold));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hello");
        assert_eq!(runs[0].styles, StyleSet::single(StyleTag::Bold));
        assert_eq!(runs[0].kind, RunKind::Text);
    }

    #[test]
    fn test_whitespace_splits_words() {
        let runs = runs_of("old  pond\tfrog", &TextStyling::default());
        assert_eq!(words(&runs), vec!["old", "  ", "pond", "\t", "frog"]);
        assert!(runs[1].is_whitespace());
    }

    #[test]
    fn test_non_breaking_space_stays_in_word() {
        let runs = runs_of("a\u{00A0}b c", &TextStyling::default());
        assert_eq!(words(&runs), vec!["a\u{00A0}b", " ", "c"]);
    }

    #[test]
    fn test_breaks_are_standalone() {
        let runs = runs_of("a\n\nb\r\nc<br>d", &TextStyling::default());
        assert_eq!(words(&runs), vec!["a", "\n", "\n", "b", "\r\n", "c", "<br>", "d"]);
        assert!(runs[1].is_break());
        assert!(runs[4].is_break());
        assert!(runs[6].is_break());
        assert_eq!(runs[5].kind, RunKind::Text);
    }

    #[test]
    fn test_unicode_separators_break() {
        let runs = runs_of("a\u{2028}b\u{2029}c", &TextStyling::default());
        assert_eq!(words(&runs), vec!["a", "\u{2028}", "b", "\u{2029}", "c"]);
        assert!(runs[1].is_break());
        assert!(runs[3].is_break());
    }

    #[test]
    fn test_partial_marker_is_text() {
        let runs = runs_of("a<b>", &TextStyling::default());
        assert_eq!(words(&runs), vec!["a<b>"]);
    }

    #[test]
    fn test_style_change_splits() {
        let styling = TextStyling::Entities(vec![Entity::new(EntityKind::Bold, 2, 2)]);
        let runs = runs_of("abcdef", &styling);
        assert_eq!(words(&runs), vec!["ab", "cd", "ef"]);
        assert!(runs[1].styles.contains(StyleTag::Bold));
    }

    #[test]
    fn test_adjacent_emoji_are_separate_runs() {
        let runs = runs_of("x😀😀y", &TextStyling::default());
        assert_eq!(words(&runs), vec!["x", "😀", "😀", "y"]);
        assert!(runs[1].is_emoji());
        assert_ne!(runs[1].emoji, runs[2].emoji);
    }

    #[test]
    fn test_partially_styled_emoji_is_not_split() {
        // Bold covers only the skin-tone modifier of the sequence.
        let styling = TextStyling::Entities(vec![Entity::new(EntityKind::Bold, 1, 1)]);
        let runs = runs_of("👍🏽", &styling);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "👍🏽");
    }

    #[test]
    fn test_empty_text_has_no_runs() {
        assert!(runs_of("", &TextStyling::default()).is_empty());
    }
}
