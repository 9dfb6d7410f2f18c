//! Greedy line wrapping of runs under a width and height budget.
//!
//! Layout is computed in full before any surface is allocated, so the text
//! block's surface is created at its exact final size.

use quote_core::{EmojiRef, Run, StyleSet};

use crate::font::{FontFace, FontProvider};

/// Hard cap on either dimension of a text block.
pub const MAX_EXTENT: f32 = 10_000.0;

/// Marker appended to truncated text.
pub const ELLIPSIS: char = '…';

/// Geometry of one text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapConfig {
    /// Font size in pixels.
    pub font_size: f32,
    /// Left edge of every line.
    pub text_x: f32,
    /// Baseline of the first line.
    pub text_y: f32,
    /// Width budget, capped at [`MAX_EXTENT`].
    pub max_width: f32,
    /// Height budget, capped at [`MAX_EXTENT`].
    pub max_height: f32,
}

impl WrapConfig {
    /// A block starting at the left edge with the first baseline one font size down.
    #[must_use]
    pub fn new(font_size: f32, max_width: f32, max_height: f32) -> Self {
        Self {
            font_size,
            text_x: 0.0,
            text_y: font_size,
            max_width,
            max_height,
        }
    }

    /// Distance between consecutive baselines.
    #[must_use]
    pub fn line_height(&self) -> f32 {
        4.0 * (self.font_size * 0.3)
    }

    fn width_limit(&self) -> f32 {
        self.max_width.min(MAX_EXTENT)
    }

    fn height_limit(&self) -> f32 {
        self.max_height.min(MAX_EXTENT)
    }
}

/// A run placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRun {
    /// Text to draw; may differ from the source run after truncation.
    pub text: String,
    /// Styles of the source run.
    pub styles: StyleSet,
    /// Emoji image to draw instead of text.
    pub emoji: Option<EmojiRef>,
    /// Left edge.
    pub x: f32,
    /// Advance width.
    pub width: f32,
}

impl PlacedRun {
    /// Face the run's text is drawn with.
    #[must_use]
    pub fn face(&self) -> FontFace {
        FontFace::for_styles(self.styles)
    }
}

/// One laid-out line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutLine {
    /// Baseline y.
    pub baseline: f32,
    /// Runs in text order.
    pub runs: Vec<PlacedRun>,
    /// Right edge of the last run.
    pub width: f32,
}

/// Result of wrapping a text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlockLayout {
    /// Font size the block was laid out at.
    pub font_size: f32,
    /// Lines, top to bottom.
    pub lines: Vec<LaidOutLine>,
    /// Widest line.
    pub width: f32,
    /// Last baseline plus one font size.
    pub height: f32,
    /// Whether any content was cut and marked with an ellipsis.
    pub truncated: bool,
}

impl TextBlockLayout {
    /// All placed runs in order.
    pub fn runs(&self) -> impl Iterator<Item = &PlacedRun> {
        self.lines.iter().flat_map(|line| line.runs.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Accumulating,
    Done,
}

struct LineWrapper<'a> {
    config: &'a WrapConfig,
    fonts: &'a dyn FontProvider,
    max_width: f32,
    max_height: f32,
    x: f32,
    lines: Vec<LaidOutLine>,
    soft_wrapped: bool,
    truncated: bool,
    state: State,
}

impl<'a> LineWrapper<'a> {
    fn new(config: &'a WrapConfig, fonts: &'a dyn FontProvider) -> Self {
        Self {
            config,
            fonts,
            max_width: config.width_limit(),
            max_height: config.height_limit(),
            x: config.text_x,
            lines: vec![LaidOutLine {
                baseline: config.text_y,
                ..LaidOutLine::default()
            }],
            soft_wrapped: false,
            truncated: false,
            state: State::Accumulating,
        }
    }

    fn line(&mut self) -> &mut LaidOutLine {
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    fn baseline(&self) -> f32 {
        self.lines.last().map_or(self.config.text_y, |l| l.baseline)
    }

    fn line_is_empty(&self) -> bool {
        !self.lines.last().is_some_and(|l| !l.runs.is_empty())
    }

    fn has_room_for_line(&self) -> bool {
        self.baseline() + self.config.line_height() <= self.max_height
    }

    fn measure(&self, text: &str, styles: StyleSet) -> f32 {
        self.fonts
            .advance(text, FontFace::for_styles(styles), self.config.font_size)
    }

    fn new_line(&mut self, soft: bool) {
        let baseline = self.baseline() + self.config.line_height();
        self.lines.push(LaidOutLine {
            baseline,
            ..LaidOutLine::default()
        });
        self.x = self.config.text_x;
        self.soft_wrapped = soft;
    }

    fn place(&mut self, text: String, styles: StyleSet, emoji: Option<EmojiRef>, width: f32) {
        let x = self.x;
        self.x += width;
        let right = self.x;
        let line = self.line();
        line.runs.push(PlacedRun {
            text,
            styles,
            emoji,
            x,
            width,
        });
        line.width = line.width.max(right);
    }

    /// Drop trailing characters until `text` plus an ellipsis ends within the
    /// line limit, append the ellipsis and stop.
    fn finish_with_ellipsis(&mut self, mut text: String, styles: StyleSet) {
        let limit = self.max_width - 2.0 * self.config.font_size;
        let with_marker = |t: &str| format!("{t}{ELLIPSIS}");
        while !text.is_empty() && self.x + self.measure(&with_marker(&text), styles) > limit {
            text.pop();
        }
        text.push(ELLIPSIS);
        let width = self.measure(&text, styles);
        if self.x + width <= self.max_width {
            self.place(text, styles, None, width);
        }
        self.truncated = true;
        self.state = State::Done;
    }

    /// Shorten a run that is too wide for any line on its own.
    fn pretruncate(&mut self, text: &str, styles: StyleSet) -> String {
        let budget = self.max_width - 3.0 * self.config.font_size;
        let mut cut = text.to_string();
        while !cut.is_empty() && self.measure(&cut, styles) > budget {
            cut.pop();
        }
        cut.push(ELLIPSIS);
        self.truncated = true;
        cut
    }

    fn push(&mut self, run: &Run, more_content: bool) {
        if run.is_break() {
            if self.has_room_for_line() {
                self.new_line(false);
            } else if more_content {
                self.finish_with_ellipsis(String::new(), run.styles);
            } else {
                self.state = State::Done;
            }
            return;
        }

        let font_size = self.config.font_size;
        let (text, width) = if run.is_emoji() {
            (run.text.clone(), font_size)
        } else {
            let width = self.measure(&run.text, run.styles);
            if width > self.max_width - 3.0 * font_size {
                let cut = self.pretruncate(&run.text, run.styles);
                let cut_width = self.measure(&cut, run.styles);
                (cut, cut_width)
            } else {
                (run.text.clone(), width)
            }
        };

        let line_empty = self.line_is_empty();
        if run.is_whitespace() && line_empty && self.soft_wrapped {
            return;
        }

        if self.x + width > self.max_width - 2.0 * font_size && !line_empty {
            if !self.has_room_for_line() {
                if run.is_whitespace() && !more_content {
                    self.state = State::Done;
                } else if run.is_whitespace() || run.is_emoji() {
                    self.finish_with_ellipsis(String::new(), run.styles);
                } else {
                    self.finish_with_ellipsis(text, run.styles);
                }
                return;
            }
            self.new_line(true);
            if run.is_whitespace() {
                return;
            }
        }

        if self.x + width > self.max_width {
            // Too wide even for an empty line.
            self.truncated = true;
            self.state = State::Done;
            return;
        }
        self.place(text, run.styles, run.emoji.clone(), width);
    }

    fn finish(self) -> TextBlockLayout {
        let width = self
            .lines
            .iter()
            .map(|l| l.width)
            .fold(0.0_f32, f32::max);
        let height = self.baseline() + self.config.font_size;
        TextBlockLayout {
            font_size: self.config.font_size,
            lines: self.lines,
            width,
            height,
            truncated: self.truncated,
        }
    }
}

fn is_content(run: &Run) -> bool {
    !run.is_whitespace() && !run.is_break()
}

/// Lay `runs` out into lines.
///
/// Runs are placed greedily left to right. A run that would cross
/// `max_width - 2 * font_size` starts a new line when the height budget
/// allows one, and is otherwise cut with an ellipsis, ending the layout.
/// Whitespace at a wrap point is dropped.
#[must_use]
pub fn wrap_runs(runs: &[Run], config: &WrapConfig, fonts: &dyn FontProvider) -> TextBlockLayout {
    let mut wrapper = LineWrapper::new(config, fonts);
    for (idx, run) in runs.iter().enumerate() {
        if wrapper.state == State::Done {
            break;
        }
        let more_content = runs[idx + 1..].iter().any(is_content);
        wrapper.push(run, more_content);
    }
    let layout = wrapper.finish();
    tracing::trace!(
        lines = layout.lines.len(),
        width = layout.width,
        height = layout.height,
        truncated = layout.truncated,
        "Wrapped text block"
    );
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::BlockFont;
    use proptest::prelude::*;
    use quote_core::{build_runs, styled_characters, StyleTag, TextStyling};

    fn layout(text: &str, config: &WrapConfig) -> TextBlockLayout {
        let chars = styled_characters(text, &TextStyling::default()).unwrap();
        wrap_runs(&build_runs(&chars), config, &BlockFont)
    }

    fn line_texts(layout: &TextBlockLayout) -> Vec<String> {
        layout
            .lines
            .iter()
            .map(|l| l.runs.iter().map(|r| r.text.as_str()).collect())
            .collect()
    }

    /// Font size 10: characters are 5 wide, lines 12 apart, wrap limit 80.
    fn small(max_height: f32) -> WrapConfig {
        WrapConfig::new(10.0, 100.0, max_height)
    }

    #[test]
    fn test_single_bold_word() {
        let chars = styled_characters("Hello", &TextStyling::Global(StyleTag::Bold)).unwrap();
        let runs = build_runs(&chars);
        let result = wrap_runs(&runs, &WrapConfig::new(24.0, 1000.0, 1000.0), &BlockFont);

        assert_eq!(result.lines.len(), 1);
        let placed = &result.lines[0].runs;
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].text, "Hello");
        assert_eq!(placed[0].styles, StyleSet::single(StyleTag::Bold));
        assert!((result.width - 60.0).abs() < f32::EPSILON);
        assert!((result.height - 48.0).abs() < f32::EPSILON);
        assert!(!result.truncated);
    }

    #[test]
    fn test_line_height() {
        assert!((WrapConfig::new(10.0, 1.0, 1.0).line_height() - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_greedy_wrap() {
        let result = layout("aaaa bbbb cccc dddd", &small(1000.0));
        assert_eq!(line_texts(&result), vec!["aaaa bbbb cccc ", "dddd"]);
        assert!((result.lines[0].width - 75.0).abs() < f32::EPSILON);
        assert!((result.lines[1].baseline - 22.0).abs() < 1e-4);
        assert!((result.width - 75.0).abs() < f32::EPSILON);
        assert!(!result.truncated);
    }

    #[test]
    fn test_whitespace_at_wrap_point_is_dropped() {
        let result = layout("aaaaaaaaaaaaaa   bb", &small(1000.0));
        assert_eq!(line_texts(&result), vec!["aaaaaaaaaaaaaa", "bb"]);
        assert!((result.lines[1].runs[0].x).abs() < f32::EPSILON);
    }

    #[test]
    fn test_forced_breaks() {
        let result = layout("a\n\nb<br>c", &small(1000.0));
        assert_eq!(line_texts(&result), vec!["a", "", "b", "c"]);
        assert!((result.height - (10.0 + 3.0 * 12.0 + 10.0)).abs() < 1e-4);
    }

    #[test]
    fn test_height_exhaustion_truncates_with_ellipsis() {
        let result = layout("aaaa bbbb cccc dddd eeee ffff gggg", &small(25.0));
        assert_eq!(result.lines.len(), 2);
        let last = result.lines[1].runs.last().unwrap();
        assert_eq!(last.text, "…");
        assert!((last.x - 75.0).abs() < f32::EPSILON);
        assert!(result.truncated);
        assert!((result.height - 32.0).abs() < 1e-4);
    }

    #[test]
    fn test_truncation_keeps_fitting_prefix() {
        // No second line fits, so the overflowing word is cut at the limit.
        let config = WrapConfig::new(10.0, 100.0, 15.0);
        let result = layout("aaaaaaaaaa dddddddddd", &config);
        assert_eq!(line_texts(&result), vec!["aaaaaaaaaa dddd…"]);
        assert!(result.lines[0].width <= 100.0);
    }

    #[test]
    fn test_break_without_budget_marks_remaining_content() {
        let result = layout("aaaa\nbbbb", &small(15.0));
        assert_eq!(line_texts(&result), vec!["aaaa…"]);
        assert!(result.truncated);
    }

    #[test]
    fn test_trailing_break_without_budget_is_not_truncation() {
        let result = layout("aaaa\n \n", &small(15.0));
        assert_eq!(line_texts(&result), vec!["aaaa"]);
        assert!(!result.truncated);
    }

    #[test]
    fn test_pretruncates_overlong_word() {
        let result = layout(&"a".repeat(20), &small(1000.0));
        assert_eq!(result.lines.len(), 1);
        let run = &result.lines[0].runs[0];
        assert_eq!(run.text, format!("{}…", "a".repeat(14)));
        assert!((run.width - 75.0).abs() < f32::EPSILON);
        assert!(result.truncated);
    }

    #[test]
    fn test_emoji_advance_is_font_size() {
        let result = layout("x😀y", &small(1000.0));
        let runs = &result.lines[0].runs;
        assert_eq!(runs.len(), 3);
        assert!(runs[1].emoji.is_some());
        assert!((runs[1].x - 5.0).abs() < f32::EPSILON);
        assert!((runs[1].width - 10.0).abs() < f32::EPSILON);
        assert!((runs[2].x - 15.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_emoji_is_never_split_on_truncation() {
        let config = WrapConfig::new(10.0, 100.0, 15.0);
        let result = layout("aaaaaaaaaaaaaa 👍🏽", &config);
        assert!(result.runs().all(|r| r.emoji.is_none()));
        assert_eq!(line_texts(&result), vec!["aaaaaaaaaaaaaa …"]);
    }

    #[test]
    fn test_nothing_wider_than_the_budget_is_placed() {
        let config = WrapConfig::new(10.0, 8.0, 100.0);
        let emoji = layout("😀 a", &config);
        assert_eq!(emoji.runs().count(), 0);
        assert!(emoji.truncated);
        assert!(emoji.width.abs() < f32::EPSILON);

        // A word is cut down to a lone ellipsis, which still fits.
        let word = layout("frog", &config);
        assert_eq!(line_texts(&word), vec!["…"]);
        assert!((word.width - 5.0).abs() < f32::EPSILON);

        let none = layout("frog", &WrapConfig::new(10.0, 3.0, 100.0));
        assert_eq!(none.runs().count(), 0);
        assert!(none.truncated);
    }

    #[test]
    fn test_empty_text() {
        let result = layout("", &small(1000.0));
        assert_eq!(result.lines.len(), 1);
        assert!(result.width.abs() < f32::EPSILON);
        assert!((result.height - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_budgets_are_capped() {
        let config = WrapConfig::new(10.0, 200.0, 1.0e9);
        let text = "word ".repeat(10_000);
        let result = layout(&text, &config);
        assert!(result.width <= 200.0);
        assert!(result.height <= MAX_EXTENT + 10.0);
        assert!(result.truncated);
    }

    fn word_text() -> impl Strategy<Value = String> {
        let word = prop::sample::select(vec![
            "a", "frog", "pond", "silence", "aaaaaaaaaaaaaaaaaaaaaa", "😀", " ", "  ", "\n",
        ]);
        prop::collection::vec(word, 0..40).prop_map(|w| w.concat())
    }

    proptest! {
        #[test]
        fn runs_never_cross_max_width(text in word_text(), max_width in 1.0f32..400.0, max_height in 10.0f32..300.0) {
            let config = WrapConfig::new(10.0, max_width, max_height);
            let result = layout(&text, &config);
            for run in result.runs() {
                prop_assert!(run.x >= 0.0);
                prop_assert!(run.x + run.width <= max_width, "{:?} ends past {}", run, max_width);
            }
            for line in &result.lines {
                prop_assert!(line.width <= max_width);
            }
        }

        #[test]
        fn fitting_text_is_never_truncated(words in prop::collection::vec("[a-z]{1,4}", 1..5)) {
            // At most 5 words of 4 chars plus spaces: 24 chars, 120 wide.
            let text = words.join(" ");
            let result = layout(&text, &WrapConfig::new(10.0, 200.0, 10.0));
            prop_assert!(!result.truncated);
            prop_assert!(result.runs().all(|r| !r.text.contains(ELLIPSIS)));
            let rebuilt: String = result.runs().map(|r| r.text.as_str()).collect();
            prop_assert_eq!(rebuilt, text);
        }
    }
}
