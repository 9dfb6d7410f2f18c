//! Haiku detection by syllable counting.
//!
//! A heuristic, not a dictionary: English syllables are vowel groups after
//! trimming common silent endings, Cyrillic syllables are vowels.

/// Syllables per haiku line.
const LINE_SYLLABLES: [usize; 3] = [5, 7, 5];

const CYRILLIC_VOWELS: &str = "аеёиоуыэюяіїє";

/// Estimated syllable count of `text`.
#[must_use]
pub fn syllable_count(text: &str) -> usize {
    text.split_whitespace().map(word_syllables).sum()
}

fn word_syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    english_syllables(&lower) + lower.chars().filter(|c| CYRILLIC_VOWELS.contains(*c)).count()
}

fn english_syllables(word: &str) -> usize {
    let letters: Vec<u8> = word
        .bytes()
        .filter(u8::is_ascii_alphabetic)
        .collect();
    if letters.is_empty() {
        return 0;
    }
    if letters.len() <= 3 {
        return 1;
    }

    let is_soft = |b: u8| b"laeiouy".contains(&b);
    let len = letters.len();
    let trimmed = if letters.ends_with(b"es") && !is_soft(letters[len - 3]) {
        &letters[..len - 3]
    } else if letters.ends_with(b"ed") || (letters.ends_with(b"e") && !is_soft(letters[len - 2])) {
        &letters[..len - 2]
    } else {
        &letters[..]
    };
    let trimmed = trimmed.strip_prefix(b"y").unwrap_or(trimmed);

    // Vowel runs count one syllable per pair, rounded up.
    let mut count: usize = 0;
    let mut run: usize = 0;
    for &b in trimmed.iter().chain(std::iter::once(&b'-')) {
        if b"aeiouy".contains(&b) {
            run += 1;
        } else if run > 0 {
            count += run.div_ceil(2);
            run = 0;
        }
    }
    count
}

/// Split `text` into a 5-7-5 haiku, if it is one.
///
/// Returns the three lines joined by `\n`. Text containing digits is never
/// a haiku, since numbers cannot be counted reliably.
#[must_use]
pub fn detect_haiku(text: &str) -> Option<String> {
    if text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if syllable_count(text) != LINE_SYLLABLES.iter().sum::<usize>() {
        return None;
    }

    let mut lines: [Vec<&str>; 3] = Default::default();
    let mut counts = [0usize; 3];
    let mut line = 0;

    for word in text.split_whitespace() {
        let syllables = word_syllables(word);
        if line == LINE_SYLLABLES.len() {
            // Only silent trailing words remain once every line is full.
            lines[line - 1].push(word);
            continue;
        }
        lines[line].push(word);
        counts[line] += syllables;
        if counts[line] == LINE_SYLLABLES[line] {
            line += 1;
        } else if counts[line] > LINE_SYLLABLES[line] {
            return None;
        }
    }

    (line == LINE_SYLLABLES.len()).then(|| {
        lines
            .iter()
            .map(|words| words.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    })
}
