//! Shared text helpers: span removal, seam tidying, comparison keys,
//! volume-noise stripping

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use crate::volume::VOLUME_TOKEN_PATTERN;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

static EMPTY_BRACKETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*\)|\[\s*\]|\{\s*\}").expect("valid regex"));

static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([,;:!?.])").expect("valid regex"));

static REPEATED_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([,;:\-])(?:\s*[,;:\-])+").expect("valid regex"));

/// Volume numbers with any labels in front ("Book 3", "Vol. 2", "#4", "1-3",
/// "Series, Book 2"). A label with no number after it is ordinary text.
static VOLUME_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:(?:\b(?:vol(?:ume)?|books?|bk|part|pt|number|series|no)\b\.?|#)[\s,:]*)*\b{}\b",
        VOLUME_TOKEN_PATTERN
    ))
    .expect("valid regex")
});

const EDGE_SEPARATORS: &[char] = &[',', ':', ';', '-', '–', '—', '/', '|', '.', '~'];

/// Separators that collapse into one when a removal leaves two side by side
const SEAM_SEPARATORS: &[char] = &[',', ':', ';', '-', '–', '—', '/', '|', '~'];

/// Characters that attach to the word before them
const ATTACHES_LEFT: &[char] = &[',', ';', ':', '!', '?', '.', ')', ']', '}'];

const OPENING_BRACKETS: &[char] = &['(', '[', '{'];

/// Collapse whitespace runs to one space and trim
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Clean up seams left by removing spans
///
/// Only ever deletes characters or shrinks whitespace runs, so the result is
/// never longer than the input.
pub fn tidy(text: &str) -> String {
    let mut out = EMPTY_BRACKETS.replace_all(text, "").into_owned();
    out = REPEATED_SEPARATOR.replace_all(&out, "$1").into_owned();
    out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1").into_owned();
    out = collapse_whitespace(&out);
    trim_edge_separators(&out).to_string()
}

/// Remove byte ranges from `text`, tidying only where the removals meet
///
/// Ranges are sorted, non-overlapping and non-empty. Text away from a seam is
/// returned verbatim. An end of the string is trimmed only when a removal
/// reached it (nothing but separators remained between them). Each seam adds at
/// most one space, so the result is never longer than the input.
pub fn remove_spans(text: &str, ranges: &[Range<usize>]) -> String {
    if ranges.is_empty() {
        return text.to_string();
    }

    let mut kept = Vec::with_capacity(ranges.len() + 1);
    let mut last = 0;
    for range in ranges {
        kept.push(&text[last..range.start]);
        last = range.end;
    }
    kept.push(&text[last..]);

    let reached_start = is_only_separators(kept[0]);
    let reached_end = kept.last().map_or(false, |s| is_only_separators(s));

    let joined = kept[1..]
        .iter()
        .fold(kept[0].to_string(), |acc, segment| join_at_seam(&acc, segment));

    let mut out = joined.as_str();
    if reached_start {
        out = trim_start_separators(out);
    }
    if reached_end {
        out = trim_end_separators(out);
    }
    out.to_string()
}

fn is_only_separators(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || EDGE_SEPARATORS.contains(&c))
}

/// Join the text on either side of a removed span
fn join_at_seam(left: &str, right: &str) -> String {
    let mut left = left.trim_end();
    let mut right = right.trim_start();

    // brackets emptied by the removal
    while let (Some(open), Some(close)) = (left.chars().last(), right.chars().next()) {
        if !matches!((open, close), ('(', ')') | ('[', ']') | ('{', '}')) {
            break;
        }
        left = left[..left.len() - open.len_utf8()].trim_end();
        right = right[close.len_utf8()..].trim_start();
    }

    let is_seam_sep = |c: char| c.is_whitespace() || SEAM_SEPARATORS.contains(&c);
    let left_ends_sep = left.chars().last().map_or(false, |c| SEAM_SEPARATORS.contains(&c));
    let right_starts_sep = right.chars().next().map_or(false, |c| SEAM_SEPARATORS.contains(&c));
    if left_ends_sep && right_starts_sep {
        right = right.trim_start_matches(is_seam_sep);
    }

    if right.starts_with(ATTACHES_LEFT) {
        left = left.trim_end_matches(is_seam_sep);
    }
    let opens = left.ends_with(OPENING_BRACKETS);
    if opens {
        right = right.trim_start_matches(is_seam_sep);
    }

    if left.is_empty() || right.is_empty() || opens || right.starts_with(ATTACHES_LEFT) {
        format!("{}{}", left, right)
    } else {
        format!("{} {}", left, right)
    }
}

fn trim_start_separators(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_whitespace() || EDGE_SEPARATORS.contains(&c))
}

/// Trim separators and whitespace from both ends
///
/// A single trailing `.` after a short word ("Jr.", "St.") is kept; ellipses and
/// sentence-ending dots go.
pub fn trim_edge_separators(text: &str) -> &str {
    trim_end_separators(trim_start_separators(text))
}

fn trim_end_separators(text: &str) -> &str {
    let mut end = text.len();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut idx = chars.len();
    while idx > 0 {
        let (pos, c) = chars[idx - 1];
        let is_sep = c.is_whitespace() || EDGE_SEPARATORS.contains(&c);
        if !is_sep {
            break;
        }
        if c == '.' && abbreviation_before(&chars[..idx - 1]) {
            break;
        }
        end = pos;
        idx -= 1;
    }
    &text[..end]
}

/// True when the chars end in a short alphabetic word ("Jr", "St", "Vol")
fn abbreviation_before(chars: &[(usize, char)]) -> bool {
    let word_len = chars
        .iter()
        .rev()
        .take_while(|(_, c)| c.is_alphabetic())
        .count();
    (1..=3).contains(&word_len)
}

/// Case-, punctuation- and whitespace-insensitive key for comparisons
pub fn comparison_key(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    collapse_whitespace(&mapped)
}

/// Comparison key with volume labels and numbers removed
pub fn without_volume_noise(text: &str) -> String {
    comparison_key(&VOLUME_NOISE.replace_all(text, " "))
}

static VOLUME_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\b{}\b", VOLUME_TOKEN_PATTERN)).expect("valid regex"));

/// Volume-number tokens in free text ("2", "1-3", "1.5", "1p2")
pub fn volume_tokens(text: &str) -> impl Iterator<Item = &str> {
    VOLUME_TOKEN.find_iter(text).map(|m| m.as_str())
}

/// Word-aligned containment of one comparison key in another
pub fn key_contains(haystack_key: &str, needle_key: &str) -> bool {
    if needle_key.is_empty() {
        return false;
    }
    format!(" {} ", haystack_key).contains(&format!(" {} ", needle_key))
}

/// Character count (Unicode scalar values)
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
