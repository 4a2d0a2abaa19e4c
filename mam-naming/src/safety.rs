//! Cross-platform filename safety
//!
//! Names must survive Windows, macOS and Linux filesystems as well as the
//! tracker's own upload form, so the strictest rules of all three apply.
//!
//! # Character rules
//! | Input            | Output   |
//! |------------------|----------|
//! | `:`              | ` -`     |
//! | `/` `\` `\|`     | `-`      |
//! | `"`              | `'`      |
//! | `?` `*` `<` `>`  | dropped  |
//! | control chars    | space    |
//!
//! Text is NFC-normalized first so that lengths are measured consistently.
//! Whole-name rules (trailing dots and spaces, reserved device names) run on
//! the final folder and file names via [`finalize_name`].

use crate::text::collapse_whitespace;
use unicode_normalization::UnicodeNormalization;

/// Windows device names that cannot be used as a file stem
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// NFC-normalize
pub fn nfc(text: &str) -> String {
    text.nfc().collect()
}

/// Make one name segment safe on every target filesystem
pub fn sanitize_segment(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in nfc(text).chars() {
        match c {
            ':' => out.push_str(" -"),
            '/' | '\\' | '|' => out.push('-'),
            '"' => out.push('\''),
            '?' | '*' | '<' | '>' => {}
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    collapse_whitespace(&out)
}

/// Apply whole-name rules to a finished folder or file name
///
/// Strips trailing dots and spaces and suffixes a reserved device stem with `_`.
pub fn finalize_name(name: &str) -> String {
    let trimmed = name.trim_end_matches(['.', ' ']).trim_start();

    let (stem, rest) = match trimmed.find('.') {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };

    if is_reserved_stem(stem) {
        format!("{}_{}", stem, rest)
    } else {
        trimmed.to_string()
    }
}

/// True if `stem` is a Windows reserved device name (case-insensitive)
pub fn is_reserved_stem(stem: &str) -> bool {
    let upper = stem.trim_end().to_ascii_uppercase();
    RESERVED_NAMES.contains(&upper.as_str())
}

/// True if a finished name contains nothing the safety rules would change
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            matches!(c, ':' | '/' | '\\' | '|' | '"' | '?' | '*' | '<' | '>') || c.is_control()
        })
        && !name.ends_with(['.', ' '])
        && !is_reserved_stem(name.split('.').next().unwrap_or(name))
}
