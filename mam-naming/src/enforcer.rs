//! Path Constraint Enforcer
//!
//! Turns a [`ComposedName`] into a [`MamPath`] that fits the tracker's path
//! budget and is safe on every target filesystem.
//!
//! # Algorithm
//! 1. Sanitize every segment (NFC, character rules) and render
//!    `folder/file`. Lengths are counted in Unicode scalar values.
//! 2. Within budget: apply whole-name rules and return.
//! 3. Over budget: only the title segment shrinks. It appears in both the
//!    folder and the file name, so every character kept costs two:
//!
//!    ```text
//!    fixed  = len(folder/file) with an empty title segment
//!    keep   = (budget - fixed) / 2 - 1 (space) - len("...[xxxxxx]")
//!    ```
//!
//!    The segment is cut on a grapheme boundary, backed off to a word boundary
//!    when one is close, and suffixed with `...[<6 hex>]`. The hash is the
//!    SHA-256 of the full pre-truncation `folder/file` string.
//! 4. Whole-name rules run again on the result.
//!
//! Author, identifier, year, series prefix and extension are invariant: when
//! they alone cannot fit, the result is [`NamingError::BudgetExceeded`].

use crate::composer::{ComposedName, NameParts};
use crate::error::{NamingError, NamingResult};
use crate::models::MamPath;
use crate::safety::{finalize_name, sanitize_segment};
use crate::text::char_len;
use mam_common::config::DEFAULT_PATH_BUDGET;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use unicode_segmentation::UnicodeSegmentation;

/// Hex characters of the content hash kept in a truncated name
pub const HASH_LEN: usize = 6;

/// `...[` + hash + `]`
pub const TRUNCATION_SUFFIX_LEN: usize = 3 + 1 + HASH_LEN + 1;

/// A truncated title keeps at least this many characters before the suffix
const MIN_KEPT_CHARS: usize = 1;

/// Enforces the length budget and filename safety
#[derive(Debug, Clone, Copy)]
pub struct PathConstraintEnforcer {
    budget: usize,
}

impl Default for PathConstraintEnforcer {
    fn default() -> Self {
        Self::new(DEFAULT_PATH_BUDGET)
    }
}

impl PathConstraintEnforcer {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn enforce(&self, composed: &ComposedName) -> NamingResult<MamPath> {
        let parts = sanitize_parts(&composed.parts);
        let full_path = render_path(&parts);
        let original_length = char_len(&full_path);

        if original_length <= self.budget {
            let path = MamPath {
                folder_name: finalize_name(&parts.folder_name()),
                file_name: finalize_name(&parts.file_name()),
                was_truncated: false,
                original_length,
                truncation_hash: None,
            };
            return self.checked(path, original_length);
        }

        let fixed = char_len(&render_path(&parts.with_title_segment("")));
        let per_name_overhead = 1 + TRUNCATION_SUFFIX_LEN;
        let required = fixed + 2 * (per_name_overhead + MIN_KEPT_CHARS);

        if parts.title_segment.is_empty() {
            return Err(NamingError::BudgetExceeded {
                required: original_length,
                budget: self.budget,
            });
        }
        if required > self.budget {
            return Err(NamingError::BudgetExceeded {
                required,
                budget: self.budget,
            });
        }

        let keep = (self.budget - fixed) / 2 - per_name_overhead;
        let hash = content_hash(&full_path);
        let cut = truncate_segment(&parts.title_segment, keep);
        let truncated = parts.with_title_segment(format!("{}...[{}]", cut, hash));

        info!(
            original_length,
            budget = self.budget,
            hash = %hash,
            kept_chars = char_len(&cut),
            "Release name truncated to fit path budget"
        );

        let path = MamPath {
            folder_name: finalize_name(&truncated.folder_name()),
            file_name: finalize_name(&truncated.file_name()),
            was_truncated: true,
            original_length,
            truncation_hash: Some(hash),
        };
        self.checked(path, original_length)
    }

    fn checked(&self, path: MamPath, original_length: usize) -> NamingResult<MamPath> {
        let total = path.total_length();
        if total > self.budget {
            return Err(NamingError::BudgetExceeded {
                required: total,
                budget: self.budget,
            });
        }
        debug!(
            total,
            original_length,
            truncated = path.was_truncated,
            "Path constraints satisfied"
        );
        Ok(path)
    }
}

/// First [`HASH_LEN`] hex characters of the SHA-256 of `text`
pub fn content_hash(text: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(text.as_bytes()));
    digest[..HASH_LEN].to_string()
}

/// Cut `segment` to at most `max_chars` characters
///
/// Never splits a grapheme cluster. Backs off to the last space when that
/// keeps at least half the allowance, then trims trailing separators.
pub fn truncate_segment(segment: &str, max_chars: usize) -> String {
    let mut end = 0;
    let mut used = 0;
    for (idx, grapheme) in segment.grapheme_indices(true) {
        let width = grapheme.chars().count();
        if used + width > max_chars {
            break;
        }
        used += width;
        end = idx + grapheme.len();
    }

    let hard_cut = &segment[..end];
    if end == segment.len() {
        return hard_cut.to_string();
    }

    let word_cut = hard_cut
        .rfind(char::is_whitespace)
        .map(|idx| &hard_cut[..idx])
        .filter(|prefix| char_len(prefix) * 2 >= max_chars);

    let chosen = word_cut.unwrap_or(hard_cut);
    let trimmed = chosen.trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, ',' | ';' | '-' | '.' | '(' | '[' | '\'')
    });

    if trimmed.is_empty() {
        hard_cut.to_string()
    } else {
        trimmed.to_string()
    }
}

fn sanitize_parts(parts: &NameParts) -> NameParts {
    NameParts {
        series_prefix: parts
            .series_prefix
            .as_deref()
            .map(sanitize_segment)
            .filter(|p| !p.is_empty()),
        title_segment: sanitize_segment(&parts.title_segment),
        year: parts.year,
        author: sanitize_segment(&parts.author),
        identifier: sanitize_segment(&parts.identifier),
        tag: parts.tag.as_deref().map(sanitize_segment).filter(|t| !t.is_empty()),
        extension: sanitize_segment(&parts.extension),
    }
}

fn render_path(parts: &NameParts) -> String {
    format!("{}/{}", parts.folder_name(), parts.file_name())
}
