//! Phrase Filter Engine
//!
//! Removes noise (format indicators, genre tags, publisher tags, series
//! suffixes, redundant subtitles) from individual metadata fields.
//!
//! # Stage order
//! Fixed, because later stages compare against text cleaned by earlier ones:
//! 1. format indicators
//! 2. genre tags
//! 3. publisher tags
//! 4. series suffixes (series field only)
//! 5. subtitle keep/remove patterns and the redundancy rule (subtitle only)
//!
//! # Guarantees
//! - Output is never longer than input: stages only delete spans, and each
//!   seam a removal leaves gains at most one space.
//! - Only the seams around a removed span are tidied; text no rule matched is
//!   kept as written.
//! - Text inside a `preserve_exact` literal is never removed. A match that
//!   overlaps a preserved span is skipped, and a subtitle containing one is
//!   never dropped.
//! - A field filtered down to nothing stays empty; callers decide what to do.

use crate::models::ResolvedSeries;
use crate::rules::{PhraseCategory, RuleSet, SubtitleAction};
use crate::text::{comparison_key, remove_spans, volume_tokens, without_volume_noise};
use crate::volume::{parse_volume, VolumeInfo};
use regex::Regex;
use std::ops::Range;
use tracing::debug;

/// Result of filtering one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredField {
    pub text: String,
    /// Input had content and the output has none
    pub emptied: bool,
}

impl FilteredField {
    fn new(original: &str, text: String) -> Self {
        let emptied = !original.trim().is_empty() && text.trim().is_empty();
        Self { text, emptied }
    }
}

/// Why a subtitle was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// An anchored remove pattern matched the whole subtitle
    RemovePattern(String),
    /// Subtitle equals the series name, up to case and volume noise
    RedundantWithSeries,
}

/// Outcome of subtitle filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleDisposition {
    Kept(FilteredField),
    Dropped(DropReason),
}

/// Applies a [`RuleSet`]'s phrase rules to metadata fields
pub struct PhraseFilterEngine<'a> {
    rules: &'a RuleSet,
}

impl<'a> PhraseFilterEngine<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Apply a single phrase category
    pub fn apply_category(&self, text: &str, category: PhraseCategory) -> String {
        match self.rules.category(category) {
            Some(compiled) => self.strip_all(text, compiled.matchers()),
            None => text.to_string(),
        }
    }

    /// Strip configured series suffixes ("Series", "Trilogy", ...)
    pub fn strip_series_suffixes(&self, text: &str) -> String {
        self.strip_all(text, self.rules.series_suffixes())
    }

    /// Title: all phrase categories
    pub fn filter_title(&self, title: &str) -> FilteredField {
        let text = self.apply_categories(title, &PhraseCategory::ALL);
        self.log_change("title", title, &text);
        FilteredField::new(title, text)
    }

    /// Series name: all phrase categories, then series suffixes
    pub fn filter_series(&self, series: &str) -> FilteredField {
        let categorized = self.apply_categories(series, &PhraseCategory::ALL);
        let text = self.strip_series_suffixes(&categorized);
        self.log_change("series", series, &text);
        FilteredField::new(series, text)
    }

    /// Author or narrator: format indicators and publisher tags
    ///
    /// Author-map canonicalization is not a filter stage and runs before this.
    pub fn filter_person(&self, name: &str) -> FilteredField {
        let text = self.apply_categories(
            name,
            &[PhraseCategory::FormatIndicators, PhraseCategory::PublisherTags],
        );
        self.log_change("person", name, &text);
        FilteredField::new(name, text)
    }

    /// Subtitle: phrase categories, keep/remove patterns, then redundancy
    ///
    /// `series` is the resolved (already filtered) series, if any.
    pub fn filter_subtitle(
        &self,
        subtitle: &str,
        series: Option<&ResolvedSeries>,
    ) -> SubtitleDisposition {
        let mut text = self.apply_categories(subtitle, &PhraseCategory::ALL);
        let protected = !self.rules.preserved_spans(&text).is_empty();

        let kept_by_pattern = self
            .rules
            .subtitle_keep_patterns()
            .iter()
            .any(|p| p.is_match(&text));

        if kept_by_pattern {
            debug!(subtitle = %text, "Subtitle protected by keep pattern");
            return SubtitleDisposition::Kept(FilteredField::new(subtitle, text));
        }

        for rule in self.rules.subtitle_remove_rules() {
            match rule.action {
                SubtitleAction::DropSubtitle => {
                    if !protected && rule.pattern.is_match(&text) {
                        debug!(subtitle = %text, pattern = %rule.pattern, "Subtitle dropped by pattern");
                        return SubtitleDisposition::Dropped(DropReason::RemovePattern(
                            rule.pattern.as_str().to_string(),
                        ));
                    }
                }
                SubtitleAction::StripMatch => {
                    text = self.strip_one(&text, &rule.pattern);
                }
            }
        }

        if !protected {
            if let Some(series) = series {
                if is_redundant_with_series(&text, &series.name, series.volume.as_ref()) {
                    debug!(subtitle = %text, series = %series.name, "Subtitle redundant with series, dropped");
                    return SubtitleDisposition::Dropped(DropReason::RedundantWithSeries);
                }
            }
        }

        self.log_change("subtitle", subtitle, &text);
        SubtitleDisposition::Kept(FilteredField::new(subtitle, text))
    }

    fn apply_categories(&self, text: &str, categories: &[PhraseCategory]) -> String {
        categories
            .iter()
            .fold(text.to_string(), |acc, category| self.apply_category(&acc, *category))
    }

    fn strip_all(&self, text: &str, matchers: &[Regex]) -> String {
        matchers
            .iter()
            .fold(text.to_string(), |acc, re| self.strip_one(&acc, re))
    }

    /// Remove every non-protected match of `re`, tidying only the seams
    fn strip_one(&self, text: &str, re: &Regex) -> String {
        if self.rules.is_preserved(text) {
            return text.to_string();
        }

        let protected = self.rules.preserved_spans(text);
        let removals: Vec<Range<usize>> = re
            .find_iter(text)
            .filter(|m| m.start() < m.end())
            .filter(|m| !protected.iter().any(|p| p.start < m.end() && m.start() < p.end))
            .map(|m| m.range())
            .collect();

        if removals.is_empty() {
            return text.to_string();
        }

        let stripped = remove_spans(text, &removals);
        let disturbs_preserved = self
            .rules
            .preserve_exact()
            .iter()
            .any(|literal| text.contains(literal.as_str()) && !stripped.contains(literal.as_str()));

        if disturbs_preserved {
            let mut raw = String::with_capacity(text.len());
            let mut last = 0;
            for range in &removals {
                raw.push_str(&text[last..range.start]);
                last = range.end;
            }
            raw.push_str(&text[last..]);
            raw
        } else {
            stripped
        }
    }

    fn log_change(&self, field: &str, before: &str, after: &str) {
        if before != after {
            debug!(field, before, after, "Phrase filter changed field");
        }
    }
}

/// Subtitle repeats the series name, up to case and volume noise
///
/// A subtitle that is nothing but volume noise ("Book 2", "1984") is redundant
/// only when one of its numbers is the resolved volume.
pub fn is_redundant_with_series(
    subtitle: &str,
    series: &str,
    volume: Option<&VolumeInfo>,
) -> bool {
    if subtitle.trim().is_empty() {
        return false;
    }

    let subtitle_key = comparison_key(subtitle);
    if !subtitle_key.is_empty() && subtitle_key == comparison_key(series) {
        return true;
    }

    let subtitle_stem = without_volume_noise(subtitle);
    if subtitle_stem.is_empty() {
        return volume.map_or(false, |v| mentions_volume(subtitle, v));
    }
    subtitle_stem == without_volume_noise(series)
}

fn mentions_volume(text: &str, volume: &VolumeInfo) -> bool {
    volume_tokens(text).any(|token| parse_volume(token).as_ref() == Ok(volume))
}
