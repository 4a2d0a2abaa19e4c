//! Title/subtitle swap detection
//!
//! Providers regularly deliver series entries with the two fields inverted: the
//! subtitle holds the series-qualified display title ("Sword Art Online 16")
//! and the title holds what should be the subtitle ("Alicization Exploding").
//!
//! # Algorithm
//! 1. Derive the series stem from the authoritative series name: strip series
//!    suffixes, volume labels and numbers, case and punctuation.
//! 2. Check word-aligned containment of the stem in title and subtitle (both
//!    reduced the same way).
//! 3. Swap only when the subtitle matches and the title does not.
//!
//! Both-match and neither-match leave the fields alone. Fields listed in
//! `preserve_exact` are never moved. The function is total: any text in, a
//! result out.

use crate::phrase_filter::PhraseFilterEngine;
use crate::rules::RuleSet;
use crate::text::{key_contains, without_volume_noise};
use tracing::{debug, warn};

/// Why the normalizer did or did not swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDecision {
    /// No authoritative series name (or it reduced to an empty stem)
    NoSeries,
    /// No subtitle to swap with
    NoSubtitle,
    /// Title or subtitle is a preserve-exact literal
    Preserved,
    /// Only the title carries the stem: fields already in order
    TitleMatches,
    /// Only the subtitle carries the stem: fields swapped
    Swapped,
    /// Both carry the stem: ambiguous, left unchanged
    BothMatch,
    /// Neither carries the stem
    NeitherMatches,
}

/// Normalized title fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleNormalization {
    pub display_title: String,
    pub display_subtitle: Option<String>,
    pub was_swapped: bool,
    pub decision: SwapDecision,
}

/// Detects and corrects title/subtitle inversion
pub struct TitleNormalizer<'a> {
    rules: &'a RuleSet,
}

impl<'a> TitleNormalizer<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Series name reduced for comparison only
    pub fn series_stem(&self, series_name: &str) -> String {
        let without_suffix = PhraseFilterEngine::new(self.rules).strip_series_suffixes(series_name);
        without_volume_noise(&without_suffix)
    }

    pub fn normalize(
        &self,
        title: &str,
        subtitle: Option<&str>,
        series_name: Option<&str>,
    ) -> TitleNormalization {
        let title = title.trim();
        let subtitle = subtitle.map(str::trim).filter(|s| !s.is_empty());

        let unchanged = |decision| TitleNormalization {
            display_title: title.to_string(),
            display_subtitle: subtitle.map(str::to_string),
            was_swapped: false,
            decision,
        };

        let Some(subtitle) = subtitle else {
            return unchanged(SwapDecision::NoSubtitle);
        };

        let stem = series_name.map(|s| self.series_stem(s)).unwrap_or_default();
        if stem.is_empty() {
            return unchanged(SwapDecision::NoSeries);
        }

        if self.rules.is_preserved(title) || self.rules.is_preserved(subtitle) {
            debug!(title, subtitle, "Preserved title fields, swap check skipped");
            return unchanged(SwapDecision::Preserved);
        }

        let title_matches = key_contains(&without_volume_noise(title), &stem);
        let subtitle_matches = key_contains(&without_volume_noise(subtitle), &stem);

        match (title_matches, subtitle_matches) {
            (false, true) => {
                debug!(
                    title,
                    subtitle,
                    stem = %stem,
                    "Subtitle carries series stem, swapping title and subtitle"
                );
                TitleNormalization {
                    display_title: subtitle.to_string(),
                    display_subtitle: Some(title.to_string()),
                    was_swapped: true,
                    decision: SwapDecision::Swapped,
                }
            }
            (true, false) => unchanged(SwapDecision::TitleMatches),
            (true, true) => {
                warn!(
                    title,
                    subtitle,
                    stem = %stem,
                    "Both title and subtitle carry series stem, leaving unchanged"
                );
                unchanged(SwapDecision::BothMatch)
            }
            (false, false) => unchanged(SwapDecision::NeitherMatches),
        }
    }
}
