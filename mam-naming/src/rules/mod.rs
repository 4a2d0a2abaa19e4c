//! Rule set loading and compilation
//!
//! A rule document is parsed, validated and compiled exactly once:
//!
//! ```text
//! JSON ──serde──▶ RuleDocument ──compile──▶ RuleSet (immutable)
//! ```
//!
//! Every regex is compiled here, so a bad pattern is a load-time
//! `Configuration` error and never a per-book failure. A compiled `RuleSet`
//! owns no interior mutability; share it across threads behind an `Arc` and
//! build a fresh instance to reload.

pub mod document;

pub use document::{MatchMode, PhraseCategoryDocument, RuleDocument};

use crate::error::{NamingError, NamingResult};
use crate::text::collapse_whitespace;
use regex::{Regex, RegexBuilder};
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info};

/// Major document version this build understands
pub const SUPPORTED_MAJOR_VERSION: u64 = 1;

/// Phrase categories, in the order the filter engine applies them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhraseCategory {
    FormatIndicators,
    GenreTags,
    PublisherTags,
}

impl PhraseCategory {
    pub const ALL: [PhraseCategory; 3] = [
        PhraseCategory::FormatIndicators,
        PhraseCategory::GenreTags,
        PhraseCategory::PublisherTags,
    ];

    /// Key used in the rule document
    pub fn key(&self) -> &'static str {
        match self {
            PhraseCategory::FormatIndicators => "format_indicators",
            PhraseCategory::GenreTags => "genre_tags",
            PhraseCategory::PublisherTags => "publisher_tags",
        }
    }
}

/// Compiled phrase category
#[derive(Debug, Clone)]
pub struct CompiledCategory {
    pub category: PhraseCategory,
    pub match_mode: MatchMode,
    pub case_sensitive: bool,
    matchers: Vec<Regex>,
}

impl CompiledCategory {
    pub fn matchers(&self) -> &[Regex] {
        &self.matchers
    }
}

/// What a subtitle remove pattern does when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleAction {
    /// Pattern is anchored at both ends: the whole subtitle goes
    DropSubtitle,
    /// Only the matched span is removed
    StripMatch,
}

/// Compiled subtitle remove pattern
#[derive(Debug, Clone)]
pub struct SubtitleRule {
    pub pattern: Regex,
    pub action: SubtitleAction,
}

/// Compiled, immutable rule set
#[derive(Debug, Clone)]
pub struct RuleSet {
    version: Version,
    categories: Vec<CompiledCategory>,
    series_suffixes: Vec<Regex>,
    subtitle_remove: Vec<SubtitleRule>,
    subtitle_keep: Vec<Regex>,
    author_map: BTreeMap<String, String>,
    author_map_folded: BTreeMap<String, String>,
    preserve_exact: BTreeSet<String>,
    ripper_tag: Option<String>,
}

impl RuleSet {
    /// Parse and compile a JSON rule document
    pub fn from_json_str(json: &str) -> NamingResult<Self> {
        let document: RuleDocument = serde_json::from_str(json)
            .map_err(|e| NamingError::Configuration(format!("rule document: {}", e)))?;
        Self::from_document(&document)
    }

    /// Read, parse and compile a rule document file
    pub fn load_file(path: &Path) -> NamingResult<Self> {
        let json = std::fs::read_to_string(path).map_err(mam_common::Error::from)?;
        Self::from_json_str(&json).map_err(|e| match e {
            NamingError::Configuration(msg) => {
                NamingError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Rule set with no rules at all (names are still composed and constrained)
    pub fn permissive() -> Self {
        Self {
            version: Version::new(SUPPORTED_MAJOR_VERSION, 0, 0),
            categories: Vec::new(),
            series_suffixes: Vec::new(),
            subtitle_remove: Vec::new(),
            subtitle_keep: Vec::new(),
            author_map: BTreeMap::new(),
            author_map_folded: BTreeMap::new(),
            preserve_exact: BTreeSet::new(),
            ripper_tag: None,
        }
    }

    /// Validate and compile a deserialized document
    pub fn from_document(document: &RuleDocument) -> NamingResult<Self> {
        let version = Version::parse(document.version.trim()).map_err(|e| {
            NamingError::Configuration(format!("_version '{}' is not semver: {}", document.version, e))
        })?;
        if version.major != SUPPORTED_MAJOR_VERSION {
            return Err(NamingError::Configuration(format!(
                "rule document version {} is not supported (expected {}.x)",
                version, SUPPORTED_MAJOR_VERSION
            )));
        }

        let mut categories = Vec::new();
        for category in PhraseCategory::ALL {
            let source = match category {
                PhraseCategory::FormatIndicators => document.format_indicators.as_ref(),
                PhraseCategory::GenreTags => document.genre_tags.as_ref(),
                PhraseCategory::PublisherTags => document.publisher_tags.as_ref(),
            };
            if let Some(source) = source {
                categories.push(compile_category(category, source)?);
            }
        }

        let series_suffixes = compile_patterns("series_suffixes", &document.series_suffixes)?;
        let subtitle_keep = compile_patterns("subtitle_keep_patterns", &document.subtitle_keep_patterns)?;
        let subtitle_remove = compile_patterns("subtitle_remove_patterns", &document.subtitle_remove_patterns)?
            .into_iter()
            .zip(&document.subtitle_remove_patterns)
            .map(|(pattern, raw)| SubtitleRule {
                pattern,
                action: subtitle_action_for(raw),
            })
            .collect::<Vec<_>>();

        let mut author_map = BTreeMap::new();
        let mut author_map_folded = BTreeMap::new();
        for (raw, canonical) in &document.author_map {
            let raw = collapse_whitespace(raw);
            let canonical = collapse_whitespace(canonical);
            if raw.is_empty() || canonical.is_empty() {
                return Err(NamingError::Configuration(format!(
                    "author_map entry '{}' -> '{}' has a blank side",
                    raw, canonical
                )));
            }
            author_map_folded.insert(raw.to_lowercase(), canonical.clone());
            author_map.insert(raw, canonical);
        }

        let mut preserve_exact = BTreeSet::new();
        for literal in &document.preserve_exact {
            if literal.trim().is_empty() {
                return Err(NamingError::Configuration(
                    "preserve_exact contains a blank entry".to_string(),
                ));
            }
            preserve_exact.insert(literal.clone());
        }

        let ripper_tag = match document.ripper_tag.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(tag) if tag.contains(['[', ']', '/', '\\']) => {
                return Err(NamingError::Configuration(format!(
                    "ripper_tag '{}' must not contain brackets or path separators",
                    tag
                )));
            }
            Some(tag) => Some(tag.to_string()),
        };

        let rules = Self {
            version,
            categories,
            series_suffixes,
            subtitle_remove,
            subtitle_keep,
            author_map,
            author_map_folded,
            preserve_exact,
            ripper_tag,
        };

        info!(
            version = %rules.version,
            categories = rules.categories.len(),
            series_suffixes = rules.series_suffixes.len(),
            subtitle_rules = rules.subtitle_remove.len() + rules.subtitle_keep.len(),
            author_map = rules.author_map.len(),
            preserve_exact = rules.preserve_exact.len(),
            "Rule set compiled"
        );

        Ok(rules)
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Compiled categories in application order (absent categories skipped)
    pub fn categories(&self) -> &[CompiledCategory] {
        &self.categories
    }

    pub fn category(&self, category: PhraseCategory) -> Option<&CompiledCategory> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn series_suffixes(&self) -> &[Regex] {
        &self.series_suffixes
    }

    pub fn subtitle_remove_rules(&self) -> &[SubtitleRule] {
        &self.subtitle_remove
    }

    pub fn subtitle_keep_patterns(&self) -> &[Regex] {
        &self.subtitle_keep
    }

    pub fn ripper_tag(&self) -> Option<&str> {
        self.ripper_tag.as_deref()
    }

    pub fn preserve_exact(&self) -> &BTreeSet<String> {
        &self.preserve_exact
    }

    /// True if the whole (trimmed) text is a preserve-exact literal
    pub fn is_preserved(&self, text: &str) -> bool {
        self.preserve_exact.contains(text.trim())
    }

    /// Byte ranges of every preserve-exact literal occurring in `text`
    pub fn preserved_spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        for literal in &self.preserve_exact {
            for (start, matched) in text.match_indices(literal.as_str()) {
                spans.push(start..start + matched.len());
            }
        }
        spans.sort_by_key(|r| (r.start, r.end));
        spans
    }

    /// Canonical spelling of an author or narrator name
    ///
    /// Exact match first, then case-insensitive; unmapped names are returned
    /// with whitespace collapsed.
    pub fn canonical_author(&self, raw: &str) -> String {
        let cleaned = collapse_whitespace(raw);
        if let Some(mapped) = self.author_map.get(&cleaned) {
            return mapped.clone();
        }
        if let Some(mapped) = self.author_map_folded.get(&cleaned.to_lowercase()) {
            debug!(raw = %cleaned, canonical = %mapped, "Author mapped case-insensitively");
            return mapped.clone();
        }
        cleaned
    }
}

fn compile_category(
    category: PhraseCategory,
    source: &PhraseCategoryDocument,
) -> NamingResult<CompiledCategory> {
    let mut matchers = Vec::with_capacity(source.phrases.len());

    for (index, phrase) in source.phrases.iter().enumerate() {
        if phrase.trim().is_empty() {
            return Err(NamingError::Configuration(format!(
                "{}.phrases[{}] is blank",
                category.key(),
                index
            )));
        }

        let pattern = match source.match_mode {
            MatchMode::Phrase => phrase_pattern(phrase),
            MatchMode::Regex => phrase.clone(),
        };

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!source.case_sensitive)
            .build()
            .map_err(|e| {
                NamingError::Configuration(format!(
                    "{}.phrases[{}] '{}' does not compile: {}",
                    category.key(),
                    index,
                    phrase,
                    e
                ))
            })?;
        matchers.push(regex);
    }

    Ok(CompiledCategory {
        category,
        match_mode: source.match_mode,
        case_sensitive: source.case_sensitive,
        matchers,
    })
}

/// Case-insensitive compile of a plain pattern list
fn compile_patterns(key: &str, patterns: &[String]) -> NamingResult<Vec<Regex>> {
    patterns
        .iter()
        .enumerate()
        .map(|(index, pattern)| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    NamingError::Configuration(format!(
                        "{}[{}] '{}' does not compile: {}",
                        key, index, pattern, e
                    ))
                })
        })
        .collect()
}

/// Regex for a literal phrase
///
/// Word boundaries are added on sides that start/end with a word character, and
/// an enclosing `(...)` or `[...]` is consumed along with the phrase.
fn phrase_pattern(phrase: &str) -> String {
    let trimmed = phrase.trim();
    let words: Vec<String> = trimmed.split_whitespace().map(regex::escape).collect();
    let body = words.join(r"\s+");

    let is_word = |c: Option<char>| c.map_or(false, |c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(trimmed.chars().next()) { r"\b" } else { "" };
    let trail = if is_word(trimmed.chars().last()) { r"\b" } else { "" };
    let core = format!("{}{}{}", lead, body, trail);

    format!(r"\(\s*{core}\s*\)|\[\s*{core}\s*\]|{core}", core = core)
}

/// `^...$` anchored remove patterns drop the subtitle; others strip the match
fn subtitle_action_for(raw: &str) -> SubtitleAction {
    let trimmed = raw.trim();
    let anchored_start = trimmed.starts_with('^') || trimmed.starts_with("(?i)^");
    let anchored_end = trimmed.ends_with('$') && !trimmed.ends_with(r"\$");
    if anchored_start && anchored_end {
        SubtitleAction::DropSubtitle
    } else {
        SubtitleAction::StripMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> RuleDocument {
        let mut doc = RuleDocument::empty("1.0.0");
        doc.format_indicators = Some(PhraseCategoryDocument::phrases(
            MatchMode::Phrase,
            &["Unabridged", "Dramatized Adaptation"],
        ));
        doc.genre_tags = Some(PhraseCategoryDocument::phrases(
            MatchMode::Regex,
            &[r"A\s+LitRPG\s+Adventure"],
        ));
        doc
    }

    #[test]
    fn test_compiles_categories_in_fixed_order() {
        let mut d = doc();
        d.publisher_tags = Some(PhraseCategoryDocument::phrases(MatchMode::Phrase, &["Podium"]));
        let rules = RuleSet::from_document(&d).unwrap();

        let order: Vec<PhraseCategory> = rules.categories().iter().map(|c| c.category).collect();
        assert_eq!(
            order,
            vec![
                PhraseCategory::FormatIndicators,
                PhraseCategory::GenreTags,
                PhraseCategory::PublisherTags
            ]
        );
        assert_eq!(rules.version(), &Version::new(1, 0, 0));
    }

    #[test]
    fn test_phrase_pattern_consumes_brackets() {
        let rules = RuleSet::from_document(&doc()).unwrap();
        let fmt = rules.category(PhraseCategory::FormatIndicators).unwrap();
        let re = &fmt.matchers()[0];

        assert_eq!(re.find("Dune (Unabridged)").map(|m| m.as_str()), Some("(Unabridged)"));
        assert_eq!(re.find("Dune [ unabridged ]").map(|m| m.as_str()), Some("[ unabridged ]"));
        assert_eq!(re.find("Dune Unabridged").map(|m| m.as_str()), Some("Unabridged"));
        assert!(re.find("Unabridgedness").is_none());
    }

    #[test]
    fn test_phrase_pattern_flexible_whitespace() {
        let rules = RuleSet::from_document(&doc()).unwrap();
        let fmt = rules.category(PhraseCategory::FormatIndicators).unwrap();
        assert!(fmt.matchers()[1].is_match("Dramatized   Adaptation"));
    }

    #[test]
    fn test_case_sensitive_category() {
        let mut d = RuleDocument::empty("1.0.0");
        d.publisher_tags = Some(PhraseCategoryDocument {
            match_mode: MatchMode::Phrase,
            case_sensitive: true,
            phrases: vec!["AUDIBLE".to_string()],
        });
        let rules = RuleSet::from_document(&d).unwrap();
        let re = &rules.category(PhraseCategory::PublisherTags).unwrap().matchers()[0];
        assert!(re.is_match("AUDIBLE Original"));
        assert!(!re.is_match("Audible Original"));
    }

    #[test]
    fn test_bad_regex_is_configuration_error() {
        let mut d = doc();
        d.series_suffixes = vec!["(unclosed".to_string()];
        let err = RuleSet::from_document(&d).unwrap_err();
        match err {
            NamingError::Configuration(msg) => assert!(msg.contains("series_suffixes[0]")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_category_regex_names_category() {
        let mut d = RuleDocument::empty("1.0.0");
        d.genre_tags = Some(PhraseCategoryDocument::phrases(MatchMode::Regex, &["[a-"]));
        let err = RuleSet::from_document(&d).unwrap_err();
        assert!(err.to_string().contains("genre_tags.phrases[0]"));
    }

    #[test]
    fn test_version_checks() {
        assert!(RuleSet::from_document(&RuleDocument::empty("1.4.2")).is_ok());
        assert!(matches!(
            RuleSet::from_document(&RuleDocument::empty("2.0.0")),
            Err(NamingError::Configuration(_))
        ));
        assert!(matches!(
            RuleSet::from_document(&RuleDocument::empty("one")),
            Err(NamingError::Configuration(_))
        ));
    }

    #[test]
    fn test_blank_entries_rejected() {
        let mut d = RuleDocument::empty("1.0.0");
        d.preserve_exact = vec![" ".to_string()];
        assert!(RuleSet::from_document(&d).is_err());

        let mut d = RuleDocument::empty("1.0.0");
        d.author_map.insert("J. Smith".to_string(), "".to_string());
        assert!(RuleSet::from_document(&d).is_err());

        let mut d = RuleDocument::empty("1.0.0");
        d.format_indicators = Some(PhraseCategoryDocument::phrases(MatchMode::Phrase, &[""]));
        assert!(RuleSet::from_document(&d).is_err());
    }

    #[test]
    fn test_ripper_tag_validation() {
        let mut d = RuleDocument::empty("1.0.0");
        d.ripper_tag = Some("  ".to_string());
        assert_eq!(RuleSet::from_document(&d).unwrap().ripper_tag(), None);

        d.ripper_tag = Some(" H2O ".to_string());
        assert_eq!(RuleSet::from_document(&d).unwrap().ripper_tag(), Some("H2O"));

        d.ripper_tag = Some("[H2O]".to_string());
        assert!(RuleSet::from_document(&d).is_err());
    }

    #[test]
    fn test_subtitle_actions() {
        let mut d = RuleDocument::empty("1.0.0");
        d.subtitle_remove_patterns = vec![
            r"^A Novel$".to_string(),
            r"\bA LitRPG Series\b".to_string(),
        ];
        let rules = RuleSet::from_document(&d).unwrap();
        let actions: Vec<SubtitleAction> = rules.subtitle_remove_rules().iter().map(|r| r.action).collect();
        assert_eq!(actions, vec![SubtitleAction::DropSubtitle, SubtitleAction::StripMatch]);
        assert!(rules.subtitle_remove_rules()[0].pattern.is_match("a novel"));
    }

    #[test]
    fn test_canonical_author() {
        let mut d = RuleDocument::empty("1.0.0");
        d.author_map.insert("JRR Tolkien".to_string(), "J.R.R. Tolkien".to_string());
        let rules = RuleSet::from_document(&d).unwrap();

        assert_eq!(rules.canonical_author("JRR Tolkien"), "J.R.R. Tolkien");
        assert_eq!(rules.canonical_author("  jrr   tolkien "), "J.R.R. Tolkien");
        assert_eq!(rules.canonical_author("Ursula  K. Le Guin"), "Ursula K. Le Guin");
    }

    #[test]
    fn test_preserved_spans() {
        let mut d = RuleDocument::empty("1.0.0");
        d.preserve_exact = vec!["Unabridged Love".to_string()];
        let rules = RuleSet::from_document(&d).unwrap();

        assert!(rules.is_preserved(" Unabridged Love "));
        assert_eq!(rules.preserved_spans("My Unabridged Love Story"), vec![3..18]);
    }

    #[test]
    fn test_from_json_rejects_unknown_keys() {
        let err = RuleSet::from_json_str(r#"{"_version":"1.0.0","extra":true}"#).unwrap_err();
        assert!(matches!(err, NamingError::Configuration(_)));
    }
}
