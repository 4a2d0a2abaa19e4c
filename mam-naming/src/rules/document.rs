//! Rule document schema
//!
//! The on-disk shape of a rule set, exactly as deserialized. Nothing here is
//! validated beyond what serde enforces (unknown keys, field types); compiling
//! into a [`super::RuleSet`] does the rest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a phrase category's entries are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Literal text, word-bounded, optionally wrapped in `(...)` or `[...]`
    Phrase,
    /// Entry is a regular expression
    Regex,
}

/// One phrase category (format indicators, genre tags, publisher tags)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhraseCategoryDocument {
    pub match_mode: MatchMode,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub phrases: Vec<String>,
}

impl PhraseCategoryDocument {
    pub fn phrases(match_mode: MatchMode, phrases: &[&str]) -> Self {
        Self {
            match_mode,
            case_sensitive: false,
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Top-level rule document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    /// Semver of the document; only major version 1 is understood
    #[serde(rename = "_version")]
    pub version: String,

    #[serde(default)]
    pub format_indicators: Option<PhraseCategoryDocument>,

    #[serde(default)]
    pub genre_tags: Option<PhraseCategoryDocument>,

    #[serde(default)]
    pub publisher_tags: Option<PhraseCategoryDocument>,

    /// Regexes stripped from series names ("Series$", "Trilogy$"...)
    #[serde(default)]
    pub series_suffixes: Vec<String>,

    /// Regexes that drop (anchored `^...$`) or strip (otherwise) subtitle text
    #[serde(default)]
    pub subtitle_remove_patterns: Vec<String>,

    /// Regexes that protect a subtitle from removal and redundancy dropping
    #[serde(default)]
    pub subtitle_keep_patterns: Vec<String>,

    /// Raw author spelling → canonical spelling
    #[serde(default)]
    pub author_map: BTreeMap<String, String>,

    /// Literals that filtering never touches and swapping never moves
    #[serde(default)]
    pub preserve_exact: Vec<String>,

    /// Tag appended to folder names as `[Tag]`
    #[serde(default)]
    pub ripper_tag: Option<String>,
}

impl RuleDocument {
    /// Empty document at the given version
    pub fn empty(version: &str) -> Self {
        Self {
            version: version.to_string(),
            format_indicators: None,
            genre_tags: None,
            publisher_tags: None,
            series_suffixes: Vec::new(),
            subtitle_remove_patterns: Vec::new(),
            subtitle_keep_patterns: Vec::new(),
            author_map: BTreeMap::new(),
            preserve_exact: Vec::new(),
            ripper_tag: None,
        }
    }
}
