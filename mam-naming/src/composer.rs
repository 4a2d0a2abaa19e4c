//! Name composition
//!
//! Renders the folder and file names from a [`NormalizedBook`]:
//!
//! ```text
//! series:     {Series} vol_{Volume} {Arc} ({Year}) ({Author}) {ID.<id>} [{Tag}]
//! standalone: {Title} ({Year}) ({Author}) {ID.<id>} [{Tag}]
//! ```
//!
//! The file name is the folder name without `[{Tag}]`, plus the extension.
//! Empty segments are skipped along with their separating space, so a series
//! without a volume token renders as `{Series} {Arc} ...`.
//!
//! Composition does no length or character checking; that is the enforcer's
//! job. It returns the structured [`NameParts`] alongside the strings so the
//! enforcer can shrink the title segment without re-parsing anything.

use crate::models::{NormalizedBook, ResolvedSeries};
use crate::phrase_filter::is_redundant_with_series;
use crate::rules::RuleSet;
use crate::text::tidy;
use crate::volume::format_volume;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rendered when the release year is unknown
pub const UNKNOWN_YEAR: &str = "Unknown";

/// Rendered when the primary author was emptied by filtering
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Structured pieces of a release name
///
/// Everything except `title_segment` is an invariant token: truncation never
/// touches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameParts {
    /// `{Series} vol_{Volume}`, or `{Series}` when there is no volume token
    pub series_prefix: Option<String>,
    /// Arc (series) or title (standalone); the only truncatable segment
    pub title_segment: String,
    pub year: Option<i32>,
    pub author: String,
    pub identifier: String,
    pub tag: Option<String>,
    /// Without leading dot
    pub extension: String,
}

impl NameParts {
    pub fn year_token(&self) -> String {
        match self.year {
            Some(year) => format!("({})", year),
            None => format!("({})", UNKNOWN_YEAR),
        }
    }

    pub fn author_token(&self) -> String {
        if self.author.trim().is_empty() {
            format!("({})", UNKNOWN_AUTHOR)
        } else {
            format!("({})", self.author)
        }
    }

    pub fn id_token(&self) -> String {
        format!("{{ID.{}}}", self.identifier)
    }

    pub fn tag_token(&self) -> Option<String> {
        self.tag
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(|t| format!("[{}]", t))
    }

    /// Shared stem of folder and file name
    pub fn stem(&self) -> String {
        let mut segments: Vec<String> = Vec::with_capacity(5);
        if let Some(prefix) = self.series_prefix.as_deref().filter(|p| !p.is_empty()) {
            segments.push(prefix.to_string());
        }
        if !self.title_segment.is_empty() {
            segments.push(self.title_segment.clone());
        }
        segments.push(self.year_token());
        segments.push(self.author_token());
        segments.push(self.id_token());
        segments.join(" ")
    }

    pub fn folder_name(&self) -> String {
        match self.tag_token() {
            Some(tag) => format!("{} {}", self.stem(), tag),
            None => self.stem(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem(), self.extension)
    }

    /// Same parts with a different title segment
    pub fn with_title_segment(&self, title_segment: impl Into<String>) -> Self {
        Self {
            title_segment: title_segment.into(),
            ..self.clone()
        }
    }
}

/// Composed, not yet constrained, folder and file names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedName {
    pub folder_name: String,
    pub file_name: String,
    pub parts: NameParts,
}

impl ComposedName {
    pub fn from_parts(parts: NameParts) -> Self {
        Self {
            folder_name: parts.folder_name(),
            file_name: parts.file_name(),
            parts,
        }
    }
}

/// Assembles folder and file names from a normalized book
pub struct NameComposer<'a> {
    rules: &'a RuleSet,
    extension: String,
}

impl<'a> NameComposer<'a> {
    pub fn new(rules: &'a RuleSet, extension: &str) -> Self {
        Self {
            rules,
            extension: extension.trim().trim_start_matches('.').to_string(),
        }
    }

    pub fn compose(&self, book: &NormalizedBook) -> ComposedName {
        let (series_prefix, title_segment) = match &book.resolved_series {
            Some(series) => (Some(series_prefix(series)), arc_for(book, series)),
            None => (None, book.display_title.clone()),
        };

        let parts = NameParts {
            series_prefix,
            title_segment,
            year: book.year,
            author: book.primary_author().to_string(),
            identifier: book.identifier.trim().to_string(),
            tag: self.rules.ripper_tag().map(str::to_string),
            extension: self.extension.clone(),
        };

        let composed = ComposedName::from_parts(parts);
        debug!(
            identifier = %book.identifier,
            folder = %composed.folder_name,
            "Composed release name"
        );
        composed
    }
}

/// `{Series} vol_{Volume}` or just `{Series}`
pub fn series_prefix(series: &ResolvedSeries) -> String {
    match &series.volume {
        Some(volume) => format!("{} vol_{}", series.name, format_volume(volume)),
        None => series.name.clone(),
    }
}

/// Arc for a series book
///
/// The display title minus the series name and its volume number. When that
/// leaves nothing useful, the display subtitle is the arc.
pub fn arc_for(book: &NormalizedBook, series: &ResolvedSeries) -> String {
    let remainder = title_remainder(&book.display_title, series);
    if !remainder.is_empty()
        && !is_redundant_with_series(&remainder, &series.name, series.volume.as_ref())
    {
        return remainder;
    }

    book.display_subtitle
        .as_deref()
        .map(tidy)
        .filter(|s| !s.is_empty() && !is_redundant_with_series(s, &series.name, series.volume.as_ref()))
        .unwrap_or_default()
}

fn title_remainder(title: &str, series: &ResolvedSeries) -> String {
    let mut text = title.to_string();

    if let Some(re) = literal_matcher(&series.name) {
        text = re.replace_all(&text, " ").into_owned();
    }

    if let Some(volume) = &series.volume {
        let mut numbers = volume.plain_numbers();
        numbers.push(format_volume(volume));
        let alternation = numbers
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r"(?:\b(?:vol(?:ume)?|books?|bk|part|pt|no)\.?\s*|#\s*)?\b(?:{})\b",
            alternation
        );
        if let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() {
            text = re.replace_all(&text, " ").into_owned();
        }
    }

    tidy(&text)
}

/// Case-insensitive matcher for a literal, word-bounded where the literal
/// starts or ends with a word character
fn literal_matcher(literal: &str) -> Option<Regex> {
    let literal = literal.trim();
    if literal.is_empty() {
        return None;
    }
    let is_word = |c: Option<char>| c.map_or(false, |c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(literal.chars().next()) { r"\b" } else { "" };
    let trail = if is_word(literal.chars().last()) { r"\b" } else { "" };
    RegexBuilder::new(&format!("{}{}{}", lead, regex::escape(literal), trail))
        .case_insensitive(true)
        .build()
        .ok()
}
