//! Core value types for the naming pipeline
//!
//! `RawMetadataRecord` → `NormalizedBook` → `MamPath`. All three are plain
//! values: nothing here holds a reference to another stage and nothing is
//! mutated after construction.

use crate::error::{NamingError, NamingResult};
use crate::volume::VolumeInfo;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Input
// ============================================================================

/// Series entry as reported by the metadata provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub name: String,
    /// Free-form position ("16", "1.5", "Book 3", "1-3", "prequel"...)
    #[serde(default)]
    pub position: String,
}

impl SeriesEntry {
    pub fn new(name: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: position.into(),
        }
    }
}

/// Metadata for one book, as produced by an external provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMetadataRecord {
    /// External identifier (ASIN-like), embedded verbatim in every name
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub series_primary: Option<SeriesEntry>,
    /// Ordered; the first entry is the primary author
    pub authors: Vec<String>,
    #[serde(default)]
    pub narrators: Vec<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    /// Where the book currently lives, for the path heuristic
    #[serde(default)]
    pub source_path: Option<PathBuf>,
}

impl RawMetadataRecord {
    /// Minimal record; optional fields start empty
    pub fn new(identifier: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            subtitle: None,
            series_primary: None,
            authors: vec![author.into()],
            narrators: Vec::new(),
            release_year: None,
            source_path: None,
        }
    }

    /// Reject structurally invalid records
    ///
    /// Messy text is never an error; only missing required fields are.
    pub fn validate(&self) -> NamingResult<()> {
        if self.identifier.trim().is_empty() {
            return Err(NamingError::InvalidRecord("identifier is blank".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(NamingError::InvalidRecord(format!(
                "title is blank for {}",
                self.identifier
            )));
        }
        if self.authors.iter().all(|a| a.trim().is_empty()) {
            return Err(NamingError::InvalidRecord(format!(
                "no authors for {}",
                self.identifier
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Normalized
// ============================================================================

/// Where a resolved series came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSource {
    Authoritative,
    PathHeuristic,
    TitleHeuristic,
}

impl SeriesSource {
    /// Fixed confidence for each source
    pub fn confidence(&self) -> f32 {
        match self {
            SeriesSource::Authoritative => 1.0,
            SeriesSource::PathHeuristic => 0.9,
            SeriesSource::TitleHeuristic => 0.5,
        }
    }
}

/// Series chosen for a book, with provenance for auditing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSeries {
    pub name: String,
    /// `None` when the position was absent, an alias like "omnibus", or unparseable
    pub volume: Option<VolumeInfo>,
    pub confidence: f32,
    pub source: SeriesSource,
}

/// Field a review flag refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookField {
    Title,
    Subtitle,
    Series,
    Author,
    Narrator,
}

/// Suspicious-but-not-fatal condition found while normalizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewFlag {
    /// Phrase filtering reduced a non-empty field to nothing
    FieldEmptied { field: BookField, original: String },
    /// Both title and subtitle contain the series stem; no swap was made
    AmbiguousSwap { title: String, subtitle: String },
    /// Series position could not be parsed; the name carries no volume token
    VolumeUnparsed { position: String, reason: String },
    /// Series name was emptied by filtering; the book is named as a standalone
    SeriesDropped { name: String },
}

/// Metadata after swap correction, filtering and series resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBook {
    pub identifier: String,
    pub display_title: String,
    pub display_subtitle: Option<String>,
    pub was_swapped: bool,
    pub resolved_series: Option<ResolvedSeries>,
    pub authors_display: Vec<String>,
    pub narrators_display: Vec<String>,
    pub year: Option<i32>,
    /// Folder name the book was found in, kept for later reclassification
    pub source_folder: Option<String>,
    pub review_flags: Vec<ReviewFlag>,
}

impl NormalizedBook {
    /// First author, or an empty string if filtering emptied it
    pub fn primary_author(&self) -> &str {
        self.authors_display.first().map(String::as_str).unwrap_or("")
    }

    pub fn needs_review(&self) -> bool {
        !self.review_flags.is_empty()
    }
}

// ============================================================================
// Output
// ============================================================================

/// Final tracker-safe names for one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MamPath {
    pub folder_name: String,
    pub file_name: String,
    pub was_truncated: bool,
    /// Character length of `folder/file` before truncation
    pub original_length: usize,
    /// Six hex characters, present only when truncated
    pub truncation_hash: Option<String>,
}

impl MamPath {
    /// `folder_name/file_name`
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.folder_name, self.file_name)
    }

    /// Length in characters of [`MamPath::relative_path`]
    pub fn total_length(&self) -> usize {
        self.folder_name.chars().count() + 1 + self.file_name.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_minimal_record() {
        let record = RawMetadataRecord::new("B000000001", "Title", "Author");
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut record = RawMetadataRecord::new(" ", "Title", "Author");
        assert!(matches!(record.validate(), Err(NamingError::InvalidRecord(_))));

        record.identifier = "B000000001".to_string();
        record.title = "   ".to_string();
        assert!(matches!(record.validate(), Err(NamingError::InvalidRecord(_))));

        record.title = "Title".to_string();
        record.authors = vec![" ".to_string()];
        assert!(matches!(record.validate(), Err(NamingError::InvalidRecord(_))));

        record.authors.clear();
        assert!(matches!(record.validate(), Err(NamingError::InvalidRecord(_))));
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let json = r#"{"identifier":"B0ABCDEFGH","title":"Dune","authors":["Frank Herbert"]}"#;
        let record: RawMetadataRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.subtitle, None);
        assert!(record.narrators.is_empty());
        assert!(record.series_primary.is_none());
    }

    #[test]
    fn test_source_confidences() {
        assert_eq!(SeriesSource::Authoritative.confidence(), 1.0);
        assert_eq!(SeriesSource::PathHeuristic.confidence(), 0.9);
        assert_eq!(SeriesSource::TitleHeuristic.confidence(), 0.5);
    }

    #[test]
    fn test_mam_path_lengths() {
        let path = MamPath {
            folder_name: "abc".to_string(),
            file_name: "dé.m4b".to_string(),
            was_truncated: false,
            original_length: 10,
            truncation_hash: None,
        };
        assert_eq!(path.relative_path(), "abc/dé.m4b");
        assert_eq!(path.total_length(), 10);
    }
}
