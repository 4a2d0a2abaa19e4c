//! Series resolution from ranked sources
//!
//! Sources are tried in order and the first success wins:
//!
//! | Source                        | Confidence |
//! |-------------------------------|------------|
//! | authoritative `series_primary` | 1.0       |
//! | source path layout             | 0.9       |
//! | title / subtitle regex         | 0.5       |
//!
//! No match means the book is a standalone, which is a normal outcome.
//!
//! The authoritative source wins on its name alone: an unparseable position
//! keeps the series and drops the volume token (the error is returned for
//! flagging). Heuristic sources only count as a success when their volume
//! token parses.

use crate::models::{RawMetadataRecord, SeriesEntry, SeriesSource};
use crate::text::collapse_whitespace;
use crate::volume::{parse_position, VolumeInfo, VolumeParseError, VOLUME_TOKEN_PATTERN};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// `<Series> vol_NN ...` (names this crate produced earlier)
static PATH_VOL_UNDERSCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<series>.+?)\s+vol_(?P<volume>{})\b",
        VOLUME_TOKEN_PATTERN
    ))
    .expect("valid regex")
});

/// `<Series> Vol. N ...`, `<Series>, Book N ...`, `<Series> - Book N ...`
static PATH_LABELED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<series>.+?)\s*[,:\-]?\s+(?:vol(?:ume)?\.?|book)\s*(?P<volume>{})\b",
        VOLUME_TOKEN_PATTERN
    ))
    .expect("valid regex")
});

/// `<N> - <Title>` or `Book <N> - <Title>` inside a series directory
static PATH_NUMBERED_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:(?:book|vol(?:ume)?\.?)\s*)?(?P<volume>{})\s*[-.]\s+\S",
        VOLUME_TOKEN_PATTERN
    ))
    .expect("valid regex")
});

/// `<base title>[,:]? (Vol(ume)?|Book) <number>`
static TITLE_HEURISTIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<series>.+?)\s*[,:]?\s+(?:vol(?:ume)?\.?|book)\s*(?P<volume>{})\b",
        VOLUME_TOKEN_PATTERN
    ))
    .expect("valid regex")
});

/// Raw series guess from one source, before the position is parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesCandidate {
    pub name: String,
    pub position: String,
    pub source: SeriesSource,
}

/// Winning candidate with its parsed volume
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesResolution {
    pub name: String,
    pub position: String,
    pub volume: Option<VolumeInfo>,
    pub source: SeriesSource,
    pub confidence: f32,
    /// Set when an authoritative position failed to parse
    pub volume_error: Option<VolumeParseError>,
}

/// Picks series name and position from ranked sources
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesResolver;

impl SeriesResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the series for a record, or `None` for a standalone
    pub fn resolve(&self, record: &RawMetadataRecord) -> Option<SeriesResolution> {
        if let Some(candidate) = record.series_primary.as_ref().and_then(Self::from_authoritative) {
            let (volume, volume_error) = match parse_position(&candidate.position) {
                Ok(volume) => (volume, None),
                Err(e) => {
                    debug!(
                        position = %candidate.position,
                        error = %e,
                        "Authoritative position unparseable, keeping series without volume"
                    );
                    (None, Some(e))
                }
            };
            return Some(Self::finish(candidate, volume, volume_error));
        }

        let heuristics = [
            record.source_path.as_deref().and_then(Self::from_path),
            Self::from_title(&record.title),
            record.subtitle.as_deref().and_then(Self::from_title),
        ];

        for candidate in heuristics.into_iter().flatten() {
            match parse_position(&candidate.position) {
                Ok(volume) => return Some(Self::finish(candidate, volume, None)),
                Err(e) => {
                    debug!(
                        source = ?candidate.source,
                        position = %candidate.position,
                        error = %e,
                        "Heuristic series candidate rejected"
                    );
                }
            }
        }

        debug!(identifier = %record.identifier, "No series resolved, treating as standalone");
        None
    }

    /// Authoritative metadata field
    pub fn from_authoritative(entry: &SeriesEntry) -> Option<SeriesCandidate> {
        let name = collapse_whitespace(&entry.name);
        if name.is_empty() {
            return None;
        }
        Some(SeriesCandidate {
            name,
            position: entry.position.trim().to_string(),
            source: SeriesSource::Authoritative,
        })
    }

    /// Parent-directory heuristic
    ///
    /// See [`book_directory`] for how a file path is told apart from a folder.
    pub fn from_path(path: &Path) -> Option<SeriesCandidate> {
        let book_dir = book_directory(path)?;
        let folder = book_dir.file_name()?.to_str()?.trim();

        for pattern in [&*PATH_VOL_UNDERSCORE, &*PATH_LABELED] {
            if let Some(caps) = pattern.captures(folder) {
                let name = clean_series_name(&caps["series"]);
                if !name.is_empty() {
                    return Some(SeriesCandidate {
                        name,
                        position: caps["volume"].to_string(),
                        source: SeriesSource::PathHeuristic,
                    });
                }
            }
        }

        if let Some(caps) = PATH_NUMBERED_ENTRY.captures(folder) {
            let series_dir = book_dir.parent()?.file_name()?.to_str()?;
            let name = clean_series_name(series_dir);
            if !name.is_empty() {
                return Some(SeriesCandidate {
                    name,
                    position: caps["volume"].to_string(),
                    source: SeriesSource::PathHeuristic,
                });
            }
        }

        None
    }

    /// `"<base title>[,:]? (Vol(ume)?|Book) <number>"`
    pub fn from_title(title: &str) -> Option<SeriesCandidate> {
        let caps = TITLE_HEURISTIC.captures(title.trim())?;
        let name = clean_series_name(&caps["series"]);
        if name.is_empty() {
            return None;
        }
        Some(SeriesCandidate {
            name,
            position: caps["volume"].to_string(),
            source: SeriesSource::TitleHeuristic,
        })
    }

    fn finish(
        candidate: SeriesCandidate,
        volume: Option<VolumeInfo>,
        volume_error: Option<VolumeParseError>,
    ) -> SeriesResolution {
        debug!(
            series = %candidate.name,
            source = ?candidate.source,
            volume = ?volume.map(|v| v.to_string()),
            "Series resolved"
        );
        SeriesResolution {
            confidence: candidate.source.confidence(),
            name: candidate.name,
            position: candidate.position,
            volume,
            source: candidate.source,
            volume_error,
        }
    }
}

fn clean_series_name(raw: &str) -> String {
    collapse_whitespace(raw.trim_end_matches(|c: char| matches!(c, ',' | ':' | '-' | ' ')))
}

/// Folder holding a book: the parent when `path` names a file, else `path`
///
/// Only a short alphanumeric extension with at least one letter (`m4b`,
/// `mp3`, `flac`) marks a file. Folder names such as `Dr. Stone Vol. 3` or
/// `Cradle Book 1.5` keep their dot.
pub fn book_directory(path: &Path) -> Option<&Path> {
    let is_file = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic())
        });
    if is_file {
        path.parent()
    } else {
        Some(path)
    }
}
