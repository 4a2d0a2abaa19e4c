//! Naming Pipeline
//!
//! Top-level entry point: `RawMetadataRecord` → `NormalizedBook` → `MamPath`.
//!
//! # Architecture
//! - **Phase 1**: Normalize (series resolution, swap correction, phrase
//!   filtering, author canonicalization, review flags)
//! - **Phase 2**: Compose (series or standalone template)
//! - **Phase 3**: Enforce (filename safety, length budget, truncation)
//!
//! Every phase is a pure function of its input and the shared [`RuleSet`], so
//! running the pipeline twice on the same record yields the same `MamPath`.
//!
//! # Example
//! ```rust,ignore
//! let pipeline = NamingPipeline::new(Arc::new(RuleSet::load_file(path)?), PipelineConfig::default());
//! let path = pipeline.build_path(&record)?;
//! ```

use crate::composer::{ComposedName, NameComposer};
use crate::enforcer::PathConstraintEnforcer;
use crate::error::NamingResult;
use crate::models::{
    BookField, MamPath, NormalizedBook, RawMetadataRecord, ResolvedSeries, ReviewFlag,
};
use crate::phrase_filter::{PhraseFilterEngine, SubtitleDisposition};
use crate::rules::RuleSet;
use crate::series_resolver::{book_directory, SeriesResolver};
use crate::title_normalizer::{SwapDecision, TitleNormalizer};
use crate::upload::UploadMetadata;
use mam_common::config::{DEFAULT_FILE_EXTENSION, DEFAULT_PATH_BUDGET};
use mam_common::NamingConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Maximum characters in `folder/file`
    pub budget: usize,
    /// File extension without leading dot
    pub extension: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_PATH_BUDGET,
            extension: DEFAULT_FILE_EXTENSION.to_string(),
        }
    }
}

impl From<&NamingConfig> for PipelineConfig {
    fn from(config: &NamingConfig) -> Self {
        Self {
            budget: config.budget,
            extension: config.normalized_extension(),
        }
    }
}

/// Release naming pipeline
#[derive(Debug, Clone)]
pub struct NamingPipeline {
    rules: Arc<RuleSet>,
    config: PipelineConfig,
}

impl NamingPipeline {
    pub fn new(rules: Arc<RuleSet>, config: PipelineConfig) -> Self {
        Self { rules, config }
    }

    /// Build from resolved configuration, loading the rule file if one is set
    pub fn from_config(config: &NamingConfig) -> NamingResult<Self> {
        config.validate()?;

        let rules = match &config.rules_path {
            Some(path) => RuleSet::load_file(path)?,
            None => {
                info!("No rules_path configured, using permissive rule set");
                RuleSet::permissive()
            }
        };

        Ok(Self::new(Arc::new(rules), PipelineConfig::from(config)))
    }

    /// Same configuration, different rule set (used for reloads)
    pub fn with_rules(&self, rules: Arc<RuleSet>) -> Self {
        Self {
            rules,
            config: self.config.clone(),
        }
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Full pipeline for one record
    pub fn build_path(&self, record: &RawMetadataRecord) -> NamingResult<MamPath> {
        let book = self.normalize(record)?;
        let composed = self.compose(&book);
        self.enforce(&composed)
    }

    /// Upload form metadata for a record
    pub fn upload_metadata(&self, record: &RawMetadataRecord) -> NamingResult<UploadMetadata> {
        Ok(UploadMetadata::from_book(&self.normalize(record)?))
    }

    pub fn compose(&self, book: &NormalizedBook) -> ComposedName {
        NameComposer::new(&self.rules, &self.config.extension).compose(book)
    }

    pub fn enforce(&self, composed: &ComposedName) -> NamingResult<MamPath> {
        PathConstraintEnforcer::new(self.config.budget).enforce(composed)
    }

    /// Phase 1: resolve, swap, filter and flag
    pub fn normalize(&self, record: &RawMetadataRecord) -> NamingResult<NormalizedBook> {
        record.validate()?;

        let rules = self.rules.as_ref();
        let filter = PhraseFilterEngine::new(rules);
        let mut flags = Vec::new();

        // Series
        let resolution = SeriesResolver::new().resolve(record);
        let mut resolved_series = None;
        if let Some(resolution) = resolution {
            if let Some(error) = &resolution.volume_error {
                flags.push(ReviewFlag::VolumeUnparsed {
                    position: resolution.position.clone(),
                    reason: error.to_string(),
                });
            }

            let filtered = filter.filter_series(&resolution.name);
            if filtered.text.is_empty() {
                flags.push(ReviewFlag::SeriesDropped {
                    name: resolution.name.clone(),
                });
            } else {
                resolved_series = Some(ResolvedSeries {
                    name: filtered.text,
                    volume: resolution.volume,
                    confidence: resolution.confidence,
                    source: resolution.source,
                });
            }
        }

        // Swap
        let authoritative_name = record
            .series_primary
            .as_ref()
            .map(|s| s.name.as_str())
            .filter(|n| !n.trim().is_empty());
        let titles = TitleNormalizer::new(rules).normalize(
            &record.title,
            record.subtitle.as_deref(),
            authoritative_name,
        );
        if titles.decision == SwapDecision::BothMatch {
            flags.push(ReviewFlag::AmbiguousSwap {
                title: titles.display_title.clone(),
                subtitle: titles.display_subtitle.clone().unwrap_or_default(),
            });
        }

        // Title
        let title = filter.filter_title(&titles.display_title);
        if title.emptied {
            flags.push(ReviewFlag::FieldEmptied {
                field: BookField::Title,
                original: titles.display_title.clone(),
            });
        }

        // Subtitle
        let display_subtitle = match titles.display_subtitle.as_deref() {
            None => None,
            Some(subtitle) => match filter.filter_subtitle(subtitle, resolved_series.as_ref()) {
                SubtitleDisposition::Kept(field) => {
                    if field.emptied {
                        flags.push(ReviewFlag::FieldEmptied {
                            field: BookField::Subtitle,
                            original: subtitle.to_string(),
                        });
                    }
                    Some(field.text)
                }
                SubtitleDisposition::Dropped(reason) => {
                    debug!(subtitle, reason = ?reason, "Subtitle dropped");
                    None
                }
            },
        };

        // People
        let authors_display = self.people(&record.authors, BookField::Author, &mut flags);
        let narrators_display = self.people(&record.narrators, BookField::Narrator, &mut flags);

        for flag in &flags {
            warn!(identifier = %record.identifier, flag = ?flag, "Book flagged for review");
        }

        let book = NormalizedBook {
            identifier: record.identifier.trim().to_string(),
            display_title: title.text,
            display_subtitle,
            was_swapped: titles.was_swapped,
            resolved_series,
            authors_display,
            narrators_display,
            year: record.release_year,
            source_folder: record.source_path.as_deref().and_then(source_folder),
            review_flags: flags,
        };

        debug!(
            identifier = %book.identifier,
            title = %book.display_title,
            series = ?book.resolved_series.as_ref().map(|s| s.name.as_str()),
            swapped = book.was_swapped,
            flags = book.review_flags.len(),
            "Normalized book"
        );

        Ok(book)
    }

    /// Canonicalize, filter and deduplicate author or narrator names
    ///
    /// Names emptied by filtering stay in place as empty strings so the primary
    /// author position is not silently taken by a co-author.
    fn people(&self, raw: &[String], field: BookField, flags: &mut Vec<ReviewFlag>) -> Vec<String> {
        let filter = PhraseFilterEngine::new(&self.rules);
        let mut out: Vec<String> = Vec::with_capacity(raw.len());

        for name in raw.iter().filter(|n| !n.trim().is_empty()) {
            let canonical = self.rules.canonical_author(name);
            let filtered = filter.filter_person(&canonical);

            if filtered.emptied {
                flags.push(ReviewFlag::FieldEmptied {
                    field,
                    original: name.clone(),
                });
                out.push(String::new());
                continue;
            }

            let duplicate = out
                .iter()
                .any(|existing| existing.to_lowercase() == filtered.text.to_lowercase());
            if !duplicate {
                out.push(filtered.text);
            }
        }

        out
    }
}

/// Folder a book was found in: the parent for a file path, else the path itself
fn source_folder(path: &Path) -> Option<String> {
    book_directory(path)?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SeriesEntry, SeriesSource};
    use crate::rules::{MatchMode, PhraseCategoryDocument, RuleDocument};
    use std::path::PathBuf;

    fn rules() -> Arc<RuleSet> {
        let mut doc = RuleDocument::empty("1.0.0");
        doc.format_indicators = Some(PhraseCategoryDocument::phrases(
            MatchMode::Phrase,
            &["Unabridged", "Audiobook"],
        ));
        doc.series_suffixes = vec![r"\s+series$".to_string()];
        doc.author_map.insert("J.R.R. Tolkien".to_string(), "J. R. R. Tolkien".to_string());
        Arc::new(RuleSet::from_document(&doc).unwrap())
    }

    fn pipeline() -> NamingPipeline {
        NamingPipeline::new(rules(), PipelineConfig::default())
    }

    #[test]
    fn test_normalize_filters_and_canonicalizes() {
        let mut record = RawMetadataRecord::new("B0ABCDEFGH", "The Hobbit (Unabridged)", "J.R.R. Tolkien");
        record.authors.push("j.r.r. tolkien".to_string());
        record.narrators = vec!["Andy Serkis".to_string()];
        record.release_year = Some(2020);

        let book = pipeline().normalize(&record).unwrap();
        assert_eq!(book.display_title, "The Hobbit");
        assert_eq!(book.authors_display, vec!["J. R. R. Tolkien".to_string()]);
        assert_eq!(book.narrators_display, vec!["Andy Serkis".to_string()]);
        assert!(!book.needs_review());
    }

    #[test]
    fn test_series_suffix_stripped_from_resolved_name() {
        let mut record = RawMetadataRecord::new("B0ABCDEFGH", "Leviathan Wakes", "James S. A. Corey");
        record.series_primary = Some(SeriesEntry::new("The Expanse Series", "1"));

        let book = pipeline().normalize(&record).unwrap();
        let series = book.resolved_series.unwrap();
        assert_eq!(series.name, "The Expanse");
        assert_eq!(series.volume.unwrap().to_string(), "01");
    }

    #[test]
    fn test_unparsed_volume_flagged() {
        let mut record = RawMetadataRecord::new("B0ABCDEFGH", "Dune", "Frank Herbert");
        record.series_primary = Some(SeriesEntry::new("Dune Chronicles", "1-2p3"));

        let book = pipeline().normalize(&record).unwrap();
        assert!(book.resolved_series.as_ref().unwrap().volume.is_none());
        assert!(matches!(
            book.review_flags.as_slice(),
            [ReviewFlag::VolumeUnparsed { position, .. }] if position == "1-2p3"
        ));
    }

    #[test]
    fn test_emptied_title_retained_and_flagged() {
        let record = RawMetadataRecord::new("B0ABCDEFGH", "Audiobook", "Someone");
        let book = pipeline().normalize(&record).unwrap();
        assert_eq!(book.display_title, "");
        assert!(book.review_flags.contains(&ReviewFlag::FieldEmptied {
            field: BookField::Title,
            original: "Audiobook".to_string(),
        }));
    }

    #[test]
    fn test_source_folder_recorded() {
        let mut record = RawMetadataRecord::new("B0ABCDEFGH", "Dune", "Frank Herbert");
        record.source_path = Some(PathBuf::from("/library/Frank Herbert - Dune/dune.m4b"));
        let book = pipeline().normalize(&record).unwrap();
        assert_eq!(book.source_folder.as_deref(), Some("Frank Herbert - Dune"));
    }

    #[test]
    fn test_dotted_source_folder_is_the_book_folder() {
        let mut record = RawMetadataRecord::new("B0ABCDEFGH", "Dr. Stone", "Riichiro Inagaki");
        record.source_path = Some(PathBuf::from("/lib/Dr. Stone Vol. 3"));

        let book = pipeline().normalize(&record).unwrap();
        assert_eq!(book.source_folder.as_deref(), Some("Dr. Stone Vol. 3"));
        let series = book.resolved_series.unwrap();
        assert_eq!(series.name, "Dr. Stone");
        assert_eq!(series.source, SeriesSource::PathHeuristic);
    }

    #[test]
    fn test_invalid_record_rejected() {
        let record = RawMetadataRecord::new("", "Dune", "Frank Herbert");
        assert!(pipeline().build_path(&record).is_err());
    }

    #[test]
    fn test_config_conversion() {
        let mut config = NamingConfig::default();
        config.budget = 180;
        config.file_extension = "MP3".to_string();
        let converted = PipelineConfig::from(&config);
        assert_eq!(converted.budget, 180);
        assert_eq!(converted.extension, "mp3");
    }

    #[test]
    fn test_from_config_without_rules_is_permissive() {
        let pipeline = NamingPipeline::from_config(&NamingConfig::default()).unwrap();
        assert!(pipeline.rules().categories().is_empty());
        assert_eq!(pipeline.config().budget, 225);
    }
}
