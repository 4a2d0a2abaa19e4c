//! mam-naming library interface
//!
//! Canonical, filesystem-safe, length-constrained release names for
//! audiobooks, built from noisy provider metadata.
//!
//! ```text
//! RawMetadataRecord ──normalize──▶ NormalizedBook ──compose──▶ ComposedName ──enforce──▶ MamPath
//! ```
//!
//! [`NamingPipeline`] runs all three phases; the components are public for
//! callers that need one stage on its own.

pub mod classify;
pub mod composer;
pub mod enforcer;
pub mod error;
pub mod models;
pub mod phrase_filter;
pub mod pipeline;
pub mod rules;
pub mod safety;
pub mod series_resolver;
pub mod text;
pub mod title_normalizer;
pub mod upload;
pub mod volume;

pub use crate::classify::{classify_release_folder, FolderClassification};
pub use crate::composer::{ComposedName, NameComposer, NameParts};
pub use crate::enforcer::PathConstraintEnforcer;
pub use crate::error::{NamingError, NamingResult};
pub use crate::models::{
    BookField, MamPath, NormalizedBook, RawMetadataRecord, ResolvedSeries, ReviewFlag,
    SeriesEntry, SeriesSource,
};
pub use crate::phrase_filter::PhraseFilterEngine;
pub use crate::pipeline::{NamingPipeline, PipelineConfig};
pub use crate::rules::RuleSet;
pub use crate::series_resolver::SeriesResolver;
pub use crate::title_normalizer::TitleNormalizer;
pub use crate::upload::{UploadMetadata, UploadSeries};
pub use crate::volume::{format_volume, parse_position, parse_volume, VolumeInfo, VolumeParseError};
