//! Error types for mam-naming
//!
//! Taxonomy:
//! - `Configuration`: fatal, raised only while loading a rule set
//! - `Parse`: recoverable, a malformed volume token
//! - `BudgetExceeded`: fatal for one book, invariant tokens alone do not fit
//! - `InvalidRecord`: structurally invalid input record
//!
//! Suspicious-but-not-fatal conditions are not errors; they are reported as
//! [`crate::models::ReviewFlag`]s on the normalized book.

use crate::volume::VolumeParseError;
use thiserror::Error;

/// Naming pipeline error
#[derive(Debug, Error)]
pub enum NamingError {
    /// Rule document is malformed, has unknown keys, or contains a bad pattern
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Volume notation token could not be parsed
    ///
    /// The pipeline never fails on a bad position: it records a
    /// `ReviewFlag::VolumeUnparsed` instead. This variant exists so callers
    /// using [`crate::volume::parse_position`] directly can `?` into
    /// [`NamingResult`].
    #[error("Volume parse error: {0}")]
    Parse(#[from] VolumeParseError),

    /// Author, identifier, year, series prefix and extension alone exceed the budget
    #[error("Invariant name tokens need {required} characters but the budget is {budget}")]
    BudgetExceeded { required: usize, budget: usize },

    /// Input record is missing a required field
    #[error("Invalid metadata record: {0}")]
    InvalidRecord(String),

    /// mam-common error (config files, I/O)
    #[error(transparent)]
    Common(#[from] mam_common::Error),
}

/// Result type for naming operations
pub type NamingResult<T> = Result<T, NamingError>;
