//! Release folder classification
//!
//! Best-effort guess at what an existing folder holds, used when importing a
//! library that was not named by this crate. The original name is always kept
//! so a wrong guess loses nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `{ID.<identifier>}` as written by the composer
static ID_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{ID\.([^{}\s]+)\}").expect("valid regex"));

/// Amazon-style identifier: `B0` followed by eight alphanumerics
static ASIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(B0[A-Z0-9]{8})\b").expect("valid regex"));

/// `{Author} - {Title}`
static HOMEBREW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<author>[^-]+?)\s+-\s+(?P<title>.+)$").expect("valid regex"));

/// What a release folder appears to be
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FolderClassification {
    /// Carries an external identifier
    Identified { identifier: String, original: String },
    /// `Author - Title` with no identifier
    Homebrew {
        author: String,
        title: String,
        original: String,
    },
    Unclassified { original: String },
}

impl FolderClassification {
    pub fn original(&self) -> &str {
        match self {
            FolderClassification::Identified { original, .. }
            | FolderClassification::Homebrew { original, .. }
            | FolderClassification::Unclassified { original } => original,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            FolderClassification::Identified { identifier, .. } => Some(identifier),
            _ => None,
        }
    }
}

/// Classify a folder name
pub fn classify_release_folder(name: &str) -> FolderClassification {
    let original = name.to_string();
    let trimmed = name.trim();

    let identifier = ID_TOKEN
        .captures(trimmed)
        .or_else(|| ASIN.captures(trimmed))
        .map(|caps| caps[1].to_string());

    let classification = if let Some(identifier) = identifier {
        FolderClassification::Identified {
            identifier,
            original,
        }
    } else if let Some(caps) = HOMEBREW.captures(trimmed) {
        FolderClassification::Homebrew {
            author: caps["author"].trim().to_string(),
            title: caps["title"].trim().to_string(),
            original,
        }
    } else {
        FolderClassification::Unclassified { original }
    };

    debug!(folder = %name, classification = ?classification, "Classified release folder");
    classification
}
