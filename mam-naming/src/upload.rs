//! Upload form metadata
//!
//! The tracker's upload form takes a small JSON document alongside the
//! release. It is derived from the normalized book only, so it always agrees
//! with the release name.

use crate::models::NormalizedBook;
use serde::{Deserialize, Serialize};

/// One series entry on the upload form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSeries {
    pub name: String,
    /// Unpadded volume number (`16`, `1.5`, `1-3`, `1p2`); absent without a volume
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

/// Upload form metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub narrators: Vec<String>,
    pub series: Vec<UploadSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl UploadMetadata {
    pub fn from_book(book: &NormalizedBook) -> Self {
        let non_blank = |names: &[String]| -> Vec<String> {
            names
                .iter()
                .filter(|n| !n.trim().is_empty())
                .cloned()
                .collect()
        };

        Self {
            title: book.display_title.clone(),
            subtitle: book
                .display_subtitle
                .clone()
                .filter(|s| !s.trim().is_empty()),
            authors: non_blank(&book.authors_display),
            narrators: non_blank(&book.narrators_display),
            series: book
                .resolved_series
                .iter()
                .map(|s| UploadSeries {
                    name: s.name.clone(),
                    number: s.volume.as_ref().map(|v| v.upload_number()),
                })
                .collect(),
            year: book.year,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResolvedSeries, SeriesSource};
    use crate::volume::parse_volume;
    use serde_json::json;

    fn book() -> NormalizedBook {
        NormalizedBook {
            identifier: "B08XYZ1234".to_string(),
            display_title: "Sword Art Online 16".to_string(),
            display_subtitle: Some("Alicization Exploding".to_string()),
            was_swapped: true,
            resolved_series: Some(ResolvedSeries {
                name: "Sword Art Online".to_string(),
                volume: Some(parse_volume("16").unwrap()),
                confidence: 1.0,
                source: SeriesSource::Authoritative,
            }),
            authors_display: vec!["Reki Kawahara".to_string(), String::new()],
            narrators_display: vec!["Bryce Papenbrook".to_string()],
            year: Some(2020),
            source_folder: None,
            review_flags: vec![],
        }
    }

    #[test]
    fn test_from_book() {
        let upload = UploadMetadata::from_book(&book());
        let value = serde_json::to_value(&upload).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Sword Art Online 16",
                "subtitle": "Alicization Exploding",
                "authors": ["Reki Kawahara"],
                "narrators": ["Bryce Papenbrook"],
                "series": [{"name": "Sword Art Online", "number": "16"}],
                "year": 2020
            })
        );
    }

    #[test]
    fn test_unpadded_numbers() {
        let mut b = book();
        for (token, expected) in [("1.5", "1.5"), ("1-3", "1-3"), ("1p2", "1p2"), ("07", "7")] {
            b.resolved_series.as_mut().unwrap().volume = Some(parse_volume(token).unwrap());
            let upload = UploadMetadata::from_book(&b);
            assert_eq!(upload.series[0].number.as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_standalone_omits_optional_fields() {
        let mut b = book();
        b.resolved_series = None;
        b.display_subtitle = None;
        b.year = None;
        let value = serde_json::to_value(UploadMetadata::from_book(&b)).unwrap();
        assert_eq!(value["series"], json!([]));
        assert!(value.get("subtitle").is_none());
        assert!(value.get("year").is_none());
    }

    #[test]
    fn test_to_json_round_trips() {
        let upload = UploadMetadata::from_book(&book());
        let parsed: UploadMetadata = serde_json::from_str(&upload.to_json().unwrap()).unwrap();
        assert_eq!(parsed, upload);
    }
}
