//! Property-based tests for path constraints and phrase filtering
//! **Properties: length budget, invariant preservation, filename safety,
//! determinism, monotonic filtering**

use mam_naming::phrase_filter::{PhraseFilterEngine, SubtitleDisposition};
use mam_naming::safety::is_safe_name;
use mam_naming::text::char_len;
use mam_naming::{
    NamingPipeline, PipelineConfig, RawMetadataRecord, ResolvedSeries, RuleSet, SeriesSource,
};
use proptest::prelude::*;
use std::path::Path;
use std::sync::Arc;

fn fixture_rules() -> RuleSet {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/rules.json");
    RuleSet::load_file(&path).unwrap()
}

/// Titles up to ~400 chars with separators, unsafe characters, accents,
/// combining marks and CJK. The letter set cannot spell a volume label, so
/// every record is a standalone.
fn title_strategy() -> impl Strategy<Value = String> {
    "[a-jA-J][a-jA-J0-9 ,:'!?/|*\"é魔ü\u{301}\\-]{0,400}"
}

fn author_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,15} [A-Z][a-z]{1,20}"
}

/// Field text built from noise phrases and ordinary words
fn noisy_field_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("Unabridged".to_string()),
            Just("(Audiobook)".to_string()),
            Just("[Light Novel]".to_string()),
            Just("Yen Audio".to_string()),
            Just("An Isekai Adventure".to_string()),
            Just("Re:Zero".to_string()),
            Just(",".to_string()),
            Just("-".to_string()),
            "[a-zA-Z]{1,10}",
        ],
        0..16,
    )
    .prop_map(|words| words.join(" "))
}

#[test]
fn prop_paths_fit_default_budget() {
    let pipeline = NamingPipeline::new(Arc::new(fixture_rules()), PipelineConfig::default());

    proptest!(|(title in title_strategy(), author in author_strategy(), year in proptest::option::of(1900i32..2100))| {
        let mut record = RawMetadataRecord::new("B0PROPTEST", title, author.clone());
        record.release_year = year;

        let path = pipeline.build_path(&record).unwrap();
        prop_assert!(path.total_length() <= 225, "{} chars: {}", path.total_length(), path.relative_path());

        // Invariant tokens survive truncation untouched
        let year_token = match year {
            Some(y) => format!("({})", y),
            None => "(Unknown)".to_string(),
        };
        let tail = format!(" {} ({}) {{ID.B0PROPTEST}}", year_token, author);
        let folder_tail = format!("{} [MAMRip]", tail);
        let file_tail = format!("{}.m4b", tail);
        prop_assert!(path.folder_name.ends_with(&folder_tail));
        prop_assert!(path.file_name.ends_with(&file_tail));

        prop_assert!(is_safe_name(&path.folder_name));
        prop_assert!(is_safe_name(&path.file_name));
        prop_assert_eq!(path.was_truncated, path.truncation_hash.is_some());
    });
}

#[test]
fn prop_paths_fit_configured_budget() {
    proptest!(|(title in title_strategy(), budget in 120usize..400)| {
        let pipeline = NamingPipeline::new(
            Arc::new(RuleSet::permissive()),
            PipelineConfig { budget, extension: "m4b".to_string() },
        );
        let record = RawMetadataRecord::new("B0PROPTEST", title, "Jane Doe");
        let path = pipeline.build_path(&record).unwrap();
        prop_assert!(path.total_length() <= budget);
    });
}

#[test]
fn prop_build_path_is_deterministic() {
    let pipeline = NamingPipeline::new(Arc::new(fixture_rules()), PipelineConfig::default());

    proptest!(|(title in title_strategy(), subtitle in proptest::option::of(title_strategy()))| {
        let mut record = RawMetadataRecord::new("B0PROPTEST", title, "Jane Doe");
        record.subtitle = subtitle;
        prop_assert_eq!(pipeline.build_path(&record).unwrap(), pipeline.build_path(&record).unwrap());
    });
}

#[test]
fn prop_filtering_never_lengthens() {
    let rules = fixture_rules();
    let engine = PhraseFilterEngine::new(&rules);

    let series = ResolvedSeries {
        name: "Some Series".to_string(),
        volume: None,
        confidence: 1.0,
        source: SeriesSource::Authoritative,
    };

    proptest!(|(text in noisy_field_strategy())| {
        let before = char_len(&text);
        prop_assert!(char_len(&engine.filter_title(&text).text) <= before);
        prop_assert!(char_len(&engine.filter_series(&text).text) <= before);
        prop_assert!(char_len(&engine.filter_person(&text).text) <= before);
        if let SubtitleDisposition::Kept(field) = engine.filter_subtitle(&text, Some(&series)) {
            prop_assert!(char_len(&field.text) <= before);
        }
    });
}

#[test]
fn prop_preserved_literal_never_removed() {
    let rules = fixture_rules();
    let engine = PhraseFilterEngine::new(&rules);

    proptest!(|(text in noisy_field_strategy())| {
        prop_assume!(text.contains("Re:Zero"));
        let filtered = engine.filter_title(&text);
        prop_assert!(filtered.text.contains("Re:Zero"), "{:?} -> {:?}", text, filtered.text);
    });
}
