//! Unit tests for rule document loading from disk

use mam_naming::rules::{PhraseCategory, SubtitleAction};
use mam_naming::{NamingError, NamingPipeline, RuleSet};
use mam_common::NamingConfig;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_rules(dir: &TempDir, json: &str) -> std::path::PathBuf {
    let path = dir.path().join("rules.json");
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_fixture_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/rules.json");
    let rules = RuleSet::load_file(&path).unwrap();

    assert_eq!(rules.version().to_string(), "1.2.0");
    assert_eq!(rules.categories().len(), 3);
    assert!(rules.category(PhraseCategory::PublisherTags).unwrap().case_sensitive);
    assert_eq!(rules.series_suffixes().len(), 3);
    assert_eq!(rules.ripper_tag(), Some("MAMRip"));
    assert!(rules.is_preserved("Re:Zero"));

    let actions: Vec<SubtitleAction> = rules.subtitle_remove_rules().iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            SubtitleAction::DropSubtitle,
            SubtitleAction::DropSubtitle,
            SubtitleAction::StripMatch
        ]
    );
}

#[test]
fn test_missing_file_is_common_error() {
    let dir = TempDir::new().unwrap();
    let result = RuleSet::load_file(&dir.path().join("absent.json"));
    assert!(matches!(result, Err(NamingError::Common(_))));
}

#[test]
fn test_bad_regex_names_file_and_entry() {
    let dir = TempDir::new().unwrap();
    let path = write_rules(&dir, r#"{"_version":"1.0.0","series_suffixes":["(unclosed"]}"#);

    match RuleSet::load_file(&path) {
        Err(NamingError::Configuration(msg)) => {
            assert!(msg.contains("rules.json"), "{}", msg);
            assert!(msg.contains("series_suffixes[0]"), "{}", msg);
        }
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
fn test_unknown_key_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_rules(&dir, r#"{"_version":"1.0.0","ripper":"X"}"#);
    assert!(matches!(RuleSet::load_file(&path), Err(NamingError::Configuration(_))));
}

#[test]
fn test_unsupported_major_version_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_rules(&dir, r#"{"_version":"2.0.0"}"#);
    assert!(matches!(RuleSet::load_file(&path), Err(NamingError::Configuration(_))));
}

#[test]
fn test_reload_builds_fresh_instance() {
    let dir = TempDir::new().unwrap();
    let path = write_rules(&dir, r#"{"_version":"1.0.0","ripper_tag":"First"}"#);
    let first = Arc::new(RuleSet::load_file(&path).unwrap());

    fs::write(&path, r#"{"_version":"1.1.0","ripper_tag":"Second"}"#).unwrap();
    let second = Arc::new(RuleSet::load_file(&path).unwrap());

    assert_eq!(first.ripper_tag(), Some("First"));
    assert_eq!(second.ripper_tag(), Some("Second"));
}

#[test]
fn test_pipeline_from_config_loads_rules() {
    let dir = TempDir::new().unwrap();
    let path = write_rules(&dir, r#"{"_version":"1.0.0","ripper_tag":"Tagged"}"#);

    let config = NamingConfig {
        rules_path: Some(path),
        ..NamingConfig::default()
    };
    let pipeline = NamingPipeline::from_config(&config).unwrap();
    assert_eq!(pipeline.rules().ripper_tag(), Some("Tagged"));
}

#[test]
fn test_pipeline_from_config_rejects_small_budget() {
    let config = NamingConfig {
        budget: 10,
        ..NamingConfig::default()
    };
    assert!(matches!(
        NamingPipeline::from_config(&config),
        Err(NamingError::Common(mam_common::Error::Config(_)))
    ));
}

#[test]
fn test_rule_set_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RuleSet>();
    assert_send_sync::<NamingPipeline>();
}
