//! Config Validation Tests
//!
//! Typo detection on raw TOML and range validation on parsed configs,
//! exercised through the public config API.

use std::io::Write;

use maintenance_analyzer::config::validation::{
    known_config_keys, suggest_correction, validate_unknown_keys,
};
use maintenance_analyzer::config::{AnalysisConfig, CategoricalEncoding};
use maintenance_analyzer::types::AnomalyMethod;
use maintenance_analyzer::ConfigError;

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_anomaly_section_warns_with_suggestion() {
    let toml_str = r#"
[anomaly]
threshold_percentil = 95.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "anomaly.threshold_percentil");
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("anomaly.threshold_percentile")
    );
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[classifier]
sample_size = 500

[features]
categorical_encoding = "frequency"
max_one_hot_levels = 10

[model]
holdout_ratio = 0.25
seed = 7
min_rows = 20

[anomaly]
method = "z_score"
threshold_percentile = 95.0

[insights]
top_n_features = 5
"#;
    assert!(validate_unknown_keys(toml_str).is_empty());
}

#[test]
fn unrelated_key_gets_no_suggestion() {
    let warnings = validate_unknown_keys("[model]\nwarehouse_url = \"db://x\"\n");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].suggestion.is_none());
}

#[test]
fn every_section_is_a_known_key() {
    let known = known_config_keys();
    for section in ["classifier", "features", "model", "anomaly", "insights"] {
        assert!(known.contains(section), "missing section {section}");
    }
    assert_eq!(
        suggest_correction("model.sed", &known).as_deref(),
        Some("model.seed")
    );
}

// ============================================================================
// Parsing and Range Validation
// ============================================================================

#[test]
fn partial_file_keeps_defaults_elsewhere() {
    let config = AnalysisConfig::from_toml_str(
        r#"
[features]
categorical_encoding = "frequency"

[anomaly]
method = "z_score"
"#,
    )
    .unwrap();

    assert_eq!(config.features.categorical_encoding, CategoricalEncoding::Frequency);
    assert_eq!(config.anomaly.method, AnomalyMethod::ZScore);
    assert_eq!(config.model, AnalysisConfig::default().model);
}

#[test]
fn out_of_range_values_are_all_reported() {
    let err = AnalysisConfig::from_toml_str(
        r#"
[model]
holdout_ratio = 1.5
min_rows = 0

[anomaly]
threshold_percentile = 140.0
"#,
    )
    .unwrap_err();

    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 3, "got {errors:?}");
            assert!(errors.iter().any(|e| e.contains("holdout_ratio")));
            assert!(errors.iter().any(|e| e.contains("threshold_percentile")));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn load_from_file_round_trips() {
    let mut config = AnalysisConfig::default();
    config.model.seed = 1234;
    config.anomaly.score_threshold = Some(0.65);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config.to_toml().unwrap().as_bytes()).unwrap();

    let loaded = AnalysisConfig::load_from_file(file.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AnalysisConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}
