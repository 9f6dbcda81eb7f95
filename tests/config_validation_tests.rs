//! Config Validation Tests
//!
//! Typo detection and range validation for the engine config, exercised
//! independently from fitting.

use dca_engine::config::validation::{known_config_keys, suggest_correction, validate_unknown_keys};
use dca_engine::config::{ConfigError, EngineConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_fitting_key_warns_with_suggestion() {
    let toml_str = r#"
[fitting]
max_iteration = 50
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("max_iteration"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("fitting.max_iterations")
    );
}

#[test]
fn typo_in_forecast_section_warns() {
    let toml_str = r#"
[forecast]
step_dayz = 30.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("forecast.step_days"));
    assert!(warnings[0].to_string().contains("did you mean"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[fitting]
b_min = 0.0
b_max = 1.5
initial_b = 0.5
max_iterations = 300
confidence_level = 0.9

[forecast]
step_days = 30.4
default_days = 7300
default_economic_limit = 5.0

[import]
rate_unit = "m3/d"
target_rate_unit = "bbl/d"
"#;
    assert!(validate_unknown_keys(toml_str).is_empty());
}

#[test]
fn typo_in_import_section_warns() {
    let warnings = validate_unknown_keys("[import]\nrate_units = \"m3/d\"\n");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("import.rate_unit"));
}

#[test]
fn every_default_key_is_known() {
    let toml = EngineConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&toml).is_empty());
    assert!(known_config_keys().contains("fitting.b_max"));
    assert_eq!(
        suggest_correction("fiting.b_max", &known_config_keys()).as_deref(),
        Some("fitting.b_max")
    );
}

#[test]
fn unknown_keys_do_not_reject_the_file() {
    let config = EngineConfig::from_toml_str("[fitting]\nb_maxx = 1.0\nb_max = 1.2\n").unwrap();
    assert_eq!(config.fitting.b_max, 1.2);
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn inverted_b_bounds_rejected() {
    let err = EngineConfig::from_toml_str("[fitting]\nb_min = 1.5\nb_max = 1.0\ninitial_b = 1.2\n")
        .unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.contains("b_max")), "{errors:?}");
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn confidence_level_must_be_a_probability() {
    assert!(EngineConfig::from_toml_str("[fitting]\nconfidence_level = 1.0\n").is_err());
    assert!(EngineConfig::from_toml_str("[fitting]\nconfidence_level = 0.0\n").is_err());
    assert!(EngineConfig::from_toml_str("[fitting]\nconfidence_level = 0.8\n").is_ok());
}

#[test]
fn min_points_below_three_rejected() {
    assert!(EngineConfig::from_toml_str("[fitting]\nmin_points = 2\n").is_err());
}

#[test]
fn negative_economic_limit_rejected() {
    assert!(EngineConfig::from_toml_str("[forecast]\ndefault_economic_limit = -1.0\n").is_err());
}

#[test]
fn wrong_type_is_a_parse_error() {
    assert!(matches!(
        EngineConfig::from_toml_str("[fitting]\nmax_iterations = \"many\"\n"),
        Err(ConfigError::Parse(..))
    ));
}

#[test]
fn load_from_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dca_config.toml");
    std::fs::write(&path, "[fitting]\nb_max = 1.0\n\n[forecast]\ndefault_days = 3650\n").unwrap();

    let config = EngineConfig::load_from_file(&path).unwrap();
    assert_eq!(config.fitting.b_max, 1.0);
    assert_eq!(config.forecast.default_days, 3650);
    // untouched sections keep defaults
    assert_eq!(config.import, EngineConfig::default().import);
}
