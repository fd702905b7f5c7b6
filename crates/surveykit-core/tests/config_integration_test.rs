//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use serial_test::serial;
use std::env;
use std::io::Write;
use surveykit_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use surveykit_core::models::AreaUnit;
use tempfile::NamedTempFile;

fn clear_env() {
    for key in [
        "SURVEYKIT_CLOSURE_TOLERANCE",
        "SURVEYKIT_SRID",
        "SURVEYKIT_AREA_UNIT",
        "SURVEYKIT_MIN_GAP_AREA",
        "SURVEYKIT_OVERLAP_TOLERANCE",
        "SURVEYKIT_ALLOW_TOUCHING",
        "SURVEYKIT_ADJUSTMENT_ITERATIONS",
    ] {
        env::remove_var(key);
    }
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
default_srid = 32736
# Only override the SRID, leave others as defaults
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.default_srid.value, 32736);
    assert_eq!(config.default_srid.source, ConfigSource::File);
    assert_eq!(config.closure_tolerance.value, 0.0001);
    assert_eq!(config.closure_tolerance.source, ConfigSource::Default);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "default_srid = [not toml").unwrap();

    let result = LayeredConfig::with_defaults().load_from_file(file.path());
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("SURVEYKIT_SRID", "EPSG:32734");
    env::set_var("SURVEYKIT_AREA_UNIT", "acres");
    env::set_var("SURVEYKIT_ADJUSTMENT_ITERATIONS", "12");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
default_srid = 32736
area_unit = "hectares"
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.default_srid.value, 32734);
    assert_eq!(config.default_srid.source, ConfigSource::Environment);
    assert_eq!(config.area_unit.value, AreaUnit::Acres);
    assert_eq!(config.adjustment_iterations.value, 12);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("SURVEYKIT_CLOSURE_TOLERANCE", "-1");
    env::set_var("SURVEYKIT_ALLOW_TOUCHING", "sometimes");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.closure_tolerance.value, 0.0001);
    assert_eq!(config.closure_tolerance.source, ConfigSource::Default);
    assert!(config.allow_touching.value);
    assert_eq!(config.allow_touching.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_environment() {
    clear_env();
    env::set_var("SURVEYKIT_MIN_GAP_AREA", "2.5");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    assert_eq!(config.min_gap_area.value, 2.5);

    config.update_from_cli(CliConfigOverrides {
        min_gap_area: Some(0.5),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(config.min_gap_area.value, 0.5);
    assert_eq!(config.min_gap_area.source, ConfigSource::Cli);

    clear_env();
}

#[test]
#[serial]
fn test_environment_sets_overlap_tolerance() {
    clear_env();
    env::set_var("SURVEYKIT_OVERLAP_TOLERANCE", "0.2");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.overlap_tolerance.value, 0.2);
    assert_eq!(config.overlap_tolerance.source, ConfigSource::Environment);
    assert_eq!(config.topology_options().overlap_tolerance, 0.2);

    clear_env();
}

#[test]
#[serial]
fn test_negative_environment_areas_are_ignored() {
    clear_env();
    env::set_var("SURVEYKIT_MIN_GAP_AREA", "-3");
    env::set_var("SURVEYKIT_OVERLAP_TOLERANCE", "NaN");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.min_gap_area.source, ConfigSource::Default);
    assert_eq!(config.overlap_tolerance.source, ConfigSource::Default);

    clear_env();
}
