//! PostGIS engine configuration from the environment

use serial_test::serial;
use std::time::Duration;
use surveykit_topology::postgis::{ConfigError, PostgisConfig};

fn clear_env() {
    std::env::remove_var("DATABASE_URL");
    std::env::remove_var("SURVEYKIT_DB_MAX_CONNECTIONS");
    std::env::remove_var("SURVEYKIT_DB_STATEMENT_TIMEOUT_MS");
}

#[test]
#[serial]
fn test_from_env_requires_database_url() {
    clear_env();
    match PostgisConfig::from_env() {
        Err(ConfigError::Missing(key)) => assert_eq!(key, "DATABASE_URL"),
        other => panic!("Expected Missing error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_from_env_reads_pool_and_timeout() {
    clear_env();
    std::env::set_var("DATABASE_URL", "postgres://survey@localhost/gis");
    std::env::set_var("SURVEYKIT_DB_MAX_CONNECTIONS", "8");
    std::env::set_var("SURVEYKIT_DB_STATEMENT_TIMEOUT_MS", "2500");

    let config = PostgisConfig::from_env().unwrap();
    assert_eq!(config.database_url, "postgres://survey@localhost/gis");
    assert_eq!(config.pool.max_connections, 8);
    assert_eq!(config.statement_timeout, Some(Duration::from_millis(2500)));

    clear_env();
}

#[test]
#[serial]
fn test_from_env_rejects_empty_url() {
    clear_env();
    std::env::set_var("DATABASE_URL", "");

    match PostgisConfig::from_env() {
        Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "DATABASE_URL"),
        other => panic!("Expected Invalid error, got {:?}", other),
    }

    clear_env();
}

#[test]
#[serial]
fn test_from_env_rejects_bad_pool_size() {
    clear_env();
    std::env::set_var("DATABASE_URL", "postgres://localhost/gis");
    std::env::set_var("SURVEYKIT_DB_MAX_CONNECTIONS", "many");

    assert!(matches!(PostgisConfig::from_env(), Err(ConfigError::Invalid { .. })));

    clear_env();
}
