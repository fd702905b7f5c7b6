//! PostGIS connection configuration

use std::time::Duration;
use surveykit_core::error::SurveyError;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl From<ConfigError> for SurveyError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing(key) => SurveyError::ConfigMissing { key },
            ConfigError::Invalid { key, reason } => SurveyError::ConfigInvalid { key, reason },
        }
    }
}

/// Connection settings for the PostGIS geometry engine
#[derive(Debug, Clone)]
pub struct PostgisConfig {
    /// Database connection URL
    pub database_url: String,
    /// Connection pool configuration
    pub pool: PoolConfig,
    /// Per-statement timeout applied to every engine query
    pub statement_timeout: Option<Duration>,
}

impl PostgisConfig {
    /// Load configuration from environment variables
    ///
    /// Requires DATABASE_URL. `SURVEYKIT_DB_MAX_CONNECTIONS` and
    /// `SURVEYKIT_DB_STATEMENT_TIMEOUT_MS` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?;

        let mut config = Self::new(database_url).map_err(|e| match e {
            ConfigError::Invalid { reason, .. } => {
                ConfigError::Invalid { key: "DATABASE_URL".to_string(), reason }
            }
            other => other,
        })?;

        if let Ok(raw) = std::env::var("SURVEYKIT_DB_MAX_CONNECTIONS") {
            config.pool.max_connections = raw.parse().map_err(|_| ConfigError::Invalid {
                key: "SURVEYKIT_DB_MAX_CONNECTIONS".to_string(),
                reason: format!("'{}' is not a positive integer", raw),
            })?;
        }

        if let Ok(raw) = std::env::var("SURVEYKIT_DB_STATEMENT_TIMEOUT_MS") {
            let millis: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                key: "SURVEYKIT_DB_STATEMENT_TIMEOUT_MS".to_string(),
                reason: format!("'{}' is not a number of milliseconds", raw),
            })?;
            config.statement_timeout = Some(Duration::from_millis(millis));
        }

        config.validate()?;
        Ok(config)
    }

    /// Create a new configuration with the given database URL
    pub fn new(database_url: String) -> Result<Self, ConfigError> {
        if database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        Ok(Self { database_url, pool: PoolConfig::default(), statement_timeout: None })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(ConfigError::Invalid {
                key: "database_url".to_string(),
                reason: "must start with postgres:// or postgresql://".to_string(),
            });
        }

        if self.statement_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::Invalid {
                key: "statement_timeout".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        self.pool.validate()?;

        Ok(())
    }
}

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Maximum number of connections allowed
    pub max_connections: u32,
    /// Timeout for acquiring a connection from the pool
    pub acquire_timeout: Duration,
    /// Timeout for idle connections before they are closed
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 0,
            max_connections: 4,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl PoolConfig {
    /// Validate pool configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid {
                key: "pool.min_connections".to_string(),
                reason: format!(
                    "min_connections ({}) cannot be greater than max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "pool.max_connections".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new_valid() {
        let config = PostgisConfig::new("postgresql://localhost/survey".to_string());
        assert!(config.is_ok());
        assert!(config.unwrap().validate().is_ok());
    }

    #[test]
    fn test_config_new_empty_url() {
        match PostgisConfig::new("  ".to_string()) {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "database_url"),
            _ => panic!("Expected Invalid error"),
        }
    }

    #[test]
    fn test_config_rejects_other_schemes() {
        let config = PostgisConfig::new("mysql://localhost/survey".to_string()).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_statement_timeout() {
        let mut config = PostgisConfig::new("postgres://localhost/survey".to_string()).unwrap();
        config.statement_timeout = Some(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pool_config_invalid_min_max() {
        let pool = PoolConfig { min_connections: 20, max_connections: 10, ..PoolConfig::default() };
        assert!(pool.validate().is_err());
    }

    #[test]
    fn test_pool_config_zero_max() {
        let pool = PoolConfig { max_connections: 0, ..PoolConfig::default() };
        assert!(pool.validate().is_err());
    }

    #[test]
    fn test_config_error_converts_to_survey_error() {
        let missing: SurveyError = ConfigError::Missing("DATABASE_URL".to_string()).into();
        assert!(matches!(missing, SurveyError::ConfigMissing { ref key } if key == "DATABASE_URL"));

        let invalid: SurveyError =
            ConfigError::Invalid { key: "database_url".to_string(), reason: "bad".to_string() }
                .into();
        assert!(matches!(invalid, SurveyError::ConfigInvalid { .. }));
    }
}
