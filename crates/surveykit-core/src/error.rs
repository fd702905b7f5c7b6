//! Error types for surveykit

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurveyError {
    // Input errors
    #[error("Invalid {field} '{value}': {reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    // CRS errors
    #[error("Unknown CRS: EPSG:{srid} is not registered")]
    UnknownCrs { srid: u32 },

    #[error("Projection from EPSG:{from} to EPSG:{to} failed: {reason}")]
    Projection { from: u32, to: u32, reason: String },

    // Geometry engine errors
    #[error("Geometry engine call '{operation}' failed: {reason}")]
    Engine { operation: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },
}

impl SurveyError {
    /// Build a validation error naming the offending field and raw value
    pub fn validation(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        SurveyError::Validation {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a geometry engine error for the named operation
    pub fn engine(operation: impl Into<String>, reason: impl ToString) -> Self {
        SurveyError::Engine {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error describes malformed or out-of-range input
    pub fn is_validation(&self) -> bool {
        matches!(self, SurveyError::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, SurveyError>;
