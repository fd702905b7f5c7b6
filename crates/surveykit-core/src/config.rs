use crate::error::{Result, SurveyError};
use crate::models::topology::{DEFAULT_MIN_GAP_AREA, DEFAULT_OVERLAP_TOLERANCE};
use crate::models::{AreaUnit, TopologyOptions, DEFAULT_CLOSURE_TOLERANCE, DEFAULT_SRID};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Default number of relaxation passes for traverse adjustment
pub const DEFAULT_ADJUSTMENT_ITERATIONS: usize = 5;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for survey computations and topology validation
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub closure_tolerance: ConfigValue<f64>,
    pub default_srid: ConfigValue<u32>,
    pub area_unit: ConfigValue<AreaUnit>,
    pub min_gap_area: ConfigValue<f64>,
    pub overlap_tolerance: ConfigValue<f64>,
    pub allow_touching: ConfigValue<bool>,
    pub adjustment_iterations: ConfigValue<usize>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            closure_tolerance: ConfigValue::new(DEFAULT_CLOSURE_TOLERANCE, ConfigSource::Default),
            default_srid: ConfigValue::new(DEFAULT_SRID, ConfigSource::Default),
            area_unit: ConfigValue::new(AreaUnit::SquareMeters, ConfigSource::Default),
            min_gap_area: ConfigValue::new(DEFAULT_MIN_GAP_AREA, ConfigSource::Default),
            overlap_tolerance: ConfigValue::new(DEFAULT_OVERLAP_TOLERANCE, ConfigSource::Default),
            allow_touching: ConfigValue::new(true, ConfigSource::Default),
            adjustment_iterations: ConfigValue::new(
                DEFAULT_ADJUSTMENT_ITERATIONS,
                ConfigSource::Default,
            ),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| SurveyError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| SurveyError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(tolerance) = file_config.closure_tolerance {
            let tolerance = validate_positive("closure_tolerance", tolerance)?;
            self.closure_tolerance.update(tolerance, ConfigSource::File);
        }

        if let Some(srid) = file_config.default_srid {
            self.default_srid.update(srid, ConfigSource::File);
        }

        if let Some(unit) = file_config.area_unit {
            self.area_unit.update(parse_area_unit(&unit)?, ConfigSource::File);
        }

        if let Some(min_gap_area) = file_config.min_gap_area {
            let min_gap_area = validate_non_negative("min_gap_area", min_gap_area)?;
            self.min_gap_area.update(min_gap_area, ConfigSource::File);
        }

        if let Some(overlap_tolerance) = file_config.overlap_tolerance {
            let overlap_tolerance = validate_non_negative("overlap_tolerance", overlap_tolerance)?;
            self.overlap_tolerance.update(overlap_tolerance, ConfigSource::File);
        }

        if let Some(allow_touching) = file_config.allow_touching {
            self.allow_touching.update(allow_touching, ConfigSource::File);
        }

        if let Some(iterations) = file_config.adjustment_iterations {
            self.adjustment_iterations.update(iterations, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // SURVEYKIT_CLOSURE_TOLERANCE
        if let Ok(raw) = env::var("SURVEYKIT_CLOSURE_TOLERANCE") {
            match raw.parse::<f64>().ok().filter(|t| *t > 0.0) {
                Some(tolerance) => {
                    self.closure_tolerance.update(tolerance, ConfigSource::Environment)
                }
                None => tracing::warn!(
                    "Invalid SURVEYKIT_CLOSURE_TOLERANCE value '{}': expected a positive ratio such as 0.0001",
                    raw
                ),
            }
        }

        // SURVEYKIT_SRID
        if let Ok(raw) = env::var("SURVEYKIT_SRID") {
            match raw.trim_start_matches("EPSG:").parse::<u32>() {
                Ok(srid) => self.default_srid.update(srid, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SURVEYKIT_SRID value '{}': expected integer EPSG code",
                    raw
                ),
            }
        }

        // SURVEYKIT_AREA_UNIT
        if let Ok(raw) = env::var("SURVEYKIT_AREA_UNIT") {
            match parse_area_unit(&raw) {
                Ok(unit) => self.area_unit.update(unit, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SURVEYKIT_AREA_UNIT value '{}': expected square_meters, square_feet, hectares, or acres",
                    raw
                ),
            }
        }

        // SURVEYKIT_MIN_GAP_AREA
        if let Ok(raw) = env::var("SURVEYKIT_MIN_GAP_AREA") {
            match raw.parse::<f64>().ok().filter(|a| a.is_finite() && *a >= 0.0) {
                Some(area) => self.min_gap_area.update(area, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid SURVEYKIT_MIN_GAP_AREA value '{}': expected non-negative square meters",
                    raw
                ),
            }
        }

        // SURVEYKIT_OVERLAP_TOLERANCE
        if let Ok(raw) = env::var("SURVEYKIT_OVERLAP_TOLERANCE") {
            match raw.parse::<f64>().ok().filter(|a| a.is_finite() && *a >= 0.0) {
                Some(area) => self.overlap_tolerance.update(area, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid SURVEYKIT_OVERLAP_TOLERANCE value '{}': expected non-negative square meters",
                    raw
                ),
            }
        }

        // SURVEYKIT_ALLOW_TOUCHING
        if let Ok(raw) = env::var("SURVEYKIT_ALLOW_TOUCHING") {
            match raw.to_lowercase().parse::<bool>() {
                Ok(allow) => self.allow_touching.update(allow, ConfigSource::Environment),
                Err(_) => {
                    tracing::warn!("Invalid SURVEYKIT_ALLOW_TOUCHING value '{}': expected true or false", raw)
                }
            }
        }

        // SURVEYKIT_ADJUSTMENT_ITERATIONS
        if let Ok(raw) = env::var("SURVEYKIT_ADJUSTMENT_ITERATIONS") {
            match raw.parse::<usize>() {
                Ok(iterations) => {
                    self.adjustment_iterations.update(iterations, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid SURVEYKIT_ADJUSTMENT_ITERATIONS value '{}': expected a whole number",
                    raw
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) -> Result<()> {
        if let Some(tolerance) = overrides.closure_tolerance {
            let tolerance = validate_positive("closure_tolerance", tolerance)?;
            self.closure_tolerance.update(tolerance, ConfigSource::Cli);
        }

        if let Some(srid) = overrides.default_srid {
            self.default_srid.update(srid, ConfigSource::Cli);
        }

        if let Some(unit) = overrides.area_unit {
            self.area_unit.update(unit, ConfigSource::Cli);
        }

        if let Some(min_gap_area) = overrides.min_gap_area {
            let min_gap_area = validate_non_negative("min_gap_area", min_gap_area)?;
            self.min_gap_area.update(min_gap_area, ConfigSource::Cli);
        }

        if let Some(overlap_tolerance) = overrides.overlap_tolerance {
            let overlap_tolerance = validate_non_negative("overlap_tolerance", overlap_tolerance)?;
            self.overlap_tolerance.update(overlap_tolerance, ConfigSource::Cli);
        }

        if let Some(allow_touching) = overrides.allow_touching {
            self.allow_touching.update(allow_touching, ConfigSource::Cli);
        }

        if let Some(iterations) = overrides.adjustment_iterations {
            self.adjustment_iterations.update(iterations, ConfigSource::Cli);
        }

        Ok(())
    }

    /// Topology options seeded from the configured thresholds, all checks on
    pub fn topology_options(&self) -> TopologyOptions {
        TopologyOptions {
            allow_touching: self.allow_touching.value,
            min_gap_area: self.min_gap_area.value,
            overlap_tolerance: self.overlap_tolerance.value,
            ..TopologyOptions::default()
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "closure_tolerance".to_string(),
            (format!("1:{:.0}", 1.0 / self.closure_tolerance.value), self.closure_tolerance.source),
        );

        map.insert(
            "default_srid".to_string(),
            (format!("EPSG:{}", self.default_srid.value), self.default_srid.source),
        );

        map.insert(
            "area_unit".to_string(),
            (format!("{:?}", self.area_unit.value), self.area_unit.source),
        );

        map.insert(
            "min_gap_area".to_string(),
            (format!("{} m²", self.min_gap_area.value), self.min_gap_area.source),
        );

        map.insert(
            "overlap_tolerance".to_string(),
            (format!("{} m²", self.overlap_tolerance.value), self.overlap_tolerance.source),
        );

        map.insert(
            "allow_touching".to_string(),
            (self.allow_touching.value.to_string(), self.allow_touching.source),
        );

        map.insert(
            "adjustment_iterations".to_string(),
            (self.adjustment_iterations.value.to_string(), self.adjustment_iterations.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    closure_tolerance: Option<f64>,
    default_srid: Option<u32>,
    area_unit: Option<String>,
    min_gap_area: Option<f64>,
    overlap_tolerance: Option<f64>,
    allow_touching: Option<bool>,
    adjustment_iterations: Option<usize>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub closure_tolerance: Option<f64>,
    pub default_srid: Option<u32>,
    pub area_unit: Option<AreaUnit>,
    pub min_gap_area: Option<f64>,
    pub overlap_tolerance: Option<f64>,
    pub allow_touching: Option<bool>,
    pub adjustment_iterations: Option<usize>,
}

fn validate_positive(key: &str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(SurveyError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("must be a positive number, got {}", value),
        })
    }
}

fn validate_non_negative(key: &str, value: f64) -> Result<f64> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(SurveyError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("must be zero or a positive area in square meters, got {}", value),
        })
    }
}

/// Parse area unit from string
pub fn parse_area_unit(s: &str) -> Result<AreaUnit> {
    match s.to_lowercase().as_str() {
        "square_meters" | "sqm" | "m2" => Ok(AreaUnit::SquareMeters),
        "square_feet" | "sqft" | "ft2" => Ok(AreaUnit::SquareFeet),
        "hectares" | "ha" => Ok(AreaUnit::Hectares),
        "acres" | "ac" => Ok(AreaUnit::Acres),
        _ => Err(SurveyError::ConfigInvalid {
            key: "area_unit".to_string(),
            reason: format!(
                "Invalid area unit: {}. Use square_meters, square_feet, hectares, or acres",
                s
            ),
        }),
    }
}
