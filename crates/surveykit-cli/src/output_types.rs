use serde::Serialize;
use surveykit_core::config::ConfigSource;
use surveykit_core::models::{AccuracyAssessment, TraverseClosure};

/// Output for closure command
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureOutput {
    pub point_count: usize,
    pub closure: TraverseClosure,
    pub accuracy: AccuracyAssessment,
}

/// Output for convert command on a single coordinate
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertPointOutput {
    pub from_srid: u32,
    pub to_srid: u32,
    pub input: [f64; 2],
    pub output: [f64; 2],
}

/// Output for convert command on a geometry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertGeometryOutput {
    pub from_srid: u32,
    pub to_srid: u32,
    pub wkt: String,
}

/// One row of the config command
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: ConfigSource,
}
