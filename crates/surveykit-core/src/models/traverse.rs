//! Traverse, closure, area and adjustment value types.

use serde::{Deserialize, Serialize};

use super::geometry::Point2D;

/// Default closure tolerance: 1:10,000
pub const DEFAULT_CLOSURE_TOLERANCE: f64 = 0.0001;

/// Distance units for field observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Meters,
    Feet,
}

/// Angular units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    #[default]
    Degrees,
    Gradians,
    Radians,
}

/// Area units for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    #[default]
    SquareMeters,
    SquareFeet,
    Hectares,
    Acres,
}

impl AreaUnit {
    /// Convert an area in square meters into this unit
    pub fn from_square_meters(&self, square_meters: f64) -> f64 {
        match self {
            AreaUnit::SquareMeters => square_meters,
            AreaUnit::SquareFeet => square_meters * 10.7639,
            AreaUnit::Hectares => square_meters * 0.0001,
            AreaUnit::Acres => square_meters / 4046.86,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            AreaUnit::SquareMeters => "m²",
            AreaUnit::SquareFeet => "ft²",
            AreaUnit::Hectares => "ha",
            AreaUnit::Acres => "ac",
        }
    }
}

/// One observed traverse leg. Bearing in degrees, 0° = north, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraverseLeg {
    pub distance: f64,
    pub bearing: f64,
    #[serde(default)]
    pub unit: DistanceUnit,
}

impl TraverseLeg {
    pub fn new(distance: f64, bearing: f64) -> Self {
        Self { distance, bearing, unit: DistanceUnit::Meters }
    }

    pub fn in_feet(distance: f64, bearing: f64) -> Self {
        Self { distance, bearing, unit: DistanceUnit::Feet }
    }
}

/// Bearing and horizontal distance between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BearingDistance {
    pub bearing: f64,
    pub distance: f64,
}

/// Closure analysis of a traverse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraverseClosure {
    /// Linear misclosure in meters
    pub closure_error: f64,
    /// Misclosure divided by total traverse length
    pub closure_error_ratio: f64,
    pub closure_distance: f64,
    pub closure_bearing: f64,
    pub is_within_tolerance: bool,
    pub tolerance: f64,
    /// Sum of latitudes (Δy)
    pub misclosure_latitude: f64,
    /// Sum of departures (Δx)
    pub misclosure_departure: f64,
    pub total_distance: f64,
    /// Whether the last point returns onto the first
    pub is_closed: bool,
    /// N in the 1:N precision; absent when the misclosure is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision_ratio: Option<f64>,
}

/// Polygon area and perimeter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaResult {
    pub area: f64,
    pub unit: AreaUnit,
    /// Perimeter in meters
    pub perimeter: f64,
}

/// Interior angles of a closed figure, in degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleValidation {
    pub angles: Vec<f64>,
    pub actual_sum: f64,
    pub theoretical_sum: f64,
    pub difference: f64,
    pub is_valid: bool,
}

/// Result of comparing a closure against a required precision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyAssessment {
    pub meets_standard: bool,
    /// N of the achieved 1:N; absent for a perfect closure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_ratio: Option<f64>,
    /// N of the required 1:N
    pub required_ratio: f64,
    pub message: String,
}

/// One observed leg of an adjustment network, referencing points by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub from: String,
    pub to: String,
    pub distance: f64,
    pub bearing: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Observation {
    pub fn new(from: impl Into<String>, to: impl Into<String>, distance: f64, bearing: f64) -> Self {
        Self { from: from.into(), to: to.into(), distance, bearing, weight: None }
    }

    pub fn weighted(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Discrepancy between an observation and the current coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residual {
    pub from: String,
    pub to: String,
    pub dx: f64,
    pub dy: f64,
    pub magnitude: f64,
}

/// Output of a traverse adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentResult {
    pub points: Vec<Point2D>,
    pub residuals_before: Vec<Residual>,
    pub residuals_after: Vec<Residual>,
    pub iterations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_unit_conversion() {
        assert_eq!(AreaUnit::SquareMeters.from_square_meters(1.0), 1.0);
        assert!((AreaUnit::Hectares.from_square_meters(1_000_000.0) - 100.0).abs() < 1e-9);
        assert!((AreaUnit::SquareFeet.from_square_meters(1.0) - 10.7639).abs() < 1e-9);
        assert!((AreaUnit::Acres.from_square_meters(4046.86) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_area_unit_serializes_snake_case() {
        let json = serde_json::to_string(&AreaUnit::SquareMeters).unwrap();
        assert_eq!(json, "\"square_meters\"");
        let unit: AreaUnit = serde_json::from_str("\"hectares\"").unwrap();
        assert_eq!(unit, AreaUnit::Hectares);
    }

    #[test]
    fn test_leg_defaults_to_meters() {
        let leg: TraverseLeg = serde_json::from_str(r#"{"distance":10.0,"bearing":90.0}"#).unwrap();
        assert_eq!(leg.unit, DistanceUnit::Meters);
    }
}
