//! Structural geometry validation: ring shape, closure, finite coordinates.
//!
//! This does not detect self-intersections; that needs a geometry engine.

use serde::{Deserialize, Serialize};
use surveykit_core::models::Geometry;

/// Validation result with details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<GeometryIssue>,
}

/// Validation issue with location details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryIssue {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: impl Into<String>, reason: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(GeometryIssue { location: location.into(), reason: reason.into() });
    }

    /// First reason, joined with its location
    pub fn summary(&self) -> Option<String> {
        self.errors.first().map(|e| format!("{}: {}", e.location, e.reason))
    }

    fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        for error in other.errors {
            self.add_error(format!("{}.{}", prefix, error.location), error.reason);
        }
    }
}

/// Validate the structure of a geometry
pub fn validate_geometry_basic(geometry: &Geometry) -> ValidationResult {
    match geometry {
        Geometry::Point { coordinates, .. } => validate_point(coordinates),
        Geometry::LineString { coordinates, .. } => validate_linestring(coordinates),
        Geometry::Polygon { coordinates, .. } => validate_polygon(coordinates),
        Geometry::MultiPolygon { coordinates, .. } => validate_multipolygon(coordinates),
    }
}

fn validate_point(point: &[f64; 2]) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if !point[0].is_finite() || !point[1].is_finite() {
        result.add_error(
            format!("Point({}, {})", point[0], point[1]),
            "Coordinates must be finite",
        );
    }
    result
}

fn check_finite(result: &mut ValidationResult, location: &str, coords: &[[f64; 2]]) {
    for (i, coord) in coords.iter().enumerate() {
        if !coord[0].is_finite() || !coord[1].is_finite() {
            result.add_error(format!("{}[{}]", location, i), "Coordinates must be finite");
        }
    }
}

fn validate_linestring(coords: &[[f64; 2]]) -> ValidationResult {
    let mut result = ValidationResult::valid();

    // LineString must have at least 2 points
    if coords.len() < 2 {
        result.add_error(
            "LineString",
            format!("LineString must have at least 2 points, found {}", coords.len()),
        );
        return result;
    }

    check_finite(&mut result, "LineString", coords);
    result
}

fn validate_ring(result: &mut ValidationResult, location: &str, ring: &[[f64; 2]]) {
    if ring.len() < 4 {
        result.add_error(
            location,
            format!("Ring must have at least 4 points, found {}", ring.len()),
        );
    }

    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            result.add_error(location, "Ring must be closed (first point == last point)");
        }
    }

    check_finite(result, location, ring);
}

fn validate_polygon(rings: &[Vec<[f64; 2]>]) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if rings.is_empty() {
        result.add_error("Polygon", "Polygon must have an exterior ring");
        return result;
    }

    for (i, ring) in rings.iter().enumerate() {
        let location =
            if i == 0 { "Polygon exterior".to_string() } else { format!("Polygon interior[{}]", i - 1) };
        validate_ring(&mut result, &location, ring);
    }

    result
}

fn validate_multipolygon(polygons: &[Vec<Vec<[f64; 2]>>]) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if polygons.is_empty() {
        result.add_error("MultiPolygon", "MultiPolygon must contain at least one polygon");
        return result;
    }

    for (i, polygon) in polygons.iter().enumerate() {
        result.absorb(&format!("MultiPolygon[{}]", i), validate_polygon(polygon));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_square() {
        let square = Geometry::rectangle(0.0, 0.0, 10.0, 10.0, 32735);
        assert!(validate_geometry_basic(&square).is_valid);
    }

    #[test]
    fn test_unclosed_ring() {
        let open = Geometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]], 32735);
        let result = validate_geometry_basic(&open);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.reason.contains("closed")));
    }

    #[test]
    fn test_empty_polygon() {
        let empty = Geometry::polygon(vec![], 32735);
        assert!(!validate_geometry_basic(&empty).is_valid);
    }

    #[test]
    fn test_non_finite_coordinate_is_located() {
        let bad = Geometry::polygon(
            vec![vec![[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0], [0.0, 0.0]]],
            32735,
        );
        let result = validate_geometry_basic(&bad);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].location, "Polygon exterior[1]");
    }

    #[test]
    fn test_multipolygon_prefixes_location() {
        let mp = Geometry::multi_polygon(
            vec![
                vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                vec![vec![[5.0, 5.0], [6.0, 5.0], [5.0, 5.0]]],
            ],
            32735,
        );
        let result = validate_geometry_basic(&mp);
        assert!(!result.is_valid);
        assert!(result.summary().unwrap().starts_with("MultiPolygon[1]."));
    }

    #[test]
    fn test_short_linestring() {
        let line = Geometry::line_string(vec![[0.0, 0.0]], 32735);
        assert!(!validate_geometry_basic(&line).is_valid);
    }
}
