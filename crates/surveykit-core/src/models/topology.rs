//! Topology findings and validation reports.

use serde::{Deserialize, Serialize};

use super::geometry::Geometry;

/// Default minimum gap area worth reporting, in square meters
pub const DEFAULT_MIN_GAP_AREA: f64 = 1.0;

/// Default overlap area below which two geometries are considered to touch
pub const DEFAULT_OVERLAP_TOLERANCE: f64 = 0.01;

/// A geometry with the identifier used to reference it in findings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelGeometry {
    pub id: String,
    pub geometry: Geometry,
}

impl ParcelGeometry {
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        Self { id: id.into(), geometry }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyErrorType {
    Overlap,
    Gap,
    Containment,
    InvalidGeometry,
    TouchingBoundary,
    SelfIntersection,
}

impl TopologyErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyErrorType::Overlap => "overlap",
            TopologyErrorType::Gap => "gap",
            TopologyErrorType::Containment => "containment",
            TopologyErrorType::InvalidGeometry => "invalid_geometry",
            TopologyErrorType::TouchingBoundary => "touching_boundary",
            TopologyErrorType::SelfIntersection => "self_intersection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A single topology finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyError {
    #[serde(rename = "type")]
    pub error_type: TopologyErrorType,
    /// Ids of the geometries involved
    pub geometry_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    pub description: String,
    pub severity: Severity,
}

impl TopologyError {
    pub fn error(
        error_type: TopologyErrorType,
        geometry_ids: Vec<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            geometry_ids,
            coordinates: None,
            area: None,
            description: description.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(
        error_type: TopologyErrorType,
        geometry_ids: Vec<String>,
        description: impl Into<String>,
    ) -> Self {
        Self { severity: Severity::Warning, ..Self::error(error_type, geometry_ids, description) }
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_coordinates(mut self, coordinates: Vec<[f64; 2]>) -> Self {
        if !coordinates.is_empty() {
            self.coordinates = Some(coordinates);
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Which checks to run and with what thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopologyOptions {
    pub check_overlaps: bool,
    pub check_containment: bool,
    pub check_gaps: bool,
    pub check_geometry: bool,
    pub allow_touching: bool,
    pub min_gap_area: f64,
    pub overlap_tolerance: f64,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            check_overlaps: true,
            check_containment: true,
            check_gaps: true,
            check_geometry: true,
            allow_touching: true,
            min_gap_area: DEFAULT_MIN_GAP_AREA,
            overlap_tolerance: DEFAULT_OVERLAP_TOLERANCE,
        }
    }
}

/// Counts per finding type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySummary {
    pub total_sections: usize,
    pub overlap_count: usize,
    pub containment_count: usize,
    pub gap_count: usize,
    pub geometry_error_count: usize,
    pub warning_count: usize,
    /// Engine operations that fell back to the local approximation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_operations: Vec<String>,
}

/// Aggregated outcome of a topology validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyValidationReport {
    pub is_valid: bool,
    pub errors: Vec<TopologyError>,
    pub warnings: Vec<TopologyError>,
    pub summary: TopologySummary,
}

impl TopologyValidationReport {
    /// Partition findings by severity and count them.
    ///
    /// `is_valid` holds iff no error-severity finding exists.
    pub fn from_findings(
        findings: Vec<TopologyError>,
        total_sections: usize,
        degraded_operations: Vec<String>,
    ) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            findings.into_iter().partition(TopologyError::is_error);

        let count = |t: TopologyErrorType| errors.iter().filter(|e| e.error_type == t).count();

        let summary = TopologySummary {
            total_sections,
            overlap_count: count(TopologyErrorType::Overlap),
            containment_count: count(TopologyErrorType::Containment),
            gap_count: count(TopologyErrorType::Gap),
            geometry_error_count: count(TopologyErrorType::InvalidGeometry)
                + count(TopologyErrorType::SelfIntersection),
            warning_count: warnings.len(),
            degraded_operations,
        };

        Self { is_valid: errors.is_empty(), errors, warnings, summary }
    }
}
