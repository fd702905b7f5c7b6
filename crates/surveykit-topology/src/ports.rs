use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surveykit_core::error::Result;
use surveykit_core::models::Geometry;

/// Outcome of an overlap test between two geometries
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapResult {
    pub overlaps: bool,
    /// Area of the shared region, in CRS units squared
    pub overlap_area: f64,
    /// Vertices of the shared region
    pub overlap_coordinates: Vec<[f64; 2]>,
}

/// Outcome of a containment test of a child inside a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainmentResult {
    /// Child lies inside the parent under the requested touching policy
    pub contains: bool,
    /// Child and parent boundaries meet
    pub touching: bool,
}

/// A region of the parent not covered by any section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub area: f64,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GapResult {
    pub gaps: Vec<Gap>,
}

/// Outcome of a full validity check (including self-intersection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidityResult {
    pub fn valid() -> Self {
        Self { is_valid: true, reason: None }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self { is_valid: false, reason: Some(reason.into()) }
    }
}

/// Port for the engine that evaluates exact polygon predicates.
///
/// Geometries travel as WKT in a single SRID. An `Err` from any method means
/// the engine could not answer; callers decide how to degrade.
#[async_trait]
pub trait GeometryEngine: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Area and shape of the intersection of two geometries
    async fn overlaps(
        &self,
        first: &str,
        second: &str,
        srid: u32,
        tolerance: f64,
    ) -> Result<OverlapResult>;

    /// Whether `child` lies inside `parent`.
    ///
    /// With `allow_touching` false, a child whose boundary meets the parent
    /// boundary is not contained.
    async fn contains(
        &self,
        parent: &str,
        child: &str,
        srid: u32,
        allow_touching: bool,
    ) -> Result<ContainmentResult>;

    /// Parts of `parent` not covered by `sections`, at least `min_area` large
    async fn find_gaps(
        &self,
        sections: &[String],
        parent: &str,
        srid: u32,
        min_area: f64,
    ) -> Result<GapResult>;

    /// Full validity check of one geometry
    async fn is_valid(&self, geometry: &str, srid: u32) -> Result<ValidityResult>;
}
