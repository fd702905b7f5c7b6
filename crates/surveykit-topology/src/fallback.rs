//! Local geometry engine used when the remote engine cannot answer.
//!
//! Overlap and containment are judged on bounding boxes, so they can report
//! overlaps that exact polygons would not have. Gaps use polygon boolean
//! operations from `geo`. Validity is the structural check only; it does not
//! detect self-intersections.

use async_trait::async_trait;
use geo::{Area, BooleanOps, MultiPolygon, Rect};
use surveykit_core::error::{Result, SurveyError};
use surveykit_core::models::Geometry;
use surveykit_geo::models::{from_geo_geometry, to_geo_multi_polygon};
use surveykit_geo::{parse_wkt_geometry, validate_geometry_basic, GeometryExt};

use crate::ports::{
    ContainmentResult, Gap, GapResult, GeometryEngine, OverlapResult, ValidityResult,
};

/// Edge coincidence tolerance for bounding boxes, in CRS units
const EDGE_EPSILON: f64 = 1e-9;

/// Geometry engine working entirely in-process
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundingBoxEngine;

impl BoundingBoxEngine {
    pub fn new() -> Self {
        Self
    }
}

fn bounding_box(wkt: &str, srid: u32) -> Result<Rect> {
    let geometry = parse_wkt_geometry(wkt, srid)?;
    geometry
        .bounding_box()
        .ok_or_else(|| SurveyError::validation("geometry", wkt, "geometry has no extent"))
}

fn polygonal(wkt: &str, srid: u32) -> Result<MultiPolygon> {
    let geometry = parse_wkt_geometry(wkt, srid)?;
    to_geo_multi_polygon(&geometry)
        .ok_or_else(|| SurveyError::validation("geometry", wkt, "geometry is not polygonal"))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= EDGE_EPSILON
}

#[async_trait]
impl GeometryEngine for BoundingBoxEngine {
    fn name(&self) -> &str {
        "bounding-box"
    }

    async fn overlaps(
        &self,
        first: &str,
        second: &str,
        srid: u32,
        tolerance: f64,
    ) -> Result<OverlapResult> {
        let a = bounding_box(first, srid)?;
        let b = bounding_box(second, srid)?;

        let min_x = a.min().x.max(b.min().x);
        let min_y = a.min().y.max(b.min().y);
        let max_x = a.max().x.min(b.max().x);
        let max_y = a.max().y.min(b.max().y);

        if max_x <= min_x || max_y <= min_y {
            return Ok(OverlapResult::default());
        }

        let overlap_area = (max_x - min_x) * (max_y - min_y);
        if overlap_area <= tolerance {
            return Ok(OverlapResult { overlap_area, ..Default::default() });
        }

        Ok(OverlapResult {
            overlaps: true,
            overlap_area,
            overlap_coordinates: Geometry::rectangle(min_x, min_y, max_x, max_y, srid)
                .coordinates(),
        })
    }

    async fn contains(
        &self,
        parent: &str,
        child: &str,
        srid: u32,
        allow_touching: bool,
    ) -> Result<ContainmentResult> {
        let outer = bounding_box(parent, srid)?;
        let inner = bounding_box(child, srid)?;

        let within = inner.min().x >= outer.min().x - EDGE_EPSILON
            && inner.min().y >= outer.min().y - EDGE_EPSILON
            && inner.max().x <= outer.max().x + EDGE_EPSILON
            && inner.max().y <= outer.max().y + EDGE_EPSILON;

        let touching = close(inner.min().x, outer.min().x)
            || close(inner.min().y, outer.min().y)
            || close(inner.max().x, outer.max().x)
            || close(inner.max().y, outer.max().y);

        Ok(ContainmentResult { contains: within && (allow_touching || !touching), touching })
    }

    async fn find_gaps(
        &self,
        sections: &[String],
        parent: &str,
        srid: u32,
        min_area: f64,
    ) -> Result<GapResult> {
        let parent = polygonal(parent, srid)?;

        let mut covered = MultiPolygon::new(vec![]);
        for section in sections {
            covered = covered.union(&polygonal(section, srid)?);
        }

        let uncovered = parent.difference(&covered);
        let gaps = uncovered
            .into_iter()
            .filter_map(|polygon| {
                let area = polygon.unsigned_area();
                (area >= min_area).then_some((area, polygon))
            })
            .map(|(area, polygon)| {
                let geometry = from_geo_geometry(&geo::Geometry::Polygon(polygon), srid)?;
                Ok(Gap { area, geometry })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GapResult { gaps })
    }

    async fn is_valid(&self, geometry: &str, srid: u32) -> Result<ValidityResult> {
        let parsed = match parse_wkt_geometry(geometry, srid) {
            Ok(parsed) => parsed,
            Err(e) => return Ok(ValidityResult::invalid(e.to_string())),
        };

        let result = validate_geometry_basic(&parsed);
        Ok(match result.summary() {
            Some(reason) => ValidityResult::invalid(reason),
            None => ValidityResult::valid(),
        })
    }
}
