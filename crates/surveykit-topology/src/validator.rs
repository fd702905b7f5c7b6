//! Topology validation of a parent parcel and its sections.
//!
//! Every predicate goes to the injected [`GeometryEngine`] first. When that
//! call fails, the same predicate is answered by the [`BoundingBoxEngine`] and
//! the operation is recorded as degraded in the report summary. Engine
//! failures never reach the caller.

use std::collections::BTreeSet;
use std::sync::Arc;

use surveykit_core::error::{Result, SurveyError};
use surveykit_core::models::{
    Geometry, GeometryType, ParcelGeometry, TopologyError, TopologyErrorType, TopologyOptions,
    TopologyValidationReport,
};
use surveykit_geo::{geometry_to_wkt, reproject_geometry, validate_geometry_basic, CrsRegistry};
use tracing::{debug, info, warn};

use crate::fallback::BoundingBoxEngine;
use crate::ports::{ContainmentResult, GapResult, GeometryEngine, OverlapResult, ValidityResult};

/// Engine operations that fell back during one validation run
#[derive(Debug, Default)]
struct Degradations(BTreeSet<&'static str>);

impl Degradations {
    fn into_vec(self) -> Vec<String> {
        self.0.into_iter().map(String::from).collect()
    }
}

/// A geometry reconciled to the working SRID, with its WKT for the engine
#[derive(Debug, Clone)]
struct Prepared {
    id: String,
    geometry: Geometry,
    wkt: String,
}

impl Prepared {
    fn new(parcel: ParcelGeometry) -> Self {
        let wkt = geometry_to_wkt(&parcel.geometry);
        Self { id: parcel.id, geometry: parcel.geometry, wkt }
    }

    fn srid(&self) -> u32 {
        self.geometry.srid()
    }
}

/// Runs overlap, containment, gap and validity checks
pub struct TopologyValidator {
    engine: Arc<dyn GeometryEngine>,
    fallback: BoundingBoxEngine,
    registry: &'static CrsRegistry,
}

impl TopologyValidator {
    /// Validator over the given engine, using the process-wide CRS registry
    pub fn new(engine: Arc<dyn GeometryEngine>) -> Self {
        Self::with_registry(engine, surveykit_geo::init())
    }

    pub fn with_registry(engine: Arc<dyn GeometryEngine>, registry: &'static CrsRegistry) -> Self {
        Self { engine, fallback: BoundingBoxEngine::new(), registry }
    }

    /// Validator that never leaves the process
    pub fn local() -> Self {
        Self::new(Arc::new(BoundingBoxEngine::new()))
    }

    /// Name of the primary engine
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Pairwise overlap check across all geometries.
    ///
    /// Geometries are reprojected to the SRID of the first one. Each
    /// overlapping pair yields one `overlap` error carrying the shared area.
    pub async fn detect_overlaps(
        &self,
        geometries: &[ParcelGeometry],
        tolerance: f64,
    ) -> Result<Vec<TopologyError>> {
        let Some(first) = geometries.first() else {
            return Ok(Vec::new());
        };
        let prepared = self.prepare_all(geometries, first.geometry.srid())?;
        self.overlap_findings(&mut Degradations::default(), &prepared, tolerance).await
    }

    /// Check every section against the parent parcel.
    ///
    /// A section sharing the parent boundary is a `touching_boundary` warning
    /// when `allow_touching` is set and a `containment` error otherwise.
    pub async fn validate_containment(
        &self,
        sections: &[ParcelGeometry],
        parent: &ParcelGeometry,
        allow_touching: bool,
    ) -> Result<Vec<TopologyError>> {
        let srid = parent.geometry.srid();
        let parent = self.prepare(parent, srid)?;
        let sections = self.prepare_all(sections, srid)?;
        self.containment_findings(&mut Degradations::default(), &sections, &parent, allow_touching)
            .await
    }

    /// Report parts of the parent not covered by any section
    pub async fn check_gaps(
        &self,
        sections: &[ParcelGeometry],
        parent: &ParcelGeometry,
        min_gap_area: f64,
    ) -> Result<Vec<TopologyError>> {
        let srid = parent.geometry.srid();
        let parent = self.prepare(parent, srid)?;
        let sections = self.prepare_all(sections, srid)?;
        self.gap_findings(&mut Degradations::default(), &sections, &parent, min_gap_area).await
    }

    /// Structural validity followed by the engine's full validity check
    pub async fn validate_geometry_topology(
        &self,
        geometry: &ParcelGeometry,
    ) -> Result<Vec<TopologyError>> {
        let structural = structural_findings(geometry);
        if !structural.is_empty() {
            return Ok(structural);
        }

        let prepared = Prepared::new(geometry.clone());
        Ok(self
            .validity_finding(&mut Degradations::default(), &prepared)
            .await?
            .into_iter()
            .collect())
    }

    /// Run every enabled check and aggregate the findings.
    ///
    /// All geometries are reprojected to the parent's SRID first. Geometries
    /// that fail the structural check are reported and left out of the
    /// predicate checks; a structurally invalid parent skips containment and
    /// gap checks entirely.
    pub async fn validate_topology(
        &self,
        sections: &[ParcelGeometry],
        parent: &ParcelGeometry,
        options: &TopologyOptions,
    ) -> Result<TopologyValidationReport> {
        let srid = parent.geometry.srid();
        let mut log = Degradations::default();
        let mut findings = Vec::new();

        let parent_findings = polygonal_findings(parent);
        let parent = if parent_findings.is_empty() {
            Some(self.prepare(parent, srid)?)
        } else {
            findings.extend(parent_findings);
            None
        };

        let mut usable = Vec::with_capacity(sections.len());
        for section in sections {
            let reconciled = self.reconcile(section, srid)?;
            let section_findings = polygonal_findings(&reconciled);
            if section_findings.is_empty() {
                usable.push(Prepared::new(reconciled));
            } else {
                findings.extend(section_findings);
            }
        }

        let ids = |items: &[Prepared]| items.iter().map(|p| p.id.as_str()).collect::<Vec<_>>().join(",");

        if options.check_geometry {
            for item in parent.iter().chain(usable.iter()) {
                let finding = self
                    .validity_finding(&mut log, item)
                    .await
                    .map_err(|e| orchestration_error("validate_geometry_topology", &item.id, e))?;
                findings.extend(finding);
            }
        }

        if options.check_overlaps {
            let overlaps = self
                .overlap_findings(&mut log, &usable, options.overlap_tolerance)
                .await
                .map_err(|e| orchestration_error("detect_overlaps", &ids(&usable), e))?;
            findings.extend(overlaps);
        }

        if let Some(parent) = &parent {
            if options.check_containment {
                let containment = self
                    .containment_findings(&mut log, &usable, parent, options.allow_touching)
                    .await
                    .map_err(|e| orchestration_error("validate_containment", &parent.id, e))?;
                findings.extend(containment);
            }

            if options.check_gaps {
                let gaps = self
                    .gap_findings(&mut log, &usable, parent, options.min_gap_area)
                    .await
                    .map_err(|e| orchestration_error("check_gaps", &parent.id, e))?;
                findings.extend(gaps);
            }
        }

        let report =
            TopologyValidationReport::from_findings(findings, sections.len(), log.into_vec());

        info!(
            engine = self.engine.name(),
            sections = sections.len(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            degraded = ?report.summary.degraded_operations,
            is_valid = report.is_valid,
            "Topology validation complete"
        );

        Ok(report)
    }

    fn reconcile(&self, item: &ParcelGeometry, srid: u32) -> Result<ParcelGeometry> {
        let geometry = reproject_geometry(self.registry, &item.geometry, srid).map_err(|e| {
            SurveyError::validation(
                format!("geometry '{}'", item.id),
                format!("EPSG:{} -> EPSG:{}", item.geometry.srid(), srid),
                format!("CRS reconciliation failed: {}", e),
            )
        })?;
        Ok(ParcelGeometry::new(item.id.clone(), geometry))
    }

    /// Reconcile and require structural validity
    fn prepare(&self, item: &ParcelGeometry, srid: u32) -> Result<Prepared> {
        let reconciled = self.reconcile(item, srid)?;
        if let Some(finding) = polygonal_findings(&reconciled).into_iter().next() {
            return Err(SurveyError::validation(
                format!("geometry '{}'", item.id),
                format!("{:?}", item.geometry.geometry_type()),
                finding.description,
            ));
        }
        Ok(Prepared::new(reconciled))
    }

    fn prepare_all(&self, items: &[ParcelGeometry], srid: u32) -> Result<Vec<Prepared>> {
        items.iter().map(|item| self.prepare(item, srid)).collect()
    }

    async fn overlap_findings(
        &self,
        log: &mut Degradations,
        items: &[Prepared],
        tolerance: f64,
    ) -> Result<Vec<TopologyError>> {
        let mut findings = Vec::new();

        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                let result = self.overlaps(log, &a.wkt, &b.wkt, a.srid(), tolerance).await?;
                debug!(first = %a.id, second = %b.id, area = result.overlap_area, "Overlap check");

                if result.overlaps {
                    findings.push(
                        TopologyError::error(
                            TopologyErrorType::Overlap,
                            vec![a.id.clone(), b.id.clone()],
                            format!(
                                "'{}' and '{}' overlap by {:.4}",
                                a.id, b.id, result.overlap_area
                            ),
                        )
                        .with_area(result.overlap_area)
                        .with_coordinates(result.overlap_coordinates),
                    );
                }
            }
        }

        Ok(findings)
    }

    async fn containment_findings(
        &self,
        log: &mut Degradations,
        sections: &[Prepared],
        parent: &Prepared,
        allow_touching: bool,
    ) -> Result<Vec<TopologyError>> {
        let mut findings = Vec::new();

        for section in sections {
            let result = self
                .contains(log, &parent.wkt, &section.wkt, parent.srid(), allow_touching)
                .await?;
            let ids = vec![section.id.clone(), parent.id.clone()];

            let finding = match result {
                ContainmentResult { contains: true, touching: false } => None,
                ContainmentResult { contains: true, touching: true } => Some(TopologyError::warning(
                    TopologyErrorType::TouchingBoundary,
                    ids,
                    format!("'{}' touches the boundary of '{}'", section.id, parent.id),
                )),
                ContainmentResult { contains: false, touching: true } if !allow_touching => {
                    Some(TopologyError::error(
                        TopologyErrorType::Containment,
                        ids,
                        format!(
                            "'{}' is not strictly inside '{}': it meets the parent boundary",
                            section.id, parent.id
                        ),
                    ))
                }
                ContainmentResult { contains: false, .. } => Some(TopologyError::error(
                    TopologyErrorType::Containment,
                    ids,
                    format!("'{}' is not contained within '{}'", section.id, parent.id),
                )),
            };

            findings.extend(finding);
        }

        Ok(findings)
    }

    async fn gap_findings(
        &self,
        log: &mut Degradations,
        sections: &[Prepared],
        parent: &Prepared,
        min_gap_area: f64,
    ) -> Result<Vec<TopologyError>> {
        let wkts: Vec<String> = sections.iter().map(|s| s.wkt.clone()).collect();
        let result = self.find_gaps(log, &wkts, &parent.wkt, parent.srid(), min_gap_area).await?;

        Ok(result
            .gaps
            .into_iter()
            .map(|gap| {
                TopologyError::error(
                    TopologyErrorType::Gap,
                    vec![parent.id.clone()],
                    format!("Area of {:.4} inside '{}' is not covered by any section", gap.area, parent.id),
                )
                .with_area(gap.area)
                .with_coordinates(gap.geometry.coordinates())
            })
            .collect())
    }

    async fn validity_finding(
        &self,
        log: &mut Degradations,
        item: &Prepared,
    ) -> Result<Option<TopologyError>> {
        let result = self.is_valid(log, &item.wkt, item.srid()).await?;
        if result.is_valid {
            return Ok(None);
        }

        let reason = result.reason.unwrap_or_else(|| "invalid geometry".to_string());
        let error_type = if reason.to_lowercase().contains("self-intersection") {
            TopologyErrorType::SelfIntersection
        } else {
            TopologyErrorType::InvalidGeometry
        };

        Ok(Some(TopologyError::error(
            error_type,
            vec![item.id.clone()],
            format!("'{}' is invalid: {}", item.id, reason),
        )))
    }

    fn degrade(&self, log: &mut Degradations, operation: &'static str, error: &SurveyError) {
        warn!(
            engine = self.engine.name(),
            operation,
            error = %error,
            "Geometry engine call failed; using bounding-box fallback"
        );
        log.0.insert(operation);
    }

    async fn overlaps(
        &self,
        log: &mut Degradations,
        first: &str,
        second: &str,
        srid: u32,
        tolerance: f64,
    ) -> Result<OverlapResult> {
        match self.engine.overlaps(first, second, srid, tolerance).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.degrade(log, "overlaps", &e);
                self.fallback.overlaps(first, second, srid, tolerance).await
            }
        }
    }

    async fn contains(
        &self,
        log: &mut Degradations,
        parent: &str,
        child: &str,
        srid: u32,
        allow_touching: bool,
    ) -> Result<ContainmentResult> {
        match self.engine.contains(parent, child, srid, allow_touching).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.degrade(log, "contains", &e);
                self.fallback.contains(parent, child, srid, allow_touching).await
            }
        }
    }

    async fn find_gaps(
        &self,
        log: &mut Degradations,
        sections: &[String],
        parent: &str,
        srid: u32,
        min_area: f64,
    ) -> Result<GapResult> {
        match self.engine.find_gaps(sections, parent, srid, min_area).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.degrade(log, "find_gaps", &e);
                self.fallback.find_gaps(sections, parent, srid, min_area).await
            }
        }
    }

    async fn is_valid(
        &self,
        log: &mut Degradations,
        geometry: &str,
        srid: u32,
    ) -> Result<ValidityResult> {
        match self.engine.is_valid(geometry, srid).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.degrade(log, "is_valid", &e);
                self.fallback.is_valid(geometry, srid).await
            }
        }
    }
}

/// Structural findings for any geometry type
fn structural_findings(item: &ParcelGeometry) -> Vec<TopologyError> {
    let result = validate_geometry_basic(&item.geometry);
    match result.summary() {
        Some(reason) => vec![TopologyError::error(
            TopologyErrorType::InvalidGeometry,
            vec![item.id.clone()],
            format!("'{}' is malformed: {}", item.id, reason),
        )],
        None => Vec::new(),
    }
}

/// Structural findings for a parcel, which must also be a (multi)polygon
fn polygonal_findings(item: &ParcelGeometry) -> Vec<TopologyError> {
    match item.geometry.geometry_type() {
        GeometryType::Polygon | GeometryType::MultiPolygon => structural_findings(item),
        other => vec![TopologyError::error(
            TopologyErrorType::InvalidGeometry,
            vec![item.id.clone()],
            format!("'{}' is a {:?}; parcels must be polygons", item.id, other),
        )],
    }
}

/// Wrap an unexpected failure with the operation and geometries involved
fn orchestration_error(operation: &str, ids: &str, error: SurveyError) -> SurveyError {
    if error.is_validation() {
        return error;
    }
    SurveyError::validation(format!("validate_topology.{}", operation), ids, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use surveykit_core::models::Severity;

    const SRID: u32 = 32735;

    /// Engine whose every call fails
    struct UnreachableEngine;

    #[async_trait]
    impl GeometryEngine for UnreachableEngine {
        fn name(&self) -> &str {
            "unreachable"
        }

        async fn overlaps(&self, _: &str, _: &str, _: u32, _: f64) -> Result<OverlapResult> {
            Err(SurveyError::engine("overlaps", "connection refused"))
        }

        async fn contains(&self, _: &str, _: &str, _: u32, _: bool) -> Result<ContainmentResult> {
            Err(SurveyError::engine("contains", "connection refused"))
        }

        async fn find_gaps(&self, _: &[String], _: &str, _: u32, _: f64) -> Result<GapResult> {
            Err(SurveyError::engine("find_gaps", "connection refused"))
        }

        async fn is_valid(&self, _: &str, _: u32) -> Result<ValidityResult> {
            Err(SurveyError::engine("is_valid", "connection refused"))
        }
    }

    /// Engine that reports a self-intersection for every geometry
    struct SelfIntersectingEngine;

    #[async_trait]
    impl GeometryEngine for SelfIntersectingEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn overlaps(&self, _: &str, _: &str, _: u32, _: f64) -> Result<OverlapResult> {
            Ok(OverlapResult::default())
        }

        async fn contains(&self, _: &str, _: &str, _: u32, _: bool) -> Result<ContainmentResult> {
            Ok(ContainmentResult { contains: true, touching: false })
        }

        async fn find_gaps(&self, _: &[String], _: &str, _: u32, _: f64) -> Result<GapResult> {
            Ok(GapResult::default())
        }

        async fn is_valid(&self, _: &str, _: u32) -> Result<ValidityResult> {
            Ok(ValidityResult::invalid("Self-intersection[5 5]"))
        }
    }

    fn parcel(id: &str, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> ParcelGeometry {
        ParcelGeometry::new(id, Geometry::rectangle(min_x, min_y, max_x, max_y, SRID))
    }

    #[tokio::test]
    async fn test_unreachable_engine_degrades_every_operation() {
        let validator = TopologyValidator::new(Arc::new(UnreachableEngine));
        let parent = parcel("P", 0.0, 0.0, 100.0, 100.0);
        let sections = vec![parcel("S1", 0.0, 0.0, 50.0, 100.0), parcel("S2", 50.0, 0.0, 100.0, 100.0)];

        let report = validator
            .validate_topology(&sections, &parent, &TopologyOptions::default())
            .await
            .unwrap();

        assert_eq!(
            report.summary.degraded_operations,
            vec!["contains", "find_gaps", "is_valid", "overlaps"]
        );
        assert!(report.is_valid);
        // Both sections touch the parent boundary
        assert_eq!(report.warnings.len(), 2);
    }

    #[tokio::test]
    async fn test_engine_results_are_used_when_available() {
        let validator = TopologyValidator::new(Arc::new(SelfIntersectingEngine));
        let parent = parcel("P", 0.0, 0.0, 100.0, 100.0);
        let sections = vec![parcel("S1", 0.0, 0.0, 60.0, 100.0), parcel("S2", 40.0, 0.0, 100.0, 100.0)];

        let report = validator
            .validate_topology(&sections, &parent, &TopologyOptions::default())
            .await
            .unwrap();

        // The scripted engine sees no overlap even though the boxes do overlap
        assert_eq!(report.summary.overlap_count, 0);
        assert_eq!(report.summary.geometry_error_count, 3);
        assert!(report
            .errors
            .iter()
            .all(|e| e.error_type == TopologyErrorType::SelfIntersection));
        assert!(report.summary.degraded_operations.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_section_is_reported_and_skipped() {
        let validator = TopologyValidator::local();
        let parent = parcel("P", 0.0, 0.0, 100.0, 100.0);
        let open_ring = ParcelGeometry::new(
            "BAD",
            Geometry::polygon(vec![vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0]]], SRID),
        );
        let options = TopologyOptions { check_gaps: false, ..TopologyOptions::default() };

        let report = validator.validate_topology(&[open_ring], &parent, &options).await.unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].error_type, TopologyErrorType::InvalidGeometry);
        assert_eq!(report.errors[0].geometry_ids, vec!["BAD"]);
    }

    #[tokio::test]
    async fn test_point_parent_is_rejected_by_standalone_checks() {
        let validator = TopologyValidator::local();
        let parent = ParcelGeometry::new("P", Geometry::point(0.0, 0.0, SRID));
        let err = validator.check_gaps(&[], &parent, 1.0).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("'P'"));
    }

    #[tokio::test]
    async fn test_unknown_crs_is_a_validation_error() {
        let validator = TopologyValidator::local();
        let parent = parcel("P", 0.0, 0.0, 100.0, 100.0);
        let foreign = ParcelGeometry::new("S1", Geometry::rectangle(0.0, 0.0, 1.0, 1.0, 2193));

        let err = validator
            .validate_topology(&[foreign], &parent, &TopologyOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("S1"));
    }

    #[tokio::test]
    async fn test_gap_is_an_error() {
        let validator = TopologyValidator::local();
        let parent = parcel("P", 0.0, 0.0, 100.0, 100.0);
        let sections = vec![parcel("S1", 10.0, 10.0, 40.0, 40.0)];

        let findings = validator.check_gaps(&sections, &parent, 1.0).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!((findings[0].area.unwrap() - 9100.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_single_geometry_validity() {
        let validator = TopologyValidator::new(Arc::new(SelfIntersectingEngine));
        let findings =
            validator.validate_geometry_topology(&parcel("S1", 0.0, 0.0, 1.0, 1.0)).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].error_type, TopologyErrorType::SelfIntersection);
    }
}
