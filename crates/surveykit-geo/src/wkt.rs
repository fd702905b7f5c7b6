//! WKT reading and writing for canonical geometries.

use std::str::FromStr;

use surveykit_core::error::{Result, SurveyError};
use surveykit_core::models::Geometry;
use wkt::{ToWkt, Wkt};

use crate::models::{from_geo_geometry, to_geo_geometry};

/// Parse WKT (or EWKT with a leading `SRID=n;`) into a geometry.
///
/// An SRID embedded in the text wins over `default_srid`.
pub fn parse_wkt_geometry(text: &str, default_srid: u32) -> Result<Geometry> {
    let fail = |reason: String| SurveyError::validation("wkt", text, reason);

    let trimmed = text.trim();
    let (srid, body) = match trimmed.split_once(';') {
        Some((prefix, body)) if prefix.trim().to_uppercase().starts_with("SRID=") => {
            let srid = prefix.trim()[5..]
                .trim()
                .parse::<u32>()
                .map_err(|_| fail(format!("invalid SRID prefix '{}'", prefix)))?;
            (srid, body)
        }
        _ => (default_srid, trimmed),
    };

    let parsed = Wkt::<f64>::from_str(body).map_err(|e| fail(e.to_string()))?;
    let geometry = geo::Geometry::<f64>::try_from(parsed).map_err(|e| fail(e.to_string()))?;

    from_geo_geometry(&geometry, srid).map_err(|e| match e {
        SurveyError::Validation { reason, .. } => fail(reason),
        other => other,
    })
}

/// Render a geometry as WKT (without the SRID)
pub fn geometry_to_wkt(geometry: &Geometry) -> String {
    to_geo_geometry(geometry).wkt_string()
}

/// Render a geometry as EWKT, e.g. `SRID=32735;POLYGON((...))`
pub fn geometry_to_ewkt(geometry: &Geometry) -> String {
    format!("SRID={};{}", geometry.srid(), geometry_to_wkt(geometry))
}
