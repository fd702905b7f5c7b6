//! Reading survey input files

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use surveykit_core::models::{Geometry, Observation, ParcelGeometry, Point2D, TraverseLeg};
use surveykit_geo::{parse_coordinates_from_csv, parse_wkt_geometry};

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Points from a JSON array or a CSV file
pub fn read_points(path: &Path) -> Result<Vec<Point2D>> {
    let text = read(path)?;
    if is_json(path) {
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON array of points", path.display()))
    } else {
        Ok(parse_coordinates_from_csv(&text)?)
    }
}

/// Traverse legs from a JSON array
pub fn read_legs(path: &Path) -> Result<Vec<TraverseLeg>> {
    let text = read(path)?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of traverse legs", path.display()))
}

/// Parse an "x,y" start coordinate
pub fn parse_start(raw: &str) -> Result<Point2D> {
    let Some((x, y)) = raw.split_once(',') else {
        bail!("Start coordinate must be written as X,Y, got '{}'", raw);
    };
    let x: f64 = x.trim().parse().with_context(|| format!("Invalid start x '{}'", x))?;
    let y: f64 = y.trim().parse().with_context(|| format!("Invalid start y '{}'", y))?;
    Ok(Point2D::new(x, y))
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentInput {
    pub points: Vec<Point2D>,
    pub observations: Vec<Observation>,
}

pub fn read_adjustment(path: &Path) -> Result<AdjustmentInput> {
    let text = read(path)?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid adjustment file", path.display()))
}

/// A parcel given either as a geometry object or as WKT.
///
/// Geometry objects without an `srid` take the configured default SRID.
#[derive(Debug, Deserialize)]
pub struct ParcelInput {
    pub id: String,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub wkt: Option<String>,
}

impl ParcelInput {
    pub fn into_parcel(self, default_srid: u32) -> Result<ParcelGeometry> {
        let geometry = match (self.geometry, self.wkt) {
            (Some(mut value), None) => {
                if let Some(object) = value.as_object_mut() {
                    object.entry("srid").or_insert_with(|| Value::from(default_srid));
                }
                serde_json::from_value::<Geometry>(value)
                    .with_context(|| format!("Parcel '{}' has an invalid geometry", self.id))?
            }
            (None, Some(wkt)) => parse_wkt_geometry(&wkt, default_srid)?,
            (Some(_), Some(_)) => bail!("Parcel '{}' has both geometry and wkt", self.id),
            (None, None) => bail!("Parcel '{}' has neither geometry nor wkt", self.id),
        };
        Ok(ParcelGeometry::new(self.id, geometry))
    }
}

#[derive(Debug, Deserialize)]
pub struct SchemeInput {
    pub parent: ParcelInput,
    pub sections: Vec<ParcelInput>,
}

/// Parent parcel and sections of a sectional scheme
pub fn read_scheme(path: &Path, default_srid: u32) -> Result<(ParcelGeometry, Vec<ParcelGeometry>)> {
    let text = read(path)?;
    let scheme: SchemeInput = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid scheme file", path.display()))?;

    let parent = scheme.parent.into_parcel(default_srid)?;
    let sections = scheme
        .sections
        .into_iter()
        .map(|s| s.into_parcel(default_srid))
        .collect::<Result<Vec<_>>>()?;

    Ok((parent, sections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use serde_json::json;
    use tempfile::Builder;

    #[test]
    fn test_parse_start() {
        let p = parse_start("300000, 8000000").unwrap();
        assert_eq!(p.coords(), [300000.0, 8000000.0]);
        assert!(parse_start("300000").is_err());
        assert!(parse_start("a,b").is_err());
    }

    #[test]
    fn test_read_points_from_json_and_csv() {
        let mut json = Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"[{{"x": 1.0, "y": 2.0, "id": "A"}}, {{"x": 3.0, "y": 4.0}}]"#).unwrap();
        let points = read_points(json.path()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id.as_deref(), Some("A"));

        let mut csv = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(csv, "x,y\n1.0,2.0\n3.0,4.0\n5.0,6.0\n").unwrap();
        assert_eq!(read_points(csv.path()).unwrap().len(), 3);
    }

    #[test]
    fn test_parcel_input_accepts_wkt_or_geometry() {
        let from_wkt = ParcelInput {
            id: "S1".into(),
            geometry: None,
            wkt: Some("POLYGON((0 0, 1 0, 1 1, 0 0))".into()),
        };
        assert_eq!(from_wkt.into_parcel(32735).unwrap().geometry.srid(), 32735);

        let neither = ParcelInput { id: "S2".into(), geometry: None, wkt: None };
        assert!(neither.into_parcel(32735).is_err());
    }

    #[test]
    fn test_geometry_without_srid_takes_default() {
        let ring = json!([[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]);
        let implicit = ParcelInput {
            id: "S1".into(),
            geometry: Some(json!({"type": "Polygon", "coordinates": ring})),
            wkt: None,
        };
        assert_eq!(implicit.into_parcel(4326).unwrap().geometry.srid(), 4326);

        let explicit = ParcelInput {
            id: "S2".into(),
            geometry: Some(json!({"type": "Polygon", "coordinates": ring, "srid": 32736})),
            wkt: None,
        };
        assert_eq!(explicit.into_parcel(4326).unwrap().geometry.srid(), 32736);

        let broken = ParcelInput {
            id: "S3".into(),
            geometry: Some(json!({"type": "Polygon", "coordinates": "none"})),
            wkt: None,
        };
        let err = broken.into_parcel(4326).unwrap_err();
        assert!(err.to_string().contains("S3"));
    }
}
