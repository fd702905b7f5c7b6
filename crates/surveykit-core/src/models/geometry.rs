//! Canonical coordinate and geometry types used across all surveykit crates.
//!
//! Geometries carry plain coordinate arrays plus the SRID they are expressed
//! in, so they serialize cleanly to JSON and convert to `geo` crate types.

use serde::{Deserialize, Serialize};

/// WGS 84 geographic coordinates (EPSG:4326)
pub const WGS84_SRID: u32 = 4326;

/// WGS 84 / UTM zone 35S (EPSG:32735)
pub const UTM_35S_SRID: u32 = 32735;

/// Projected metric system used for survey computations unless told otherwise
pub const DEFAULT_SRID: u32 = UTM_35S_SRID;

fn default_srid() -> u32 {
    DEFAULT_SRID
}

/// A planar coordinate, optionally tagged with an identifier that correlates
/// the same physical beacon across observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, id: None }
    }

    /// Create a point carrying a beacon identifier
    pub fn with_id(x: f64, y: f64, id: impl Into<String>) -> Self {
        Self { x, y, id: Some(id.into()) }
    }

    pub fn coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(c: [f64; 2]) -> Self {
        Point2D::new(c[0], c[1])
    }
}

/// Geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPolygon,
}

/// Tagged geometry with coordinate arrays and an explicit SRID.
///
/// Polygon rings are closed: the first coordinate repeats as the last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
        #[serde(default = "default_srid")]
        srid: u32,
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
        #[serde(default = "default_srid")]
        srid: u32,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
        #[serde(default = "default_srid")]
        srid: u32,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
        #[serde(default = "default_srid")]
        srid: u32,
    },
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(x: f64, y: f64, srid: u32) -> Self {
        Geometry::Point { coordinates: [x, y], srid }
    }

    /// Create a LineString geometry
    pub fn line_string(coords: Vec<[f64; 2]>, srid: u32) -> Self {
        Geometry::LineString { coordinates: coords, srid }
    }

    /// Create a Polygon geometry from rings (exterior first)
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>, srid: u32) -> Self {
        Geometry::Polygon { coordinates: rings, srid }
    }

    /// Create a MultiPolygon geometry
    pub fn multi_polygon(polygons: Vec<Vec<Vec<[f64; 2]>>>, srid: u32) -> Self {
        Geometry::MultiPolygon { coordinates: polygons, srid }
    }

    /// Build a polygon from a traverse, closing the ring if needed
    pub fn polygon_from_points(points: &[Point2D], srid: u32) -> Self {
        let mut ring: Vec<[f64; 2]> = points.iter().map(Point2D::coords).collect();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        Geometry::polygon(vec![ring], srid)
    }

    /// Axis-aligned rectangle as a closed polygon
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64, srid: u32) -> Self {
        Geometry::polygon(
            vec![vec![
                [min_x, min_y],
                [max_x, min_y],
                [max_x, max_y],
                [min_x, max_y],
                [min_x, min_y],
            ]],
            srid,
        )
    }

    pub fn srid(&self) -> u32 {
        match self {
            Geometry::Point { srid, .. }
            | Geometry::LineString { srid, .. }
            | Geometry::Polygon { srid, .. }
            | Geometry::MultiPolygon { srid, .. } => *srid,
        }
    }

    /// Return a copy tagged with another SRID (coordinates untouched)
    pub fn with_srid(mut self, new_srid: u32) -> Self {
        match &mut self {
            Geometry::Point { srid, .. }
            | Geometry::LineString { srid, .. }
            | Geometry::Polygon { srid, .. }
            | Geometry::MultiPolygon { srid, .. } => *srid = new_srid,
        }
        self
    }

    /// Get the geometry type
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::LineString { .. } => GeometryType::LineString,
            Geometry::Polygon { .. } => GeometryType::Polygon,
            Geometry::MultiPolygon { .. } => GeometryType::MultiPolygon,
        }
    }

    /// Every coordinate of the geometry, rings flattened in order
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        match self {
            Geometry::Point { coordinates, .. } => vec![*coordinates],
            Geometry::LineString { coordinates, .. } => coordinates.clone(),
            Geometry::Polygon { coordinates, .. } => coordinates.concat(),
            Geometry::MultiPolygon { coordinates, .. } => {
                coordinates.iter().flat_map(|poly| poly.concat()).collect()
            }
        }
    }

    /// Apply a fallible function to every coordinate, keeping the shape
    pub fn try_map_coords<E>(
        &self,
        mut f: impl FnMut([f64; 2]) -> Result<[f64; 2], E>,
    ) -> Result<Geometry, E> {
        let mut map_ring = |ring: &Vec<[f64; 2]>| -> Result<Vec<[f64; 2]>, E> {
            ring.iter().map(|c| f(*c)).collect()
        };

        Ok(match self {
            Geometry::Point { coordinates, srid } => {
                let mapped = map_ring(&vec![*coordinates])?;
                Geometry::Point { coordinates: mapped[0], srid: *srid }
            }
            Geometry::LineString { coordinates, srid } => {
                Geometry::LineString { coordinates: map_ring(coordinates)?, srid: *srid }
            }
            Geometry::Polygon { coordinates, srid } => Geometry::Polygon {
                coordinates: coordinates.iter().map(&mut map_ring).collect::<Result<_, E>>()?,
                srid: *srid,
            },
            Geometry::MultiPolygon { coordinates, srid } => Geometry::MultiPolygon {
                coordinates: coordinates
                    .iter()
                    .map(|poly| poly.iter().map(&mut map_ring).collect::<Result<Vec<_>, E>>())
                    .collect::<Result<_, E>>()?,
                srid: *srid,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_serialization() {
        let polygon = Geometry::rectangle(0.0, 0.0, 10.0, 10.0, UTM_35S_SRID);
        let json = serde_json::to_string(&polygon).unwrap();
        assert!(json.contains("\"type\":\"Polygon\""));
        assert!(json.contains("32735"));

        let parsed: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(polygon, parsed);
    }

    #[test]
    fn test_missing_srid_defaults_to_projected() {
        let parsed: Geometry =
            serde_json::from_str(r#"{"type":"Point","coordinates":[300000.0,8000000.0]}"#)
                .unwrap();
        assert_eq!(parsed.srid(), DEFAULT_SRID);
    }

    #[test]
    fn test_polygon_from_points_closes_ring() {
        let points = vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0), Point2D::new(1.0, 1.0)];
        let Geometry::Polygon { coordinates, .. } = Geometry::polygon_from_points(&points, 4326)
        else {
            panic!("Expected Polygon");
        };
        assert_eq!(coordinates[0].len(), 4);
        assert_eq!(coordinates[0][0], coordinates[0][3]);
    }

    #[test]
    fn test_try_map_coords_keeps_shape() {
        let square = Geometry::rectangle(0.0, 0.0, 1.0, 1.0, 4326);
        let shifted = square
            .try_map_coords(|[x, y]| Ok::<_, ()>([x + 10.0, y]))
            .unwrap();
        assert_eq!(shifted.coordinates()[1], [11.0, 0.0]);
        assert_eq!(shifted.coordinates().len(), 5);
        assert_eq!(shifted.srid(), 4326);
    }

    #[test]
    fn test_point_id_is_optional_in_json() {
        let p: Point2D = serde_json::from_str(r#"{"x":1.0,"y":2.0}"#).unwrap();
        assert_eq!(p.id, None);
        let json = serde_json::to_string(&Point2D::with_id(1.0, 2.0, "B1")).unwrap();
        assert!(json.contains("\"id\":\"B1\""));
    }
}
