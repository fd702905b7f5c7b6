//! Conversions between canonical geometries and the `geo` crate.

use geo::algorithm::{Area, BoundingRect, Centroid};
use geo::{Geometry as GeoGeometry, Rect};

use surveykit_core::error::{Result, SurveyError};
pub use surveykit_core::models::{Geometry, GeometryType, Point2D};

fn to_line_string(ring: &[[f64; 2]]) -> geo::LineString {
    geo::LineString::new(ring.iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect())
}

fn to_geo_polygon(rings: &[Vec<[f64; 2]>]) -> geo::Polygon {
    match rings.split_first() {
        Some((exterior, interiors)) => geo::Polygon::new(
            to_line_string(exterior),
            interiors.iter().map(|ring| to_line_string(ring)).collect(),
        ),
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

fn polygon_rings(p: &geo::Polygon) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(p.exterior())
        .chain(p.interiors())
        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        .collect()
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Point { coordinates, .. } => {
            GeoGeometry::Point(geo::Point::new(coordinates[0], coordinates[1]))
        }
        Geometry::LineString { coordinates, .. } => {
            GeoGeometry::LineString(to_line_string(coordinates))
        }
        Geometry::Polygon { coordinates, .. } => GeoGeometry::Polygon(to_geo_polygon(coordinates)),
        Geometry::MultiPolygon { coordinates, .. } => GeoGeometry::MultiPolygon(
            geo::MultiPolygon::new(coordinates.iter().map(|p| to_geo_polygon(p)).collect()),
        ),
    }
}

/// Polygonal view of a geometry; points and lines have none
pub fn to_geo_multi_polygon(geom: &Geometry) -> Option<geo::MultiPolygon> {
    match geom {
        Geometry::Polygon { coordinates, .. } => {
            Some(geo::MultiPolygon::new(vec![to_geo_polygon(coordinates)]))
        }
        Geometry::MultiPolygon { coordinates, .. } => Some(geo::MultiPolygon::new(
            coordinates.iter().map(|p| to_geo_polygon(p)).collect(),
        )),
        _ => None,
    }
}

/// Convert a geo::Geometry to a canonical Geometry in the given SRID
pub fn from_geo_geometry(geom: &GeoGeometry, srid: u32) -> Result<Geometry> {
    match geom {
        GeoGeometry::Point(p) => Ok(Geometry::point(p.x(), p.y(), srid)),
        GeoGeometry::Line(l) => {
            Ok(Geometry::line_string(vec![[l.start.x, l.start.y], [l.end.x, l.end.y]], srid))
        }
        GeoGeometry::LineString(ls) => {
            Ok(Geometry::line_string(ls.coords().map(|c| [c.x, c.y]).collect(), srid))
        }
        GeoGeometry::Polygon(p) => Ok(Geometry::polygon(polygon_rings(p), srid)),
        GeoGeometry::MultiPolygon(mp) => {
            Ok(Geometry::multi_polygon(mp.iter().map(polygon_rings).collect(), srid))
        }
        GeoGeometry::Rect(r) => Ok(Geometry::polygon(polygon_rings(&r.to_polygon()), srid)),
        GeoGeometry::Triangle(t) => Ok(Geometry::polygon(polygon_rings(&t.to_polygon()), srid)),
        GeoGeometry::MultiPoint(_) => Err(unsupported("MultiPoint")),
        GeoGeometry::MultiLineString(_) => Err(unsupported("MultiLineString")),
        GeoGeometry::GeometryCollection(_) => Err(unsupported("GeometryCollection")),
    }
}

fn unsupported(kind: &str) -> SurveyError {
    SurveyError::validation(
        "geometry",
        kind,
        "only Point, LineString, Polygon and MultiPolygon are supported",
    )
}

/// Extension trait for Geometry with geo-crate operations
pub trait GeometryExt {
    /// Convert to geo::Geometry
    fn to_geo(&self) -> GeoGeometry;

    /// Axis-aligned bounding box
    fn bounding_box(&self) -> Option<Rect>;

    /// Planar area in the units of the geometry's CRS
    fn planar_area(&self) -> f64;

    /// Get the centroid as coordinates
    fn centroid_coords(&self) -> Option<[f64; 2]>;
}

impl GeometryExt for Geometry {
    fn to_geo(&self) -> GeoGeometry {
        to_geo_geometry(self)
    }

    fn bounding_box(&self) -> Option<Rect> {
        self.to_geo().bounding_rect()
    }

    fn planar_area(&self) -> f64 {
        self.to_geo().unsigned_area()
    }

    fn centroid_coords(&self) -> Option<[f64; 2]> {
        self.to_geo().centroid().map(|p| [p.x(), p.y()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Geometry {
        Geometry::rectangle(0.0, 0.0, 2.0, 2.0, 32735)
    }

    #[test]
    fn test_polygon_roundtrip() {
        let geom = square();
        let back = from_geo_geometry(&to_geo_geometry(&geom), 32735).unwrap();
        assert_eq!(geom, back);
    }

    #[test]
    fn test_polygon_with_hole_keeps_interiors() {
        let geom = Geometry::polygon(
            vec![
                vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
                vec![[2.0, 2.0], [4.0, 2.0], [4.0, 4.0], [2.0, 4.0], [2.0, 2.0]],
            ],
            32735,
        );
        assert!((geom.planar_area() - 96.0).abs() < 1e-9);
        let back = from_geo_geometry(&to_geo_geometry(&geom), 32735).unwrap();
        assert_eq!(geom, back);
    }

    #[test]
    fn test_centroid_and_bbox() {
        let geom = square();
        let centroid = geom.centroid_coords().unwrap();
        assert!((centroid[0] - 1.0).abs() < 1e-10);
        assert!((centroid[1] - 1.0).abs() < 1e-10);

        let bbox = geom.bounding_box().unwrap();
        assert_eq!(bbox.min().x, 0.0);
        assert_eq!(bbox.max().y, 2.0);
    }

    #[test]
    fn test_multipoint_is_rejected() {
        let mp = GeoGeometry::MultiPoint(geo::MultiPoint::new(vec![geo::Point::new(0.0, 0.0)]));
        let err = from_geo_geometry(&mp, 4326).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_points_have_no_polygonal_view() {
        assert!(to_geo_multi_polygon(&Geometry::point(1.0, 1.0, 4326)).is_none());
        assert_eq!(to_geo_multi_polygon(&square()).unwrap().0.len(), 1);
    }
}
