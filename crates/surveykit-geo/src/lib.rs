//! SurveyKit Geo - Units, CRS, parsing and coordinate geometry
//!
//! This crate holds the synchronous, pure computations: unit conversion,
//! CRS reprojection, coordinate parsers, traverse closure, area, angles and
//! the traverse adjustment.

pub mod adjustment;
pub mod cogo;
pub mod crs;
pub mod models;
pub mod parse;
pub mod units;
pub mod validation;
pub mod wkt;

pub use adjustment::least_squares_adjustment;
pub use cogo::{
    assess_accuracy, bearing_distance, calculate_coordinates, calculate_interior_angles,
    compute_area, compute_closure, traverse_from_legs, validate_traverse_angles,
};
pub use crs::{init, reproject_geometry, transform_projection, CrsDefinition, CrsRegistry};
pub use models::GeometryExt;
pub use parse::{
    parse_coordinates_from_csv, parse_decimal_coordinates, parse_dms_coordinates,
    parse_utm_coordinates,
};
pub use units::{convert_distance, format_bearing_dms, from_degrees, normalize_bearing, to_degrees};
pub use validation::{validate_geometry_basic, ValidationResult};
pub use self::wkt::{geometry_to_ewkt, geometry_to_wkt, parse_wkt_geometry};
