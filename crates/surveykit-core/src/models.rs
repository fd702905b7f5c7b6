pub mod geometry;
pub mod topology;
pub mod traverse;

pub use geometry::{Geometry, GeometryType, Point2D, DEFAULT_SRID, UTM_35S_SRID, WGS84_SRID};
pub use topology::{
    ParcelGeometry, Severity, TopologyError, TopologyErrorType, TopologyOptions, TopologySummary,
    TopologyValidationReport,
};
pub use traverse::{
    AccuracyAssessment, AdjustmentResult, AngleUnit, AngleValidation, AreaResult, AreaUnit,
    BearingDistance, DistanceUnit, Observation, Residual, TraverseClosure, TraverseLeg,
    DEFAULT_CLOSURE_TOLERANCE,
};
