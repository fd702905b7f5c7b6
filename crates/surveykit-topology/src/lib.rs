//! SurveyKit Topology - Geometry engine port, adapters and topology validator
//!
//! This crate defines the geometry engine port and provides a local
//! bounding-box engine, a PostGIS engine, and the validator that
//! orchestrates them.

pub mod fallback;
pub mod ports;
pub mod postgis;
pub mod validator;

pub use fallback::BoundingBoxEngine;
pub use ports::{ContainmentResult, Gap, GapResult, GeometryEngine, OverlapResult, ValidityResult};
pub use postgis::{PostgisConfig, PostgisEngine};
pub use validator::TopologyValidator;
