//! CRS registry and coordinate reprojection.
//!
//! The registry maps an SRID to a PROJ definition string. It is built once
//! through [`init`] and then passed by reference into the conversion
//! functions, so lookups never touch mutable global state. Coordinates are
//! converted by PROJ.

use std::collections::HashMap;
use std::sync::OnceLock;

use proj::Proj;

use surveykit_core::error::{Result, SurveyError};
use surveykit_core::models::Geometry;

use crate::units::{round_geographic, round_projected};

/// A registered coordinate reference system
#[derive(Debug, Clone, PartialEq)]
pub struct CrsDefinition {
    pub srid: u32,
    pub name: String,
    /// PROJ definition handed to `Proj::new_known_crs`
    pub definition: String,
    geographic: bool,
}

impl CrsDefinition {
    /// Check a PROJ definition such as
    /// `+proj=utm +zone=35 +south +datum=WGS84 +units=m +no_defs`.
    pub fn parse(srid: u32, name: impl Into<String>, definition: impl Into<String>) -> Result<Self> {
        let definition = definition.into();
        let invalid = |reason: String| SurveyError::ConfigInvalid {
            key: format!("crs.EPSG:{}", srid),
            reason,
        };

        if definition.trim().is_empty() {
            return Err(invalid("definition is empty".to_string()));
        }

        Proj::new(&definition)
            .map_err(|e| invalid(format!("PROJ rejected '{}': {}", definition, e)))?;

        let geographic = definition
            .split_whitespace()
            .any(|token| matches!(token, "+proj=longlat" | "+proj=latlong" | "+proj=lonlat"));

        Ok(Self { srid, name: name.into(), definition, geographic })
    }

    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    /// Round a coordinate to the precision kept for this CRS
    pub fn round(&self, x: f64, y: f64) -> (f64, f64) {
        if self.is_geographic() {
            (round_geographic(x), round_geographic(y))
        } else {
            (round_projected(x), round_projected(y))
        }
    }
}

/// Table of known coordinate reference systems
#[derive(Debug, Clone, Default)]
pub struct CrsRegistry {
    definitions: HashMap<u32, CrsDefinition>,
}

const BUILTIN_DEFINITIONS: &[(u32, &str, &str)] = &[
    (4326, "WGS 84", "+proj=longlat +datum=WGS84 +no_defs"),
    (4148, "Hartebeesthoek94", "+proj=longlat +ellps=WGS84 +towgs84=0,0,0,0,0,0,0 +no_defs"),
    (32733, "WGS 84 / UTM zone 33S", "+proj=utm +zone=33 +south +datum=WGS84 +units=m +no_defs"),
    (32734, "WGS 84 / UTM zone 34S", "+proj=utm +zone=34 +south +datum=WGS84 +units=m +no_defs"),
    (32735, "WGS 84 / UTM zone 35S", "+proj=utm +zone=35 +south +datum=WGS84 +units=m +no_defs"),
    (32736, "WGS 84 / UTM zone 36S", "+proj=utm +zone=36 +south +datum=WGS84 +units=m +no_defs"),
];

impl CrsRegistry {
    /// Registry with no definitions
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the geographic and projected systems used for surveying
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (srid, name, definition) in BUILTIN_DEFINITIONS {
            // Built-in definitions are known to parse
            if let Err(e) = registry.register(*srid, *name, *definition) {
                tracing::error!("Built-in CRS EPSG:{} failed to register: {}", srid, e);
            }
        }
        registry
    }

    /// Register (or replace) a definition
    pub fn register(
        &mut self,
        srid: u32,
        name: impl Into<String>,
        definition: impl Into<String>,
    ) -> Result<()> {
        let parsed = CrsDefinition::parse(srid, name, definition)?;
        tracing::debug!(srid = srid, definition = %parsed.definition, "Registered CRS");
        self.definitions.insert(srid, parsed);
        Ok(())
    }

    /// Look up a definition by SRID
    pub fn get(&self, srid: u32) -> Result<&CrsDefinition> {
        self.definitions.get(&srid).ok_or(SurveyError::UnknownCrs { srid })
    }

    pub fn contains(&self, srid: u32) -> bool {
        self.definitions.contains_key(&srid)
    }

    /// Registered SRIDs in ascending order
    pub fn srids(&self) -> Vec<u32> {
        let mut srids: Vec<u32> = self.definitions.keys().copied().collect();
        srids.sort_unstable();
        srids
    }
}

static REGISTRY: OnceLock<CrsRegistry> = OnceLock::new();

/// Initialize the process-wide registry. Safe to call any number of times.
pub fn init() -> &'static CrsRegistry {
    REGISTRY.get_or_init(|| {
        let registry = CrsRegistry::builtin();
        tracing::debug!(count = registry.srids().len(), "CRS registry initialized");
        registry
    })
}

/// Check if two SRIDs name the same CRS
pub fn crs_match(srid1: u32, srid2: u32) -> bool {
    srid1 == srid2
}

/// Coordinate pipeline between two registered systems
struct Transform<'a> {
    from: &'a CrsDefinition,
    to: &'a CrsDefinition,
    /// `None` when both SRIDs name the same CRS
    proj: Option<Proj>,
}

impl<'a> Transform<'a> {
    fn new(registry: &'a CrsRegistry, from_srid: u32, to_srid: u32) -> Result<Self> {
        let from = registry.get(from_srid)?;
        let to = registry.get(to_srid)?;

        let proj = if crs_match(from_srid, to_srid) {
            None
        } else {
            let proj = Proj::new_known_crs(&from.definition, &to.definition, None).map_err(|e| {
                SurveyError::Projection {
                    from: from_srid,
                    to: to_srid,
                    reason: format!("Failed to create projection: {}", e),
                }
            })?;
            Some(proj)
        };

        Ok(Self { from, to, proj })
    }

    fn apply(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(SurveyError::validation(
                "coordinate",
                format!("({}, {})", x, y),
                "coordinates must be finite",
            ));
        }

        if self.from.is_geographic() {
            crate::parse::check_latitude(y)?;
            crate::parse::check_longitude(x)?;
        }

        let Some(proj) = &self.proj else {
            return Ok(self.to.round(x, y));
        };

        let (tx, ty) = proj.convert((x, y)).map_err(|e| SurveyError::Projection {
            from: self.from.srid,
            to: self.to.srid,
            reason: format!("Projection failed: {}", e),
        })?;

        if !tx.is_finite() || !ty.is_finite() {
            return Err(SurveyError::Projection {
                from: self.from.srid,
                to: self.to.srid,
                reason: format!("({}, {}) has no finite image", x, y),
            });
        }

        Ok(self.to.round(tx, ty))
    }
}

/// Reproject a single coordinate between two registered systems.
///
/// Geographic coordinates are `(longitude, latitude)`. Output is rounded to
/// 6 decimals for geographic targets and 4 decimals for projected ones.
pub fn transform_projection(
    registry: &CrsRegistry,
    x: f64,
    y: f64,
    from_srid: u32,
    to_srid: u32,
) -> Result<(f64, f64)> {
    Transform::new(registry, from_srid, to_srid)?.apply(x, y)
}

/// Reproject every vertex of a geometry and stamp the target SRID
pub fn reproject_geometry(
    registry: &CrsRegistry,
    geometry: &Geometry,
    to_srid: u32,
) -> Result<Geometry> {
    let from_srid = geometry.srid();
    if crs_match(from_srid, to_srid) {
        return Ok(geometry.clone());
    }

    let transform = Transform::new(registry, from_srid, to_srid)?;
    let transformed =
        geometry.try_map_coords(|[x, y]| transform.apply(x, y).map(|(tx, ty)| [tx, ty]))?;

    Ok(transformed.with_srid(to_srid))
}
