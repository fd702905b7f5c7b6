//! Geometry engine backed by a PostGIS database

pub mod config;

pub use config::{ConfigError, PoolConfig, PostgisConfig};

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use surveykit_core::error::{Result, SurveyError};
use surveykit_geo::parse_wkt_geometry;

use crate::ports::{
    ContainmentResult, Gap, GapResult, GeometryEngine, OverlapResult, ValidityResult,
};

/// Geometry engine that runs predicates as PostGIS queries
pub struct PostgisEngine {
    pool: PgPool,
    config: PostgisConfig,
}

fn engine_error(operation: &'static str) -> impl Fn(sqlx::Error) -> SurveyError {
    move |e| SurveyError::engine(operation, e.to_string())
}

impl PostgisEngine {
    /// Connect to the database and check that PostGIS is installed
    pub async fn connect(config: PostgisConfig) -> Result<Self> {
        config.validate()?;

        let mut options = PgConnectOptions::from_str(&config.database_url).map_err(|e| {
            SurveyError::ConfigInvalid { key: "database_url".to_string(), reason: e.to_string() }
        })?;
        if let Some(timeout) = config.statement_timeout {
            options = options.options([("statement_timeout", timeout.as_millis().to_string())]);
        }

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .connect_with(options)
            .await
            .map_err(engine_error("connect"))?;

        let version: String = sqlx::query_scalar("SELECT PostGIS_Version()")
            .fetch_one(&pool)
            .await
            .map_err(engine_error("connect"))?;
        tracing::info!(postgis = %version, "Connected to PostGIS geometry engine");

        Ok(Self { pool, config })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &PostgisConfig {
        &self.config
    }
}

#[async_trait]
impl GeometryEngine for PostgisEngine {
    fn name(&self) -> &str {
        "postgis"
    }

    async fn overlaps(
        &self,
        first: &str,
        second: &str,
        srid: u32,
        tolerance: f64,
    ) -> Result<OverlapResult> {
        let row = sqlx::query(
            r#"
            SELECT ST_Area(i.geom) AS area, ST_AsText(i.geom) AS wkt
            FROM (
                SELECT ST_Intersection(ST_GeomFromText($1, $3), ST_GeomFromText($2, $3)) AS geom
            ) i
            "#,
        )
        .bind(first)
        .bind(second)
        .bind(srid as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(engine_error("overlaps"))?;

        let overlap_area: f64 = row.try_get("area").map_err(engine_error("overlaps"))?;
        if overlap_area <= tolerance {
            return Ok(OverlapResult { overlap_area, ..Default::default() });
        }

        let wkt: Option<String> = row.try_get("wkt").map_err(engine_error("overlaps"))?;
        let overlap_coordinates = match wkt {
            Some(wkt) => parse_wkt_geometry(&wkt, srid)
                .map(|g| g.coordinates())
                .map_err(|e| SurveyError::engine("overlaps", e.to_string()))?,
            None => Vec::new(),
        };

        Ok(OverlapResult { overlaps: true, overlap_area, overlap_coordinates })
    }

    async fn contains(
        &self,
        parent: &str,
        child: &str,
        srid: u32,
        allow_touching: bool,
    ) -> Result<ContainmentResult> {
        let row = sqlx::query(
            r#"
            SELECT
                CASE WHEN $4 THEN ST_Covers(g.parent, g.child)
                     ELSE ST_ContainsProperly(g.parent, g.child) END AS contains,
                ST_Intersects(ST_Boundary(g.parent), ST_Boundary(g.child)) AS touching
            FROM (
                SELECT ST_GeomFromText($1, $3) AS parent, ST_GeomFromText($2, $3) AS child
            ) g
            "#,
        )
        .bind(parent)
        .bind(child)
        .bind(srid as i32)
        .bind(allow_touching)
        .fetch_one(&self.pool)
        .await
        .map_err(engine_error("contains"))?;

        Ok(ContainmentResult {
            contains: row.try_get("contains").map_err(engine_error("contains"))?,
            touching: row.try_get("touching").map_err(engine_error("contains"))?,
        })
    }

    async fn find_gaps(
        &self,
        sections: &[String],
        parent: &str,
        srid: u32,
        min_area: f64,
    ) -> Result<GapResult> {
        let rows = sqlx::query(
            r#"
            WITH covered AS (
                SELECT COALESCE(
                    ST_Union(ST_GeomFromText(s, $3)),
                    ST_GeomFromText('POLYGON EMPTY', $3)
                ) AS geom
                FROM unnest($2::text[]) AS s
            ),
            pieces AS (
                SELECT (ST_Dump(ST_Difference(ST_GeomFromText($1, $3), covered.geom))).geom AS geom
                FROM covered
            )
            SELECT ST_AsText(geom) AS wkt, ST_Area(geom) AS area
            FROM pieces
            WHERE ST_Area(geom) >= $4
            "#,
        )
        .bind(parent)
        .bind(sections)
        .bind(srid as i32)
        .bind(min_area)
        .fetch_all(&self.pool)
        .await
        .map_err(engine_error("find_gaps"))?;

        let gaps = rows
            .iter()
            .map(|row| {
                let wkt: String = row.try_get("wkt").map_err(engine_error("find_gaps"))?;
                let area: f64 = row.try_get("area").map_err(engine_error("find_gaps"))?;
                let geometry = parse_wkt_geometry(&wkt, srid)
                    .map_err(|e| SurveyError::engine("find_gaps", e.to_string()))?;
                Ok(Gap { area, geometry })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GapResult { gaps })
    }

    async fn is_valid(&self, geometry: &str, srid: u32) -> Result<ValidityResult> {
        let row = sqlx::query(
            r#"
            SELECT ST_IsValid(g.geom) AS is_valid, ST_IsValidReason(g.geom) AS reason
            FROM (SELECT ST_GeomFromText($1, $2) AS geom) g
            "#,
        )
        .bind(geometry)
        .bind(srid as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(engine_error("is_valid"))?;

        let is_valid: bool = row.try_get("is_valid").map_err(engine_error("is_valid"))?;
        if is_valid {
            return Ok(ValidityResult::valid());
        }

        let reason: String = row.try_get("reason").map_err(engine_error("is_valid"))?;
        Ok(ValidityResult::invalid(reason))
    }
}
