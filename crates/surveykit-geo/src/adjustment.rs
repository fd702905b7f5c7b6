//! Iterative traverse adjustment over a network of observed legs.
//!
//! Each pass forward-projects every observation from its `from` point and
//! moves both endpoints toward agreement, by a tenth of the discrepancy scaled
//! by the observation's weight relative to the heaviest observation. Each
//! endpoint therefore moves at most a tenth of the discrepancy per pass. This
//! is a damped relaxation and not a normal-equations solve.

use std::collections::HashMap;

use surveykit_core::error::{Result, SurveyError};
use surveykit_core::models::{AdjustmentResult, Observation, Point2D, Residual};

use crate::units::round_projected;

/// Fraction of each discrepancy applied per pass
pub const DAMPING_FACTOR: f64 = 0.1;

/// Adjust point coordinates so they agree better with the observations.
///
/// Points are matched to observations through their `id`; points without an
/// id are returned unchanged.
pub fn least_squares_adjustment(
    points: &[Point2D],
    observations: &[Observation],
    iterations: usize,
) -> Result<AdjustmentResult> {
    let index = index_points(points)?;
    let resolved = resolve_observations(&index, observations)?;
    let max_weight = resolved.iter().map(|&(_, _, w)| w).fold(0.0, f64::max);

    let mut coords: Vec<[f64; 2]> = points.iter().map(Point2D::coords).collect();
    let residuals_before = residuals(&coords, observations, &resolved);

    for iteration in 0..iterations {
        for (obs, &(from, to, weight)) in observations.iter().zip(&resolved) {
            let [dx, dy] = discrepancy(&coords, obs, from, to);
            let shift = DAMPING_FACTOR * weight / max_weight;

            coords[to][0] += dx * shift;
            coords[to][1] += dy * shift;
            coords[from][0] -= dx * shift;
            coords[from][1] -= dy * shift;
        }

        tracing::trace!(
            iteration = iteration + 1,
            max_residual = max_magnitude(&residuals(&coords, observations, &resolved)),
            "Adjustment pass complete"
        );
    }

    let adjusted: Vec<Point2D> = points
        .iter()
        .zip(&coords)
        .map(|(p, c)| Point2D {
            x: round_projected(c[0]),
            y: round_projected(c[1]),
            id: p.id.clone(),
        })
        .collect();

    let rounded: Vec<[f64; 2]> = adjusted.iter().map(Point2D::coords).collect();
    let residuals_after = residuals(&rounded, observations, &resolved);

    tracing::debug!(
        points = points.len(),
        observations = observations.len(),
        iterations,
        before = max_magnitude(&residuals_before),
        after = max_magnitude(&residuals_after),
        "Traverse adjustment finished"
    );

    Ok(AdjustmentResult { points: adjusted, residuals_before, residuals_after, iterations })
}

fn index_points(points: &[Point2D]) -> Result<HashMap<&str, usize>> {
    let mut index = HashMap::new();
    for (i, point) in points.iter().enumerate() {
        if !point.is_finite() {
            return Err(SurveyError::validation(
                format!("points[{}]", i),
                format!("({}, {})", point.x, point.y),
                "coordinates must be finite",
            ));
        }
        if let Some(id) = point.id.as_deref() {
            if index.insert(id, i).is_some() {
                return Err(SurveyError::validation("points.id", id, "duplicate point id"));
            }
        }
    }
    Ok(index)
}

fn resolve_observations(
    index: &HashMap<&str, usize>,
    observations: &[Observation],
) -> Result<Vec<(usize, usize, f64)>> {
    if observations.is_empty() {
        return Err(SurveyError::validation("observations", 0, "at least one observation is required"));
    }

    observations
        .iter()
        .enumerate()
        .map(|(i, obs)| {
            let lookup = |id: &str, end: &str| {
                index.get(id).copied().ok_or_else(|| {
                    SurveyError::validation(
                        format!("observations[{}].{}", i, end),
                        id,
                        "no point with this id",
                    )
                })
            };
            let from = lookup(&obs.from, "from")?;
            let to = lookup(&obs.to, "to")?;

            if !obs.bearing.is_finite() {
                return Err(SurveyError::validation(
                    format!("observations[{}].bearing", i),
                    obs.bearing,
                    "bearing must be a finite number of degrees",
                ));
            }

            if !obs.distance.is_finite() || obs.distance < 0.0 {
                return Err(SurveyError::validation(
                    format!("observations[{}].distance", i),
                    obs.distance,
                    "distance must be a non-negative number",
                ));
            }

            let weight = obs.weight.unwrap_or(1.0);
            if !weight.is_finite() || weight <= 0.0 {
                return Err(SurveyError::validation(
                    format!("observations[{}].weight", i),
                    weight,
                    "weight must be positive",
                ));
            }

            Ok((from, to, weight))
        })
        .collect()
}

/// Observed position of `to` minus its current position
fn discrepancy(coords: &[[f64; 2]], obs: &Observation, from: usize, to: usize) -> [f64; 2] {
    let radians = obs.bearing.to_radians();
    let projected_x = coords[from][0] + obs.distance * radians.sin();
    let projected_y = coords[from][1] + obs.distance * radians.cos();
    [projected_x - coords[to][0], projected_y - coords[to][1]]
}

fn residuals(
    coords: &[[f64; 2]],
    observations: &[Observation],
    resolved: &[(usize, usize, f64)],
) -> Vec<Residual> {
    observations
        .iter()
        .zip(resolved)
        .map(|(obs, &(from, to, _))| {
            let [dx, dy] = discrepancy(coords, obs, from, to);
            Residual {
                from: obs.from.clone(),
                to: obs.to.clone(),
                dx,
                dy,
                magnitude: dx.hypot(dy),
            }
        })
        .collect()
}

fn max_magnitude(residuals: &[Residual]) -> f64 {
    residuals.iter().map(|r| r.magnitude).fold(0.0, f64::max)
}
