//! Coordinate geometry: bearings, traverses, closure, area and angles.
//!
//! Bearings are in degrees, 0° = north, measured clockwise. Coordinates are
//! planar (projected, metric); computed points are rounded to 4 decimals.

use surveykit_core::error::{Result, SurveyError};
use surveykit_core::models::{
    AccuracyAssessment, AngleValidation, AreaResult, AreaUnit, BearingDistance, DistanceUnit,
    Point2D, TraverseClosure, TraverseLeg,
};

use crate::units::{convert_distance, normalize_bearing, round_projected, round_to};

/// Distance within which the last point counts as returning onto the first (m)
pub const CLOSED_TRAVERSE_EPSILON: f64 = 0.001;

/// Allowed deviation of an interior-angle sum from (n-2)·180°
pub const ANGLE_SUM_TOLERANCE: f64 = 0.01;

fn ensure_points(points: &[Point2D], minimum: usize) -> Result<()> {
    if points.len() < minimum {
        return Err(SurveyError::validation(
            "points",
            points.len(),
            format!("at least {} points are required", minimum),
        ));
    }
    if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| !p.is_finite()) {
        return Err(SurveyError::validation(
            format!("points[{}]", i),
            format!("({}, {})", p.x, p.y),
            "coordinates must be finite",
        ));
    }
    Ok(())
}

fn leg_delta(from: &Point2D, to: &Point2D) -> (f64, f64) {
    (to.x - from.x, to.y - from.y)
}

fn bearing_of(dx: f64, dy: f64) -> f64 {
    normalize_bearing(dx.atan2(dy).to_degrees())
}

/// Bearing and distance from one point to another.
///
/// The distance is returned in `unit`; coordinates are taken to be meters.
pub fn bearing_distance(from: &Point2D, to: &Point2D, unit: DistanceUnit) -> BearingDistance {
    let (dx, dy) = leg_delta(from, to);
    BearingDistance {
        bearing: bearing_of(dx, dy),
        distance: convert_distance(dx.hypot(dy), DistanceUnit::Meters, unit),
    }
}

/// Forward computation: the point at `distance` meters along `bearing` from `from`.
pub fn calculate_coordinates(from: &Point2D, bearing: f64, distance: f64) -> Point2D {
    let radians = bearing.to_radians();
    Point2D::new(
        round_projected(from.x + distance * radians.sin()),
        round_projected(from.y + distance * radians.cos()),
    )
}

/// Compute the point sequence of a traverse from its observed legs.
///
/// The result starts with `start` and has one more point than `legs`.
pub fn traverse_from_legs(start: &Point2D, legs: &[TraverseLeg]) -> Result<Vec<Point2D>> {
    let mut points = Vec::with_capacity(legs.len() + 1);
    points.push(start.clone());

    let mut current = start.clone();
    for (i, leg) in legs.iter().enumerate() {
        if !leg.distance.is_finite() || leg.distance < 0.0 {
            return Err(SurveyError::validation(
                format!("legs[{}].distance", i),
                leg.distance,
                "distance must be a non-negative number",
            ));
        }
        if !leg.bearing.is_finite() {
            return Err(SurveyError::validation(
                format!("legs[{}].bearing", i),
                leg.bearing,
                "bearing must be a finite number",
            ));
        }

        let meters = convert_distance(leg.distance, leg.unit, DistanceUnit::Meters);
        let next = calculate_coordinates(&current, normalize_bearing(leg.bearing), meters);
        points.push(next.clone());
        current = next;
    }

    Ok(points)
}

/// Closure analysis of a traverse of at least three points.
///
/// A traverse whose last point lies within [`CLOSED_TRAVERSE_EPSILON`] of its
/// first is closed, and its misclosure is the vector sum of latitudes and
/// departures. Otherwise the gap between first and last point is reported
/// and the loop is marked open.
pub fn compute_closure(points: &[Point2D], tolerance: f64) -> Result<TraverseClosure> {
    ensure_points(points, 3)?;
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(SurveyError::validation("tolerance", tolerance, "must be positive"));
    }

    let total_distance: f64 = points
        .windows(2)
        .map(|w| bearing_distance(&w[0], &w[1], DistanceUnit::Meters).distance)
        .sum();
    if total_distance == 0.0 {
        return Err(SurveyError::validation(
            "points",
            points.len(),
            "traverse has zero total length",
        ));
    }

    let first = &points[0];
    let last = &points[points.len() - 1];
    let gap = bearing_distance(first, last, DistanceUnit::Meters);
    let is_closed = gap.distance <= CLOSED_TRAVERSE_EPSILON;

    let (departure, latitude) = if is_closed {
        points.windows(2).fold((0.0, 0.0), |(dep, lat), w| {
            let (dx, dy) = leg_delta(&w[0], &w[1]);
            (dep + dx, lat + dy)
        })
    } else {
        leg_delta(first, last)
    };

    let (closure_distance, closure_bearing) = if is_closed {
        let distance = departure.hypot(latitude);
        let bearing = if distance > 0.0 { bearing_of(departure, latitude) } else { 0.0 };
        (distance, bearing)
    } else {
        (gap.distance, gap.bearing)
    };

    let closure_error_ratio = closure_distance / total_distance;

    Ok(TraverseClosure {
        closure_error: closure_distance,
        closure_error_ratio,
        closure_distance,
        closure_bearing,
        is_within_tolerance: closure_error_ratio <= tolerance,
        tolerance,
        misclosure_latitude: latitude,
        misclosure_departure: departure,
        total_distance,
        is_closed,
        precision_ratio: (closure_distance > 0.0).then(|| total_distance / closure_distance),
    })
}

/// Area (shoelace formula) and perimeter of a parcel boundary.
///
/// The ring is closed automatically when the last point differs from the first.
pub fn compute_area(points: &[Point2D], unit: AreaUnit) -> Result<AreaResult> {
    ensure_points(points, 3)?;

    let mut ring: Vec<&Point2D> = points.iter().collect();
    if points[0].coords() != points[points.len() - 1].coords() {
        ring.push(&points[0]);
    }

    let twice_area: f64 = ring.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum();
    let perimeter: f64 = ring
        .windows(2)
        .map(|w| bearing_distance(w[0], w[1], DistanceUnit::Meters).distance)
        .sum();

    let square_meters = twice_area.abs() / 2.0;
    Ok(AreaResult {
        area: round_to(unit.from_square_meters(square_meters), 4),
        unit,
        perimeter: round_projected(perimeter),
    })
}

/// Interior angle at every vertex of a closed figure, each in (0, 180].
///
/// A repeated closing point is ignored.
pub fn calculate_interior_angles(points: &[Point2D]) -> Result<Vec<f64>> {
    let vertices = strip_closing_point(points);
    ensure_points(vertices, 3)?;

    let n = vertices.len();
    let angles = (0..n)
        .map(|i| {
            let vertex = &vertices[i];
            let prev = &vertices[(i + n - 1) % n];
            let next = &vertices[(i + 1) % n];

            let back = bearing_distance(vertex, prev, DistanceUnit::Meters).bearing;
            let ahead = bearing_distance(vertex, next, DistanceUnit::Meters).bearing;

            let mut angle = (back - ahead).abs();
            if angle > 180.0 {
                angle = 360.0 - angle;
            }
            angle
        })
        .collect();

    Ok(angles)
}

/// Check that interior angles sum to (n-2)·180° within [`ANGLE_SUM_TOLERANCE`].
pub fn validate_traverse_angles(points: &[Point2D]) -> Result<AngleValidation> {
    let angles = calculate_interior_angles(points)?;
    let actual_sum: f64 = angles.iter().sum();
    let theoretical_sum = (angles.len() as f64 - 2.0) * 180.0;
    let difference = (actual_sum - theoretical_sum).abs();

    Ok(AngleValidation {
        angles,
        actual_sum,
        theoretical_sum,
        difference,
        is_valid: difference <= ANGLE_SUM_TOLERANCE,
    })
}

/// Compare a closure against a required ratio (0.0001 is 1:10,000).
pub fn assess_accuracy(closure: &TraverseClosure, required_ratio: f64) -> AccuracyAssessment {
    let required_n = 1.0 / required_ratio;
    let meets_standard = closure.closure_error_ratio <= required_ratio;

    let message = match closure.precision_ratio {
        None => format!("Traverse closes exactly; meets the 1:{:.0} standard", required_n),
        Some(n) if meets_standard => {
            format!("Traverse precision 1:{:.0} meets the 1:{:.0} standard", n, required_n)
        }
        Some(n) => format!(
            "Traverse precision 1:{:.0} does not meet the 1:{:.0} standard",
            n, required_n
        ),
    };

    AccuracyAssessment {
        meets_standard,
        actual_ratio: closure.precision_ratio,
        required_ratio: required_n,
        message,
    }
}

fn strip_closing_point(points: &[Point2D]) -> &[Point2D] {
    match points {
        [first, .., last] if points.len() > 3 && first.coords() == last.coords() => {
            &points[..points.len() - 1]
        }
        _ => points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use surveykit_core::models::DEFAULT_CLOSURE_TOLERANCE;

    fn square() -> Vec<Point2D> {
        vec![
            Point2D::new(300000.0, 8000000.0),
            Point2D::new(301000.0, 8000000.0),
            Point2D::new(301000.0, 8001000.0),
            Point2D::new(300000.0, 8001000.0),
            Point2D::new(300000.0, 8000000.0),
        ]
    }

    fn bearing_gap(a: f64, b: f64) -> f64 {
        let d = (a - b).abs() % 360.0;
        d.min(360.0 - d)
    }

    #[test]
    fn test_bearing_distance_cardinal_directions() {
        let origin = Point2D::new(0.0, 0.0);
        let east = bearing_distance(&origin, &Point2D::new(10.0, 0.0), DistanceUnit::Meters);
        assert!((east.bearing - 90.0).abs() < 1e-12);
        assert!((east.distance - 10.0).abs() < 1e-12);

        let south = bearing_distance(&origin, &Point2D::new(0.0, -5.0), DistanceUnit::Meters);
        assert!((south.bearing - 180.0).abs() < 1e-12);

        let west = bearing_distance(&origin, &Point2D::new(-1.0, 0.0), DistanceUnit::Meters);
        assert!((west.bearing - 270.0).abs() < 1e-12);
    }

    #[test]
    fn test_bearing_distance_in_feet() {
        let bd = bearing_distance(
            &Point2D::new(0.0, 0.0),
            &Point2D::new(0.0, 0.3048),
            DistanceUnit::Feet,
        );
        assert!((bd.distance - 1.0).abs() < 1e-9);
        assert_eq!(bd.bearing, 0.0);
    }

    #[test]
    fn test_calculate_coordinates_rounds_to_projected_precision() {
        let p = calculate_coordinates(&Point2D::new(0.0, 0.0), 45.0, 100.0);
        assert_eq!(p.x, 70.7107);
        assert_eq!(p.y, 70.7107);
    }

    #[test]
    fn test_square_closure_is_exact() {
        let closure = compute_closure(&square(), DEFAULT_CLOSURE_TOLERANCE).unwrap();
        assert!(closure.is_closed);
        assert!(closure.closure_error.abs() < 1e-9);
        assert!(closure.is_within_tolerance);
        assert_eq!(closure.total_distance, 4000.0);
        assert_eq!(closure.tolerance, DEFAULT_CLOSURE_TOLERANCE);
        assert!(closure.precision_ratio.is_none());
    }

    #[test]
    fn test_closure_with_small_misclose() {
        let mut points = square();
        // Last point 0.2 m east of the start; the loop is open
        points[4] = Point2D::new(300000.2, 8000000.0);
        let closure = compute_closure(&points, DEFAULT_CLOSURE_TOLERANCE).unwrap();

        assert!(!closure.is_closed);
        assert!((closure.closure_distance - 0.2).abs() < 1e-6);
        assert!((closure.closure_bearing - 90.0).abs() < 1e-6);
        assert!((closure.misclosure_departure - 0.2).abs() < 1e-6);
        assert!(closure.is_within_tolerance);
        let n = closure.precision_ratio.unwrap();
        assert!(n > 10000.0);
    }

    #[test]
    fn test_closure_outside_tolerance() {
        let mut points = square();
        points[4] = Point2D::new(300005.0, 8000000.0);
        let closure = compute_closure(&points, DEFAULT_CLOSURE_TOLERANCE).unwrap();
        assert!(!closure.is_within_tolerance);

        let assessment = assess_accuracy(&closure, DEFAULT_CLOSURE_TOLERANCE);
        assert!(!assessment.meets_standard);
        assert!((assessment.required_ratio - 10000.0).abs() < 1e-6);
        assert!(assessment.message.contains("does not meet the 1:10000 standard"));
    }

    #[test]
    fn test_closure_requires_three_points() {
        let err = compute_closure(&square()[..2], DEFAULT_CLOSURE_TOLERANCE).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("points"));
    }

    #[test]
    fn test_closure_rejects_non_finite_point() {
        let mut points = square();
        points[2] = Point2D::new(f64::NAN, 0.0);
        let err = compute_closure(&points, DEFAULT_CLOSURE_TOLERANCE).unwrap_err();
        assert!(err.to_string().contains("points[2]"));
    }

    #[test]
    fn test_square_area_and_perimeter() {
        let area = compute_area(&square(), AreaUnit::SquareMeters).unwrap();
        assert_eq!(area.area, 1_000_000.0);
        assert_eq!(area.perimeter, 4000.0);

        let hectares = compute_area(&square(), AreaUnit::Hectares).unwrap();
        assert_eq!(hectares.area, 100.0);
        assert_eq!(hectares.unit, AreaUnit::Hectares);
    }

    #[test]
    fn test_area_closes_open_ring() {
        let triangle = vec![Point2D::new(0.0, 0.0), Point2D::new(4.0, 0.0), Point2D::new(0.0, 3.0)];
        let area = compute_area(&triangle, AreaUnit::SquareMeters).unwrap();
        assert_eq!(area.area, 6.0);
        assert_eq!(area.perimeter, 12.0);
    }

    #[test]
    fn test_area_is_orientation_independent() {
        let mut reversed = square();
        reversed.reverse();
        let area = compute_area(&reversed, AreaUnit::SquareMeters).unwrap();
        assert_eq!(area.area, 1_000_000.0);
    }

    #[test]
    fn test_square_interior_angles() {
        let angles = calculate_interior_angles(&square()).unwrap();
        assert_eq!(angles.len(), 4);
        for angle in &angles {
            assert!((angle - 90.0).abs() < 1e-9);
        }

        let validation = validate_traverse_angles(&square()).unwrap();
        assert!(validation.is_valid);
        assert_eq!(validation.theoretical_sum, 360.0);
        assert!((validation.actual_sum - 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_traverse_from_legs_closes_square() {
        let legs = vec![
            TraverseLeg::new(1000.0, 90.0),
            TraverseLeg::new(1000.0, 0.0),
            TraverseLeg::new(1000.0, 270.0),
            TraverseLeg::new(1000.0, 180.0),
        ];
        let points = traverse_from_legs(&Point2D::new(300000.0, 8000000.0), &legs).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[2].coords(), [301000.0, 8001000.0]);

        let closure = compute_closure(&points, DEFAULT_CLOSURE_TOLERANCE).unwrap();
        assert!(closure.is_closed);
        assert!(closure.is_within_tolerance);
    }

    #[test]
    fn test_traverse_from_feet_legs() {
        let legs = vec![TraverseLeg::in_feet(100.0, 0.0)];
        let points = traverse_from_legs(&Point2D::new(0.0, 0.0), &legs).unwrap();
        assert_eq!(points[1].y, 30.48);
    }

    #[test]
    fn test_traverse_from_legs_rejects_negative_distance() {
        let legs = vec![TraverseLeg::new(-1.0, 0.0)];
        let err = traverse_from_legs(&Point2D::new(0.0, 0.0), &legs).unwrap_err();
        assert!(err.to_string().contains("legs[0].distance"));
    }

    #[test]
    fn test_perfect_closure_assessment() {
        let closure = compute_closure(&square(), DEFAULT_CLOSURE_TOLERANCE).unwrap();
        let assessment = assess_accuracy(&closure, DEFAULT_CLOSURE_TOLERANCE);
        assert!(assessment.meets_standard);
        assert!(assessment.actual_ratio.is_none());
        assert!(assessment.message.contains("closes exactly"));
    }

    proptest! {
        #[test]
        fn prop_bearing_distance_round_trip(
            x in 100_000.0f64..900_000.0,
            y in 0.0f64..10_000_000.0,
            bearing in 0.0f64..360.0,
            distance in 1.0f64..10_000.0,
        ) {
            let from = Point2D::new(round_projected(x), round_projected(y));
            let to = calculate_coordinates(&from, bearing, distance);
            let back = bearing_distance(&from, &to, DistanceUnit::Meters);

            prop_assert!((back.distance - distance).abs() < 1e-4);
            prop_assert!(bearing_gap(back.bearing, bearing) < 0.01);
            prop_assert!((0.0..360.0).contains(&back.bearing));
        }

        #[test]
        fn prop_regular_polygon_angle_sum(
            n in 3usize..40,
            radius in 10.0f64..5_000.0,
            cx in 200_000.0f64..800_000.0,
            cy in 1_000_000.0f64..9_000_000.0,
        ) {
            let points: Vec<Point2D> = (0..n)
                .map(|k| {
                    let theta = 2.0 * std::f64::consts::PI * k as f64 / n as f64;
                    Point2D::new(cx + radius * theta.sin(), cy + radius * theta.cos())
                })
                .collect();

            let validation = validate_traverse_angles(&points).unwrap();
            prop_assert!(validation.is_valid);
            prop_assert!((validation.actual_sum - (n as f64 - 2.0) * 180.0).abs() < 0.01);
        }
    }
}
