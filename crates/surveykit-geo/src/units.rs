//! Angle and distance unit conversion, bearing normalization, rounding.

use surveykit_core::models::{AngleUnit, DistanceUnit};

/// Meters per international foot
pub const METERS_PER_FOOT: f64 = 0.3048;

/// Decimal places kept on projected (metric) coordinates, ~0.1 mm
pub const PROJECTED_DECIMALS: i32 = 4;

/// Decimal places kept on geographic coordinates, ~10 cm
pub const GEOGRAPHIC_DECIMALS: i32 = 6;

/// Convert an angle expressed in `unit` to decimal degrees
pub fn to_degrees(value: f64, unit: AngleUnit) -> f64 {
    match unit {
        AngleUnit::Degrees => value,
        AngleUnit::Gradians => value * 0.9,
        AngleUnit::Radians => value.to_degrees(),
    }
}

/// Convert decimal degrees to `unit`
pub fn from_degrees(degrees: f64, unit: AngleUnit) -> f64 {
    match unit {
        AngleUnit::Degrees => degrees,
        AngleUnit::Gradians => degrees / 0.9,
        AngleUnit::Radians => degrees.to_radians(),
    }
}

/// Convert a distance between meters and feet
pub fn convert_distance(value: f64, from: DistanceUnit, to: DistanceUnit) -> f64 {
    match (from, to) {
        (DistanceUnit::Meters, DistanceUnit::Feet) => value / METERS_PER_FOOT,
        (DistanceUnit::Feet, DistanceUnit::Meters) => value * METERS_PER_FOOT,
        _ => value,
    }
}

/// Wrap a bearing into [0, 360)
pub fn normalize_bearing(bearing: f64) -> f64 {
    let wrapped = bearing.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round_projected(value: f64) -> f64 {
    round_to(value, PROJECTED_DECIMALS)
}

pub fn round_geographic(value: f64) -> f64 {
    round_to(value, GEOGRAPHIC_DECIMALS)
}

/// Render a bearing as degrees, minutes and seconds, e.g. `045°30'15.0"`
pub fn format_bearing_dms(bearing: f64) -> String {
    let bearing = normalize_bearing(bearing);
    let mut degrees = bearing.trunc();
    let minutes_full = (bearing - degrees) * 60.0;
    let mut minutes = minutes_full.trunc();
    let mut seconds = round_to((minutes_full - minutes) * 60.0, 1);

    if seconds >= 60.0 {
        seconds -= 60.0;
        minutes += 1.0;
    }
    if minutes >= 60.0 {
        minutes -= 60.0;
        degrees += 1.0;
    }
    if degrees >= 360.0 {
        degrees -= 360.0;
    }

    format!("{:03}°{:02}'{:04.1}\"", degrees as u32, minutes as u32, seconds)
}
