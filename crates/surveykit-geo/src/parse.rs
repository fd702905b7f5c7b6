//! Parsers for field coordinate input: decimal degrees, DMS, UTM and CSV.
//!
//! Geographic results use `x = longitude`, `y = latitude`.

use std::sync::OnceLock;

use regex::Regex;
use surveykit_core::error::{Result, SurveyError};
use surveykit_core::models::Point2D;

use crate::units::{round_geographic, round_projected};

/// Valid UTM easting envelope for any zone
pub const UTM_EASTING_RANGE: (f64, f64) = (160_000.0, 840_000.0);

/// Valid UTM northing envelope (southern hemisphere uses a 10,000 km false northing)
pub const UTM_NORTHING_RANGE: (f64, f64) = (0.0, 10_000_000.0);

/// Reject latitudes outside [-90, 90]
pub fn check_latitude(latitude: f64) -> Result<f64> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(SurveyError::validation(
            "latitude",
            latitude,
            "must be between -90 and 90 degrees",
        ));
    }
    Ok(latitude)
}

/// Reject longitudes outside [-180, 180]
pub fn check_longitude(longitude: f64) -> Result<f64> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(SurveyError::validation(
            "longitude",
            longitude,
            "must be between -180 and 180 degrees",
        ));
    }
    Ok(longitude)
}

/// Validate decimal-degree input and round to 6 decimals
pub fn parse_decimal_coordinates(latitude: f64, longitude: f64) -> Result<Point2D> {
    let lat = check_latitude(latitude)?;
    let lon = check_longitude(longitude)?;
    Ok(Point2D::new(round_geographic(lon), round_geographic(lat)))
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern is valid"))
}

fn dms_charset() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^[\s0-9.+\-°º'′"″:NSEWnsew]+$"#).expect("charset pattern is valid")
    })
}

/// Parse one degrees-minutes-seconds value into signed decimal degrees.
///
/// Accepts `25°44'46.2"S`, `S 25 44 46.2`, `-25:44:46.2` and `28°11.33'E`.
/// Returns the value and the hemisphere letter, if one was given.
pub fn parse_dms(input: &str) -> Result<(f64, Option<char>)> {
    let fail = |reason: &str| SurveyError::validation("dms", input, reason);

    let trimmed = input.trim();
    if trimmed.is_empty() || !dms_charset().is_match(trimmed) {
        return Err(fail("expected degrees, minutes and seconds such as 25°44'46.2\"S"));
    }

    let hemispheres: Vec<char> = trimmed
        .chars()
        .filter(|c| matches!(c.to_ascii_uppercase(), 'N' | 'S' | 'E' | 'W'))
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if hemispheres.len() > 1 {
        return Err(fail("more than one hemisphere letter"));
    }
    let hemisphere = hemispheres.first().copied();

    let residue = number_pattern().replace_all(trimmed, " ");
    if residue.contains(|c: char| c == '.' || c.is_ascii_digit()) {
        return Err(fail("malformed number"));
    }

    let parts: Vec<f64> = number_pattern()
        .find_iter(trimmed)
        .map(|m| m.as_str().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| fail("unreadable number"))?;

    let (degrees, minutes, seconds) = match parts.as_slice() {
        [d] => (*d, 0.0, 0.0),
        [d, m] => (*d, *m, 0.0),
        [d, m, s] => (*d, *m, *s),
        _ => return Err(fail("expected one to three numeric components")),
    };

    if minutes >= 60.0 {
        return Err(fail("minutes must be less than 60"));
    }
    if seconds >= 60.0 {
        return Err(fail("seconds must be less than 60"));
    }

    let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;
    let negative = trimmed.starts_with('-') || matches!(hemisphere, Some('S') | Some('W'));

    Ok((if negative { -magnitude } else { magnitude }, hemisphere))
}

/// Parse a DMS latitude/longitude pair into a geographic point
pub fn parse_dms_coordinates(latitude: &str, longitude: &str) -> Result<Point2D> {
    let (lat, lat_hemisphere) = parse_dms(latitude)?;
    if matches!(lat_hemisphere, Some('E') | Some('W')) {
        return Err(SurveyError::validation(
            "latitude",
            latitude,
            "latitude hemisphere must be N or S",
        ));
    }

    let (lon, lon_hemisphere) = parse_dms(longitude)?;
    if matches!(lon_hemisphere, Some('N') | Some('S')) {
        return Err(SurveyError::validation(
            "longitude",
            longitude,
            "longitude hemisphere must be E or W",
        ));
    }

    parse_decimal_coordinates(lat, lon)
}

/// Validate UTM easting/northing against the zone envelope and round to 4 decimals
pub fn parse_utm_coordinates(easting: f64, northing: f64, zone: u8, south: bool) -> Result<Point2D> {
    if !(1..=60).contains(&zone) {
        return Err(SurveyError::validation("zone", zone, "UTM zone must be between 1 and 60"));
    }

    let (min_e, max_e) = UTM_EASTING_RANGE;
    if !easting.is_finite() || !(min_e..=max_e).contains(&easting) {
        return Err(SurveyError::validation(
            "easting",
            easting,
            format!(
                "must be between {} and {} for UTM zone {}",
                min_e,
                max_e,
                zone_label(zone, south)
            ),
        ));
    }

    let (min_n, max_n) = UTM_NORTHING_RANGE;
    if !northing.is_finite() || !(min_n..=max_n).contains(&northing) {
        return Err(SurveyError::validation(
            "northing",
            northing,
            format!(
                "must be between {} and {} for UTM zone {}",
                min_n,
                max_n,
                zone_label(zone, south)
            ),
        ));
    }

    Ok(Point2D::new(round_projected(easting), round_projected(northing)))
}

/// EPSG code of a WGS 84 UTM zone
pub fn utm_srid(zone: u8, south: bool) -> u32 {
    if south {
        32700 + u32::from(zone)
    } else {
        32600 + u32::from(zone)
    }
}

fn zone_label(zone: u8, south: bool) -> String {
    format!("{}{}", zone, if south { 'S' } else { 'N' })
}

const ID_HEADERS: &[&str] = &["id", "point", "name", "beacon"];
const X_HEADERS: &[&str] = &["x", "easting", "e", "lon", "longitude", "lng"];
const Y_HEADERS: &[&str] = &["y", "northing", "n", "lat", "latitude"];

/// Column layout of a coordinate CSV
#[derive(Debug, Clone, Copy, PartialEq)]
struct CsvLayout {
    id: Option<usize>,
    x: usize,
    y: usize,
}

impl CsvLayout {
    fn from_headers(headers: &csv::StringRecord) -> Option<Self> {
        let find = |names: &[&str]| {
            headers.iter().position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };
        Some(Self { id: find(ID_HEADERS), x: find(X_HEADERS)?, y: find(Y_HEADERS)? })
    }

    fn positional(width: usize) -> Self {
        if width >= 3 {
            Self { id: Some(0), x: 1, y: 2 }
        } else {
            Self { id: None, x: 0, y: 1 }
        }
    }
}

/// Parse planar coordinates from CSV text.
///
/// A header row naming x/easting and y/northing columns (and optionally an id)
/// is honoured; without one, rows are read as `x,y` or `id,x,y`. Blank lines
/// and lines starting with `#` are skipped.
pub fn parse_coordinates_from_csv(text: &str) -> Result<Vec<Point2D>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());

    let mut layout: Option<CsvLayout> = None;
    let mut points = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            SurveyError::validation("csv", format!("record {}", line + 1), e.to_string())
        })?;

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let current = match layout {
            Some(layout) => layout,
            None => {
                let looks_numeric = record.iter().any(|f| f.parse::<f64>().is_ok());
                if !looks_numeric {
                    let header_layout = CsvLayout::from_headers(&record).ok_or_else(|| {
                        SurveyError::validation(
                            "csv",
                            record.iter().collect::<Vec<_>>().join(","),
                            "header must name x/easting and y/northing columns",
                        )
                    })?;
                    layout = Some(header_layout);
                    continue;
                }
                let positional = CsvLayout::positional(record.len());
                layout = Some(positional);
                positional
            }
        };

        points.push(read_csv_point(&record, current)?);
    }

    tracing::debug!(count = points.len(), "Parsed coordinates from CSV");
    Ok(points)
}

fn read_csv_point(record: &csv::StringRecord, layout: CsvLayout) -> Result<Point2D> {
    let raw_row = || record.iter().collect::<Vec<_>>().join(",");

    let number = |index: usize, field: &str| -> Result<f64> {
        let raw = record
            .get(index)
            .ok_or_else(|| SurveyError::validation(field, raw_row(), "column is missing"))?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| SurveyError::validation(field, raw, "expected a finite number"))
    };

    let x = number(layout.x, "x")?;
    let y = number(layout.y, "y")?;
    let id = layout
        .id
        .and_then(|i| record.get(i))
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(Point2D { x, y, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_coordinates_are_rounded() {
        let p = parse_decimal_coordinates(-25.74612345, 28.18812345).unwrap();
        assert_eq!(p.x, 28.188123);
        assert_eq!(p.y, -25.746123);
    }

    #[test]
    fn test_invalid_latitude_names_field() {
        let err = parse_decimal_coordinates(95.0, 28.0).unwrap_err();
        match err {
            SurveyError::Validation { field, value, .. } => {
                assert_eq!(field, "latitude");
                assert_eq!(value, "95");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_invalid_longitude() {
        let err = parse_decimal_coordinates(0.0, -181.0).unwrap_err();
        assert!(err.to_string().contains("longitude"));
    }

    #[test]
    fn test_parse_dms_forms() {
        let (v, h) = parse_dms("25°44'46.2\"S").unwrap();
        assert!((v - -25.746166666).abs() < 1e-8);
        assert_eq!(h, Some('S'));

        let (v, _) = parse_dms("S 25 44 46.2").unwrap();
        assert!((v - -25.746166666).abs() < 1e-8);

        let (v, h) = parse_dms("-25:44:46.2").unwrap();
        assert!((v - -25.746166666).abs() < 1e-8);
        assert_eq!(h, None);

        let (v, _) = parse_dms("28°11.5'E").unwrap();
        assert!((v - 28.191666666).abs() < 1e-8);
    }

    #[test]
    fn test_parse_dms_rejects_garbage_with_raw_input() {
        let err = parse_dms("twenty five degrees").unwrap_err();
        assert!(err.to_string().contains("twenty five degrees"));

        assert!(parse_dms("25°75'00\"S").is_err());
        assert!(parse_dms("25 10 10 10").is_err());
        assert!(parse_dms("25°N S").is_err());
    }

    #[test]
    fn test_parse_dms_rejects_stray_decimal_points() {
        for raw in ["25.5.5", "1.2.3.4", "25..5", "25°44'.S"] {
            let err = parse_dms(raw).unwrap_err();
            assert!(err.is_validation(), "{raw} should be rejected");
            assert!(err.to_string().contains(raw));
        }
    }

    #[test]
    fn test_dms_coordinates() {
        let p = parse_dms_coordinates("25°44'46.2\"S", "28°11'19.8\"E").unwrap();
        assert_eq!(p.y, -25.746167);
        assert_eq!(p.x, 28.188833);
    }

    #[test]
    fn test_dms_coordinates_reject_swapped_hemispheres() {
        let err = parse_dms_coordinates("28°11'19.8\"E", "25°44'46.2\"S").unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn test_utm_envelope() {
        let p = parse_utm_coordinates(300000.123456, 8000000.0, 35, true).unwrap();
        assert_eq!(p.x, 300000.1235);

        let err = parse_utm_coordinates(100000.0, 8000000.0, 35, true).unwrap_err();
        match err {
            SurveyError::Validation { field, .. } => assert_eq!(field, "easting"),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err_field(parse_utm_coordinates(500000.0, -1.0, 35, true)) == "northing");
        assert!(err_field(parse_utm_coordinates(500000.0, 1.0, 61, true)) == "zone");
    }

    fn err_field(result: Result<Point2D>) -> String {
        match result {
            Err(SurveyError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_utm_srid() {
        assert_eq!(utm_srid(35, true), 32735);
        assert_eq!(utm_srid(35, false), 32635);
    }

    #[test]
    fn test_csv_with_headers() {
        let text = "id,easting,northing\nB1,300000,8000000\nB2,301000.5,8000000\n";
        let points = parse_coordinates_from_csv(text).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], Point2D::with_id(301000.5, 8000000.0, "B2"));
    }

    #[test]
    fn test_csv_header_order_is_respected() {
        let text = "northing;easting\n";
        assert!(parse_coordinates_from_csv(text).is_err());

        let text = "y,x\n8000000,300000\n";
        let points = parse_coordinates_from_csv(text).unwrap();
        assert_eq!(points[0].x, 300000.0);
        assert_eq!(points[0].y, 8000000.0);
    }

    #[test]
    fn test_csv_positional_rows() {
        let text = "# traverse\n300000,8000000\n\n301000,8000000\n";
        let points = parse_coordinates_from_csv(text).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, None);

        let text = "A,1,2\nB,3,4\n";
        let points = parse_coordinates_from_csv(text).unwrap();
        assert_eq!(points[1].id.as_deref(), Some("B"));
        assert_eq!(points[1].x, 3.0);
    }

    #[test]
    fn test_csv_bad_number_names_column() {
        let err = parse_coordinates_from_csv("x,y\n1,abc\n").unwrap_err();
        match err {
            SurveyError::Validation { field, value, .. } => {
                assert_eq!(field, "y");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
