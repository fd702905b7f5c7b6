//! Convert command implementation

use crate::cli::{ConvertArgs, CoordinateFormat};
use crate::output::OutputWriter;
use crate::output_types::{ConvertGeometryOutput, ConvertPointOutput};
use anyhow::{bail, Context, Result};
use surveykit_core::config::LayeredConfig;
use surveykit_core::models::{Point2D, WGS84_SRID};
use surveykit_geo::parse::utm_srid;
use surveykit_geo::{
    geometry_to_ewkt, parse_decimal_coordinates, parse_dms_coordinates, parse_utm_coordinates,
    parse_wkt_geometry, reproject_geometry, transform_projection,
};

pub fn execute(args: ConvertArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let registry = surveykit_geo::init();
    let to_srid = args.to.unwrap_or(config.default_srid.value);

    if args.format == CoordinateFormat::Wkt {
        let [text] = args.values.as_slice() else {
            bail!("--format wkt takes a single geometry argument");
        };
        let geometry = parse_wkt_geometry(text, config.default_srid.value)?;
        let from_srid = geometry.srid();
        let converted = reproject_geometry(registry, &geometry, to_srid)?;
        let wkt = geometry_to_ewkt(&converted);

        if output.is_json() {
            return output.result(ConvertGeometryOutput { from_srid, to_srid, wkt });
        }
        output.kv(format!("EPSG:{} → EPSG:{}", from_srid, to_srid), wkt);
        return Ok(());
    }

    let (point, from_srid) = parse_point(&args)?;
    let (x, y) = transform_projection(registry, point.x, point.y, from_srid, to_srid)?;

    if output.is_json() {
        return output.result(ConvertPointOutput {
            from_srid,
            to_srid,
            input: point.coords(),
            output: [x, y],
        });
    }

    output.kv(format!("EPSG:{}", from_srid), format!("{}, {}", point.x, point.y));
    output.kv(format!("EPSG:{}", to_srid), format!("{}, {}", x, y));
    Ok(())
}

fn pair(values: &[String]) -> Result<(&str, &str)> {
    match values {
        [a, b] => Ok((a.as_str(), b.as_str())),
        _ => bail!("expected two values, got {}", values.len()),
    }
}

fn number(name: &str, value: &str) -> Result<f64> {
    value.trim().parse().with_context(|| format!("{} '{}' is not a number", name, value))
}

/// Parse the positional values into a point and the SRID it is expressed in
fn parse_point(args: &ConvertArgs) -> Result<(Point2D, u32)> {
    let (first, second) = pair(&args.values)?;
    Ok(match args.format {
        CoordinateFormat::Decimal => {
            let point = parse_decimal_coordinates(
                number("latitude", first)?,
                number("longitude", second)?,
            )?;
            (point, WGS84_SRID)
        }
        CoordinateFormat::Dms => (parse_dms_coordinates(first, second)?, WGS84_SRID),
        CoordinateFormat::Utm => {
            let south = !args.north;
            let point = parse_utm_coordinates(
                number("easting", first)?,
                number("northing", second)?,
                args.zone,
                south,
            )?;
            (point, utm_srid(args.zone, south))
        }
        CoordinateFormat::Wkt => bail!("--format wkt takes a geometry, not a coordinate pair"),
    })
}
