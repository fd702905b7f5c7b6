//! Area command implementation

use crate::cli::AreaArgs;
use crate::input::read_points;
use crate::output::OutputWriter;
use anyhow::Result;
use surveykit_core::config::LayeredConfig;
use surveykit_geo::compute_area;

pub fn execute(args: AreaArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let points = read_points(&args.file)?;
    let result = compute_area(&points, config.area_unit.value)?;

    if output.is_json() {
        return output.result(&result);
    }

    output.section("Parcel Area");
    output.kv("Vertices", points.len());
    output.kv("Area", format!("{:.4} {}", result.area, result.unit.symbol()));
    output.kv("Perimeter", format!("{:.4} m", result.perimeter));

    Ok(())
}
