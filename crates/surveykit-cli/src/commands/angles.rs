//! Angles command implementation

use crate::cli::PointsInput;
use crate::input::read_points;
use crate::output::OutputWriter;
use anyhow::Result;
use surveykit_geo::{format_bearing_dms, validate_traverse_angles};
use tabled::Tabled;

#[derive(Tabled)]
struct AngleRow {
    #[tabled(rename = "Vertex")]
    vertex: String,
    #[tabled(rename = "Angle (°)")]
    degrees: String,
    #[tabled(rename = "DMS")]
    dms: String,
}

pub fn execute(args: PointsInput, output: &OutputWriter) -> Result<()> {
    let points = read_points(&args.file)?;
    let validation = validate_traverse_angles(&points)?;

    if output.is_json() {
        return output.result(&validation);
    }

    output.section("Interior Angles");
    let rows: Vec<AngleRow> = validation
        .angles
        .iter()
        .zip(&points)
        .enumerate()
        .map(|(i, (angle, point))| AngleRow {
            vertex: point.id.clone().unwrap_or_else(|| (i + 1).to_string()),
            degrees: format!("{:.6}", angle),
            dms: format_bearing_dms(*angle),
        })
        .collect();
    output.table(rows);

    output.kv("Sum", format!("{:.6}°", validation.actual_sum));
    output.kv("Expected", format!("{:.0}°", validation.theoretical_sum));
    output.kv("Difference", format!("{:.6}°", validation.difference));
    println!();

    if validation.is_valid {
        output.success("Angle sum is within tolerance");
    } else {
        output.warning("Angle sum differs from (n-2)·180° by more than 0.01°");
    }

    Ok(())
}
