//! Adjust command implementation

use crate::cli::AdjustArgs;
use crate::input::read_adjustment;
use crate::output::OutputWriter;
use anyhow::Result;
use surveykit_core::config::LayeredConfig;
use surveykit_geo::least_squares_adjustment;
use tabled::Tabled;

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "Point")]
    id: String,
    #[tabled(rename = "X")]
    x: String,
    #[tabled(rename = "Y")]
    y: String,
}

#[derive(Tabled)]
struct ResidualRow {
    #[tabled(rename = "Leg")]
    leg: String,
    #[tabled(rename = "Before (m)")]
    before: String,
    #[tabled(rename = "After (m)")]
    after: String,
}

pub fn execute(args: AdjustArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let input = read_adjustment(&args.file)?;
    let iterations = config.adjustment_iterations.value;
    let result = least_squares_adjustment(&input.points, &input.observations, iterations)?;

    if output.is_json() {
        return output.result(&result);
    }

    output.section(format!("Adjusted Points ({} passes)", result.iterations));
    output.table(
        result
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| PointRow {
                id: p.id.clone().unwrap_or_else(|| format!("#{}", i + 1)),
                x: format!("{:.4}", p.x),
                y: format!("{:.4}", p.y),
            })
            .collect(),
    );

    output.section("Residuals");
    output.table(
        result
            .residuals_before
            .iter()
            .zip(&result.residuals_after)
            .map(|(before, after)| ResidualRow {
                leg: format!("{} → {}", before.from, before.to),
                before: format!("{:.4}", before.magnitude),
                after: format!("{:.4}", after.magnitude),
            })
            .collect(),
    );

    Ok(())
}
