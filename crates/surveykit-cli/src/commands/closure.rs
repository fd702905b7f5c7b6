//! Closure command implementation

use crate::cli::ClosureArgs;
use crate::input::{parse_start, read_legs, read_points};
use crate::output::OutputWriter;
use crate::output_types::ClosureOutput;
use anyhow::Result;
use surveykit_core::config::LayeredConfig;
use surveykit_geo::{assess_accuracy, compute_closure, format_bearing_dms, traverse_from_legs};

pub fn execute(args: ClosureArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let points = match &args.start {
        Some(start) => traverse_from_legs(&parse_start(start)?, &read_legs(&args.file)?)?,
        None => read_points(&args.file)?,
    };

    let tolerance = config.closure_tolerance.value;
    let closure = compute_closure(&points, tolerance)?;
    let accuracy = assess_accuracy(&closure, tolerance);

    if output.is_json() {
        return output.result(ClosureOutput { point_count: points.len(), closure, accuracy });
    }

    output.section("Traverse Closure");
    output.kv("Points", points.len());
    output.kv("Total distance", format!("{:.4} m", closure.total_distance));
    output.kv("Loop", if closure.is_closed { "closed" } else { "open" });
    output.kv("Misclosure", format!("{:.4} m", closure.closure_distance));
    output.kv("Misclosure bearing", format_bearing_dms(closure.closure_bearing));
    output.kv(
        "Latitude / departure",
        format!("{:+.4} m / {:+.4} m", closure.misclosure_latitude, closure.misclosure_departure),
    );
    output.kv(
        "Precision",
        closure.precision_ratio.map_or("exact".to_string(), |n| format!("1:{:.0}", n)),
    );
    println!();

    if accuracy.meets_standard {
        output.success(&accuracy.message);
    } else {
        output.warning(&accuracy.message);
    }

    Ok(())
}
