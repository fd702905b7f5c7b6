//! Validate command implementation

use std::sync::Arc;

use crate::cli::{EngineBackend, ValidateArgs};
use crate::input::read_scheme;
use crate::output::OutputWriter;
use anyhow::{bail, Context, Result};
use surveykit_core::config::LayeredConfig;
use surveykit_core::models::TopologyValidationReport;
use surveykit_topology::{
    BoundingBoxEngine, GeometryEngine, PostgisConfig, PostgisEngine, TopologyValidator,
};
use tabled::Tabled;

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Geometries")]
    geometries: String,
    #[tabled(rename = "Area (m²)")]
    area: String,
    #[tabled(rename = "Description")]
    description: String,
}

async fn engine_for(backend: EngineBackend) -> Result<Arc<dyn GeometryEngine>> {
    let engine: Arc<dyn GeometryEngine> = match backend {
        EngineBackend::Local => Arc::new(BoundingBoxEngine::new()),
        EngineBackend::Postgis => {
            let config = PostgisConfig::from_env()
                .context("The PostGIS engine reads its connection from DATABASE_URL")?;
            Arc::new(PostgisEngine::connect(config).await?)
        }
    };
    Ok(engine)
}

pub async fn execute(args: ValidateArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let (parent, sections) = read_scheme(&args.file, config.default_srid.value)?;

    let validator = TopologyValidator::new(engine_for(args.engine).await?);

    let mut options = config.topology_options();
    options.check_gaps = !args.no_gaps;
    options.check_geometry = !args.no_geometry;

    let report = validator.validate_topology(&sections, &parent, &options).await?;

    if output.is_json() {
        output.result(&report)?;
    } else {
        print_report(&report, validator.engine_name(), output);
    }

    if !report.is_valid {
        bail!("Topology validation failed with {} error(s)", report.errors.len());
    }

    Ok(())
}

fn print_report(report: &TopologyValidationReport, engine: &str, output: &OutputWriter) {
    output.section("Topology Validation");
    output.kv("Engine", engine);
    output.kv("Sections", report.summary.total_sections);
    output.kv("Errors", report.errors.len());
    output.kv("Warnings", report.summary.warning_count);

    output.section("Findings");
    if report.errors.is_empty() && report.warnings.is_empty() {
        output.info("No topology findings");
    } else {
        output.table(
            report
                .errors
                .iter()
                .chain(&report.warnings)
                .map(|finding| FindingRow {
                    severity: finding.severity.as_str().to_string(),
                    kind: finding.error_type.as_str().to_string(),
                    geometries: finding.geometry_ids.join(", "),
                    area: finding.area.map(|a| format!("{:.2}", a)).unwrap_or_default(),
                    description: finding.description.clone(),
                })
                .collect(),
        );
    }

    if !report.summary.degraded_operations.is_empty() {
        output.warning(format!(
            "Fell back to the local engine for: {}",
            report.summary.degraded_operations.join(", ")
        ));
    }

    println!();
    if report.is_valid {
        output.success("Scheme is topologically valid");
    } else {
        output.error("Scheme has topology errors");
    }
}
