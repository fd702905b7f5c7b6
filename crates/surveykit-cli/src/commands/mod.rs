//! Command implementations

mod adjust;
mod angles;
mod area;
mod closure;
mod config;
mod convert;
mod validate;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use anyhow::Result;
use surveykit_core::config::{parse_area_unit, CliConfigOverrides};

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let overrides = overrides_for(&cli)?;
    let config = load_config(cli.config.as_deref(), overrides)?;

    match cli.command {
        Commands::Closure(args) => closure::execute(args, &config, &output),
        Commands::Area(args) => area::execute(args, &config, &output),
        Commands::Angles(args) => angles::execute(args, &output),
        Commands::Adjust(args) => adjust::execute(args, &config, &output),
        Commands::Convert(args) => convert::execute(args, &config, &output),
        Commands::Validate(args) => validate::execute(args, &config, &output).await,
        Commands::Config => config::execute(&config, &output),
    }
}

/// Command-line flags that override configured values
fn overrides_for(cli: &Cli) -> Result<CliConfigOverrides> {
    let mut overrides = CliConfigOverrides { default_srid: cli.srid, ..Default::default() };

    match &cli.command {
        Commands::Closure(args) => overrides.closure_tolerance = args.tolerance,
        Commands::Area(args) => {
            overrides.area_unit = args.unit.as_deref().map(parse_area_unit).transpose()?;
        }
        Commands::Adjust(args) => overrides.adjustment_iterations = args.iterations,
        Commands::Validate(args) => {
            overrides.min_gap_area = args.min_gap_area;
            overrides.overlap_tolerance = args.overlap_tolerance;
            if args.strict_boundary {
                overrides.allow_touching = Some(false);
            }
        }
        _ => {}
    }

    Ok(overrides)
}
