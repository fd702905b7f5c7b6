use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// SurveyKit - Survey computations and topology validation
#[derive(Parser, Debug)]
#[command(name = "surveykit")]
#[command(about = "Traverse closure, area, CRS conversion and parcel topology checks", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./surveykit.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Default SRID for inputs that carry none
    #[arg(long, global = true, value_name = "SRID")]
    pub srid: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Closure analysis of a traverse
    Closure(ClosureArgs),

    /// Area and perimeter of a parcel boundary
    Area(AreaArgs),

    /// Interior angles of a closed figure
    Angles(PointsInput),

    /// Adjust a network of observed legs
    Adjust(AdjustArgs),

    /// Parse and reproject coordinates or geometries
    Convert(ConvertArgs),

    /// Validate sections of a scheme against the parent parcel
    Validate(ValidateArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

/// Point list read from a CSV or JSON file
#[derive(Args, Debug)]
pub struct PointsInput {
    /// CSV (x,y or id,x,y) or JSON array of points
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ClosureArgs {
    /// CSV or JSON point file; with --start, a JSON array of legs
    pub file: PathBuf,

    /// Start coordinate "x,y"; treats FILE as traverse legs
    #[arg(long, value_name = "X,Y")]
    pub start: Option<String>,

    /// Closure tolerance as a ratio, e.g. 0.0001 for 1:10,000
    #[arg(long)]
    pub tolerance: Option<f64>,
}

#[derive(Args, Debug)]
pub struct AreaArgs {
    /// CSV or JSON point file
    pub file: PathBuf,

    /// Area unit (square_meters, square_feet, hectares, acres)
    #[arg(long)]
    pub unit: Option<String>,
}

#[derive(Args, Debug)]
pub struct AdjustArgs {
    /// JSON file with "points" and "observations"
    pub file: PathBuf,

    /// Number of relaxation passes
    #[arg(long)]
    pub iterations: Option<usize>,
}

/// How convert input values are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoordinateFormat {
    /// Decimal degrees: LATITUDE LONGITUDE
    Decimal,
    /// Degrees-minutes-seconds: LATITUDE LONGITUDE
    Dms,
    /// UTM: EASTING NORTHING (with --zone)
    Utm,
    /// A WKT or EWKT geometry
    Wkt,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input values, interpreted according to --format
    #[arg(required = true, num_args = 1..=2, allow_hyphen_values = true)]
    pub values: Vec<String>,

    /// Input format
    #[arg(long, value_enum, default_value = "decimal")]
    pub format: CoordinateFormat,

    /// Target SRID (defaults to the configured default SRID)
    #[arg(long)]
    pub to: Option<u32>,

    /// UTM zone for --format utm
    #[arg(long, default_value = "35")]
    pub zone: u8,

    /// UTM northern hemisphere (southern is assumed)
    #[arg(long)]
    pub north: bool,
}

/// Geometry engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineBackend {
    /// In-process bounding-box and polygon engine
    Local,
    /// PostGIS database from DATABASE_URL
    Postgis,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON scheme file with "parent" and "sections"
    pub file: PathBuf,

    /// Geometry engine to evaluate predicates with
    #[arg(long, value_enum, default_value = "local")]
    pub engine: EngineBackend,

    /// Report sections touching the parent boundary as errors
    #[arg(long)]
    pub strict_boundary: bool,

    /// Smallest gap to report, in square meters
    #[arg(long)]
    pub min_gap_area: Option<f64>,

    /// Overlap area below which sections count as touching, in square meters
    #[arg(long)]
    pub overlap_tolerance: Option<f64>,

    /// Skip the gap check
    #[arg(long)]
    pub no_gaps: bool,

    /// Skip the geometry validity check
    #[arg(long)]
    pub no_geometry: bool,
}
