use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use chrono::NaiveDate;
use wapor_core::models::{BoundingBox, GeoPoint};
use wapor_core::products::{Product, Resolution};

/// WaPOR - client for the FAO WaPOR water productivity database
#[derive(Parser, Debug)]
#[command(name = "wapor")]
#[command(about = "Browse, query and download FAO WaPOR data", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./wapor.toml when present)
    #[arg(long, global = true, value_name = "PATH", env = "WAPOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// API key (WAPOR_API_KEY is read through the configuration layers)
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Base URL of the GIS Manager API
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Give up on a job after this many status requests
    #[arg(long, global = true, value_name = "N")]
    pub max_polls: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the cubes of a catalog partition
    Catalog(CatalogArgs),

    /// Resolve a cube and show its measure and dimensions
    Cube(CubeArgs),

    /// List rasters available for a cube in a time range
    Avail(AvailArgs),

    /// Crop and download every available raster of a cube
    Download(DownloadArgs),

    /// Pixel or area statistics over a time range
    Timeseries(TimeseriesArgs),

    /// List countries, basins and level-3 areas
    Locations(LocationsArgs),

    /// List catalog workspaces
    Workspaces,

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// WaPOR version (1 or 2)
    #[arg(long, default_value_t = 2)]
    pub version: u8,

    /// Resolution level (1, 2 or 3)
    #[arg(long)]
    pub level: Option<u8>,

    /// Only show cubes whose code or caption contains this text
    #[arg(long)]
    pub filter: Option<String>,
}

/// Where to look for a cube; without both values the catalog is searched
#[derive(Args, Debug, Clone, Copy)]
pub struct PartitionHint {
    /// WaPOR version hint (1 or 2)
    #[arg(long)]
    pub version: Option<u8>,

    /// Resolution level hint (1, 2 or 3)
    #[arg(long)]
    pub level: Option<u8>,
}

#[derive(Args, Debug, Clone)]
pub struct PeriodArgs {
    /// First day of the period (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Day after the last day of the period (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Country or basin codes (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub location: Vec<String>,

    /// Season codes (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub season: Vec<String>,

    /// Stage codes (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub stage: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct CubeArgs {
    /// Cube code, e.g. L1_AETI_D
    pub code: String,

    #[command(flatten)]
    pub hint: PartitionHint,
}

#[derive(Parser, Debug)]
pub struct AvailArgs {
    /// Cube code, e.g. L1_AETI_D
    pub code: String,

    #[command(flatten)]
    pub hint: PartitionHint,

    #[command(flatten)]
    pub period: PeriodArgs,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Cube code, e.g. L1_AETI_D (or use --product and --resolution)
    #[arg(required_unless_present = "product")]
    pub code: Option<String>,

    /// Product to build the cube code from (AETI, PCP, RET, NPP, LCC, I)
    #[arg(long, conflicts_with = "code")]
    pub product: Option<Product>,

    /// Temporal resolution used with --product (defaults to dekadal)
    #[arg(long, conflicts_with = "code")]
    pub resolution: Option<Resolution>,

    #[command(flatten)]
    pub hint: PartitionHint,

    #[command(flatten)]
    pub period: PeriodArgs,

    /// Crop box as xmin,ymin,xmax,ymax in EPSG:4326
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: BoundingBox,

    /// Directory receiving the GeoTIFFs and manifest.json
    #[arg(long, short = 'o', default_value = ".")]
    pub output: PathBuf,

    /// List the rasters that would be downloaded without cropping anything
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Parser, Debug)]
pub struct TimeseriesArgs {
    /// Cube code, e.g. L1_AETI_D
    pub code: String,

    #[command(flatten)]
    pub hint: PartitionHint,

    #[command(flatten)]
    pub period: PeriodArgs,

    /// Pixel location as x,y in EPSG:4326
    #[arg(long, allow_hyphen_values = true, conflicts_with = "shape", required_unless_present = "shape")]
    pub point: Option<GeoPoint>,

    /// GeoJSON file holding the (multi)polygon to aggregate over
    #[arg(long)]
    pub shape: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct LocationsArgs {
    /// WaPOR version (1 or 2)
    #[arg(long, default_value_t = 2)]
    pub version: u8,

    /// Only locations covered at this level
    #[arg(long)]
    pub level: Option<u8>,
}
