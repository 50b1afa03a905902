use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tabled::Tabled;
use wapor_core::models::{
    AvailabilityRow, CubeDescriptor, CubeSummary, Location, TableResult, Workspace,
};

/// Row of the catalog command
#[derive(Debug, Serialize, Tabled)]
pub struct CubeRow {
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Caption")]
    pub caption: String,
    #[tabled(rename = "Type")]
    pub data_type: String,
}

impl From<CubeSummary> for CubeRow {
    fn from(cube: CubeSummary) -> Self {
        Self {
            code: cube.code,
            caption: cube.caption,
            data_type: cube.data_type.unwrap_or_default(),
        }
    }
}

/// Output for cube command
#[derive(Debug, Serialize)]
pub struct CubeOutput {
    pub code: String,
    pub caption: String,
    pub workspace: String,
    pub level: Option<u8>,
    pub measure: String,
    pub unit: Option<String>,
    pub multiplier: f64,
    pub dimensions: Vec<DimensionRow>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct DimensionRow {
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Caption")]
    pub caption: String,
    #[tabled(rename = "Type")]
    pub kind: String,
}

impl From<&CubeDescriptor> for CubeOutput {
    fn from(cube: &CubeDescriptor) -> Self {
        Self {
            code: cube.code.clone(),
            caption: cube.caption.clone(),
            workspace: cube.partition.workspace_code().to_string(),
            level: cube.partition.level(),
            measure: cube.measure.code.clone(),
            unit: cube.measure.unit.clone(),
            multiplier: cube.multiplier(),
            dimensions: cube
                .dimensions
                .iter()
                .map(|d| DimensionRow {
                    code: d.code.clone(),
                    caption: d.caption.clone(),
                    kind: format!("{:?}", d.kind).to_uppercase(),
                })
                .collect(),
        }
    }
}

/// Row of the avail command
#[derive(Debug, Serialize, Tabled)]
pub struct AvailableRaster {
    #[tabled(rename = "Raster")]
    pub raster_id: String,
    #[tabled(rename = "Period")]
    pub time_caption: String,
    #[tabled(rename = "Time code")]
    pub time_code: String,
    #[tabled(rename = "Dimensions")]
    pub dimensions: String,
}

impl From<&AvailabilityRow> for AvailableRaster {
    fn from(row: &AvailabilityRow) -> Self {
        Self {
            raster_id: row.raster_id.clone(),
            time_caption: row.time_caption.clone(),
            time_code: row.time_code.clone(),
            dimensions: row
                .dimensions
                .iter()
                .map(|(code, value)| format!("{}={}", code, value))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Output for avail --json
#[derive(Debug, Serialize)]
pub struct AvailOutput {
    pub cube: String,
    pub workspace: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rasters: Vec<AvailabilityRow>,
}

/// Row of the locations command
#[derive(Debug, Serialize, Tabled)]
pub struct LocationRow {
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Levels")]
    pub levels: String,
}

impl From<Location> for LocationRow {
    fn from(location: Location) -> Self {
        let levels = (1..=3u8)
            .filter(|l| location.has_level(*l))
            .map(|l| format!("L{}", l))
            .collect::<Vec<_>>()
            .join(",");
        Self {
            code: location.code,
            name: location.name,
            kind: location.kind,
            levels,
        }
    }
}

/// Row of the workspaces command
#[derive(Debug, Serialize, Tabled)]
pub struct WorkspaceRow {
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Caption")]
    pub caption: String,
}

impl From<Workspace> for WorkspaceRow {
    fn from(workspace: Workspace) -> Self {
        Self {
            code: workspace.code,
            caption: workspace.caption,
        }
    }
}

/// Output for timeseries command
#[derive(Debug, Serialize)]
pub struct TimeseriesOutput {
    pub cube: String,
    pub multiplier: f64,
    pub unit: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub table: TableResult,
}

/// Row of the config command
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

/// Raster planned by `download --dry-run`
#[derive(Debug, Serialize, Tabled)]
pub struct PlannedRaster {
    #[tabled(rename = "Raster")]
    pub raster_id: String,
    #[tabled(rename = "Period")]
    pub time_caption: String,
    #[tabled(rename = "File")]
    pub file: String,
}

/// Output for download --dry-run
#[derive(Debug, Serialize)]
pub struct DownloadPlan {
    pub dry_run: bool,
    pub cube: String,
    pub output_dir: String,
    pub rasters: Vec<PlannedRaster>,
}

/// `manifest.json` written next to the downloaded rasters
#[derive(Debug, Serialize)]
pub struct DownloadManifest {
    pub cube: String,
    pub caption: String,
    pub workspace: String,
    pub level: Option<u8>,
    pub measure: String,
    pub unit: Option<String>,
    /// Stored pixel values times this factor give physical units
    pub multiplier: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bbox: [f64; 4],
    pub created_at: DateTime<Utc>,
    pub rasters: Vec<DownloadedRaster>,
    pub failures: Vec<FailedRaster>,
}

#[derive(Debug, Serialize)]
pub struct DownloadedRaster {
    pub raster_id: String,
    pub time_code: String,
    pub file: String,
    pub bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct FailedRaster {
    pub raster_id: String,
    pub time_code: String,
    pub error: String,
}
