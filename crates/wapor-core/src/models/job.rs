use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of server-side job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    CropRaster,
    AreaStats,
    PixelSeries,
}

impl JobKind {
    /// Parse a job type as the server reports it (`CROP RASTER`) or in
    /// underscore form (`CROP_RASTER`).
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize(raw).as_str() {
            "CROP_RASTER" => Some(JobKind::CropRaster),
            "AREA_STATS" => Some(JobKind::AreaStats),
            "PIXEL_SERIES" | "PIXEL_STATS" | "PIXEL_TIMESERIES" => Some(JobKind::PixelSeries),
            _ => None,
        }
    }

    /// Whether the finished job carries a `{header, items}` table
    pub fn yields_table(&self) -> bool {
        matches!(self, JobKind::AreaStats | JobKind::PixelSeries)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobKind::CropRaster => "CROP RASTER",
            JobKind::AreaStats => "AREA STATS",
            JobKind::PixelSeries => "PIXEL SERIES",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Waiting,
    Running,
    Completed,
    CompletedWithErrors,
}

impl JobStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize(raw).as_str() {
            "WAITING" => Some(JobStatus::Waiting),
            "RUNNING" => Some(JobStatus::Running),
            "COMPLETED" => Some(JobStatus::Completed),
            "COMPLETED_WITH_ERRORS" => Some(JobStatus::CompletedWithErrors),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::CompletedWithErrors)
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase().replace([' ', '-'], "_")
}

/// Handle to a submitted job; polling it is idempotent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub url: String,
    pub kind: JobKind,
}

impl JobHandle {
    pub fn new(url: impl Into<String>, kind: JobKind) -> Self {
        Self { url: url.into(), kind }
    }
}

/// Tabular output of area or pixel statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableResult {
    #[serde(default)]
    pub header: Vec<String>,

    #[serde(rename = "items", default)]
    pub rows: Vec<Vec<Value>>,
}

impl TableResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a header column
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

/// Artifact produced by a completed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobResult {
    DownloadUrl { url: String },
    Table(TableResult),
}

impl JobResult {
    pub fn download_url(&self) -> Option<&str> {
        match self {
            JobResult::DownloadUrl { url } => Some(url),
            JobResult::Table(_) => None,
        }
    }

    pub fn into_table(self) -> Option<TableResult> {
        match self {
            JobResult::Table(table) => Some(table),
            JobResult::DownloadUrl { .. } => None,
        }
    }
}
