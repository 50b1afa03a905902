use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog workspace, e.g. `WAPOR_2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub code: String,

    #[serde(default)]
    pub caption: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Row of a workspace's `LOCATION` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub code: String,

    #[serde(default)]
    pub name: String,

    /// COUNTRY, BASIN or an area type
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub l1: bool,

    #[serde(default)]
    pub l2: bool,

    #[serde(default)]
    pub l3: bool,
}

impl Location {
    pub fn has_level(&self, level: u8) -> bool {
        match level {
            1 => self.l1,
            2 => self.l2,
            3 => self.l3,
            _ => false,
        }
    }
}

/// Short-lived direct download link for a stored raster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterLink {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}
