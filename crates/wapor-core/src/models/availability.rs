use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::time::parse_time_code;

/// One raster available for a cube, as reported by the MDA table query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRow {
    /// Time member code, e.g. `[2009-01-01,2009-01-11)`
    pub time_code: String,
    pub time_caption: String,
    pub raster_id: String,
    pub bbox: Value,

    /// Member value for every non-time dimension, keyed by dimension code
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}

impl AvailabilityRow {
    /// Start and end dates decoded from the time code
    pub fn period(&self) -> Option<(chrono::NaiveDate, chrono::NaiveDate)> {
        parse_time_code(&self.time_code)
    }
}

/// Optional member filters for WHAT dimensions.
///
/// An empty list means "all known members of the dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityFilter {
    pub location: Vec<String>,
    pub season: Vec<String>,
    pub stage: Vec<String>,
}

impl AvailabilityFilter {
    pub fn is_empty(&self) -> bool {
        self.location.is_empty() && self.season.is_empty() && self.stage.is_empty()
    }

    /// Caller-supplied values for a dimension, if any were given
    pub fn values_for(&self, dimension_code: &str) -> Option<&[String]> {
        let values = match dimension_code {
            "COUNTRY" | "BASIN" => &self.location,
            "SEASON" => &self.season,
            "STAGE" => &self.stage,
            _ => return None,
        };
        if values.is_empty() {
            None
        } else {
            Some(values.as_slice())
        }
    }
}
