use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::partition::Partition;

/// Entry of a partition's lightweight cube listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeSummary {
    pub code: String,

    #[serde(default)]
    pub caption: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub data_type: Option<String>,
}

/// The single measure of a cube, with its scale factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub code: String,

    #[serde(default)]
    pub caption: String,

    /// Factor converting stored pixel values into physical units
    pub multiplier: f64,

    #[serde(default)]
    pub unit: Option<String>,
}

/// Dimension axis type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DimensionKind {
    Time,
    What,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDescriptor {
    pub code: String,

    #[serde(default)]
    pub caption: String,

    #[serde(rename = "type")]
    pub kind: DimensionKind,
}

impl DimensionDescriptor {
    pub fn is_time(&self) -> bool {
        self.kind == DimensionKind::Time
    }
}

/// A member of a dimension, e.g. a dekad or a country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionMember {
    pub code: String,

    #[serde(default)]
    pub caption: String,
}

/// Everything needed to query and rescale one cube
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeDescriptor {
    pub code: String,
    pub caption: String,
    pub partition: Partition,
    pub measure: Measure,
    pub dimensions: Vec<DimensionDescriptor>,
}

impl CubeDescriptor {
    pub fn multiplier(&self) -> f64 {
        self.measure.multiplier
    }

    /// All TIME dimensions (a well-formed cube has exactly one)
    pub fn time_dimensions(&self) -> impl Iterator<Item = &DimensionDescriptor> {
        self.dimensions.iter().filter(|d| d.is_time())
    }

    pub fn what_dimensions(&self) -> impl Iterator<Item = &DimensionDescriptor> {
        self.dimensions.iter().filter(|d| d.kind == DimensionKind::What)
    }

    /// `cube` reference used in query payloads
    pub fn query_ref(&self, language: &str) -> Value {
        json!({
            "workspaceCode": self.partition.workspace_code(),
            "code": self.code,
            "language": language,
        })
    }

    /// The TIME dimension, if there is exactly one
    pub fn time_dimension(&self) -> Option<&DimensionDescriptor> {
        let mut times = self.time_dimensions();
        match (times.next(), times.next()) {
            (Some(time), None) => Some(time),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(code: &str, kind: DimensionKind) -> DimensionDescriptor {
        DimensionDescriptor { code: code.into(), caption: String::new(), kind }
    }

    fn cube(dimensions: Vec<DimensionDescriptor>) -> CubeDescriptor {
        CubeDescriptor {
            code: "L2_CTY_PHE_S".into(),
            caption: "Phenology".into(),
            partition: Partition::new(2, Some(2)).unwrap(),
            measure: Measure {
                code: "PHE".into(),
                caption: String::new(),
                multiplier: 1.0,
                unit: None,
            },
            dimensions,
        }
    }

    #[test]
    fn test_dimension_kind_parsing() {
        let dims: Vec<DimensionDescriptor> = serde_json::from_str(
            r#"[{"code":"DEKAD","caption":"Dekad","type":"TIME"},
                {"code":"COUNTRY","type":"WHAT"},
                {"code":"X","type":"SOMETHING_NEW"}]"#,
        )
        .unwrap();
        assert_eq!(dims[0].kind, DimensionKind::Time);
        assert_eq!(dims[1].kind, DimensionKind::What);
        assert_eq!(dims[2].kind, DimensionKind::Other);
    }

    #[test]
    fn test_time_dimension_requires_exactly_one() {
        let ok = cube(vec![dim("YEAR", DimensionKind::Time), dim("SEASON", DimensionKind::What)]);
        assert_eq!(ok.time_dimension().map(|d| d.code.as_str()), Some("YEAR"));
        assert_eq!(ok.what_dimensions().count(), 1);

        let none = cube(vec![dim("SEASON", DimensionKind::What)]);
        assert!(none.time_dimension().is_none());

        let two = cube(vec![dim("YEAR", DimensionKind::Time), dim("DEKAD", DimensionKind::Time)]);
        assert!(two.time_dimension().is_none());
    }

    #[test]
    fn test_query_ref() {
        let c = cube(vec![]);
        assert_eq!(
            c.query_ref("en"),
            json!({"workspaceCode": "WAPOR_2", "code": "L2_CTY_PHE_S", "language": "en"})
        );
    }
}
