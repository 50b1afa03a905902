use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, WaporError};

/// CRS used for bounding boxes and pixel queries
pub const WGS84: &str = "EPSG:4326";

/// Axis-aligned lon/lat box `xmin,ymin,xmax,ymax`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Result<Self> {
        let finite = [xmin, ymin, xmax, ymax].iter().all(|v| v.is_finite());
        if !finite || xmin >= xmax || ymin >= ymax {
            return Err(WaporError::InvalidInput {
                field: "bbox".to_string(),
                reason: format!(
                    "expected xmin < xmax and ymin < ymax, got {},{},{},{}",
                    xmin, ymin, xmax, ymax
                ),
            });
        }
        Ok(Self { xmin, ymin, xmax, ymax })
    }

    /// Closed ring, counter-clockwise from the lower-left corner
    pub fn ring(&self) -> [[f64; 2]; 5] {
        [
            [self.xmin, self.ymin],
            [self.xmin, self.ymax],
            [self.xmax, self.ymax],
            [self.xmax, self.ymin],
            [self.xmin, self.ymin],
        ]
    }

    /// Shape object expected by the `CropRaster` query
    pub fn to_crop_shape(&self) -> Value {
        json!({
            "type": "Polygon",
            "properties": { "name": "epsg:4326" },
            "coordinates": [self.ring()],
        })
    }
}

impl FromStr for BoundingBox {
    type Err = WaporError;

    fn from_str(s: &str) -> Result<Self> {
        let values = parse_floats(s, "bbox")?;
        match values.as_slice() {
            [xmin, ymin, xmax, ymax] => Self::new(*xmin, *ymin, *xmax, *ymax),
            _ => Err(WaporError::InvalidInput {
                field: "bbox".to_string(),
                reason: format!("expected 4 comma-separated numbers, got {}", values.len()),
            }),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

/// Lon/lat point in WGS84
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
}

impl GeoPoint {
    pub fn new(x: f64, y: f64) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(WaporError::InvalidInput {
                field: "point".to_string(),
                reason: "coordinates must be finite".to_string(),
            });
        }
        Ok(Self { x, y })
    }

    pub fn to_query_point(&self) -> Value {
        json!({ "crs": WGS84, "x": self.x, "y": self.y })
    }
}

impl FromStr for GeoPoint {
    type Err = WaporError;

    fn from_str(s: &str) -> Result<Self> {
        let values = parse_floats(s, "point")?;
        match values.as_slice() {
            [x, y] => Self::new(*x, *y),
            _ => Err(WaporError::InvalidInput {
                field: "point".to_string(),
                reason: format!("expected x,y, got {} values", values.len()),
            }),
        }
    }
}

fn parse_floats(s: &str, field: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|part| {
            part.trim().parse::<f64>().map_err(|_| WaporError::InvalidInput {
                field: field.to_string(),
                reason: format!("\"{}\" is not a number", part.trim()),
            })
        })
        .collect()
}

/// Polygon area for area statistics, tagged with its CRS name
#[derive(Debug, Clone, PartialEq)]
pub struct AreaShape {
    pub geometry: geojson::Geometry,
    pub crs: String,
}

impl AreaShape {
    pub fn new(geometry: geojson::Geometry, crs: impl Into<String>) -> Result<Self> {
        match geometry.value {
            geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => Ok(Self {
                geometry,
                crs: crs.into(),
            }),
            _ => Err(WaporError::InvalidInput {
                field: "shape".to_string(),
                reason: "area statistics need a Polygon or MultiPolygon".to_string(),
            }),
        }
    }

    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        let ring = bbox.ring().iter().map(|p| p.to_vec()).collect();
        Self {
            geometry: geojson::Geometry::new(geojson::Value::Polygon(vec![ring])),
            crs: WGS84.to_string(),
        }
    }

    /// Parse the first polygon of a GeoJSON document (geometry, feature or
    /// feature collection). GeoJSON coordinates are WGS84.
    pub fn from_geojson_str(content: &str) -> Result<Self> {
        let invalid = |reason: String| WaporError::InvalidInput {
            field: "shape".to_string(),
            reason,
        };

        let parsed: GeoJson = content.parse().map_err(|e| invalid(format!("invalid GeoJSON: {}", e)))?;
        let geometry = match parsed {
            GeoJson::Geometry(geometry) => Some(geometry),
            GeoJson::Feature(feature) => feature.geometry,
            GeoJson::FeatureCollection(collection) => {
                collection.features.into_iter().find_map(|f| f.geometry)
            }
        };

        let geometry = geometry.ok_or_else(|| invalid("GeoJSON contains no geometry".to_string()))?;
        Self::new(geometry, WGS84)
    }

    pub fn from_geojson_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| WaporError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_geojson_str(&content)
    }

    /// Shape object expected by the `AreaStatsTimeSeries` query
    pub fn to_json(&self) -> Result<Value> {
        let mut shape = serde_json::to_value(&self.geometry)?;
        if let Value::Object(map) = &mut shape {
            map.insert("properties".to_string(), json!({ "name": self.crs }));
        }
        Ok(shape)
    }
}
