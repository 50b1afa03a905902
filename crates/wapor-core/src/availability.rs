//! Availability query: expand a cube's dimensions over a time range and
//! list the rasters the server holds for every combination.

use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

use crate::catalog::CatalogResolver;
use crate::endpoints::Endpoints;
use crate::envelope;
use crate::error::{Result, WaporError};
use crate::models::{
    AvailabilityFilter, AvailabilityRow, CubeDescriptor, DimensionDescriptor, DimensionKind,
    DimensionMember, TimeRange,
};
use crate::ports::{ApiRequest, Transport};

const MEASURES_AXIS: &str = "MEASURES";

/// One availability request
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityQuery<'a> {
    pub cube: &'a CubeDescriptor,
    pub range: &'a TimeRange,
    pub filter: &'a AvailabilityFilter,
    pub language: &'a str,
}

impl<'a> AvailabilityQuery<'a> {
    pub fn new(cube: &'a CubeDescriptor, range: &'a TimeRange, filter: &'a AvailabilityFilter) -> Self {
        Self { cube, range, filter, language: "en" }
    }

    pub fn language(mut self, language: &'a str) -> Self {
        self.language = language;
        self
    }

    /// Run the table query.
    ///
    /// An empty result is `Ok(vec![])`; any failure to fetch or interpret the
    /// table is an `Err`.
    pub fn run<T: Transport + ?Sized>(
        &self,
        transport: &T,
        endpoints: &Endpoints,
        resolver: &mut CatalogResolver,
        access_token: &str,
    ) -> Result<Vec<AvailabilityRow>> {
        let time_dim = self.cube.time_dimension().ok_or_else(|| {
            WaporError::malformed(
                endpoints.dimensions(&self.cube.partition, &self.cube.code),
                format!(
                    "cube {} must have exactly one TIME dimension, found {}",
                    self.cube.code,
                    self.cube.time_dimensions().count()
                ),
            )
        })?;
        let time_members = resolver.dimension_members(transport, endpoints, self.cube, &time_dim.code)?;

        let mut dimensions = Vec::new();
        let mut rows = Vec::new();
        for dim in &self.cube.dimensions {
            match dim.kind {
                DimensionKind::Time => {
                    dimensions.push(json!({ "code": dim.code, "range": self.range.to_filter() }));
                }
                DimensionKind::What => {
                    let values = self.what_values(transport, endpoints, resolver, dim)?;
                    dimensions.push(json!({ "code": dim.code, "values": values }));
                }
                DimensionKind::Other => continue,
            }
            rows.push(dim.code.clone());
        }

        let url = endpoints.query();
        let request = ApiRequest::post(&url, self.body(dimensions, &rows)).bearer(access_token);
        let payload = envelope::fetch_value(transport, &request)?;

        let items = match payload.get("items") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(Value::Null) | None => {
                return Err(WaporError::malformed(&url, "table response has no \"items\""))
            }
            Some(_) => return Err(WaporError::malformed(&url, "\"items\" is not a list")),
        };

        let available = flatten_table(&url, items, &rows, &time_dim.code, &time_members)?;
        tracing::info!(
            cube = %self.cube.code,
            range = %self.range,
            rasters = available.len(),
            "availability query complete"
        );
        Ok(available)
    }

    fn what_values<T: Transport + ?Sized>(
        &self,
        transport: &T,
        endpoints: &Endpoints,
        resolver: &mut CatalogResolver,
        dim: &DimensionDescriptor,
    ) -> Result<Vec<String>> {
        if let Some(values) = self.filter.values_for(&dim.code) {
            return Ok(values.to_vec());
        }
        let members = resolver.dimension_members(transport, endpoints, self.cube, &dim.code)?;
        Ok(members.into_iter().map(|m| m.code).collect())
    }

    fn body(&self, dimensions: Vec<Value>, rows: &[String]) -> Value {
        json!({
            "type": "MDAQuery_Table",
            "params": {
                "properties": { "metadata": true, "paged": false },
                "cube": self.cube.query_ref(self.language),
                "dimensions": dimensions,
                "measures": [self.cube.measure.code],
                "projection": {
                    "columns": [MEASURES_AXIS],
                    "rows": rows,
                },
            },
        })
    }
}

/// Flatten MDA table rows into one `AvailabilityRow` per raster cell.
///
/// `ROW_HEADER` cells carry dimension values in `rows` order; `DATA_CELL`
/// cells carry `metadata.raster {id, bbox}`. The TIME header holds a member
/// caption, mapped back to its code through `time_members`.
pub fn flatten_table(
    url: &str,
    items: &[Value],
    rows: &[String],
    time_dimension: &str,
    time_members: &[DimensionMember],
) -> Result<Vec<AvailabilityRow>> {
    let codes_by_caption: HashMap<&str, &str> = time_members
        .iter()
        .map(|m| (m.caption.as_str(), m.code.as_str()))
        .collect();

    let mut available = Vec::new();
    for (row_index, item) in items.iter().enumerate() {
        let cells = item
            .as_array()
            .ok_or_else(|| WaporError::malformed(url, format!("row {} is not a list", row_index)))?;

        let mut headers: Vec<String> = Vec::new();
        for cell in cells {
            match cell.get("type").and_then(Value::as_str) {
                Some("ROW_HEADER") => headers.push(header_value(cell)),
                Some("DATA_CELL") => {
                    let Some(raster) = cell.pointer("/metadata/raster") else {
                        tracing::debug!(row = row_index, "data cell without raster metadata");
                        continue;
                    };
                    available.push(build_row(
                        url,
                        row_index,
                        &headers,
                        rows,
                        time_dimension,
                        &codes_by_caption,
                        raster,
                    )?);
                }
                _ => continue,
            }
        }
    }
    Ok(available)
}

fn header_value(cell: &Value) -> String {
    match cell.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn build_row(
    url: &str,
    row_index: usize,
    headers: &[String],
    rows: &[String],
    time_dimension: &str,
    codes_by_caption: &HashMap<&str, &str>,
    raster: &Value,
) -> Result<AvailabilityRow> {
    let mut time_caption = None;
    let mut dimensions = BTreeMap::new();
    for (code, value) in rows.iter().zip(headers) {
        if code == time_dimension {
            time_caption = Some(value.clone());
        } else {
            dimensions.insert(code.clone(), value.clone());
        }
    }

    let time_caption = time_caption.ok_or_else(|| {
        WaporError::malformed(url, format!("row {} has no {} header", row_index, time_dimension))
    })?;
    let time_code = codes_by_caption.get(time_caption.as_str()).ok_or_else(|| {
        WaporError::malformed(
            url,
            format!("time caption \"{}\" is not a member of {}", time_caption, time_dimension),
        )
    })?;

    let raster_id = match raster.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            return Err(WaporError::malformed(
                url,
                format!("row {} raster metadata has no id", row_index),
            ))
        }
    };

    Ok(AvailabilityRow {
        time_code: (*time_code).to_string(),
        time_caption,
        raster_id,
        bbox: raster.get("bbox").cloned().unwrap_or(Value::Null),
        dimensions,
    })
}
