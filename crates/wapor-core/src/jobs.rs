//! Server-side jobs: build crop/statistics queries, submit them and poll the
//! returned job URL until it reaches a terminal state.

use serde_json::{json, Value};
use std::time::Duration;

use crate::endpoints::Endpoints;
use crate::envelope;
use crate::error::{Result, WaporError};
use crate::models::{
    AreaShape, BoundingBox, CubeDescriptor, GeoPoint, JobHandle, JobKind, JobResult, JobStatus,
    TableResult, TimeRange,
};
use crate::ports::{ApiRequest, Sleeper, Transport};

/// Default delay between two polls of the same job
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// What the query endpoint answered to a job submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Job(JobHandle),
    Inline(TableResult),
}

/// Polls job URLs with a fixed delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPoller {
    interval: Duration,
    max_polls: Option<u32>,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
        }
    }
}

impl JobPoller {
    pub fn new(interval: Duration, max_polls: Option<u32>) -> Self {
        Self { interval, max_polls }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_polls(&self) -> Option<u32> {
        self.max_polls
    }

    /// Poll `handle` until the job completes.
    ///
    /// `WAITING` and `RUNNING` sleep for the poll interval and try again.
    /// Transport errors end the loop immediately. With `max_polls` set, a job
    /// still pending after that many requests fails with
    /// `PollLimitExceeded`; without it the loop is unbounded.
    pub fn poll<T, S>(&self, transport: &T, sleeper: &S, handle: &JobHandle) -> Result<JobResult>
    where
        T: Transport + ?Sized,
        S: Sleeper + ?Sized,
    {
        let request = ApiRequest::get(&handle.url);
        let mut polls: u32 = 0;
        let mut last_status: Option<String> = None;

        loop {
            polls += 1;
            let job = envelope::fetch_value(transport, &request)?;
            let raw_status = job
                .get("status")
                .and_then(Value::as_str)
                .ok_or_else(|| WaporError::malformed(&handle.url, "job has no status"))?;

            if last_status.as_deref() != Some(raw_status) {
                tracing::info!(job = %handle.url, status = raw_status, polls, "job status");
                last_status = Some(raw_status.to_string());
            }

            match JobStatus::parse(raw_status) {
                Some(JobStatus::Completed) => return completed(&handle.url, &job),
                Some(JobStatus::CompletedWithErrors) => {
                    return Err(WaporError::JobFailed {
                        job_url: handle.url.clone(),
                        log: job_log(&job),
                    })
                }
                Some(JobStatus::Waiting) | Some(JobStatus::Running) => {}
                None => tracing::warn!(job = %handle.url, status = raw_status, "unknown job status, still waiting"),
            }

            if let Some(max) = self.max_polls {
                if polls >= max {
                    return Err(WaporError::PollLimitExceeded {
                        job_url: handle.url.clone(),
                        polls,
                    });
                }
            }
            sleeper.sleep(self.interval);
        }
    }
}

fn completed(job_url: &str, job: &Value) -> Result<JobResult> {
    let raw_type = job.get("type").and_then(Value::as_str).unwrap_or_default();
    let kind = JobKind::parse(raw_type).ok_or_else(|| WaporError::InvalidJobType {
        job_url: job_url.to_string(),
        job_type: raw_type.to_string(),
    })?;

    let output = job
        .get("output")
        .ok_or_else(|| WaporError::malformed(job_url, "completed job has no output"))?;

    if kind.yields_table() {
        let table: TableResult = serde_json::from_value(output.clone())
            .map_err(|e| WaporError::malformed(job_url, format!("job output is not a table: {}", e)))?;
        return Ok(JobResult::Table(table));
    }

    let url = output
        .get("downloadUrl")
        .and_then(Value::as_str)
        .ok_or_else(|| WaporError::malformed(job_url, "crop job output has no downloadUrl"))?;
    Ok(JobResult::DownloadUrl { url: url.to_string() })
}

fn job_log(job: &Value) -> String {
    match job.get("log") {
        Some(Value::String(log)) => log.clone(),
        Some(Value::Array(lines)) => lines
            .iter()
            .map(|line| match line {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::Null) | None => "no log provided".to_string(),
        Some(other) => other.to_string(),
    }
}

fn time_dimension_code<'a>(endpoints: &Endpoints, cube: &'a CubeDescriptor) -> Result<&'a str> {
    cube.time_dimension().map(|d| d.code.as_str()).ok_or_else(|| {
        WaporError::malformed(
            endpoints.dimensions(&cube.partition, &cube.code),
            format!("cube {} must have exactly one TIME dimension", cube.code),
        )
    })
}

/// `CropRaster` payload for one raster of `cube`
pub fn crop_raster_query(
    endpoints: &Endpoints,
    cube: &CubeDescriptor,
    bbox: &BoundingBox,
    time_code: &str,
    raster_id: &str,
    language: &str,
) -> Result<Value> {
    let time_dim = time_dimension_code(endpoints, cube)?;
    Ok(json!({
        "type": "CropRaster",
        "params": {
            "properties": {
                "outputFileName": format!("{}.tif", raster_id),
                "cutline": true,
                "tiled": true,
                "compressed": true,
                "overviews": true,
            },
            "cube": cube.query_ref(language),
            "dimensions": [{ "code": time_dim, "values": [time_code] }],
            "measures": [cube.measure.code],
            "shape": bbox.to_crop_shape(),
        },
    }))
}

/// `AreaStatsTimeSeries` payload
pub fn area_timeseries_query(
    endpoints: &Endpoints,
    cube: &CubeDescriptor,
    shape: &AreaShape,
    range: &TimeRange,
    language: &str,
) -> Result<Value> {
    let time_dim = time_dimension_code(endpoints, cube)?;
    Ok(json!({
        "type": "AreaStatsTimeSeries",
        "params": {
            "cube": cube.query_ref(language),
            "dimensions": [{ "code": time_dim, "range": range.to_filter() }],
            "measures": [cube.measure.code],
            "shape": shape.to_json()?,
        },
    }))
}

/// `PixelTimeSeries` payload
pub fn pixel_timeseries_query(
    endpoints: &Endpoints,
    cube: &CubeDescriptor,
    point: &GeoPoint,
    range: &TimeRange,
    language: &str,
) -> Result<Value> {
    let time_dim = time_dimension_code(endpoints, cube)?;
    Ok(json!({
        "type": "PixelTimeSeries",
        "params": {
            "cube": cube.query_ref(language),
            "dimensions": [{ "code": time_dim, "range": range.to_filter() }],
            "measures": [cube.measure.code],
            "point": point.to_query_point(),
        },
    }))
}

/// Post a job query and classify the answer
pub fn submit<T: Transport + ?Sized>(
    transport: &T,
    endpoints: &Endpoints,
    body: Value,
    access_token: Option<&str>,
    cube: &CubeDescriptor,
    kind: JobKind,
) -> Result<Submission> {
    let mut request = ApiRequest::post(endpoints.query(), body);
    if let Some(token) = access_token {
        request = request.bearer(token);
    }
    let payload = envelope::fetch_value(transport, &request)?;

    if let Some(href) = payload.pointer("/links/0/href").and_then(Value::as_str) {
        tracing::info!(cube = %cube.code, %kind, job = href, "job submitted");
        return Ok(Submission::Job(JobHandle::new(href, kind)));
    }

    if kind.yields_table() && payload.get("items").is_some() {
        let table: TableResult = serde_json::from_value(payload)
            .map_err(|e| WaporError::malformed(&request.url, format!("inline table: {}", e)))?;
        return Ok(Submission::Inline(table));
    }

    Err(WaporError::JobSubmission {
        cube: cube.code.clone(),
        reason: "response contains no job link".to_string(),
    })
}

/// Like [`submit`], but requires a job link
pub fn submit_job<T: Transport + ?Sized>(
    transport: &T,
    endpoints: &Endpoints,
    body: Value,
    access_token: Option<&str>,
    cube: &CubeDescriptor,
    kind: JobKind,
) -> Result<JobHandle> {
    match submit(transport, endpoints, body, access_token, cube, kind)? {
        Submission::Job(handle) => Ok(handle),
        Submission::Inline(_) => Err(WaporError::JobSubmission {
            cube: cube.code.clone(),
            reason: "response contains no job link".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DimensionDescriptor, DimensionKind, Measure, Partition};

    fn cube() -> CubeDescriptor {
        CubeDescriptor {
            code: "L1_AETI_D".into(),
            caption: "Actual ET".into(),
            partition: Partition::new(2, Some(1)).unwrap(),
            measure: Measure {
                code: "WATER_MM".into(),
                caption: String::new(),
                multiplier: 0.1,
                unit: Some("mm".into()),
            },
            dimensions: vec![DimensionDescriptor {
                code: "DEKAD".into(),
                caption: "Dekad".into(),
                kind: DimensionKind::Time,
            }],
        }
    }

    #[test]
    fn test_crop_query_payload() {
        let bbox = BoundingBox::new(37.0, 7.0, 43.0, 12.0).unwrap();
        let body = crop_raster_query(
            &Endpoints::default(),
            &cube(),
            &bbox,
            "[2009-01-01,2009-01-11)",
            "L1_AETI_0901",
            "en",
        )
        .unwrap();

        assert_eq!(body["type"], "CropRaster");
        assert_eq!(body["params"]["properties"]["outputFileName"], "L1_AETI_0901.tif");
        assert_eq!(body["params"]["dimensions"][0]["code"], "DEKAD");
        assert_eq!(body["params"]["dimensions"][0]["values"][0], "[2009-01-01,2009-01-11)");
        assert_eq!(body["params"]["measures"][0], "WATER_MM");
        assert_eq!(body["params"]["cube"]["workspaceCode"], "WAPOR_2");
        assert_eq!(body["params"]["shape"]["coordinates"][0][0], json!([37.0, 7.0]));
    }

    #[test]
    fn test_pixel_query_payload() {
        let range: TimeRange = "2009-01-01,2009-02-01".parse().unwrap();
        let point = GeoPoint::new(37.95, 7.89).unwrap();
        let body =
            pixel_timeseries_query(&Endpoints::default(), &cube(), &point, &range, "en").unwrap();
        assert_eq!(body["type"], "PixelTimeSeries");
        assert_eq!(body["params"]["dimensions"][0]["range"], "[2009-01-01,2009-02-01)");
        assert_eq!(body["params"]["point"]["crs"], "EPSG:4326");
    }

    #[test]
    fn test_query_requires_time_dimension() {
        let mut no_time = cube();
        no_time.dimensions.clear();
        let range: TimeRange = "2009-01-01,2009-02-01".parse().unwrap();
        let shape = AreaShape::from_bbox(&BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap());
        let err = area_timeseries_query(&Endpoints::default(), &no_time, &shape, &range, "en")
            .unwrap_err();
        assert!(matches!(err, WaporError::MalformedResponse { .. }));
    }

    #[test]
    fn test_job_log_formats() {
        assert_eq!(job_log(&json!({"log": ["a", "b"]})), "a\nb");
        assert_eq!(job_log(&json!({"log": "boom"})), "boom");
        assert_eq!(job_log(&json!({})), "no log provided");
    }
}
