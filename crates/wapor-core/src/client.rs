//! The client facade
//!
//! A `WaporClient` owns one transport, one session (token), one catalog
//! cache and one job poller. Every operation that may refresh the token or
//! fill a cache takes `&mut self`; the client is meant to be owned by a
//! single caller, not shared between threads.

use chrono::Duration as ChronoDuration;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use crate::availability::AvailabilityQuery;
use crate::catalog::CatalogResolver;
use crate::endpoints::{Endpoints, DEFAULT_BASE_URL};
use crate::envelope;
use crate::error::{Result, WaporError};
use crate::http::HttpTransport;
use crate::jobs::{self, JobPoller, Submission, DEFAULT_POLL_INTERVAL};
use crate::models::{
    AreaShape, AvailabilityFilter, AvailabilityRow, BoundingBox, CubeDescriptor, CubeSummary,
    DimensionMember, GeoPoint, JobHandle, JobKind, JobResult, Location, Partition, RasterLink,
    TableResult, TimeRange, Workspace,
};
use crate::ports::{ApiRequest, Clock, Sleeper, SystemClock, ThreadSleeper, Transport};
use crate::session::{Session, DEFAULT_TOKEN_MARGIN_SECS};

/// Tunables for a client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub base_url: String,
    pub token_margin: ChronoDuration,
    pub poll_interval: Duration,
    pub max_polls: Option<u32>,
    pub request_timeout: Option<Duration>,
    pub language: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_margin: ChronoDuration::seconds(DEFAULT_TOKEN_MARGIN_SECS),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
            request_timeout: None,
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadPayload {
    download_url: String,
    expires_in: i64,
}

pub struct WaporClient<T = HttpTransport, C = SystemClock, S = ThreadSleeper>
where
    T: Transport,
    C: Clock,
    S: Sleeper,
{
    transport: T,
    clock: C,
    sleeper: S,
    endpoints: Endpoints,
    session: Session,
    resolver: CatalogResolver,
    poller: JobPoller,
    language: String,
    locations: HashMap<&'static str, Vec<Location>>,
}

impl WaporClient {
    /// Sign in over HTTPS with the system clock
    pub fn connect(api_key: &str, options: ClientOptions) -> Result<Self> {
        let transport = HttpTransport::new(options.request_timeout)?;
        Self::new(transport, SystemClock, ThreadSleeper, api_key, options)
    }
}

impl<T, C, S> WaporClient<T, C, S>
where
    T: Transport,
    C: Clock,
    S: Sleeper,
{
    /// Build a client and sign in. Fails with `Authentication` if no token
    /// can be obtained.
    pub fn new(transport: T, clock: C, sleeper: S, api_key: &str, options: ClientOptions) -> Result<Self> {
        let endpoints = Endpoints::new(&options.base_url);
        let session = Session::initialize(&transport, &clock, &endpoints, api_key, options.token_margin)?;
        Ok(Self {
            transport,
            clock,
            sleeper,
            endpoints,
            session,
            resolver: CatalogResolver::new(),
            poller: JobPoller::new(options.poll_interval, options.max_polls),
            language: options.language,
            locations: HashMap::new(),
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    /// Current access token, refreshed first if it is about to expire
    pub fn access_token(&mut self) -> Result<&str> {
        self.session.ensure_valid(&self.transport, &self.clock, &self.endpoints)
    }

    /// Locate `code` in the catalog and return its descriptor
    pub fn resolve(&mut self, code: &str, version: Option<u8>, level: Option<u8>) -> Result<CubeDescriptor> {
        self.resolver.resolve(&self.transport, &self.endpoints, code, version, level)
    }

    /// Cube listing of one partition
    pub fn catalog(&mut self, partition: &Partition) -> Result<Vec<CubeSummary>> {
        self.resolver
            .catalog(&self.transport, &self.endpoints, partition)
            .map(|listing| listing.to_vec())
    }

    pub fn dimension_members(&mut self, cube: &CubeDescriptor, dimension: &str) -> Result<Vec<DimensionMember>> {
        self.resolver.dimension_members(&self.transport, &self.endpoints, cube, dimension)
    }

    /// Rasters available for `cube` within `range`
    pub fn list_available(
        &mut self,
        cube: &CubeDescriptor,
        range: &TimeRange,
        filter: &AvailabilityFilter,
    ) -> Result<Vec<AvailabilityRow>> {
        let token = self.session.ensure_valid(&self.transport, &self.clock, &self.endpoints)?;
        AvailabilityQuery::new(cube, range, filter)
            .language(&self.language)
            .run(&self.transport, &self.endpoints, &mut self.resolver, token)
    }

    pub fn submit_crop_raster(
        &mut self,
        bbox: &BoundingBox,
        cube: &CubeDescriptor,
        time_code: &str,
        raster_id: &str,
    ) -> Result<JobHandle> {
        let body = jobs::crop_raster_query(&self.endpoints, cube, bbox, time_code, raster_id, &self.language)?;
        let token = self.session.ensure_valid(&self.transport, &self.clock, &self.endpoints)?;
        jobs::submit_job(&self.transport, &self.endpoints, body, Some(token), cube, JobKind::CropRaster)
    }

    pub fn submit_area_timeseries(
        &mut self,
        shape: &AreaShape,
        cube: &CubeDescriptor,
        range: &TimeRange,
    ) -> Result<JobHandle> {
        let body = jobs::area_timeseries_query(&self.endpoints, cube, shape, range, &self.language)?;
        let token = self.session.ensure_valid(&self.transport, &self.clock, &self.endpoints)?;
        jobs::submit_job(&self.transport, &self.endpoints, body, Some(token), cube, JobKind::AreaStats)
    }

    /// Submit a pixel time series; the request carries no bearer token
    pub fn submit_pixel_timeseries(
        &mut self,
        point: &GeoPoint,
        cube: &CubeDescriptor,
        range: &TimeRange,
    ) -> Result<JobHandle> {
        let body = jobs::pixel_timeseries_query(&self.endpoints, cube, point, range, &self.language)?;
        jobs::submit_job(&self.transport, &self.endpoints, body, None, cube, JobKind::PixelSeries)
    }

    /// Pixel time series, whether the service answers inline or with a job
    pub fn pixel_timeseries(
        &mut self,
        point: &GeoPoint,
        cube: &CubeDescriptor,
        range: &TimeRange,
    ) -> Result<TableResult> {
        let body = jobs::pixel_timeseries_query(&self.endpoints, cube, point, range, &self.language)?;
        match jobs::submit(&self.transport, &self.endpoints, body, None, cube, JobKind::PixelSeries)? {
            Submission::Inline(table) => Ok(table),
            Submission::Job(handle) => self.poll_table(&handle),
        }
    }

    /// Submit an area time series and wait for its table
    pub fn area_timeseries(
        &mut self,
        shape: &AreaShape,
        cube: &CubeDescriptor,
        range: &TimeRange,
    ) -> Result<TableResult> {
        let handle = self.submit_area_timeseries(shape, cube, range)?;
        self.poll_table(&handle)
    }

    /// Crop one available raster to `bbox` and wait for its download URL
    pub fn crop_raster(&mut self, bbox: &BoundingBox, cube: &CubeDescriptor, row: &AvailabilityRow) -> Result<String> {
        let handle = self.submit_crop_raster(bbox, cube, &row.time_code, &row.raster_id)?;
        match self.poll(&handle)? {
            JobResult::DownloadUrl { url } => Ok(url),
            JobResult::Table(_) => Err(WaporError::InvalidJobType {
                job_url: handle.url,
                job_type: "table output for a crop job".to_string(),
            }),
        }
    }

    /// Wait for a job to reach a terminal state
    pub fn poll(&self, handle: &JobHandle) -> Result<JobResult> {
        self.poller.poll(&self.transport, &self.sleeper, handle)
    }

    fn poll_table(&self, handle: &JobHandle) -> Result<TableResult> {
        match self.poll(handle)? {
            JobResult::Table(table) => Ok(table),
            JobResult::DownloadUrl { .. } => Err(WaporError::InvalidJobType {
                job_url: handle.url.clone(),
                job_type: "download output for a statistics job".to_string(),
            }),
        }
    }

    /// All catalog workspaces
    pub fn workspaces(&self) -> Result<Vec<Workspace>> {
        envelope::fetch(&self.transport, &ApiRequest::get(self.endpoints.workspaces()))
    }

    /// Locations (countries, basins, level-3 areas) of a workspace version,
    /// restricted to those covered at `level` when given
    pub fn locations(&mut self, version: u8, level: Option<u8>) -> Result<Vec<Location>> {
        let partition = Partition::new(version, level)?;
        let workspace = partition.workspace_code();

        if !self.locations.contains_key(workspace) {
            let request = ApiRequest::post(
                self.endpoints.query(),
                json!({
                    "type": "TableQuery_GetList_1",
                    "params": {
                        "table": { "workspaceCode": workspace, "code": "LOCATION" },
                        "properties": { "paged": false },
                        "sort": [{ "columnName": "name" }],
                    },
                }),
            );
            let table: Vec<Location> = envelope::fetch(&self.transport, &request)?;
            tracing::debug!(workspace, locations = table.len(), "fetched location table");
            self.locations.insert(workspace, table);
        }

        let all = self.locations.get(workspace).map(Vec::as_slice).unwrap_or_default();
        Ok(all
            .iter()
            .filter(|loc| level.map_or(true, |l| loc.has_level(l)))
            .cloned()
            .collect())
    }

    /// Direct download link for a stored raster
    pub fn raster_url(&mut self, cube: &CubeDescriptor, raster_id: &str) -> Result<RasterLink> {
        let token = self.session.ensure_valid(&self.transport, &self.clock, &self.endpoints)?;
        let request = ApiRequest::get(self.endpoints.download(&cube.partition))
            .bearer(token)
            .query("language", self.language.as_str())
            .query("requestType", "mapset_raster")
            .query("cubeCode", cube.code.as_str())
            .query("rasterId", raster_id);

        let payload: DownloadPayload = envelope::fetch(&self.transport, &request)?;
        let expires_at = ChronoDuration::try_seconds(payload.expires_in)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                WaporError::malformed(
                    &request.url,
                    format!("download link lifetime out of range: {}", payload.expires_in),
                )
            })?;
        Ok(RasterLink { url: payload.download_url, expires_at })
    }
}
