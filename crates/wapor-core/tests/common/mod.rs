//! Shared test doubles: a scripted transport, a manual clock and a
//! recording sleeper.

#![allow(dead_code)]

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use wapor_core::ports::{ApiRequest, Clock, Method, Sleeper, Transport};
use wapor_core::{ClientOptions, Result, WaporClient, WaporError};

pub const BASE: &str = "http://wapor.test/api/v1/";

/// Scripted reply for one request
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Http(u16),
    Unreachable,
}

#[derive(Default)]
struct Script {
    replies: HashMap<(String, String), VecDeque<Reply>>,
    requests: Vec<ApiRequest>,
}

/// Transport that answers from a script and records every request.
///
/// Replies are queued per (method, url); the last reply of a queue is
/// repeated for any further request.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Rc<RefCell<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, method: Method, url: &str, reply: Reply) {
        self.script
            .borrow_mut()
            .replies
            .entry((method.to_string(), url.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Queue a successful envelope around `payload`
    pub fn ok(&self, method: Method, url: &str, payload: Value) {
        self.reply(method, url, Reply::Json(envelope(payload)));
    }

    pub fn get(&self, path: &str, payload: Value) {
        self.ok(Method::Get, &url(path), payload);
    }

    pub fn post(&self, path: &str, payload: Value) {
        self.ok(Method::Post, &url(path), payload);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.borrow().requests.clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        let target = url(path);
        self.script
            .borrow()
            .requests
            .iter()
            .filter(|r| r.method == method && r.url == target)
            .count()
    }

    pub fn last_request(&self, method: Method, path: &str) -> Option<ApiRequest> {
        let target = url(path);
        self.script
            .borrow()
            .requests
            .iter()
            .rev()
            .find(|r| r.method == method && r.url == target)
            .cloned()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &ApiRequest) -> Result<Value> {
        let mut script = self.script.borrow_mut();
        script.requests.push(request.clone());

        let key = (request.method.to_string(), request.url.clone());
        let reply = match script.replies.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            Some(Reply::Json(body)) => Ok(body),
            Some(Reply::Http(status)) => Err(WaporError::Http {
                url: request.url.clone(),
                status,
                body: "scripted failure".to_string(),
            }),
            Some(Reply::Unreachable) => Err(WaporError::Transport {
                url: request.url.clone(),
                reason: "connection refused".to_string(),
            }),
            None => Err(WaporError::Transport {
                url: request.url.clone(),
                reason: format!("no scripted reply for {} {}", key.0, key.1),
            }),
        }
    }
}

/// Clock moved by hand
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(start_time())),
        }
    }

    pub fn advance(&self, seconds: i64) {
        self.now.set(self.now.get() + ChronoDuration::seconds(seconds));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Sleeper that only records requested delays
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Rc<RefCell<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

pub type TestClient = WaporClient<MockTransport, ManualClock, RecordingSleeper>;

/// Doubles plus a signed-in client sharing them
pub struct Harness {
    pub transport: MockTransport,
    pub clock: ManualClock,
    pub sleeper: RecordingSleeper,
    pub client: TestClient,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_options(options())
    }

    pub fn with_options(options: ClientOptions) -> Self {
        let transport = MockTransport::new();
        script_sign_in(&transport, 3600);
        let clock = ManualClock::new();
        let sleeper = RecordingSleeper::default();
        let client = WaporClient::new(transport.clone(), clock.clone(), sleeper.clone(), "test-key", options)
            .expect("sign-in should succeed");
        Self { transport, clock, sleeper, client }
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

pub fn options() -> ClientOptions {
    ClientOptions {
        base_url: BASE.to_string(),
        ..ClientOptions::default()
    }
}

pub fn url(path: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else {
        format!("{}{}", BASE, path)
    }
}

pub fn envelope(payload: Value) -> Value {
    json!({ "message": "OK", "response": payload })
}

pub fn grant(access: &str, refresh: &str, expires_in: i64) -> Value {
    json!({ "accessToken": access, "refreshToken": refresh, "expiresIn": expires_in })
}

pub fn script_sign_in(transport: &MockTransport, expires_in: i64) {
    transport.post("iam/sign-in/", grant("access-1", "refresh-1", expires_in));
}

pub fn listing_path(workspace: &str, level: u8) -> String {
    format!("catalog/workspaces/{}/cubes?overview=false&paged=false&tags=L{}", workspace, level)
}

pub fn cube_path(workspace: &str, code: &str, suffix: &str) -> String {
    format!("catalog/workspaces/{}/cubes/{}/{}?overview=false&paged=false", workspace, code, suffix)
}

pub fn members_path(workspace: &str, code: &str, dimension: &str) -> String {
    format!(
        "catalog/workspaces/{}/cubes/{}/dimensions/{}/members?overview=false&paged=false",
        workspace, code, dimension
    )
}

pub fn cube_entry(code: &str) -> Value {
    json!({ "code": code, "caption": format!("{} caption", code), "dataType": "RASTER" })
}

/// Script the measure and dimensions of a dekadal cube with one TIME
/// dimension
pub fn script_dekadal_cube(transport: &MockTransport, workspace: &str, code: &str, multiplier: f64) {
    transport.get(
        &cube_path(workspace, code, "measures"),
        json!([{ "code": "WATER_MM", "caption": "Water", "unit": "mm", "multiplier": multiplier }]),
    );
    transport.get(
        &cube_path(workspace, code, "dimensions"),
        json!([{ "code": "DEKAD", "caption": "Dekad", "type": "TIME" }]),
    );
}

/// Script a resolvable `L1_AETI_D` in WAPOR_2 level 1
pub fn script_aeti(transport: &MockTransport) {
    transport.get(&listing_path("WAPOR_2", 1), json!([cube_entry("L1_AETI_D"), cube_entry("L1_NPP_D")]));
    script_dekadal_cube(transport, "WAPOR_2", "L1_AETI_D", 0.1);
}

pub fn dekad_members() -> Value {
    json!([
        { "code": "[2009-01-01,2009-01-11)", "caption": "2009-01 D1" },
        { "code": "[2009-01-11,2009-01-21)", "caption": "2009-01 D2" }
    ])
}

pub fn job_status(status: &str, job_type: &str) -> Value {
    json!({ "status": status, "type": job_type })
}
