//! Blocking HTTP adapter for the `Transport` port

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, WaporError};
use crate::ports::{ApiRequest, Method, Transport};

/// `Transport` backed by a `reqwest` blocking client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport; `timeout` applies to every request when set
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("wapor/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| WaporError::Transport {
            url: String::new(),
            reason: format!("Failed to build HTTP client: {}", e),
        })?;
        Ok(Self { client })
    }

    /// Stream a file (e.g. a cropped GeoTIFF) to `path`, returning its size.
    ///
    /// `path` only appears once the whole body has been written.
    pub fn download_to(&self, url: &str, path: &Path) -> Result<u64> {
        tracing::debug!(url, path = %path.display(), "downloading");
        let mut response = self.execute(url, self.client.get(url))?;
        write_complete(path, |file| {
            response.copy_to(file).map_err(|e| WaporError::Transport {
                url: url.to_string(),
                reason: format!("Failed to read download body: {}", e),
            })
        })
    }

    fn execute(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().map_err(|e| WaporError::Transport {
            url: url.to_string(),
            reason: if e.is_timeout() {
                format!("request timed out: {}", e)
            } else {
                e.to_string()
            },
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(WaporError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Write into a `.part` sibling, then rename onto `path`.
/// The partial file is removed when `write` fails.
fn write_complete<F>(path: &Path, write: F) -> Result<u64>
where
    F: FnOnce(&mut File) -> Result<u64>,
{
    let partial = partial_path(path);
    let io_error = |source| WaporError::Io {
        path: partial.clone(),
        source,
    };

    let mut file = File::create(&partial).map_err(io_error)?;
    let outcome = write(&mut file).and_then(|n| file.sync_all().map(|_| n).map_err(io_error));
    let written = match outcome {
        Ok(n) => n,
        Err(e) => {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&partial) {
                tracing::warn!(path = %partial.display(), error = %cleanup, "could not remove partial download");
            }
            return Err(e);
        }
    };
    drop(file);

    fs::rename(&partial, path).map_err(|source| WaporError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(written)
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<Value> {
        tracing::debug!(method = %request.method, url = %request.url, "api request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = self.execute(&request.url, builder)?;
        response.json::<Value>().map_err(|e| WaporError::MalformedResponse {
            url: request.url.clone(),
            reason: format!("body is not JSON: {}", e),
        })
    }
}
