//! Error types for the WaPOR client

use crate::models::Partition;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaporError {
    // Session errors
    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    // Catalog errors
    #[error("Cube \"{code}\" is not available in WaPOR (searched {})", format_partitions(.probed))]
    ProductNotFound { code: String, probed: Vec<Partition> },

    #[error("Invalid workspace partition: version {version}, level {level:?}")]
    InvalidPartition { version: u8, level: Option<u8> },

    // Transport errors
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Request to {url} returned HTTP {status}: {body}")]
    Http { url: String, status: u16, body: String },

    #[error("WaPOR API rejected {url}: {message}")]
    Api { url: String, message: String },

    #[error("Unexpected response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    // Job errors
    #[error("Job submission for cube \"{cube}\" failed: {reason}")]
    JobSubmission { cube: String, reason: String },

    #[error("Job {job_url} has unsupported type \"{job_type}\"")]
    InvalidJobType { job_url: String, job_type: String },

    #[error("Job {job_url} completed with errors: {log}")]
    JobFailed { job_url: String, log: String },

    #[error("Job {job_url} still not finished after {polls} polls")]
    PollLimitExceeded { job_url: String, polls: u32 },

    // Input errors
    #[error("Invalid time range \"{input}\": {reason}")]
    InvalidTimeRange { input: String, reason: String },

    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl WaporError {
    /// Whether the failure came from the network or the HTTP layer rather
    /// than from the API's own answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, WaporError::Transport { .. } | WaporError::Http { .. })
    }

    pub(crate) fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        WaporError::MalformedResponse { url: url.into(), reason: reason.into() }
    }
}

impl From<serde_json::Error> for WaporError {
    fn from(err: serde_json::Error) -> Self {
        WaporError::Serialization(err.to_string())
    }
}

fn format_partitions(partitions: &[Partition]) -> String {
    if partitions.is_empty() {
        return "no partitions".to_string();
    }
    partitions.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
}

pub type Result<T> = std::result::Result<T, WaporError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_not_found_names_partitions() {
        let err = WaporError::ProductNotFound {
            code: "L9_XXX_D".to_string(),
            probed: vec![Partition::new(2, Some(3)).unwrap(), Partition::new(1, Some(1)).unwrap()],
        };
        let text = err.to_string();
        assert!(text.contains("L9_XXX_D"));
        assert!(text.contains("WAPOR_2.L3"));
        assert!(text.contains("WAPOR.L1"));
    }

    #[test]
    fn test_is_transport() {
        let transport = WaporError::Transport { url: "u".into(), reason: "refused".into() };
        let api = WaporError::Api { url: "u".into(), message: "denied".into() };
        assert!(transport.is_transport());
        assert!(!api.is_transport());
    }
}
