use crate::client::ClientOptions;
use crate::endpoints::DEFAULT_BASE_URL;
use crate::error::{Result, WaporError};
use crate::session::{DEFAULT_TOKEN_MARGIN_SECS, MAX_TOKEN_MARGIN_SECS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the WaPOR client
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub base_url: ConfigValue<String>,
    pub api_key: ConfigValue<Option<String>>,
    pub api_key_file: ConfigValue<Option<PathBuf>>,
    pub token_margin_secs: ConfigValue<i64>,
    pub poll_interval_secs: ConfigValue<u64>,
    pub max_polls: ConfigValue<Option<u32>>,
    pub request_timeout_secs: ConfigValue<Option<u64>>,
    pub language: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            base_url: ConfigValue::new(DEFAULT_BASE_URL.to_string(), ConfigSource::Default),
            api_key: ConfigValue::new(None, ConfigSource::Default),
            api_key_file: ConfigValue::new(None, ConfigSource::Default),
            token_margin_secs: ConfigValue::new(DEFAULT_TOKEN_MARGIN_SECS, ConfigSource::Default),
            poll_interval_secs: ConfigValue::new(2, ConfigSource::Default),
            max_polls: ConfigValue::new(None, ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(None, ConfigSource::Default),
            language: ConfigValue::new("en".to_string(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| WaporError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| WaporError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(base_url) = file_config.base_url {
            self.base_url.update(base_url, ConfigSource::File);
        }

        if let Some(api_key) = file_config.api_key {
            self.api_key.update(Some(api_key), ConfigSource::File);
        }

        if let Some(api_key_file) = file_config.api_key_file {
            self.api_key_file.update(Some(api_key_file), ConfigSource::File);
        }

        if let Some(margin) = file_config.token_margin_secs {
            check_token_margin(margin)?;
            self.token_margin_secs.update(margin, ConfigSource::File);
        }

        if let Some(interval) = file_config.poll_interval_secs {
            self.poll_interval_secs.update(interval, ConfigSource::File);
        }

        if let Some(max_polls) = file_config.max_polls {
            self.max_polls.update(Some(max_polls), ConfigSource::File);
        }

        if let Some(timeout) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(Some(timeout), ConfigSource::File);
        }

        if let Some(language) = file_config.language {
            self.language.update(language, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // WAPOR_BASE_URL
        if let Ok(base_url) = env::var("WAPOR_BASE_URL") {
            self.base_url.update(base_url, ConfigSource::Environment);
        }

        // WAPOR_API_KEY
        if let Ok(api_key) = env::var("WAPOR_API_KEY") {
            if !api_key.trim().is_empty() {
                self.api_key.update(Some(api_key), ConfigSource::Environment);
            }
        }

        // WAPOR_API_KEY_FILE
        if let Ok(path) = env::var("WAPOR_API_KEY_FILE") {
            self.api_key_file.update(Some(PathBuf::from(path)), ConfigSource::Environment);
        }

        // WAPOR_TOKEN_MARGIN
        if let Ok(margin_str) = env::var("WAPOR_TOKEN_MARGIN") {
            match margin_str.parse::<i64>() {
                Ok(margin) if check_token_margin(margin).is_ok() => {
                    self.token_margin_secs.update(margin, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid WAPOR_TOKEN_MARGIN value '{}': expected seconds between 0 and {}",
                    margin_str,
                    MAX_TOKEN_MARGIN_SECS
                ),
            }
        }

        // WAPOR_POLL_INTERVAL
        if let Ok(interval_str) = env::var("WAPOR_POLL_INTERVAL") {
            match interval_str.parse::<u64>() {
                Ok(interval) => self.poll_interval_secs.update(interval, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid WAPOR_POLL_INTERVAL value '{}': expected seconds as an integer",
                    interval_str
                ),
            }
        }

        // WAPOR_MAX_POLLS
        if let Ok(max_str) = env::var("WAPOR_MAX_POLLS") {
            match max_str.parse::<u32>() {
                Ok(max) if max > 0 => self.max_polls.update(Some(max), ConfigSource::Environment),
                _ => tracing::warn!(
                    "Invalid WAPOR_MAX_POLLS value '{}': expected a positive integer",
                    max_str
                ),
            }
        }

        // WAPOR_REQUEST_TIMEOUT
        if let Ok(timeout_str) = env::var("WAPOR_REQUEST_TIMEOUT") {
            match timeout_str.parse::<u64>() {
                Ok(timeout) if timeout > 0 => {
                    self.request_timeout_secs.update(Some(timeout), ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid WAPOR_REQUEST_TIMEOUT value '{}': expected seconds as a positive integer",
                    timeout_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.base_url.update(base_url, ConfigSource::Cli);
        }

        if let Some(api_key) = overrides.api_key {
            self.api_key.update(Some(api_key), ConfigSource::Cli);
        }

        if let Some(max_polls) = overrides.max_polls {
            self.max_polls.update(Some(max_polls), ConfigSource::Cli);
        }
    }

    /// API key from the `api_key` setting, or else the first line of
    /// `api_key_file`
    pub fn resolve_api_key(&self) -> Result<Option<String>> {
        if let Some(key) = self.api_key.value.as_deref() {
            return Ok(Some(key.trim().to_string()));
        }

        let Some(path) = self.api_key_file.value.as_deref() else {
            return Ok(None);
        };
        let content = fs::read_to_string(path).map_err(|source| WaporError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let key = content.lines().next().unwrap_or_default().trim();
        if key.is_empty() {
            return Err(WaporError::ConfigInvalid {
                key: "api_key_file".to_string(),
                reason: format!("{} is empty", path.display()),
            });
        }
        Ok(Some(key.to_string()))
    }

    /// Client tunables described by this configuration
    pub fn client_options(&self) -> Result<ClientOptions> {
        if self.poll_interval_secs.value == 0 {
            return Err(WaporError::ConfigInvalid {
                key: "poll_interval_secs".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.max_polls.value == Some(0) {
            return Err(WaporError::ConfigInvalid {
                key: "max_polls".to_string(),
                reason: "must be positive when set".to_string(),
            });
        }

        check_token_margin(self.token_margin_secs.value)?;
        let token_margin = chrono::Duration::try_seconds(self.token_margin_secs.value).ok_or_else(|| {
            WaporError::ConfigInvalid {
                key: "token_margin_secs".to_string(),
                reason: "out of range".to_string(),
            }
        })?;

        Ok(ClientOptions {
            base_url: self.base_url.value.clone(),
            token_margin,
            poll_interval: Duration::from_secs(self.poll_interval_secs.value),
            max_polls: self.max_polls.value,
            request_timeout: self.request_timeout_secs.value.map(Duration::from_secs),
            language: self.language.value.clone(),
        })
    }

    /// Get all configuration values as a map for inspection.
    ///
    /// The API key itself is never included, only whether one is set.
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("base_url".to_string(), (self.base_url.value.clone(), self.base_url.source));

        let api_key = if self.api_key.value.is_some() { "<set>" } else { "<not set>" };
        map.insert("api_key".to_string(), (api_key.to_string(), self.api_key.source));

        map.insert(
            "api_key_file".to_string(),
            (display_option(self.api_key_file.value.as_ref().map(|p| p.display())), self.api_key_file.source),
        );

        map.insert(
            "token_margin_secs".to_string(),
            (self.token_margin_secs.value.to_string(), self.token_margin_secs.source),
        );

        map.insert(
            "poll_interval_secs".to_string(),
            (self.poll_interval_secs.value.to_string(), self.poll_interval_secs.source),
        );

        map.insert(
            "max_polls".to_string(),
            (display_option(self.max_polls.value), self.max_polls.source),
        );

        map.insert(
            "request_timeout_secs".to_string(),
            (display_option(self.request_timeout_secs.value), self.request_timeout_secs.source),
        );

        map.insert("language".to_string(), (self.language.value.clone(), self.language.source));

        map
    }
}

fn display_option<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    base_url: Option<String>,
    api_key: Option<String>,
    api_key_file: Option<PathBuf>,
    token_margin_secs: Option<i64>,
    poll_interval_secs: Option<u64>,
    max_polls: Option<u32>,
    request_timeout_secs: Option<u64>,
    language: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub max_polls: Option<u32>,
}

fn check_token_margin(margin: i64) -> Result<()> {
    if !(0..=MAX_TOKEN_MARGIN_SECS).contains(&margin) {
        return Err(WaporError::ConfigInvalid {
            key: "token_margin_secs".to_string(),
            reason: format!("must be between 0 and {} seconds, got {}", MAX_TOKEN_MARGIN_SECS, margin),
        });
    }
    Ok(())
}
