//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use wapor_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use wapor_core::WaporError;

const ENV_VARS: [&str; 7] = [
    "WAPOR_BASE_URL",
    "WAPOR_API_KEY",
    "WAPOR_API_KEY_FILE",
    "WAPOR_TOKEN_MARGIN",
    "WAPOR_POLL_INTERVAL",
    "WAPOR_MAX_POLLS",
    "WAPOR_REQUEST_TIMEOUT",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_file_overrides_defaults() {
    let file = config_file(
        r#"
base_url = "http://localhost:8080/gismgr/api/v1/"
poll_interval_secs = 10
language = "fr"
"#,
    );

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.base_url.value, "http://localhost:8080/gismgr/api/v1/");
    assert_eq!(config.base_url.source, ConfigSource::File);
    assert_eq!(config.poll_interval_secs.value, 10);
    assert_eq!(config.language.value, "fr");
    assert_eq!(config.token_margin_secs.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let file = config_file(
        r#"
base_url = "http://from-file/"
max_polls = 5
"#,
    );

    env::set_var("WAPOR_BASE_URL", "http://from-env/");
    env::set_var("WAPOR_MAX_POLLS", "50");
    env::set_var("WAPOR_TOKEN_MARGIN", "300");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.base_url.value, "http://from-env/");
    assert_eq!(config.base_url.source, ConfigSource::Environment);
    assert_eq!(config.max_polls.value, Some(50));
    assert_eq!(config.token_margin_secs.value, 300);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("WAPOR_POLL_INTERVAL", "soon");
    env::set_var("WAPOR_MAX_POLLS", "0");
    env::set_var("WAPOR_TOKEN_MARGIN", "-1");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.poll_interval_secs.value, 2);
    assert_eq!(config.poll_interval_secs.source, ConfigSource::Default);
    assert_eq!(config.max_polls.value, None);
    assert_eq!(config.token_margin_secs.value, 120);

    clear_env();
}

#[test]
#[serial]
fn test_oversized_environment_margin_is_ignored() {
    clear_env();
    env::set_var("WAPOR_TOKEN_MARGIN", "9223372036854775807");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.token_margin_secs.value, 120);
    assert_eq!(config.token_margin_secs.source, ConfigSource::Default);
    let options = config.client_options().unwrap();
    assert_eq!(options.token_margin, chrono::Duration::seconds(120));

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_environment() {
    clear_env();
    env::set_var("WAPOR_API_KEY", "env-key");
    env::set_var("WAPOR_BASE_URL", "http://from-env/");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    config.update_from_cli(CliConfigOverrides {
        base_url: Some("http://from-cli/".to_string()),
        api_key: None,
        max_polls: Some(7),
    });

    assert_eq!(config.base_url.value, "http://from-cli/");
    assert_eq!(config.base_url.source, ConfigSource::Cli);
    assert_eq!(config.api_key.value.as_deref(), Some("env-key"));
    assert_eq!(config.api_key.source, ConfigSource::Environment);

    let options = config.client_options().unwrap();
    assert_eq!(options.base_url, "http://from-cli/");
    assert_eq!(options.max_polls, Some(7));
    assert_eq!(options.request_timeout, None);

    clear_env();
}

#[test]
#[serial]
fn test_api_key_file_from_environment() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let key_path = dir.path().join("wapor_api_key.txt");
    fs::write(&key_path, "file-key\n").unwrap();
    env::set_var("WAPOR_API_KEY_FILE", &key_path);
    env::set_var("WAPOR_REQUEST_TIMEOUT", "30");

    let config = LayeredConfig::with_defaults().load_from_env();
    assert_eq!(config.resolve_api_key().unwrap().as_deref(), Some("file-key"));
    assert_eq!(
        config.client_options().unwrap().request_timeout,
        Some(Duration::from_secs(30))
    );

    clear_env();
}

#[test]
fn test_missing_api_key_file_is_io_error() {
    let mut config = LayeredConfig::with_defaults();
    config
        .api_key_file
        .update(Some("/nonexistent/wapor/key.txt".into()), ConfigSource::Cli);

    let err = config.resolve_api_key().unwrap_err();
    assert!(matches!(err, WaporError::Io { .. }));
}

#[test]
fn test_no_api_key_configured() {
    let config = LayeredConfig::with_defaults();
    assert_eq!(config.resolve_api_key().unwrap(), None);
}

#[test]
fn test_invalid_toml_file() {
    let file = config_file("base_url = [not toml");
    let result = LayeredConfig::with_defaults().load_from_file(file.path());
    assert!(matches!(result, Err(WaporError::ConfigInvalid { .. })));
}

#[test]
fn test_missing_config_file() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/wapor.toml");
    assert!(result.is_err());
}
