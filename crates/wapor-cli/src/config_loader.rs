//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use console::Term;
use dialoguer::Password;
use std::path::PathBuf;
use wapor_core::config::{CliConfigOverrides, LayeredConfig};
use wapor_core::WaporClient;

use crate::cli::Cli;
use crate::errors;
use crate::progress;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "wapor.toml";

/// Load defaults, then the config file, the environment and CLI flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_file(cli) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(CliConfigOverrides {
        base_url: cli.base_url.clone(),
        api_key: cli.api_key.clone(),
        max_polls: cli.max_polls,
    });
    Ok(config)
}

/// Explicit `--config`, otherwise `./wapor.toml` if it exists
pub fn config_file(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(|| {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.is_file().then_some(local)
    })
}

/// Sign in with the configured API key, prompting for one on a terminal
pub fn connect(config: &LayeredConfig, show_progress: bool) -> Result<WaporClient> {
    let api_key = match config.resolve_api_key().context("Failed to read the API key")? {
        Some(key) => key,
        None => prompt_api_key()?,
    };
    let options = config.client_options()?;

    progress::with_spinner("Signing in to WaPOR...", show_progress, || {
        WaporClient::connect(&api_key, options)
    })
    .context("Failed to sign in")
}

fn prompt_api_key() -> Result<String> {
    if !Term::stderr().is_term() {
        return Err(errors::api_key_missing().into());
    }
    let key: String = Password::new().with_prompt("WaPOR API key").interact()?;
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(errors::api_key_missing().into());
    }
    Ok(key)
}
