//! WaPOR CLI - Command-line interface
//!
//! Thin front end over `wapor-core`: argument parsing, configuration
//! loading and output formatting live here, everything that talks to the
//! API lives in the core crate.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod output;
mod output_types;
mod progress;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Results go to stdout, so only warnings are logged unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match commands::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let error = errors::from_anyhow(error);
            if json {
                error.display_json();
            } else {
                error.display();
            }
            ExitCode::FAILURE
        }
    }
}
