//! Command implementations

mod avail;
mod catalog;
mod config;
mod cube;
mod download;
mod locations;
mod timeseries;
mod workspaces;

use crate::cli::{Cli, Commands, FilterArgs, PeriodArgs};
use crate::config_loader;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use wapor_core::models::{AvailabilityFilter, TimeRange};

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_file = config_loader::config_file(&cli);
    let config = config_loader::load_config(&cli)?;

    match cli.command {
        Commands::Catalog(args) => catalog::execute(args, &config, &output),
        Commands::Cube(args) => cube::execute(args, &config, &output),
        Commands::Avail(args) => avail::execute(args, &config, &output),
        Commands::Download(args) => download::execute(args, &config, &output),
        Commands::Timeseries(args) => timeseries::execute(args, &config, &output),
        Commands::Locations(args) => locations::execute(args, &config, &output),
        Commands::Workspaces => workspaces::execute(&config, &output),
        Commands::Config => config::execute(config_file.as_deref(), &config, &output),
    }
}

fn time_range(period: &PeriodArgs) -> Result<TimeRange> {
    TimeRange::new(period.start, period.end)
        .with_context(|| format!("Invalid period {} .. {}", period.start, period.end))
}

fn availability_filter(args: FilterArgs) -> AvailabilityFilter {
    AvailabilityFilter {
        location: args.location,
        season: args.season,
        stage: args.stage,
    }
}
