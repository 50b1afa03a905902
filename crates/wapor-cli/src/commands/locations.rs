use crate::cli::LocationsArgs;
use crate::config_loader;
use crate::output::OutputWriter;
use crate::output_types::LocationRow;
use anyhow::{Context, Result};
use wapor_core::config::LayeredConfig;

pub fn execute(args: LocationsArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut client = config_loader::connect(config, !output.is_json())?;
    let locations = client
        .locations(args.version, args.level)
        .context("Failed to fetch the location table")?;

    if !output.is_json() {
        match args.level {
            Some(level) => output.section(format!("Locations covered at level {}", level)),
            None => output.section("Locations"),
        }
    }
    output.table(locations.into_iter().map(LocationRow::from).collect())
}
