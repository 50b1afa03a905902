//! Availability command implementation

use super::{availability_filter, time_range};
use crate::cli::AvailArgs;
use crate::config_loader;
use crate::output::OutputWriter;
use crate::output_types::{AvailOutput, AvailableRaster};
use crate::progress;
use anyhow::{Context, Result};
use wapor_core::config::LayeredConfig;

pub fn execute(args: AvailArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let range = time_range(&args.period)?;
    let filter = availability_filter(args.filter);
    let show_progress = !output.is_json();

    let mut client = config_loader::connect(config, show_progress)?;
    let cube = client
        .resolve(&args.code, args.hint.version, args.hint.level)
        .with_context(|| format!("Failed to resolve cube {}", args.code))?;

    let rasters = progress::with_spinner("Querying availability...", show_progress, || {
        client.list_available(&cube, &range, &filter)
    })
    .with_context(|| format!("Failed to list rasters of {} for {}", cube.code, range))?;

    if output.is_json() {
        return output.result(AvailOutput {
            cube: cube.code.clone(),
            workspace: cube.partition.to_string(),
            start: range.start(),
            end: range.end(),
            rasters,
        });
    }

    output.section(format!("{} rasters, {} to {}", cube.code, range.start(), range.end()));
    let count = rasters.len();
    output.table(rasters.iter().map(AvailableRaster::from).collect())?;
    output.info(format!("{} raster(s) available", count));
    Ok(())
}
