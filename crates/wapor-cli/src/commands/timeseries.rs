//! Timeseries command implementation

use super::time_range;
use crate::cli::TimeseriesArgs;
use crate::config_loader;
use crate::output::OutputWriter;
use crate::output_types::TimeseriesOutput;
use crate::progress;
use anyhow::{bail, Context, Result};
use wapor_core::config::LayeredConfig;
use wapor_core::models::AreaShape;

pub fn execute(args: TimeseriesArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let range = time_range(&args.period)?;
    let shape = match &args.shape {
        Some(path) => Some(
            AreaShape::from_geojson_file(path)
                .with_context(|| format!("Failed to read area from {}", path.display()))?,
        ),
        None => None,
    };
    let show_progress = !output.is_json();

    let mut client = config_loader::connect(config, show_progress)?;
    let cube = client
        .resolve(&args.code, args.hint.version, args.hint.level)
        .with_context(|| format!("Failed to resolve cube {}", args.code))?;

    let table = match (args.point, shape) {
        (Some(point), _) => progress::with_spinner("Computing pixel time series...", show_progress, || {
            client.pixel_timeseries(&point, &cube, &range)
        }),
        (None, Some(shape)) => progress::with_spinner("Computing area statistics...", show_progress, || {
            client.area_timeseries(&shape, &cube, &range)
        }),
        (None, None) => bail!("Give a --point or a --shape"),
    }
    .with_context(|| format!("Time series of {} failed", cube.code))?;

    let result = TimeseriesOutput {
        cube: cube.code.clone(),
        multiplier: cube.multiplier(),
        unit: cube.measure.unit.clone(),
        start: range.start(),
        end: range.end(),
        table,
    };
    if output.is_json() {
        return output.result(result);
    }

    output.section(format!("{} from {} to {}", result.cube, result.start, result.end));
    output.grid(&result.table.header, &result.table.rows);
    match result.unit.as_deref() {
        Some(unit) => output.info(format!("Multiplier {} ({})", result.multiplier, unit)),
        None => output.info(format!("Multiplier {}", result.multiplier)),
    }
    Ok(())
}
