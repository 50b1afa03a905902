//! Cube command implementation

use crate::cli::CubeArgs;
use crate::config_loader;
use crate::output::OutputWriter;
use crate::output_types::CubeOutput;
use anyhow::{Context, Result};
use wapor_core::config::LayeredConfig;

pub fn execute(args: CubeArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut client = config_loader::connect(config, !output.is_json())?;
    let cube = client
        .resolve(&args.code, args.hint.version, args.hint.level)
        .with_context(|| format!("Failed to resolve cube {}", args.code))?;

    let info = CubeOutput::from(&cube);
    if output.is_json() {
        return output.result(info);
    }

    output.section(format!("{} ({})", info.code, cube.partition));
    output.kv("Caption", &info.caption);
    output.kv("Measure", &info.measure);
    output.kv("Unit", info.unit.as_deref().unwrap_or("-"));
    output.kv("Multiplier", info.multiplier);

    output.section("Dimensions");
    output.table(info.dimensions)
}
