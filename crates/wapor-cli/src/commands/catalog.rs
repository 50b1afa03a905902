//! Catalog command implementation

use crate::cli::CatalogArgs;
use crate::config_loader;
use crate::output::OutputWriter;
use crate::output_types::CubeRow;
use anyhow::{Context, Result};
use wapor_core::config::LayeredConfig;
use wapor_core::models::{CubeSummary, Partition};

pub fn execute(args: CatalogArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let partition = Partition::new(args.version, args.level)?;
    let mut client = config_loader::connect(config, !output.is_json())?;

    let cubes = client
        .catalog(&partition)
        .with_context(|| format!("Failed to list cubes of {}", partition))?;
    let total = cubes.len();

    let rows: Vec<CubeRow> = cubes
        .into_iter()
        .filter(|cube| matches_filter(cube, args.filter.as_deref()))
        .map(CubeRow::from)
        .collect();

    if !output.is_json() {
        output.section(format!("Cubes in {}", partition));
    }
    let shown = rows.len();
    output.table(rows)?;

    if args.filter.is_some() {
        output.info(format!("{} of {} cubes match", shown, total));
    }
    Ok(())
}

/// Case-insensitive substring match on code or caption
fn matches_filter(cube: &CubeSummary, filter: Option<&str>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let needle = filter.to_lowercase();
    cube.code.to_lowercase().contains(&needle) || cube.caption.to_lowercase().contains(&needle)
}
