use crate::config_loader;
use crate::output::OutputWriter;
use crate::output_types::WorkspaceRow;
use anyhow::{Context, Result};
use wapor_core::config::LayeredConfig;

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let client = config_loader::connect(config, !output.is_json())?;
    let workspaces = client.workspaces().context("Failed to list workspaces")?;
    output.table(workspaces.into_iter().map(WorkspaceRow::from).collect())
}
