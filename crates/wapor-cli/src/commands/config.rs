//! Config command implementation

use crate::output::OutputWriter;
use crate::output_types::ConfigEntry;
use anyhow::Result;
use std::path::Path;
use wapor_core::config::LayeredConfig;

pub fn execute(config_file: Option<&Path>, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry {
            key,
            value,
            source: format!("{:?}", source).to_lowercase(),
        })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    let file = config_file.map(|p| p.display().to_string());
    if output.is_json() {
        return output.result(serde_json::json!({
            "config_file": file,
            "values": entries,
        }));
    }

    output.section("Configuration");
    output.kv("Config file", file.as_deref().unwrap_or("none"));
    output.table(entries)
}
