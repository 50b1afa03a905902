//! Download command implementation
//!
//! Lists the rasters available for a cube, then crops each one to the
//! requested box on the server and streams the resulting GeoTIFF to disk.
//! A raster that fails is reported and skipped; `manifest.json` records what
//! was written, what failed and the factor that turns stored pixel values
//! into physical units.

use super::{availability_filter, time_range};
use crate::cli::DownloadArgs;
use crate::config_loader;
use crate::output::OutputWriter;
use crate::output_types::{
    DownloadManifest, DownloadPlan, DownloadedRaster, FailedRaster, PlannedRaster,
};
use crate::progress;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fs;
use wapor_core::config::LayeredConfig;
use wapor_core::models::{AvailabilityRow, BoundingBox, CubeDescriptor, TimeRange};
use wapor_core::products::{self, Resolution};

pub const MANIFEST_FILE: &str = "manifest.json";

pub fn execute(args: DownloadArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let code = match (&args.code, args.product) {
        (Some(code), _) => code.clone(),
        (None, Some(product)) => products::cube_code(
            product,
            args.hint.level.unwrap_or(1),
            args.resolution.unwrap_or(Resolution::Dekadal),
        )?,
        (None, None) => bail!("Give a cube code or --product"),
    };
    let range = time_range(&args.period)?;
    let filter = availability_filter(args.filter);
    let show_progress = !output.is_json();

    let mut client = config_loader::connect(config, show_progress)?;
    let cube = client
        .resolve(&code, args.hint.version, args.hint.level)
        .with_context(|| format!("Failed to resolve cube {}", code))?;

    let rows = progress::with_spinner("Querying availability...", show_progress, || {
        client.list_available(&cube, &range, &filter)
    })
    .with_context(|| format!("Failed to list rasters of {} for {}", cube.code, range))?;

    let planned: Vec<(AvailabilityRow, String)> = rows
        .into_iter()
        .map(|row| {
            let file = raster_file_name(&cube, &row);
            (row, file)
        })
        .collect();

    if args.dry_run {
        let plan = DownloadPlan {
            dry_run: true,
            cube: cube.code.clone(),
            output_dir: args.output.display().to_string(),
            rasters: planned
                .iter()
                .map(|(row, file)| PlannedRaster {
                    raster_id: row.raster_id.clone(),
                    time_caption: row.time_caption.clone(),
                    file: file.clone(),
                })
                .collect(),
        };
        if output.is_json() {
            return output.result(plan);
        }
        output.section(format!("Would download {} raster(s) to {}", plan.rasters.len(), plan.output_dir));
        output.table(plan.rasters)?;
        output.info("Dry run: nothing was cropped or downloaded");
        return Ok(());
    }

    if planned.is_empty() {
        output.warning(format!("No {} rasters available between {} and {}", cube.code, range.start(), range.end()));
        return Ok(());
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output.display()))?;

    let pb = progress::create_progress_bar(planned.len() as u64, &format!("Downloading {}", cube.code), show_progress);
    let mut downloaded = Vec::new();
    let mut failures = Vec::new();

    for (row, file) in &planned {
        pb.set_message(format!("{} {}", cube.code, row.time_caption));
        let path = args.output.join(file);

        let result = client
            .crop_raster(&args.bbox, &cube, row)
            .and_then(|url| client.transport().download_to(&url, &path));

        match result {
            Ok(bytes) => {
                tracing::info!(raster = %row.raster_id, file = %path.display(), bytes, "raster saved");
                downloaded.push(DownloadedRaster {
                    raster_id: row.raster_id.clone(),
                    time_code: row.time_code.clone(),
                    file: file.clone(),
                    bytes,
                });
            }
            Err(err) => {
                tracing::warn!(raster = %row.raster_id, error = %err, "raster skipped");
                pb.suspend(|| output.warning(format!("{}: {}", row.raster_id, err)));
                failures.push(FailedRaster {
                    raster_id: row.raster_id.clone(),
                    time_code: row.time_code.clone(),
                    error: err.to_string(),
                });
            }
        }
        pb.inc(1);
    }

    let summary = format!("{} of {} raster(s) downloaded", downloaded.len(), planned.len());
    if failures.is_empty() {
        progress::finish_success(&pb, &summary);
    } else {
        progress::finish_with_failures(&pb, &summary);
    }

    let manifest = manifest(&cube, &args.bbox, &range, downloaded, failures);
    let manifest_path = args.output.join(MANIFEST_FILE);
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    if manifest.rasters.is_empty() {
        bail!("All {} raster downloads failed, see {}", manifest.failures.len(), manifest_path.display());
    }

    if output.is_json() {
        return output.result(&manifest);
    }
    output.success(format!("{} to {}", summary, args.output.display()));
    if let Some(unit) = manifest.unit.as_deref() {
        output.info(format!("Multiply pixel values by {} to get {}", manifest.multiplier, unit));
    } else {
        output.info(format!("Multiply pixel values by {}", manifest.multiplier));
    }
    Ok(())
}

fn manifest(
    cube: &CubeDescriptor,
    bbox: &BoundingBox,
    range: &TimeRange,
    rasters: Vec<DownloadedRaster>,
    failures: Vec<FailedRaster>,
) -> DownloadManifest {
    DownloadManifest {
        cube: cube.code.clone(),
        caption: cube.caption.clone(),
        workspace: cube.partition.workspace_code().to_string(),
        level: cube.partition.level(),
        measure: cube.measure.code.clone(),
        unit: cube.measure.unit.clone(),
        multiplier: cube.multiplier(),
        start: range.start(),
        end: range.end(),
        bbox: [bbox.xmin, bbox.ymin, bbox.xmax, bbox.ymax],
        created_at: Utc::now(),
        rasters,
        failures,
    }
}

/// Local file name for one raster; codes outside the `L{n}_..._{R}` scheme
/// fall back to the raster id
fn raster_file_name(cube: &CubeDescriptor, row: &AvailabilityRow) -> String {
    match products::parse_cube_code(&cube.code) {
        Some((level, resolution)) => products::output_file_name(
            product_segment(&cube.code),
            cube.partition.version(),
            level,
            resolution.period_name(),
            &row.raster_id,
        ),
        None => format!("{}.tif", row.raster_id),
    }
}

/// `AETI` out of `L1_AETI_D`, `ODN_AETI` out of `L3_ODN_AETI_D`
fn product_segment(code: &str) -> &str {
    code.split_once('_')
        .map(|(_, rest)| rest.rsplit_once('_').map_or(rest, |(product, _)| product))
        .unwrap_or(code)
}
