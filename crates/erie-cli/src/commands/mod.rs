pub mod data;
pub mod health;
pub mod optimize;

use std::path::Path;

use anyhow::{Context, Result};
use erie_core::reference;
use erie_core::Watershed;
use erie_io::{load_watershed_from, ErieConfig};

/// Config from `--config`, or defaults when none was given.
pub fn load_config(path: Option<&Path>) -> Result<ErieConfig> {
    ErieConfig::load_or_default(path)
        .with_context(|| format!("loading configuration from {}", describe(path)))
}

/// The configured plant tables on top of the Lake Erie regions.
pub fn load_watershed(config: &ErieConfig) -> Result<Watershed> {
    let region_map = config.data.region_map_path();
    let flows = config.data.flows_path();
    let sedimentation = reference::sedimentation()?;
    load_watershed_from(&region_map, &flows, reference::regions(), sedimentation).with_context(
        || {
            format!(
                "loading plant tables {} and {}",
                region_map.display(),
                flows.display()
            )
        },
    )
}

fn describe(path: Option<&Path>) -> String {
    path.map_or_else(|| "defaults".to_string(), |p| p.display().to_string())
}

/// Pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output to JSON")?;
    println!("{json}");
    Ok(())
}
