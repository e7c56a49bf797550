use std::path::Path;

use anyhow::{Context, Result};
use erie_algo::derive_for;
use erie_cli::cli::DataCommands;
use erie_io::DataSummary;
use tracing::info;

use super::{load_config, load_watershed, print_json};

pub fn handle(command: &DataCommands, config_path: Option<&Path>) -> Result<()> {
    let DataCommands::Validate { data_dir } = command;
    let mut config = load_config(config_path)?;
    if let Some(dir) = data_dir {
        config.data.dir = dir.clone();
    }

    let watershed = load_watershed(&config)?;
    // Flows and policy must also be usable for parameter derivation.
    let derived = derive_for(&watershed, &config.policy).context("validating plant flows")?;
    info!(
        plants = watershed.n_plants(),
        eligible = derived.num_eligible(),
        "plant tables are valid"
    );

    print_json(&DataSummary::of(
        &watershed,
        config.policy.eligibility_threshold,
    ))
}
