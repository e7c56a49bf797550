use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lake Erie phosphorus abatement planner", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Run configuration (TOML); flags override its values
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the service health payload
    Health,
    /// Solve an abatement plan
    Optimize {
        #[command(subcommand)]
        command: OptimizeCommands,
    },
    /// Plant table utilities
    Data {
        #[command(subcommand)]
        command: DataCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum OptimizeCommands {
    /// Cheapest plan meeting per-region concentration reductions
    Target {
        /// Reduction per region in ppb, upstream to downstream (comma-separated)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        targets: Option<Vec<f64>>,
        #[command(flatten)]
        policy: PolicyArgs,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Largest weighted reduction within an annual budget
    Budget {
        /// Annual budget in million CAD
        #[arg(long)]
        budget: Option<f64>,
        /// Region weights, normalized before use (comma-separated)
        #[arg(long, value_delimiter = ',')]
        weights: Option<Vec<f64>>,
        #[command(flatten)]
        policy: PolicyArgs,
        #[command(flatten)]
        run: RunArgs,
    },
}

/// Overrides for the `[policy]` section.
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Fraction of effluent phosphorus removed by an upgrade
    #[arg(long)]
    pub filter_efficiency: Option<f64>,
    /// Upgrade cost per thousand m³ of annual flow (million CAD)
    #[arg(long)]
    pub maintenance_cost: Option<f64>,
    /// Quadratic agricultural cost per region (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub agro_costs: Option<Vec<f64>>,
    /// Agricultural abatement cap per region in t/year (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub agro_capacity: Option<Vec<f64>>,
    /// Plants with a larger flow cannot be upgraded
    #[arg(long)]
    pub eligibility_threshold: Option<f64>,
}

/// Overrides for the `[model]`, `[solver]` and `[data]` sections, plus outputs.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Directory holding Lmat.csv and fvec.csv
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,
    /// Solver time limit in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,
    /// Initial linearization segments per squared term
    #[arg(long)]
    pub segments: Option<usize>,
    /// Relative gap accepted as optimal
    #[arg(long)]
    pub gap_tolerance: Option<f64>,
    /// Bound agricultural abatement by the configured capacity
    #[arg(long)]
    pub enforce_capacity: bool,
    /// Write the JSON response here instead of stdout
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub out: Option<PathBuf>,
    /// Also write the regional results as CSV
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub csv: Option<PathBuf>,
    /// Print a human-readable summary to stderr
    #[arg(long)]
    pub summary: bool,
}

#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Load the plant tables and report what they contain
    Validate {
        /// Directory holding Lmat.csv and fvec.csv
        #[arg(long, value_hint = ValueHint::DirPath)]
        data_dir: Option<PathBuf>,
    },
}
