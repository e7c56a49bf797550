//! Run configuration.
//!
//! [`ErieConfig`] collects policy knobs, model and solver options and the
//! location of the plant tables. Every section is optional in TOML; missing
//! values take their defaults.
//!
//! ```toml
//! [policy]
//! filter_efficiency = 0.6
//!
//! [model]
//! enforce_capacity = true
//!
//! [solver]
//! time_limit_seconds = 30.0
//!
//! [data]
//! dir = "inputdata"
//! ```

use std::path::{Path, PathBuf};

use erie_core::{ModelOptions, PolicyConfig, SolverSettings};
use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};
use crate::tables::{FLOWS_FILE, REGION_MAP_FILE};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErieConfig {
    pub policy: PolicyConfig,
    pub model: ModelOptions,
    pub solver: SolverSettings,
    pub data: DataConfig,
}

/// Where the plant tables live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub region_map_file: String,
    pub flows_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            region_map_file: REGION_MAP_FILE.into(),
            flows_file: FLOWS_FILE.into(),
        }
    }
}

impl DataConfig {
    pub fn region_map_path(&self) -> PathBuf {
        self.dir.join(&self.region_map_file)
    }

    pub fn flows_path(&self) -> PathBuf {
        self.dir.join(&self.flows_file)
    }
}

impl ErieConfig {
    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> DataResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| DataError::io(path, err))?;
        let mut config: Self = toml::from_str(&contents).map_err(|err| DataError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        // Relative data directories are resolved against the config file.
        if config.data.dir.is_relative() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.data.dir = parent.join(&config.data.dir);
            }
        }
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> DataResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> DataResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|err| DataError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        std::fs::write(path, contents).map_err(|err| DataError::io(path, err))
    }
}
