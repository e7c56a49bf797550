//! # erie-core: Watershed Model Core
//!
//! Data structures shared by every stage of phosphorus abatement planning.
//!
//! ## Core Data Structures
//!
//! - [`Watershed`] - Regions, sedimentation matrix and treatment plants
//! - [`SedimentationMatrix`] - Lower-triangular transfer between regions
//! - [`RegionPlantMap`] - Which region each plant discharges into
//! - [`PolicyConfig`] - Caller-tunable economic parameters
//! - [`ErieError`] - Error taxonomy returned at every public boundary
//!
//! ## Modules
//!
//! - [`reference`] - The six-segment Lake Erie instance
//! - [`units`] - Tonnes, ppb and km³ newtypes
//!
//! ## Integration with erie-io
//!
//! The erie-io crate loads plant membership and flows from CSV tables and
//! combines them with [`reference`] data into a [`Watershed`].

pub mod config;
pub mod error;
pub mod reference;
pub mod units;
pub mod watershed;

pub use config::{ModelOptions, PolicyConfig, SolverSettings};
pub use error::{ensure_finite, ensure_len, ErieError, ErieResult};
pub use units::{CubicKilometres, PartsPerBillion, Tonnes};
pub use watershed::{
    PlantId, Region, RegionId, RegionPlantMap, SedimentationMatrix, TreatmentPlant, Watershed,
};
