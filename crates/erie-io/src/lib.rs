//! # erie-io: Data In and Out of the Planner
//!
//! - [`tables`] - load and validate `Lmat.csv` / `fvec.csv` into a
//!   [`Watershed`](erie_core::Watershed)
//! - [`config`] - TOML run configuration ([`ErieConfig`])
//! - [`export`] - regional result CSV
//!
//! Errors are [`DataError`], which converts into
//! [`ErieError`](erie_core::ErieError): missing files become I/O errors,
//! malformed tables become data errors.

pub mod config;
pub mod error;
pub mod export;
pub mod tables;

pub use config::{DataConfig, ErieConfig};
pub use error::{DataError, DataResult};
pub use export::{format_significant, write_plan_csv, write_record_csv, RESULT_HEADER};
pub use tables::{
    load_flows, load_reference_watershed, load_region_map, load_watershed, load_watershed_from,
    DataSummary, FlowTable, FLOWS_FILE, REGION_MAP_FILE,
};
