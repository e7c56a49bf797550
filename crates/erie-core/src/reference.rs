//! Lake Erie reference instance.
//!
//! Six lake segments ordered upstream to downstream: St. Clair River, Lake
//! St. Clair, Detroit River, Western Basin, Central Basin and Eastern Basin.
//! Plant membership and flows are not part of this module; they are loaded
//! from the `Lmat.csv` / `fvec.csv` tables by `erie-io`.

use crate::error::ErieResult;
use crate::watershed::{Region, SedimentationMatrix};

pub const REGION_NAMES: [&str; 6] = ["SCR", "LSC", "DR", "WB", "CB", "EB"];

/// Segment volumes, km³.
pub const VOLUMES_KM3: [f64; 6] = [0.4, 4.6, 0.4, 27.8, 318.7, 159.3];

/// Lower triangle of the sedimentation matrix, before the 1e-3 scaling.
const SEDIMENTATION_LOWER: [&[f64]; 6] = [
    &[6.25],
    &[4.92, 4.92],
    &[4.90, 4.90, 6.05],
    &[2.51, 2.51, 3.10, 3.10],
    &[0.73, 0.73, 0.90, 0.90, 1.48],
    &[0.36, 0.36, 0.44, 0.44, 0.73, 1.30],
];

const SEDIMENTATION_SCALE: f64 = 1e-3;

pub const AGRO_COSTS: [f64; 6] = [2.88e-2, 2.44e-3, 6.2e-2, 3.69e-2, 8.92e-3, 3.08e-3];

/// Relative importance of each segment in the budget-based objective.
pub const BUDGET_WEIGHTS: [f64; 6] = [1.0, 8.0, 1.0, 60.0, 600.0, 300.0];

pub const P_CONCENTRATION: f64 = 2.737;
pub const UNIT_CONVERSION: f64 = 1e-3;
pub const FILTER_EFFICIENCY: f64 = 0.4;
pub const MAINTENANCE_COST: f64 = 1e-4;
pub const ELIGIBILITY_THRESHOLD: f64 = 1e8;

/// Default annual budget, million CAD.
pub const DEFAULT_BUDGET: f64 = 500.0;

/// Central Basin reduction needed to cut its load by 212 t/year.
pub const CENTRAL_BASIN_TARGET_PPB: f64 = 212.0 / 318.7;

pub fn regions() -> Vec<Region> {
    REGION_NAMES
        .iter()
        .zip(VOLUMES_KM3)
        .enumerate()
        .map(|(idx, (name, volume))| Region::new(idx, *name, volume))
        .collect()
}

pub fn sedimentation() -> ErieResult<SedimentationMatrix> {
    let scaled: Vec<Vec<f64>> = SEDIMENTATION_LOWER
        .iter()
        .map(|row| row.iter().map(|v| v * SEDIMENTATION_SCALE).collect())
        .collect();
    let triangle: Vec<&[f64]> = scaled.iter().map(Vec::as_slice).collect();
    SedimentationMatrix::from_lower_triangle(&triangle)
}

/// Zero everywhere except the Central Basin.
pub fn default_targets() -> Vec<f64> {
    REGION_NAMES
        .iter()
        .map(|name| if *name == "CB" { CENTRAL_BASIN_TARGET_PPB } else { 0.0 })
        .collect()
}
