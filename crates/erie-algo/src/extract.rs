//! Turns a raw solver assignment into a [`SolutionRecord`].

use erie_core::{ensure_len, ErieError, ErieResult, PartsPerBillion, Tonnes, Watershed};
use erie_solver_common::SolutionStatus;
use std::time::Duration;
use tracing::debug;

use crate::model::{check_shapes, ModelMode};
use crate::params::DerivedParams;
use crate::solution::{Plan, PlanTotals, RegionalOutcome, SolutionRecord, UpgradeDecision};

/// Solver assignment split into agricultural and upgrade decisions.
#[derive(Debug, Clone, Copy)]
pub struct RawAssignment<'a> {
    pub status: SolutionStatus,
    pub objective: Option<f64>,
    pub agro: &'a [f64],
    pub upgrades: &'a [f64],
    pub solve_time: Duration,
}

/// Builds the plan from a solver assignment.
///
/// Statuses without a solution yield a status-only record. Otherwise every
/// upgrade value must lie within `tolerance` of 0 or 1, and ineligible plants
/// must not be upgraded.
pub fn extract(
    raw: RawAssignment<'_>,
    mode: ModelMode,
    derived: &DerivedParams,
    watershed: &Watershed,
    tolerance: f64,
) -> ErieResult<SolutionRecord> {
    if !raw.status.has_solution() {
        return Ok(SolutionRecord::status_only(mode, raw.status, raw.solve_time));
    }

    check_shapes(derived, watershed)?;
    let n_regions = watershed.n_regions();
    let n_plants = watershed.n_plants();
    ensure_len("agricultural assignment", n_regions, raw.agro.len())?;
    ensure_len("upgrade assignment", n_plants, raw.upgrades.len())?;
    let objective = raw
        .objective
        .ok_or_else(|| ErieError::Solver(format!("status {} without objective", raw.status)))?;

    let x = agro_levels(raw.agro, watershed, tolerance)?;
    let w = round_upgrades(raw.upgrades, derived, watershed, tolerance)?;

    let region_map = watershed.region_map();
    let upgrade_counts = region_map.aggregate(&w)?;
    let delivered: Vec<f64> = derived
        .plant_abatement
        .iter()
        .zip(&w)
        .map(|(f, w)| f * w)
        .collect();
    let wwtp_abatement = region_map.aggregate(&delivered)?;

    let mut reduction = watershed.sedimentation().mul_vec(&x)?;
    for (r, z) in reduction.iter_mut().enumerate() {
        *z += derived.upgrade_effect[r]
            .iter()
            .zip(&w)
            .map(|(coef, w)| coef * w)
            .sum::<f64>();
    }

    let regions: Vec<RegionalOutcome> = watershed
        .regions()
        .iter()
        .enumerate()
        .map(|(r, region)| {
            let concentration_delta = PartsPerBillion(reduction[r]);
            RegionalOutcome {
                region: region.name.clone(),
                agro_abatement: Tonnes(x[r]),
                wwtp_abatement: Tonnes(wwtp_abatement[r]),
                wwtp_upgrades: upgrade_counts[r].round() as usize,
                concentration_delta,
                load_delta: concentration_delta * region.volume,
            }
        })
        .collect();

    let upgrades: Vec<UpgradeDecision> = watershed
        .plants()
        .iter()
        .enumerate()
        .map(|(j, plant)| UpgradeDecision {
            plant: plant.name.clone(),
            region: watershed.regions()[plant.region.index()].name.clone(),
            upgraded: w[j] > 0.5,
            cost: derived.upgrade_cost[j] * w[j],
            abatement: Tonnes(delivered[j]),
        })
        .collect();

    let agro_total: Tonnes = regions.iter().map(|r| r.agro_abatement).sum();
    let wwtp_total: Tonnes = regions.iter().map(|r| r.wwtp_abatement).sum();
    let totals = PlanTotals {
        agro_abatement: agro_total,
        wwtp_abatement: wwtp_total,
        wwtp_upgrades: regions.iter().map(|r| r.wwtp_upgrades).sum(),
        total_abatement: agro_total + wwtp_total,
    };

    let plan_cost = x
        .iter()
        .zip(&derived.agro_cost)
        .map(|(x, a)| a * x * x)
        .sum::<f64>()
        + upgrades.iter().map(|u| u.cost).sum::<f64>();

    debug!(
        status = %raw.status,
        objective,
        plan_cost,
        upgrades = totals.wwtp_upgrades,
        "extracted plan"
    );

    Ok(SolutionRecord {
        mode,
        status: raw.status,
        solve_time: raw.solve_time,
        plan: Some(Plan {
            objective,
            plan_cost,
            regions,
            upgrades,
            totals,
        }),
    })
}

/// Clamps solver noise below zero; anything more negative than `tolerance` is an error.
fn agro_levels(agro: &[f64], watershed: &Watershed, tolerance: f64) -> ErieResult<Vec<f64>> {
    agro.iter()
        .zip(watershed.regions())
        .map(|(&value, region)| {
            if !value.is_finite() || value < -tolerance {
                Err(ErieError::extraction(
                    format!("x_{}", region.name),
                    value,
                    "agricultural abatement must be nonnegative",
                ))
            } else {
                Ok(value.max(0.0))
            }
        })
        .collect()
}

fn round_upgrades(
    upgrades: &[f64],
    derived: &DerivedParams,
    watershed: &Watershed,
    tolerance: f64,
) -> ErieResult<Vec<f64>> {
    upgrades
        .iter()
        .zip(watershed.plants())
        .enumerate()
        .map(|(j, (&value, plant))| {
            let rounded = if value >= 0.5 { 1.0 } else { 0.0 };
            if !value.is_finite() || (value - rounded).abs() > tolerance {
                return Err(ErieError::extraction(
                    format!("w_{}", plant.name),
                    value,
                    format!("not within {tolerance} of 0 or 1"),
                ));
            }
            if rounded > derived.upgrade_bound(j) {
                return Err(ErieError::extraction(
                    format!("w_{}", plant.name),
                    value,
                    "plant is not eligible for an upgrade",
                ));
            }
            Ok(rounded)
        })
        .collect()
}
