//! Plan data structures
//!
//! Defines the output handed back to callers after a solve.

use erie_core::{ErieError, ErieResult, PartsPerBillion, Tonnes};
use erie_solver_common::SolutionStatus;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::ModelMode;

/// Upgrade decision for one treatment plant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDecision {
    /// Plant name
    pub plant: String,
    /// Region the plant discharges into
    pub region: String,
    /// Whether the plant is upgraded
    pub upgraded: bool,
    /// Annualized cost of the upgrade, zero when not upgraded
    pub cost: f64,
    /// Abatement delivered by the upgrade, zero when not upgraded
    pub abatement: Tonnes,
}

/// Outcome of a plan in one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalOutcome {
    pub region: String,
    /// Agricultural abatement `x_r`
    pub agro_abatement: Tonnes,
    /// Abatement from upgraded plants in the region, `(L F w)_r`
    pub wwtp_abatement: Tonnes,
    /// Upgraded plants in the region, `(L w)_r`
    pub wwtp_upgrades: usize,
    /// Concentration reduction, `(S x + W w)_r`
    pub concentration_delta: PartsPerBillion,
    /// Concentration reduction times segment volume
    pub load_delta: Tonnes,
}

impl RegionalOutcome {
    pub fn total_abatement(&self) -> Tonnes {
        self.agro_abatement + self.wwtp_abatement
    }
}

/// Watershed-wide totals
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanTotals {
    pub agro_abatement: Tonnes,
    pub wwtp_abatement: Tonnes,
    pub wwtp_upgrades: usize,
    pub total_abatement: Tonnes,
}

/// A feasible plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Solver objective: cost (target mode) or weighted reduction (budget mode)
    pub objective: f64,
    /// Annual spend `xᵀ A x + bᵀ w`
    pub plan_cost: f64,
    /// Regional outcomes in upstream-to-downstream order
    pub regions: Vec<RegionalOutcome>,
    /// Decisions for every plant, in reference-data order
    pub upgrades: Vec<UpgradeDecision>,
    pub totals: PlanTotals,
}

impl Plan {
    pub fn region(&self, name: &str) -> Option<&RegionalOutcome> {
        self.regions.iter().find(|r| r.region == name)
    }

    pub fn upgraded_plants(&self) -> Vec<&str> {
        self.upgrades
            .iter()
            .filter(|u| u.upgraded)
            .map(|u| u.plant.as_str())
            .collect()
    }
}

/// Result of one planning request
///
/// Infeasible, unbounded and errored solves carry only their status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub mode: ModelMode,
    pub status: SolutionStatus,
    pub solve_time: Duration,
    pub plan: Option<Plan>,
}

impl SolutionRecord {
    pub fn status_only(mode: ModelMode, status: SolutionStatus, solve_time: Duration) -> Self {
        Self {
            mode,
            status,
            solve_time,
            plan: None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.plan.is_some()
    }

    /// The plan, or a solver-status error when there is none.
    pub fn require_plan(&self) -> ErieResult<&Plan> {
        self.plan.as_ref().ok_or_else(|| ErieError::SolverStatus {
            status: self.status.to_string(),
        })
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("{} Plan Summary\n{}\n", self.mode, "=".repeat(40)));
        s.push_str(&format!("Status: {}\n", self.status));
        s.push_str(&format!("Solve Time: {:.2?}\n", self.solve_time));

        let Some(plan) = &self.plan else {
            s.push_str("No feasible plan\n");
            return s;
        };

        s.push_str(&format!(
            "Objective: {:.4} {}\n",
            plan.objective,
            self.mode.objective_units()
        ));
        s.push_str(&format!("Plan Cost: {:.4} million CAD/year\n", plan.plan_cost));
        s.push_str(&format!(
            "Abatement: {} (agro {}, WWTP {})\n",
            plan.totals.total_abatement, plan.totals.agro_abatement, plan.totals.wwtp_abatement
        ));
        s.push_str(&format!("WWTP Upgrades: {}\n", plan.totals.wwtp_upgrades));

        s.push_str("\nRegions:\n");
        for r in &plan.regions {
            s.push_str(&format!(
                "  {:<4} agro {:>10.4}  wwtp {:>10.4}  upgrades {:>3}  Δppb {:>8.4}  Δload {:>10.4}\n",
                r.region,
                r.agro_abatement.value(),
                r.wwtp_abatement.value(),
                r.wwtp_upgrades,
                r.concentration_delta.value(),
                r.load_delta.value()
            ));
        }
        s
    }
}
