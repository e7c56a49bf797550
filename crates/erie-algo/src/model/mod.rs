//! Optimization model assembly.
//!
//! Both variants share the same decision variables and the same reduction
//! and cost expressions:
//!
//! - `x_i >= 0`: agricultural abatement in region `i`
//! - `w_j ∈ {0, 1}`: upgrade plant `j`, forced to 0 when the plant is ineligible
//! - reduction in region `r`: `(S x + W w)_r`
//! - annual cost: `xᵀ A x + bᵀ w`
//!
//! [`target::build_target`] minimizes cost subject to per-region reduction
//! targets; [`budget::build_budget`] maximizes weighted reduction subject to a
//! cost ceiling.
//!
//! Each `x_i` also carries an implied upper bound that no optimal plan can
//! exceed. Secant-based adapters need finite bounds on squared variables.

pub mod budget;
pub mod target;

pub use budget::{build_budget, BudgetWeights};
pub use target::build_target;

use erie_core::{ensure_len, ErieResult, ModelOptions, Watershed};
use erie_solver_common::{LinearExpr, ProblemDescription, QuadraticExpr, VariableId, VariableSpec};
use serde::{Deserialize, Serialize};

use crate::params::DerivedParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelMode {
    /// Minimize cost subject to reduction targets.
    Target,
    /// Maximize weighted reduction subject to a budget.
    Budget,
}

impl ModelMode {
    pub fn label(&self) -> &'static str {
        match self {
            ModelMode::Target => "Target-Based",
            ModelMode::Budget => "Budget-Based",
        }
    }

    pub fn objective_units(&self) -> &'static str {
        match self {
            ModelMode::Target => "million CAD/year",
            ModelMode::Budget => "ppb (weighted average)",
        }
    }
}

impl std::fmt::Display for ModelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Handles to the decision variables inside a built problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVariables {
    /// One per region.
    pub agro: Vec<VariableId>,
    /// One per plant.
    pub upgrades: Vec<VariableId>,
}

impl ModelVariables {
    /// Splits a solver assignment into `(x, w)`.
    pub fn split(&self, values: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let pick = |ids: &[VariableId]| -> Vec<f64> {
            ids.iter().map(|id| values[id.index()]).collect()
        };
        (pick(&self.agro), pick(&self.upgrades))
    }
}

/// A solver-ready problem plus the metadata needed to read its solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltModel {
    pub mode: ModelMode,
    pub problem: ProblemDescription,
    pub variables: ModelVariables,
    /// Budget ceiling, budget mode only.
    pub budget: Option<f64>,
}

/// Adds `x` and `w` to `problem`.
///
/// `implied_bound(i)` is the largest useful value of `x_i`; a configured
/// capacity tightens it further when `options.enforce_capacity` is set.
fn declare_variables(
    problem: &mut ProblemDescription,
    derived: &DerivedParams,
    watershed: &Watershed,
    options: &ModelOptions,
    implied_bound: impl Fn(usize) -> f64,
) -> ModelVariables {
    let capacity = derived
        .agro_capacity
        .as_ref()
        .filter(|_| options.enforce_capacity);

    let agro = watershed
        .regions()
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let mut upper = implied_bound(i);
            if let Some(cap) = capacity {
                upper = upper.min(cap[i]);
            }
            problem.add_variable(VariableSpec::continuous(
                format!("x_{}", region.name),
                0.0,
                upper,
            ))
        })
        .collect();

    let upgrades = watershed
        .plants()
        .iter()
        .enumerate()
        .map(|(j, plant)| {
            problem.add_variable(VariableSpec::integer(
                format!("w_{}", plant.name),
                0.0,
                derived.upgrade_bound(j),
            ))
        })
        .collect();

    ModelVariables { agro, upgrades }
}

/// `(S x + W w)_r` for every region `r`.
fn reduction_rows(
    derived: &DerivedParams,
    watershed: &Watershed,
    vars: &ModelVariables,
) -> Vec<LinearExpr> {
    let s = watershed.sedimentation();
    (0..watershed.n_regions())
        .map(|r| {
            let mut row = LinearExpr::new();
            for (i, x) in vars.agro.iter().enumerate().take(r + 1) {
                row.add_term(*x, s.get(r, i));
            }
            for (j, w) in vars.upgrades.iter().enumerate() {
                row.add_term(*w, derived.upgrade_effect[r][j]);
            }
            row
        })
        .collect()
}

/// `xᵀ A x + bᵀ w`.
fn cost_expression(derived: &DerivedParams, vars: &ModelVariables) -> QuadraticExpr {
    let mut cost = QuadraticExpr::new();
    for (x, a) in vars.agro.iter().zip(&derived.agro_cost) {
        cost.add_square(*x, *a);
    }
    for (w, b) in vars.upgrades.iter().zip(&derived.upgrade_cost) {
        cost.add_term(*w, *b);
    }
    cost
}

/// Checks that `derived` was computed for `watershed`.
pub(crate) fn check_shapes(derived: &DerivedParams, watershed: &Watershed) -> ErieResult<()> {
    let (n_regions, n_plants) = (watershed.n_regions(), watershed.n_plants());
    ensure_len("derived agro costs", n_regions, derived.n_regions())?;
    ensure_len("derived plant abatement", n_plants, derived.n_plants())?;
    ensure_len("derived upgrade costs", n_plants, derived.upgrade_cost.len())?;
    ensure_len("derived eligibility", n_plants, derived.eligible.len())?;
    ensure_len("derived upgrade effect rows", n_regions, derived.upgrade_effect.len())?;
    for row in &derived.upgrade_effect {
        ensure_len("derived upgrade effect", n_plants, row.len())?;
    }
    if let Some(capacity) = &derived.agro_capacity {
        ensure_len("derived agro capacity", n_regions, capacity.len())?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use erie_core::{PolicyConfig, Region, RegionId, RegionPlantMap, SedimentationMatrix, Watershed};

    /// Three regions, four plants; plant `p3` carries most of the flow.
    pub fn watershed() -> Watershed {
        let regions = vec![
            Region::new(0, "UP", 1.0),
            Region::new(1, "MID", 10.0),
            Region::new(2, "LOW", 100.0),
        ];
        let s = SedimentationMatrix::from_lower_triangle(&[&[0.5], &[0.2, 0.4], &[0.1, 0.1, 0.3]])
            .unwrap();
        let map = RegionPlantMap::from_assignments(
            3,
            vec![
                RegionId::new(0),
                RegionId::new(1),
                RegionId::new(1),
                RegionId::new(2),
            ],
        )
        .unwrap();
        let names = ["p1", "p2", "p3", "p4"].map(String::from).to_vec();
        Watershed::new(regions, s, map, names, vec![100.0, 200.0, 5000.0, 50.0]).unwrap()
    }

    pub fn policy() -> PolicyConfig {
        PolicyConfig {
            p_concentration: 2.0,
            unit_conversion: 1e-3,
            filter_efficiency: 0.5,
            maintenance_cost: 1e-3,
            eligibility_threshold: 1e8,
            agro_costs: vec![1.0, 0.5, 2.0],
            agro_capacity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::derive_for;
    use erie_solver_common::ObjectiveSense;

    #[test]
    fn rows_and_cost_match_derived_parameters() {
        let ws = fixtures::watershed();
        let derived = derive_for(&ws, &fixtures::policy()).unwrap();
        let mut problem = ProblemDescription::new("t", ObjectiveSense::Minimize);
        let options = ModelOptions::default();
        let vars = declare_variables(&mut problem, &derived, &ws, &options, |_| 10.0);
        assert_eq!(vars.agro.len(), 3);
        assert_eq!(vars.upgrades.len(), 4);

        let rows = reduction_rows(&derived, &ws, &vars);
        let values = [1.0, 2.0, 3.0, 1.0, 0.0, 1.0, 1.0];
        // region 1: 0.2*1 + 0.4*2 + 0.02*1 + 2.0*1
        assert!((rows[1].evaluate(&values) - 3.02).abs() < 1e-12);
        // region 2: 0.1 + 0.2 + 0.9 + 0.01 + 0.5 + 0.015
        assert!((rows[2].evaluate(&values) - 1.725).abs() < 1e-12);

        let cost = cost_expression(&derived, &vars);
        // 1*1 + 0.5*4 + 2*9 + 0.1 + 5.0 + 0.05
        assert!((cost.evaluate(&values) - 26.15).abs() < 1e-12);

        let (x, w) = vars.split(&values);
        assert_eq!(x, vec![1.0, 2.0, 3.0]);
        assert_eq!(w, vec![1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn shape_check_rejects_params_from_another_watershed() {
        let ws = fixtures::watershed();
        let mut derived = derive_for(&ws, &fixtures::policy()).unwrap();
        assert!(check_shapes(&derived, &ws).is_ok());
        derived.upgrade_effect[1].pop();
        assert!(matches!(
            check_shapes(&derived, &ws),
            Err(erie_core::ErieError::Dimension { .. })
        ));
    }

    #[test]
    fn mode_labels() {
        assert_eq!(ModelMode::Target.to_string(), "Target-Based");
        assert_eq!(ModelMode::Budget.objective_units(), "ppb (weighted average)");
    }
}
