//! Budget-based model: largest weighted reduction affordable within a budget.
//!
//! ```text
//! max   weightsᵀ (S x + W w)
//! s.t.  xᵀ A x + bᵀ w <= budget
//!       0 <= w <= u_w,  w integer
//!       x >= 0  (x <= c when capacity is enforced)
//! ```

use erie_core::{ensure_finite, ensure_len, reference, ErieError, ErieResult, ModelOptions, Watershed};
use erie_solver_common::{LinearExpr, ObjectiveSense, ProblemDescription};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_shapes, cost_expression, declare_variables, reduction_rows, BuiltModel, ModelMode};
use crate::params::DerivedParams;

/// Region weights for the budget objective, normalized to sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetWeights(Vec<f64>);

impl BudgetWeights {
    /// Normalizes nonnegative raw weights; at least one must be positive.
    pub fn normalized(raw: &[f64]) -> ErieResult<Self> {
        ensure_finite("weights", raw)?;
        if let Some((idx, &w)) = raw.iter().enumerate().find(|(_, &w)| w < 0.0) {
            return Err(ErieError::parameter(
                format!("weights[{idx}]"),
                w,
                "weights must be nonnegative",
            ));
        }
        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return Err(ErieError::parameter(
                "weights",
                total,
                "at least one weight must be positive",
            ));
        }
        Ok(Self(raw.iter().map(|w| w / total).collect()))
    }

    /// Lake Erie reference weights.
    pub fn reference() -> ErieResult<Self> {
        Self::normalized(&reference::BUDGET_WEIGHTS)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Builds the budget-based model.
///
/// A zero budget is accepted and yields the empty plan.
pub fn build_budget(
    budget: f64,
    derived: &DerivedParams,
    watershed: &Watershed,
    weights: &BudgetWeights,
    options: &ModelOptions,
) -> ErieResult<BuiltModel> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(ErieError::parameter(
            "budget",
            budget,
            "must be finite and nonnegative",
        ));
    }
    ensure_len("weights", watershed.n_regions(), weights.len())?;
    check_shapes(derived, watershed)?;

    // Spending the whole budget on region i caps x_i at sqrt(budget / a_i).
    let implied_bound = |i: usize| -> f64 { (budget / derived.agro_cost[i]).sqrt() };

    let mut problem = ProblemDescription::new("abatement_budget", ObjectiveSense::Maximize);
    let variables = declare_variables(&mut problem, derived, watershed, options, implied_bound);

    let mut objective = LinearExpr::new();
    for (row, weight) in reduction_rows(derived, watershed, &variables)
        .iter()
        .zip(weights.as_slice())
    {
        objective.add_scaled(row, *weight);
    }
    problem.set_objective(objective);
    problem.add_quadratic_constraint("budget", cost_expression(derived, &variables), budget);

    debug!(
        budget,
        regions = watershed.n_regions(),
        plants = watershed.n_plants(),
        "built budget-based model"
    );

    Ok(BuiltModel {
        mode: ModelMode::Budget,
        problem,
        variables,
        budget: Some(budget),
    })
}
