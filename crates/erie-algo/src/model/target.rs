//! Target-based model: cheapest plan meeting every regional reduction target.
//!
//! ```text
//! min   xᵀ A x + bᵀ w
//! s.t.  S x + W w >= target
//!       0 <= w <= u_w,  w integer
//!       x >= 0  (x <= c when capacity is enforced)
//! ```

use erie_core::{ensure_finite, ensure_len, ErieResult, ModelOptions, Watershed};
use erie_solver_common::{Comparison, ObjectiveSense, ProblemDescription};
use tracing::debug;

use super::{check_shapes, cost_expression, declare_variables, reduction_rows, BuiltModel, ModelMode};
use crate::params::DerivedParams;

/// Builds the target-based model.
///
/// Targets may be zero or negative; such rows are trivially satisfied.
pub fn build_target(
    targets: &[f64],
    derived: &DerivedParams,
    watershed: &Watershed,
    options: &ModelOptions,
) -> ErieResult<BuiltModel> {
    ensure_len("targets", watershed.n_regions(), targets.len())?;
    ensure_finite("targets", targets)?;
    check_shapes(derived, watershed)?;

    let s = watershed.sedimentation();
    let n = watershed.n_regions();
    // x_i alone meets every target it contributes to at this value, so any
    // plan with a larger x_i can be lowered without losing feasibility.
    let implied_bound = |i: usize| -> f64 {
        (i..n)
            .filter(|&r| s.get(r, i) > 0.0)
            .map(|r| targets[r].max(0.0) / s.get(r, i))
            .fold(0.0, f64::max)
    };

    let mut problem = ProblemDescription::new("abatement_target", ObjectiveSense::Minimize);
    let variables = declare_variables(&mut problem, derived, watershed, options, implied_bound);
    problem.set_objective(cost_expression(derived, &variables));

    for (region, (row, target)) in watershed
        .regions()
        .iter()
        .zip(reduction_rows(derived, watershed, &variables).into_iter().zip(targets))
    {
        problem.add_linear_constraint(
            format!("reduction_{}", region.name),
            row,
            Comparison::GreaterEq,
            *target,
        );
    }

    debug!(
        regions = n,
        plants = watershed.n_plants(),
        eligible = derived.num_eligible(),
        "built target-based model"
    );

    Ok(BuiltModel {
        mode: ModelMode::Target,
        problem,
        variables,
        budget: None,
    })
}
