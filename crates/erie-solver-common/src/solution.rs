//! Solver output returned to the planning pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status of the solver solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    /// Optimal solution found.
    Optimal,
    /// Feasible point without a proof of optimality.
    Suboptimal,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Generic error occurred.
    Error,
}

impl SolutionStatus {
    /// Check if this status carries a usable assignment.
    pub fn has_solution(&self) -> bool {
        matches!(self, SolutionStatus::Optimal | SolutionStatus::Suboptimal)
    }

    /// Check if this status represents a proven optimum.
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolutionStatus::Optimal)
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "optimal"),
            SolutionStatus::Suboptimal => write!(f, "suboptimal"),
            SolutionStatus::Infeasible => write!(f, "infeasible"),
            SolutionStatus::Unbounded => write!(f, "unbounded"),
            SolutionStatus::Error => write!(f, "error"),
        }
    }
}

/// Raw result of one solve.
///
/// `values` is indexed by [`crate::VariableId`] and is empty unless
/// [`SolutionStatus::has_solution`] holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOutput {
    pub status: SolutionStatus,
    pub objective: Option<f64>,
    pub values: Vec<f64>,
    pub solve_time: Duration,
    pub message: Option<String>,
}

impl SolverOutput {
    pub fn optimal(objective: f64, values: Vec<f64>, solve_time: Duration) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective: Some(objective),
            values,
            solve_time,
            message: None,
        }
    }

    pub fn suboptimal(objective: f64, values: Vec<f64>, solve_time: Duration) -> Self {
        Self {
            status: SolutionStatus::Suboptimal,
            ..Self::optimal(objective, values, solve_time)
        }
    }

    /// An output with no assignment (infeasible, unbounded or error).
    pub fn without_solution(status: SolutionStatus, solve_time: Duration) -> Self {
        Self {
            status,
            objective: None,
            values: Vec::new(),
            solve_time,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
