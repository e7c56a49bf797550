//! Solver-independent problem description and adapter contract.
//!
//! The planning pipeline builds a [`ProblemDescription`] and hands it to a
//! [`SolverAdapter`]. Adapters own everything backend-specific: how squared
//! terms are represented, how time limits are enforced and how backend
//! statuses map onto [`SolutionStatus`].
//!
//! ```text
//! ModelBuilder ──ProblemDescription──> SolverAdapter ──SolverOutput──> Extractor
//! ```

pub mod adapter;
pub mod error;
pub mod problem;
pub mod solution;

pub use adapter::{CancelToken, SolveOptions, SolverAdapter};
pub use error::{SolverError, SolverResult};
pub use problem::{
    Comparison, LinearConstraint, LinearExpr, ObjectiveSense, ProblemDescription, ProblemType,
    QuadraticConstraint, QuadraticExpr, VariableId, VariableSpec,
};
pub use solution::{SolutionStatus, SolverOutput};
