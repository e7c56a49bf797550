//! Unified error types for phosphorus abatement planning
//!
//! [`ErieError`] is the error returned at every public boundary of the
//! planning pipeline. Crate-specific errors (CSV loading, solver adapters)
//! convert into it so callers handle one taxonomy.
//!
//! # Example
//!
//! ```ignore
//! use erie_core::{ErieError, ErieResult};
//!
//! fn plan(request: &OptimizationRequest) -> ErieResult<SolutionRecord> {
//!     let derived = derive_for(&watershed, &request.policy)?;
//!     let model = build_target(&targets, &derived, &watershed, &options)?;
//!     ...
//! }
//! ```

use thiserror::Error;

/// Unified error type for all planning operations.
#[derive(Error, Debug)]
pub enum ErieError {
    /// An input value is out of its admissible range.
    #[error("Parameter error: `{name}` = {value} ({expected})")]
    Parameter {
        name: String,
        value: String,
        expected: String,
    },

    /// Two inputs that must agree in size do not.
    #[error("Dimension mismatch: `{name}` has length {actual}, expected {expected}")]
    Dimension {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// The solver finished without a feasible plan.
    #[error("No feasible solution found. Model status: {status}")]
    SolverStatus { status: String },

    /// The time limit elapsed before any feasible plan was found.
    #[error("Solver timed out after {seconds:.1}s without a feasible solution")]
    SolverTimeout { seconds: f64 },

    /// The caller cancelled the solve.
    #[error("Solve cancelled")]
    Cancelled,

    /// The solver backend failed or rejected the problem.
    #[error("Solver error: {0}")]
    Solver(String),

    /// A solver assignment could not be turned into a plan.
    #[error("Extraction error: `{variable}` = {value} ({reason})")]
    Extraction {
        variable: String,
        value: f64,
        reason: String,
    },

    /// Reference data could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reference data or configuration is present but malformed.
    #[error("Data error: {0}")]
    Data(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using ErieError.
pub type ErieResult<T> = Result<T, ErieError>;

impl ErieError {
    pub fn parameter(
        name: impl Into<String>,
        value: impl std::fmt::Display,
        expected: impl Into<String>,
    ) -> Self {
        ErieError::Parameter {
            name: name.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    pub fn dimension(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        ErieError::Dimension {
            name: name.into(),
            expected,
            actual,
        }
    }

    pub fn extraction(variable: impl Into<String>, value: f64, reason: impl Into<String>) -> Self {
        ErieError::Extraction {
            variable: variable.into(),
            value,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable category, used in serialized error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ErieError::Parameter { .. } => "parameter_error",
            ErieError::Dimension { .. } => "dimension_error",
            ErieError::SolverStatus { .. } => "solver_status_error",
            ErieError::SolverTimeout { .. } => "solver_timeout",
            ErieError::Cancelled => "cancelled",
            ErieError::Solver(_) => "solver_error",
            ErieError::Extraction { .. } => "extraction_error",
            ErieError::Io(_) => "io_error",
            ErieError::Data(_) => "data_error",
            ErieError::Config(_) => "config_error",
        }
    }
}

/// Returns a parameter error unless every entry is finite.
pub fn ensure_finite(name: &str, values: &[f64]) -> ErieResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(ErieError::parameter(
            format!("{name}[{idx}]"),
            values[idx],
            "must be finite",
        )),
        None => Ok(()),
    }
}

/// Returns a dimension error unless `actual == expected`.
pub fn ensure_len(name: &str, expected: usize, actual: usize) -> ErieResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ErieError::dimension(name, expected, actual))
    }
}
