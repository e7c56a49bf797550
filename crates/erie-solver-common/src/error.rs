//! Error types for solver adapters.

use thiserror::Error;

/// Errors that can occur while handing a problem to a solver backend.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The problem description is internally inconsistent.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// The backend cannot represent part of the problem.
    #[error("Unsupported by {solver}: {reason}")]
    Unsupported { solver: String, reason: String },

    /// Time limit reached before any feasible point was found.
    #[error("Solver timed out after {seconds:.1} seconds")]
    Timeout { seconds: f64 },

    /// The caller's cancel token fired.
    #[error("Solve cancelled")]
    Cancelled,

    /// The solver worker could not be started.
    #[error("Failed to start solver worker: {0}")]
    WorkerStart(#[source] std::io::Error),

    /// Every worker slot is taken.
    #[error("All {limit} solver workers are busy")]
    Busy { limit: usize },

    /// The solver worker exited without reporting a result.
    #[error("Solver worker terminated without a result")]
    WorkerLost,

    /// Backend-specific failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type alias for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;
