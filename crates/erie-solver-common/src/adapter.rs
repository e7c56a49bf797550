//! Solver adapter contract.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::SolverResult;
use crate::problem::ProblemDescription;
use crate::solution::SolverOutput;

/// Shared flag a caller flips to abandon a running solve.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-solve options.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Wall-clock limit; `None` waits for the backend to finish.
    pub time_limit: Option<Duration>,
    pub cancel: CancelToken,
}

impl SolveOptions {
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// A backend able to solve a [`ProblemDescription`].
///
/// Implementations must be safe to share between threads; every call to
/// [`solve`](SolverAdapter::solve) works on its own copy of the model.
pub trait SolverAdapter: Send + Sync {
    /// Short identifier used in logs and responses.
    fn name(&self) -> &str;

    /// Solves `problem`.
    ///
    /// Infeasible and unbounded problems are reported through
    /// [`SolverOutput::status`], not as errors. Errors are reserved for
    /// problems the backend cannot accept, timeouts without an incumbent,
    /// cancellation and backend failures.
    fn solve(&self, problem: &ProblemDescription, options: &SolveOptions)
        -> SolverResult<SolverOutput>;
}
