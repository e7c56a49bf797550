//! End-to-end planning: derive parameters, build the model, solve, extract.
//!
//! A [`Planner`] owns the fixed watershed and a shared solver adapter. Every
//! call builds a fresh model, so one planner can serve concurrent requests.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use erie_algo::{MicrolpAdapter, OptimizationRequest, Planner};
//!
//! let planner = Planner::new(watershed, Arc::new(MicrolpAdapter::default()));
//! let record = planner.plan(&OptimizationRequest::reference_target())?;
//! println!("{}", record.summary());
//! ```

use erie_core::{ensure_len, reference, ErieError, ErieResult, ModelOptions, Watershed};
use erie_solver_common::{CancelToken, SolveOptions, SolverAdapter, SolverError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::extract::{extract, RawAssignment};
use crate::model::{build_budget, build_target, BudgetWeights, BuiltModel};
use crate::params::{derive_for, DerivedParams};
use crate::request::{OptimizationRequest, OptimizationResponse, PlanMode};
use crate::solution::SolutionRecord;

pub struct Planner {
    watershed: Watershed,
    adapter: Arc<dyn SolverAdapter>,
    model_options: ModelOptions,
    time_limit: Option<Duration>,
}

impl Planner {
    pub fn new(watershed: Watershed, adapter: Arc<dyn SolverAdapter>) -> Self {
        Self {
            watershed,
            adapter,
            model_options: ModelOptions::default(),
            time_limit: None,
        }
    }

    pub fn with_model_options(mut self, options: ModelOptions) -> Self {
        self.model_options = options;
        self
    }

    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn watershed(&self) -> &Watershed {
        &self.watershed
    }

    pub fn adapter_name(&self) -> &str {
        self.adapter.name()
    }

    pub fn plan(&self, request: &OptimizationRequest) -> ErieResult<SolutionRecord> {
        self.plan_with_cancel(request, CancelToken::new())
    }

    /// Runs one request. Infeasible or unbounded models yield a status-only
    /// record; everything else that goes wrong is an error.
    pub fn plan_with_cancel(
        &self,
        request: &OptimizationRequest,
        cancel: CancelToken,
    ) -> ErieResult<SolutionRecord> {
        let derived = derive_for(&self.watershed, &request.policy)?;
        let model = self.build(request, &derived)?;

        info!(
            mode = %model.mode,
            kind = %model.problem.problem_type(),
            solver = self.adapter.name(),
            "solving abatement model"
        );

        let options = SolveOptions::default()
            .with_time_limit(self.time_limit)
            .with_cancel(cancel);
        let output = self
            .adapter
            .solve(&model.problem, &options)
            .map_err(map_solver_error)?;

        if let Some(message) = &output.message {
            warn!(status = %output.status, message = %message, "solver reported a message");
        }

        let (agro, upgrades) = if output.status.has_solution() {
            ensure_len(
                "solver assignment",
                model.problem.num_variables(),
                output.values.len(),
            )?;
            model.variables.split(&output.values)
        } else {
            (Vec::new(), Vec::new())
        };

        let record = extract(
            RawAssignment {
                status: output.status,
                objective: output.objective,
                agro: &agro,
                upgrades: &upgrades,
                solve_time: output.solve_time,
            },
            model.mode,
            &derived,
            &self.watershed,
            self.model_options.integrality_tolerance,
        )?;

        match &record.plan {
            Some(plan) => info!(
                status = %record.status,
                objective = plan.objective,
                upgrades = plan.totals.wwtp_upgrades,
                "plan ready"
            ),
            None => warn!(status = %record.status, "no feasible plan"),
        }
        Ok(record)
    }

    /// Like [`plan`](Self::plan) but never fails: errors and status-only
    /// records become an error response.
    pub fn respond(&self, request: &OptimizationRequest) -> OptimizationResponse {
        self.respond_with_record(request).0
    }

    /// [`respond`](Self::respond), also handing back the record when planning
    /// succeeded so callers can export it.
    pub fn respond_with_record(
        &self,
        request: &OptimizationRequest,
    ) -> (OptimizationResponse, Option<SolutionRecord>) {
        match self.plan(request) {
            Ok(record) => {
                let response = OptimizationResponse::from_record(&record, request.plan.budget());
                (response, Some(record))
            }
            Err(err) => {
                warn!(kind = err.kind(), "request failed: {err}");
                (OptimizationResponse::failure(&err), None)
            }
        }
    }

    fn build(
        &self,
        request: &OptimizationRequest,
        derived: &DerivedParams,
    ) -> ErieResult<BuiltModel> {
        match &request.plan {
            PlanMode::Target { targets } => {
                build_target(targets, derived, &self.watershed, &self.model_options)
            }
            PlanMode::Budget { budget, weights } => {
                let weights = match weights {
                    Some(raw) => BudgetWeights::normalized(raw)?,
                    None => self.default_weights()?,
                };
                build_budget(
                    *budget,
                    derived,
                    &self.watershed,
                    &weights,
                    &self.model_options,
                )
            }
        }
    }

    /// Reference weights on the reference region layout, uniform otherwise.
    fn default_weights(&self) -> ErieResult<BudgetWeights> {
        let n = self.watershed.n_regions();
        if n == reference::REGION_NAMES.len() {
            BudgetWeights::reference()
        } else {
            BudgetWeights::normalized(&vec![1.0; n])
        }
    }
}

/// Maps adapter failures onto the planning error taxonomy.
pub fn map_solver_error(err: SolverError) -> ErieError {
    match err {
        SolverError::Timeout { seconds } => ErieError::SolverTimeout { seconds },
        SolverError::Cancelled => ErieError::Cancelled,
        other => ErieError::Solver(other.to_string()),
    }
}
