//! # erie-algo: Phosphorus Abatement Planning
//!
//! Turns a [`Watershed`](erie_core::Watershed) and a policy into an
//! optimized abatement plan.
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Parameter derivation | [`params`] | [`DerivedParams`]: F, W, A, b, eligibility |
//! | Model building | [`model`] | [`BuiltModel`] for the target or budget variant |
//! | Solving | [`backend`] | [`SolverOutput`](erie_solver_common::SolverOutput) |
//! | Extraction | [`extract`] | [`SolutionRecord`] with regional aggregates |
//!
//! [`Planner`] runs all four stages for one [`OptimizationRequest`] and
//! [`request`] holds the JSON-facing request and response payloads.
//!
//! ## Solver backends
//!
//! The `solver-microlp` feature (default) provides [`MicrolpAdapter`], a
//! [`SolverAdapter`](erie_solver_common::SolverAdapter) on top of `good_lp`
//! and the pure-Rust `microlp` MILP solver. Any other adapter can be plugged
//! into [`Planner::new`].

#[cfg(feature = "solver-microlp")]
pub mod backend;
pub mod extract;
pub mod model;
pub mod params;
pub mod pipeline;
pub mod request;
pub mod solution;

#[cfg(feature = "solver-microlp")]
pub use backend::{MicrolpAdapter, MicrolpConfig};
pub use extract::{extract, RawAssignment};
pub use model::{build_budget, build_target, BudgetWeights, BuiltModel, ModelMode, ModelVariables};
pub use params::{derive, derive_for, DerivedParams};
pub use pipeline::{map_solver_error, Planner};
pub use request::{
    health, HealthStatus, ModelInfo, OptimizationRequest, OptimizationResponse, PlanMode,
    PlanResults, ResponseError, SERVICE_NAME,
};
pub use solution::{Plan, PlanTotals, RegionalOutcome, SolutionRecord, UpgradeDecision};
