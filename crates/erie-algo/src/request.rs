//! Request and response payloads for the planning interface.

use erie_core::{reference, ErieError, PolicyConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ModelMode;
use crate::solution::{Plan, RegionalOutcome, SolutionRecord};

pub const SERVICE_NAME: &str = "lake_erie_optimization";

/// What the caller wants optimized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PlanMode {
    /// Cheapest plan reaching `targets` (ppb reduction per region).
    Target { targets: Vec<f64> },
    /// Largest weighted reduction within `budget` (million CAD/year).
    Budget {
        budget: f64,
        /// Raw region weights; normalized before use. Reference weights when absent.
        #[serde(default)]
        weights: Option<Vec<f64>>,
    },
}

impl PlanMode {
    pub fn model_mode(&self) -> ModelMode {
        match self {
            PlanMode::Target { .. } => ModelMode::Target,
            PlanMode::Budget { .. } => ModelMode::Budget,
        }
    }

    /// Budget ceiling, budget mode only.
    pub fn budget(&self) -> Option<f64> {
        match self {
            PlanMode::Budget { budget, .. } => Some(*budget),
            PlanMode::Target { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub plan: PlanMode,
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl OptimizationRequest {
    pub fn target(targets: Vec<f64>) -> Self {
        Self {
            plan: PlanMode::Target { targets },
            policy: PolicyConfig::default(),
        }
    }

    pub fn budget(budget: f64) -> Self {
        Self {
            plan: PlanMode::Budget {
                budget,
                weights: None,
            },
            policy: PolicyConfig::default(),
        }
    }

    /// Target request for the Lake Erie reference instance: 212 t/year off the Central Basin.
    pub fn reference_target() -> Self {
        Self::target(reference::default_targets())
    }

    pub fn reference_budget() -> Self {
        Self::budget(reference::DEFAULT_BUDGET)
    }

    pub fn with_weights(mut self, raw: Vec<f64>) -> Self {
        if let PlanMode::Budget { weights, .. } = &mut self.plan {
            *weights = Some(raw);
        }
        self
    }

    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }
}

/// Per-region results keyed by region name, plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResults {
    pub agricultural_abatement: BTreeMap<String, f64>,
    pub wwtp_abatement: BTreeMap<String, f64>,
    pub wwtp_investments: BTreeMap<String, usize>,
    pub concentration_changes: BTreeMap<String, f64>,
    pub load_changes: BTreeMap<String, f64>,
    pub upgraded_plants: Vec<String>,
    pub total_agro_abatement: f64,
    pub total_wwtp_abatement: f64,
    pub total_wwtps: usize,
    pub total_abatement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub objective_value: Option<f64>,
    pub objective_units: String,
    pub plan_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    pub solve_time_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub kind: String,
    pub message: String,
}

impl From<&ErieError> for ResponseError {
    fn from(err: &ErieError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Either a complete result or an error, never a partial plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<PlanResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl OptimizationResponse {
    pub fn failure(err: &ErieError) -> Self {
        Self {
            results: None,
            model_info: None,
            error: Some(err.into()),
        }
    }

    /// Converts a record; status-only records become a solver-status error.
    pub fn from_record(record: &SolutionRecord, budget: Option<f64>) -> Self {
        let plan = match record.require_plan() {
            Ok(plan) => plan,
            Err(err) => {
                return Self {
                    model_info: Some(ModelInfo {
                        kind: record.mode.label().to_string(),
                        status: record.status.to_string(),
                        objective_value: None,
                        objective_units: record.mode.objective_units().to_string(),
                        plan_cost: None,
                        budget,
                        solve_time_seconds: record.solve_time.as_secs_f64(),
                    }),
                    ..Self::failure(&err)
                }
            }
        };

        let results = PlanResults {
            agricultural_abatement: by_region(plan, |r| r.agro_abatement.value()),
            wwtp_abatement: by_region(plan, |r| r.wwtp_abatement.value()),
            wwtp_investments: by_region(plan, |r| r.wwtp_upgrades),
            concentration_changes: by_region(plan, |r| r.concentration_delta.value()),
            load_changes: by_region(plan, |r| r.load_delta.value()),
            upgraded_plants: plan
                .upgraded_plants()
                .into_iter()
                .map(String::from)
                .collect(),
            total_agro_abatement: plan.totals.agro_abatement.value(),
            total_wwtp_abatement: plan.totals.wwtp_abatement.value(),
            total_wwtps: plan.totals.wwtp_upgrades,
            total_abatement: plan.totals.total_abatement.value(),
        };

        Self {
            results: Some(results),
            model_info: Some(ModelInfo {
                kind: record.mode.label().to_string(),
                status: record.status.to_string(),
                objective_value: Some(plan.objective),
                objective_units: record.mode.objective_units().to_string(),
                plan_cost: Some(plan.plan_cost),
                budget,
                solve_time_seconds: record.solve_time.as_secs_f64(),
            }),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

fn by_region<T>(plan: &Plan, f: impl Fn(&RegionalOutcome) -> T) -> BTreeMap<String, T> {
    plan.regions
        .iter()
        .map(|r| (r.region.clone(), f(r)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Liveness report; does not touch the solver.
pub fn health() -> HealthStatus {
    HealthStatus {
        status: "healthy".into(),
        service: SERVICE_NAME.into(),
        version: env!("CARGO_PKG_VERSION").into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erie_solver_common::SolutionStatus;
    use std::time::Duration;

    #[test]
    fn request_json_shape() {
        let json = r#"{"plan": {"mode": "budget", "budget": 250.0}}"#;
        let request: OptimizationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request.plan,
            PlanMode::Budget {
                budget: 250.0,
                weights: None
            }
        );
        assert_eq!(request.policy, PolicyConfig::default());

        let json = r#"{"plan": {"mode": "target", "targets": [0, 0, 0, 0, 0.5, 0]},
                       "policy": {"filter_efficiency": 0.6}}"#;
        let request: OptimizationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.plan.model_mode(), ModelMode::Target);
        assert_eq!(request.policy.filter_efficiency, 0.6);
    }

    #[test]
    fn weights_only_apply_to_budget_requests() {
        let target = OptimizationRequest::reference_target().with_weights(vec![1.0; 6]);
        assert!(matches!(target.plan, PlanMode::Target { .. }));
        let budget = OptimizationRequest::reference_budget().with_weights(vec![1.0; 6]);
        assert!(matches!(
            budget.plan,
            PlanMode::Budget {
                weights: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn status_only_record_becomes_error_response() {
        let record = SolutionRecord::status_only(
            ModelMode::Target,
            SolutionStatus::Infeasible,
            Duration::from_millis(3),
        );
        let response = OptimizationResponse::from_record(&record, None);
        assert!(!response.is_success());
        assert!(response.results.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.kind, "solver_status_error");
        assert_eq!(
            error.message,
            "No feasible solution found. Model status: infeasible"
        );
        assert_eq!(response.model_info.unwrap().status, "infeasible");
    }

    #[test]
    fn health_payload() {
        let health = health();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.service, "lake_erie_optimization");
        let json = serde_json::to_value(&health).unwrap();
        assert!(json.get("version").is_some());
    }
}
