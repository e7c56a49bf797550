//! Policy knobs and model/solver options shared by every planning request.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_len, ErieError, ErieResult};
use crate::reference;

/// Caller-tunable economic and engineering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Phosphorus concentration in untreated effluent, mg/L.
    pub p_concentration: f64,
    /// Converts concentration × flow into tonnes of abatement.
    pub unit_conversion: f64,
    /// Fraction of effluent phosphorus removed by an upgraded filter.
    pub filter_efficiency: f64,
    /// Annualized upgrade cost per unit of flow.
    pub maintenance_cost: f64,
    /// Plants with flow above this value cannot be upgraded.
    pub eligibility_threshold: f64,
    /// Quadratic agricultural abatement cost coefficient per region.
    pub agro_costs: Vec<f64>,
    /// Optional cap on agricultural abatement per region.
    pub agro_capacity: Option<Vec<f64>>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            p_concentration: reference::P_CONCENTRATION,
            unit_conversion: reference::UNIT_CONVERSION,
            filter_efficiency: reference::FILTER_EFFICIENCY,
            maintenance_cost: reference::MAINTENANCE_COST,
            eligibility_threshold: reference::ELIGIBILITY_THRESHOLD,
            agro_costs: reference::AGRO_COSTS.to_vec(),
            agro_capacity: None,
        }
    }
}

impl PolicyConfig {
    pub fn with_filter_efficiency(mut self, value: f64) -> Self {
        self.filter_efficiency = value;
        self
    }

    pub fn with_maintenance_cost(mut self, value: f64) -> Self {
        self.maintenance_cost = value;
        self
    }

    pub fn with_agro_costs(mut self, costs: Vec<f64>) -> Self {
        self.agro_costs = costs;
        self
    }

    pub fn with_agro_capacity(mut self, capacity: Vec<f64>) -> Self {
        self.agro_capacity = Some(capacity);
        self
    }

    /// Checks value ranges and that per-region vectors have `n_regions` entries.
    pub fn validate(&self, n_regions: usize) -> ErieResult<()> {
        let positive = [
            ("p_concentration", self.p_concentration),
            ("unit_conversion", self.unit_conversion),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ErieError::parameter(name, value, "must be finite and positive"));
            }
        }
        if !self.maintenance_cost.is_finite() || self.maintenance_cost < 0.0 {
            return Err(ErieError::parameter(
                "maintenance_cost",
                self.maintenance_cost,
                "must be finite and nonnegative",
            ));
        }
        // An infinite threshold makes every plant eligible.
        if self.eligibility_threshold.is_nan() || self.eligibility_threshold < 0.0 {
            return Err(ErieError::parameter(
                "eligibility_threshold",
                self.eligibility_threshold,
                "must be nonnegative",
            ));
        }
        if !(0.0..=1.0).contains(&self.filter_efficiency) {
            return Err(ErieError::parameter(
                "filter_efficiency",
                self.filter_efficiency,
                "must lie in [0, 1]",
            ));
        }

        ensure_len("agro_costs", n_regions, self.agro_costs.len())?;
        ensure_finite("agro_costs", &self.agro_costs)?;
        if let Some((idx, &cost)) = self
            .agro_costs
            .iter()
            .enumerate()
            .find(|(_, &c)| c <= 0.0)
        {
            return Err(ErieError::parameter(
                format!("agro_costs[{idx}]"),
                cost,
                "must be positive",
            ));
        }

        if let Some(capacity) = &self.agro_capacity {
            ensure_len("agro_capacity", n_regions, capacity.len())?;
            ensure_finite("agro_capacity", capacity)?;
            if let Some((idx, &cap)) = capacity.iter().enumerate().find(|(_, &c)| c < 0.0) {
                return Err(ErieError::parameter(
                    format!("agro_capacity[{idx}]"),
                    cap,
                    "must be nonnegative",
                ));
            }
        }
        Ok(())
    }
}

/// Options that change how the optimization model is assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Adds `x <= agro_capacity` when a capacity vector is configured.
    pub enforce_capacity: bool,
    /// Largest distance from 0 or 1 accepted when reading upgrade decisions.
    pub integrality_tolerance: f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            enforce_capacity: false,
            integrality_tolerance: 1e-4,
        }
    }
}

/// Options handed to the solver adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Wall-clock limit per solve; `None` waits indefinitely.
    pub time_limit_seconds: Option<f64>,
    /// Initial uniform segments used to linearize each squared term.
    pub linearization_segments: usize,
    /// Relative optimality gap at which a linearized solve counts as optimal.
    pub gap_tolerance: f64,
    /// Breakpoint refinement rounds before settling for a suboptimal plan.
    pub max_refinements: usize,
    /// Solver worker threads allowed to run at once.
    pub max_workers: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit_seconds: Some(60.0),
            linearization_segments: 64,
            gap_tolerance: 1e-6,
            max_refinements: 10,
            max_workers: 8,
        }
    }
}

impl SolverSettings {
    pub fn time_limit(&self) -> Option<std::time::Duration> {
        self.time_limit_seconds
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(std::time::Duration::from_secs_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid_for_reference_regions() {
        let policy = PolicyConfig::default();
        assert_eq!(policy.filter_efficiency, 0.4);
        assert_eq!(policy.maintenance_cost, 1e-4);
        assert!(policy.validate(reference::REGION_NAMES.len()).is_ok());
    }

    #[test]
    fn rejects_out_of_range_efficiency() {
        let policy = PolicyConfig::default().with_filter_efficiency(1.2);
        let err = policy.validate(6).unwrap_err();
        assert!(err.to_string().contains("filter_efficiency"));
    }

    #[test]
    fn rejects_zero_concentration_and_negative_maintenance() {
        let mut policy = PolicyConfig::default();
        policy.p_concentration = 0.0;
        assert!(policy.validate(6).unwrap_err().to_string().contains("p_concentration"));

        let policy = PolicyConfig::default().with_maintenance_cost(-1e-4);
        assert!(policy.validate(6).unwrap_err().to_string().contains("maintenance_cost"));
        assert!(PolicyConfig::default()
            .with_maintenance_cost(0.0)
            .validate(6)
            .is_ok());
    }

    #[test]
    fn rejects_nonpositive_agro_cost() {
        let policy = PolicyConfig::default().with_agro_costs(vec![1.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        let err = policy.validate(6).unwrap_err();
        assert!(err.to_string().contains("agro_costs[1]"));
    }

    #[test]
    fn rejects_wrong_length_agro_costs() {
        let policy = PolicyConfig::default().with_agro_costs(vec![1.0; 3]);
        assert!(matches!(
            policy.validate(6),
            Err(ErieError::Dimension { .. })
        ));
    }

    #[test]
    fn rejects_negative_capacity() {
        let policy = PolicyConfig::default().with_agro_capacity(vec![1.0, -1.0, 1.0, 1.0, 1.0, 1.0]);
        assert!(policy.validate(6).is_err());
    }

    #[test]
    fn infinite_threshold_disables_eligibility_cap() {
        let mut policy = PolicyConfig::default();
        policy.eligibility_threshold = f64::INFINITY;
        assert!(policy.validate(6).is_ok());
    }

    #[test]
    fn partial_policy_uses_defaults() {
        let policy: PolicyConfig = serde_json::from_str(r#"{"filter_efficiency": 0.6}"#).unwrap();
        assert_eq!(policy.filter_efficiency, 0.6);
        assert_eq!(policy.agro_costs.len(), 6);
    }

    #[test]
    fn solver_settings_time_limit() {
        let settings = SolverSettings::default();
        assert_eq!(settings.time_limit(), Some(std::time::Duration::from_secs(60)));
        let unlimited = SolverSettings {
            time_limit_seconds: None,
            ..SolverSettings::default()
        };
        assert_eq!(unlimited.time_limit(), None);
    }

    #[test]
    fn partial_solver_settings_keep_refinement_defaults() {
        let settings: SolverSettings =
            serde_json::from_str(r#"{"linearization_segments": 8}"#).unwrap();
        assert_eq!(settings.linearization_segments, 8);
        assert_eq!(settings.gap_tolerance, 1e-6);
        assert_eq!(settings.max_refinements, 10);
        assert_eq!(settings.max_workers, 8);
    }
}
