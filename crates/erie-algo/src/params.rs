//! Derived model parameters.
//!
//! Turns raw plant flows and policy knobs into the matrices used by both
//! model variants:
//!
//! | Symbol | Meaning |
//! |--------|---------|
//! | `F` | Per-plant abatement if upgraded: `p_conc × unit × efficiency × flow` |
//! | `W` | Concentration effect of each upgrade: `S · L · F` |
//! | `A` | Quadratic agricultural cost coefficients |
//! | `b` | Per-plant upgrade cost: `maintenance × flow` |
//! | `u_w` | Upgrade eligibility: `flow <= threshold` |

use erie_core::{
    ensure_finite, ensure_len, ErieError, ErieResult, PolicyConfig, RegionPlantMap,
    SedimentationMatrix, Watershed,
};
use serde::{Deserialize, Serialize};

/// Parameters derived from one policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedParams {
    /// `F`: abatement delivered by upgrading each plant, tonnes/year.
    pub plant_abatement: Vec<f64>,
    /// `W`: region × plant concentration reduction per upgrade.
    pub upgrade_effect: Vec<Vec<f64>>,
    /// `A`: diagonal agricultural cost coefficients per region.
    pub agro_cost: Vec<f64>,
    /// `b`: annualized upgrade cost per plant.
    pub upgrade_cost: Vec<f64>,
    /// `u_w`: whether each plant may be upgraded.
    pub eligible: Vec<bool>,
    /// Agricultural abatement cap per region, when configured.
    pub agro_capacity: Option<Vec<f64>>,
}

impl DerivedParams {
    pub fn n_regions(&self) -> usize {
        self.agro_cost.len()
    }

    pub fn n_plants(&self) -> usize {
        self.plant_abatement.len()
    }

    /// Upper bound on each upgrade decision (0 or 1).
    pub fn upgrade_bound(&self, plant: usize) -> f64 {
        if self.eligible[plant] {
            1.0
        } else {
            0.0
        }
    }

    pub fn num_eligible(&self) -> usize {
        self.eligible.iter().filter(|e| **e).count()
    }
}

/// Derives model parameters from raw flows, plant membership, sedimentation
/// and policy knobs. Pure and deterministic.
pub fn derive(
    flows: &[f64],
    region_map: &RegionPlantMap,
    sedimentation: &SedimentationMatrix,
    policy: &PolicyConfig,
) -> ErieResult<DerivedParams> {
    let n_regions = sedimentation.dim();
    ensure_len("region-plant map regions", n_regions, region_map.n_regions())?;
    ensure_len("plant flows", region_map.n_plants(), flows.len())?;
    ensure_finite("plant flows", flows)?;
    if let Some((idx, &flow)) = flows.iter().enumerate().find(|(_, &f)| f <= 0.0) {
        return Err(ErieError::parameter(
            format!("flow[{idx}]"),
            flow,
            "plant flows must be positive",
        ));
    }
    policy.validate(n_regions)?;

    let abatement_per_flow =
        policy.p_concentration * policy.unit_conversion * policy.filter_efficiency;
    let plant_abatement: Vec<f64> = flows.iter().map(|q| abatement_per_flow * q).collect();

    // W = S · L · F; column p is F[p] times the S column of the plant's region
    let upgrade_effect: Vec<Vec<f64>> = (0..n_regions)
        .map(|r| {
            plant_abatement
                .iter()
                .enumerate()
                .map(|(p, f)| sedimentation.get(r, region_map.region_of(p).index()) * f)
                .collect()
        })
        .collect();

    let upgrade_cost = flows.iter().map(|q| policy.maintenance_cost * q).collect();
    let eligible = flows
        .iter()
        .map(|q| *q <= policy.eligibility_threshold)
        .collect();

    Ok(DerivedParams {
        plant_abatement,
        upgrade_effect,
        agro_cost: policy.agro_costs.clone(),
        upgrade_cost,
        eligible,
        agro_capacity: policy.agro_capacity.clone(),
    })
}

/// [`derive`] using the flows, membership and sedimentation of `watershed`.
pub fn derive_for(watershed: &Watershed, policy: &PolicyConfig) -> ErieResult<DerivedParams> {
    derive(
        &watershed.flows(),
        watershed.region_map(),
        watershed.sedimentation(),
        policy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use erie_core::RegionId;

    fn fixture() -> (Vec<f64>, RegionPlantMap, SedimentationMatrix, PolicyConfig) {
        let flows = vec![100.0, 200.0, 5000.0, 50.0];
        let map = RegionPlantMap::from_assignments(
            3,
            vec![
                RegionId::new(0),
                RegionId::new(1),
                RegionId::new(1),
                RegionId::new(2),
            ],
        )
        .unwrap();
        let s = SedimentationMatrix::from_lower_triangle(&[&[0.5], &[0.2, 0.4], &[0.1, 0.1, 0.3]])
            .unwrap();
        let policy = PolicyConfig {
            p_concentration: 2.0,
            unit_conversion: 1e-3,
            filter_efficiency: 0.5,
            maintenance_cost: 1e-3,
            eligibility_threshold: 1000.0,
            agro_costs: vec![1.0, 0.5, 2.0],
            agro_capacity: None,
        };
        (flows, map, s, policy)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn computes_plant_abatement_and_cost() {
        let (flows, map, s, policy) = fixture();
        let d = derive(&flows, &map, &s, &policy).unwrap();
        let expected = [0.1, 0.2, 5.0, 0.05];
        for (got, want) in d.plant_abatement.iter().zip(expected) {
            assert!(close(*got, want), "{got} != {want}");
        }
        for (got, want) in d.upgrade_cost.iter().zip(expected) {
            assert!(close(*got, want), "{got} != {want}");
        }
        assert_eq!(d.agro_cost, vec![1.0, 0.5, 2.0]);
    }

    #[test]
    fn upgrade_effect_follows_sedimentation_of_home_region() {
        let (flows, map, s, policy) = fixture();
        let d = derive(&flows, &map, &s, &policy).unwrap();
        let w = &d.upgrade_effect;
        // plant 0 sits in region 0 and reaches every region downstream
        assert!(close(w[0][0], 0.05));
        assert!(close(w[1][0], 0.02));
        assert!(close(w[2][0], 0.01));
        // plants in region 1 cannot affect region 0
        assert_eq!(w[0][1], 0.0);
        assert_eq!(w[0][2], 0.0);
        assert!(close(w[1][2], 2.0));
        assert!(close(w[2][2], 0.5));
        assert!(close(w[2][3], 0.015));
    }

    #[test]
    fn eligibility_threshold_is_inclusive() {
        let (flows, map, s, mut policy) = fixture();
        let d = derive(&flows, &map, &s, &policy).unwrap();
        assert_eq!(d.eligible, vec![true, true, false, true]);
        assert_eq!(d.upgrade_bound(2), 0.0);
        assert_eq!(d.num_eligible(), 3);

        policy.eligibility_threshold = 5000.0;
        let d = derive(&flows, &map, &s, &policy).unwrap();
        assert!(d.eligible[2]);
    }

    #[test]
    fn derivation_is_deterministic() {
        let (flows, map, s, policy) = fixture();
        let a = derive(&flows, &map, &s, &policy).unwrap();
        let b = derive(&flows, &map, &s, &policy).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_nonpositive_flow() {
        let (mut flows, map, s, policy) = fixture();
        flows[1] = 0.0;
        let err = derive(&flows, &map, &s, &policy).unwrap_err();
        assert!(err.to_string().contains("flow[1]"));
    }

    #[test]
    fn rejects_bad_efficiency() {
        let (flows, map, s, policy) = fixture();
        let policy = policy.with_filter_efficiency(-0.1);
        assert!(matches!(
            derive(&flows, &map, &s, &policy),
            Err(ErieError::Parameter { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_flow_count() {
        let (_, map, s, policy) = fixture();
        assert!(matches!(
            derive(&[1.0, 2.0], &map, &s, &policy),
            Err(ErieError::Dimension { .. })
        ));
    }

    #[test]
    fn rejects_wrong_agro_cost_length() {
        let (flows, map, s, policy) = fixture();
        let policy = policy.with_agro_costs(vec![1.0, 1.0]);
        assert!(derive(&flows, &map, &s, &policy).is_err());
    }
}
