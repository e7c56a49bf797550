//! Fixed watershed data: regions, sedimentation transfer and plant membership.
//!
//! Regions are ordered upstream to downstream. A reduction achieved in region
//! `i` lowers the concentration of region `r >= i` by `S[r][i]` per unit, so
//! the sedimentation matrix is lower triangular. Every treatment plant
//! discharges into exactly one region.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_len, ErieError, ErieResult};
use crate::units::CubicKilometres;

/// Ordinal position of a region in upstream-to-downstream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(usize);

/// Ordinal position of a treatment plant in the reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlantId(usize);

impl RegionId {
    #[inline]
    pub fn new(value: usize) -> Self {
        RegionId(value)
    }
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl PlantId {
    #[inline]
    pub fn new(value: usize) -> Self {
        PlantId(value)
    }
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub volume: CubicKilometres,
}

impl Region {
    pub fn new(id: usize, name: impl Into<String>, volume_km3: f64) -> Self {
        Self {
            id: RegionId::new(id),
            name: name.into(),
            volume: CubicKilometres(volume_km3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentPlant {
    pub id: PlantId,
    pub name: String,
    /// Average effluent flow rate.
    pub flow: f64,
    pub region: RegionId,
}

/// Lower-triangular transfer matrix between regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SedimentationMatrix {
    rows: Vec<Vec<f64>>,
}

impl SedimentationMatrix {
    /// Builds the matrix from dense rows, rejecting anything that is not a
    /// square, nonnegative, lower-triangular matrix with a positive diagonal.
    pub fn new(rows: Vec<Vec<f64>>) -> ErieResult<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(ErieError::Data("sedimentation matrix is empty".into()));
        }
        for (r, row) in rows.iter().enumerate() {
            ensure_len(&format!("sedimentation row {r}"), n, row.len())?;
            ensure_finite(&format!("sedimentation row {r}"), row)?;
            for (c, &value) in row.iter().enumerate() {
                if value < 0.0 {
                    return Err(ErieError::parameter(
                        format!("S[{r}][{c}]"),
                        value,
                        "sedimentation coefficients must be nonnegative",
                    ));
                }
                if c > r && value != 0.0 {
                    return Err(ErieError::parameter(
                        format!("S[{r}][{c}]"),
                        value,
                        "downstream regions cannot affect upstream ones",
                    ));
                }
            }
            if row[r] <= 0.0 {
                return Err(ErieError::parameter(
                    format!("S[{r}][{r}]"),
                    row[r],
                    "diagonal must be positive",
                ));
            }
        }
        Ok(Self { rows })
    }

    /// Builds the matrix from the lower triangle only; row `r` holds `r + 1` entries.
    pub fn from_lower_triangle(triangle: &[&[f64]]) -> ErieResult<Self> {
        let n = triangle.len();
        let mut rows = Vec::with_capacity(n);
        for (r, entries) in triangle.iter().enumerate() {
            ensure_len(&format!("sedimentation row {r}"), r + 1, entries.len())?;
            let mut row = vec![0.0; n];
            row[..=r].copy_from_slice(entries);
            rows.push(row);
        }
        Self::new(rows)
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Computes `S · v`.
    pub fn mul_vec(&self, v: &[f64]) -> ErieResult<Vec<f64>> {
        ensure_len("sedimentation operand", self.dim(), v.len())?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(r, row)| (0..=r).map(|c| row[c] * v[c]).sum())
            .collect())
    }
}

/// Incidence between plants and the region each one discharges into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPlantMap {
    n_regions: usize,
    assignment: Vec<RegionId>,
}

impl RegionPlantMap {
    pub fn from_assignments(n_regions: usize, assignment: Vec<RegionId>) -> ErieResult<Self> {
        if let Some((plant, region)) = assignment
            .iter()
            .enumerate()
            .find(|(_, region)| region.index() >= n_regions)
        {
            return Err(ErieError::parameter(
                format!("plant {plant} region"),
                region.index(),
                format!("must be below {n_regions}"),
            ));
        }
        Ok(Self {
            n_regions,
            assignment,
        })
    }

    /// Builds the map from a dense region × plant 0/1 incidence matrix.
    ///
    /// Each plant column must contain exactly one 1.
    pub fn from_incidence(incidence: &[Vec<f64>]) -> ErieResult<Self> {
        let n_regions = incidence.len();
        if n_regions == 0 {
            return Err(ErieError::Data("region-plant map has no regions".into()));
        }
        let n_plants = incidence[0].len();
        let mut assignment = Vec::with_capacity(n_plants);
        for (r, row) in incidence.iter().enumerate() {
            ensure_len(&format!("region-plant row {r}"), n_plants, row.len())?;
        }
        for p in 0..n_plants {
            let mut owner = None;
            for (r, row) in incidence.iter().enumerate() {
                let value = row[p];
                if value == 1.0 {
                    if owner.is_some() {
                        return Err(ErieError::parameter(
                            format!("plant {p}"),
                            "several regions",
                            "each plant belongs to exactly one region",
                        ));
                    }
                    owner = Some(RegionId::new(r));
                } else if value != 0.0 {
                    return Err(ErieError::parameter(
                        format!("L[{r}][{p}]"),
                        value,
                        "incidence entries must be 0 or 1",
                    ));
                }
            }
            match owner {
                Some(region) => assignment.push(region),
                None => {
                    return Err(ErieError::parameter(
                        format!("plant {p}"),
                        "no region",
                        "each plant belongs to exactly one region",
                    ))
                }
            }
        }
        Ok(Self {
            n_regions,
            assignment,
        })
    }

    pub fn n_regions(&self) -> usize {
        self.n_regions
    }

    pub fn n_plants(&self) -> usize {
        self.assignment.len()
    }

    #[inline]
    pub fn region_of(&self, plant: usize) -> RegionId {
        self.assignment[plant]
    }

    #[inline]
    pub fn entry(&self, region: usize, plant: usize) -> f64 {
        if self.assignment[plant].index() == region {
            1.0
        } else {
            0.0
        }
    }

    pub fn plants_in(&self, region: RegionId) -> impl Iterator<Item = PlantId> + '_ {
        self.assignment
            .iter()
            .enumerate()
            .filter(move |(_, r)| **r == region)
            .map(|(p, _)| PlantId::new(p))
    }

    /// Computes `L · v`, summing a per-plant quantity into its region.
    pub fn aggregate(&self, per_plant: &[f64]) -> ErieResult<Vec<f64>> {
        ensure_len("per-plant operand", self.n_plants(), per_plant.len())?;
        let mut out = vec![0.0; self.n_regions];
        for (p, value) in per_plant.iter().enumerate() {
            out[self.assignment[p].index()] += value;
        }
        Ok(out)
    }
}

/// Everything about the watershed that does not change between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watershed {
    regions: Vec<Region>,
    sedimentation: SedimentationMatrix,
    plants: Vec<TreatmentPlant>,
    region_map: RegionPlantMap,
}

impl Watershed {
    /// Assembles a watershed from regions, transfer matrix, plant membership
    /// and per-plant names and flows, checking that all dimensions agree.
    pub fn new(
        regions: Vec<Region>,
        sedimentation: SedimentationMatrix,
        region_map: RegionPlantMap,
        plant_names: Vec<String>,
        flows: Vec<f64>,
    ) -> ErieResult<Self> {
        let n = regions.len();
        ensure_len("sedimentation matrix", n, sedimentation.dim())?;
        ensure_len("region-plant map regions", n, region_map.n_regions())?;
        ensure_len("plant names", region_map.n_plants(), plant_names.len())?;
        ensure_len("plant flows", region_map.n_plants(), flows.len())?;
        for (idx, region) in regions.iter().enumerate() {
            if region.id.index() != idx {
                return Err(ErieError::parameter(
                    format!("region {}", region.name),
                    region.id.index(),
                    format!("expected ordinal {idx}"),
                ));
            }
            let volume = region.volume.value();
            if volume.is_nan() || volume <= 0.0 {
                return Err(ErieError::parameter(
                    format!("volume of {}", region.name),
                    region.volume.value(),
                    "must be positive",
                ));
            }
        }

        let plants = plant_names
            .into_iter()
            .zip(flows)
            .enumerate()
            .map(|(p, (name, flow))| TreatmentPlant {
                id: PlantId::new(p),
                name,
                flow,
                region: region_map.region_of(p),
            })
            .collect();

        Ok(Self {
            regions,
            sedimentation,
            plants,
            region_map,
        })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region_names(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn region_by_name(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn sedimentation(&self) -> &SedimentationMatrix {
        &self.sedimentation
    }

    pub fn plants(&self) -> &[TreatmentPlant] {
        &self.plants
    }

    pub fn flows(&self) -> Vec<f64> {
        self.plants.iter().map(|p| p.flow).collect()
    }

    pub fn region_map(&self) -> &RegionPlantMap {
        &self.region_map
    }

    pub fn n_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn n_plants(&self) -> usize {
        self.plants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_matrix() -> SedimentationMatrix {
        SedimentationMatrix::from_lower_triangle(&[&[0.5], &[0.2, 0.4], &[0.1, 0.1, 0.3]]).unwrap()
    }

    #[test]
    fn sedimentation_mul_vec() {
        let s = small_matrix();
        let z = s.mul_vec(&[1.0, 2.0, 3.0]).unwrap();
        assert!((z[0] - 0.5).abs() < 1e-12);
        assert!((z[1] - 1.0).abs() < 1e-12);
        assert!((z[2] - 1.2).abs() < 1e-12);
    }

    #[test]
    fn sedimentation_rejects_upper_entries() {
        let err = SedimentationMatrix::new(vec![vec![1.0, 0.1], vec![0.0, 1.0]]).unwrap_err();
        assert!(err.to_string().contains("S[0][1]"));
    }

    #[test]
    fn sedimentation_rejects_zero_diagonal() {
        assert!(SedimentationMatrix::new(vec![vec![1.0, 0.0], vec![0.5, 0.0]]).is_err());
    }

    #[test]
    fn sedimentation_rejects_ragged_rows() {
        let err = SedimentationMatrix::new(vec![vec![1.0], vec![0.5, 1.0]]).unwrap_err();
        assert!(matches!(err, ErieError::Dimension { .. }));
    }

    #[test]
    fn incidence_round_trips_to_assignment() {
        let map = RegionPlantMap::from_incidence(&[
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ])
        .unwrap();
        assert_eq!(map.n_regions(), 3);
        assert_eq!(map.n_plants(), 4);
        assert_eq!(map.region_of(2), RegionId::new(1));
        assert_eq!(map.entry(1, 2), 1.0);
        assert_eq!(map.entry(0, 2), 0.0);
        let members: Vec<usize> = map.plants_in(RegionId::new(1)).map(|p| p.index()).collect();
        assert_eq!(members, vec![1, 2]);
        assert_eq!(map.aggregate(&[1.0, 2.0, 3.0, 4.0]).unwrap(), vec![1.0, 5.0, 4.0]);
    }

    #[test]
    fn incidence_rejects_shared_and_orphan_plants() {
        assert!(RegionPlantMap::from_incidence(&[vec![1.0, 0.0], vec![1.0, 0.0]]).is_err());
        assert!(RegionPlantMap::from_incidence(&[vec![0.5, 1.0], vec![0.5, 0.0]]).is_err());
    }

    #[test]
    fn assignment_rejects_out_of_range_region() {
        assert!(RegionPlantMap::from_assignments(2, vec![RegionId::new(2)]).is_err());
    }

    #[test]
    fn watershed_checks_dimensions() {
        let regions = vec![
            Region::new(0, "A", 1.0),
            Region::new(1, "B", 2.0),
            Region::new(2, "C", 3.0),
        ];
        let map = RegionPlantMap::from_assignments(3, vec![RegionId::new(0), RegionId::new(2)])
            .unwrap();
        let names = vec!["p1".to_string(), "p2".to_string()];

        let ws = Watershed::new(
            regions.clone(),
            small_matrix(),
            map.clone(),
            names.clone(),
            vec![10.0, 20.0],
        )
        .unwrap();
        assert_eq!(ws.n_plants(), 2);
        assert_eq!(ws.plants()[1].region, RegionId::new(2));
        assert_eq!(ws.region_by_name("B").map(|r| r.volume.value()), Some(2.0));

        let err = Watershed::new(regions, small_matrix(), map, names, vec![10.0]).unwrap_err();
        assert!(matches!(err, ErieError::Dimension { .. }));
    }
}
