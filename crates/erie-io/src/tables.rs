//! Plant reference tables.
//!
//! Two CSV files describe the treatment plants:
//!
//! - `Lmat.csv`: header of region names, then one row per plant with a `1`
//!   under the region it discharges into and `0` elsewhere.
//! - `fvec.csv`: header, then one row per plant. The last column is the
//!   annual flow (thousand m³/year); a leading column, when present, names
//!   the plant.
//!
//! Rows are matched positionally across the two files.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use erie_core::{reference, Region, RegionPlantMap, SedimentationMatrix, Watershed};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DataError, DataResult};

pub const REGION_MAP_FILE: &str = "Lmat.csv";
pub const FLOWS_FILE: &str = "fvec.csv";

/// Plant names and flows read from `fvec.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowTable {
    pub names: Vec<String>,
    pub flows: Vec<f64>,
}

fn open_csv(path: &Path) -> DataResult<csv::Reader<File>> {
    let file = File::open(path).map_err(|err| DataError::io(path, err))?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn parse_cell(path: &Path, row: usize, column: &str, raw: &str) -> DataResult<f64> {
    raw.parse::<f64>().map_err(|_| {
        DataError::layout(path, row, format!("`{raw}` in column `{column}` is not a number"))
    })
}

/// Reads the plant-to-region incidence table.
///
/// Columns are matched to `regions` by name and reordered into region order.
/// When no header matches any region name the columns are taken in file
/// order, provided their count equals the region count.
pub fn load_region_map(path: &Path, regions: &[Region]) -> DataResult<RegionPlantMap> {
    let mut reader = open_csv(path)?;
    let headers = reader
        .headers()
        .map_err(|err| DataError::csv(path, err))?
        .clone();
    let columns = column_order(path, &headers, regions)?;

    let mut incidence = vec![Vec::new(); regions.len()];
    for (i, record) in reader.records().enumerate() {
        let row = i + 2;
        let record = record.map_err(|err| DataError::csv(path, err))?;
        for (r, &col) in columns.iter().enumerate() {
            let value = parse_cell(path, row, &headers[col], &record[col])?;
            if value != 0.0 && value != 1.0 {
                return Err(DataError::layout(
                    path,
                    row,
                    format!("`{}` must be 0 or 1, found {value}", &headers[col]),
                ));
            }
            incidence[r].push(value);
        }
    }

    if incidence.first().map_or(true, Vec::is_empty) {
        return Err(DataError::layout(path, 1, "no plant rows"));
    }
    debug!(path = %path.display(), plants = incidence[0].len(), "read region map");
    Ok(RegionPlantMap::from_incidence(&incidence)?)
}

/// Index of the column holding each region, in region order.
fn column_order(path: &Path, headers: &StringRecord, regions: &[Region]) -> DataResult<Vec<usize>> {
    let by_name: Vec<Option<usize>> = regions
        .iter()
        .map(|region| headers.iter().position(|h| h == region.name))
        .collect();

    if by_name.iter().all(Option::is_some) {
        return Ok(by_name.into_iter().flatten().collect());
    }
    if by_name.iter().any(Option::is_some) {
        let missing: Vec<&str> = regions
            .iter()
            .zip(&by_name)
            .filter(|(_, col)| col.is_none())
            .map(|(region, _)| region.name.as_str())
            .collect();
        return Err(DataError::layout(
            path,
            1,
            format!("header lacks region columns {}", missing.join(", ")),
        ));
    }
    if headers.len() != regions.len() {
        return Err(DataError::layout(
            path,
            1,
            format!(
                "expected {} region columns, found {}",
                regions.len(),
                headers.len()
            ),
        ));
    }
    warn!(
        path = %path.display(),
        "region map header does not name any region; using column order"
    );
    Ok((0..regions.len()).collect())
}

/// Reads plant flows, naming unnamed plants `WWTP-001`, `WWTP-002`, ...
pub fn load_flows(path: &Path) -> DataResult<FlowTable> {
    let mut reader = open_csv(path)?;
    let mut table = FlowTable {
        names: Vec::new(),
        flows: Vec::new(),
    };

    for (i, record) in reader.records().enumerate() {
        let row = i + 2;
        let record = record.map_err(|err| DataError::csv(path, err))?;
        let Some(raw) = record.iter().last() else {
            return Err(DataError::layout(path, row, "empty row"));
        };
        let flow = parse_cell(path, row, "flow", raw)?;
        let name = match record.len() {
            0 | 1 => format!("WWTP-{:03}", i + 1),
            _ => record[0].to_string(),
        };
        table.names.push(name);
        table.flows.push(flow);
    }

    if table.flows.is_empty() {
        return Err(DataError::layout(path, 1, "no plant rows"));
    }
    debug!(path = %path.display(), plants = table.flows.len(), "read flows");
    Ok(table)
}

/// Loads both tables from `dir` and validates them against the fixed data.
pub fn load_watershed(
    dir: &Path,
    regions: Vec<Region>,
    sedimentation: SedimentationMatrix,
) -> DataResult<Watershed> {
    load_watershed_from(
        &dir.join(REGION_MAP_FILE),
        &dir.join(FLOWS_FILE),
        regions,
        sedimentation,
    )
}

pub fn load_watershed_from(
    region_map_path: &Path,
    flows_path: &Path,
    regions: Vec<Region>,
    sedimentation: SedimentationMatrix,
) -> DataResult<Watershed> {
    let region_map = load_region_map(region_map_path, &regions)?;
    let flows = load_flows(flows_path)?;
    let watershed = Watershed::new(regions, sedimentation, region_map, flows.names, flows.flows)?;
    info!(
        regions = watershed.n_regions(),
        plants = watershed.n_plants(),
        "loaded watershed"
    );
    Ok(watershed)
}

/// Plant tables from `dir` combined with the Lake Erie regions and sedimentation.
pub fn load_reference_watershed(dir: &Path) -> DataResult<Watershed> {
    load_watershed(dir, reference::regions(), reference::sedimentation()?)
}

/// Overview printed by `data validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub regions: usize,
    pub plants: usize,
    pub plants_per_region: BTreeMap<String, usize>,
    pub total_flow: f64,
    pub max_flow: f64,
    /// Plants above `threshold`, which can never be upgraded.
    pub ineligible_plants: usize,
    pub threshold: f64,
}

impl DataSummary {
    pub fn of(watershed: &Watershed, threshold: f64) -> Self {
        let flows = watershed.flows();
        let plants_per_region = watershed
            .regions()
            .iter()
            .map(|region| {
                let count = watershed.region_map().plants_in(region.id).count();
                (region.name.clone(), count)
            })
            .collect();
        Self {
            regions: watershed.n_regions(),
            plants: watershed.n_plants(),
            plants_per_region,
            total_flow: flows.iter().sum(),
            max_flow: flows.iter().copied().fold(0.0, f64::max),
            ineligible_plants: flows.iter().filter(|&&f| f > threshold).count(),
            threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn regions() -> Vec<Region> {
        vec![
            Region::new(0, "A", 1.0),
            Region::new(1, "B", 2.0),
            Region::new(2, "C", 3.0),
        ]
    }

    #[test]
    fn columns_are_reordered_by_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Lmat.csv");
        fs::write(&path, "C,A,B\n0,1,0\n1,0,0\n0,0,1\n").unwrap();
        let map = load_region_map(&path, &regions()).unwrap();
        assert_eq!(map.n_plants(), 3);
        assert_eq!(map.region_of(0).index(), 0);
        assert_eq!(map.region_of(1).index(), 2);
        assert_eq!(map.region_of(2).index(), 1);
    }

    #[test]
    fn unnamed_columns_fall_back_to_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Lmat.csv");
        fs::write(&path, "r1,r2,r3\n0,1,0\n").unwrap();
        let map = load_region_map(&path, &regions()).unwrap();
        assert_eq!(map.region_of(0).index(), 1);
    }

    #[test]
    fn partially_named_header_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Lmat.csv");
        fs::write(&path, "A,B,X\n1,0,0\n").unwrap();
        let err = load_region_map(&path, &regions()).unwrap_err();
        assert!(err.to_string().contains("lacks region columns C"));
    }

    #[test]
    fn non_binary_entry_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Lmat.csv");
        fs::write(&path, "A,B,C\n1,0,0\n0,0.5,0\n").unwrap();
        let err = load_region_map(&path, &regions()).unwrap_err();
        assert!(matches!(err, DataError::Layout { row: 3, .. }));
    }

    #[test]
    fn flows_with_and_without_names() {
        let dir = tempdir().unwrap();
        let named = dir.path().join("named.csv");
        fs::write(&named, "plant,flow\nWindsor,1200.5\nLondon,800\n").unwrap();
        let table = load_flows(&named).unwrap();
        assert_eq!(table.names, vec!["Windsor", "London"]);
        assert_eq!(table.flows, vec![1200.5, 800.0]);

        let bare = dir.path().join("bare.csv");
        fs::write(&bare, "flow\n10\n20\n").unwrap();
        let table = load_flows(&bare).unwrap();
        assert_eq!(table.names, vec!["WWTP-001", "WWTP-002"]);
    }

    #[test]
    fn non_numeric_flow_reports_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fvec.csv");
        fs::write(&path, "flow\n10\nlots\n").unwrap();
        let err = load_flows(&path).unwrap_err();
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn summary_counts_plants_per_region() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(REGION_MAP_FILE), "A,B,C\n1,0,0\n0,0,1\n0,0,1\n").unwrap();
        fs::write(dir.path().join(FLOWS_FILE), "flow\n5\n50\n500\n").unwrap();
        let s = SedimentationMatrix::from_lower_triangle(&[&[1.0], &[0.5, 1.0], &[0.2, 0.2, 1.0]])
            .unwrap();
        let watershed = load_watershed(dir.path(), regions(), s).unwrap();
        let summary = DataSummary::of(&watershed, 100.0);
        assert_eq!(summary.plants, 3);
        assert_eq!(summary.plants_per_region["C"], 2);
        assert_eq!(summary.plants_per_region["B"], 0);
        assert_eq!(summary.total_flow, 555.0);
        assert_eq!(summary.ineligible_plants, 1);
    }
}
