use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

fn data_dir() -> String {
    repo_path("data").to_str().unwrap().to_string()
}

#[test]
fn health_reports_service() {
    cargo_bin_cmd!("erie-cli")
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"healthy\""))
        .stdout(predicate::str::contains("lake_erie_optimization"));
}

#[test]
fn data_validate_summarizes_tables() {
    let output = cargo_bin_cmd!("erie-cli")
        .args(["data", "validate", "--data-dir", &data_dir()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["regions"], 6);
    assert_eq!(summary["plants"], 14);
    assert_eq!(summary["plants_per_region"]["CB"], 3);
}

#[test]
fn target_plan_meets_central_basin_target() {
    let out_dir = tempdir().unwrap();
    let csv = out_dir.path().join("plan.csv");
    let output = cargo_bin_cmd!("erie-cli")
        .args([
            "optimize",
            "target",
            "--data-dir",
            &data_dir(),
            "--csv",
            csv.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(response.get("error").is_none());
    assert_eq!(response["model_info"]["type"], "Target-Based");
    assert_eq!(response["model_info"]["objective_units"], "million CAD/year");
    let cb = response["results"]["concentration_changes"]["CB"].as_f64().unwrap();
    assert!(cb >= 212.0 / 318.7 - 1e-6);

    let exported = fs::read_to_string(&csv).unwrap();
    let mut lines = exported.lines();
    assert_eq!(
        lines.next(),
        Some("REGION,AGRO_ABATE_t,WWTP_ABATE_t,TOTAL_ABATE_t,NUMBER_WWTP,DELTA_PPB,DELTA_LOAD_t")
    );
    assert_eq!(lines.count(), 6);
}

#[test]
fn budget_plan_written_to_file() {
    let out_dir = tempdir().unwrap();
    let out = out_dir.path().join("response.json");
    cargo_bin_cmd!("erie-cli")
        .args([
            "optimize",
            "budget",
            "--budget",
            "50",
            "--data-dir",
            &data_dir(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let response: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(response["model_info"]["budget"], 50.0);
    assert!(response["model_info"]["plan_cost"].as_f64().unwrap() <= 50.0 + 1e-6);
}

#[test]
fn unreachable_target_reports_infeasibility() {
    cargo_bin_cmd!("erie-cli")
        .args([
            "optimize",
            "target",
            "--data-dir",
            &data_dir(),
            "--targets",
            "0,0,0,0,100,0",
            "--agro-capacity",
            "0,0,0,0,0,0",
            "--enforce-capacity",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "No feasible solution found. Model status: infeasible",
        ))
        .stdout(predicate::str::contains("\"results\"").not());
}

#[test]
fn wrong_target_length_is_rejected() {
    cargo_bin_cmd!("erie-cli")
        .args([
            "optimize",
            "target",
            "--data-dir",
            &data_dir(),
            "--targets",
            "0,0,1",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("dimension_error"));
}

#[test]
fn missing_tables_fail_with_context() {
    let empty = tempdir().unwrap();
    cargo_bin_cmd!("erie-cli")
        .args([
            "optimize",
            "budget",
            "--data-dir",
            empty.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading plant tables"));
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("erie.toml");
    fs::write(
        &config,
        format!(
            "[policy]\nfilter_efficiency = 1.5\n\n[data]\ndir = {:?}\n",
            data_dir()
        ),
    )
    .unwrap();

    cargo_bin_cmd!("erie-cli")
        .args(["--config", config.to_str().unwrap(), "optimize", "target"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("filter_efficiency"));
}
