use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use erie_algo::{
    MicrolpAdapter, MicrolpConfig, OptimizationRequest, OptimizationResponse, PlanMode, Planner,
};
use erie_cli::cli::{OptimizeCommands, PolicyArgs, RunArgs};
use erie_core::reference;
use erie_io::{write_plan_csv, ErieConfig};
use tracing::info;

use super::{load_config, load_watershed};

pub fn handle(command: &OptimizeCommands, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    let (plan, policy, run) = match command {
        OptimizeCommands::Target {
            targets,
            policy,
            run,
        } => (
            PlanMode::Target {
                targets: targets.clone().unwrap_or_else(reference::default_targets),
            },
            policy,
            run,
        ),
        OptimizeCommands::Budget {
            budget,
            weights,
            policy,
            run,
        } => (
            PlanMode::Budget {
                budget: budget.unwrap_or(reference::DEFAULT_BUDGET),
                weights: weights.clone(),
            },
            policy,
            run,
        ),
    };
    apply_policy(&mut config, policy);
    apply_run(&mut config, run);

    let request = OptimizationRequest {
        plan,
        policy: config.policy.clone(),
    };
    let response = solve(&config, &request, run)?;
    emit(&response, run)?;

    match response.error {
        Some(err) => Err(anyhow!("{} ({})", err.message, err.kind)),
        None => Ok(()),
    }
}

fn apply_policy(config: &mut ErieConfig, args: &PolicyArgs) {
    let policy = &mut config.policy;
    if let Some(v) = args.filter_efficiency {
        policy.filter_efficiency = v;
    }
    if let Some(v) = args.maintenance_cost {
        policy.maintenance_cost = v;
    }
    if let Some(v) = args.eligibility_threshold {
        policy.eligibility_threshold = v;
    }
    if let Some(costs) = &args.agro_costs {
        policy.agro_costs = costs.clone();
    }
    if let Some(capacity) = &args.agro_capacity {
        policy.agro_capacity = Some(capacity.clone());
    }
}

fn apply_run(config: &mut ErieConfig, args: &RunArgs) {
    if let Some(dir) = &args.data_dir {
        config.data.dir = dir.clone();
    }
    if let Some(limit) = args.time_limit {
        config.solver.time_limit_seconds = Some(limit);
    }
    if let Some(segments) = args.segments {
        config.solver.linearization_segments = segments;
    }
    if let Some(tolerance) = args.gap_tolerance {
        config.solver.gap_tolerance = tolerance;
    }
    if args.enforce_capacity {
        config.model.enforce_capacity = true;
    }
}

/// Runs the request; planning failures become an error response, setup
/// failures (unreadable tables or config) are returned as errors.
fn solve(
    config: &ErieConfig,
    request: &OptimizationRequest,
    run: &RunArgs,
) -> Result<OptimizationResponse> {
    let watershed = load_watershed(config)?;
    let adapter = MicrolpAdapter::new(MicrolpConfig {
        segments: config.solver.linearization_segments,
        gap_tolerance: config.solver.gap_tolerance,
        max_refinements: config.solver.max_refinements,
        max_workers: config.solver.max_workers,
    });
    let planner = Planner::new(watershed, Arc::new(adapter))
        .with_model_options(config.model.clone())
        .with_time_limit(config.solver.time_limit());

    info!(mode = %request.plan.model_mode(), "optimizing");

    let (response, record) = planner.respond_with_record(request);
    if let Some(record) = &record {
        if run.summary {
            eprint!("{}", record.summary());
        }
        if let (Some(path), Some(plan)) = (&run.csv, &record.plan) {
            write_plan_csv(plan, path)
                .with_context(|| format!("writing regional results to {}", path.display()))?;
        }
    }
    Ok(response)
}

fn emit(response: &OptimizationResponse, run: &RunArgs) -> Result<()> {
    match &run.out {
        Some(path) => {
            let json = serde_json::to_string_pretty(response).context("serializing response")?;
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "wrote response");
            Ok(())
        }
        None => super::print_json(response),
    }
}
