//! Pure-Rust solver adapter built on `good_lp` + `microlp`.
//!
//! `microlp` handles mixed-integer linear programs only, so every squared
//! term `a · v²` is replaced with `a · s` for an epigraph variable `s`, and
//! the model is solved twice over a shared set of breakpoints `p_k`:
//!
//! ```text
//! restriction:  s >= (p_k + p_{k+1}) v - p_k p_{k+1}    secants, s >= v²
//! relaxation:   s >= 2 p_k v - p_k²                     tangents, s <= v²
//! ```
//!
//! The restriction yields a point feasible for the original problem and the
//! relaxation bounds the true optimum from the other side. While their
//! relative gap exceeds [`MicrolpConfig::gap_tolerance`] both points are added
//! as breakpoints and the pair is solved again. The reported objective is
//! always the exact quadratic value at the returned point. When the
//! refinement rounds run out above the tolerance the status is
//! [`SolutionStatus::Suboptimal`] and the message carries the gap.
//!
//! Squared variables need finite bounds and nonnegative coefficients in
//! `<=` rows and minimized objectives; anything else is rejected.
//!
//! Each solve runs on its own worker thread. A timeout or cancellation stops
//! the worker at its next checkpoint between MILP solves, and at most
//! [`MicrolpConfig::max_workers`] workers run at once.

use erie_solver_common::{
    CancelToken, Comparison, ObjectiveSense, ProblemDescription, QuadraticExpr, SolutionStatus,
    SolveOptions, SolverAdapter, SolverError, SolverOutput, SolverResult,
};
use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const SOLVER_NAME: &str = "microlp";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Adapter configuration
#[derive(Debug, Clone)]
pub struct MicrolpConfig {
    /// Initial uniform segments per squared variable
    pub segments: usize,
    /// Largest relative gap between restriction and relaxation reported as optimal
    pub gap_tolerance: f64,
    /// Refinement rounds after the initial grid
    pub max_refinements: usize,
    /// Workers allowed at once, including ones still winding down after a timeout
    pub max_workers: usize,
}

impl Default for MicrolpConfig {
    fn default() -> Self {
        Self {
            segments: 64,
            gap_tolerance: 1e-6,
            max_refinements: 10,
            max_workers: 8,
        }
    }
}

/// Mixed-integer adapter with secant/tangent linearization of squared terms.
#[derive(Debug, Clone, Default)]
pub struct MicrolpAdapter {
    config: MicrolpConfig,
    live_workers: Arc<AtomicUsize>,
}

impl MicrolpAdapter {
    pub fn new(config: MicrolpConfig) -> Self {
        Self {
            config,
            live_workers: Arc::default(),
        }
    }

    pub fn with_segments(segments: usize) -> Self {
        Self::new(MicrolpConfig {
            segments,
            ..MicrolpConfig::default()
        })
    }

    pub fn config(&self) -> &MicrolpConfig {
        &self.config
    }

    /// Worker threads that have not exited yet.
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    fn check_config(&self) -> SolverResult<()> {
        if self.config.segments == 0 {
            return Err(SolverError::InvalidProblem(
                "linearization needs at least one segment".into(),
            ));
        }
        if self.config.gap_tolerance.is_nan() || self.config.gap_tolerance < 0.0 {
            return Err(SolverError::InvalidProblem(format!(
                "gap tolerance must be nonnegative, got {}",
                self.config.gap_tolerance
            )));
        }
        Ok(())
    }
}

impl SolverAdapter for MicrolpAdapter {
    fn name(&self) -> &str {
        SOLVER_NAME
    }

    fn solve(
        &self,
        problem: &ProblemDescription,
        options: &SolveOptions,
    ) -> SolverResult<SolverOutput> {
        problem.validate()?;
        check_supported(problem)?;
        self.check_config()?;

        let slot = WorkerSlot::acquire(&self.live_workers, self.config.max_workers).ok_or(
            SolverError::Busy {
                limit: self.config.max_workers,
            },
        )?;

        let start = Instant::now();
        debug!(
            problem = %problem.name,
            kind = %problem.problem_type(),
            variables = problem.num_variables(),
            segments = self.config.segments,
            "dispatching to microlp"
        );

        let owned = problem.clone();
        let config = self.config.clone();
        let stop = CancelToken::new();
        let worker_stop = stop.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("erie-microlp".into())
            .spawn(move || {
                let _slot = slot;
                let outcome = refine(&owned, &config, &worker_stop);
                // The receiver is gone after a timeout or cancellation.
                let _ = tx.send(outcome);
            })
            .map_err(SolverError::WorkerStart)?;

        let outcome = wait_for_worker(&rx, start, options.time_limit, &options.cancel)
            .map_err(|err| {
                stop.cancel();
                err
            })?;
        let solve_time = start.elapsed();

        match outcome {
            Outcome::Solved {
                values,
                bound,
                gap,
                rounds,
            } => {
                let objective = problem.evaluate_objective(&values);
                let violation = problem.max_violation(&values);
                if violation > 1e-6 {
                    warn!(violation, "microlp point violates the original problem");
                }
                debug!(objective, bound, gap, rounds, ?solve_time, "microlp finished");
                if gap <= self.config.gap_tolerance {
                    Ok(SolverOutput::optimal(objective, values, solve_time))
                } else {
                    Ok(SolverOutput::suboptimal(objective, values, solve_time).with_message(
                        format!(
                            "relative gap {gap:.3e} above tolerance {:.1e} after {rounds} \
                             refinement rounds (bound {bound})",
                            self.config.gap_tolerance
                        ),
                    ))
                }
            }
            Outcome::NoPoint { rounds } => Ok(SolverOutput::without_solution(
                SolutionStatus::Error,
                solve_time,
            )
            .with_message(format!(
                "no point satisfies the secant restriction after {rounds} refinement rounds"
            ))),
            Outcome::Failed(ResolutionError::Infeasible) => Ok(SolverOutput::without_solution(
                SolutionStatus::Infeasible,
                solve_time,
            )),
            Outcome::Failed(ResolutionError::Unbounded) => Ok(SolverOutput::without_solution(
                SolutionStatus::Unbounded,
                solve_time,
            )),
            Outcome::Failed(other) => Ok(SolverOutput::without_solution(
                SolutionStatus::Error,
                solve_time,
            )
            .with_message(other.to_string())),
            Outcome::Abandoned => Err(SolverError::Cancelled),
        }
    }
}

/// Counts a running worker until dropped.
struct WorkerSlot(Arc<AtomicUsize>);

impl WorkerSlot {
    fn acquire(live: &Arc<AtomicUsize>, limit: usize) -> Option<Self> {
        live.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            (n < limit).then_some(n + 1)
        })
        .ok()
        .map(|_| Self(Arc::clone(live)))
    }
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Blocks until the worker reports, the deadline passes or the token fires.
fn wait_for_worker<T>(
    rx: &mpsc::Receiver<T>,
    start: Instant,
    time_limit: Option<Duration>,
    cancel: &CancelToken,
) -> SolverResult<T> {
    let deadline = time_limit.map(|limit| start + limit);
    loop {
        if cancel.is_cancelled() {
            return Err(SolverError::Cancelled);
        }
        let slice = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(SolverError::Timeout {
                        seconds: time_limit.map_or(0.0, |l| l.as_secs_f64()),
                    });
                }
                (deadline - now).min(POLL_INTERVAL)
            }
            None => POLL_INTERVAL,
        };
        match rx.recv_timeout(slice) {
            Ok(value) => return Ok(value),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Err(SolverError::WorkerLost),
        }
    }
}

fn unsupported(reason: String) -> SolverError {
    SolverError::Unsupported {
        solver: SOLVER_NAME.into(),
        reason,
    }
}

fn check_supported(problem: &ProblemDescription) -> SolverResult<()> {
    if problem.sense == ObjectiveSense::Maximize && !problem.objective.is_linear() {
        return Err(unsupported("quadratic terms in a maximized objective".into()));
    }
    for expr in quadratic_parts(problem) {
        for (var, coef) in &expr.squares {
            let spec = problem.variable(*var);
            if *coef < 0.0 {
                return Err(unsupported(format!(
                    "negative coefficient {coef} on `{}`²",
                    spec.name
                )));
            }
            if !spec.lower.is_finite() || !spec.upper.is_finite() {
                return Err(unsupported(format!(
                    "squared variable `{}` needs finite bounds",
                    spec.name
                )));
            }
        }
    }
    Ok(())
}

fn quadratic_parts(problem: &ProblemDescription) -> impl Iterator<Item = &QuadraticExpr> {
    std::iter::once(&problem.objective).chain(problem.quadratic_constraints.iter().map(|c| &c.expr))
}

/// What the worker sends back.
enum Outcome {
    /// Best restriction point, the relaxation bound and their relative gap.
    Solved {
        values: Vec<f64>,
        bound: f64,
        gap: f64,
        rounds: usize,
    },
    /// The relaxation is feasible but no restriction was.
    NoPoint { rounds: usize },
    Failed(ResolutionError),
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cuts {
    Secant,
    Tangent,
}

/// Sorted breakpoints per variable; empty for variables that are never squared.
#[derive(Debug, Clone)]
struct Breakpoints(Vec<Vec<f64>>);

impl Breakpoints {
    fn uniform(problem: &ProblemDescription, segments: usize) -> Self {
        let squared: BTreeSet<usize> = quadratic_parts(problem)
            .flat_map(|expr| expr.squares.iter().map(|(var, _)| var.index()))
            .collect();
        let mut points = vec![Vec::new(); problem.num_variables()];
        for idx in squared {
            let spec = &problem.variables[idx];
            let (lo, hi) = (spec.lower, spec.upper);
            points[idx] = if hi > lo {
                let step = (hi - lo) / segments as f64;
                (0..=segments)
                    .map(|k| if k == segments { hi } else { lo + step * k as f64 })
                    .collect()
            } else {
                vec![lo]
            };
        }
        Self(points)
    }

    fn is_empty(&self) -> bool {
        self.0.iter().all(Vec::is_empty)
    }

    /// Adds `values[i]` to every nonempty breakpoint list; returns how many were new.
    fn insert(&mut self, values: &[f64]) -> usize {
        let mut added = 0;
        for (points, &v) in self.0.iter_mut().zip(values) {
            let (Some(&lo), Some(&hi)) = (points.first(), points.last()) else {
                continue;
            };
            if !v.is_finite() {
                continue;
            }
            let v = v.clamp(lo, hi);
            let eps = 1e-9 * (hi - lo).max(1.0);
            let pos = points.partition_point(|&p| p < v);
            let near = |i: usize| points.get(i).is_some_and(|&p| (p - v).abs() <= eps);
            if near(pos) || (pos > 0 && near(pos - 1)) {
                continue;
            }
            points.insert(pos, v);
            added += 1;
        }
        added
    }
}

/// Relative distance between a feasible objective and the bound, scaled by
/// the larger magnitude and never by less than one.
fn relative_gap(sense: ObjectiveSense, primal: f64, bound: f64) -> f64 {
    let diff = match sense {
        ObjectiveSense::Minimize => primal - bound,
        ObjectiveSense::Maximize => bound - primal,
    };
    diff.max(0.0) / primal.abs().max(bound.abs()).max(1.0)
}

fn improves(sense: ObjectiveSense, candidate: f64, incumbent: f64) -> bool {
    match sense {
        ObjectiveSense::Minimize => candidate < incumbent,
        ObjectiveSense::Maximize => candidate > incumbent,
    }
}

/// Alternates relaxation and restriction solves until the gap closes, the
/// rounds run out or `stop` fires.
fn refine(problem: &ProblemDescription, config: &MicrolpConfig, stop: &CancelToken) -> Outcome {
    let mut breakpoints = Breakpoints::uniform(problem, config.segments);
    if breakpoints.is_empty() {
        if stop.is_cancelled() {
            return Outcome::Abandoned;
        }
        return match solve_linearized(problem, &breakpoints, Cuts::Secant) {
            Ok(point) => Outcome::Solved {
                values: point.values,
                bound: point.objective,
                gap: 0.0,
                rounds: 0,
            },
            Err(err) => Outcome::Failed(err),
        };
    }

    let mut best: Option<(Vec<f64>, f64)> = None;
    let mut round = 0;
    loop {
        if stop.is_cancelled() {
            return Outcome::Abandoned;
        }
        let relaxed = match solve_linearized(problem, &breakpoints, Cuts::Tangent) {
            Ok(point) => point,
            Err(err) => return Outcome::Failed(err),
        };

        if stop.is_cancelled() {
            return Outcome::Abandoned;
        }
        let restricted = match solve_linearized(problem, &breakpoints, Cuts::Secant) {
            Ok(point) => Some(point),
            Err(ResolutionError::Infeasible) => None,
            Err(err) => return Outcome::Failed(err),
        };
        if let Some(point) = &restricted {
            let exact = problem.evaluate_objective(&point.values);
            if best
                .as_ref()
                .map_or(true, |(_, incumbent)| improves(problem.sense, exact, *incumbent))
            {
                best = Some((point.values.clone(), exact));
            }
        }

        let gap = best
            .as_ref()
            .map(|(_, exact)| relative_gap(problem.sense, *exact, relaxed.objective));
        debug!(round, bound = relaxed.objective, ?gap, "linearization round");

        let converged = gap.is_some_and(|g| g <= config.gap_tolerance);
        let mut added = 0;
        if !converged && round < config.max_refinements {
            added += breakpoints.insert(&relaxed.values);
            if let Some(point) = &restricted {
                added += breakpoints.insert(&point.values);
            }
        }
        if added == 0 {
            return match best {
                Some((values, _)) => Outcome::Solved {
                    values,
                    bound: relaxed.objective,
                    gap: gap.unwrap_or(f64::INFINITY),
                    rounds: round,
                },
                None => Outcome::NoPoint { rounds: round },
            };
        }
        round += 1;
    }
}

/// Solution of one linearized MILP.
struct LinearPoint {
    /// Values of the original variables.
    values: Vec<f64>,
    /// Objective with every square replaced by its epigraph variable.
    objective: f64,
}

/// Builds and solves the MILP with `cuts` at `breakpoints`.
fn solve_linearized(
    problem: &ProblemDescription,
    breakpoints: &Breakpoints,
    cuts: Cuts,
) -> Result<LinearPoint, ResolutionError> {
    let mut vars = variables!();

    let originals: Vec<Variable> = problem
        .variables
        .iter()
        .map(|spec| {
            let def = variable().min(spec.lower).max(spec.upper);
            vars.add(if spec.integer { def.integer() } else { def })
        })
        .collect();

    // One epigraph variable per squared variable, shared by every row.
    let mut epigraphs: Vec<Option<Variable>> = vec![None; originals.len()];
    let mut rows: Vec<Expression> = Vec::new();
    for (idx, points) in breakpoints.0.iter().enumerate() {
        let (Some(&lo), Some(&hi)) = (points.first(), points.last()) else {
            continue;
        };
        let s_min = if lo <= 0.0 && hi >= 0.0 {
            0.0
        } else {
            (lo * lo).min(hi * hi)
        };
        let s_max = (lo * lo).max(hi * hi);
        let s = vars.add(variable().min(s_min).max(s_max));
        let v = originals[idx];
        // each row reads s + slope · v + offset >= 0
        let mut push = |slope: f64, offset: f64| {
            let mut row = Expression::from(offset);
            row.add_mul(1.0, s);
            row.add_mul(slope, v);
            rows.push(row);
        };
        match cuts {
            Cuts::Secant => {
                for pair in points.windows(2) {
                    let (p, q) = (pair[0], pair[1]);
                    push(-(p + q), p * q);
                }
            }
            Cuts::Tangent => {
                for &p in points {
                    push(-2.0 * p, p * p);
                }
            }
        }
        epigraphs[idx] = Some(s);
    }

    let linearize = |expr: &QuadraticExpr| -> Expression {
        let mut out = Expression::from(expr.linear.constant);
        for (var, coef) in &expr.linear.terms {
            out.add_mul(*coef, originals[var.index()]);
        }
        for (var, coef) in &expr.squares {
            if let Some(s) = epigraphs[var.index()] {
                out.add_mul(*coef, s);
            }
        }
        out
    };

    let objective = linearize(&problem.objective);
    let mut model = match problem.sense {
        ObjectiveSense::Minimize => vars.minimise(objective).using(microlp),
        ObjectiveSense::Maximize => vars.maximise(objective).using(microlp),
    };

    for row in rows {
        model = model.with(constraint!(row >= 0.0));
    }
    for c in &problem.linear_constraints {
        let lhs = linearize(&QuadraticExpr::from(c.expr.clone()));
        model = match c.cmp {
            Comparison::LessEq => model.with(constraint!(lhs <= c.rhs)),
            Comparison::GreaterEq => model.with(constraint!(lhs >= c.rhs)),
            Comparison::Equal => model.with(constraint!(lhs == c.rhs)),
        };
    }
    for c in &problem.quadratic_constraints {
        let lhs = linearize(&c.expr);
        model = model.with(constraint!(lhs <= c.rhs));
    }

    let solution = model.solve()?;
    let values: Vec<f64> = originals.iter().map(|v| solution.value(*v)).collect();
    let squares: Vec<Option<f64>> = epigraphs
        .iter()
        .map(|s| s.map(|s| solution.value(s)))
        .collect();
    let objective = linearized_value(&problem.objective, &values, &squares);
    Ok(LinearPoint { values, objective })
}

/// Value of `expr` with `squares[i]` standing in for `values[i]²`.
fn linearized_value(expr: &QuadraticExpr, values: &[f64], squares: &[Option<f64>]) -> f64 {
    let quadratic: f64 = expr
        .squares
        .iter()
        .map(|(var, coef)| {
            let idx = var.index();
            coef * squares[idx].unwrap_or(values[idx] * values[idx])
        })
        .sum();
    quadratic + expr.linear.evaluate(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use erie_solver_common::{LinearExpr, VariableSpec};

    fn options() -> SolveOptions {
        SolveOptions::default().with_time_limit(Some(Duration::from_secs(30)))
    }

    #[test]
    fn solves_linear_program() {
        // max x + 2y  s.t.  x + y <= 4, x, y in [0, 3]
        let mut problem = ProblemDescription::new("lp", ObjectiveSense::Maximize);
        let x = problem.add_variable(VariableSpec::continuous("x", 0.0, 3.0));
        let y = problem.add_variable(VariableSpec::continuous("y", 0.0, 3.0));
        let mut obj = LinearExpr::new();
        obj.add_term(x, 1.0).add_term(y, 2.0);
        problem.set_objective(obj);
        let mut row = LinearExpr::new();
        row.add_term(x, 1.0).add_term(y, 1.0);
        problem.add_linear_constraint("cap", row, Comparison::LessEq, 4.0);

        let out = MicrolpAdapter::default().solve(&problem, &options()).unwrap();
        assert_eq!(out.status, SolutionStatus::Optimal);
        assert!((out.values[0] - 1.0).abs() < 1e-6);
        assert!((out.values[1] - 3.0).abs() < 1e-6);
        assert!((out.objective.unwrap() - 7.0).abs() < 1e-6);
    }

    /// min x²  s.t.  x >= 1.5, x in [0, 4]; optimum 2.25
    fn floored_square() -> ProblemDescription {
        let mut problem = ProblemDescription::new("qp", ObjectiveSense::Minimize);
        let x = problem.add_variable(VariableSpec::continuous("x", 0.0, 4.0));
        let mut obj = QuadraticExpr::new();
        obj.add_square(x, 1.0);
        problem.set_objective(obj);
        let mut row = LinearExpr::new();
        row.add_term(x, 1.0);
        problem.add_linear_constraint("floor", row, Comparison::GreaterEq, 1.5);
        problem
    }

    fn wait_until_idle(adapter: &MicrolpAdapter) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while adapter.live_workers() > 0 {
            assert!(Instant::now() < deadline, "solver worker still running");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn quadratic_objective_is_close_to_true_optimum() {
        let problem = floored_square();
        let out = MicrolpAdapter::default().solve(&problem, &options()).unwrap();
        assert_eq!(out.status, SolutionStatus::Optimal);
        assert!(out.values[0] >= 1.5 - 1e-7);
        // reported objective is x² at the returned point, not the secant value
        let x_val = out.values[0];
        assert!((out.objective.unwrap() - x_val * x_val).abs() < 1e-9);
        assert!((out.objective.unwrap() - 2.25).abs() < 1e-5);
    }

    #[test]
    fn refinement_closes_a_coarse_grid() {
        let problem = floored_square();
        let adapter = MicrolpAdapter::with_segments(1);
        let out = adapter.solve(&problem, &options()).unwrap();
        assert_eq!(out.status, SolutionStatus::Optimal);
        assert!((out.objective.unwrap() - 2.25).abs() < 1e-6);
    }

    #[test]
    fn gap_left_after_refinements_is_suboptimal() {
        let problem = floored_square();
        let adapter = MicrolpAdapter::new(MicrolpConfig {
            segments: 1,
            max_refinements: 0,
            ..MicrolpConfig::default()
        });
        let out = adapter.solve(&problem, &options()).unwrap();
        // secant [0, 4] gives x = 1.5 while the tangents only bound the optimum by 0
        assert_eq!(out.status, SolutionStatus::Suboptimal);
        assert!((out.values[0] - 1.5).abs() < 1e-6);
        assert!((out.objective.unwrap() - 2.25).abs() < 1e-6);
        let message = out.message.unwrap();
        assert!(message.contains("relative gap"), "{message}");
    }

    #[test]
    fn negative_gap_tolerance_is_rejected() {
        let adapter = MicrolpAdapter::new(MicrolpConfig {
            gap_tolerance: -1.0,
            ..MicrolpConfig::default()
        });
        let err = adapter.solve(&floored_square(), &options()).unwrap_err();
        assert!(matches!(err, SolverError::InvalidProblem(_)));
    }

    #[test]
    fn breakpoints_skip_duplicates_and_unsquared_variables() {
        let mut problem = ProblemDescription::new("grid", ObjectiveSense::Minimize);
        let x = problem.add_variable(VariableSpec::continuous("x", 0.0, 4.0));
        problem.add_variable(VariableSpec::continuous("y", 0.0, 4.0));
        let mut obj = QuadraticExpr::new();
        obj.add_square(x, 1.0);
        problem.set_objective(obj);

        let mut points = Breakpoints::uniform(&problem, 2);
        assert_eq!(points.0[0], vec![0.0, 2.0, 4.0]);
        assert!(points.0[1].is_empty());
        assert_eq!(points.insert(&[1.0, 1.0]), 1);
        assert_eq!(points.insert(&[1.0 + 1e-12, 3.0]), 0);
        assert_eq!(points.insert(&[9.0, 0.0]), 0);
        assert_eq!(points.0[0], vec![0.0, 1.0, 2.0, 4.0]);
    }

    #[test]
    fn quadratic_budget_row_is_never_exceeded() {
        // max x + y  s.t.  x² + y² <= 2, x, y in [0, 2]
        let mut problem = ProblemDescription::new("qcp", ObjectiveSense::Maximize);
        let x = problem.add_variable(VariableSpec::continuous("x", 0.0, 2.0));
        let y = problem.add_variable(VariableSpec::continuous("y", 0.0, 2.0));
        let mut obj = LinearExpr::new();
        obj.add_term(x, 1.0).add_term(y, 1.0);
        problem.set_objective(obj);
        let mut budget = QuadraticExpr::new();
        budget.add_square(x, 1.0).add_square(y, 1.0);
        problem.add_quadratic_constraint("budget", budget, 2.0);

        let out = MicrolpAdapter::with_segments(32).solve(&problem, &options()).unwrap();
        let (xv, yv) = (out.values[0], out.values[1]);
        assert!(xv * xv + yv * yv <= 2.0 + 1e-7);
        assert!(out.objective.unwrap() > 1.95);
    }

    #[test]
    fn integer_variables_stay_integral() {
        // min 3w + x²  s.t.  x + 2w >= 2, w binary, x in [0, 2]
        let mut problem = ProblemDescription::new("miqp", ObjectiveSense::Minimize);
        let x = problem.add_variable(VariableSpec::continuous("x", 0.0, 2.0));
        let w = problem.add_variable(VariableSpec::binary("w"));
        let mut obj = QuadraticExpr::new();
        obj.add_square(x, 1.0).add_term(w, 3.0);
        problem.set_objective(obj);
        let mut row = LinearExpr::new();
        row.add_term(x, 1.0).add_term(w, 2.0);
        problem.add_linear_constraint("cover", row, Comparison::GreaterEq, 2.0);

        let out = MicrolpAdapter::default().solve(&problem, &options()).unwrap();
        // w = 1 costs 3, x = 2 costs 4
        assert!((out.values[1] - 1.0).abs() < 1e-6);
        assert!(out.values[0].abs() < 1e-6);
        assert!((out.objective.unwrap() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn infeasible_is_a_status_not_an_error() {
        let mut problem = ProblemDescription::new("infeasible", ObjectiveSense::Minimize);
        let x = problem.add_variable(VariableSpec::continuous("x", 0.0, 1.0));
        let mut row = LinearExpr::new();
        row.add_term(x, 1.0);
        problem.add_linear_constraint("impossible", row, Comparison::GreaterEq, 5.0);

        let out = MicrolpAdapter::default().solve(&problem, &options()).unwrap();
        assert_eq!(out.status, SolutionStatus::Infeasible);
        assert!(out.values.is_empty());
    }

    #[test]
    fn rejects_unbounded_squared_variable() {
        let mut problem = ProblemDescription::new("bad", ObjectiveSense::Minimize);
        let x = problem.add_variable(VariableSpec::continuous("x", 0.0, f64::INFINITY));
        let mut obj = QuadraticExpr::new();
        obj.add_square(x, 1.0);
        problem.set_objective(obj);
        let err = MicrolpAdapter::default().solve(&problem, &options()).unwrap_err();
        assert!(matches!(err, SolverError::Unsupported { .. }));
    }

    #[test]
    fn rejects_maximized_quadratic() {
        let mut problem = ProblemDescription::new("bad", ObjectiveSense::Maximize);
        let x = problem.add_variable(VariableSpec::continuous("x", 0.0, 1.0));
        let mut obj = QuadraticExpr::new();
        obj.add_square(x, 1.0);
        problem.set_objective(obj);
        assert!(MicrolpAdapter::default().solve(&problem, &options()).is_err());
    }

    #[test]
    fn zero_time_limit_times_out() {
        let mut problem = ProblemDescription::new("lp", ObjectiveSense::Minimize);
        problem.add_variable(VariableSpec::continuous("x", 0.0, 1.0));
        let options = SolveOptions::default().with_time_limit(Some(Duration::ZERO));
        let adapter = MicrolpAdapter::default();
        let err = adapter.solve(&problem, &options).unwrap_err();
        assert!(matches!(err, SolverError::Timeout { .. }));
        wait_until_idle(&adapter);
    }

    #[test]
    fn cancelled_token_stops_the_wait() {
        let mut problem = ProblemDescription::new("lp", ObjectiveSense::Minimize);
        problem.add_variable(VariableSpec::continuous("x", 0.0, 1.0));
        let cancel = CancelToken::new();
        cancel.cancel();
        let options = SolveOptions::default().with_cancel(cancel);
        let err = MicrolpAdapter::default().solve(&problem, &options).unwrap_err();
        assert!(matches!(err, SolverError::Cancelled));
    }

    #[test]
    fn cancelled_worker_exits() {
        let adapter = MicrolpAdapter::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let cancelled = options().with_cancel(cancel);
        for _ in 0..4 {
            let err = adapter.solve(&floored_square(), &cancelled).unwrap_err();
            assert!(matches!(err, SolverError::Cancelled));
        }
        wait_until_idle(&adapter);
        // the slots are free again
        let out = adapter.solve(&floored_square(), &options()).unwrap();
        assert!(out.status.has_solution());
        wait_until_idle(&adapter);
    }

    #[test]
    fn worker_limit_reports_busy() {
        let adapter = MicrolpAdapter::new(MicrolpConfig {
            max_workers: 0,
            ..MicrolpConfig::default()
        });
        let err = adapter.solve(&floored_square(), &options()).unwrap_err();
        assert!(matches!(err, SolverError::Busy { limit: 0 }));
        assert_eq!(adapter.live_workers(), 0);
    }

    #[test]
    fn fixed_squared_variable_needs_no_cuts() {
        let mut problem = ProblemDescription::new("fixed", ObjectiveSense::Minimize);
        let x = problem.add_variable(VariableSpec::continuous("x", 0.0, 0.0));
        let mut obj = QuadraticExpr::new();
        obj.add_square(x, 5.0);
        problem.set_objective(obj);
        let out = MicrolpAdapter::default().solve(&problem, &options()).unwrap();
        assert_eq!(out.status, SolutionStatus::Optimal);
        assert_eq!(out.objective, Some(0.0));
    }
}
