//! Solver-independent problem representation.
//!
//! A [`ProblemDescription`] holds bounded (possibly integer) variables, a
//! separable quadratic objective, linear constraints and separable quadratic
//! `<=` constraints. Adapters translate it into whatever their backend speaks.

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

/// Index of a variable inside a [`ProblemDescription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(usize);

impl VariableId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub integer: bool,
}

impl VariableSpec {
    pub fn continuous(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            integer: false,
        }
    }

    pub fn integer(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            integer: true,
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self::integer(name, 0.0, 1.0)
    }
}

/// `Σ coef · var + constant`. Repeated variables are summed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    pub terms: Vec<(VariableId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `coef · var`; zero coefficients are dropped.
    pub fn add_term(&mut self, var: VariableId, coef: f64) -> &mut Self {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
        self
    }

    /// Appends `factor · other`.
    pub fn add_scaled(&mut self, other: &LinearExpr, factor: f64) -> &mut Self {
        for &(var, coef) in &other.terms {
            self.add_term(var, coef * factor);
        }
        self.constant += other.constant * factor;
        self
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|(var, coef)| coef * values[var.index()])
                .sum::<f64>()
    }
}

/// `Σ coef · var² + linear`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadraticExpr {
    pub squares: Vec<(VariableId, f64)>,
    pub linear: LinearExpr,
}

impl QuadraticExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_square(&mut self, var: VariableId, coef: f64) -> &mut Self {
        if coef != 0.0 {
            self.squares.push((var, coef));
        }
        self
    }

    pub fn add_term(&mut self, var: VariableId, coef: f64) -> &mut Self {
        self.linear.add_term(var, coef);
        self
    }

    pub fn is_linear(&self) -> bool {
        self.squares.is_empty()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        let quadratic: f64 = self
            .squares
            .iter()
            .map(|(var, coef)| {
                let v = values[var.index()];
                coef * v * v
            })
            .sum();
        quadratic + self.linear.evaluate(values)
    }
}

impl From<LinearExpr> for QuadraticExpr {
    fn from(linear: LinearExpr) -> Self {
        Self {
            squares: Vec::new(),
            linear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    LessEq,
    GreaterEq,
    Equal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Amount by which `values` violate this constraint, zero when satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expr.evaluate(values);
        match self.cmp {
            Comparison::LessEq => (lhs - self.rhs).max(0.0),
            Comparison::GreaterEq => (self.rhs - lhs).max(0.0),
            Comparison::Equal => (lhs - self.rhs).abs(),
        }
    }
}

/// `expr <= rhs` with a separable quadratic left-hand side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticConstraint {
    pub name: String,
    pub expr: QuadraticExpr,
    pub rhs: f64,
}

impl QuadraticConstraint {
    pub fn violation(&self, values: &[f64]) -> f64 {
        (self.expr.evaluate(values) - self.rhs).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// Problem class, from the most to the least specialized backend requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    /// Linear Program
    Lp,
    /// Quadratic objective, linear constraints
    Qp,
    /// Quadratic constraints
    Qcp,
    /// Mixed-Integer Linear Program
    Milp,
    /// Mixed-Integer Quadratic Program
    Miqp,
    /// Mixed-Integer Quadratically Constrained Program
    Miqcp,
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemType::Lp => write!(f, "LP"),
            ProblemType::Qp => write!(f, "QP"),
            ProblemType::Qcp => write!(f, "QCP"),
            ProblemType::Milp => write!(f, "MILP"),
            ProblemType::Miqp => write!(f, "MIQP"),
            ProblemType::Miqcp => write!(f, "MIQCP"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDescription {
    pub name: String,
    pub sense: ObjectiveSense,
    pub objective: QuadraticExpr,
    pub variables: Vec<VariableSpec>,
    pub linear_constraints: Vec<LinearConstraint>,
    pub quadratic_constraints: Vec<QuadraticConstraint>,
}

impl ProblemDescription {
    pub fn new(name: impl Into<String>, sense: ObjectiveSense) -> Self {
        Self {
            name: name.into(),
            sense,
            objective: QuadraticExpr::new(),
            variables: Vec::new(),
            linear_constraints: Vec::new(),
            quadratic_constraints: Vec::new(),
        }
    }

    pub fn add_variable(&mut self, spec: VariableSpec) -> VariableId {
        self.variables.push(spec);
        VariableId(self.variables.len() - 1)
    }

    pub fn set_objective(&mut self, objective: impl Into<QuadraticExpr>) {
        self.objective = objective.into();
    }

    pub fn add_linear_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: f64,
    ) {
        self.linear_constraints.push(LinearConstraint {
            name: name.into(),
            expr,
            cmp,
            rhs,
        });
    }

    pub fn add_quadratic_constraint(&mut self, name: impl Into<String>, expr: QuadraticExpr, rhs: f64) {
        self.quadratic_constraints.push(QuadraticConstraint {
            name: name.into(),
            expr,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn variable(&self, id: VariableId) -> &VariableSpec {
        &self.variables[id.index()]
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.integer).count()
    }

    pub fn problem_type(&self) -> ProblemType {
        let integer = self.num_integer_variables() > 0;
        let quad_constraints = !self.quadratic_constraints.is_empty();
        let quad_objective = !self.objective.is_linear();
        match (integer, quad_constraints, quad_objective) {
            (false, false, false) => ProblemType::Lp,
            (false, false, true) => ProblemType::Qp,
            (false, true, _) => ProblemType::Qcp,
            (true, false, false) => ProblemType::Milp,
            (true, false, true) => ProblemType::Miqp,
            (true, true, _) => ProblemType::Miqcp,
        }
    }

    /// Checks that every referenced variable exists, every coefficient is
    /// finite and every variable has `lower <= upper`.
    pub fn validate(&self) -> SolverResult<()> {
        let n = self.variables.len();
        for spec in &self.variables {
            if spec.lower.is_nan() || spec.upper.is_nan() || spec.lower > spec.upper {
                return Err(SolverError::InvalidProblem(format!(
                    "variable `{}` has bounds [{}, {}]",
                    spec.name, spec.lower, spec.upper
                )));
            }
        }

        let check_linear = |owner: &str, expr: &LinearExpr| -> SolverResult<()> {
            if !expr.constant.is_finite() {
                return Err(SolverError::InvalidProblem(format!(
                    "`{owner}` has a non-finite constant"
                )));
            }
            for (var, coef) in &expr.terms {
                if var.index() >= n {
                    return Err(SolverError::InvalidProblem(format!(
                        "`{owner}` references unknown variable #{}",
                        var.index()
                    )));
                }
                if !coef.is_finite() {
                    return Err(SolverError::InvalidProblem(format!(
                        "`{owner}` has a non-finite coefficient on `{}`",
                        self.variables[var.index()].name
                    )));
                }
            }
            Ok(())
        };
        let check_quadratic = |owner: &str, expr: &QuadraticExpr| -> SolverResult<()> {
            let squares = LinearExpr {
                terms: expr.squares.clone(),
                constant: 0.0,
            };
            check_linear(owner, &squares)?;
            check_linear(owner, &expr.linear)
        };

        check_quadratic("objective", &self.objective)?;
        for c in &self.linear_constraints {
            check_linear(&c.name, &c.expr)?;
            if !c.rhs.is_finite() {
                return Err(SolverError::InvalidProblem(format!(
                    "`{}` has a non-finite right-hand side",
                    c.name
                )));
            }
        }
        for c in &self.quadratic_constraints {
            check_quadratic(&c.name, &c.expr)?;
            if !c.rhs.is_finite() {
                return Err(SolverError::InvalidProblem(format!(
                    "`{}` has a non-finite right-hand side",
                    c.name
                )));
            }
        }
        Ok(())
    }

    pub fn evaluate_objective(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Largest bound or constraint violation of `values`.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let bounds = self
            .variables
            .iter()
            .zip(values)
            .map(|(spec, &v)| (spec.lower - v).max(v - spec.upper).max(0.0));
        let linear = self.linear_constraints.iter().map(|c| c.violation(values));
        let quadratic = self.quadratic_constraints.iter().map(|c| c.violation(values));
        bounds.chain(linear).chain(quadratic).fold(0.0, f64::max)
    }
}
