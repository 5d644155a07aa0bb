//! Solver-agnostic mixed-integer linear program.
//!
//! A [`LinearProgram`] is a plain value: variables are declared on it, linear
//! constraints and one objective are attached, and an [`IlpSolver`] turns it
//! into a [`SolverResponse`]. Nothing here knows about shifts.

mod backend;

pub use self::backend::MicroLpSolver;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

/// Index of a declared variable in its [`LinearProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarHandle(usize);

impl VarHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a declared variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarKind {
    Binary,
    Integer { lower: f64, upper: Option<f64> },
    Continuous { lower: f64, upper: Option<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub kind: VarKind,
}

/// Sum of `coefficient * variable` terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarHandle, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    /// `Σ vars` with unit coefficients.
    pub fn sum(vars: impl IntoIterator<Item = VarHandle>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
        }
    }

    pub fn add_term(&mut self, var: VarHandle, coefficient: f64) -> &mut Self {
        self.terms.push((var, coefficient));
        self
    }

    pub fn with_term(mut self, var: VarHandle, coefficient: f64) -> Self {
        self.terms.push((var, coefficient));
        self
    }

    /// Appends `factor * other`.
    pub fn add_scaled(&mut self, other: &LinearExpr, factor: f64) -> &mut Self {
        self.terms
            .extend(other.terms.iter().map(|&(v, c)| (v, c * factor)));
        self
    }

    pub fn terms(&self) -> &[(VarHandle, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression under `values[var.index()]`.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * values.get(v.index()).copied().unwrap_or(0.0))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Leq,
    Geq,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Whether `values` satisfy the constraint within `tolerance`.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.relation {
            Relation::Eq => (lhs - self.rhs).abs() <= tolerance,
            Relation::Leq => lhs <= self.rhs + tolerance,
            Relation::Geq => lhs >= self.rhs - tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
}

/// Variables, constraints and objective of one optimization instance.
///
/// # Examples
///
/// ```
/// use shift_scheduler::ilp::{Direction, LinearExpr, LinearProgram, Relation};
///
/// let mut lp = LinearProgram::new();
/// let a = lp.declare_binary("a");
/// let b = lp.declare_integer("b", 0.0, Some(3.0));
/// lp.add_linear_constraint("cap", LinearExpr::sum([a, b]), Relation::Leq, 2.0);
/// lp.set_objective(LinearExpr::sum([a, b]), Direction::Maximize);
///
/// assert_eq!(lp.variable_count(), 2);
/// assert_eq!(lp.constraint_count(), 1);
/// assert!(lp.is_feasible(&[1.0, 1.0], 1e-6));
/// assert!(!lp.is_feasible(&[1.0, 2.0], 1e-6));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LinearProgram {
    variables: Vec<VarDecl>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
    direction: Direction,
}

impl LinearProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_binary(&mut self, name: impl Into<String>) -> VarHandle {
        self.declare(name.into(), VarKind::Binary)
    }

    pub fn declare_integer(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: Option<f64>,
    ) -> VarHandle {
        self.declare(name.into(), VarKind::Integer { lower, upper })
    }

    pub fn declare_continuous(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: Option<f64>,
    ) -> VarHandle {
        self.declare(name.into(), VarKind::Continuous { lower, upper })
    }

    fn declare(&mut self, name: String, kind: VarKind) -> VarHandle {
        self.variables.push(VarDecl { name, kind });
        VarHandle(self.variables.len() - 1)
    }

    pub fn add_linear_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            expr,
            relation,
            rhs,
        });
    }

    pub fn set_objective(&mut self, expr: LinearExpr, direction: Direction) {
        self.objective = expr;
        self.direction = direction;
    }

    pub fn variables(&self) -> &[VarDecl] {
        &self.variables
    }

    pub fn variable(&self, var: VarHandle) -> &VarDecl {
        &self.variables[var.index()]
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Checks every constraint and variable bound against `values`.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let bounds_ok = self.variables.iter().zip(values).all(|(decl, &v)| {
            let (lower, upper) = match decl.kind {
                VarKind::Binary => (0.0, Some(1.0)),
                VarKind::Integer { lower, upper } | VarKind::Continuous { lower, upper } => {
                    (lower, upper)
                }
            };
            v >= lower - tolerance && upper.map_or(true, |u| v <= u + tolerance)
        });
        bounds_ok
            && self
                .constraints
                .iter()
                .all(|c| c.is_satisfied(values, tolerance))
    }
}

/// How a solve call terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// Stopped by the time budget or an abort; the incumbent is usable.
    TimeLimitReached,
    /// Stopped by the time budget or an abort before any incumbent existed.
    Interrupted,
    Infeasible,
    SolverError,
}

impl SolveStatus {
    /// Whether the response carries a usable assignment.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::TimeLimitReached)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::TimeLimitReached => "TIME_LIMIT_REACHED",
            SolveStatus::Interrupted => "INTERRUPTED",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::SolverError => "SOLVER_ERROR",
        }
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`IlpSolver::solve`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResponse {
    pub status: SolveStatus,
    /// One value per declared variable; present iff the status has a solution.
    pub values: Option<Vec<f64>>,
    /// Relative MIP gap of the returned assignment, when the backend knows it.
    pub gap: Option<f64>,
    pub message: Option<String>,
}

impl SolverResponse {
    pub fn solved(status: SolveStatus, values: Vec<f64>) -> Self {
        Self {
            status,
            values: Some(values),
            gap: None,
            message: None,
        }
    }

    pub fn failed(status: SolveStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            values: None,
            gap: None,
            message: Some(message.into()),
        }
    }

    pub fn with_gap(mut self, gap: f64) -> Self {
        self.gap = Some(gap);
        self
    }

    /// Value lookup for one variable.
    pub fn value(&self, var: VarHandle) -> Option<f64> {
        self.values.as_ref()?.get(var.index()).copied()
    }
}

/// External abort request shared between the caller and a running solve.
///
/// Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A mixed-integer solver.
///
/// Implementations must return within roughly `time_limit` and promptly after
/// `abort` fires, reporting `TimeLimitReached` with their incumbent or
/// `Interrupted` when they have none.
pub trait IlpSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(
        &self,
        program: &LinearProgram,
        time_limit: Duration,
        abort: &AbortToken,
    ) -> SolverResponse;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_evaluation() {
        let mut lp = LinearProgram::new();
        let a = lp.declare_binary("a");
        let b = lp.declare_continuous("b", 0.0, None);
        let mut expr = LinearExpr::new();
        expr.add_term(a, 2.0).add_term(b, -0.5);
        assert_eq!(expr.evaluate(&[1.0, 4.0]), 0.0);

        let mut scaled = LinearExpr::sum([a]);
        scaled.add_scaled(&expr, 10.0);
        assert_eq!(scaled.evaluate(&[1.0, 2.0]), 11.0);
    }

    #[test]
    fn test_bounds_checked_in_feasibility() {
        let mut lp = LinearProgram::new();
        let _ = lp.declare_integer("n", 1.0, Some(3.0));
        assert!(lp.is_feasible(&[2.0], 1e-9));
        assert!(!lp.is_feasible(&[0.0], 1e-9));
        assert!(!lp.is_feasible(&[4.0], 1e-9));
        assert!(!lp.is_feasible(&[], 1e-9));
    }

    #[test]
    fn test_relations() {
        let mut lp = LinearProgram::new();
        let a = lp.declare_continuous("a", 0.0, None);
        lp.add_linear_constraint("ge", LinearExpr::sum([a]), Relation::Geq, 2.0);
        lp.add_linear_constraint("eq", LinearExpr::sum([a]), Relation::Eq, 2.0);
        assert!(lp.is_feasible(&[2.0], 1e-9));
        assert!(!lp.is_feasible(&[1.0], 1e-9));
    }

    #[test]
    fn test_abort_token_is_shared() {
        let token = AbortToken::new();
        let clone = token.clone();
        assert!(!token.is_aborted());
        clone.abort();
        assert!(token.is_aborted());
    }

    #[test]
    fn test_status_has_solution() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::TimeLimitReached.has_solution());
        assert!(!SolveStatus::Interrupted.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::SolverError.has_solution());
        assert_eq!(SolveStatus::TimeLimitReached.to_string(), "TIME_LIMIT_REACHED");
    }
}
