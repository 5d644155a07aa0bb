//! [`IlpSolver`] backed by `good_lp` with the pure-Rust microlp engine.

use good_lp::solvers::microlp::MicroLpProblem;
use good_lp::{constraint, variable, Expression, ProblemVariables, SolverModel, Variable};
use microlp::{ResumeOptions, Solution, SolveOptions, SolveOutcome};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{
    AbortToken, Direction, IlpSolver, LinearExpr, LinearProgram, Relation, SolveStatus,
    SolverResponse, VarKind,
};

/// Longest stretch of search between two deadline and abort checks.
const SEARCH_SLICE: Duration = Duration::from_millis(100);

/// Branch-and-bound via microlp.
///
/// good_lp translates the program. The search then runs on the calling
/// thread in resumable slices of at most `slice`, so the time limit and an
/// abort both take effect within one slice and nothing keeps running after
/// `solve` returns. A search cut short with an incumbent reports
/// `TimeLimitReached` and its gap; one cut short without reports
/// `Interrupted`.
#[derive(Debug, Clone, Copy)]
pub struct MicroLpSolver {
    slice: Duration,
}

impl Default for MicroLpSolver {
    fn default() -> Self {
        Self {
            slice: SEARCH_SLICE,
        }
    }
}

impl MicroLpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_slice(slice: Duration) -> Self {
        Self {
            slice: slice.max(Duration::from_millis(1)),
        }
    }

    fn next_slice(&self, deadline: Instant) -> Duration {
        deadline
            .saturating_duration_since(Instant::now())
            .min(self.slice)
    }
}

impl IlpSolver for MicroLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(
        &self,
        program: &LinearProgram,
        time_limit: Duration,
        abort: &AbortToken,
    ) -> SolverResponse {
        if abort.is_aborted() {
            return SolverResponse::failed(
                SolveStatus::Interrupted,
                "aborted before the search started",
            );
        }

        let deadline = Instant::now() + time_limit;
        let model = build_model(program);

        let mut options = SolveOptions::default();
        options.time_limit = Some(self.next_slice(deadline));
        let mut outcome = match model.as_inner().solve_with(options) {
            Ok(outcome) => outcome,
            Err(e) => return from_error(e),
        };

        let mut slices = 1u32;
        while !outcome.is_optimal() {
            let reason = if abort.is_aborted() {
                "aborted"
            } else if Instant::now() >= deadline {
                "time limit reached"
            } else {
                let mut resume = ResumeOptions::default();
                resume.time_limit = Some(self.next_slice(deadline));
                outcome = match outcome.resume_with(resume) {
                    Ok(next) => next,
                    Err(e) => return from_error(e),
                };
                slices += 1;
                continue;
            };
            debug!(reason, slices, "microlp search stopped early");
            return stopped(program, outcome, reason);
        }

        debug!(slices, "microlp proved optimality");
        match outcome.into_solution() {
            Ok(solution) => {
                SolverResponse::solved(SolveStatus::Optimal, read_values(program, &solution))
                    .with_gap(0.0)
            }
            Err(_) => SolverResponse::failed(
                SolveStatus::SolverError,
                "optimal outcome carried no assignment",
            ),
        }
    }
}

/// Response for a search cut short by its budget or an abort.
fn stopped(program: &LinearProgram, outcome: SolveOutcome, reason: &str) -> SolverResponse {
    match outcome.into_solution() {
        Ok(solution) => {
            let response = SolverResponse::solved(
                SolveStatus::TimeLimitReached,
                read_values(program, &solution),
            );
            match solution.gap() {
                Some(gap) => response.with_gap(gap),
                None => response,
            }
        }
        Err(_) => SolverResponse::failed(
            SolveStatus::Interrupted,
            format!("{} before a feasible assignment was found", reason),
        ),
    }
}

fn from_error(e: microlp::Error) -> SolverResponse {
    match e {
        microlp::Error::Infeasible => {
            SolverResponse::failed(SolveStatus::Infeasible, "no assignment satisfies the model")
        }
        microlp::Error::Unbounded => {
            SolverResponse::failed(SolveStatus::SolverError, "objective is unbounded")
        }
        other => SolverResponse::failed(SolveStatus::SolverError, other.to_string()),
    }
}

/// Values in declaration order; microlp numbers variables the same way.
fn read_values(program: &LinearProgram, solution: &Solution) -> Vec<f64> {
    program
        .variables()
        .iter()
        .zip(solution.iter())
        .map(|(decl, (_, value))| match decl.kind {
            VarKind::Continuous { .. } => value,
            VarKind::Binary | VarKind::Integer { .. } => value.round(),
        })
        .collect()
}

/// Translates the program into a good_lp model on microlp.
fn build_model(program: &LinearProgram) -> MicroLpProblem {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = program
        .variables()
        .iter()
        .map(|decl| {
            let def = variable().name(decl.name.clone());
            let def = match decl.kind {
                VarKind::Binary => def.binary(),
                VarKind::Integer { lower, upper } => {
                    let def = def.integer().min(lower);
                    match upper {
                        Some(upper) => def.max(upper),
                        None => def,
                    }
                }
                VarKind::Continuous { lower, upper } => {
                    let def = def.min(lower);
                    match upper {
                        Some(upper) => def.max(upper),
                        None => def,
                    }
                }
            };
            vars.add(def)
        })
        .collect();

    let objective = to_expression(program.objective(), &handles, 1.0);
    let unsolved = match program.direction() {
        Direction::Minimize => vars.minimise(objective),
        Direction::Maximize => vars.maximise(objective),
    };
    let mut model = unsolved.using(good_lp::microlp);

    for c in program.constraints() {
        let translated = match c.relation {
            Relation::Eq => constraint::eq(to_expression(&c.expr, &handles, 1.0), c.rhs),
            Relation::Leq => constraint::leq(to_expression(&c.expr, &handles, 1.0), c.rhs),
            // a >= b  <=>  -a <= -b
            Relation::Geq => constraint::leq(to_expression(&c.expr, &handles, -1.0), -c.rhs),
        };
        let _ = model.add_constraint(translated);
    }
    model
}

fn to_expression(expr: &LinearExpr, handles: &[Variable], sign: f64) -> Expression {
    let mut out = Expression::with_capacity(expr.terms().len());
    for &(var, coefficient) in expr.terms() {
        out.add_mul(sign * coefficient, handles[var.index()]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn knapsack() -> LinearProgram {
        let mut lp = LinearProgram::new();
        let a = lp.declare_binary("a");
        let b = lp.declare_binary("b");
        let c = lp.declare_binary("c");
        let weights = LinearExpr::new()
            .with_term(a, 3.0)
            .with_term(b, 4.0)
            .with_term(c, 2.0);
        lp.add_linear_constraint("capacity", weights, Relation::Leq, 6.0);
        let value = LinearExpr::new()
            .with_term(a, 4.0)
            .with_term(b, 5.0)
            .with_term(c, 3.0);
        lp.set_objective(value, Direction::Maximize);
        lp
    }

    /// `Σ 2·x_i = n` for odd `n`: the relaxation stays feasible deep into the
    /// tree, so branch-and-bound needs exponentially many nodes to give up.
    fn odd_parity(n: usize) -> LinearProgram {
        let mut lp = LinearProgram::new();
        let xs: Vec<_> = (0..n).map(|i| lp.declare_binary(format!("x{}", i))).collect();
        let mut sum = LinearExpr::new();
        for &x in &xs {
            sum.add_term(x, 2.0);
        }
        lp.add_linear_constraint("parity", sum, Relation::Eq, n as f64);
        lp.set_objective(LinearExpr::sum(xs), Direction::Minimize);
        lp
    }

    /// The parity model with a costly unit slack: any leaf is an incumbent,
    /// proving the slack unnecessary is the slow part.
    fn odd_parity_with_slack(n: usize) -> LinearProgram {
        let mut lp = LinearProgram::new();
        let xs: Vec<_> = (0..n).map(|i| lp.declare_binary(format!("x{}", i))).collect();
        let slack = lp.declare_continuous("slack", 0.0, Some(1.0));
        let mut sum = LinearExpr::new();
        for &x in &xs {
            sum.add_term(x, 2.0);
        }
        sum.add_term(slack, 1.0);
        lp.add_linear_constraint("parity", sum, Relation::Eq, n as f64);
        lp.set_objective(LinearExpr::new().with_term(slack, 1000.0), Direction::Minimize);
        lp
    }

    #[test]
    fn test_solves_small_knapsack() {
        let lp = knapsack();
        let response = MicroLpSolver::new().solve(&lp, Duration::from_secs(10), &AbortToken::new());

        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(response.gap, Some(0.0));
        let values = response.values.unwrap();
        assert!(lp.is_feasible(&values, 1e-6));
        // b + c beats a + c.
        assert_eq!(lp.objective_value(&values), 8.0);
    }

    #[test]
    fn test_geq_and_integer_bounds() {
        let mut lp = LinearProgram::new();
        let n = lp.declare_integer("n", 0.0, Some(10.0));
        let slack = lp.declare_continuous("slack", 0.0, None);
        lp.add_linear_constraint(
            "at_least",
            LinearExpr::sum([n, slack]),
            Relation::Geq,
            2.5,
        );
        lp.set_objective(
            LinearExpr::new().with_term(n, 1.0).with_term(slack, 10.0),
            Direction::Minimize,
        );

        let response = MicroLpSolver::new().solve(&lp, Duration::from_secs(10), &AbortToken::new());
        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(response.value(n), Some(3.0));
    }

    #[test]
    fn test_reports_infeasible() {
        let mut lp = LinearProgram::new();
        let a = lp.declare_binary("a");
        lp.add_linear_constraint("impossible", LinearExpr::sum([a]), Relation::Geq, 2.0);
        lp.set_objective(LinearExpr::sum([a]), Direction::Minimize);

        let response = MicroLpSolver::new().solve(&lp, Duration::from_secs(10), &AbortToken::new());
        assert_eq!(response.status, SolveStatus::Infeasible);
        assert!(response.values.is_none());
    }

    #[test]
    fn test_many_short_slices_still_reach_optimality() {
        let lp = knapsack();
        let response = MicroLpSolver::with_search_slice(Duration::from_millis(1)).solve(
            &lp,
            Duration::from_secs(10),
            &AbortToken::new(),
        );
        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(lp.objective_value(&response.values.unwrap()), 8.0);
    }

    #[test]
    fn test_pre_aborted_returns_immediately() {
        let abort = AbortToken::new();
        abort.abort();

        let started = Instant::now();
        let response = MicroLpSolver::new().solve(&knapsack(), Duration::from_secs(60), &abort);

        assert_eq!(response.status, SolveStatus::Interrupted);
        assert!(response.message.unwrap().contains("aborted"));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_time_limit_without_incumbent_is_interrupted() {
        let started = Instant::now();
        let response = MicroLpSolver::new().solve(
            &odd_parity(41),
            Duration::from_millis(300),
            &AbortToken::new(),
        );
        let elapsed = started.elapsed();

        assert_eq!(response.status, SolveStatus::Interrupted);
        assert!(response.values.is_none());
        assert!(response.message.unwrap().contains("time limit reached"));
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
    }

    #[test]
    fn test_time_limit_keeps_incumbent() {
        let lp = odd_parity_with_slack(41);
        let response = MicroLpSolver::new().solve(&lp, Duration::from_millis(500), &AbortToken::new());

        assert_eq!(response.status, SolveStatus::TimeLimitReached);
        let values = response.values.as_deref().unwrap();
        assert!(lp.is_feasible(values, 1e-6));
        // Odd parity forces the whole slack in.
        assert!((lp.objective_value(values) - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_abort_during_search_returns_promptly() {
        let abort = AbortToken::new();
        let remote = abort.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            remote.abort();
        });

        let started = Instant::now();
        let response = MicroLpSolver::new().solve(&odd_parity(41), Duration::from_secs(60), &abort);
        let elapsed = started.elapsed();
        stopper.join().unwrap();

        assert_eq!(response.status, SolveStatus::Interrupted);
        assert!(response.message.unwrap().contains("aborted"));
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
    }
}
