//! Error types for the optimization pipeline.

use thiserror::Error;

/// Why an optimization run produced no schedule.
///
/// A run that hits its time limit while holding an assignment is not an
/// error: it yields a
/// [`ScheduleResult`](crate::extract::ScheduleResult) whose status is
/// [`SolveStatus::TimeLimitReached`](crate::ilp::SolveStatus::TimeLimitReached).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    /// The roster, demand profile or configuration was rejected before a
    /// model was built.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The solver proved infeasibility.
    #[error("model is infeasible: {0}")]
    Infeasible(String),
    /// The time budget ran out, or the run was aborted, before the solver
    /// held any assignment.
    #[error("solve interrupted: {0}")]
    Interrupted(String),
    /// The solver failed internally.
    #[error("solver error: {0}")]
    Solver(String),
}

impl OptimizeError {
    /// Short machine-readable kind, used in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizeError::InvalidInput(_) => "INVALID_INPUT",
            OptimizeError::Infeasible(_) => "INFEASIBLE",
            OptimizeError::Interrupted(_) => "INTERRUPTED",
            OptimizeError::Solver(_) => "SOLVER_ERROR",
        }
    }
}

pub(crate) fn invalid(msg: impl Into<String>) -> OptimizeError {
    OptimizeError::InvalidInput(msg.into())
}
