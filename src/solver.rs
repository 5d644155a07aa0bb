//! Solver service: job registry and background solving.
//!
//! Each job runs the optimizer pipeline once on tokio's blocking pool and
//! reports its outcome through a oneshot channel.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::console::{self, PhaseTimer};
use crate::error::OptimizeError;
use crate::extract::ScheduleResult;
use crate::ilp::{AbortToken, IlpSolver, MicroLpSolver};
use crate::optimizer::{prepare, solve_model, ScheduleProblem};

/// What a finished job produced.
pub type SolveOutcome = Result<ScheduleResult, OptimizeError>;

/// Status of a solving job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    /// Not currently solving.
    NotSolving,
    /// Actively solving.
    Solving,
}

impl SolverStatus {
    /// Returns the status as a SCREAMING_SNAKE_CASE string for API responses.
    ///
    /// ```
    /// use shift_scheduler::solver::SolverStatus;
    ///
    /// assert_eq!(SolverStatus::NotSolving.as_str(), "NOT_SOLVING");
    /// assert_eq!(SolverStatus::Solving.as_str(), "SOLVING");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::NotSolving => "NOT_SOLVING",
            SolverStatus::Solving => "SOLVING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("job {0} not found")]
    NotFound(String),
    #[error("job {0} is already solving")]
    AlreadySolving(String),
}

impl JobError {
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::NotFound(_) => "NOT_FOUND",
            JobError::AlreadySolving(_) => "ALREADY_SOLVING",
        }
    }
}

/// A scheduling job with its current state.
pub struct SolveJob {
    pub id: String,
    pub status: SolverStatus,
    pub problem: ScheduleProblem,
    /// Set once the run completes.
    pub outcome: Option<SolveOutcome>,
    abort: AbortToken,
}

impl SolveJob {
    pub fn new(id: String, problem: ScheduleProblem) -> Self {
        Self {
            id,
            status: SolverStatus::NotSolving,
            problem,
            outcome: None,
            abort: AbortToken::new(),
        }
    }
}

/// Manages scheduling jobs.
///
/// # Examples
///
/// ```
/// use shift_scheduler::demo_data::{generate, DemoData};
/// use shift_scheduler::solver::{SolverService, SolverStatus};
///
/// let service = SolverService::new();
///
/// // Create a job (doesn't start solving yet)
/// let job = service.create_job("test-1".to_string(), generate(DemoData::Small));
/// assert_eq!(job.read().status, SolverStatus::NotSolving);
/// assert_eq!(service.list_jobs(), vec!["test-1".to_string()]);
/// ```
pub struct SolverService {
    jobs: RwLock<HashMap<String, Arc<RwLock<SolveJob>>>>,
    solver: Arc<dyn IlpSolver>,
}

impl SolverService {
    /// Creates a service backed by [`MicroLpSolver`].
    pub fn new() -> Self {
        Self::with_solver(Arc::new(MicroLpSolver::new()))
    }

    pub fn with_solver(solver: Arc<dyn IlpSolver>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            solver,
        }
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// Registers a job for the given problem.
    pub fn create_job(&self, id: String, problem: ScheduleProblem) -> Arc<RwLock<SolveJob>> {
        let job = Arc::new(RwLock::new(SolveJob::new(id.clone(), problem)));
        self.jobs.write().insert(id, job.clone());
        job
    }

    pub fn get_job(&self, id: &str) -> Option<Arc<RwLock<SolveJob>>> {
        self.jobs.read().get(id).cloned()
    }

    pub fn list_jobs(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.jobs.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn remove_job(&self, id: &str) -> Option<Arc<RwLock<SolveJob>>> {
        self.jobs.write().remove(id)
    }

    /// Starts solving a job in the background.
    ///
    /// The returned receiver yields exactly one outcome. A job that is already
    /// solving is rejected.
    pub fn start_solving(
        &self,
        job: Arc<RwLock<SolveJob>>,
    ) -> Result<oneshot::Receiver<SolveOutcome>, JobError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut guard = job.write();
            if guard.status == SolverStatus::Solving {
                return Err(JobError::AlreadySolving(guard.id.clone()));
            }
            guard.status = SolverStatus::Solving;
            guard.outcome = None;
            guard.abort = AbortToken::new();
        }

        let solver = self.solver.clone();
        tokio::task::spawn_blocking(move || {
            solve_blocking(job, solver.as_ref(), tx);
        });
        Ok(rx)
    }

    /// Asks a running job to stop. Returns whether a running job was signalled.
    pub fn stop_solving(&self, id: &str) -> Result<bool, JobError> {
        let job = self
            .get_job(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;
        let guard = job.read();
        if guard.status == SolverStatus::Solving {
            guard.abort.abort();
            info!(job_id = %id, "stop requested");
            return Ok(true);
        }
        Ok(false)
    }
}

impl Default for SolverService {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the pipeline in a blocking context.
fn solve_blocking(
    job: Arc<RwLock<SolveJob>>,
    solver: &dyn IlpSolver,
    tx: oneshot::Sender<SolveOutcome>,
) {
    let (job_id, problem, abort) = {
        let guard = job.read();
        (guard.id.clone(), guard.problem.clone(), guard.abort.clone())
    };
    let solve_start = Instant::now();

    info!(
        job_id = %job_id,
        employees = problem.employees.len(),
        open_hours = problem.demand.operating_hours(),
        objective = problem.config.objective.as_str(),
        "Starting shift solver"
    );

    let build_timer = PhaseTimer::start("ModelBuild", 0);
    let outcome = prepare(&problem).and_then(|model| {
        build_timer.finish(&format!(
            "variables ({}), constraints ({})",
            model.program().variable_count(),
            model.program().constraint_count()
        ));
        console::print_config(
            problem.employees.len(),
            model.hours().len(),
            model.program().variable_count(),
            model.program().constraint_count(),
        );

        let solve_timer = PhaseTimer::start("Solve", 1);
        let outcome = solve_model(&model, solver, problem.config.time_limit, &abort);
        solve_timer.finish(&format!("solver ({})", solver.name()));
        outcome
    });

    let total_duration = solve_start.elapsed();
    match &outcome {
        Ok(result) => info!(
            job_id = %job_id,
            duration_secs = total_duration.as_secs_f64(),
            status = %result.status(),
            total_cost = result.total_cost(),
            shortage = result.statistics().shortage,
            "Solving complete"
        ),
        Err(e) => warn!(job_id = %job_id, error = %e, "Solving failed"),
    }
    console::print_solving_ended(total_duration, &outcome);

    {
        let mut guard = job.write();
        guard.outcome = Some(outcome.clone());
        guard.status = SolverStatus::NotSolving;
    }
    // The caller may have dropped the receiver.
    let _ = tx.send(outcome);
}
