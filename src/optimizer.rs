//! One build-solve-extract run over a [`ScheduleProblem`].
//!
//! ```
//! use shift_scheduler::domain::{DemandProfile, Employee};
//! use shift_scheduler::ilp::{AbortToken, MicroLpSolver};
//! use shift_scheduler::optimizer::{optimize, OptimizationConfig, ScheduleProblem};
//!
//! let problem = ScheduleProblem {
//!     employees: vec![Employee::new("E1", "Ada", 15.0).with_availability(8..11)],
//!     demand: DemandProfile::new(8, 11)
//!         .with_ratio(1.0)
//!         .with_min_staff(0)
//!         .with_demand([(8, 1), (9, 1), (10, 1)]),
//!     config: OptimizationConfig {
//!         min_shift_length: 1,
//!         max_shift_length: 4,
//!         ..OptimizationConfig::default()
//!     },
//! };
//!
//! let result = optimize(&problem, &MicroLpSolver::new(), &AbortToken::new()).unwrap();
//! assert_eq!(result.hours_for("E1"), 3);
//! assert_eq!(result.total_cost(), 45.0);
//! ```

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::demand::required_staff;
use crate::domain::{validate_roster, DemandProfile, Employee};
use crate::error::{invalid, OptimizeError};
use crate::extract::{extract, ScheduleResult};
use crate::ilp::{AbortToken, IlpSolver, SolveStatus};
use crate::model::{ShiftBounds, ShiftModel};
use crate::objective::ObjectiveKind;

/// Default solving time: 60 seconds.
const DEFAULT_TIME_LIMIT_SECS: u64 = 60;

const DEFAULT_MIN_SHIFT: u32 = 4;
const DEFAULT_MAX_SHIFT: u32 = 8;

/// Per-run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationConfig {
    pub objective: ObjectiveKind,
    pub min_shift_length: u32,
    pub max_shift_length: u32,
    pub allow_overtime: bool,
    pub time_limit: Duration,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            objective: ObjectiveKind::default(),
            min_shift_length: DEFAULT_MIN_SHIFT,
            max_shift_length: DEFAULT_MAX_SHIFT,
            allow_overtime: false,
            time_limit: Duration::from_secs(DEFAULT_TIME_LIMIT_SECS),
        }
    }
}

impl OptimizationConfig {
    pub fn with_objective(mut self, objective: ObjectiveKind) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_shift_lengths(mut self, min: u32, max: u32) -> Self {
        self.min_shift_length = min;
        self.max_shift_length = max;
        self
    }

    pub fn with_overtime(mut self, allow: bool) -> Self {
        self.allow_overtime = allow;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn shift_bounds(&self) -> Result<ShiftBounds, OptimizeError> {
        ShiftBounds::new(self.min_shift_length, self.max_shift_length)
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        self.shift_bounds()?;
        if self.time_limit.is_zero() {
            return Err(invalid("time limit must be positive"));
        }
        Ok(())
    }
}

/// Everything one optimization run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleProblem {
    pub employees: Vec<Employee>,
    pub demand: DemandProfile,
    #[serde(default)]
    pub config: OptimizationConfig,
}

impl ScheduleProblem {
    pub fn new(employees: Vec<Employee>, demand: DemandProfile) -> Self {
        Self {
            employees,
            demand,
            config: OptimizationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OptimizationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        validate_roster(&self.employees)?;
        self.demand.validate()?;
        self.config.validate()
    }
}

/// Validates the problem and builds its model with the objective applied.
pub fn prepare(problem: &ScheduleProblem) -> Result<ShiftModel, OptimizeError> {
    problem.validate()?;
    let required = required_staff(&problem.demand)?;
    debug!(
        hours = required.len(),
        required_staff_hours = required.total(),
        "aggregated demand"
    );

    let mut model = ShiftModel::build(
        &problem.employees,
        &required,
        problem.config.shift_bounds()?,
        problem.config.allow_overtime,
    )?;
    problem.config.objective.apply(&mut model);
    Ok(model)
}

/// Solves a prepared model and reads back the schedule.
///
/// `TimeLimitReached` with an incumbent is a successful result; `Interrupted`,
/// `Infeasible` and `SolverError` become errors.
pub fn solve_model(
    model: &ShiftModel,
    solver: &dyn IlpSolver,
    time_limit: Duration,
    abort: &AbortToken,
) -> Result<ScheduleResult, OptimizeError> {
    let started = Instant::now();
    let response = solver.solve(model.program(), time_limit, abort);
    let elapsed = started.elapsed();

    info!(
        solver = solver.name(),
        status = %response.status,
        duration_ms = elapsed.as_millis() as u64,
        "solver finished"
    );

    let message = response
        .message
        .unwrap_or_else(|| response.status.as_str().to_string());
    match (response.status, response.values) {
        (SolveStatus::Optimal | SolveStatus::TimeLimitReached, Some(values)) => {
            Ok(extract(model, &values, response.status, elapsed).with_gap(response.gap))
        }
        (SolveStatus::Optimal | SolveStatus::TimeLimitReached, None) => Err(
            OptimizeError::Solver(format!("{} without variable values", response.status)),
        ),
        (SolveStatus::Interrupted, _) => Err(OptimizeError::Interrupted(message)),
        (SolveStatus::Infeasible, _) => Err(OptimizeError::Infeasible(message)),
        (SolveStatus::SolverError, _) => Err(OptimizeError::Solver(message)),
    }
}

/// Runs the whole pipeline once.
pub fn optimize(
    problem: &ScheduleProblem,
    solver: &dyn IlpSolver,
    abort: &AbortToken,
) -> Result<ScheduleResult, OptimizeError> {
    let model = prepare(problem)?;
    solve_model(&model, solver, problem.config.time_limit, abort)
}
