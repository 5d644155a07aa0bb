//! DTOs for REST API requests/responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use utoipa::ToSchema;

use crate::domain::{DemandPattern, DemandProfile, Employee, Hour};
use crate::error::OptimizeError;
use crate::extract::ScheduleResult;
use crate::ilp::SolveStatus;
use crate::objective::ObjectiveKind;
use crate::optimizer::{OptimizationConfig, ScheduleProblem};
use crate::solver::{SolveJob, SolverStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDto {
    pub id: String,
    pub name: String,
    pub hourly_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hours_per_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hours_per_week: Option<u32>,
    /// Hours of the day the employee can work.
    #[serde(default)]
    pub availability: Vec<Hour>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl From<&Employee> for EmployeeDto {
    fn from(e: &Employee) -> Self {
        let mut skills: Vec<String> = e.skills.iter().cloned().collect();
        skills.sort();
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            hourly_rate: e.hourly_rate,
            max_hours_per_day: Some(e.max_hours_per_day),
            max_hours_per_week: Some(e.max_hours_per_week),
            availability: e.availability.iter().copied().collect(),
            skills,
        }
    }
}

impl EmployeeDto {
    pub fn to_employee(&self) -> Employee {
        let mut employee = Employee::new(self.id.clone(), self.name.clone(), self.hourly_rate)
            .with_hours(self.availability.iter().copied())
            .with_skills(self.skills.iter().cloned());
        if let Some(per_day) = self.max_hours_per_day {
            employee.max_hours_per_day = per_day;
        }
        if let Some(per_week) = self.max_hours_per_week {
            employee.max_hours_per_week = per_week;
        }
        employee
    }
}

/// Store hours and customer curve.
///
/// A `pattern` fills every open hour first; explicit `hourlyDemand` entries
/// override it and `scale` is applied last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DemandDto {
    pub open_hour: Hour,
    pub close_hour: Hour,
    #[serde(default)]
    pub hourly_demand: BTreeMap<Hour, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_per_customer_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_staff_per_hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<DemandPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl From<&DemandProfile> for DemandDto {
    fn from(d: &DemandProfile) -> Self {
        Self {
            open_hour: d.open_hour,
            close_hour: d.close_hour,
            hourly_demand: d.hourly_demand.clone(),
            staff_per_customer_ratio: Some(d.staff_per_customer_ratio),
            min_staff_per_hour: Some(d.min_staff_per_hour),
            pattern: None,
            scale: None,
        }
    }
}

impl DemandDto {
    pub fn to_profile(&self) -> DemandProfile {
        let mut profile = DemandProfile::new(self.open_hour, self.close_hour);
        if let Some(ratio) = self.staff_per_customer_ratio {
            profile.staff_per_customer_ratio = ratio;
        }
        if let Some(min_staff) = self.min_staff_per_hour {
            profile.min_staff_per_hour = min_staff;
        }
        if let Some(pattern) = self.pattern {
            profile.apply_pattern(pattern);
        }
        profile
            .hourly_demand
            .extend(self.hourly_demand.iter().map(|(&h, &c)| (h, c)));
        if let Some(factor) = self.scale {
            profile.scale_demand(factor);
        }
        profile
    }
}

/// Model settings; unset fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationConfigDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<ObjectiveKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_shift_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_shift_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_overtime: Option<bool>,
}

/// Termination override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminationDto {
    /// Stop after this many seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_spent_limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleProblemDto {
    pub employees: Vec<EmployeeDto>,
    pub demand: DemandDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<OptimizationConfigDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination: Option<TerminationDto>,
}

impl ScheduleProblemDto {
    pub fn from_problem(problem: &ScheduleProblem) -> Self {
        let config = &problem.config;
        Self {
            employees: problem.employees.iter().map(EmployeeDto::from).collect(),
            demand: DemandDto::from(&problem.demand),
            config: Some(OptimizationConfigDto {
                objective: Some(config.objective),
                min_shift_length: Some(config.min_shift_length),
                max_shift_length: Some(config.max_shift_length),
                allow_overtime: Some(config.allow_overtime),
            }),
            termination: Some(TerminationDto {
                seconds_spent_limit: Some(config.time_limit.as_secs()),
            }),
        }
    }

    pub fn to_problem(&self) -> ScheduleProblem {
        let mut config = OptimizationConfig::default();
        if let Some(dto) = &self.config {
            if let Some(objective) = dto.objective {
                config.objective = objective;
            }
            if let Some(min) = dto.min_shift_length {
                config.min_shift_length = min;
            }
            if let Some(max) = dto.max_shift_length {
                config.max_shift_length = max;
            }
            if let Some(allow) = dto.allow_overtime {
                config.allow_overtime = allow;
            }
        }
        if let Some(secs) = self
            .termination
            .as_ref()
            .and_then(|t| t.seconds_spent_limit)
        {
            config.time_limit = Duration::from_secs(secs);
        }

        ScheduleProblem {
            employees: self.employees.iter().map(EmployeeDto::to_employee).collect(),
            demand: self.demand.to_profile(),
            config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ErrorDto {
    /// `INVALID_INPUT`, `INFEASIBLE` or `SOLVER_ERROR`.
    pub kind: &'static str,
    pub message: String,
}

impl From<&OptimizeError> for ErrorDto {
    fn from(e: &OptimizeError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// A job as seen through the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDto {
    pub id: String,
    pub solver_status: SolverStatus,
    pub problem: ScheduleProblemDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScheduleResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDto>,
}

impl ScheduleDto {
    pub fn from_job(job: &SolveJob) -> Self {
        let (result, error) = match &job.outcome {
            Some(Ok(result)) => (Some(result.clone()), None),
            Some(Err(e)) => (None, Some(ErrorDto::from(e))),
            None => (None, None),
        };
        Self {
            id: job.id.clone(),
            solver_status: job.status,
            problem: ScheduleProblemDto::from_problem(&job.problem),
            result,
            error,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub solver_status: SolverStatus,
    /// Termination status of the finished run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solve_status: Option<SolveStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortage: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDto>,
}

impl StatusResponse {
    pub fn from_job(job: &SolveJob) -> Self {
        let mut status = Self {
            solver_status: job.status,
            solve_status: None,
            total_cost: None,
            shortage: None,
            error: None,
        };
        match &job.outcome {
            Some(Ok(result)) => {
                status.solve_status = Some(result.status());
                status.total_cost = Some(result.total_cost());
                status.shortage = Some(result.statistics().shortage);
            }
            Some(Err(e)) => status.error = Some(ErrorDto::from(e)),
            None => {}
        }
        status
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub solver_engine: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_data::{generate, DemoData};
    use serde_json::json;

    #[test]
    fn test_problem_survives_dto() {
        let problem = generate(DemoData::Small);
        let dto = ScheduleProblemDto::from_problem(&problem);
        assert_eq!(dto.to_problem(), problem);
    }

    #[test]
    fn test_minimal_request_uses_defaults() {
        let dto: ScheduleProblemDto = serde_json::from_value(json!({
            "employees": [
                { "id": "E1", "name": "Ada", "hourlyRate": 15.0, "availability": [8, 9, 10] }
            ],
            "demand": { "openHour": 8, "closeHour": 11, "hourlyDemand": { "9": 40 } },
            "termination": { "secondsSpentLimit": 5 }
        }))
        .unwrap();

        let problem = dto.to_problem();
        let employee = &problem.employees[0];
        assert_eq!(employee.max_hours_per_day, 8);
        assert!(employee.is_available(10));
        assert_eq!(problem.demand.demand(9), 40);
        assert_eq!(problem.demand.min_staff_per_hour, 1);
        assert_eq!(problem.config.objective, ObjectiveKind::MinimizeCost);
        assert_eq!(problem.config.time_limit, Duration::from_secs(5));
    }

    #[test]
    fn test_pattern_then_overrides_then_scale() {
        let dto = DemandDto {
            open_hour: 10,
            close_hour: 14,
            hourly_demand: BTreeMap::from([(13, 10)]),
            staff_per_customer_ratio: None,
            min_staff_per_hour: Some(0),
            pattern: Some(DemandPattern::Flat),
            scale: Some(0.5),
        };
        let profile = dto.to_profile();
        assert_eq!(profile.demand(10), 25);
        assert_eq!(profile.demand(13), 5);
        assert_eq!(profile.min_staff_per_hour, 0);
    }

    #[test]
    fn test_config_and_objective_wire_format() {
        let dto: OptimizationConfigDto = serde_json::from_value(json!({
            "objective": "MAXIMIZE_COVERAGE",
            "allowOvertime": true
        }))
        .unwrap();
        assert_eq!(dto.objective, Some(ObjectiveKind::MaximizeCoverage));
        assert_eq!(dto.allow_overtime, Some(true));
        assert_eq!(dto.min_shift_length, None);
    }

    #[test]
    fn test_error_dto() {
        let dto = ErrorDto::from(&OptimizeError::Infeasible("no staff".to_string()));
        assert_eq!(dto.kind, "INFEASIBLE");
        assert_eq!(dto.message, "model is infeasible: no staff");
    }
}
