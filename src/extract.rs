//! Solution extraction: raw variable values -> [`ScheduleResult`].

use serde::Serialize;
use std::time::Duration;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::Hour;
use crate::ilp::SolveStatus;
use crate::model::ShiftModel;

/// Binary values above this count as 1.
const ACTIVE_THRESHOLD: f64 = 0.5;

/// A worked interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ShiftInterval {
    pub start: Hour,
    pub end: Hour,
}

impl ShiftInterval {
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, hour: Hour) -> bool {
        (self.start..self.end).contains(&hour)
    }

    pub fn overlaps(&self, other: &ShiftInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl std::fmt::Display for ShiftInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

/// Collapses hours into maximal runs of consecutive hours.
///
/// # Examples
///
/// ```
/// use shift_scheduler::extract::{shift_runs, ShiftInterval};
///
/// let runs = shift_runs([8, 9, 10, 14, 15]);
/// assert_eq!(
///     runs,
///     vec![
///         ShiftInterval { start: 8, end: 11 },
///         ShiftInterval { start: 14, end: 16 },
///     ]
/// );
/// assert!(shift_runs([]).is_empty());
/// ```
pub fn shift_runs(hours: impl IntoIterator<Item = Hour>) -> Vec<ShiftInterval> {
    let mut runs: Vec<ShiftInterval> = Vec::new();
    for hour in hours {
        match runs.last_mut() {
            Some(run) if run.end == hour => run.end += 1,
            _ => runs.push(ShiftInterval {
                start: hour,
                end: hour + 1,
            }),
        }
    }
    runs
}

/// One employee's part of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeAssignment {
    pub employee_id: String,
    pub shifts: Vec<ShiftInterval>,
    pub hours: u32,
    pub cost: f64,
}

impl EmployeeAssignment {
    pub fn is_planned(&self) -> bool {
        self.hours > 0
    }
}

/// How an hour's headcount compares with its requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageStatus {
    Under,
    Exact,
    Over,
}

impl CoverageStatus {
    pub fn classify(assigned: u32, required: u32) -> Self {
        match assigned.cmp(&required) {
            std::cmp::Ordering::Less => CoverageStatus::Under,
            std::cmp::Ordering::Equal => CoverageStatus::Exact,
            std::cmp::Ordering::Greater => CoverageStatus::Over,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourCoverage {
    pub hour: Hour,
    pub required: u32,
    pub assigned: u32,
    pub status: CoverageStatus,
}

impl HourCoverage {
    pub fn shortage(&self) -> u32 {
        self.required.saturating_sub(self.assigned)
    }

    pub fn surplus(&self) -> u32 {
        self.assigned.saturating_sub(self.required)
    }
}

/// Aggregates over a whole schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStatistics {
    pub planned_employees: usize,
    pub total_hours: u32,
    /// Average over planned employees only; 0 when nobody is planned.
    pub average_hours: f64,
    pub under_hours: usize,
    pub exact_hours: usize,
    pub over_hours: usize,
    /// Staff-hours of unmet demand.
    pub shortage: u64,
    /// Staff-hours above demand.
    pub surplus: u64,
}

/// A solved single-day schedule. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    status: SolveStatus,
    objective_value: f64,
    total_cost: f64,
    assignments: Vec<EmployeeAssignment>,
    coverage: Vec<HourCoverage>,
    statistics: ScheduleStatistics,
    /// Relative MIP gap reported by the solver, if any.
    gap: Option<f64>,
    solve_time_ms: u64,
}

impl ScheduleResult {
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn gap(&self) -> Option<f64> {
        self.gap
    }

    /// Attaches the solver's optimality gap.
    pub fn with_gap(mut self, gap: Option<f64>) -> Self {
        self.gap = gap;
        self
    }

    /// Per-employee results in roster order.
    pub fn assignments(&self) -> &[EmployeeAssignment] {
        &self.assignments
    }

    pub fn assignment(&self, employee_id: &str) -> Option<&EmployeeAssignment> {
        self.assignments
            .iter()
            .find(|a| a.employee_id == employee_id)
    }

    pub fn shifts_for(&self, employee_id: &str) -> &[ShiftInterval] {
        self.assignment(employee_id)
            .map(|a| a.shifts.as_slice())
            .unwrap_or(&[])
    }

    pub fn hours_for(&self, employee_id: &str) -> u32 {
        self.assignment(employee_id).map_or(0, |a| a.hours)
    }

    pub fn cost_for(&self, employee_id: &str) -> f64 {
        self.assignment(employee_id).map_or(0.0, |a| a.cost)
    }

    /// Per-hour coverage in hour order.
    pub fn coverage(&self) -> &[HourCoverage] {
        &self.coverage
    }

    pub fn staff_at(&self, hour: Hour) -> Option<u32> {
        self.coverage
            .iter()
            .find(|c| c.hour == hour)
            .map(|c| c.assigned)
    }

    pub fn statistics(&self) -> &ScheduleStatistics {
        &self.statistics
    }

    pub fn solve_time(&self) -> Duration {
        Duration::from_millis(self.solve_time_ms)
    }
}

/// Reads a schedule out of `values`, one value per variable of `model`.
///
/// Each employee's worked hours are collapsed into maximal consecutive runs;
/// the model guarantees at most one run per employee. Headcounts are
/// recomputed from the `x` values, and a disagreement with the solver's
/// `staff` variable is logged.
pub fn extract(
    model: &ShiftModel,
    values: &[f64],
    status: SolveStatus,
    solve_time: Duration,
) -> ScheduleResult {
    let is_active = |v: crate::ilp::VarHandle| {
        values.get(v.index()).copied().unwrap_or(0.0) > ACTIVE_THRESHOLD
    };

    let assignments: Vec<EmployeeAssignment> = model
        .employees()
        .iter()
        .map(|emp| {
            let worked = emp
                .works
                .iter()
                .filter(|(_, &x)| is_active(x))
                .map(|(&h, _)| h);
            let shifts = shift_runs(worked);
            let hours: u32 = shifts.iter().map(ShiftInterval::len).sum();
            EmployeeAssignment {
                employee_id: emp.employee_id.clone(),
                shifts,
                hours,
                cost: f64::from(hours) * emp.hourly_rate,
            }
        })
        .collect();

    let coverage: Vec<HourCoverage> = model
        .hours()
        .iter()
        .map(|hv| {
            let assigned = model
                .employees()
                .iter()
                .filter(|emp| emp.works.get(&hv.hour).map_or(false, |&x| is_active(x)))
                .count() as u32;
            let reported = values.get(hv.staff.index()).copied().unwrap_or(0.0);
            if (reported - f64::from(assigned)).abs() > ACTIVE_THRESHOLD {
                warn!(
                    hour = hv.hour,
                    assigned,
                    reported,
                    "solver staff count disagrees with assignments"
                );
            }
            HourCoverage {
                hour: hv.hour,
                required: hv.required,
                assigned,
                status: CoverageStatus::classify(assigned, hv.required),
            }
        })
        .collect();

    let statistics = statistics(&assignments, &coverage);
    let total_cost = assignments.iter().map(|a| a.cost).sum();

    ScheduleResult {
        status,
        objective_value: model.program().objective_value(values),
        total_cost,
        assignments,
        coverage,
        statistics,
        gap: None,
        solve_time_ms: solve_time.as_millis() as u64,
    }
}

fn statistics(assignments: &[EmployeeAssignment], coverage: &[HourCoverage]) -> ScheduleStatistics {
    let planned_employees = assignments.iter().filter(|a| a.is_planned()).count();
    let total_hours: u32 = assignments.iter().map(|a| a.hours).sum();
    let average_hours = if planned_employees == 0 {
        0.0
    } else {
        f64::from(total_hours) / planned_employees as f64
    };
    let count = |status: CoverageStatus| coverage.iter().filter(|c| c.status == status).count();

    ScheduleStatistics {
        planned_employees,
        total_hours,
        average_hours,
        under_hours: count(CoverageStatus::Under),
        exact_hours: count(CoverageStatus::Exact),
        over_hours: count(CoverageStatus::Over),
        shortage: coverage.iter().map(|c| u64::from(c.shortage())).sum(),
        surplus: coverage.iter().map(|c| u64::from(c.surplus())).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::RequiredStaff;
    use crate::domain::Employee;
    use crate::model::ShiftBounds;

    fn model() -> ShiftModel {
        let roster = vec![
            Employee::new("E1", "Ada", 15.0).with_availability(8..12),
            Employee::new("E2", "Bob", 20.0).with_availability(9..12),
            Employee::new("E3", "Cy", 12.0),
        ];
        ShiftModel::build(
            &roster,
            &RequiredStaff::new(8, vec![1, 2, 2, 1]),
            ShiftBounds::new(1, 4).unwrap(),
            false,
        )
        .unwrap()
    }

    fn values_for(model: &ShiftModel, worked: &[(usize, &[Hour])]) -> Vec<f64> {
        let mut values = vec![0.0; model.program().variable_count()];
        for &(i, hours) in worked {
            for h in hours {
                values[model.employees()[i].works[h].index()] = 1.0;
            }
        }
        for hv in model.hours() {
            let staff = worked
                .iter()
                .filter(|(_, hours)| hours.contains(&hv.hour))
                .count();
            values[hv.staff.index()] = staff as f64;
        }
        values
    }

    #[test]
    fn test_runs_and_costs() {
        let m = model();
        let values = values_for(&m, &[(0, &[8, 9, 10]), (1, &[9, 10, 11])]);
        let result = extract(&m, &values, SolveStatus::Optimal, Duration::from_millis(12));

        assert_eq!(result.shifts_for("E1"), &[ShiftInterval { start: 8, end: 11 }]);
        assert_eq!(result.hours_for("E1"), 3);
        assert_eq!(result.cost_for("E1"), 45.0);
        assert_eq!(result.cost_for("E2"), 60.0);
        assert!(result.shifts_for("E3").is_empty());
        assert_eq!(result.total_cost(), 105.0);
        assert_eq!(result.solve_time(), Duration::from_millis(12));
        assert!(result.is_optimal());
    }

    #[test]
    fn test_coverage_classification() {
        let m = model();
        let values = values_for(&m, &[(0, &[8, 9, 10, 11]), (1, &[11])]);
        let result = extract(&m, &values, SolveStatus::TimeLimitReached, Duration::ZERO);

        let statuses: Vec<CoverageStatus> = result.coverage().iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                CoverageStatus::Exact,
                CoverageStatus::Under,
                CoverageStatus::Under,
                CoverageStatus::Over,
            ]
        );
        assert_eq!(result.staff_at(11), Some(2));
        assert_eq!(result.staff_at(12), None);

        let stats = result.statistics();
        assert_eq!(stats.planned_employees, 2);
        assert_eq!(stats.total_hours, 5);
        assert_eq!(stats.average_hours, 2.5);
        assert_eq!((stats.under_hours, stats.exact_hours, stats.over_hours), (2, 1, 1));
        assert_eq!(stats.shortage, 2);
        assert_eq!(stats.surplus, 1);
        assert_eq!(result.status(), SolveStatus::TimeLimitReached);
    }

    #[test]
    fn test_empty_schedule_statistics() {
        let m = model();
        let values = vec![0.0; m.program().variable_count()];
        let result = extract(&m, &values, SolveStatus::Optimal, Duration::ZERO);

        assert_eq!(result.statistics().planned_employees, 0);
        assert_eq!(result.statistics().average_hours, 0.0);
        assert_eq!(result.statistics().shortage, 6);
        assert_eq!(result.total_cost(), 0.0);
        assert_eq!(result.assignments().len(), 3);
    }

    #[test]
    fn test_shortage_sums_do_not_overflow() {
        let roster = vec![Employee::new("E1", "Ada", 15.0).with_availability(8..10)];
        let m = ShiftModel::build(
            &roster,
            &RequiredStaff::new(8, vec![u32::MAX, u32::MAX]),
            ShiftBounds::new(1, 2).unwrap(),
            false,
        )
        .unwrap();
        let values = vec![0.0; m.program().variable_count()];
        let result = extract(&m, &values, SolveStatus::Optimal, Duration::ZERO);

        assert_eq!(result.statistics().shortage, 2 * u64::from(u32::MAX));
        assert_eq!(result.statistics().surplus, 0);
    }

    #[test]
    fn test_near_binary_values_are_thresholded() {
        let m = model();
        let mut values = vec![0.0; m.program().variable_count()];
        values[m.employees()[0].works[&8].index()] = 0.9999;
        values[m.employees()[0].works[&9].index()] = 1e-7;
        let result = extract(&m, &values, SolveStatus::Optimal, Duration::ZERO);
        assert_eq!(result.shifts_for("E1"), &[ShiftInterval { start: 8, end: 9 }]);
    }

    #[test]
    fn test_interval_helpers() {
        let a = ShiftInterval { start: 8, end: 12 };
        let b = ShiftInterval { start: 11, end: 14 };
        let c = ShiftInterval { start: 12, end: 14 };
        assert_eq!(a.len(), 4);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.contains(11));
        assert!(!a.contains(12));
        assert_eq!(a.to_string(), "08:00-12:00");
    }
}
