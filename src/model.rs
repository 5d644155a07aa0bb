//! Model builder: roster x open hours -> mixed-binary linear program.
//!
//! # Variables
//!
//! - `x_{e}_{h}` binary, employee `e` works hour `h` (only where available)
//! - `y_{e}_{h}` binary, `e`'s shift starts at `h` (only where a minimum-length
//!   shift fits inside `e`'s available open hours)
//! - `staff_{h}` integer, headcount at `h`
//! - `shortage_{h}`, `surplus_{h}` non-negative deviations from the requirement
//! - `overtime_{e}` non-negative hours beyond the daily cap, only when
//!   overtime is allowed
//!
//! # Constraints
//!
//! Headcount, soft coverage, daily cap, minimum length, start linkage, single
//! start and maximum length. The start linkage `x[h] - x[h-1] - y[h] <= 0`
//! forces every worked block to begin at a start indicator; with at most one
//! start per employee, each employee works one contiguous block.

use std::collections::BTreeMap;
use tracing::debug;

use crate::demand::RequiredStaff;
use crate::domain::{validate_roster, Employee, Hour, HOURS_PER_DAY};
use crate::error::{invalid, OptimizeError};
use crate::ilp::{LinearExpr, LinearProgram, Relation, VarHandle};

/// With overtime allowed an employee may exceed the daily cap by this
/// fraction of it.
pub const OVERTIME_ALLOWANCE: f64 = 0.5;

/// Inclusive bounds on the length of a shift, in hours.
///
/// # Examples
///
/// ```
/// use shift_scheduler::model::ShiftBounds;
///
/// assert!(ShiftBounds::new(4, 8).is_ok());
/// assert!(ShiftBounds::new(0, 8).is_err());
/// assert!(ShiftBounds::new(6, 4).is_err());
/// assert!(ShiftBounds::new(4, 25).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftBounds {
    min_len: u32,
    max_len: u32,
}

impl ShiftBounds {
    pub fn new(min_len: u32, max_len: u32) -> Result<Self, OptimizeError> {
        if min_len == 0 || min_len > max_len || max_len > HOURS_PER_DAY {
            return Err(invalid(format!(
                "shift length bounds must satisfy 1 <= min <= max <= {}, got {}..={}",
                HOURS_PER_DAY, min_len, max_len
            )));
        }
        Ok(Self { min_len, max_len })
    }

    #[inline]
    pub fn min_len(&self) -> u32 {
        self.min_len
    }

    #[inline]
    pub fn max_len(&self) -> u32 {
        self.max_len
    }

    pub fn contains(&self, len: u32) -> bool {
        (self.min_len..=self.max_len).contains(&len)
    }
}

/// Variables owned by one employee.
#[derive(Debug, Clone)]
pub struct EmployeeVars {
    pub employee_id: String,
    pub hourly_rate: f64,
    pub max_hours_per_day: u32,
    /// `x[e, h]`, keyed by hour.
    pub works: BTreeMap<Hour, VarHandle>,
    /// `y[e, h]`, keyed by hour.
    pub starts: BTreeMap<Hour, VarHandle>,
    pub overtime: Option<VarHandle>,
}

impl EmployeeVars {
    /// Whether the employee can be assigned at all.
    pub fn is_schedulable(&self) -> bool {
        !self.starts.is_empty()
    }
}

/// Variables owned by one open hour.
#[derive(Debug, Clone, Copy)]
pub struct HourVars {
    pub hour: Hour,
    pub required: u32,
    pub staff: VarHandle,
    pub shortage: VarHandle,
    pub surplus: VarHandle,
}

/// One optimization instance: the program plus the maps needed to read a
/// solution back. Created per solve and dropped after extraction.
#[derive(Debug, Clone)]
pub struct ShiftModel {
    program: LinearProgram,
    employees: Vec<EmployeeVars>,
    hours: Vec<HourVars>,
    bounds: ShiftBounds,
    allow_overtime: bool,
}

impl ShiftModel {
    /// Declares all variables and constraints. The objective is left empty for
    /// [`crate::objective`] to fill in.
    pub fn build(
        roster: &[Employee],
        required: &RequiredStaff,
        bounds: ShiftBounds,
        allow_overtime: bool,
    ) -> Result<Self, OptimizeError> {
        validate_roster(roster)?;
        if required.is_empty() {
            return Err(invalid("required staff curve is empty"));
        }

        let mut program = LinearProgram::new();

        let employees: Vec<EmployeeVars> = roster
            .iter()
            .map(|emp| declare_employee(&mut program, emp, required, bounds, allow_overtime))
            .collect();

        let hours: Vec<HourVars> = required
            .iter()
            .map(|(hour, req)| HourVars {
                hour,
                required: req,
                staff: program.declare_integer(format!("staff_{}", hour), 0.0, None),
                shortage: program.declare_continuous(format!("shortage_{}", hour), 0.0, None),
                surplus: program.declare_continuous(format!("surplus_{}", hour), 0.0, None),
            })
            .collect();

        let mut model = Self {
            program,
            employees,
            hours,
            bounds,
            allow_overtime,
        };
        model.add_coverage_constraints();
        model.add_employee_constraints();

        debug!(
            employees = model.employees.len(),
            hours = model.hours.len(),
            variables = model.program.variable_count(),
            constraints = model.program.constraint_count(),
            "built shift model"
        );
        Ok(model)
    }

    /// Headcount and soft coverage, one pair per open hour.
    fn add_coverage_constraints(&mut self) {
        for hv in &self.hours {
            let mut count = LinearExpr::sum([hv.staff]);
            for emp in &self.employees {
                if let Some(&x) = emp.works.get(&hv.hour) {
                    count.add_term(x, -1.0);
                }
            }
            self.program.add_linear_constraint(
                format!("staff_count_{}", hv.hour),
                count,
                Relation::Eq,
                0.0,
            );

            let coverage = LinearExpr::new()
                .with_term(hv.staff, 1.0)
                .with_term(hv.shortage, 1.0)
                .with_term(hv.surplus, -1.0);
            self.program.add_linear_constraint(
                format!("coverage_{}", hv.hour),
                coverage,
                Relation::Eq,
                f64::from(hv.required),
            );
        }
    }

    fn add_employee_constraints(&mut self) {
        let min_len = self.bounds.min_len;
        for emp in &self.employees {
            if emp.works.is_empty() {
                continue;
            }
            let id = &emp.employee_id;
            let total = LinearExpr::sum(emp.works.values().copied());

            // Daily cap, relaxed by priced overtime when allowed.
            let mut cap = total.clone();
            if let Some(ot) = emp.overtime {
                cap.add_term(ot, -1.0);
            }
            self.program.add_linear_constraint(
                format!("max_hours_{}", id),
                cap,
                Relation::Leq,
                f64::from(emp.max_hours_per_day),
            );

            // A start at h covers h..h+min_len.
            for (&h, &y) in &emp.starts {
                for offset in 0..min_len {
                    let x = emp.works[&(h + offset)];
                    self.program.add_linear_constraint(
                        format!("shift_min_{}_{}_{}", id, h, offset),
                        LinearExpr::new().with_term(x, 1.0).with_term(y, -1.0),
                        Relation::Geq,
                        0.0,
                    );
                }
            }

            // A worked hour either continues the previous hour or is a start.
            for (&h, &x) in &emp.works {
                let mut link = LinearExpr::sum([x]);
                if let Some(&prev) = h.checked_sub(1).and_then(|p| emp.works.get(&p)) {
                    link.add_term(prev, -1.0);
                }
                if let Some(&y) = emp.starts.get(&h) {
                    link.add_term(y, -1.0);
                }
                self.program.add_linear_constraint(
                    format!("shift_start_{}_{}", id, h),
                    link,
                    Relation::Leq,
                    0.0,
                );
            }

            if !emp.starts.is_empty() {
                self.program.add_linear_constraint(
                    format!("one_shift_{}", id),
                    LinearExpr::sum(emp.starts.values().copied()),
                    Relation::Leq,
                    1.0,
                );
            }

            self.program.add_linear_constraint(
                format!("shift_max_{}", id),
                total,
                Relation::Leq,
                f64::from(self.bounds.max_len),
            );
        }
    }

    pub fn program(&self) -> &LinearProgram {
        &self.program
    }

    pub(crate) fn program_mut(&mut self) -> &mut LinearProgram {
        &mut self.program
    }

    /// Per-employee variables, in roster order.
    pub fn employees(&self) -> &[EmployeeVars] {
        &self.employees
    }

    /// Per-hour variables, in hour order.
    pub fn hours(&self) -> &[HourVars] {
        &self.hours
    }

    pub fn bounds(&self) -> ShiftBounds {
        self.bounds
    }

    pub fn allows_overtime(&self) -> bool {
        self.allow_overtime
    }

    pub fn open_hour(&self) -> Hour {
        self.hours.first().map(|h| h.hour).unwrap_or(0)
    }

    pub fn close_hour(&self) -> Hour {
        self.hours.last().map(|h| h.hour + 1).unwrap_or(0)
    }
}

fn declare_employee(
    program: &mut LinearProgram,
    emp: &Employee,
    required: &RequiredStaff,
    bounds: ShiftBounds,
    allow_overtime: bool,
) -> EmployeeVars {
    let works: BTreeMap<Hour, VarHandle> = required
        .hours()
        .filter(|&h| emp.is_available(h))
        .map(|h| (h, program.declare_binary(format!("x_{}_{}", emp.id, h))))
        .collect();

    // No start variable where the minimum shift would leave the
    // employee's available open hours.
    let starts: BTreeMap<Hour, VarHandle> = works
        .keys()
        .copied()
        .filter(|&h| (h..h + bounds.min_len()).all(|k| works.contains_key(&k)))
        .map(|h| (h, program.declare_binary(format!("y_{}_{}", emp.id, h))))
        .collect();

    let overtime = (allow_overtime && !works.is_empty()).then(|| {
        program.declare_continuous(
            format!("overtime_{}", emp.id),
            0.0,
            Some(f64::from(emp.max_hours_per_day) * OVERTIME_ALLOWANCE),
        )
    });

    EmployeeVars {
        employee_id: emp.id.clone(),
        hourly_rate: emp.hourly_rate,
        max_hours_per_day: emp.max_hours_per_day,
        works,
        starts,
        overtime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Range;

    fn required(open: Hour, values: &[u32]) -> RequiredStaff {
        RequiredStaff::new(open, values.to_vec())
    }

    /// Values for a schedule where employee `i` works `blocks[i]`.
    fn assignment(model: &ShiftModel, blocks: &[Option<Range<Hour>>]) -> Vec<f64> {
        let mut values = vec![0.0; model.program().variable_count()];
        for (emp, block) in model.employees().iter().zip(blocks) {
            let Some(block) = block else { continue };
            for h in block.clone() {
                values[emp.works[&h].index()] = 1.0;
            }
            if let Some(y) = emp.starts.get(&block.start) {
                values[y.index()] = 1.0;
            }
            if let Some(ot) = emp.overtime {
                let excess = block.len() as f64 - f64::from(emp.max_hours_per_day);
                values[ot.index()] = excess.max(0.0);
            }
        }
        for hv in model.hours() {
            let count = model
                .employees()
                .iter()
                .filter(|e| e.works.get(&hv.hour).map_or(false, |x| values[x.index()] > 0.5))
                .count() as f64;
            values[hv.staff.index()] = count;
            let gap = f64::from(hv.required) - count;
            values[hv.shortage.index()] = gap.max(0.0);
            values[hv.surplus.index()] = (-gap).max(0.0);
        }
        values
    }

    #[test]
    fn test_rejects_empty_roster() {
        let result = ShiftModel::build(&[], &required(8, &[1]), ShiftBounds::new(1, 4).unwrap(), false);
        assert!(matches!(result, Err(OptimizeError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_empty_requirement() {
        let roster = vec![Employee::new("E1", "Ada", 15.0).with_availability(8..12)];
        let result = ShiftModel::build(&roster, &required(8, &[]), ShiftBounds::new(1, 4).unwrap(), false);
        assert!(matches!(result, Err(OptimizeError::InvalidInput(_))));
    }

    #[test]
    fn test_variables_follow_availability() {
        let roster = vec![
            Employee::new("E1", "Ada", 15.0).with_availability(8..12),
            Employee::new("E2", "Bob", 15.0).with_hours([3, 4]),
        ];
        let model = ShiftModel::build(
            &roster,
            &required(8, &[1, 1, 1, 1, 1, 1]),
            ShiftBounds::new(3, 4).unwrap(),
            false,
        )
        .unwrap();

        let ada = &model.employees()[0];
        assert_eq!(ada.works.keys().copied().collect::<Vec<_>>(), vec![8, 9, 10, 11]);
        // Starts at 10 or 11 would run past hour 11.
        assert_eq!(ada.starts.keys().copied().collect::<Vec<_>>(), vec![8, 9]);
        assert!(ada.overtime.is_none());

        let bob = &model.employees()[1];
        assert!(bob.works.is_empty());
        assert!(!bob.is_schedulable());
        assert_eq!(model.open_hour(), 8);
        assert_eq!(model.close_hour(), 14);
    }

    #[test]
    fn test_start_needs_contiguous_availability() {
        let roster = vec![Employee::new("E1", "Ada", 15.0).with_hours([8, 9, 11, 12, 13])];
        let model = ShiftModel::build(
            &roster,
            &required(8, &[1; 6]),
            ShiftBounds::new(3, 6).unwrap(),
            false,
        )
        .unwrap();
        assert_eq!(
            model.employees()[0].starts.keys().copied().collect::<Vec<_>>(),
            vec![11]
        );
    }

    #[test]
    fn test_single_block_is_feasible() {
        let roster = vec![Employee::new("E1", "Ada", 15.0).with_availability(8..16)];
        let model = ShiftModel::build(
            &roster,
            &required(8, &[1; 8]),
            ShiftBounds::new(2, 6).unwrap(),
            false,
        )
        .unwrap();

        assert!(model.program().is_feasible(&assignment(&model, &[Some(9..13)]), 1e-9));
        assert!(model.program().is_feasible(&assignment(&model, &[None]), 1e-9));
    }

    #[test]
    fn test_two_blocks_are_infeasible() {
        let roster = vec![Employee::new("E1", "Ada", 15.0).with_availability(8..16)];
        let model = ShiftModel::build(
            &roster,
            &required(8, &[1; 8]),
            ShiftBounds::new(2, 6).unwrap(),
            false,
        )
        .unwrap();

        let emp = &model.employees()[0];
        let mut values = assignment(&model, &[Some(8..10)]);
        // Second block 12..14 without its own start.
        for h in 12..14 {
            values[emp.works[&h].index()] = 1.0;
        }
        for hv in model.hours() {
            let worked = values[emp.works[&hv.hour].index()];
            values[hv.staff.index()] = worked;
            values[hv.shortage.index()] = 1.0 - worked;
        }
        assert!(!model.program().is_feasible(&values, 1e-9));
    }

    #[test]
    fn test_length_bounds_enforced() {
        let roster = vec![Employee::new("E1", "Ada", 15.0).with_availability(8..20)];
        let model = ShiftModel::build(
            &roster,
            &required(8, &[1; 12]),
            ShiftBounds::new(3, 6).unwrap(),
            false,
        )
        .unwrap();

        // Too short.
        assert!(!model.program().is_feasible(&assignment(&model, &[Some(8..10)]), 1e-9));
        // Too long: 7h against a 6h maximum.
        assert!(!model.program().is_feasible(&assignment(&model, &[Some(8..15)]), 1e-9));
        assert!(model.program().is_feasible(&assignment(&model, &[Some(8..14)]), 1e-9));
    }

    #[test]
    fn test_daily_cap_and_overtime() {
        let roster = vec![Employee::new("E1", "Ada", 15.0)
            .with_availability(8..20)
            .with_max_hours(4, 20)];
        let bounds = ShiftBounds::new(1, 8).unwrap();
        let req = required(8, &[1; 12]);

        let strict = ShiftModel::build(&roster, &req, bounds, false).unwrap();
        assert!(!strict.program().is_feasible(&assignment(&strict, &[Some(8..14)]), 1e-9));

        let relaxed = ShiftModel::build(&roster, &req, bounds, true).unwrap();
        assert!(relaxed.allows_overtime());
        // 6h is within 1.5 x 4h.
        assert!(relaxed.program().is_feasible(&assignment(&relaxed, &[Some(8..14)]), 1e-9));
        // 7h is not.
        assert!(!relaxed.program().is_feasible(&assignment(&relaxed, &[Some(8..15)]), 1e-9));
    }

    #[test]
    fn test_empty_schedule_always_feasible() {
        let roster = vec![
            Employee::new("E1", "Ada", 15.0).with_availability(8..12),
            Employee::new("E2", "Bob", 12.0).with_availability(10..14),
        ];
        let model = ShiftModel::build(
            &roster,
            &required(8, &[5, 5, 5, 5, 5, 5]),
            ShiftBounds::new(4, 8).unwrap(),
            false,
        )
        .unwrap();
        assert!(model.program().is_feasible(&assignment(&model, &[None, None]), 1e-9));
    }
}
