//! Objective strategies composed onto a built [`ShiftModel`].
//!
//! Both strategies are linear and only choose a term set and a direction; the
//! constraints are never touched.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ilp::{Direction, LinearExpr};
use crate::model::ShiftModel;

/// Cost of one staff-hour of unmet demand. Must dominate any labour saving.
pub const SHORTAGE_PENALTY: f64 = 1000.0;

/// Cost of one staff-hour above demand.
pub const SURPLUS_PENALTY: f64 = 10.0;

/// Reward per assigned staff-hour when maximizing coverage.
pub const COVERAGE_WEIGHT: f64 = 1000.0;

/// Extra fraction of the hourly rate paid per overtime hour.
pub const OVERTIME_PREMIUM: f64 = 0.5;

/// Which objective the model is solved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectiveKind {
    /// Labour cost plus shortage and surplus penalties.
    #[default]
    MinimizeCost,
    /// Staff-hours first, labour cost as tie-break.
    MaximizeCoverage,
}

impl std::str::FromStr for ObjectiveKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "MINIMIZE_COST" | "COST" => Ok(ObjectiveKind::MinimizeCost),
            "MAXIMIZE_COVERAGE" | "COVERAGE" => Ok(ObjectiveKind::MaximizeCoverage),
            _ => Err(()),
        }
    }
}

impl ObjectiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectiveKind::MinimizeCost => "MINIMIZE_COST",
            ObjectiveKind::MaximizeCoverage => "MAXIMIZE_COVERAGE",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            ObjectiveKind::MinimizeCost => Direction::Minimize,
            ObjectiveKind::MaximizeCoverage => Direction::Maximize,
        }
    }

    /// Sets this objective on `model`, replacing any previous one.
    pub fn apply(self, model: &mut ShiftModel) {
        let expr = match self {
            ObjectiveKind::MinimizeCost => cost_objective(model),
            ObjectiveKind::MaximizeCoverage => coverage_objective(model),
        };
        model.program_mut().set_objective(expr, self.direction());
    }
}

/// `Σ rate·x (+ premium·rate·overtime)`.
fn labor_cost(model: &ShiftModel) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for emp in model.employees() {
        for &x in emp.works.values() {
            expr.add_term(x, emp.hourly_rate);
        }
        if let Some(ot) = emp.overtime {
            expr.add_term(ot, emp.hourly_rate * OVERTIME_PREMIUM);
        }
    }
    expr
}

fn cost_objective(model: &ShiftModel) -> LinearExpr {
    let mut expr = labor_cost(model);
    for hv in model.hours() {
        expr.add_term(hv.shortage, SHORTAGE_PENALTY);
        expr.add_term(hv.surplus, SURPLUS_PENALTY);
    }
    expr
}

fn coverage_objective(model: &ShiftModel) -> LinearExpr {
    let mut expr = LinearExpr::with_capacity(model.program().variable_count());
    for hv in model.hours() {
        expr.add_term(hv.staff, COVERAGE_WEIGHT);
    }
    expr.add_scaled(&labor_cost(model), -1.0);
    expr
}
