//! Domain model for single-day shift scheduling.
//!
//! # Overview
//!
//! - [`Employee`]: hourly rate, daily cap and the hours of the day they can work
//! - [`DemandProfile`]: opening hours and the customer curve of one day
//! - [`DemandPattern`]: canned customer curves used by demo data and the API
//!
//! Hours are hour-of-day integers in `0..=23`; an hour `h` stands for the
//! interval `[h, h + 1)`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Range;
use utoipa::ToSchema;

use crate::error::{invalid, OptimizeError};

/// Hour of the day, `0..=23`.
pub type Hour = u32;

/// Number of hours in the scheduling day.
pub const HOURS_PER_DAY: u32 = 24;

/// Latest hour a store may open or close at.
pub const LAST_HOUR: Hour = HOURS_PER_DAY - 1;

const DEFAULT_MAX_HOURS_PER_DAY: u32 = 8;
const DEFAULT_MAX_HOURS_PER_WEEK: u32 = 40;

/// An employee who can be assigned one shift on the scheduled day.
///
/// # Examples
///
/// ```
/// use shift_scheduler::domain::Employee;
///
/// let emp = Employee::new("E1", "Ada", 15.0).with_availability(8..12);
///
/// assert!(emp.is_available(8));
/// assert!(emp.is_available(11));
/// assert!(!emp.is_available(12));
/// assert_eq!(emp.max_hours_per_day, 8);
/// assert_eq!(emp.daily_cost(3), 45.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique, immutable identifier.
    pub id: String,
    pub name: String,
    pub hourly_rate: f64,
    #[serde(default = "default_max_hours_per_day")]
    pub max_hours_per_day: u32,
    /// Carried through for callers; the single-day model ignores it.
    #[serde(default = "default_max_hours_per_week")]
    pub max_hours_per_week: u32,
    #[serde(default)]
    pub availability: BTreeSet<Hour>,
    #[serde(default)]
    pub skills: HashSet<String>,
}

fn default_max_hours_per_day() -> u32 {
    DEFAULT_MAX_HOURS_PER_DAY
}

fn default_max_hours_per_week() -> u32 {
    DEFAULT_MAX_HOURS_PER_WEEK
}

impl Employee {
    pub fn new(id: impl Into<String>, name: impl Into<String>, hourly_rate: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hourly_rate,
            max_hours_per_day: DEFAULT_MAX_HOURS_PER_DAY,
            max_hours_per_week: DEFAULT_MAX_HOURS_PER_WEEK,
            availability: BTreeSet::new(),
            skills: HashSet::new(),
        }
    }

    pub fn with_max_hours(mut self, per_day: u32, per_week: u32) -> Self {
        self.max_hours_per_day = per_day;
        self.max_hours_per_week = per_week;
        self
    }

    /// Adds every hour of the half-open range to the availability set.
    pub fn with_availability(mut self, hours: Range<Hour>) -> Self {
        self.add_availability(hours);
        self
    }

    pub fn with_hours(mut self, hours: impl IntoIterator<Item = Hour>) -> Self {
        self.availability.extend(hours);
        self
    }

    pub fn with_skills(mut self, skills: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for skill in skills {
            self.skills.insert(skill.into());
        }
        self
    }

    #[inline]
    pub fn is_available(&self, hour: Hour) -> bool {
        self.availability.contains(&hour)
    }

    pub fn add_availability(&mut self, hours: Range<Hour>) {
        self.availability.extend(hours);
    }

    pub fn remove_availability(&mut self, hour: Hour) {
        self.availability.remove(&hour);
    }

    /// Case-insensitive skill lookup.
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }

    pub fn daily_cost(&self, hours: u32) -> f64 {
        f64::from(hours) * self.hourly_rate
    }

    /// Checks the record's own invariants.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.id.trim().is_empty() {
            return Err(invalid("employee id cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid(format!("employee {} has an empty name", self.id)));
        }
        if !(self.hourly_rate.is_finite() && self.hourly_rate > 0.0) {
            return Err(invalid(format!(
                "employee {} must have a positive hourly rate, got {}",
                self.id, self.hourly_rate
            )));
        }
        if self.max_hours_per_day == 0 || self.max_hours_per_day > HOURS_PER_DAY {
            return Err(invalid(format!(
                "employee {} max hours per day must be in 1..={}, got {}",
                self.id, HOURS_PER_DAY, self.max_hours_per_day
            )));
        }
        if let Some(hour) = self.availability.iter().find(|h| **h > LAST_HOUR) {
            return Err(invalid(format!(
                "employee {} has availability outside 0..={}: {}",
                self.id, LAST_HOUR, hour
            )));
        }
        Ok(())
    }
}

/// Validates a whole roster: non-empty, unique ids, valid records.
pub fn validate_roster(employees: &[Employee]) -> Result<(), OptimizeError> {
    if employees.is_empty() {
        return Err(invalid("roster is empty"));
    }
    let mut seen = HashSet::with_capacity(employees.len());
    for employee in employees {
        employee.validate()?;
        if !seen.insert(employee.id.as_str()) {
            return Err(invalid(format!("duplicate employee id {}", employee.id)));
        }
    }
    Ok(())
}

/// Employees that may be assigned at `hour`.
pub fn available_at(employees: &[Employee], hour: Hour) -> Vec<&Employee> {
    employees.iter().filter(|e| e.is_available(hour)).collect()
}

pub fn with_skill<'a>(employees: &'a [Employee], skill: &str) -> Vec<&'a Employee> {
    employees.iter().filter(|e| e.has_skill(skill)).collect()
}

/// Sum of every employee's daily cap.
pub fn total_labor_capacity(employees: &[Employee]) -> u32 {
    employees.iter().map(|e| e.max_hours_per_day).sum()
}

pub fn average_hourly_rate(employees: &[Employee]) -> f64 {
    if employees.is_empty() {
        return 0.0;
    }
    employees.iter().map(|e| e.hourly_rate).sum::<f64>() / employees.len() as f64
}

/// Customer demand over one trading day.
///
/// # Examples
///
/// ```
/// use shift_scheduler::domain::{DemandPattern, DemandProfile};
///
/// let mut demand = DemandProfile::new(8, 20);
/// demand.apply_pattern(DemandPattern::LunchPeak);
///
/// assert_eq!(demand.operating_hours(), 12);
/// assert_eq!(demand.demand(12), 100);
/// assert_eq!(demand.demand(9), 40);
/// assert_eq!(demand.peak_hours(1)[0].1, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DemandProfile {
    pub open_hour: Hour,
    /// First hour the store is closed.
    pub close_hour: Hour,
    /// Hour -> expected customers. Open hours without an entry count as 0.
    #[serde(default)]
    pub hourly_demand: BTreeMap<Hour, u32>,
    pub staff_per_customer_ratio: f64,
    pub min_staff_per_hour: u32,
}

impl Default for DemandProfile {
    fn default() -> Self {
        Self::new(8, 20)
    }
}

impl DemandProfile {
    /// Creates a profile with no customers, a 0.05 staff ratio and a floor of
    /// one staff member per hour.
    pub fn new(open_hour: Hour, close_hour: Hour) -> Self {
        Self {
            open_hour,
            close_hour,
            hourly_demand: BTreeMap::new(),
            staff_per_customer_ratio: 0.05,
            min_staff_per_hour: 1,
        }
    }

    pub fn with_ratio(mut self, staff_per_customer: f64) -> Self {
        self.staff_per_customer_ratio = staff_per_customer;
        self
    }

    pub fn with_min_staff(mut self, min_staff: u32) -> Self {
        self.min_staff_per_hour = min_staff;
        self
    }

    pub fn with_demand(mut self, demand: impl IntoIterator<Item = (Hour, u32)>) -> Self {
        self.hourly_demand.extend(demand);
        self
    }

    /// The open hours, `open_hour..close_hour`.
    #[inline]
    pub fn hours(&self) -> Range<Hour> {
        self.open_hour..self.close_hour
    }

    #[inline]
    pub fn is_open(&self, hour: Hour) -> bool {
        self.hours().contains(&hour)
    }

    pub fn operating_hours(&self) -> u32 {
        self.close_hour.saturating_sub(self.open_hour)
    }

    pub fn set_demand(&mut self, hour: Hour, customers: u32) -> Result<(), OptimizeError> {
        if !self.is_open(hour) {
            return Err(invalid(format!(
                "hour {} is outside store hours {}..{}",
                hour, self.open_hour, self.close_hour
            )));
        }
        self.hourly_demand.insert(hour, customers);
        Ok(())
    }

    pub fn demand(&self, hour: Hour) -> u32 {
        self.hourly_demand.get(&hour).copied().unwrap_or(0)
    }

    pub fn total_customers(&self) -> u32 {
        self.hours().map(|h| self.demand(h)).sum()
    }

    pub fn average_customers(&self) -> f64 {
        match self.operating_hours() {
            0 => 0.0,
            n => f64::from(self.total_customers()) / f64::from(n),
        }
    }

    /// The `n` busiest open hours, busiest first; ties keep hour order.
    pub fn peak_hours(&self, n: usize) -> Vec<(Hour, u32)> {
        let mut hours: Vec<(Hour, u32)> = self.hours().map(|h| (h, self.demand(h))).collect();
        hours.sort_by(|a, b| b.1.cmp(&a.1));
        hours.truncate(n);
        hours
    }

    /// The `n` quietest open hours, quietest first.
    pub fn low_hours(&self, n: usize) -> Vec<(Hour, u32)> {
        let mut hours: Vec<(Hour, u32)> = self.hours().map(|h| (h, self.demand(h))).collect();
        hours.sort_by_key(|&(_, customers)| customers);
        hours.truncate(n);
        hours
    }

    /// Multiplies every hour's customers by `factor`, rounding down.
    pub fn scale_demand(&mut self, factor: f64) {
        for customers in self.hourly_demand.values_mut() {
            *customers = (f64::from(*customers) * factor).max(0.0).floor() as u32;
        }
    }

    /// Overwrites the customer curve of every open hour.
    pub fn apply_pattern(&mut self, pattern: DemandPattern) {
        for hour in self.hours() {
            let customers = pattern.customers_at(hour, self.open_hour);
            self.hourly_demand.insert(hour, customers);
        }
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.open_hour > LAST_HOUR || self.close_hour > LAST_HOUR {
            return Err(invalid(format!(
                "store hours must lie in 0..={}, got {}..{}",
                LAST_HOUR, self.open_hour, self.close_hour
            )));
        }
        if self.open_hour >= self.close_hour {
            return Err(invalid(format!(
                "store must open before it closes, got {}..{}",
                self.open_hour, self.close_hour
            )));
        }
        if !(self.staff_per_customer_ratio.is_finite() && self.staff_per_customer_ratio >= 0.0) {
            return Err(invalid(format!(
                "staff per customer ratio must be a non-negative number, got {}",
                self.staff_per_customer_ratio
            )));
        }
        if let Some(hour) = self.hourly_demand.keys().find(|h| !self.is_open(**h)) {
            return Err(invalid(format!(
                "demand given for hour {} outside store hours {}..{}",
                hour, self.open_hour, self.close_hour
            )));
        }
        Ok(())
    }
}

/// Canned customer curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandPattern {
    Flat,
    MorningPeak,
    LunchPeak,
    EveningPeak,
    Bimodal,
    Weekend,
}

impl std::str::FromStr for DemandPattern {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "FLAT" => Ok(DemandPattern::Flat),
            "MORNING_PEAK" => Ok(DemandPattern::MorningPeak),
            "LUNCH_PEAK" => Ok(DemandPattern::LunchPeak),
            "EVENING_PEAK" => Ok(DemandPattern::EveningPeak),
            "BIMODAL" => Ok(DemandPattern::Bimodal),
            "WEEKEND" => Ok(DemandPattern::Weekend),
            _ => Err(()),
        }
    }
}

impl DemandPattern {
    fn customers_at(self, hour: Hour, open_hour: Hour) -> u32 {
        match self {
            DemandPattern::Flat => 50,
            DemandPattern::MorningPeak => {
                if hour < 12 {
                    80
                } else {
                    30
                }
            }
            DemandPattern::LunchPeak => {
                if (11..=13).contains(&hour) {
                    100
                } else {
                    40
                }
            }
            DemandPattern::EveningPeak => {
                if hour >= 17 {
                    90
                } else {
                    35
                }
            }
            DemandPattern::Bimodal => {
                if (11..=13).contains(&hour) || (17..=19).contains(&hour) {
                    85
                } else {
                    40
                }
            }
            // Ramps up through the morning, plateaus, then tails off.
            DemandPattern::Weekend => {
                if hour < 12 {
                    30 + hour.saturating_sub(open_hour) * 5
                } else if hour <= 16 {
                    90
                } else {
                    70u32.saturating_sub((hour - 16) * 5)
                }
            }
        }
    }
}
