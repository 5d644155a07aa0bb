//! Demand aggregation: customer curve -> staff required per open hour.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{DemandProfile, Hour};
use crate::error::OptimizeError;

/// Products within this distance above an integer round down to it, so that
/// `30 * 0.1` asks for 3 staff rather than 4.
const CEIL_TOLERANCE: f64 = 1e-9;

/// Staff required for each open hour of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequiredStaff {
    pub open_hour: Hour,
    /// `required[i]` belongs to hour `open_hour + i`.
    pub required: Vec<u32>,
}

impl RequiredStaff {
    pub fn new(open_hour: Hour, required: Vec<u32>) -> Self {
        Self {
            open_hour,
            required,
        }
    }

    /// First closed hour.
    pub fn close_hour(&self) -> Hour {
        self.open_hour + self.required.len() as Hour
    }

    pub fn hours(&self) -> std::ops::Range<Hour> {
        self.open_hour..self.close_hour()
    }

    pub fn len(&self) -> usize {
        self.required.len()
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    /// Requirement at `hour`, `None` outside the open hours.
    pub fn get(&self, hour: Hour) -> Option<u32> {
        hour.checked_sub(self.open_hour)
            .and_then(|i| self.required.get(i as usize))
            .copied()
    }

    /// `(hour, required)` pairs in hour order.
    pub fn iter(&self) -> impl Iterator<Item = (Hour, u32)> + '_ {
        self.hours().zip(self.required.iter().copied())
    }

    /// Staff-hours over the whole day.
    pub fn total(&self) -> u64 {
        self.required.iter().map(|&r| u64::from(r)).sum()
    }
}

/// Computes `ceil(max(customers[h] * ratio, min_staff))` for every open hour.
///
/// # Examples
///
/// ```
/// use shift_scheduler::demand::required_staff;
/// use shift_scheduler::domain::DemandProfile;
///
/// let demand = DemandProfile::new(8, 11)
///     .with_ratio(0.05)
///     .with_min_staff(1)
///     .with_demand([(8, 10), (9, 41), (10, 100)]);
///
/// let required = required_staff(&demand).unwrap();
/// assert_eq!(required.required, vec![1, 3, 5]);
/// assert_eq!(required.get(9), Some(3));
/// assert_eq!(required.get(11), None);
/// ```
pub fn required_staff(demand: &DemandProfile) -> Result<RequiredStaff, OptimizeError> {
    demand.validate()?;

    let required = demand
        .hours()
        .map(|hour| {
            let from_customers = f64::from(demand.demand(hour)) * demand.staff_per_customer_ratio;
            ceil_staff(from_customers.max(f64::from(demand.min_staff_per_hour)))
        })
        .collect();

    Ok(RequiredStaff::new(demand.open_hour, required))
}

fn ceil_staff(value: f64) -> u32 {
    (value - CEIL_TOLERANCE).ceil().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_staff_floor() {
        let demand = DemandProfile::new(8, 12).with_ratio(0.05).with_min_staff(2);
        let required = required_staff(&demand).unwrap();
        assert_eq!(required.required, vec![2, 2, 2, 2]);
        assert!(required.iter().all(|(_, r)| r >= 2));
    }

    #[test]
    fn test_product_is_rounded_up() {
        let demand = DemandProfile::new(8, 10)
            .with_ratio(0.05)
            .with_min_staff(0)
            .with_demand([(8, 21), (9, 1)]);
        let required = required_staff(&demand).unwrap();
        assert_eq!(required.required, vec![2, 1]);
    }

    #[test]
    fn test_float_noise_does_not_round_up() {
        let demand = DemandProfile::new(8, 9)
            .with_ratio(0.1)
            .with_min_staff(0)
            .with_demand([(8, 30)]);
        assert_eq!(required_staff(&demand).unwrap().required, vec![3]);
    }

    #[test]
    fn test_zero_ratio_uses_floor_only() {
        let demand = DemandProfile::new(8, 10)
            .with_ratio(0.0)
            .with_min_staff(0)
            .with_demand([(8, 500)]);
        assert_eq!(required_staff(&demand).unwrap().required, vec![0, 0]);
    }

    #[test]
    fn test_inverted_hours_rejected() {
        let demand = DemandProfile::new(12, 8);
        assert!(matches!(
            required_staff(&demand),
            Err(OptimizeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_huge_demand_total_is_exact() {
        let demand = DemandProfile::new(8, 10)
            .with_ratio(1.0)
            .with_min_staff(0)
            .with_demand([(8, 3_000_000_000), (9, 3_000_000_000)]);
        let required = required_staff(&demand).unwrap();
        assert_eq!(required.total(), 6_000_000_000);
    }

    #[test]
    fn test_hours_and_lookup() {
        let required = RequiredStaff::new(6, vec![1, 2, 3]);
        assert_eq!(required.close_hour(), 9);
        assert_eq!(required.get(5), None);
        assert_eq!(required.get(8), Some(3));
        assert_eq!(required.total(), 6);
        assert_eq!(
            required.iter().collect::<Vec<_>>(),
            vec![(6, 1), (7, 2), (8, 3)]
        );
    }
}
