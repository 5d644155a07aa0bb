//! Demo data generators for Shift Scheduling.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{DemandPattern, DemandProfile, Employee, Hour};
use crate::optimizer::{OptimizationConfig, ScheduleProblem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    /// Brew Haven coffee shop: 8 employees, open 06:00-20:00.
    Small,
    /// Department store: 24 generated employees, open 08:00-22:00.
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// Generates the demo problem for the given size.
pub fn generate(demo: DemoData) -> ScheduleProblem {
    match demo {
        DemoData::Small => brew_haven(),
        DemoData::Large => department_store(),
    }
}

fn brew_haven() -> ScheduleProblem {
    // (name, rate, max/day, max/week, availability, skills)
    let staff: [(&str, f64, u32, u32, std::ops::Range<Hour>, &[&str]); 8] = [
        ("Sarah Johnson", 22.0, 8, 40, 6..18, &["Manager", "Barista", "Customer Service"]),
        ("Mike Chen", 18.0, 8, 40, 6..20, &["Barista", "Training", "Customer Service"]),
        ("Jessica Martinez", 16.0, 8, 38, 10..20, &["Barista", "POS", "Customer Service"]),
        ("Tom Wilson", 15.0, 6, 30, 8..18, &["Barista", "Cleaning", "Stocking"]),
        ("Emma Davis", 14.0, 5, 20, 11..17, &["Barista", "Customer Service"]),
        ("Alex Rodriguez", 13.5, 4, 16, 12..18, &["Cashier", "Stocking", "Customer Service"]),
        ("Lisa Anderson", 14.5, 6, 24, 16..20, &["Barista", "Cashier", "Cleaning"]),
        ("David Kim", 13.5, 5, 18, 12..20, &["Barista", "Customer Service", "Stocking"]),
    ];

    let employees = staff
        .into_iter()
        .enumerate()
        .map(|(i, (name, rate, per_day, per_week, hours, skills))| {
            Employee::new(format!("E{}", i + 1), name, rate)
                .with_max_hours(per_day, per_week)
                .with_availability(hours)
                .with_skills(skills.iter().copied())
        })
        .collect();

    let demand = DemandProfile::new(6, 20)
        .with_ratio(0.05)
        .with_min_staff(2)
        .with_demand([
            (6, 10),
            (7, 40),
            (8, 80),
            (9, 90),
            (10, 70),
            (11, 80),
            (12, 120),
            (13, 110),
            (14, 75),
            (15, 60),
            (16, 65),
            (17, 85),
            (18, 95),
            (19, 80),
        ]);

    ScheduleProblem::new(employees, demand).with_config(OptimizationConfig::default())
}

const STORE_OPEN: Hour = 8;
const STORE_CLOSE: Hour = 22;
const STORE_EMPLOYEES: usize = 24;

const SKILLS: &[&str] = &[
    "Cashier",
    "Stocking",
    "Customer Service",
    "Fitting Room",
    "Manager",
];

fn department_store() -> ScheduleProblem {
    let mut rng = StdRng::seed_from_u64(0);
    let names = generate_name_permutations(&mut rng);

    let employees = (0..STORE_EMPLOYEES)
        .map(|i| {
            // Rates in half-dollar steps between $13 and $25.
            let rate = f64::from(rng.gen_range(26..=50u32)) / 2.0;
            let per_day = pick_count(&mut rng, &[(4, 1.0), (6, 2.0), (8, 3.0)]);
            let start = rng.gen_range(STORE_OPEN..STORE_CLOSE - 4);
            let end = (start + rng.gen_range(6..=12)).min(STORE_CLOSE);
            let skill_count = pick_count(&mut rng, &[(1, 3.0), (2, 1.0)]) as usize;
            let skills: Vec<&str> = SKILLS.choose_multiple(&mut rng, skill_count).copied().collect();

            Employee::new(format!("E{}", i + 1), names[i % names.len()].as_str(), rate)
                .with_max_hours(per_day, per_day * 5)
                .with_availability(start..end)
                .with_skills(skills)
        })
        .collect();

    let mut demand = DemandProfile::new(STORE_OPEN, STORE_CLOSE)
        .with_ratio(0.05)
        .with_min_staff(2);
    demand.apply_pattern(DemandPattern::Bimodal);
    demand.scale_demand(1.5);

    ScheduleProblem::new(employees, demand).with_config(OptimizationConfig::default())
}

/// Pick a count based on weighted distribution.
fn pick_count(rng: &mut StdRng, distribution: &[(u32, f64)]) -> u32 {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (count, weight) in distribution {
        if choice < *weight {
            return *count;
        }
        choice -= weight;
    }
    distribution.last().map(|(c, _)| *c).unwrap_or(1)
}

const FIRST_NAMES: &[&str] = &[
    "Amy", "Beth", "Carl", "Dan", "Elsa", "Flo", "Gus", "Hugo", "Ivy", "Jay",
];
const LAST_NAMES: &[&str] = &[
    "Cole", "Fox", "Green", "Jones", "King", "Li", "Poe", "Rye", "Smith", "Watt",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<String> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push(format!("{} {}", first, last));
        }
    }
    names.shuffle(rng);
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::required_staff;

    #[test]
    fn test_generate_small() {
        let problem = generate(DemoData::Small);

        assert_eq!(problem.employees.len(), 8);
        assert_eq!(problem.demand.operating_hours(), 14);
        assert!(problem.validate().is_ok());

        let required = required_staff(&problem.demand).unwrap();
        // 120 customers at noon, one staff member per 20.
        assert_eq!(required.get(12), Some(6));
        // The two-person floor beats 10 * 0.05.
        assert_eq!(required.get(6), Some(2));
    }

    #[test]
    fn test_generate_large() {
        let problem = generate(DemoData::Large);

        assert_eq!(problem.employees.len(), 24);
        assert!(problem.validate().is_ok());
        for emp in &problem.employees {
            assert!(!emp.availability.is_empty());
            assert!(emp.availability.iter().all(|h| problem.demand.is_open(*h)));
            assert!(!emp.skills.is_empty());
        }
    }

    #[test]
    fn test_large_is_deterministic() {
        assert_eq!(generate(DemoData::Large), generate(DemoData::Large));
    }

    #[test]
    fn test_demo_data_from_str() {
        assert_eq!("SMALL".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("small".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("LARGE".parse::<DemoData>(), Ok(DemoData::Large));
        assert!("invalid".parse::<DemoData>().is_err());
    }

    #[test]
    fn test_list_matches_parse() {
        for name in list_demo_data() {
            let demo: DemoData = name.parse().unwrap();
            assert_eq!(demo.as_str(), name);
        }
    }
}
