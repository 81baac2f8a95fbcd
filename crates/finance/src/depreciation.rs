use crate::error::FinanceError;
use core_types::FinancialCase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const MACRS_6: &str = "MACRS-6";
pub const MACRS_16: &str = "MACRS-16";
pub const MACRS_21: &str = "MACRS-21";

/// Allowed distance of a schedule's sum from 1.0.
pub const SUM_TOLERANCE: f64 = 1e-6;

const MACRS_6_FRACTIONS: [f64; 6] = [0.2, 0.32, 0.192, 0.1152, 0.1152, 0.0576];

const MACRS_16_FRACTIONS: [f64; 16] = [
    0.0500, 0.0950, 0.0855, 0.0770, 0.0693, 0.0623, 0.0590, 0.0590, 0.0591, 0.0590, 0.0591,
    0.0590, 0.0591, 0.0590, 0.0591, 0.0295,
];

// IRS 20-year property, half-year convention.
const MACRS_21_FRACTIONS: [f64; 21] = [
    0.03750, 0.07219, 0.06677, 0.06177, 0.05713, 0.05285, 0.04888, 0.04522, 0.04462, 0.04461,
    0.04462, 0.04461, 0.04462, 0.04461, 0.04462, 0.04461, 0.04462, 0.04461, 0.04462, 0.04461,
    0.02231,
];

/// A named, ordered list of depreciation fractions, one per depreciation year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationSchedule {
    name: String,
    fractions: Vec<f64>,
}

impl DepreciationSchedule {
    /// Creates a schedule, rejecting empty lists, negative or non-finite
    /// fractions, and fractions that do not sum to 1.
    pub fn new(name: impl Into<String>, fractions: Vec<f64>) -> Result<Self, FinanceError> {
        let name = name.into();
        if fractions.is_empty() {
            return Err(FinanceError::Configuration(format!(
                "depreciation schedule '{name}' has no fractions"
            )));
        }
        if fractions.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(FinanceError::Configuration(format!(
                "depreciation schedule '{name}' contains a negative or non-finite fraction"
            )));
        }
        let sum: f64 = fractions.iter().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(FinanceError::Configuration(format!(
                "depreciation schedule '{name}' sums to {sum}, expected 1"
            )));
        }
        Ok(Self { name, fractions })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    /// Number of depreciation years.
    pub fn years(&self) -> usize {
        self.fractions.len()
    }
}

/// All depreciation schedules a run may refer to, by name.
#[derive(Debug, Clone)]
pub struct DepreciationRegistry {
    schedules: BTreeMap<String, DepreciationSchedule>,
}

impl DepreciationRegistry {
    /// A registry holding the MACRS 6, 16 and 21 year tables.
    pub fn builtin() -> Self {
        let schedules = [
            (MACRS_6, MACRS_6_FRACTIONS.to_vec()),
            (MACRS_16, MACRS_16_FRACTIONS.to_vec()),
            (MACRS_21, MACRS_21_FRACTIONS.to_vec()),
        ]
        .into_iter()
        .map(|(name, fractions)| {
            (name.to_string(), DepreciationSchedule { name: name.to_string(), fractions })
        })
        .collect();
        Self { schedules }
    }

    /// Adds a schedule, replacing any existing schedule with the same name.
    pub fn register(&mut self, schedule: DepreciationSchedule) {
        debug!(name = schedule.name(), years = schedule.years(), "Registering depreciation schedule");
        self.schedules.insert(schedule.name.clone(), schedule);
    }

    pub fn get(&self, name: &str) -> Result<&DepreciationSchedule, FinanceError> {
        self.schedules.get(name).ok_or_else(|| {
            FinanceError::Configuration(format!("unknown depreciation schedule '{name}'"))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schedules.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepreciationSchedule> {
        self.schedules.values()
    }
}

impl Default for DepreciationRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// One row of a technology's depreciation rule table. A rule applies when its
/// case (if any) matches and the year is at or after `from_year` (if any).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationRule {
    pub case: Option<FinancialCase>,
    pub from_year: Option<i32>,
    pub schedule: String,
}

impl DepreciationRule {
    fn applies(&self, case: FinancialCase, year: i32) -> bool {
        self.case.is_none_or(|c| c == case) && self.from_year.is_none_or(|y| year >= y)
    }
}

/// Selects the schedule name for a `(financial case, year)` pair. The first
/// matching rule wins; without a match the default schedule is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationSelector {
    default: String,
    rules: Vec<DepreciationRule>,
}

impl DepreciationSelector {
    /// The same schedule for every case and year.
    pub fn fixed(schedule: &str) -> Self {
        Self { default: schedule.to_string(), rules: Vec::new() }
    }

    /// Switches to `schedule` in `case` from `from_year` on.
    pub fn switching(default: &str, case: FinancialCase, from_year: i32, schedule: &str) -> Self {
        Self::fixed(default).with_rule(DepreciationRule {
            case: Some(case),
            from_year: Some(from_year),
            schedule: schedule.to_string(),
        })
    }

    pub fn with_rule(mut self, rule: DepreciationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn select(&self, case: FinancialCase, year: i32) -> &str {
        self.rules
            .iter()
            .find(|r| r.applies(case, year))
            .map(|r| r.schedule.as_str())
            .unwrap_or(&self.default)
    }

    /// Every schedule name the selector can return.
    pub fn schedule_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.default.as_str()).chain(self.rules.iter().map(|r| r.schedule.as_str()))
    }

    /// Fails with a configuration error when a referenced schedule is not registered.
    pub fn check(&self, registry: &DepreciationRegistry) -> Result<(), FinanceError> {
        for name in self.schedule_names() {
            registry.get(name)?;
        }
        Ok(())
    }

    /// Resolves the schedule for a case and year.
    pub fn resolve<'r>(
        &self,
        registry: &'r DepreciationRegistry,
        case: FinancialCase,
        year: i32,
    ) -> Result<&'r DepreciationSchedule, FinanceError> {
        registry.get(self.select(case, year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_schedules_sum_to_one() {
        let registry = DepreciationRegistry::builtin();
        for schedule in registry.iter() {
            let sum: f64 = schedule.fractions().iter().sum();
            assert!((sum - 1.0).abs() < SUM_TOLERANCE, "{} sums to {sum}", schedule.name());
        }
        assert_eq!(registry.get(MACRS_21).unwrap().years(), 21);
    }

    #[test]
    fn unknown_schedule_is_a_configuration_error() {
        let registry = DepreciationRegistry::builtin();
        assert!(registry.get("MACRS-7").unwrap_err().is_configuration());
        let selector = DepreciationSelector::fixed("MACRS-7");
        assert!(selector.check(&registry).is_err());
    }

    #[test]
    fn rejects_schedules_that_do_not_sum_to_one() {
        assert!(DepreciationSchedule::new("bad", vec![0.5, 0.4]).is_err());
        assert!(DepreciationSchedule::new("empty", vec![]).is_err());
        assert!(DepreciationSchedule::new("straight-5", vec![0.2; 5]).is_ok());
    }

    #[test]
    fn switch_applies_only_to_matching_case_and_years() {
        let selector =
            DepreciationSelector::switching(MACRS_21, FinancialCase::Market, 2025, MACRS_6);
        assert_eq!(selector.select(FinancialCase::Market, 2024), MACRS_21);
        assert_eq!(selector.select(FinancialCase::Market, 2025), MACRS_6);
        assert_eq!(selector.select(FinancialCase::Market, 2040), MACRS_6);
        assert_eq!(selector.select(FinancialCase::RAndD, 2040), MACRS_21);
    }
}
