use crate::enums::Scenario;
use crate::error::CoreError;
use crate::table::MetricTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Row names in the WACC table.
pub const INFLATION_RATE: &str = "Inflation Rate";
pub const TAX_RATE: &str = "Tax Rate (Federal and State)";
pub const INTEREST_RATE_NOMINAL: &str = "Interest Rate Nominal";
pub const EQUITY_RETURN_NOMINAL: &str = "Rate of Return on Equity Nominal";
pub const EQUITY_RETURN_REAL: &str = "Calculated Rate of Return on Equity Real";

// Scalar names in the financial-assumption table.
pub const CAPITAL_RECOVERY_PERIOD: &str = "Capital Recovery Period (Years)";
pub const BATTERY_PV_CHARGE_FRACTION: &str = "Fraction of Battery Energy Charged from PV (75% to 100%)";
pub const GRID_CHARGE_COST: &str = "Average Cost of Battery Energy Charged from Grid ($/MWh)";
pub const CO_LOCATION_SAVINGS: &str = "Co-location Savings";
pub const BATTERY_PV_RATIO: &str = "Battery to PV Capacity Ratio";

/// Number of trailing WACC rows holding the nominal and real WACC per scenario.
pub const JUST_WACC_ROWS: usize = 6;

/// `WACC Real - Moderate` and friends.
pub fn wacc_real_label(scenario: Scenario) -> String {
    format!("WACC Real - {scenario}")
}

/// Named scalar financial assumptions for one technology sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialAssumptions {
    values: BTreeMap<String, f64>,
}

impl FinancialAssumptions {
    pub fn new(values: BTreeMap<String, f64>) -> Self {
        Self { values }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Fetches a scalar that a formula cannot do without.
    pub fn require(&self, name: &str) -> Result<f64, CoreError> {
        match self.values.get(name) {
            Some(v) if v.is_finite() => Ok(*v),
            Some(_) => Err(CoreError::MissingValue {
                metric: "financial assumptions".to_string(),
                row: name.to_string(),
                year: 0,
            }),
            None => Err(CoreError::shape(
                "financial assumptions",
                format!("'{name}' is not present"),
            )),
        }
    }

    /// The capital recovery period the sheet itself was set up with, if any.
    pub fn capital_recovery_period(&self) -> Option<f64> {
        self.get(CAPITAL_RECOVERY_PERIOD)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Year-indexed financial assumptions: the full WACC table plus its last six
/// rows (`WACC Nominal - *` and `WACC Real - *`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccTables {
    pub full: MetricTable,
    pub just_wacc: MetricTable,
}

impl WaccTables {
    /// Derives the six-row WACC block from the full table.
    pub fn from_full(full: MetricTable) -> Result<Self, CoreError> {
        if full.n_rows() < JUST_WACC_ROWS {
            return Err(CoreError::shape(
                "WACC",
                format!("expected at least {JUST_WACC_ROWS} rows, found {}", full.n_rows()),
            ));
        }
        let just_wacc = full.tail(JUST_WACC_ROWS);
        Ok(Self { full, just_wacc })
    }

    pub fn years(&self) -> &[i32] {
        self.full.years()
    }

    /// A named row of the full table.
    pub fn series(&self, name: &str) -> Result<&[f64], CoreError> {
        self.full
            .row(name)
            .ok_or_else(|| CoreError::shape("WACC", format!("row '{name}' not found")))
    }

    pub fn inflation(&self) -> Result<&[f64], CoreError> {
        self.series(INFLATION_RATE)
    }

    pub fn tax_rate(&self) -> Result<&[f64], CoreError> {
        self.series(TAX_RATE)
    }

    /// The real WACC for a scenario, read from the six-row block.
    pub fn wacc_real(&self, scenario: Scenario) -> Result<&[f64], CoreError> {
        let label = wacc_real_label(scenario);
        self.just_wacc
            .row(&label)
            .ok_or_else(|| CoreError::shape("WACC", format!("row '{label}' not found")))
    }

    /// Restricts both tables to the technology's year range.
    pub fn restrict_years(&self, base: i32, end: i32) -> Result<Self, CoreError> {
        Ok(Self {
            full: self.full.restrict_years("WACC", base, end)?,
            just_wacc: self.just_wacc.restrict_years("WACC", base, end)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn just_wacc_is_the_last_six_rows() {
        let names = [
            INFLATION_RATE,
            TAX_RATE,
            "WACC Nominal - Advanced",
            "WACC Nominal - Moderate",
            "WACC Nominal - Conservative",
            "WACC Real - Advanced",
            "WACC Real - Moderate",
            "WACC Real - Conservative",
        ];
        let rows = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), vec![i as f64; 2]))
            .collect();
        let full = MetricTable::from_rows(vec![2021, 2022], rows).unwrap();
        let wacc = WaccTables::from_full(full).unwrap();
        assert_eq!(wacc.just_wacc.n_rows(), 6);
        assert_eq!(wacc.wacc_real(Scenario::Moderate).unwrap(), &[6.0, 6.0]);
        assert_eq!(wacc.inflation().unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn missing_scalar_is_a_shape_error() {
        let fin = FinancialAssumptions::default();
        assert!(matches!(fin.require(GRID_CHARGE_COST), Err(CoreError::DataShape { .. })));
    }
}
