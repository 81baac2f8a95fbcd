use crate::error::DebtFractionError;
use core_types::assumptions::{
    EQUITY_RETURN_NOMINAL, EQUITY_RETURN_REAL, INFLATION_RATE, INTEREST_RATE_NOMINAL, TAX_RATE,
};
use core_types::{FinancialCase, MetricTable, Scenario};
use engine::{EngineError, RunOutput};
use serde::{Deserialize, Serialize};
use technologies::{FormulaStrategy, OutputField, TechnologyProfile};

/// The parameter record handed to the debt-fraction solver. Field names on the
/// wire are the solver's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtFractionInputs {
    /// Capacity factor, 0-1.
    #[serde(rename = "CF")]
    pub capacity_factor: f64,
    /// $/kW
    #[serde(rename = "OCC")]
    pub occ: f64,
    /// Construction financing cost, $/kW.
    #[serde(rename = "CFC")]
    pub cfc: f64,
    /// $/kW-yr
    #[serde(rename = "Fixed O&M")]
    pub fixed_om: f64,
    /// $/MWh
    #[serde(rename = "Variable O&M")]
    pub variable_om: f64,
    #[serde(rename = "DSCR")]
    pub dscr: f64,
    #[serde(rename = "Rate of Return on Equity Nominal")]
    pub equity_return_nominal: f64,
    #[serde(rename = "Tax Rate (Federal and State)")]
    pub tax_rate: f64,
    #[serde(rename = "Inflation Rate")]
    pub inflation_rate: f64,
    #[serde(rename = "Interest Rate Nominal")]
    pub interest_rate_nominal: f64,
    #[serde(rename = "Calculated Rate of Return on Equity Real")]
    pub equity_return_real: f64,
    /// Federal ITC, 0-1.
    #[serde(rename = "ITC")]
    pub itc: f64,
    /// Federal PTC, $/MWh.
    #[serde(rename = "PTC")]
    pub ptc: f64,
    /// Depreciation schedule name, e.g. `MACRS-6`.
    #[serde(rename = "MACRS")]
    pub macrs: String,
    /// Fuel cost per unit of energy, heat rate times fuel price, $/MWh.
    #[serde(rename = "Fuel", default, skip_serializing_if = "Option::is_none")]
    pub fuel: Option<f64>,
    /// MMBtu/MWh
    #[serde(rename = "Heat Rate", default, skip_serializing_if = "Option::is_none")]
    pub heat_rate: Option<f64>,
}

impl DebtFractionInputs {
    /// Cuts the record for `year` out of a run: cost values of the profile's
    /// representative detail under `scenario`, rates from the WACC table and
    /// tax credits of the run. Tax credits only count in the Market case.
    pub fn from_run(
        output: &RunOutput,
        profile: &TechnologyProfile,
        scenario: Scenario,
        year: i32,
    ) -> Result<Self, DebtFractionError> {
        let config = |detail: &str| {
            DebtFractionError::Configuration(format!("{} has no {detail}", profile.name))
        };
        let detail = profile
            .default_tech_detail
            .as_deref()
            .ok_or_else(|| config("representative tech detail"))?;
        let dscr = profile.dscr.ok_or_else(|| config("DSCR"))?;
        let wacc = output.inputs.wacc.as_ref().ok_or_else(|| config("WACC table"))?;

        let missing = |parameter: &str| DebtFractionError::MissingInput {
            technology: profile.name.clone(),
            parameter: parameter.to_string(),
            year,
        };
        let label = format!("{detail}/{scenario}");
        let cell = |table: Option<&MetricTable>, parameter: &str| {
            table.and_then(|t| t.get(&label, year)).ok_or_else(|| missing(parameter))
        };
        let detail_value = |field: OutputField| cell(output.field(field), field.parameter());
        let rate = |name: &str| wacc.full.get(name, year).ok_or_else(|| missing(name));

        let col = output
            .years()
            .iter()
            .position(|y| *y == year)
            .ok_or_else(|| missing("year"))?;
        let (itc, ptc) = if output.case == FinancialCase::Market {
            let key = profile.itc_keys()[0];
            let itc = output.credits.itc(key).map_err(EngineError::from)?[col];
            let ptc = output.credits.ptc(scenario).map_err(EngineError::from)?[col];
            (itc, ptc)
        } else {
            (0.0, 0.0)
        };

        let (fuel, heat_rate) = if profile.strategy == FormulaStrategy::FuelAugmented {
            (
                Some(detail_value(OutputField::Fuel)?),
                Some(detail_value(OutputField::HeatRate)?),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            capacity_factor: detail_value(OutputField::CapacityFactor)?,
            occ: detail_value(OutputField::OvernightCapitalCost)?,
            cfc: detail_value(OutputField::ConstructionFinanceCost)?,
            fixed_om: detail_value(OutputField::FixedOm)?,
            variable_om: detail_value(OutputField::VariableOm)?,
            dscr,
            equity_return_nominal: rate(EQUITY_RETURN_NOMINAL)?,
            tax_rate: rate(TAX_RATE)?,
            inflation_rate: rate(INFLATION_RATE)?,
            interest_rate_nominal: rate(INTEREST_RATE_NOMINAL)?,
            equity_return_real: rate(EQUITY_RETURN_REAL)?,
            itc,
            ptc,
            macrs: profile.depreciation.select(output.case, year).to_string(),
            fuel,
            heat_rate,
        })
    }
}
