use crate::cost::CostResult;
use crate::error::EngineError;
use core_types::assumptions::{
    BATTERY_PV_CHARGE_FRACTION, BATTERY_PV_RATIO, CO_LOCATION_SAVINGS, GRID_CHARGE_COST,
};
use core_types::{split_label, CoreError, FinancialAssumptions, ItcKey, MetricTable, Scenario};
use finance::{FinanceFactorResult, TaxCredits};
use technologies::{FormulaStrategy, Metric};
use std::collections::BTreeMap;
use tracing::debug;

/// LCOE in $/MWh, and the fuel component for fuel-augmented technologies.
#[derive(Debug, Clone, PartialEq)]
pub struct LcoeResult {
    pub lcoe: MetricTable,
    pub fuel: Option<MetricTable>,
}

/// The tables an LCOE formula reads.
pub struct LcoeInputs<'a> {
    pub metrics: &'a BTreeMap<Metric, MetricTable>,
    pub financial: &'a FinancialAssumptions,
    pub cost: &'a CostResult,
    pub finance: &'a FinanceFactorResult,
    pub credits: &'a TaxCredits,
    /// Round-trip efficiency of grid-charged battery energy.
    pub grid_roundtrip_efficiency: f64,
}

impl LcoeInputs<'_> {
    fn metric(&self, metric: Metric) -> Result<&MetricTable, EngineError> {
        self.metrics
            .get(&metric)
            .ok_or_else(|| CoreError::shape(metric.header(), "metric was not loaded").into())
    }

    fn aep(&self) -> Result<&MetricTable, EngineError> {
        self.cost
            .aep
            .as_ref()
            .ok_or_else(|| CoreError::shape("AEP", "no capacity factor to derive AEP from").into())
    }
}

/// Applies a technology's `FormulaStrategy` to the cost and finance results.
#[derive(Debug, Default)]
pub struct LcoeEngine {}

impl LcoeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` for strategies that do not produce an LCOE.
    pub fn compute(
        &self,
        strategy: FormulaStrategy,
        inputs: &LcoeInputs<'_>,
    ) -> Result<Option<LcoeResult>, EngineError> {
        let result = match strategy {
            FormulaStrategy::Standard => LcoeResult { lcoe: self.standard(inputs)?, fuel: None },
            FormulaStrategy::FuelAugmented => {
                let fuel = inputs.metric(Metric::HeatRate)?.zip_with(
                    inputs.metric(Metric::FuelCost)?,
                    "Fuel",
                    |hr, cost| hr * cost,
                )?;
                let lcoe = self.standard(inputs)?.zip_with(&fuel, "LCOE", |l, f| l + f)?;
                LcoeResult { lcoe, fuel: Some(fuel) }
            }
            FormulaStrategy::HybridStorage => LcoeResult { lcoe: self.hybrid(inputs)?, fuel: None },
            FormulaStrategy::CapexOnly | FormulaStrategy::None => return Ok(None),
        };
        result.lcoe.ensure_complete("LCOE")?;
        debug!(strategy = %strategy, rows = result.lcoe.n_rows(), "Computed LCOE");
        Ok(Some(result))
    }

    /// `1000 * (CRF * PFF * CAPEX + FOM) / AEP + VOM - PTC`.
    fn standard(&self, inputs: &LcoeInputs<'_>) -> Result<MetricTable, EngineError> {
        let capex = &inputs.cost.capex;
        let fom = inputs.metric(Metric::FixedOm)?;
        let vom = inputs.metric(Metric::VariableOm)?;
        let aep = inputs.aep()?;
        let ptc = inputs.credits.ptc_for_rows(capex)?;
        for (table, name) in [(fom, "Fixed O&M"), (vom, "Variable O&M"), (aep, "AEP")] {
            capex.ensure_same_shape(table, name)?;
        }

        per_cell(capex, |row, scenario, col| {
            let crf = inputs.finance.crf_for(scenario)?[col];
            let pff = inputs.finance.pff_for(ItcKey::Plain, scenario)?[col];
            let annual = crf * pff * capex.value(row, col) + fom.value(row, col);
            Ok(1000.0 * annual / aep.value(row, col) + vom.value(row, col) - ptc.value(row, col))
        })
    }

    /// PV and battery capital recovered on separate fixed charge rates, plus the
    /// cost of grid-charged battery energy, less the PTC earned on PV output.
    fn hybrid(&self, inputs: &LcoeInputs<'_>) -> Result<MetricTable, EngineError> {
        let fin = inputs.financial;
        let pv_charge_fraction = fin.require(BATTERY_PV_CHARGE_FRACTION)?;
        let grid_charge_cost = fin.require(GRID_CHARGE_COST)?;
        let savings = fin.require(CO_LOCATION_SAVINGS)?;
        let ratio = fin.require(BATTERY_PV_RATIO)?;
        let rte = inputs.grid_roundtrip_efficiency;
        if !(rte > 0.0) {
            return Err(EngineError::Configuration(format!(
                "grid round-trip efficiency must be positive, got {rte}"
            )));
        }
        let grid_charging = (1.0 - pv_charge_fraction) * grid_charge_cost / rte;

        let cff = inputs.metric(Metric::ConstructionFinanceFactor)?;
        let gcc = inputs.metric(Metric::GridConnectionCost)?;
        let fom = inputs.metric(Metric::FixedOm)?;
        let vom = inputs.metric(Metric::VariableOm)?;
        let pv_cost = inputs.metric(Metric::PvSystemCost)?;
        let battery_cost = inputs.metric(Metric::BatteryCost)?;
        let pv_cf = inputs.metric(Metric::PvOnlyCapacityFactor)?;
        let cf = inputs.metric(Metric::NetCapacityFactor)?;
        let aep = inputs.aep()?;
        for (table, name) in [
            (gcc, "GCC"),
            (fom, "Fixed O&M"),
            (vom, "Variable O&M"),
            (pv_cost, "PV System Cost"),
            (battery_cost, "Battery Cost"),
            (pv_cf, "PV-only CF"),
            (cf, "CF"),
            (aep, "AEP"),
        ] {
            cff.ensure_same_shape(table, name)?;
        }
        let ptc = inputs.credits.ptc_for_rows(cff)?;

        per_cell(cff, |row, scenario, col| {
            let crf = inputs.finance.crf_for(scenario)?[col];
            let fcr_pv = crf * inputs.finance.pff_for(ItcKey::Pv, scenario)?[col];
            let fcr_battery = crf * inputs.finance.pff_for(ItcKey::Battery, scenario)?[col];
            let factor = cff.value(row, col);

            let pv_capital = fcr_pv * factor * (pv_cost.value(row, col) * savings + gcc.value(row, col));
            let battery_capital = fcr_battery * factor * (battery_cost.value(row, col) * savings * ratio);
            let annual = pv_capital + battery_capital + fom.value(row, col);

            let blended_cf = cf.value(row, col);
            if blended_cf == 0.0 {
                return Err(CoreError::shape("CF", format!("zero capacity factor in row {row}")).into());
            }
            let pv_share = (pv_cf.value(row, col) / blended_cf).min(1.0);

            Ok(1000.0 * annual / aep.value(row, col) + vom.value(row, col) + grid_charging
                - ptc.value(row, col) * pv_share)
        })
    }
}

/// Builds a table shaped like `like` from a per-cell function that receives the
/// row index, the row's scenario and the column index.
fn per_cell(
    like: &MetricTable,
    f: impl Fn(usize, Scenario, usize) -> Result<f64, EngineError>,
) -> Result<MetricTable, EngineError> {
    let mut values = Vec::with_capacity(like.n_rows() * like.n_years());
    for (row, label) in like.rows().iter().enumerate() {
        let scenario: Scenario = split_label(label).1.parse()?;
        for col in 0..like.n_years() {
            values.push(f(row, scenario, col)?);
        }
    }
    Ok(MetricTable::new(like.rows().to_vec(), like.years().to_vec(), values)?)
}
