use crate::depreciation::{DepreciationRegistry, DepreciationSelector};
use crate::error::FinanceError;
use crate::tax_credits::TaxCredits;
use core_types::{CoreError, FinancialCase, ItcKey, MetricTable, Scenario, WaccTables};
use std::collections::BTreeMap;
use tracing::debug;

/// Smallest accepted distance of the combined tax rate from 100%.
pub const TAX_RATE_GUARD: f64 = 1e-6;

/// Capital recovery factor for a real discount rate and recovery period.
pub fn crf(wacc_real: f64, crp_years: f64) -> f64 {
    if wacc_real == 0.0 {
        return 1.0 / crp_years;
    }
    wacc_real / (1.0 - (1.0 + wacc_real).powf(-crp_years))
}

/// Present value of a depreciation schedule discounted at the nominal rate
/// `(1 + wacc_real)(1 + inflation) - 1`, with the first fraction taken at the
/// end of year one.
pub fn depreciation_present_value(schedule: &[f64], wacc_real: f64, inflation: f64) -> f64 {
    let discount = (1.0 + wacc_real) * (1.0 + inflation);
    let mut factor = 1.0;
    schedule
        .iter()
        .map(|fraction| {
            factor /= discount;
            fraction * factor
        })
        .sum()
}

/// Project finance factor.
pub fn pff(tax_rate: f64, pvd: f64, itc: f64) -> Result<f64, FinanceError> {
    if !(0.0..=1.0 - TAX_RATE_GUARD).contains(&tax_rate) {
        return Err(FinanceError::Configuration(format!(
            "combined tax rate {tax_rate} is outside [0, 1); PFF is undefined"
        )));
    }
    Ok((1.0 - tax_rate * pvd * (1.0 - itc / 2.0) - itc) / (1.0 - tax_rate))
}

pub fn fcr(crf: f64, pff: f64) -> f64 {
    crf * pff
}

/// Everything the finance factors of one run depend on.
#[derive(Debug, Clone, Copy)]
pub struct FinanceInputs<'a> {
    /// WACC tables restricted to the technology's years.
    pub wacc: &'a WaccTables,
    pub scenarios: &'a [Scenario],
    pub crp_years: u32,
    pub case: FinancialCase,
    pub registry: &'a DepreciationRegistry,
    pub selector: &'a DepreciationSelector,
}

/// CRF per scenario and PFF per (ITC key, scenario).
#[derive(Debug, Clone, PartialEq)]
pub struct FinanceFactorResult {
    /// Rows `CRF - <scenario>`.
    pub crf: MetricTable,
    /// Rows `PFF - <scenario>` for each ITC key the technology uses.
    pub pff: BTreeMap<ItcKey, MetricTable>,
}

impl FinanceFactorResult {
    pub fn crf_for(&self, scenario: Scenario) -> Result<&[f64], FinanceError> {
        let label = crf_label(scenario);
        Ok(self
            .crf
            .row(&label)
            .ok_or_else(|| CoreError::shape("CRF", format!("row '{label}' not found")))?)
    }

    pub fn pff_table(&self, key: ItcKey) -> Result<&MetricTable, FinanceError> {
        Ok(self
            .pff
            .get(&key)
            .ok_or_else(|| CoreError::shape("PFF", format!("no PFF computed for '{}'", key.row_label())))?)
    }

    pub fn pff_for(&self, key: ItcKey, scenario: Scenario) -> Result<&[f64], FinanceError> {
        let label = pff_label(scenario);
        Ok(self
            .pff_table(key)?
            .row(&label)
            .ok_or_else(|| CoreError::shape("PFF", format!("row '{label}' not found")))?)
    }

    /// Fixed charge rate rows `FCR - <scenario>` for a PFF track.
    pub fn fcr(&self, key: ItcKey) -> Result<MetricTable, FinanceError> {
        let pff = self.pff_table(key)?;
        let table = self.crf.zip_with(pff, "FCR", fcr)?;
        let labels = table
            .rows()
            .iter()
            .map(|r| r.replacen("CRF", "FCR", 1))
            .collect();
        Ok(table.relabel(labels)?)
    }
}

pub fn crf_label(scenario: Scenario) -> String {
    format!("CRF - {scenario}")
}

pub fn pff_label(scenario: Scenario) -> String {
    format!("PFF - {scenario}")
}

pub fn pvd_label(scenario: Scenario) -> String {
    format!("PVD - {scenario}")
}

/// A stateless calculator for CRF, depreciation present value and PFF.
#[derive(Debug, Default)]
pub struct FinanceFactorEngine {}

impl FinanceFactorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes CRF and one PFF table per requested ITC key.
    pub fn calculate(
        &self,
        inputs: &FinanceInputs<'_>,
        credits: &TaxCredits,
        keys: &[ItcKey],
    ) -> Result<FinanceFactorResult, FinanceError> {
        let crf = self.capital_recovery(inputs)?;
        let pvd = self.depreciation_present_values(inputs)?;

        let mut pff = BTreeMap::new();
        for key in keys {
            pff.insert(*key, self.project_finance(inputs, &pvd, credits.itc(*key)?)?);
        }

        Ok(FinanceFactorResult { crf, pff })
    }

    /// CRF per scenario and year from the real WACC rows.
    pub fn capital_recovery(&self, inputs: &FinanceInputs<'_>) -> Result<MetricTable, FinanceError> {
        let crp = f64::from(inputs.crp_years);
        let mut rows = Vec::with_capacity(inputs.scenarios.len());
        for scenario in inputs.scenarios {
            let wacc = inputs.wacc.wacc_real(*scenario)?;
            rows.push((crf_label(*scenario), wacc.iter().map(|w| crf(*w, crp)).collect()));
        }
        let table = MetricTable::from_rows(inputs.wacc.years().to_vec(), rows)?;
        table.ensure_complete("CRF")?;
        Ok(table)
    }

    /// PVD per scenario and year. The schedule is selected per year, so a
    /// technology whose schedule switches gets a different sum from that year on.
    pub fn depreciation_present_values(
        &self,
        inputs: &FinanceInputs<'_>,
    ) -> Result<MetricTable, FinanceError> {
        let years = inputs.wacc.years();
        let inflation = inputs.wacc.inflation()?;

        let schedules = years
            .iter()
            .map(|y| inputs.selector.resolve(inputs.registry, inputs.case, *y))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(inputs.scenarios.len());
        for scenario in inputs.scenarios {
            let wacc = inputs.wacc.wacc_real(*scenario)?;
            let values = schedules
                .iter()
                .enumerate()
                .map(|(i, s)| depreciation_present_value(s.fractions(), wacc[i], inflation[i]))
                .collect();
            rows.push((pvd_label(*scenario), values));
        }
        debug!(case = %inputs.case, years = years.len(), "Computed depreciation present values");
        Ok(MetricTable::from_rows(years.to_vec(), rows)?)
    }

    /// PFF rows `PFF - <scenario>` from PVD rows and a year-indexed ITC schedule.
    pub fn project_finance(
        &self,
        inputs: &FinanceInputs<'_>,
        pvd: &MetricTable,
        itc: &[f64],
    ) -> Result<MetricTable, FinanceError> {
        let tax_rate = inputs.wacc.tax_rate()?;
        if itc.len() != pvd.n_years() || tax_rate.len() != pvd.n_years() {
            return Err(CoreError::shape(
                "PFF",
                format!(
                    "{} PVD years, {} ITC years and {} tax-rate years do not line up",
                    pvd.n_years(),
                    itc.len(),
                    tax_rate.len()
                ),
            )
            .into());
        }

        let mut rows = Vec::with_capacity(inputs.scenarios.len());
        for scenario in inputs.scenarios {
            let pvd_row = pvd
                .row(&pvd_label(*scenario))
                .ok_or_else(|| CoreError::shape("PVD", format!("no row for {scenario}")))?;
            let values = (0..pvd_row.len())
                .map(|i| pff(tax_rate[i], pvd_row[i], itc[i]))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push((pff_label(*scenario), values));
        }
        let table = MetricTable::from_rows(pvd.years().to_vec(), rows)?;
        table.ensure_complete("PFF")?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depreciation::{MACRS_21, MACRS_6};
    use core_types::assumptions::{INFLATION_RATE, TAX_RATE};

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{a} != {b}");
    }

    fn wacc(years: &[i32], wacc_real: f64, tax: f64) -> WaccTables {
        let mut rows = vec![
            (INFLATION_RATE.to_string(), vec![0.025; years.len()]),
            (TAX_RATE.to_string(), vec![tax; years.len()]),
        ];
        for s in Scenario::ALL {
            rows.push((format!("WACC Nominal - {s}"), vec![0.07; years.len()]));
        }
        for s in Scenario::ALL {
            rows.push((format!("WACC Real - {s}"), vec![wacc_real; years.len()]));
        }
        WaccTables::from_full(MetricTable::from_rows(years.to_vec(), rows).unwrap()).unwrap()
    }

    #[test]
    fn crf_closed_form() {
        assert_close(crf(0.05, 20.0), 0.080_242_6, 1e-6);
        assert_close(crf(0.0, 25.0), 0.04, 1e-12);
    }

    #[test]
    fn pvd_of_single_year_schedule() {
        let pvd = depreciation_present_value(&[1.0], 0.05, 0.02);
        assert_close(pvd, 1.0 / (1.05 * 1.02), 1e-12);
    }

    #[test]
    fn pff_without_credits_or_tax() {
        assert_close(pff(0.0, 0.8, 0.0).unwrap(), 1.0, 1e-12);
        assert!(pff(1.0, 0.8, 0.3).unwrap_err().is_configuration());
    }

    #[test]
    fn tax_rate_near_or_past_one_is_a_configuration_error() {
        for tax_rate in [0.999_999_99, 1.0, 1.2, -0.1, f64::NAN] {
            assert!(pff(tax_rate, 0.8, 0.0).unwrap_err().is_configuration(), "{tax_rate}");
        }
        assert!(pff(0.99, 0.8, 0.0).is_ok());
    }

    #[test]
    fn pff_table_follows_the_formula() {
        let years = [2021, 2022];
        let w = wacc(&years, 0.04, 0.257);
        let registry = DepreciationRegistry::builtin();
        let selector = DepreciationSelector::fixed(MACRS_6);
        let inputs = FinanceInputs {
            wacc: &w,
            scenarios: &[Scenario::Moderate],
            crp_years: 30,
            case: FinancialCase::Market,
            registry: &registry,
            selector: &selector,
        };
        let credits = TaxCredits::none(&years, &[Scenario::Moderate], &[ItcKey::Plain]);
        let result = FinanceFactorEngine::new().calculate(&inputs, &credits, &[ItcKey::Plain]).unwrap();

        let pvd = depreciation_present_value(registry.get(MACRS_6).unwrap().fractions(), 0.04, 0.025);
        let expected = (1.0 - 0.257 * pvd) / (1.0 - 0.257);
        assert_close(result.pff_for(ItcKey::Plain, Scenario::Moderate).unwrap()[0], expected, 1e-12);
        assert_close(result.crf_for(Scenario::Moderate).unwrap()[1], crf(0.04, 30.0), 1e-12);

        let fcr = result.fcr(ItcKey::Plain).unwrap();
        assert_eq!(fcr.rows(), &["FCR - Moderate".to_string()]);
        assert_close(fcr.value(0, 0), crf(0.04, 30.0) * expected, 1e-12);
    }

    #[test]
    fn schedule_switch_changes_pvd_from_switch_year() {
        let years = [2024, 2025];
        let w = wacc(&years, 0.04, 0.257);
        let registry = DepreciationRegistry::builtin();
        let selector = DepreciationSelector::switching(MACRS_21, FinancialCase::Market, 2025, MACRS_6);
        let inputs = FinanceInputs {
            wacc: &w,
            scenarios: &[Scenario::Moderate],
            crp_years: 30,
            case: FinancialCase::Market,
            registry: &registry,
            selector: &selector,
        };
        let pvd = FinanceFactorEngine::new().depreciation_present_values(&inputs).unwrap();
        // A shorter schedule is worth more in present value.
        assert!(pvd.value(0, 1) > pvd.value(0, 0));
    }
}
