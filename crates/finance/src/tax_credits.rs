use crate::error::FinanceError;
use core_types::{split_label, CoreError, ItcKey, MetricTable, Scenario, TaxCreditRegime};
use std::collections::BTreeMap;
use tracing::debug;

/// Prefix of the per-scenario PTC rows of a tax-credit table.
pub const PTC_PREFIX: &str = "PTC/";

const METRIC: &str = "tax credits";

/// Per-year ITC fractions by credit key and PTC values ($/MWh) by scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxCredits {
    years: Vec<i32>,
    itc: BTreeMap<ItcKey, Vec<f64>>,
    ptc: BTreeMap<Scenario, Vec<f64>>,
}

impl TaxCredits {
    /// All-zero credits for a technology without a tax-credit table.
    pub fn none(years: &[i32], scenarios: &[Scenario], keys: &[ItcKey]) -> Self {
        let zeros = vec![0.0; years.len()];
        Self {
            years: years.to_vec(),
            itc: keys.iter().map(|k| (*k, zeros.clone())).collect(),
            ptc: scenarios.iter().map(|s| (*s, zeros.clone())).collect(),
        }
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// The ITC schedule for a credit key.
    pub fn itc(&self, key: ItcKey) -> Result<&[f64], FinanceError> {
        self.itc
            .get(&key)
            .map(Vec::as_slice)
            .ok_or_else(|| CoreError::shape(METRIC, format!("'{}' was not loaded", key.row_label())).into())
    }

    pub fn ptc(&self, scenario: Scenario) -> Result<&[f64], FinanceError> {
        self.ptc
            .get(&scenario)
            .map(Vec::as_slice)
            .ok_or_else(|| CoreError::shape(METRIC, format!("no PTC row for {scenario}")).into())
    }

    /// Expands the per-scenario PTC onto the rows of `like`, matching each
    /// `detail/scenario` row label to its scenario.
    pub fn ptc_for_rows(&self, like: &MetricTable) -> Result<MetricTable, FinanceError> {
        if like.years() != self.years.as_slice() {
            return Err(CoreError::shape(METRIC, "PTC years do not match the metric years").into());
        }
        let mut values = Vec::with_capacity(like.n_rows() * like.n_years());
        for label in like.rows() {
            let (_, scenario) = split_label(label);
            let scenario: Scenario = scenario.parse()?;
            values.extend_from_slice(self.ptc(scenario)?);
        }
        Ok(MetricTable::new(like.rows().to_vec(), self.years.clone(), values)?)
    }

    /// Sums every PTC and ITC row, leaving out the first `skip` years.
    fn sums(&self, keys: &[ItcKey], skip: usize) -> (f64, f64) {
        let sum = |v: &Vec<f64>| v.iter().skip(skip).sum::<f64>();
        let ptc = self.ptc.values().map(sum).sum();
        let itc = keys.iter().filter_map(|k| self.itc.get(k)).map(sum).sum();
        (ptc, itc)
    }
}

/// How the active credit regime is named for a technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationRule {
    /// "PTC + ITC", "PTC", "ITC" or "None" from the plain ITC schedule.
    Standard,
    /// "PV PTC and Battery ITC", "ITC only" or "None"; the battery track is
    /// always ITC-eligible so only the PV side decides between PTC and ITC.
    Hybrid,
}

/// Builds ITC/PTC arrays from a tax-credit table and classifies the regime.
#[derive(Debug, Clone)]
pub struct TaxCreditResolver {
    excluded_leading_years: usize,
}

impl TaxCreditResolver {
    /// `excluded_leading_years` year columns at the start of the range are left
    /// out of the classification sums.
    pub fn new(excluded_leading_years: usize) -> Self {
        Self { excluded_leading_years }
    }

    /// Reads the ITC rows for `keys` and one PTC row per scenario out of `table`.
    /// A missing table yields all-zero credits.
    pub fn resolve(
        &self,
        table: Option<&MetricTable>,
        years: &[i32],
        scenarios: &[Scenario],
        keys: &[ItcKey],
    ) -> Result<TaxCredits, FinanceError> {
        let Some(table) = table else {
            return Ok(TaxCredits::none(years, scenarios, keys));
        };
        if table.years() != years {
            return Err(CoreError::shape(
                METRIC,
                format!("tax-credit years {:?}.. do not match {:?}..", table.years().first(), years.first()),
            )
            .into());
        }

        let mut itc = BTreeMap::new();
        for key in keys {
            let label = key.row_label();
            let row = table.row(&label).ok_or_else(|| {
                CoreError::shape(METRIC, format!("ITC schedule '{label}' not found"))
            })?;
            itc.insert(*key, row.to_vec());
        }

        let mut ptc = BTreeMap::new();
        for (label, row) in table.iter_rows().filter(|(l, _)| l.starts_with(PTC_PREFIX)) {
            let scenario: Scenario = label[PTC_PREFIX.len()..].parse()?;
            if scenarios.contains(&scenario) {
                ptc.insert(scenario, row.to_vec());
            }
        }
        if ptc.len() != scenarios.len() {
            return Err(CoreError::shape(
                METRIC,
                format!("expected PTC rows for {} scenarios, found {}", scenarios.len(), ptc.len()),
            )
            .into());
        }

        debug!(itc_keys = keys.len(), ptc_rows = ptc.len(), "Resolved tax credits");
        Ok(TaxCredits { years: years.to_vec(), itc, ptc })
    }

    pub fn classify(&self, credits: &TaxCredits, rule: ClassificationRule) -> TaxCreditRegime {
        let skip = self.excluded_leading_years;
        match rule {
            ClassificationRule::Standard => {
                let (ptc, itc) = credits.sums(&[ItcKey::Plain], skip);
                match (ptc > 0.0, itc > 0.0) {
                    (true, true) => TaxCreditRegime::PtcAndItc,
                    (true, false) => TaxCreditRegime::Ptc,
                    (false, true) => TaxCreditRegime::Itc,
                    (false, false) => TaxCreditRegime::None,
                }
            }
            ClassificationRule::Hybrid => {
                let (ptc, itc) = credits.sums(&[ItcKey::Pv, ItcKey::Battery], skip);
                if ptc > 0.0 {
                    TaxCreditRegime::PvPtcBatteryItc
                } else if itc > 0.0 {
                    TaxCreditRegime::ItcOnly
                } else {
                    TaxCreditRegime::None
                }
            }
        }
    }
}
