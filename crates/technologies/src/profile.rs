use crate::error::TechnologyError;
use crate::formula::FormulaStrategy;
use crate::metric::{Metric, OutputField};
use core_types::{ItcKey, Scenario, TaxCreditCase};
use finance::{ClassificationRule, DepreciationRegistry, DepreciationSelector, MACRS_6};
use serde::Serialize;

/// Which tables a technology has in the assumption source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub has_capex: bool,
    pub has_lcoe: bool,
    pub has_wacc: bool,
    pub has_tax_credit: bool,
    pub has_fin_assump: bool,
}

/// How construction finance factor rows map onto tech details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CffLayout {
    /// One row per scenario, shared by every tech detail.
    PerScenario,
    /// One block of scenario rows per group; `groups[d]` is the group of tech detail `d`.
    Grouped(Vec<usize>),
}

impl CffLayout {
    pub fn group_count(&self) -> usize {
        match self {
            CffLayout::PerScenario => 1,
            CffLayout::Grouped(groups) => groups.iter().max().map_or(0, |g| g + 1),
        }
    }

    pub fn group_of(&self, detail: usize) -> usize {
        match self {
            CffLayout::PerScenario => 0,
            CffLayout::Grouped(groups) => groups.get(detail).copied().unwrap_or(0),
        }
    }
}

/// Immutable description of a technology.
#[derive(Debug, Clone, Serialize)]
pub struct TechnologyProfile {
    pub name: String,
    pub sheet_name: String,
    /// WACC block to read; the sheet name when `None`.
    pub wacc_name: Option<String>,
    pub tech_life: u32,
    pub num_tech_details: usize,
    pub scenarios: Vec<Scenario>,
    /// First data year, when it differs from the configured base year.
    pub base_year: Option<i32>,
    /// Representative detail group for the debt-fraction workflow.
    pub default_tech_detail: Option<String>,
    pub dscr: Option<f64>,
    pub depreciation: DepreciationSelector,
    pub capabilities: Capabilities,
    /// Blank separator rows between scenarios in the metric tables.
    pub split_layout: bool,
    pub cff_layout: CffLayout,
    pub metrics: Vec<Metric>,
    pub outputs: Vec<OutputField>,
    /// Tax-credit cases the Market case is run for.
    pub tax_credit_cases: Vec<TaxCreditCase>,
    pub strategy: FormulaStrategy,
}

impl TechnologyProfile {
    /// A profile with the defaults of `strategy`: the usual metric and output
    /// lists, MACRS 6-year depreciation, a 30 year life and all three scenarios.
    pub fn new(name: &str, sheet_name: &str, num_tech_details: usize, strategy: FormulaStrategy) -> Self {
        let (metrics, outputs): (Vec<Metric>, Vec<OutputField>) = match strategy {
            FormulaStrategy::Standard => (Metric::STANDARD.to_vec(), OutputField::STANDARD.to_vec()),
            FormulaStrategy::FuelAugmented => {
                let mut metrics = vec![Metric::HeatRate];
                metrics.extend(Metric::STANDARD);
                metrics.push(Metric::FuelCost);
                let mut outputs = OutputField::STANDARD.to_vec();
                outputs.push(OutputField::Fuel);
                (metrics, outputs)
            }
            FormulaStrategy::HybridStorage => {
                let mut metrics = Metric::STANDARD.to_vec();
                metrics.extend([Metric::PvSystemCost, Metric::BatteryCost, Metric::PvOnlyCapacityFactor]);
                (metrics, OutputField::STANDARD.to_vec())
            }
            FormulaStrategy::CapexOnly => (
                vec![
                    Metric::OvernightCapitalCost,
                    Metric::GridConnectionCost,
                    Metric::FixedOm,
                    Metric::VariableOm,
                    Metric::ConstructionFinanceFactor,
                ],
                vec![
                    OutputField::OvernightCapitalCost,
                    OutputField::GridConnectionCost,
                    OutputField::FixedOm,
                    OutputField::VariableOm,
                    OutputField::ConstructionFinanceCost,
                    OutputField::Capex,
                ],
            ),
            FormulaStrategy::None => (
                vec![Metric::FixedOm, Metric::VariableOm],
                vec![OutputField::FixedOm, OutputField::VariableOm],
            ),
        };

        let runs_numbers = !matches!(strategy, FormulaStrategy::None);
        Self {
            name: name.to_string(),
            sheet_name: sheet_name.to_string(),
            wacc_name: None,
            tech_life: 30,
            num_tech_details,
            scenarios: Scenario::ALL.to_vec(),
            base_year: None,
            default_tech_detail: None,
            dscr: None,
            depreciation: DepreciationSelector::fixed(MACRS_6),
            capabilities: Capabilities {
                has_capex: strategy.computes_capex(),
                has_lcoe: strategy.computes_lcoe(),
                has_wacc: runs_numbers,
                has_tax_credit: runs_numbers,
                has_fin_assump: runs_numbers,
            },
            split_layout: false,
            cff_layout: CffLayout::PerScenario,
            metrics,
            outputs,
            tax_credit_cases: Vec::new(),
            strategy,
        }
    }

    pub fn life(mut self, years: u32) -> Self {
        self.tech_life = years;
        self
    }

    pub fn wacc_from(mut self, wacc_name: &str) -> Self {
        self.wacc_name = Some(wacc_name.to_string());
        self
    }

    /// Sets the representative detail group and DSCR used for debt fractions.
    pub fn representative(mut self, tech_detail: &str, dscr: f64) -> Self {
        self.default_tech_detail = Some(tech_detail.to_string());
        self.dscr = Some(dscr);
        self
    }

    pub fn depreciation(mut self, selector: DepreciationSelector) -> Self {
        self.depreciation = selector;
        self
    }

    pub fn split(mut self) -> Self {
        self.split_layout = true;
        self
    }

    pub fn grouped_cff(mut self, groups: Vec<usize>) -> Self {
        self.cff_layout = CffLayout::Grouped(groups);
        self
    }

    pub fn scenarios(mut self, scenarios: &[Scenario]) -> Self {
        self.scenarios = scenarios.to_vec();
        self
    }

    pub fn without_tax_credits(mut self) -> Self {
        self.capabilities.has_tax_credit = false;
        self
    }

    pub fn tax_credit_cases(mut self, cases: &[TaxCreditCase]) -> Self {
        self.tax_credit_cases = cases.to_vec();
        self
    }

    /// Puts `metric` in front of the metric list and `output` in front of the outputs.
    pub fn with_leading(mut self, metric: Metric, output: OutputField) -> Self {
        self.metrics.insert(0, metric);
        self.outputs.insert(0, output);
        self
    }

    pub fn wacc_name(&self) -> &str {
        self.wacc_name.as_deref().unwrap_or(&self.sheet_name)
    }

    pub fn base_year_or(&self, configured: i32) -> i32 {
        self.base_year.unwrap_or(configured)
    }

    pub fn itc_keys(&self) -> &'static [ItcKey] {
        self.strategy.itc_keys()
    }

    pub fn classification_rule(&self) -> ClassificationRule {
        self.strategy.classification_rule()
    }

    /// Rows of a metric table: details times scenarios.
    pub fn expected_rows(&self) -> usize {
        self.num_tech_details * self.scenarios.len()
    }

    /// Rows of the read window, which for split layouts includes one blank
    /// separator row per scenario.
    pub fn read_window_rows(&self) -> usize {
        if self.split_layout {
            self.expected_rows() + self.scenarios.len()
        } else {
            self.expected_rows()
        }
    }

    pub fn has_metric(&self, metric: Metric) -> bool {
        self.metrics.contains(&metric)
    }

    fn required_metrics(&self) -> Vec<Metric> {
        let mut required = Vec::new();
        if self.capabilities.has_capex {
            required.extend([
                Metric::OvernightCapitalCost,
                Metric::GridConnectionCost,
                Metric::ConstructionFinanceFactor,
            ]);
        }
        if self.capabilities.has_lcoe {
            required.extend(Metric::STANDARD);
        }
        match self.strategy {
            FormulaStrategy::FuelAugmented => required.extend([Metric::HeatRate, Metric::FuelCost]),
            FormulaStrategy::HybridStorage => required.extend([
                Metric::PvSystemCost,
                Metric::BatteryCost,
                Metric::PvOnlyCapacityFactor,
            ]),
            _ => {}
        }
        required
    }

    /// Checks that the profile is internally consistent and that its
    /// depreciation rules refer to registered schedules.
    pub fn validate(&self, registry: &DepreciationRegistry) -> Result<(), TechnologyError> {
        let err = |detail: String| TechnologyError::configuration(&self.name, detail);

        if self.num_tech_details == 0 || self.scenarios.is_empty() {
            return Err(err("at least one tech detail and one scenario are required".to_string()));
        }
        if self.capabilities.has_lcoe != self.strategy.computes_lcoe()
            || self.capabilities.has_capex != self.strategy.computes_capex()
        {
            return Err(err(format!("capability flags disagree with the {} formula", self.strategy)));
        }
        if self.capabilities.has_lcoe {
            if self.default_tech_detail.is_none() {
                return Err(err("has_lcoe requires a default tech detail".to_string()));
            }
            match self.dscr {
                Some(d) if d.is_finite() && d > 0.0 => {}
                Some(d) => return Err(err(format!("DSCR must be positive, got {d}"))),
                None => return Err(err("has_lcoe requires a DSCR".to_string())),
            }
            if !self.capabilities.has_wacc {
                return Err(err("has_lcoe requires WACC data".to_string()));
            }
        }
        if self.strategy == FormulaStrategy::HybridStorage && !self.capabilities.has_fin_assump {
            return Err(err("the hybrid formula reads financial assumptions".to_string()));
        }
        for metric in self.required_metrics() {
            if !self.has_metric(metric) {
                return Err(err(format!("metric '{metric}' is required by the {} formula", self.strategy)));
            }
        }
        for output in &self.outputs {
            let available = match output {
                OutputField::Lcoe => self.capabilities.has_lcoe,
                OutputField::Capex | OutputField::ConstructionFinanceCost => self.capabilities.has_capex,
                OutputField::Fuel => self.strategy == FormulaStrategy::FuelAugmented,
                other => other.source_metric().is_some_and(|m| self.has_metric(m)),
            };
            if !available {
                return Err(err(format!("output '{output}' has no source")));
            }
        }
        if let CffLayout::Grouped(groups) = &self.cff_layout {
            if groups.len() != self.num_tech_details {
                return Err(err(format!(
                    "{} CFF groups given for {} tech details",
                    groups.len(),
                    self.num_tech_details
                )));
            }
        }
        if !self.tax_credit_cases.is_empty() && self.strategy != FormulaStrategy::HybridStorage {
            return Err(err("only the hybrid formula distinguishes tax-credit cases".to_string()));
        }
        self.depreciation.check(registry)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcoe_without_representative_detail_is_rejected() {
        let registry = DepreciationRegistry::builtin();
        let profile = TechnologyProfile::new("Wind", "Wind", 2, FormulaStrategy::Standard);
        let err = profile.validate(&registry).unwrap_err();
        assert!(matches!(err, TechnologyError::Configuration { .. }));

        let profile = profile.representative("Wind - Class 1", 1.45);
        assert!(profile.validate(&registry).is_ok());
    }

    #[test]
    fn missing_dscr_is_rejected() {
        let registry = DepreciationRegistry::builtin();
        let mut profile = TechnologyProfile::new("PV", "PV", 1, FormulaStrategy::Standard)
            .representative("PV - Class 1", 1.3);
        profile.dscr = None;
        assert!(profile.validate(&registry).is_err());
    }

    #[test]
    fn capex_only_needs_no_representative() {
        let registry = DepreciationRegistry::builtin();
        let profile = TechnologyProfile::new("PSH", "PSH", 3, FormulaStrategy::CapexOnly);
        assert!(profile.validate(&registry).is_ok());
        assert!(!profile.outputs.contains(&OutputField::Lcoe));
    }

    #[test]
    fn split_layout_reads_one_extra_row_per_scenario() {
        let profile = TechnologyProfile::new("Hydro", "Hydro", 12, FormulaStrategy::CapexOnly).split();
        assert_eq!(profile.expected_rows(), 36);
        assert_eq!(profile.read_window_rows(), 39);
    }

    #[test]
    fn grouped_cff_maps_details_to_groups() {
        let layout = CffLayout::Grouped(vec![0, 0, 1, 1, 1, 1]);
        assert_eq!(layout.group_count(), 2);
        assert_eq!(layout.group_of(1), 0);
        assert_eq!(layout.group_of(4), 1);
    }
}
