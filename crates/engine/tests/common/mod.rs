#![allow(dead_code)]

use core_types::assumptions::{
    BATTERY_PV_CHARGE_FRACTION, BATTERY_PV_RATIO, CO_LOCATION_SAVINGS, GRID_CHARGE_COST,
    INFLATION_RATE, INTEREST_RATE_NOMINAL, TAX_RATE,
};
use core_types::source::CFF_HEADER;
use core_types::{FinancialAssumptions, ItcKey, MetricTable, Scenario};
use datastore::MemorySource;
use engine::RunSettings;
use finance::DepreciationRegistry;
use technologies::{Metric, TechRegistry, TechnologyProfile};

pub const BASE_YEAR: i32 = 2021;
pub const END_YEAR: i32 = 2023;

pub fn years() -> Vec<i32> {
    MetricTable::year_range(BASE_YEAR, END_YEAR)
}

pub fn settings() -> RunSettings {
    RunSettings {
        base_year: BASE_YEAR,
        end_year: END_YEAR,
        excluded_leading_years: 1,
        grid_roundtrip_efficiency: 0.85,
    }
}

/// Routes engine logs through the test harness. `RUST_LOG=debug` shows the
/// per-step numbers.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn registry(profile: TechnologyProfile) -> TechRegistry {
    TechRegistry::new(vec![profile], DepreciationRegistry::builtin()).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
        "{actual} != {expected}"
    );
}

/// Constant assumption values, one per table.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub ncf: f64,
    pub occ: f64,
    pub gcc: f64,
    pub fom: f64,
    pub vom: f64,
    /// CFF per group; the last value serves any further group.
    pub cff: Vec<f64>,
    pub heat_rate: f64,
    pub fuel_cost: f64,
    pub pv_cost: f64,
    pub battery_cost: f64,
    pub pv_cf: f64,
    pub itc: f64,
    pub battery_itc: f64,
    pub ptc: f64,
    pub tax_rate: f64,
    pub inflation: f64,
    pub wacc_real: f64,
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            ncf: 0.3,
            occ: 1000.0,
            gcc: 50.0,
            fom: 20.0,
            vom: 2.0,
            cff: vec![1.05],
            heat_rate: 10.45,
            fuel_cost: 2.0,
            pv_cost: 900.0,
            battery_cost: 400.0,
            pv_cf: 0.25,
            itc: 0.0,
            battery_itc: 0.0,
            ptc: 0.0,
            tax_rate: 0.257,
            inflation: 0.025,
            wacc_real: 0.05,
        }
    }
}

impl Inputs {
    fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::NetCapacityFactor => self.ncf,
            Metric::OvernightCapitalCost => self.occ,
            Metric::GridConnectionCost => self.gcc,
            Metric::FixedOm => self.fom,
            Metric::VariableOm => self.vom,
            Metric::ConstructionFinanceFactor => self.cff[0],
            Metric::HeatRate => self.heat_rate,
            Metric::FuelCost => self.fuel_cost,
            Metric::PvSystemCost => self.pv_cost,
            Metric::BatteryCost => self.battery_cost,
            Metric::PvOnlyCapacityFactor => self.pv_cf,
        }
    }

    fn cff_for_group(&self, group: usize) -> f64 {
        self.cff.get(group).or(self.cff.last()).copied().unwrap_or(1.0)
    }
}

/// `Class<d>/<scenario>` for every detail and scenario, detail-major.
pub fn row_labels(profile: &TechnologyProfile) -> Vec<String> {
    (1..=profile.num_tech_details)
        .flat_map(|d| profile.scenarios.iter().map(move |s| format!("Class{d}/{s}")))
        .collect()
}

/// A metric table with a blank separator row after each tech-detail block,
/// padded to one blank row per scenario.
fn with_separators(profile: &TechnologyProfile, value: f64) -> MetricTable {
    let n_scen = profile.scenarios.len();
    let blank = || (String::new(), vec![f64::NAN; years().len()]);
    let mut rows = Vec::new();
    let mut blanks = 0;
    for (i, label) in row_labels(profile).into_iter().enumerate() {
        rows.push((label, vec![value; years().len()]));
        if (i + 1) % n_scen == 0 && blanks < n_scen {
            rows.push(blank());
            blanks += 1;
        }
    }
    while blanks < n_scen {
        rows.push(blank());
        blanks += 1;
    }
    MetricTable::from_rows(years(), rows).unwrap()
}

pub fn wacc_table(inputs: &Inputs) -> MetricTable {
    let mut rows = vec![
        (INFLATION_RATE.to_string(), inputs.inflation),
        (TAX_RATE.to_string(), inputs.tax_rate),
        (INTEREST_RATE_NOMINAL.to_string(), 0.07),
        ("Interest During Construction - Nominal".to_string(), 0.08),
    ];
    for s in Scenario::ALL {
        rows.push((format!("WACC Nominal - {s}"), inputs.wacc_real + 0.025));
    }
    for s in Scenario::ALL {
        rows.push((format!("WACC Real - {s}"), inputs.wacc_real));
    }
    MetricTable::from_rows(
        years(),
        rows.into_iter().map(|(l, v)| (l, vec![v; years().len()])).collect(),
    )
    .unwrap()
}

pub fn tax_credit_table(profile: &TechnologyProfile, inputs: &Inputs) -> MetricTable {
    let n = years().len();
    let mut rows: Vec<(String, Vec<f64>)> = profile
        .itc_keys()
        .iter()
        .map(|key| {
            let value = if *key == ItcKey::Battery { inputs.battery_itc } else { inputs.itc };
            (key.row_label(), vec![value; n])
        })
        .collect();
    for s in &profile.scenarios {
        rows.push((format!("PTC/{s}"), vec![inputs.ptc; n]));
    }
    MetricTable::from_rows(years(), rows).unwrap()
}

/// A source holding every table `profile` reads, filled with `inputs`.
pub fn source_for(profile: &TechnologyProfile, inputs: &Inputs) -> MemorySource {
    let labels = row_labels(profile);
    let sheet = profile.sheet_name.as_str();
    let mut source = MemorySource::new();

    for metric in profile.metrics.iter().filter(|m| **m != Metric::ConstructionFinanceFactor) {
        let value = inputs.metric(*metric);
        let table = if profile.split_layout {
            with_separators(profile, value)
        } else {
            MetricTable::filled(labels.clone(), years(), value).unwrap()
        };
        source = source.with_metric(sheet, metric.header(), table);
    }

    if profile.has_metric(Metric::ConstructionFinanceFactor) {
        let rows = (0..profile.cff_layout.group_count())
            .flat_map(|g| {
                profile
                    .scenarios
                    .iter()
                    .map(move |s| (format!("CFF {g}/{s}"), g))
                    .collect::<Vec<_>>()
            })
            .map(|(label, g)| (label, vec![inputs.cff_for_group(g); years().len()]))
            .collect();
        source = source.with_metric(sheet, CFF_HEADER, MetricTable::from_rows(years(), rows).unwrap());
    }

    if profile.capabilities.has_tax_credit {
        source = source.with_tax_credits(sheet, tax_credit_table(profile, inputs));
    }

    let mut financial = FinancialAssumptions::default();
    financial.insert(BATTERY_PV_CHARGE_FRACTION, 0.9);
    financial.insert(GRID_CHARGE_COST, 30.0);
    financial.insert(CO_LOCATION_SAVINGS, 0.95);
    financial.insert(BATTERY_PV_RATIO, 0.5);

    source
        .with_financial_assumptions(sheet, financial)
        .with_wacc(profile.wacc_name(), wacc_table(inputs))
}
