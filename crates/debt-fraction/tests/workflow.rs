use configuration::DebtFractionSettings;
use core_types::assumptions::{
    EQUITY_RETURN_NOMINAL, EQUITY_RETURN_REAL, INFLATION_RATE, INTEREST_RATE_NOMINAL, TAX_RATE,
};
use core_types::source::CFF_HEADER;
use core_types::{CrpChoice, FinancialAssumptions, FinancialCase, MetricTable, Scenario};
use datastore::MemorySource;
use debt_fraction::{DebtFractionCalculator, DebtFractionError, DebtFractionInputs};
use engine::{RunContext, RunSettings, Runner};
use finance::DepreciationRegistry;
use std::sync::Mutex;
use technologies::{FormulaStrategy, Metric, TechRegistry, TechnologyProfile};

const YEARS: [i32; 2] = [2021, 2022];

fn profile(strategy: FormulaStrategy) -> TechnologyProfile {
    TechnologyProfile::new("Nuclear", "Nuclear", 1, strategy).representative("Class1", 1.45)
}

fn value_of(metric: Metric) -> f64 {
    match metric {
        Metric::NetCapacityFactor => 0.93,
        Metric::OvernightCapitalCost => 6000.0,
        Metric::GridConnectionCost => 100.0,
        Metric::FixedOm => 150.0,
        Metric::VariableOm => 2.5,
        Metric::ConstructionFinanceFactor => 1.2,
        Metric::HeatRate => 10.45,
        Metric::FuelCost => 0.7,
        _ => 1.0,
    }
}

fn source(profile: &TechnologyProfile, itc: f64) -> MemorySource {
    let years = YEARS.to_vec();
    let labels: Vec<String> = profile.scenarios.iter().map(|s| format!("Class1/{s}")).collect();
    let mut source = MemorySource::new();
    for metric in &profile.metrics {
        let value = value_of(*metric);
        let (header, table) = if *metric == Metric::ConstructionFinanceFactor {
            let cff_labels = profile.scenarios.iter().map(|s| format!("CFF/{s}")).collect();
            (CFF_HEADER, MetricTable::filled(cff_labels, years.clone(), value).unwrap())
        } else {
            (metric.header(), MetricTable::filled(labels.clone(), years.clone(), value).unwrap())
        };
        source = source.with_metric(&profile.sheet_name, header, table);
    }

    let mut credits = vec![(profile.itc_keys()[0].row_label(), vec![itc; 2])];
    credits.extend(profile.scenarios.iter().map(|s| (format!("PTC/{s}"), vec![0.0; 2])));

    let mut wacc = vec![
        (INFLATION_RATE.to_string(), 0.025),
        (TAX_RATE.to_string(), 0.257),
        (INTEREST_RATE_NOMINAL.to_string(), 0.08),
        (EQUITY_RETURN_NOMINAL.to_string(), 0.11),
        (EQUITY_RETURN_REAL.to_string(), 0.083),
    ];
    wacc.extend(Scenario::ALL.iter().map(|s| (format!("WACC Nominal - {s}"), 0.07)));
    wacc.extend(Scenario::ALL.iter().map(|s| (format!("WACC Real - {s}"), 0.045)));
    let wacc = wacc.into_iter().map(|(label, v)| (label, vec![v; 2])).collect();

    source
        .with_tax_credits(&profile.sheet_name, MetricTable::from_rows(years.clone(), credits).unwrap())
        .with_financial_assumptions(&profile.sheet_name, FinancialAssumptions::default())
        .with_wacc(profile.wacc_name(), MetricTable::from_rows(years, wacc).unwrap())
}

fn registry(profile: TechnologyProfile) -> TechRegistry {
    TechRegistry::new(vec![profile], DepreciationRegistry::builtin()).unwrap()
}

fn settings() -> RunSettings {
    RunSettings {
        base_year: 2021,
        end_year: 2022,
        excluded_leading_years: 1,
        grid_roundtrip_efficiency: 0.85,
    }
}

#[test]
fn record_is_cut_from_the_run() {
    let profile = profile(FormulaStrategy::FuelAugmented);
    let source = source(&profile, 0.3);
    let registry = registry(profile);
    let runner = Runner::new(&registry, &source, settings());
    let profile = registry.get("Nuclear").unwrap();

    let market = runner
        .run(&RunContext::new(profile, FinancialCase::Market, CrpChoice::Years20, None))
        .unwrap();
    let record = DebtFractionInputs::from_run(&market, profile, Scenario::Moderate, 2022).unwrap();

    assert_eq!(record.capacity_factor, 0.93);
    assert_eq!(record.occ, 6000.0);
    assert!((record.cfc - 0.2 * 6100.0).abs() < 1e-9);
    assert_eq!(record.fixed_om, 150.0);
    assert_eq!(record.dscr, 1.45);
    assert_eq!(record.equity_return_nominal, 0.11);
    assert_eq!(record.equity_return_real, 0.083);
    assert_eq!(record.interest_rate_nominal, 0.08);
    assert_eq!(record.itc, 0.3);
    assert_eq!(record.macrs, "MACRS-6");
    assert_eq!(record.heat_rate, Some(10.45));
    assert!((record.fuel.unwrap() - 10.45 * 0.7).abs() < 1e-9);

    let rnd = runner
        .run(&RunContext::new(profile, FinancialCase::RAndD, CrpChoice::Years20, None))
        .unwrap();
    let record = DebtFractionInputs::from_run(&rnd, profile, Scenario::Moderate, 2022).unwrap();
    assert_eq!(record.itc, 0.0);
    assert_eq!(record.ptc, 0.0);

    let err = DebtFractionInputs::from_run(&rnd, profile, Scenario::Moderate, 2030).unwrap_err();
    assert!(matches!(err, DebtFractionError::MissingInput { year: 2030, .. }));
}

#[test]
fn calculator_asks_the_solver_for_every_year_and_case() {
    let profile = profile(FormulaStrategy::Standard);
    let source = source(&profile, 0.0);
    let registry = registry(profile);
    let runner = Runner::new(&registry, &source, settings());

    let seen = Mutex::new(Vec::new());
    let solver = |inputs: &DebtFractionInputs| -> Result<f64, DebtFractionError> {
        seen.lock().unwrap().push(inputs.clone());
        Ok(60.0)
    };
    let calculator = DebtFractionCalculator::new(&solver, &DebtFractionSettings::default()).unwrap();

    let rows = calculator.calculate_all(&runner, None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].case, FinancialCase::Market);
    assert_eq!(rows[1].case, FinancialCase::RAndD);
    for row in &rows {
        assert_eq!(row.years, YEARS.to_vec());
        assert!(row.fractions.iter().all(|f| (f - 0.6).abs() < 1e-12));
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(|r| r.fuel.is_none()));

    assert!(calculator.calculate_all(&runner, Some("Wind")).unwrap().is_empty());
}

#[test]
fn out_of_range_answers_fail_the_technology() {
    let profile = profile(FormulaStrategy::Standard);
    let source = source(&profile, 0.0);
    let registry = registry(profile);
    let runner = Runner::new(&registry, &source, settings());

    let solver = |_: &DebtFractionInputs| -> Result<f64, DebtFractionError> { Ok(140.0) };
    let calculator = DebtFractionCalculator::new(&solver, &DebtFractionSettings::default()).unwrap();
    let profile = registry.get("Nuclear").unwrap();
    let err = calculator.calculate(&runner, profile, FinancialCase::Market).unwrap_err();
    assert!(matches!(err, DebtFractionError::OutOfRange(v) if v == 140.0));
}
