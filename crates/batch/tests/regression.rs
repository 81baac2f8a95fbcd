//! Runs catalog technologies against a stored assumption dataset and checks
//! every computed CAPEX and LCOE table against the dataset's reference tables.
//!
//! `tests/fixtures/atb` holds one directory per sheet, laid out the way
//! `CsvAssumptionSource` reads them, with 2020-2024 year columns of which
//! 2021-2023 are used. It covers a standard technology (Utility PV), a grouped
//! CFF technology (Geothermal), a split-layout technology whose depreciation
//! switches in 2022 (Hydropower) and the PV-plus-battery hybrid with both of
//! its tax-credit cases.

use batch::{plan, BatchReport, BatchRunner};
use configuration::{BatchSettings, Validation};
use core_types::{FinancialCase, TaxCreditCase, TaxCreditRegime};
use datastore::CsvAssumptionSource;
use engine::{RunSettings, Runner};
use finance::DepreciationRegistry;
use std::path::PathBuf;
use technologies::{builtin_profiles, Metric, TechRegistry};
use validator::{ConsistencyValidator, ValidationError};

const SWITCH_YEAR: i32 = 2022;

const TECHNOLOGIES: [&str; 4] = ["UtilityPV", "Geothermal", "Hydropower", "Utility-Scale PV-Plus-Battery"];

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/atb")
}

fn settings() -> RunSettings {
    RunSettings {
        base_year: 2021,
        end_year: 2023,
        excluded_leading_years: 1,
        grid_roundtrip_efficiency: 0.85,
    }
}

fn registry(switch_year: i32) -> TechRegistry {
    let profiles = builtin_profiles(switch_year)
        .into_iter()
        .filter(|p| TECHNOLOGIES.contains(&p.name.as_str()))
        .collect();
    TechRegistry::new(profiles, DepreciationRegistry::builtin()).unwrap()
}

fn run_all(registry: &TechRegistry) -> BatchReport {
    let source = CsvAssumptionSource::new(fixture_dir());
    let runner = Runner::new(registry, &source, settings());
    let runs = plan(registry, None).unwrap();
    BatchRunner::new(&BatchSettings { threads: 2, abort_on_configuration_error: false })
        .with_validator(ConsistencyValidator::from_settings(&Validation::default()))
        .run(&runner, &runs)
        .unwrap()
}

#[test]
fn stored_capex_and_lcoe_are_reproduced_for_every_run() {
    let report = run_all(&registry(SWITCH_YEAR));

    // PV, Geothermal: 2 CRPs x 2 cases; Hydropower: 3 x 2; hybrid: 2 x (2 + 1)
    assert_eq!(report.planned, 20);
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert!(report.mismatches.is_empty(), "{:?}", report.mismatches);
    assert!(report.is_clean());
    assert_eq!(report.outputs.len(), 20);
    assert!(report.outputs.iter().all(|o| o.lcoe.is_some()));
    assert!(report.started_at <= chrono::Utc::now());
    assert!(report.elapsed >= chrono::TimeDelta::zero());
}

#[test]
fn credit_regimes_follow_the_stored_tax_credits() {
    let report = run_all(&registry(SWITCH_YEAR));

    for output in &report.outputs {
        let expected = match (output.technology.as_str(), output.case, output.tax_credit_case) {
            (_, FinancialCase::RAndD, _) => TaxCreditRegime::None,
            ("UtilityPV", _, _) => TaxCreditRegime::Ptc,
            ("Geothermal", _, _) => TaxCreditRegime::Itc,
            // 2021 is excluded; the PTC still runs in 2022.
            ("Hydropower", _, _) => TaxCreditRegime::Ptc,
            (_, _, Some(TaxCreditCase::ItcOnly)) => TaxCreditRegime::ItcOnly,
            (_, _, Some(TaxCreditCase::PvPtcBatteryItc)) => TaxCreditRegime::PvPtcBatteryItc,
            other => panic!("unexpected run {other:?}"),
        };
        assert_eq!(output.regime, expected, "{} {} {:?}", output.technology, output.case, output.tax_credit_case);
    }
}

#[test]
fn grouped_cff_and_split_layout_are_read_from_the_dataset() {
    let report = run_all(&registry(SWITCH_YEAR));

    let geothermal = report.outputs.iter().find(|o| o.technology == "Geothermal").unwrap();
    let cff = geothermal.inputs.metric(Metric::ConstructionFinanceFactor).unwrap();
    assert_eq!(cff.get("Geothermal - Class 2/Moderate", 2021), Some(1.056));
    assert_eq!(cff.get("Geothermal - Class 3/Moderate", 2021), Some(1.126));

    let hydro = report.outputs.iter().find(|o| o.technology == "Hydropower").unwrap();
    let occ = hydro.inputs.metric(Metric::OvernightCapitalCost).unwrap();
    assert_eq!(occ.n_rows(), 36);
    assert!(occ.rows().iter().all(|label| !label.is_empty()));
    assert_eq!(occ.years(), &[2021, 2022, 2023]);
}

#[test]
fn a_different_depreciation_switch_year_breaks_the_hydropower_references() {
    let report = run_all(&registry(2030));

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.outputs.len(), 20);
    assert_eq!(report.mismatches.len(), 3, "{:?}", report.mismatches);
    for mismatch in &report.mismatches {
        assert!(
            matches!(
                mismatch,
                ValidationError::ConsistencyMismatch { technology, case, metric, year, .. }
                    if technology == "Hydropower" && case == "Market" && metric == "LCOE" && *year == SWITCH_YEAR
            ),
            "{mismatch}"
        );
    }
}
