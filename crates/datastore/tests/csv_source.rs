use core_types::{AssumptionSource, CrpChoice, FinancialCase, Scenario, SheetRequest};
use datastore::{CsvAssumptionSource, SourceError};
use std::fs;
use std::path::{Path, PathBuf};

struct Scratch(PathBuf);

impl Scratch {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("atb-datastore-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.0.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

const SCENARIOS: [Scenario; 3] = Scenario::ALL;

fn request(case: FinancialCase) -> SheetRequest<'static> {
    SheetRequest {
        sheet_name: "Solar - Utility PV",
        case,
        crp: CrpChoice::Years20,
        tax_credit_case: None,
        scenarios: &SCENARIOS,
        base_year: 2021,
        end_year: 2022,
    }
}

#[test]
fn metric_table_is_bounded_to_years_and_window() {
    let scratch = Scratch::new();
    scratch.write(
        "solar_utility_pv/net_capacity_factor.csv",
        "label,2020,2021,2022\n\
         Class1/Advanced,0.1,0.2,0.3\n\
         Class1/Moderate,0.1,0.2,\n\
         Class1/Conservative,0.1,0.2,0.3\n\
         Extra/Advanced,9,9,9\n",
    );
    let source = CsvAssumptionSource::new(scratch.path());
    let table = source
        .metric_values(&request(FinancialCase::Market), "Net Capacity Factor (%)", 1, false)
        .unwrap();

    assert_eq!(table.years(), &[2021, 2022]);
    assert_eq!(table.n_rows(), 3);
    assert_eq!(table.get("Class1/Advanced", 2022), Some(0.3));
    assert!(table.get("Class1/Moderate", 2022).unwrap().is_nan());
}

#[test]
fn case_directory_wins_over_sheet_directory() {
    let scratch = Scratch::new();
    scratch.write("solar_utility_pv/financial_assumptions.csv", "name,value\nCo-location Savings,0.9\n");
    scratch.write(
        "solar_utility_pv/r_d/financial_assumptions.csv",
        "name,value\nCo-location Savings,0.8\nCapital Recovery Period (Years),\n",
    );
    let source = CsvAssumptionSource::new(scratch.path());

    let market = source.financial_assumptions(&request(FinancialCase::Market)).unwrap();
    let rnd = source.financial_assumptions(&request(FinancialCase::RAndD)).unwrap();
    assert_eq!(market.get("Co-location Savings"), Some(0.9));
    assert_eq!(rnd.get("Co-location Savings"), Some(0.8));
    assert_eq!(rnd.capital_recovery_period(), None);
}

#[test]
fn wacc_block_is_found_by_name() {
    let scratch = Scratch::new();
    let mut wacc = String::from("label,2021,2022\nInflation Rate,0.025,0.025\nTax Rate (Federal and State),0.257,0.257\n");
    for kind in ["Nominal", "Real"] {
        for s in SCENARIOS {
            wacc.push_str(&format!("WACC {kind} - {s},0.05,0.05\n"));
        }
    }
    scratch.write("hydropower/wacc.csv", &wacc);
    let source = CsvAssumptionSource::new(scratch.path());

    let tables = source.wacc(&request(FinancialCase::Market), "Hydropower").unwrap();
    assert_eq!(tables.full.n_rows(), 8);
    assert_eq!(tables.just_wacc.n_rows(), 6);
    assert_eq!(tables.wacc_real(Scenario::Moderate).unwrap(), &[0.05, 0.05]);
}

#[test]
fn missing_files() {
    let scratch = Scratch::new();
    scratch.write("solar_utility_pv/meta.csv", "Technology,Category\nUtility PV,Renewable\n");
    let source = CsvAssumptionSource::new(scratch.path());

    let meta = source.meta_data(&request(FinancialCase::Market)).unwrap();
    assert_eq!(meta.len(), 1);
    assert_eq!(meta[0]["Category"], "Renewable");

    let err = source.tax_credits(&request(FinancialCase::Market)).unwrap_err();
    assert!(matches!(err, core_types::CoreError::Source(_)));
}

#[test]
fn malformed_number_is_reported() {
    let scratch = Scratch::new();
    scratch.write("x.csv", "label,2021\nA/Moderate,abc\n");
    let err = datastore::read_year_table(&scratch.path().join("x.csv"), None).unwrap_err();
    assert!(matches!(err, SourceError::Parse { what: "number", .. }));
}
