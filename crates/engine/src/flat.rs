use crate::error::EngineError;
use crate::run::RunOutput;
use core_types::{split_label, ItcKey, MetricTable, Scenario};
use finance::factors::{fcr, pff_label};
use serde::Serialize;
use technologies::TechnologyProfile;

/// Fills columns that do not apply to a row.
pub const PLACEHOLDER: &str = "*";

/// Descriptive columns of the flattened output, before the year columns.
pub const META_COLUMNS: [&str; 7] = [
    "Parameter",
    "Case",
    "TaxCreditCase",
    "CRPYears",
    "Technology",
    "DisplayName",
    "Scenario",
];

const WACC_SEPARATOR: &str = " - ";
const NOMINAL: &str = "Nominal";
const INTEREST_DURING_CONSTRUCTION: &str = "Interest During Construction - Nominal";

/// One row of the flattened output. `None` values are written as `*`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub parameter: String,
    pub case: String,
    pub tax_credit_case: String,
    pub crp_years: u32,
    pub technology: String,
    pub display_name: String,
    pub scenario: String,
    pub values: Vec<Option<f64>>,
}

impl FlatRow {
    /// The descriptive columns in `META_COLUMNS` order.
    pub fn meta(&self) -> [String; 7] {
        [
            self.parameter.clone(),
            self.case.clone(),
            self.tax_credit_case.clone(),
            self.crp_years.to_string(),
            self.technology.clone(),
            self.display_name.clone(),
            self.scenario.clone(),
        ]
    }
}

/// One (row, year) cell of the long layout.
#[derive(Debug, Clone, Serialize)]
pub struct LongRecord<'a> {
    #[serde(rename = "Parameter")]
    pub parameter: &'a str,
    #[serde(rename = "Case")]
    pub case: &'a str,
    #[serde(rename = "TaxCreditCase")]
    pub tax_credit_case: &'a str,
    #[serde(rename = "CRPYears")]
    pub crp_years: u32,
    #[serde(rename = "Technology")]
    pub technology: &'a str,
    #[serde(rename = "DisplayName")]
    pub display_name: &'a str,
    #[serde(rename = "Scenario")]
    pub scenario: &'a str,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Value")]
    pub value: Option<f64>,
}

/// Flattened results in the wide layout: one column per year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    years: Vec<i32>,
    rows: Vec<FlatRow>,
}

impl FlatTable {
    pub fn new(years: Vec<i32>) -> Self {
        Self { years, rows: Vec::new() }
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows_for<'s>(&'s self, parameter: &'s str) -> impl Iterator<Item = &'s FlatRow> {
        self.rows.iter().filter(move |r| r.parameter == parameter)
    }

    /// Column names of the wide layout.
    pub fn header(&self) -> Vec<String> {
        META_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.years.iter().map(|y| y.to_string()))
            .collect()
    }

    /// Appends the rows of `other`, widening the year columns to the union of
    /// both tables. Cells outside a row's own years become `None`.
    pub fn append(&mut self, other: FlatTable) {
        if other.years == self.years {
            self.rows.extend(other.rows);
            return;
        }
        let first = self.years.first().into_iter().chain(other.years.first()).min().copied();
        let last = self.years.last().into_iter().chain(other.years.last()).max().copied();
        let (Some(first), Some(last)) = (first, last) else {
            return;
        };
        let years: Vec<i32> = (first..=last).collect();
        let realign = |row: FlatRow, from: &[i32]| FlatRow {
            values: years
                .iter()
                .map(|y| from.iter().position(|f| f == y).and_then(|i| row.values[i]))
                .collect(),
            ..row
        };
        let mut rows: Vec<FlatRow> = Vec::with_capacity(self.rows.len() + other.rows.len());
        rows.extend(self.rows.drain(..).map(|r| realign(r, &self.years)));
        rows.extend(other.rows.into_iter().map(|r| realign(r, &other.years)));
        self.rows = rows;
        self.years = years;
    }

    /// Melts the table into one record per (row, year).
    pub fn long_records(&self) -> impl Iterator<Item = LongRecord<'_>> {
        self.rows.iter().flat_map(move |row| {
            self.years.iter().zip(&row.values).map(move |(year, value)| LongRecord {
                parameter: &row.parameter,
                case: &row.case,
                tax_credit_case: &row.tax_credit_case,
                crp_years: row.crp_years,
                technology: &row.technology,
                display_name: &row.display_name,
                scenario: &row.scenario,
                year: *year,
                value: *value,
            })
        })
    }
}

impl RunOutput {
    /// Flattens the run: financial assumptions, CRF and FCR, then one block per
    /// output field of the profile.
    pub fn flat(&self, profile: &TechnologyProfile) -> Result<FlatTable, EngineError> {
        let mut table = FlatTable::new(self.years().to_vec());
        let base = FlatRow {
            parameter: String::new(),
            case: self.case.to_string(),
            tax_credit_case: self.regime.to_string(),
            crp_years: self.crp_years,
            technology: self.technology.clone(),
            display_name: PLACEHOLDER.to_string(),
            scenario: PLACEHOLDER.to_string(),
            values: Vec::new(),
        };

        if let Some(wacc) = &self.inputs.wacc {
            for (label, values) in wacc.full.iter_rows() {
                let (parameter, scenario) = split_wacc_label(label);
                table.rows.push(FlatRow {
                    parameter,
                    scenario,
                    values: values.iter().copied().map(Some).collect(),
                    ..base.clone()
                });
            }
            table.rows.extend(self.crf_fcr_rows(profile, &base)?);
        }

        for field in &profile.outputs {
            let Some(metric) = self.field(*field) else {
                continue;
            };
            for (label, values) in metric.iter_rows() {
                let (display_name, scenario) = split_label(label);
                table.rows.push(FlatRow {
                    parameter: field.parameter().to_string(),
                    display_name: display_name.to_string(),
                    scenario: scenario.to_string(),
                    values: values.iter().copied().map(Some).collect(),
                    ..base.clone()
                });
            }
        }
        Ok(table)
    }

    /// `CRF - <scenario>` and `FCR - <scenario>` rows when a plain PFF exists,
    /// otherwise one placeholder row each.
    fn crf_fcr_rows(&self, profile: &TechnologyProfile, base: &FlatRow) -> Result<Vec<FlatRow>, EngineError> {
        let plain = self
            .finance
            .as_ref()
            .filter(|_| self.has_tax_credit)
            .and_then(|f| f.pff.get(&ItcKey::Plain).map(|pff| (f, pff)));

        let Some((finance, pff)) = plain else {
            let empty = vec![None; self.years().len()];
            return Ok(["CRF", "FCR"]
                .into_iter()
                .map(|p| FlatRow { parameter: p.to_string(), values: empty.clone(), ..base.clone() })
                .collect());
        };

        let mut rows = Vec::with_capacity(profile.scenarios.len() * 2);
        for scenario in &profile.scenarios {
            let crf = finance.crf_for(*scenario)?;
            let pff = row_of(pff, &pff_label(*scenario))?;
            let fcr_values = crf.iter().zip(pff).map(|(c, p)| Some(fcr(*c, *p))).collect();
            rows.push(scenario_row(base, "CRF", *scenario, crf.iter().copied().map(Some).collect()));
            rows.push(scenario_row(base, "FCR", *scenario, fcr_values));
        }
        Ok(rows)
    }
}

fn row_of<'t>(table: &'t MetricTable, label: &str) -> Result<&'t [f64], EngineError> {
    table
        .row(label)
        .ok_or_else(|| core_types::CoreError::shape("flat", format!("row '{label}' not found")).into())
}

fn scenario_row(base: &FlatRow, parameter: &str, scenario: Scenario, values: Vec<Option<f64>>) -> FlatRow {
    FlatRow {
        parameter: parameter.to_string(),
        scenario: scenario.to_string(),
        values,
        ..base.clone()
    }
}

/// `WACC Real - Moderate` becomes (`WACC Real`, `Moderate`); labels without a
/// scenario get `*`, and the nominal construction-interest row keeps its full name.
fn split_wacc_label(label: &str) -> (String, String) {
    match label.split_once(WACC_SEPARATOR) {
        Some((_, scenario)) if scenario.trim() == NOMINAL => {
            (INTEREST_DURING_CONSTRUCTION.to_string(), PLACEHOLDER.to_string())
        }
        Some((parameter, scenario)) => (parameter.trim().to_string(), scenario.trim().to_string()),
        None => (label.trim().to_string(), PLACEHOLDER.to_string()),
    }
}
