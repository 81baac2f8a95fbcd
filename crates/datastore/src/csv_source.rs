use crate::error::SourceError;
use core_types::{
    AssumptionSource, CoreError, FinancialAssumptions, MetaRecord, MetricTable, SheetRequest,
    WaccTables,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TAX_CREDITS_FILE: &str = "tax_credits.csv";
pub const FINANCIAL_ASSUMPTIONS_FILE: &str = "financial_assumptions.csv";
pub const WACC_FILE: &str = "wacc.csv";
pub const META_FILE: &str = "meta.csv";

/// Lowercase ASCII alphanumerics with every other run of characters collapsed
/// into one `_`. `Net Capacity Factor (%)` becomes `net_capacity_factor`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending && !out.is_empty() {
                out.push('_');
            }
            pending = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending = true;
        }
    }
    out
}

/// File name of a metric table.
pub fn metric_file(header: &str) -> String {
    format!("{}.csv", slug(header))
}

#[derive(Debug, Deserialize)]
struct AssumptionRow {
    name: String,
    value: Option<f64>,
}

/// Reads assumption tables from a directory of CSV files.
///
/// Each sheet has a directory named after its slug. Tables that differ by
/// financial case, CRP or tax-credit case live in nested directories and are
/// looked up most specific first:
///
/// ```text
/// <root>/<sheet>/<case>/<crp>/<tax-credit case>/<file>.csv
/// <root>/<sheet>/<case>/<crp>/<file>.csv
/// <root>/<sheet>/<case>/<file>.csv
/// <root>/<sheet>/<file>.csv
/// ```
///
/// Year tables have a label column followed by one column per year. Blank
/// cells are read as missing values.
#[derive(Debug, Clone)]
pub struct CsvAssumptionSource {
    root: PathBuf,
}

impl CsvAssumptionSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate directories for `sheet`, most specific first.
    fn search_dirs(&self, sheet: &str, request: &SheetRequest<'_>) -> Vec<PathBuf> {
        let sheet_dir = self.root.join(slug(sheet));
        let case_dir = sheet_dir.join(slug(request.case.as_str()));
        let crp_dir = case_dir.join(request.crp.as_str());
        let mut dirs = Vec::with_capacity(4);
        if let Some(tcc) = request.tax_credit_case {
            dirs.push(crp_dir.join(slug(tcc.as_str())));
        }
        dirs.extend([crp_dir, case_dir, sheet_dir]);
        dirs
    }

    fn locate(&self, sheet: &str, request: &SheetRequest<'_>, file: &str) -> Result<PathBuf, SourceError> {
        self.search_dirs(sheet, request)
            .into_iter()
            .map(|dir| dir.join(file))
            .find(|path| path.is_file())
            .ok_or_else(|| SourceError::NotFound {
                file: file.to_string(),
                sheet: sheet.to_string(),
                root: self.root.clone(),
            })
    }

    /// A year table bounded to the request's years, keeping at most `max_rows` rows.
    fn year_table(
        &self,
        sheet: &str,
        request: &SheetRequest<'_>,
        file: &str,
        max_rows: Option<usize>,
    ) -> Result<MetricTable, SourceError> {
        let path = self.locate(sheet, request, file)?;
        debug!(path = %path.display(), "Reading table");
        let table = read_year_table(&path, max_rows)?;
        Ok(table.restrict_years(file, request.base_year, request.end_year)?)
    }
}

/// Parses a label-plus-years CSV file.
pub fn read_year_table(path: &Path, max_rows: Option<usize>) -> Result<MetricTable, SourceError> {
    let csv_err = |source| SourceError::Csv { path: path.to_path_buf(), source };
    let parse_err = |what, value: &str| SourceError::Parse {
        path: path.to_path_buf(),
        what,
        value: value.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new().flexible(false).from_path(path).map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    let years = headers
        .iter()
        .skip(1)
        .map(|h| h.trim().parse::<i32>().map_err(|_| parse_err("year", h)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::new();
    for record in reader.records() {
        if max_rows.is_some_and(|max| rows.len() >= max) {
            break;
        }
        let record = record.map_err(csv_err)?;
        let label = record.get(0).unwrap_or_default().trim().to_string();
        let values = record
            .iter()
            .skip(1)
            .map(|cell| {
                let cell = cell.trim();
                if cell.is_empty() {
                    Ok(f64::NAN)
                } else {
                    cell.parse::<f64>().map_err(|_| parse_err("number", cell))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((label, values));
    }
    Ok(MetricTable::from_rows(years, rows)?)
}

impl AssumptionSource for CsvAssumptionSource {
    fn metric_values(
        &self,
        request: &SheetRequest<'_>,
        metric: &str,
        num_tech_details: usize,
        split_layout: bool,
    ) -> Result<MetricTable, CoreError> {
        let scenarios = request.scenarios.len();
        let mut window = num_tech_details * scenarios;
        if split_layout {
            window += scenarios;
        }
        Ok(self.year_table(request.sheet_name, request, &metric_file(metric), Some(window))?)
    }

    fn tax_credits(&self, request: &SheetRequest<'_>) -> Result<MetricTable, CoreError> {
        Ok(self.year_table(request.sheet_name, request, TAX_CREDITS_FILE, None)?)
    }

    fn construction_finance_factor(
        &self,
        request: &SheetRequest<'_>,
        name: &str,
        row_count: usize,
    ) -> Result<MetricTable, CoreError> {
        Ok(self.year_table(request.sheet_name, request, &metric_file(name), Some(row_count))?)
    }

    fn financial_assumptions(&self, request: &SheetRequest<'_>) -> Result<FinancialAssumptions, CoreError> {
        let path = self.locate(request.sheet_name, request, FINANCIAL_ASSUMPTIONS_FILE)?;
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|source| SourceError::Csv { path: path.clone(), source })?;
        let mut assumptions = FinancialAssumptions::default();
        for row in reader.deserialize::<AssumptionRow>() {
            let row = row.map_err(|source| SourceError::Csv { path: path.clone(), source })?;
            if let Some(value) = row.value {
                assumptions.insert(row.name.trim(), value);
            }
        }
        Ok(assumptions)
    }

    fn wacc(&self, request: &SheetRequest<'_>, tech_name: &str) -> Result<WaccTables, CoreError> {
        let full = self.year_table(tech_name, request, WACC_FILE, None)?;
        WaccTables::from_full(full)
    }

    fn meta_data(&self, request: &SheetRequest<'_>) -> Result<Vec<MetaRecord>, CoreError> {
        let Ok(path) = self.locate(request.sheet_name, request, META_FILE) else {
            return Ok(Vec::new());
        };
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|source| SourceError::Csv { path: path.clone(), source })?;
        let headers = reader
            .headers()
            .map_err(|source| SourceError::Csv { path: path.clone(), source })?
            .clone();
        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| SourceError::Csv { path: path.clone(), source })?;
            records.push(
                headers
                    .iter()
                    .zip(record.iter())
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                    .collect(),
            );
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slug("Net Capacity Factor (%)"), "net_capacity_factor");
        assert_eq!(slug("Heat Rate  (MMBtu/MWh)"), "heat_rate_mmbtu_mwh");
        assert_eq!(slug("Solar - Utility PV"), "solar_utility_pv");
        assert_eq!(slug("R&D"), "r_d");
        assert_eq!(metric_file("CAPEX ($/kW)"), "capex_kw.csv");
    }
}
