use crate::assumptions::{FinancialAssumptions, WaccTables};
use crate::enums::{CrpChoice, FinancialCase, Scenario, TaxCreditCase};
use crate::error::CoreError;
use crate::table::MetricTable;
use std::collections::BTreeMap;

/// Header of the reference LCOE table in the assumption source.
pub const LCOE_HEADER: &str = "Levelized Cost of Energy ($/MWh)";
/// Header of the reference CAPEX table in the assumption source.
pub const CAPEX_HEADER: &str = "CAPEX ($/kW)";
/// Header of the construction finance factor table.
pub const CFF_HEADER: &str = "Construction Finance Factor";

/// Identifies the slice of assumption data a run reads: one technology sheet
/// evaluated under one financial case, CRP and (optionally) tax-credit case.
#[derive(Debug, Clone, Copy)]
pub struct SheetRequest<'a> {
    pub sheet_name: &'a str,
    pub case: FinancialCase,
    pub crp: CrpChoice,
    pub tax_credit_case: Option<TaxCreditCase>,
    pub scenarios: &'a [Scenario],
    pub base_year: i32,
    pub end_year: i32,
}

/// One row of technology classification metadata, column name to value.
pub type MetaRecord = BTreeMap<String, String>;

/// The read contract of the external assumption-table source.
///
/// Implementations must return fully populated tables bounded to
/// `[base_year, end_year]` whose row counts match
/// `num_tech_details * scenarios.len()`. The `Send + Sync` bounds let a single
/// source be shared by every run of a parallel batch.
pub trait AssumptionSource: Send + Sync {
    /// A (tech-detail x scenario) metric table found under `metric`.
    fn metric_values(
        &self,
        request: &SheetRequest<'_>,
        metric: &str,
        num_tech_details: usize,
        split_layout: bool,
    ) -> Result<MetricTable, CoreError>;

    /// The technology's tax-credit table (`ITC Schedule*/*` and `PTC/<scenario>` rows).
    fn tax_credits(&self, request: &SheetRequest<'_>) -> Result<MetricTable, CoreError>;

    /// Construction finance factor rows, `row_count` of them.
    fn construction_finance_factor(
        &self,
        request: &SheetRequest<'_>,
        name: &str,
        row_count: usize,
    ) -> Result<MetricTable, CoreError>;

    fn financial_assumptions(&self, request: &SheetRequest<'_>) -> Result<FinancialAssumptions, CoreError>;

    /// WACC tables for the named WACC block (often the sheet name itself).
    fn wacc(&self, request: &SheetRequest<'_>, tech_name: &str) -> Result<WaccTables, CoreError>;

    /// Technology classification metadata. Sources without any return nothing.
    fn meta_data(&self, _request: &SheetRequest<'_>) -> Result<Vec<MetaRecord>, CoreError> {
        Ok(Vec::new())
    }
}
