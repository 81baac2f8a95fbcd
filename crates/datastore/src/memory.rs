use core_types::{
    AssumptionSource, CoreError, FinancialAssumptions, MetaRecord, MetricTable, SheetRequest,
    WaccTables,
};
use std::collections::HashMap;

/// An `AssumptionSource` over tables held in memory, keyed by sheet name and
/// header. The same tables serve every case, CRP and tax-credit case.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    metrics: HashMap<(String, String), MetricTable>,
    tax_credits: HashMap<String, MetricTable>,
    financial: HashMap<String, FinancialAssumptions>,
    wacc: HashMap<String, MetricTable>,
    meta: HashMap<String, Vec<MetaRecord>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a metric table (CFF and reference tables included) under `header`.
    pub fn with_metric(mut self, sheet: &str, header: &str, table: MetricTable) -> Self {
        self.metrics.insert((sheet.to_string(), header.to_string()), table);
        self
    }

    pub fn with_tax_credits(mut self, sheet: &str, table: MetricTable) -> Self {
        self.tax_credits.insert(sheet.to_string(), table);
        self
    }

    pub fn with_financial_assumptions(mut self, sheet: &str, assumptions: FinancialAssumptions) -> Self {
        self.financial.insert(sheet.to_string(), assumptions);
        self
    }

    /// Registers the full WACC table of a WACC block.
    pub fn with_wacc(mut self, name: &str, full: MetricTable) -> Self {
        self.wacc.insert(name.to_string(), full);
        self
    }

    pub fn with_meta(mut self, sheet: &str, records: Vec<MetaRecord>) -> Self {
        self.meta.insert(sheet.to_string(), records);
        self
    }

    fn bounded(
        &self,
        request: &SheetRequest<'_>,
        header: &str,
        max_rows: usize,
    ) -> Result<MetricTable, CoreError> {
        let table = self
            .metrics
            .get(&(request.sheet_name.to_string(), header.to_string()))
            .ok_or_else(|| {
                CoreError::Source(format!("no '{header}' table for sheet '{}'", request.sheet_name))
            })?;
        let picks: Vec<usize> = (0..table.n_rows().min(max_rows)).collect();
        let labels = picks.iter().map(|&i| table.rows()[i].clone()).collect();
        table
            .pick_rows(&picks, labels)?
            .restrict_years(header, request.base_year, request.end_year)
    }
}

impl AssumptionSource for MemorySource {
    fn metric_values(
        &self,
        request: &SheetRequest<'_>,
        metric: &str,
        num_tech_details: usize,
        split_layout: bool,
    ) -> Result<MetricTable, CoreError> {
        let scenarios = request.scenarios.len();
        let window = num_tech_details * scenarios + if split_layout { scenarios } else { 0 };
        self.bounded(request, metric, window)
    }

    fn tax_credits(&self, request: &SheetRequest<'_>) -> Result<MetricTable, CoreError> {
        self.tax_credits
            .get(request.sheet_name)
            .ok_or_else(|| CoreError::Source(format!("no tax credits for sheet '{}'", request.sheet_name)))?
            .restrict_years("tax credits", request.base_year, request.end_year)
    }

    fn construction_finance_factor(
        &self,
        request: &SheetRequest<'_>,
        name: &str,
        row_count: usize,
    ) -> Result<MetricTable, CoreError> {
        self.bounded(request, name, row_count)
    }

    fn financial_assumptions(&self, request: &SheetRequest<'_>) -> Result<FinancialAssumptions, CoreError> {
        Ok(self.financial.get(request.sheet_name).cloned().unwrap_or_default())
    }

    fn wacc(&self, request: &SheetRequest<'_>, tech_name: &str) -> Result<WaccTables, CoreError> {
        let full = self
            .wacc
            .get(tech_name)
            .ok_or_else(|| CoreError::Source(format!("no WACC block '{tech_name}'")))?;
        WaccTables::from_full(full.restrict_years("WACC", request.base_year, request.end_year)?)
    }

    fn meta_data(&self, request: &SheetRequest<'_>) -> Result<Vec<MetaRecord>, CoreError> {
        Ok(self.meta.get(request.sheet_name).cloned().unwrap_or_default())
    }
}
