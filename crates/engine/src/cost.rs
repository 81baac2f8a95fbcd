use crate::error::EngineError;
use core_types::MetricTable;
use tracing::debug;

pub const HOURS_PER_YEAR: f64 = 8760.0;

/// CAPEX and construction financing cost, plus annual energy production for
/// technologies that have a capacity factor.
#[derive(Debug, Clone, PartialEq)]
pub struct CostResult {
    pub capex: MetricTable,
    pub cfc: MetricTable,
    pub aep: Option<MetricTable>,
}

/// A stateless calculator for the cost tables of a run.
#[derive(Debug, Default)]
pub struct CostEngine {}

impl CostEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes CAPEX and CFC, and AEP when a net capacity factor is given.
    pub fn calculate(
        &self,
        cff: &MetricTable,
        occ: &MetricTable,
        gcc: &MetricTable,
        ncf: Option<&MetricTable>,
    ) -> Result<CostResult, EngineError> {
        let capex = self.capex(cff, occ, gcc)?;
        let cfc = self.construction_finance_cost(cff, occ, gcc)?;
        let aep = ncf.map(|ncf| self.annual_energy(ncf)).transpose()?;
        debug!(rows = capex.n_rows(), years = capex.n_years(), "Computed cost tables");
        Ok(CostResult { capex, cfc, aep })
    }

    /// `AEP = NCF * 8760`, kWh per kW of capacity.
    pub fn annual_energy(&self, ncf: &MetricTable) -> Result<MetricTable, EngineError> {
        let aep = ncf.map(|cf| cf * HOURS_PER_YEAR);
        aep.ensure_complete("AEP")?;
        Ok(aep)
    }

    /// `CAPEX = CFF * (OCC + GCC)`.
    pub fn capex(
        &self,
        cff: &MetricTable,
        occ: &MetricTable,
        gcc: &MetricTable,
    ) -> Result<MetricTable, EngineError> {
        let installed = occ.zip_with(gcc, "CAPEX", |o, g| o + g)?;
        let capex = installed.zip_with(cff, "CAPEX", |i, f| f * i)?;
        capex.ensure_complete("CAPEX")?;
        Ok(capex)
    }

    /// `CFC = (CFF - 1) * (OCC + GCC)`.
    pub fn construction_finance_cost(
        &self,
        cff: &MetricTable,
        occ: &MetricTable,
        gcc: &MetricTable,
    ) -> Result<MetricTable, EngineError> {
        let installed = occ.zip_with(gcc, "CFC", |o, g| o + g)?;
        let cfc = installed.zip_with(cff, "CFC", |i, f| (f - 1.0) * i)?;
        cfc.ensure_complete("CFC")?;
        Ok(cfc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(values: [f64; 2]) -> MetricTable {
        MetricTable::from_rows(vec![2021, 2022], vec![("A/Moderate".to_string(), values.to_vec())])
            .unwrap()
    }

    #[test]
    fn capex_and_cfc() {
        let engine = CostEngine::new();
        let result = engine
            .calculate(&table([1.05, 1.1]), &table([1000.0, 900.0]), &table([50.0, 100.0]), None)
            .unwrap();
        assert!((result.capex.value(0, 0) - 1102.5).abs() < 1e-9);
        assert!((result.capex.value(0, 1) - 1100.0).abs() < 1e-9);
        assert!((result.cfc.value(0, 0) - 52.5).abs() < 1e-9);
        assert!(result.aep.is_none());
    }

    #[test]
    fn aep_from_capacity_factor() {
        let aep = CostEngine::new().annual_energy(&table([0.5, 0.25])).unwrap();
        assert_eq!(aep.row_values(0), &[4380.0, 2190.0]);
    }

    #[test]
    fn missing_occ_value_is_reported() {
        let err = CostEngine::new()
            .capex(&table([1.0, 1.0]), &table([f64::NAN, 1.0]), &table([0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Data(core_types::CoreError::MissingValue { .. })));
    }
}
