use core_types::ItcKey;
use finance::ClassificationRule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a technology turns its cost and finance factors into LCOE.
///
/// A closed set: adding a variant forces every `match` in the engine to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaStrategy {
    /// `1000 * (CRF * PFF * CAPEX + FOM) / AEP + VOM - PTC`.
    Standard,
    /// Standard plus `HeatRate * FuelCost`.
    FuelAugmented,
    /// Separate PV and battery fixed-charge-rate tracks with grid-charging costs.
    HybridStorage,
    /// CAPEX and CFC only.
    CapexOnly,
    /// Nothing is calculated.
    None,
}

impl FormulaStrategy {
    pub fn computes_capex(&self) -> bool {
        !matches!(self, FormulaStrategy::None)
    }

    pub fn computes_lcoe(&self) -> bool {
        matches!(
            self,
            FormulaStrategy::Standard | FormulaStrategy::FuelAugmented | FormulaStrategy::HybridStorage
        )
    }

    /// The ITC schedules a PFF track is computed for.
    pub fn itc_keys(&self) -> &'static [ItcKey] {
        match self {
            FormulaStrategy::HybridStorage => &[ItcKey::Pv, ItcKey::Battery],
            _ => &[ItcKey::Plain],
        }
    }

    pub fn classification_rule(&self) -> ClassificationRule {
        match self {
            FormulaStrategy::HybridStorage => ClassificationRule::Hybrid,
            _ => ClassificationRule::Standard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaStrategy::Standard => "standard",
            FormulaStrategy::FuelAugmented => "fuel-augmented",
            FormulaStrategy::HybridStorage => "hybrid-storage",
            FormulaStrategy::CapexOnly => "capex-only",
            FormulaStrategy::None => "none",
        }
    }
}

impl fmt::Display for FormulaStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
