use serde::{Deserialize, Serialize};
use std::fmt;

/// An input table read from the assumption source, named by its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    NetCapacityFactor,
    OvernightCapitalCost,
    GridConnectionCost,
    FixedOm,
    VariableOm,
    ConstructionFinanceFactor,
    HeatRate,
    FuelCost,
    PvSystemCost,
    BatteryCost,
    PvOnlyCapacityFactor,
}

impl Metric {
    /// The header the metric is found under. Some headers carry a double space.
    pub fn header(&self) -> &'static str {
        match self {
            Metric::NetCapacityFactor => "Net Capacity Factor (%)",
            Metric::OvernightCapitalCost => "Overnight Capital Cost ($/kW)",
            Metric::GridConnectionCost => "Grid Connection Costs (GCC) ($/kW)",
            Metric::FixedOm => "Fixed Operation and Maintenance Expenses ($/kW-yr)",
            Metric::VariableOm => "Variable Operation and Maintenance Expenses ($/MWh)",
            Metric::ConstructionFinanceFactor => core_types::source::CFF_HEADER,
            Metric::HeatRate => "Heat Rate  (MMBtu/MWh)",
            Metric::FuelCost => "Fuel Costs ($/MMBtu)",
            Metric::PvSystemCost => "PV System Cost ($/kW)",
            Metric::BatteryCost => "Battery Storage  Cost ($/kW)",
            Metric::PvOnlyCapacityFactor => "PV-Only Net Capacity Factor (%)",
        }
    }

    /// Inputs of the standard LCOE technologies.
    pub const STANDARD: [Metric; 6] = [
        Metric::NetCapacityFactor,
        Metric::OvernightCapitalCost,
        Metric::GridConnectionCost,
        Metric::FixedOm,
        Metric::VariableOm,
        Metric::ConstructionFinanceFactor,
    ];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// A parameter block of the flattened output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OutputField {
    CapacityFactor,
    OvernightCapitalCost,
    GridConnectionCost,
    FixedOm,
    VariableOm,
    ConstructionFinanceCost,
    Lcoe,
    Capex,
    HeatRate,
    Fuel,
}

impl OutputField {
    /// Value of the `Parameter` column.
    pub fn parameter(&self) -> &'static str {
        match self {
            OutputField::CapacityFactor => "CF",
            OutputField::OvernightCapitalCost => "OCC",
            OutputField::GridConnectionCost => "GCC",
            OutputField::FixedOm => "Fixed O&M",
            OutputField::VariableOm => "Variable O&M",
            OutputField::ConstructionFinanceCost => "CFC",
            OutputField::Lcoe => "LCOE",
            OutputField::Capex => "CAPEX",
            OutputField::HeatRate => "Heat Rate",
            OutputField::Fuel => "Fuel",
        }
    }

    /// The input metric an output field echoes, for fields that are not computed.
    pub fn source_metric(&self) -> Option<Metric> {
        match self {
            OutputField::CapacityFactor => Some(Metric::NetCapacityFactor),
            OutputField::OvernightCapitalCost => Some(Metric::OvernightCapitalCost),
            OutputField::GridConnectionCost => Some(Metric::GridConnectionCost),
            OutputField::FixedOm => Some(Metric::FixedOm),
            OutputField::VariableOm => Some(Metric::VariableOm),
            OutputField::HeatRate => Some(Metric::HeatRate),
            OutputField::ConstructionFinanceCost
            | OutputField::Lcoe
            | OutputField::Capex
            | OutputField::Fuel => None,
        }
    }

    pub const STANDARD: [OutputField; 8] = [
        OutputField::CapacityFactor,
        OutputField::OvernightCapitalCost,
        OutputField::GridConnectionCost,
        OutputField::FixedOm,
        OutputField::VariableOm,
        OutputField::ConstructionFinanceCost,
        OutputField::Lcoe,
        OutputField::Capex,
    ];
}

impl fmt::Display for OutputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.parameter())
    }
}
