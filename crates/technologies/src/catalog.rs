use crate::formula::FormulaStrategy;
use crate::metric::{Metric, OutputField};
use crate::profile::TechnologyProfile;
use core_types::{FinancialCase, Scenario, TaxCreditCase};
use finance::{DepreciationSelector, MACRS_16, MACRS_21, MACRS_6};

/// The built-in technologies in processing order.
///
/// `switch_year` is the first year in which Hydropower and Nuclear move to the
/// 6-year schedule in the Market case.
pub fn builtin_profiles(switch_year: i32) -> Vec<TechnologyProfile> {
    vec![
        TechnologyProfile::new("OffShoreWind", "Offshore Wind", 14, FormulaStrategy::Standard)
            .representative("Offshore Wind - Class 3", 1.45),
        TechnologyProfile::new("LandbasedWind", "Land-Based Wind", 10, FormulaStrategy::Standard)
            .representative("Land-Based Wind - Class 4", 1.45),
        TechnologyProfile::new("DistributedWind", "Distributed Wind", 40, FormulaStrategy::Standard)
            .representative("Midsize DW - Class 4", 1.45),
        TechnologyProfile::new("UtilityPV", "Solar - Utility PV", 10, FormulaStrategy::Standard)
            .representative("Utility PV - Class 5", 1.3),
        TechnologyProfile::new("CommPV", "Solar - PV Dist. Comm", 10, FormulaStrategy::Standard)
            .representative("Commercial PV - Class 5", 1.3),
        TechnologyProfile::new("ResPV", "Solar - PV Dist. Res", 10, FormulaStrategy::Standard)
            .representative("Residential PV - Class 5", 1.3),
        TechnologyProfile::new("Utility-Scale PV-Plus-Battery", "Utility-Scale PV-Plus-Battery", 10, FormulaStrategy::HybridStorage)
            .wacc_from("Solar - Utility PV")
            .representative("PV+Storage - Class 5", 1.3)
            .tax_credit_cases(&[TaxCreditCase::ItcOnly, TaxCreditCase::PvPtcBatteryItc]),
        TechnologyProfile::new("CSP", "Solar - CSP", 3, FormulaStrategy::Standard)
            .representative("CSP - Class 2", 1.45),
        // Hydrothermal CFF rows serve details 1-2, EGS rows details 3-6.
        TechnologyProfile::new("Geothermal", "Geothermal", 6, FormulaStrategy::Standard)
            .grouped_cff(vec![0, 0, 1, 1, 1, 1])
            .representative("Geothermal - Hydro / Flash", 1.45),
        TechnologyProfile::new("Hydropower", "Hydropower", 12, FormulaStrategy::Standard)
            .life(100)
            .split()
            .depreciation(DepreciationSelector::switching(
                MACRS_21,
                FinancialCase::Market,
                switch_year,
                MACRS_6,
            ))
            .representative("Hydropower - NPD 1", 1.45),
        TechnologyProfile::new("Pumped Storage Hydropower", "Pumped Storage Hydropower", 15, FormulaStrategy::CapexOnly)
            .wacc_from("Hydropower")
            .life(100)
            .depreciation(DepreciationSelector::fixed(MACRS_21)),
        TechnologyProfile::new("Coal_FE", "Coal_FE", 4, FormulaStrategy::CapexOnly)
            .life(75)
            .with_leading(Metric::HeatRate, OutputField::HeatRate)
            .depreciation(DepreciationSelector::fixed(MACRS_21))
            .without_tax_credits(),
        TechnologyProfile::new("NaturalGas_FE", "Natural Gas_FE", 7, FormulaStrategy::CapexOnly)
            .life(55)
            .with_leading(Metric::HeatRate, OutputField::HeatRate)
            .depreciation(DepreciationSelector::fixed(MACRS_16))
            .without_tax_credits(),
        TechnologyProfile::new("Nuclear", "Nuclear", 2, FormulaStrategy::FuelAugmented)
            .life(60)
            .scenarios(&[Scenario::Moderate])
            .depreciation(DepreciationSelector::switching(
                MACRS_16,
                FinancialCase::Market,
                switch_year,
                MACRS_6,
            ))
            .representative("Nuclear - Large", 1.45),
        TechnologyProfile::new("Biopower", "Biopower", 1, FormulaStrategy::FuelAugmented)
            .life(45)
            .representative("Biopower - Dedicated", 1.45),
        TechnologyProfile::new("Utility-Scale Battery Storage", "Utility-Scale Battery Storage", 5, FormulaStrategy::None),
        TechnologyProfile::new("Commercial Battery Storage", "Commercial Battery Storage", 5, FormulaStrategy::None),
        TechnologyProfile::new("Residential Battery Storage", "Residential Battery Storage", 2, FormulaStrategy::None),
    ]
}
