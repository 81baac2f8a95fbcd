use crate::error::BatchError;
use core_types::{CrpChoice, FinancialCase, TaxCreditCase};
use engine::RunContext;
use itertools::Itertools;
use technologies::{TechRegistry, TechnologyProfile};

/// CRPs a technology is run with. The lifetime run is dropped when it
/// coincides with one of the fixed periods.
pub fn crp_choices(profile: &TechnologyProfile) -> Vec<CrpChoice> {
    CrpChoice::ALL
        .into_iter()
        .filter(|crp| *crp != CrpChoice::TechLife || !matches!(profile.tech_life, 20 | 30))
        .collect()
}

/// Tax-credit cases run under `case`. Only the Market case has them; a
/// technology without declared cases gets a single run.
pub fn tax_credit_cases(profile: &TechnologyProfile, case: FinancialCase) -> Vec<Option<TaxCreditCase>> {
    match case {
        FinancialCase::Market if !profile.tax_credit_cases.is_empty() => {
            profile.tax_credit_cases.iter().copied().map(Some).collect()
        }
        _ => vec![None],
    }
}

/// Every run of one technology, CRP-major.
pub fn plan_technology(profile: &TechnologyProfile) -> Vec<RunContext<'_>> {
    crp_choices(profile)
        .into_iter()
        .cartesian_product(FinancialCase::ALL)
        .flat_map(|(crp, case)| {
            tax_credit_cases(profile, case)
                .into_iter()
                .map(move |tcc| RunContext::new(profile, case, crp, tcc))
        })
        .collect()
}

/// Runs of every registered technology, or of `only` when given.
pub fn plan<'a>(registry: &'a TechRegistry, only: Option<&str>) -> Result<Vec<RunContext<'a>>, BatchError> {
    let profiles: Vec<&TechnologyProfile> = match only {
        Some(name) => vec![registry.get(name)?],
        None => registry.iter().collect(),
    };
    Ok(profiles.into_iter().flat_map(plan_technology).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use technologies::FormulaStrategy;

    #[test]
    fn tech_life_is_skipped_when_it_matches_a_fixed_crp() {
        let pv = TechnologyProfile::new("PV", "PV", 1, FormulaStrategy::Standard);
        assert_eq!(crp_choices(&pv), vec![CrpChoice::Years20, CrpChoice::Years30]);

        let hydro = pv.clone().life(100);
        assert_eq!(crp_choices(&hydro).len(), 3);
    }

    #[test]
    fn hybrid_market_runs_once_per_tax_credit_case() {
        let hybrid = TechnologyProfile::new("PVB", "PVB", 1, FormulaStrategy::HybridStorage)
            .tax_credit_cases(&[TaxCreditCase::ItcOnly, TaxCreditCase::PvPtcBatteryItc]);
        let runs = plan_technology(&hybrid);

        // 2 CRPs x (2 Market + 1 R&D)
        assert_eq!(runs.len(), 6);
        let market: Vec<_> = runs.iter().filter(|r| r.case == FinancialCase::Market).collect();
        assert!(market.iter().all(|r| r.tax_credit_case.is_some()));
        assert!(runs
            .iter()
            .filter(|r| r.case == FinancialCase::RAndD)
            .all(|r| r.tax_credit_case.is_none()));
    }
}
