//! # Debt Fractions
//!
//! Backs a debt fraction out of the engine's results for every LCOE
//! technology and financial case. The cash-flow model that does the actual
//! solving is external and sits behind `DebtFractionSolver`.

use configuration::DebtFractionSettings;
use core_types::{CrpChoice, FinancialCase, Scenario};
use engine::{RunContext, Runner};
use serde::Serialize;
use technologies::TechnologyProfile;
use tracing::{info, info_span};

pub mod error;
pub mod record;
pub mod solver;

pub use error::DebtFractionError;
pub use record::DebtFractionInputs;
pub use solver::{CommandSolver, DebtFractionSolver};

/// Debt fractions (0-1) of one technology and case, one per year.
#[derive(Debug, Clone, Serialize)]
pub struct DebtFractionRow {
    pub technology: String,
    pub case: FinancialCase,
    pub years: Vec<i32>,
    pub fractions: Vec<f64>,
}

/// Turns a solver percentage into a fraction.
pub fn to_fraction(percent: f64) -> Result<f64, DebtFractionError> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(DebtFractionError::OutOfRange(percent));
    }
    Ok(percent / 100.0)
}

/// Runs the representative CRP for each technology and case and asks the
/// solver for every year of the run.
pub struct DebtFractionCalculator<'a> {
    solver: &'a dyn DebtFractionSolver,
    scenario: Scenario,
    crp: CrpChoice,
}

impl<'a> DebtFractionCalculator<'a> {
    pub fn new(solver: &'a dyn DebtFractionSolver, settings: &DebtFractionSettings) -> Result<Self, DebtFractionError> {
        let crp = match settings.crp_years {
            20 => CrpChoice::Years20,
            30 => CrpChoice::Years30,
            other => {
                return Err(DebtFractionError::Configuration(format!(
                    "debt fractions are computed at a CRP of 20 or 30 years, not {other}"
                )));
            }
        };
        Ok(Self { solver, scenario: settings.representative_scenario, crp })
    }

    /// Technologies the workflow applies to: those that compute an LCOE.
    pub fn applies_to(profile: &TechnologyProfile) -> bool {
        profile.capabilities.has_lcoe
    }

    /// Debt fractions of one technology under one case.
    pub fn calculate(
        &self,
        runner: &Runner<'_>,
        profile: &TechnologyProfile,
        case: FinancialCase,
    ) -> Result<DebtFractionRow, DebtFractionError> {
        let span = info_span!("debt_fraction", technology = %profile.name, case = %case);
        let _enter = span.enter();

        let tax_credit_case = match case {
            FinancialCase::Market => profile.tax_credit_cases.first().copied(),
            FinancialCase::RAndD => None,
        };
        let ctx = RunContext::new(profile, case, self.crp, tax_credit_case);
        let output = runner.run(&ctx)?;

        let years = output.years().to_vec();
        let fractions = years
            .iter()
            .map(|year| {
                let inputs = DebtFractionInputs::from_run(&output, profile, self.scenario, *year)?;
                to_fraction(self.solver.solve(&inputs)?)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(years = years.len(), "Debt fractions calculated");
        Ok(DebtFractionRow { technology: profile.name.clone(), case, years, fractions })
    }

    /// Every applicable technology of the runner's registry under both cases,
    /// or only `only` when given.
    pub fn calculate_all(
        &self,
        runner: &Runner<'_>,
        only: Option<&str>,
    ) -> Result<Vec<DebtFractionRow>, DebtFractionError> {
        let mut rows = Vec::new();
        for profile in runner.registry().iter().filter(|p| Self::applies_to(p)) {
            if only.is_some_and(|name| name != profile.name && name != profile.sheet_name) {
                continue;
            }
            for case in FinancialCase::ALL {
                rows.push(self.calculate(runner, profile, case)?);
            }
        }
        Ok(rows)
    }
}
