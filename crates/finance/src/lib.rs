//! Time-value-of-money factors for the LCOE calculation: depreciation
//! schedules and their per-year selection, capital recovery and project
//! finance factors, and tax-credit resolution and classification.

pub mod depreciation;
pub mod error;
pub mod factors;
pub mod tax_credits;

pub use depreciation::{
    DepreciationRegistry, DepreciationRule, DepreciationSchedule, DepreciationSelector, MACRS_16,
    MACRS_21, MACRS_6,
};
pub use error::FinanceError;
pub use factors::{FinanceFactorEngine, FinanceFactorResult, FinanceInputs};
pub use tax_credits::{ClassificationRule, TaxCreditResolver, TaxCredits};
