use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FinanceError {
    #[error(transparent)]
    Data(#[from] CoreError),

    /// The inputs describe a setup the formulas cannot be evaluated for, e.g.
    /// an unknown depreciation schedule or a tax rate of 100%.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FinanceError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, FinanceError::Configuration(_))
    }
}
