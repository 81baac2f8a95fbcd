use finance::FinanceError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TechnologyError {
    #[error("Invalid configuration for '{technology}': {detail}")]
    Configuration { technology: String, detail: String },

    #[error("Unknown technology: '{0}'")]
    UnknownTechnology(String),

    #[error("Duplicate technology: '{0}'")]
    Duplicate(String),

    #[error(transparent)]
    Finance(#[from] FinanceError),
}

impl TechnologyError {
    pub fn configuration(technology: &str, detail: impl Into<String>) -> Self {
        TechnologyError::Configuration { technology: technology.to_string(), detail: detail.into() }
    }
}
