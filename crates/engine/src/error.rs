use core_types::CoreError;
use finance::FinanceError;
use technologies::TechnologyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Data error: {0}")]
    Data(#[from] CoreError),

    #[error("Finance error: {0}")]
    Finance(#[from] FinanceError),

    #[error("Technology error: {0}")]
    Technology(#[from] TechnologyError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An error annotated with the run it aborted.
    #[error("{technology} ({case}, CRP {crp}): {source}")]
    Run {
        technology: String,
        case: String,
        crp: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// True for errors caused by the setup rather than by the data, which
    /// would fail every other run of the same batch too.
    pub fn is_configuration(&self) -> bool {
        match self {
            EngineError::Configuration(_) => true,
            EngineError::Finance(e) => e.is_configuration(),
            EngineError::Technology(TechnologyError::Finance(e)) => e.is_configuration(),
            EngineError::Technology(TechnologyError::Configuration { .. }) => true,
            EngineError::Technology(_) | EngineError::Data(_) => false,
            EngineError::Run { source, .. } => source.is_configuration(),
        }
    }
}
