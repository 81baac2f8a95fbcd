use engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebtFractionError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Debt-fraction setup is invalid: {0}")]
    Configuration(String),

    #[error("No '{parameter}' value for {technology} in {year}")]
    MissingInput { technology: String, parameter: String, year: i32 },

    #[error("Failed to run the solver: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize the solver input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The solver failed: {0}")]
    Solver(String),

    #[error("The solver returned '{0}', which is not a number")]
    InvalidOutput(String),

    #[error("Debt fraction {0} is outside 0-100 percent")]
    OutOfRange(f64),
}
