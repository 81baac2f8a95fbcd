use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Data shape error in '{metric}': {detail}")]
    DataShape { metric: String, detail: String },

    #[error("Missing value in '{metric}' at row '{row}', year {year}")]
    MissingValue { metric: String, row: String, year: i32 },

    #[error("Unknown {kind}: '{value}'")]
    Parse { kind: &'static str, value: String },

    #[error("Assumption source failed: {0}")]
    Source(String),
}

impl CoreError {
    pub fn shape(metric: impl Into<String>, detail: impl Into<String>) -> Self {
        CoreError::DataShape { metric: metric.into(), detail: detail.into() }
    }
}
