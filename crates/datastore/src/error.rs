use core_types::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("No '{file}' found for sheet '{sheet}' under {root}")]
    NotFound { file: String, sheet: String, root: PathBuf },

    #[error("Malformed {what} '{value}' in {path}")]
    Parse { path: PathBuf, what: &'static str, value: String },

    #[error("Data error: {0}")]
    Data(#[from] CoreError),
}

// The read contract speaks `CoreError`; data errors pass through unchanged so
// shape problems keep their variant.
impl From<SourceError> for CoreError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::Data(e) => e,
            other => CoreError::Source(other.to_string()),
        }
    }
}
