use indicatif::style::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Technology error: {0}")]
    Technology(#[from] technologies::TechnologyError),

    #[error("Failed to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<TemplateError> for BatchError {
    fn from(error: TemplateError) -> Self {
        BatchError::ProgressBarTemplate(error.to_string())
    }
}
