use core_types::CoreError;
use engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error(
        "{metric} of {technology} ({case}, CRP {crp}) differs from the reference in {mismatches} cell(s); \
         first at row '{row}', year {year}: computed {computed}, reference {reference}"
    )]
    ConsistencyMismatch {
        technology: String,
        case: String,
        crp: u32,
        metric: String,
        row: String,
        year: i32,
        computed: f64,
        reference: f64,
        mismatches: usize,
    },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Data error: {0}")]
    Data(#[from] CoreError),
}

impl ValidationError {
    /// Mismatches are reported and the batch carries on; anything else means
    /// the reference could not be read or compared.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, ValidationError::ConsistencyMismatch { .. })
    }
}
