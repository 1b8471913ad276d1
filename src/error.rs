use thiserror::Error;

/// Recoverable errors raised by the recognition pipeline.
///
/// Stage-count invariants in the tuning controller are not represented here:
/// they panic.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("expected {expected} input dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("input vector is empty")]
    EmptyInput,

    #[error("classifier has not been trained")]
    NotTrained,

    #[error("no labelled training samples")]
    NoTrainingData,

    #[error("post-processing slot already holds a stage")]
    SlotOccupied,

    #[error("no post-processing stage at index {0}")]
    NoSuchStage(usize),
}

/// Errors raised when the host UI writes to the tuneable registry.
#[derive(Debug, Error, PartialEq)]
pub enum TuneableError {
    #[error("no tuneable at index {0}")]
    UnknownIndex(usize),

    #[error("tuneable '{name}' holds a {expected} value, got {actual}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}
