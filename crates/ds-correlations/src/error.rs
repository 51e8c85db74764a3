//! Correlation errors.

use crate::range::RangeWarning;
use ds_core::DsError;
use thiserror::Error;

pub type EvalResult<T> = Result<T, CorrelationError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrelationError {
    /// An input fell outside the validated range under a strict policy.
    #[error("{0}")]
    OutOfRange(RangeWarning),

    #[error("Unknown correlation set: {name}")]
    UnknownSet { name: String },

    #[error("Invalid correlation input: {what}")]
    InvalidInput { what: &'static str },
}

impl From<CorrelationError> for DsError {
    fn from(err: CorrelationError) -> Self {
        DsError::Invariant {
            what: err.to_string(),
        }
    }
}
