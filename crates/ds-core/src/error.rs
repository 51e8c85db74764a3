use thiserror::Error;

pub type DsResult<T> = Result<T, DsError>;

/// Common error every crate's error converts into.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DsError {
    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}
