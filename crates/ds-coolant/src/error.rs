//! Coolant property errors.

use ds_core::DsError;
use thiserror::Error;

/// Result type for coolant property evaluations.
pub type CoolantResult<T> = Result<T, CoolantError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoolantError {
    /// Temperature outside the range where the correlations hold.
    #[error("{model}: temperature {temperature:.2} K outside valid range [{min:.1}, {max:.1}] K")]
    OutOfRange {
        model: &'static str,
        temperature: f64,
        min: f64,
        max: f64,
    },

    /// Correlation produced a non-physical value.
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Enthalpy to temperature inversion did not converge.
    #[error("Temperature inversion did not converge for h = {enthalpy:.1} J/kg")]
    ConvergenceFailed { enthalpy: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

impl From<CoolantError> for DsError {
    fn from(err: CoolantError) -> Self {
        DsError::Invariant {
            what: err.to_string(),
        }
    }
}
