//! Error types for the axial march.

use ds_coolant::CoolantError;
use ds_core::{DsError, SubchannelId};
use ds_correlations::CorrelationError;
use thiserror::Error;

/// Node-level failures. Any of these aborts the assembly pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarchError {
    #[error(
        "Flow split did not converge at z = {z:.4} m after {iterations} iterations (residual {residual:.3e})"
    )]
    FlowDivergence {
        z: f64,
        iterations: usize,
        residual: f64,
    },

    #[error("Subchannel {subchannel} would need down-flow at z = {z:.4} m")]
    NegativeFlow { z: f64, subchannel: SubchannelId },

    #[error("Correlation error at z = {z:.4} m: {source}")]
    Correlation { z: f64, source: CorrelationError },

    #[error("Coolant property error at z = {z:.4} m: {source}")]
    Coolant { z: f64, source: CoolantError },

    #[error("Invalid march input: {what}")]
    InvalidInput { what: String },
}

pub type MarchResult<T> = Result<T, MarchError>;

impl MarchError {
    /// Axial position where the failure happened, if it is node-level.
    pub fn axial_position(&self) -> Option<f64> {
        match self {
            MarchError::FlowDivergence { z, .. }
            | MarchError::NegativeFlow { z, .. }
            | MarchError::Correlation { z, .. }
            | MarchError::Coolant { z, .. } => Some(*z),
            MarchError::InvalidInput { .. } => None,
        }
    }

    pub fn iterations(&self) -> Option<usize> {
        match self {
            MarchError::FlowDivergence { iterations, .. } => Some(*iterations),
            _ => None,
        }
    }
}

pub(crate) fn invalid_input(what: impl Into<String>) -> MarchError {
    MarchError::InvalidInput { what: what.into() }
}

pub(crate) trait AtHeight<T> {
    fn at(self, z: f64) -> MarchResult<T>;
}

impl<T> AtHeight<T> for Result<T, CoolantError> {
    fn at(self, z: f64) -> MarchResult<T> {
        self.map_err(|source| MarchError::Coolant { z, source })
    }
}

impl<T> AtHeight<T> for Result<T, CorrelationError> {
    fn at(self, z: f64) -> MarchResult<T> {
        self.map_err(|source| MarchError::Correlation { z, source })
    }
}

impl From<MarchError> for DsError {
    fn from(err: MarchError) -> Self {
        DsError::Invariant {
            what: err.to_string(),
        }
    }
}
