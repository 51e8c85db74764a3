//! Error types for core-level solves.

use ds_core::{AssemblyId, DsError};
use ds_geometry::GeometryError;
use ds_solver::{MarchError, PinError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid geometry for assembly {assembly}: {source}")]
    InvalidGeometry {
        assembly: AssemblyId,
        source: GeometryError,
    },

    #[error("Invalid core layout: {0}")]
    Layout(GeometryError),

    #[error("Invalid core input: {what}")]
    InvalidInput { what: String },

    #[error("Assembly {assembly} march failed: {source}")]
    March {
        assembly: AssemblyId,
        source: MarchError,
    },

    #[error("Duct coupling did not converge after {iterations} passes (max flux change {residual:.3e})")]
    DuctConvergence { iterations: usize, residual: f64 },

    #[error("Flow balancing did not converge after {iterations} rounds (max correction {residual:.3e})")]
    OrificingDivergence {
        iterations: usize,
        residual: f64,
        /// Last assembly flow rates [kg/s].
        flows: Vec<f64>,
    },

    #[error("Pin temperatures failed for assembly {assembly}: {source}")]
    Pin {
        assembly: AssemblyId,
        source: PinError,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Assembly the failure is attributed to, if any.
    pub fn assembly(&self) -> Option<AssemblyId> {
        match self {
            CoreError::InvalidGeometry { assembly, .. }
            | CoreError::March { assembly, .. }
            | CoreError::Pin { assembly, .. } => Some(*assembly),
            _ => None,
        }
    }

    pub fn axial_position(&self) -> Option<f64> {
        match self {
            CoreError::March { source, .. } => source.axial_position(),
            _ => None,
        }
    }
}

pub(crate) fn invalid_input(what: impl Into<String>) -> CoreError {
    CoreError::InvalidInput { what: what.into() }
}

impl From<CoreError> for DsError {
    fn from(err: CoreError) -> Self {
        DsError::Invariant {
            what: err.to_string(),
        }
    }
}
