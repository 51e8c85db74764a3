//! Geometry-specific error types.

use ds_core::{DsError, GapId, PinId, SubchannelId};

pub type GeometryResult<T> = Result<T, GeometryError>;

/// Geometry construction and validation errors.
///
/// Every variant is an invalid-geometry condition; all of them are raised
/// before any axial march starts.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Bundle or duct dimensions that cannot form a valid lattice.
    InvalidGeometry { what: String },

    /// A subchannel with non-positive or non-finite area or perimeter.
    BadSubchannel {
        subchannel: SubchannelId,
        what: &'static str,
        value: f64,
    },

    /// A gap with non-positive width or length.
    BadGap {
        gap: GapId,
        what: &'static str,
        value: f64,
    },

    /// A gap, share or contact refers to a subchannel that doesn't exist.
    DanglingSubchannel {
        what: &'static str,
        subchannel: SubchannelId,
    },

    /// A pin share refers to a pin that doesn't exist.
    DanglingPin { pin: PinId },

    /// Two gaps connect the same pair of subchannels, or a gap loops back.
    DuplicateGap {
        from: SubchannelId,
        to: SubchannelId,
    },

    /// A pin's power fractions don't sum to one.
    PinShareSum { pin: PinId, sum: f64 },

    /// Subchannels are not ordered interior, edge, corner.
    Ordering { subchannel: SubchannelId },

    /// Consecutive perimeter subchannels without a perimeter gap between them.
    BrokenPerimeter {
        from: SubchannelId,
        to: SubchannelId,
    },

    /// Not every subchannel is reachable through gaps.
    Disconnected { reachable: usize, total: usize },

    /// Two assemblies placed on the same core position.
    DuplicatePosition { q: i32, r: i32 },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::InvalidGeometry { what } => write!(f, "Invalid geometry: {}", what),
            GeometryError::BadSubchannel {
                subchannel,
                what,
                value,
            } => write!(f, "Subchannel {} has invalid {}: {}", subchannel, what, value),
            GeometryError::BadGap { gap, what, value } => {
                write!(f, "Gap {} has invalid {}: {}", gap, what, value)
            }
            GeometryError::DanglingSubchannel { what, subchannel } => {
                write!(f, "{} refers to non-existent subchannel {}", what, subchannel)
            }
            GeometryError::DanglingPin { pin } => {
                write!(f, "Pin share refers to non-existent pin {}", pin)
            }
            GeometryError::DuplicateGap { from, to } => {
                write!(f, "Duplicate or self gap between subchannels {} and {}", from, to)
            }
            GeometryError::PinShareSum { pin, sum } => {
                write!(f, "Power fractions of pin {} sum to {} (expected 1)", pin, sum)
            }
            GeometryError::Ordering { subchannel } => write!(
                f,
                "Subchannel {} breaks the interior, edge, corner ordering",
                subchannel
            ),
            GeometryError::BrokenPerimeter { from, to } => write!(
                f,
                "No perimeter gap between consecutive subchannels {} and {}",
                from, to
            ),
            GeometryError::Disconnected { reachable, total } => write!(
                f,
                "Subchannel graph is disconnected: {} of {} subchannels reachable",
                reachable, total
            ),
            GeometryError::DuplicatePosition { q, r } => {
                write!(f, "Core position ({}, {}) is occupied twice", q, r)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

impl From<GeometryError> for DsError {
    fn from(err: GeometryError) -> Self {
        DsError::Invariant {
            what: err.to_string(),
        }
    }
}

pub(crate) fn invalid(what: impl Into<String>) -> GeometryError {
    GeometryError::InvalidGeometry { what: what.into() }
}
