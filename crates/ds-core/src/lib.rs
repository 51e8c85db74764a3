//! ds-core: shared foundation for ductsweep.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (convergence helpers)
//! - ids (compact stable IDs for assemblies, subchannels, gaps and pins)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{DsError, DsResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
