//! ds-correlations: friction, heat-transfer and mixing correlations for
//! wire-wrapped hexagonal pin bundles.
//!
//! Every correlation is a variant of a closed enum selected at configuration
//! time. Evaluation is pure: identical inputs give identical outputs, and
//! inputs outside a correlation's validated range still produce the
//! extrapolated value together with [`RangeWarning`]s. The caller decides
//! via [`RangePolicy`] whether those warnings are fatal.
//!
//! # Example
//!
//! ```
//! use ds_correlations::{BundleGeometry, CorrelationSet, FlowRegime, LocalFlow};
//!
//! let geometry = BundleGeometry {
//!     pin_diameter: 8.0e-3,
//!     pin_pitch: 9.1e-3,
//!     wire_diameter: 1.0e-3,
//!     wire_pitch: 0.2,
//!     pin_count: 61,
//!     bundle_area: 1.527e-3,
//!     bundle_wetted_perimeter: 1.978,
//!     interior_area: 1.033e-5,
//!     edge_area: 2.07e-5,
//! };
//! let set = CorrelationSet::from_name("cheng-todreas").unwrap();
//! let flow = LocalFlow {
//!     reynolds: 5.0e4,
//!     prandtl: 0.005,
//!     conductivity: 75.0,
//!     hydraulic_diameter: geometry.hydraulic_diameter(),
//! };
//! let regime = FlowRegime::classify(flow.reynolds, &geometry);
//! let result = set.evaluate(regime, &geometry, &flow);
//! assert!(result.value.friction_factor > 0.0);
//! ```

pub mod error;
pub mod friction;
pub mod geometry;
pub mod heat_transfer;
pub mod mixing;
pub mod range;
pub mod regime;
pub mod set;

pub use error::{CorrelationError, EvalResult};
pub use friction::Friction;
pub use geometry::{BundleGeometry, LocalFlow};
pub use heat_transfer::HeatTransfer;
pub use mixing::{Mixing, MixingParameters};
pub use range::{Evaluated, RangePolicy, RangeWarning};
pub use regime::FlowRegime;
pub use set::{CorrelationResult, CorrelationSet};
