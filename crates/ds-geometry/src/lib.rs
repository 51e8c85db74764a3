//! ds-geometry: subchannel topology for wire-wrapped hexagonal bundles.
//!
//! Provides:
//! - Hex pin lattice generation from a [`BundleSpec`]
//! - Incremental [`NetworkBuilder`] with validation (references, pin shares,
//!   connectivity)
//! - Immutable [`SubchannelNetwork`] with CSR gap adjacency, duct faces and a
//!   factorized reduced gap Laplacian
//! - [`CoreLayout`]: assemblies on hex coordinates with neighbor face links
//!
//! # Example
//!
//! ```
//! use ds_core::mm;
//! use ds_geometry::{BundleSpec, SubchannelNetwork};
//!
//! let spec = BundleSpec {
//!     pin_rings: 5,
//!     pin_diameter: mm(8.0),
//!     pin_pitch: mm(9.1),
//!     wire_diameter: mm(1.0),
//!     wire_pitch: mm(200.0),
//!     duct_inner_flat_to_flat: mm(73.2),
//!     duct_wall_thickness: mm(3.0),
//! };
//! let network = SubchannelNetwork::build(&spec).unwrap();
//! assert_eq!(network.pins().len(), 61);
//! assert_eq!(network.subchannels().len(), 126);
//! ```

pub mod builder;
pub mod error;
pub mod hex;
pub mod laplacian;
pub mod layout;
pub mod network;
pub(crate) mod validate;

pub use builder::NetworkBuilder;
pub use error::{GeometryError, GeometryResult};
pub use hex::BundleSpec;
pub use laplacian::ReducedLaplacian;
pub use layout::{CoreLayout, FaceLink, HexPosition};
pub use network::{
    DuctFace, Gap, GapKind, GapLink, Pin, PinGeometry, PinShare, Subchannel, SubchannelKind,
    SubchannelNetwork, WallContact,
};
