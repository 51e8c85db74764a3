//! ds-coolant: liquid-metal coolant property models.
//!
//! Properties are functions of temperature only (incompressible liquid).
//! All values are SI: kelvin, kg/m^3, J/kg-K, Pa-s, W/m-K, J/kg.
//!
//! Two models are provided:
//! - [`ConstantCoolant`]: fixed properties, linear enthalpy
//! - [`Sodium`]: temperature-dependent correlations for liquid sodium

pub mod constant;
pub mod error;
pub mod model;
pub mod sodium;

pub use constant::ConstantCoolant;
pub use error::{CoolantError, CoolantResult};
pub use model::{CoolantModel, CoolantProperties};
pub use sodium::Sodium;
