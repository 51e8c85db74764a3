//! Axial marching solver for one wire-wrapped assembly.
//!
//! At each axial step the total assembly flow is split so every subchannel
//! sees the same pressure drop, diversion cross-flow carries the change in
//! subchannel flows, and an explicit energy balance adds pin heat, duct heat,
//! conduction, turbulent mixing and perimeter swirl. [`AxialMarch`] yields
//! the nodes lazily; [`march_assembly`] collects them into an
//! [`AxialProfile`].

pub mod energy;
pub mod error;
pub mod march;
pub mod mesh;
pub mod pin;
pub mod power;
pub mod split;

pub use energy::{Exchange, StepBalance, StepResult};
pub use error::{MarchError, MarchResult};
pub use march::{
    AssemblyInput, AxialMarch, AxialNode, AxialProfile, DuctBoundary, EnergyBalance, MarchConfig,
    PeakTemperature, PressureDrop, march_assembly, stability_limit,
};
pub use mesh::{AxialMesh, stable_step};
pub use pin::{
    Conductivity, FuelRegion, MetallicFuel, PinError, PinModel, PinProfile, PinResult,
    PinTemperatures, pin_temperatures,
};
pub use power::{AssemblyPower, AxialPowerShape, PowerRegion};
pub use split::{Split, SplitProblem, diversion};
