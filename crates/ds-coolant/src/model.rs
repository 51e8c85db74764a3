//! Coolant property model trait.

use crate::error::{CoolantError, CoolantResult};

/// Property bundle evaluated at one temperature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoolantProperties {
    /// Temperature [K]
    pub temperature: f64,
    /// Density [kg/m^3]
    pub density: f64,
    /// Specific heat capacity [J/kg-K]
    pub heat_capacity: f64,
    /// Dynamic viscosity [Pa-s]
    pub viscosity: f64,
    /// Thermal conductivity [W/m-K]
    pub conductivity: f64,
}

impl CoolantProperties {
    pub fn prandtl(&self) -> f64 {
        self.heat_capacity * self.viscosity / self.conductivity
    }
}

/// Temperature-dependent coolant properties.
///
/// Implementations must be thread-safe; assemblies are marched in parallel
/// against one shared model.
pub trait CoolantModel: Send + Sync + std::fmt::Debug {
    /// Model name for logging.
    fn name(&self) -> &str;

    fn density(&self, t: f64) -> CoolantResult<f64>;

    fn heat_capacity(&self, t: f64) -> CoolantResult<f64>;

    fn viscosity(&self, t: f64) -> CoolantResult<f64>;

    fn conductivity(&self, t: f64) -> CoolantResult<f64>;

    /// Specific enthalpy [J/kg] relative to the model's reference state.
    fn enthalpy(&self, t: f64) -> CoolantResult<f64>;

    /// Invert [`CoolantModel::enthalpy`].
    fn temperature(&self, h: f64) -> CoolantResult<f64>;

    /// Evaluate every property at once.
    fn properties(&self, t: f64) -> CoolantResult<CoolantProperties> {
        let props = CoolantProperties {
            temperature: t,
            density: self.density(t)?,
            heat_capacity: self.heat_capacity(t)?,
            viscosity: self.viscosity(t)?,
            conductivity: self.conductivity(t)?,
        };
        validate(&props)?;
        Ok(props)
    }
}

pub(crate) fn validate(props: &CoolantProperties) -> CoolantResult<()> {
    let checks = [
        (props.density, "density"),
        (props.heat_capacity, "heat capacity"),
        (props.viscosity, "viscosity"),
        (props.conductivity, "conductivity"),
    ];
    for (value, what) in checks {
        if !value.is_finite() || value <= 0.0 {
            return Err(CoolantError::NonPhysical { what });
        }
    }
    Ok(())
}
