//! Constant-property coolant.

use crate::error::{CoolantError, CoolantResult};
use crate::model::CoolantModel;

/// Coolant with fixed properties and `h = cp * (T - T_ref)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantCoolant {
    pub density: f64,
    pub heat_capacity: f64,
    pub viscosity: f64,
    pub conductivity: f64,
    /// Temperature where enthalpy is zero [K].
    pub reference_temperature: f64,
}

impl ConstantCoolant {
    pub fn new(density: f64, heat_capacity: f64, viscosity: f64, conductivity: f64) -> Self {
        Self {
            density,
            heat_capacity,
            viscosity,
            conductivity,
            reference_temperature: 273.15,
        }
    }

    fn check_temperature(&self, t: f64) -> CoolantResult<()> {
        if t.is_finite() && t > 0.0 {
            Ok(())
        } else {
            Err(CoolantError::OutOfRange {
                model: "constant",
                temperature: t,
                min: 0.0,
                max: f64::INFINITY,
            })
        }
    }
}

impl CoolantModel for ConstantCoolant {
    fn name(&self) -> &str {
        "constant"
    }

    fn density(&self, t: f64) -> CoolantResult<f64> {
        self.check_temperature(t)?;
        Ok(self.density)
    }

    fn heat_capacity(&self, t: f64) -> CoolantResult<f64> {
        self.check_temperature(t)?;
        Ok(self.heat_capacity)
    }

    fn viscosity(&self, t: f64) -> CoolantResult<f64> {
        self.check_temperature(t)?;
        Ok(self.viscosity)
    }

    fn conductivity(&self, t: f64) -> CoolantResult<f64> {
        self.check_temperature(t)?;
        Ok(self.conductivity)
    }

    fn enthalpy(&self, t: f64) -> CoolantResult<f64> {
        self.check_temperature(t)?;
        Ok(self.heat_capacity * (t - self.reference_temperature))
    }

    fn temperature(&self, h: f64) -> CoolantResult<f64> {
        if !h.is_finite() {
            return Err(CoolantError::InvalidArg {
                what: "enthalpy must be finite",
            });
        }
        let t = self.reference_temperature + h / self.heat_capacity;
        self.check_temperature(t)?;
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enthalpy_inverts_exactly() {
        let c = ConstantCoolant::new(850.0, 1270.0, 2.5e-4, 65.0);
        let h = c.enthalpy(623.15).unwrap();
        assert!((c.temperature(h).unwrap() - 623.15).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_positive_temperature() {
        let c = ConstantCoolant::new(850.0, 1270.0, 2.5e-4, 65.0);
        assert!(c.density(-1.0).is_err());
        assert!(c.temperature(-1e9).is_err());
    }
}
