//! Liquid sodium property correlations.
//!
//! Density, heat capacity, viscosity and conductivity follow the
//! Fink-Leibowitz recommendations (ANL/RE-95/2). Enthalpy is the analytic
//! integral of the heat-capacity polynomial measured from the melting point.

use crate::error::{CoolantError, CoolantResult};
use crate::model::CoolantModel;

const T_MELT: f64 = 371.0;
const T_CRIT: f64 = 2503.7;
const MAX_INVERSION_ITER: usize = 50;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sodium;

impl Sodium {
    pub fn new() -> Self {
        Self
    }

    fn check_temperature(t: f64) -> CoolantResult<()> {
        if t.is_finite() && (T_MELT..T_CRIT).contains(&t) {
            Ok(())
        } else {
            Err(CoolantError::OutOfRange {
                model: "sodium",
                temperature: t,
                min: T_MELT,
                max: T_CRIT,
            })
        }
    }

    /// Antiderivative of cp(T) in J/kg.
    fn cp_integral(t: f64) -> f64 {
        1000.0 * (1.6582 * t - 4.2395e-4 * t * t + 1.484_7e-7 * t.powi(3) + 2992.6 / t)
    }
}

impl CoolantModel for Sodium {
    fn name(&self) -> &str {
        "sodium"
    }

    fn density(&self, t: f64) -> CoolantResult<f64> {
        Self::check_temperature(t)?;
        let f = 1.0 - t / T_CRIT;
        Ok(219.0 + 275.32 * f + 511.58 * f.sqrt())
    }

    fn heat_capacity(&self, t: f64) -> CoolantResult<f64> {
        Self::check_temperature(t)?;
        let cp_kj = 1.6582 - 8.4790e-4 * t + 4.4541e-7 * t * t - 2992.6 / (t * t);
        Ok(1000.0 * cp_kj)
    }

    fn viscosity(&self, t: f64) -> CoolantResult<f64> {
        Self::check_temperature(t)?;
        Ok((-6.4406 - 0.3958 * t.ln() + 556.835 / t).exp())
    }

    fn conductivity(&self, t: f64) -> CoolantResult<f64> {
        Self::check_temperature(t)?;
        Ok(124.67 - 0.11381 * t + 5.5226e-5 * t * t - 1.1842e-8 * t.powi(3))
    }

    fn enthalpy(&self, t: f64) -> CoolantResult<f64> {
        Self::check_temperature(t)?;
        Ok(Self::cp_integral(t) - Self::cp_integral(T_MELT))
    }

    fn temperature(&self, h: f64) -> CoolantResult<f64> {
        if !h.is_finite() {
            return Err(CoolantError::InvalidArg {
                what: "enthalpy must be finite",
            });
        }
        // Newton on h(T) - h = 0; cp is the exact derivative.
        let h0 = Self::cp_integral(T_MELT);
        let mut t = T_MELT + h / 1300.0;
        for _ in 0..MAX_INVERSION_ITER {
            let tc = t.clamp(T_MELT, T_CRIT - 1.0);
            let residual = Self::cp_integral(tc) - h0 - h;
            let cp = self.heat_capacity(tc)?;
            let next = tc - residual / cp;
            if (next - tc).abs() < 1e-10 * tc {
                Self::check_temperature(next)?;
                return Ok(next);
            }
            t = next;
        }
        Err(CoolantError::ConvergenceFailed { enthalpy: h })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_at_300c() {
        let na = Sodium::new();
        let props = na.properties(573.15).unwrap();
        assert!((props.density - 880.0).abs() < 5.0, "rho = {}", props.density);
        assert!((props.heat_capacity - 1309.0).abs() < 5.0);
        assert!((props.viscosity - 3.4e-4).abs() < 0.2e-4);
        assert!((props.conductivity - 75.3).abs() < 1.0);
    }

    #[test]
    fn enthalpy_zero_at_melting_point() {
        assert!(Sodium.enthalpy(T_MELT).unwrap().abs() < 1e-9);
    }

    #[test]
    fn enthalpy_derivative_matches_heat_capacity() {
        let na = Sodium;
        let t = 700.0;
        let dt = 1e-3;
        let dh = (na.enthalpy(t + dt).unwrap() - na.enthalpy(t - dt).unwrap()) / (2.0 * dt);
        assert!((dh - na.heat_capacity(t).unwrap()).abs() < 1e-3);
    }

    #[test]
    fn frozen_sodium_is_out_of_range() {
        assert!(matches!(
            Sodium.density(300.0),
            Err(CoolantError::OutOfRange { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn temperature_inverts_enthalpy(t in 380.0_f64..1500.0) {
            let na = Sodium;
            let h = na.enthalpy(t).unwrap();
            let back = na.temperature(h).unwrap();
            prop_assert!((back - t).abs() < 1e-6);
        }
    }
}
