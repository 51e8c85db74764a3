//! Nusselt number correlations for liquid-metal bundle flow.

use crate::geometry::{BundleGeometry, LocalFlow};
use crate::range::{Evaluated, check};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HeatTransfer {
    /// `Nu = 7 + 0.025 Pe^0.8`
    Lyon,
    /// `Nu = 5 + 0.025 Pe^0.8`
    SeubanShimazaki,
    /// Mikityuk (2009), fitted to wire-wrapped and bare rod bundles.
    Mikityuk,
    /// `Nu = a + b Pe^c`
    Custom { a: f64, b: f64, c: f64 },
}

impl HeatTransfer {
    pub fn name(&self) -> &'static str {
        match self {
            HeatTransfer::Lyon => "Lyon",
            HeatTransfer::SeubanShimazaki => "Seuban-Shimazaki",
            HeatTransfer::Mikityuk => "Mikityuk",
            HeatTransfer::Custom { .. } => "custom",
        }
    }

    pub fn nusselt(&self, geometry: &BundleGeometry, flow: &LocalFlow) -> Evaluated<f64> {
        let pe = flow.peclet().max(0.0);
        let mut warnings = Vec::new();
        let value = match self {
            HeatTransfer::Lyon => 7.0 + 0.025 * pe.powf(0.8),
            HeatTransfer::SeubanShimazaki => 5.0 + 0.025 * pe.powf(0.8),
            HeatTransfer::Mikityuk => {
                let x = geometry.pitch_to_diameter();
                check(&mut warnings, self.name(), "P/D", x, 1.1, 1.95);
                check(&mut warnings, self.name(), "Pe", pe, 30.0, 5000.0);
                0.047 * (1.0 - (-3.8 * (x - 1.0)).exp()) * (pe.powf(0.77) + 250.0)
            }
            HeatTransfer::Custom { a, b, c } => a + b * pe.powf(*c),
        };
        Evaluated { value, warnings }
    }

    /// Heat transfer coefficient `Nu k / D_h` [W/m^2-K].
    pub fn coefficient(&self, geometry: &BundleGeometry, flow: &LocalFlow) -> Evaluated<f64> {
        self.nusselt(geometry, flow)
            .map(|nu| nu * flow.conductivity / flow.hydraulic_diameter)
    }
}
