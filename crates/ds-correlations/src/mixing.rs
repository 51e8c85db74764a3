//! Wire-wrap mixing parameters.
//!
//! Cheng & Todreas (1986) give a dimensionless eddy diffusivity for
//! interior gaps and a swirl velocity ratio for the perimeter, both scaled
//! by the wire projection area and the helix angle.

use crate::geometry::BundleGeometry;
use crate::range::{Evaluated, check};
use crate::regime::FlowRegime;
use std::f64::consts::PI;

/// Dimensionless mixing parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MixingParameters {
    /// Eddy diffusivity scaled by bundle velocity and hydraulic diameter.
    pub eddy: f64,
    /// Perimeter swirl velocity over edge-subchannel axial velocity.
    pub swirl: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mixing {
    ChengTodreas,
    /// No turbulent mixing or swirl; conduction only.
    None,
}

impl Mixing {
    pub fn name(&self) -> &'static str {
        match self {
            Mixing::ChengTodreas => "Cheng-Todreas mixing",
            Mixing::None => "no mixing",
        }
    }

    pub fn parameters(
        &self,
        regime: FlowRegime,
        geometry: &BundleGeometry,
    ) -> Evaluated<MixingParameters> {
        match self {
            Mixing::None => Evaluated::clean(MixingParameters::default()),
            Mixing::ChengTodreas => {
                let mut warnings = Vec::new();
                check(
                    &mut warnings,
                    self.name(),
                    "P/D",
                    geometry.pitch_to_diameter(),
                    1.025,
                    1.42,
                );
                check(
                    &mut warnings,
                    self.name(),
                    "H/D",
                    geometry.lead_to_diameter(),
                    8.0,
                    50.0,
                );

                let d = geometry.pin_diameter;
                let dw = geometry.wire_diameter;
                let tan = geometry.wire_tangent();
                let ar1 = PI * dw * (d + dw) / 6.0;
                let ar2 = PI * dw * (d + dw) / 4.0;
                let eddy_scale = (ar1 / geometry.interior_area).sqrt() * tan;
                let swirl_scale = (ar2 / geometry.edge_area).sqrt() * tan;

                let weight = match regime {
                    FlowRegime::Laminar => 0.0,
                    FlowRegime::Turbulent => 1.0,
                    FlowRegime::Transition { intermittency } => intermittency.powf(2.0 / 3.0),
                };
                let blend = |lam: f64, turb: f64| lam + (turb - lam) * weight;

                Evaluated {
                    value: MixingParameters {
                        eddy: blend(0.077, 0.14) * eddy_scale,
                        swirl: blend(0.413, 0.75) * swirl_scale,
                    },
                    warnings,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fixtures::bundle_61;

    #[test]
    fn turbulent_mixing_exceeds_laminar() {
        let g = bundle_61();
        let lam = Mixing::ChengTodreas.parameters(FlowRegime::Laminar, &g).value;
        let turb = Mixing::ChengTodreas.parameters(FlowRegime::Turbulent, &g).value;
        assert!(turb.eddy > lam.eddy);
        assert!(turb.swirl > lam.swirl);
        assert!(turb.eddy > 0.005 && turb.eddy < 0.05, "eddy = {}", turb.eddy);
    }

    #[test]
    fn bare_bundle_has_no_wire_mixing() {
        let mut g = bundle_61();
        g.wire_pitch = 0.0;
        let p = Mixing::ChengTodreas.parameters(FlowRegime::Turbulent, &g).value;
        assert_eq!(p.eddy, 0.0);
        assert_eq!(p.swirl, 0.0);
    }

    #[test]
    fn none_is_zero() {
        let g = bundle_61();
        let p = Mixing::None.parameters(FlowRegime::Turbulent, &g);
        assert_eq!(p.value, MixingParameters::default());
        assert!(p.warnings.is_empty());
    }
}
