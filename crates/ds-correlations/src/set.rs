//! Correlation sets: the single evaluate capability used by the solver.

use crate::error::CorrelationError;
use crate::friction::Friction;
use crate::geometry::{BundleGeometry, LocalFlow};
use crate::heat_transfer::HeatTransfer;
use crate::mixing::{Mixing, MixingParameters};
use crate::range::Evaluated;
use crate::regime::FlowRegime;

/// Output of one correlation evaluation. Never cached across axial nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrelationResult {
    pub regime: FlowRegime,
    /// Darcy friction factor.
    pub friction_factor: f64,
    pub nusselt: f64,
    /// W/m^2-K
    pub heat_transfer_coefficient: f64,
    pub mixing: MixingParameters,
}

/// Friction, heat transfer and mixing correlations chosen together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrelationSet {
    pub friction: Friction,
    pub heat_transfer: HeatTransfer,
    pub mixing: Mixing,
}

impl Default for CorrelationSet {
    fn default() -> Self {
        Self::cheng_todreas()
    }
}

impl CorrelationSet {
    /// Names accepted by [`CorrelationSet::from_name`].
    pub const NAMES: [&'static str; 3] = ["cheng-todreas", "novendstern", "rehme"];

    pub fn cheng_todreas() -> Self {
        Self {
            friction: Friction::ChengTodreasSimple,
            heat_transfer: HeatTransfer::Mikityuk,
            mixing: Mixing::ChengTodreas,
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CorrelationError> {
        let friction = match name.trim().to_ascii_lowercase().as_str() {
            "cheng-todreas" | "cts" => return Ok(Self::cheng_todreas()),
            "novendstern" => Friction::Novendstern,
            "rehme" => Friction::Rehme,
            _ => {
                return Err(CorrelationError::UnknownSet {
                    name: name.to_string(),
                });
            }
        };
        let heat_transfer = match friction {
            Friction::Rehme => HeatTransfer::SeubanShimazaki,
            _ => HeatTransfer::Lyon,
        };
        Ok(Self {
            friction,
            heat_transfer,
            mixing: Mixing::ChengTodreas,
        })
    }

    pub fn with_heat_transfer(mut self, heat_transfer: HeatTransfer) -> Self {
        self.heat_transfer = heat_transfer;
        self
    }

    pub fn with_mixing(mut self, mixing: Mixing) -> Self {
        self.mixing = mixing;
        self
    }

    /// Evaluate every correlation in the set for one local state.
    pub fn evaluate(
        &self,
        regime: FlowRegime,
        geometry: &BundleGeometry,
        flow: &LocalFlow,
    ) -> Evaluated<CorrelationResult> {
        let friction = self.friction.factor(regime, geometry, flow.reynolds);
        let nusselt = self.heat_transfer.nusselt(geometry, flow);
        let mixing = self.mixing.parameters(regime, geometry);

        let mut warnings = friction.warnings;
        warnings.extend(nusselt.warnings);
        warnings.extend(mixing.warnings);

        Evaluated {
            value: CorrelationResult {
                regime,
                friction_factor: friction.value,
                nusselt: nusselt.value,
                heat_transfer_coefficient: nusselt.value * flow.conductivity
                    / flow.hydraulic_diameter,
                mixing: mixing.value,
            },
            warnings,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::geometry::fixtures::bundle_61;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn evaluation_is_idempotent(
            reynolds in 50.0_f64..3.0e5,
            prandtl in 0.003_f64..0.02,
            pitch_ratio in 1.02_f64..1.45,
            set_index in 0_usize..3,
        ) {
            let mut g = bundle_61();
            g.pin_pitch = pitch_ratio * g.pin_diameter;
            let set = CorrelationSet::from_name(CorrelationSet::NAMES[set_index]).unwrap();
            let flow = LocalFlow {
                reynolds,
                prandtl,
                conductivity: 70.0,
                hydraulic_diameter: g.hydraulic_diameter(),
            };
            let regime = FlowRegime::classify(reynolds, &g);
            let first = set.evaluate(regime, &g, &flow);
            let second = set.evaluate(regime, &g, &flow);
            prop_assert_eq!(first.value.friction_factor.to_bits(), second.value.friction_factor.to_bits());
            prop_assert_eq!(first.value.nusselt.to_bits(), second.value.nusselt.to_bits());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn turbulent_friction_decreases_with_reynolds(re in 1.5e4_f64..2.0e5) {
            let g = bundle_61();
            let f = |re: f64| Friction::ChengTodreasSimple.factor(FlowRegime::Turbulent, &g, re).value;
            prop_assert!(f(re * 1.1) < f(re));
        }
    }
}
