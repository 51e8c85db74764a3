//! Bundle friction factor correlations (Darcy form).

use crate::geometry::BundleGeometry;
use crate::range::{Evaluated, check};
use crate::regime::FlowRegime;

/// Friction factor correlation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Friction {
    /// Cheng-Todreas simplified: laminar, transition and turbulent.
    ChengTodreasSimple,
    /// Novendstern: turbulent only.
    Novendstern,
    /// Rehme: turbulent and transition.
    Rehme,
}

impl Friction {
    pub fn name(&self) -> &'static str {
        match self {
            Friction::ChengTodreasSimple => "Cheng-Todreas simplified",
            Friction::Novendstern => "Novendstern",
            Friction::Rehme => "Rehme",
        }
    }

    /// Darcy friction factor at the given Reynolds number.
    pub fn factor(
        &self,
        regime: FlowRegime,
        geometry: &BundleGeometry,
        reynolds: f64,
    ) -> Evaluated<f64> {
        let mut warnings = Vec::new();
        let x = geometry.pitch_to_diameter();
        let hd = geometry.lead_to_diameter();
        let re = reynolds.max(1.0);
        let name = self.name();

        let value = match self {
            Friction::ChengTodreasSimple => {
                check(&mut warnings, name, "P/D", x, 1.025, 1.42);
                check(&mut warnings, name, "H/D", hd, 8.0, 50.0);
                let (c_lam, c_turb) = cheng_todreas_constants(x, hd.max(1.0));
                let f_lam = c_lam / re;
                let f_turb = c_turb / re.powf(0.18);
                match regime {
                    FlowRegime::Laminar => f_lam,
                    FlowRegime::Turbulent => f_turb,
                    FlowRegime::Transition { intermittency } => {
                        f_lam * (1.0 - intermittency).cbrt() + f_turb * intermittency.cbrt()
                    }
                }
            }
            Friction::Novendstern => {
                check(&mut warnings, name, "Re", reynolds, 2600.0, 2.0e5);
                check(&mut warnings, name, "P/D", x, 1.06, 1.42);
                check(&mut warnings, name, "H/D", hd, 8.0, 96.0);
                let hd = hd.max(1.0);
                let multiplier = (1.034 / x.powf(0.124)
                    + 29.7 * x.powf(6.94) * re.powf(0.086) / hd.powf(2.239))
                .powf(0.885);
                multiplier * 0.3164 / re.powf(0.25)
            }
            Friction::Rehme => {
                check(&mut warnings, name, "Re", reynolds, 1000.0, 3.0e5);
                check(&mut warnings, name, "P/D", x, 1.1, 1.42);
                check(&mut warnings, name, "H/D", hd, 8.0, 50.0);
                let d = geometry.pin_diameter;
                let dw = geometry.wire_diameter;
                let wire_term = if geometry.wire_pitch > 0.0 {
                    (7.6 * (d + dw) / geometry.wire_pitch * x * x).powf(2.16)
                } else {
                    0.0
                };
                let f_geom = x.sqrt() + wire_term;
                let perimeter_ratio = geometry.pin_count as f64 * std::f64::consts::PI * (d + dw)
                    / geometry.bundle_wetted_perimeter;
                (64.0 / re * f_geom.sqrt() + 0.0816 / re.powf(0.133) * f_geom.powf(0.9335))
                    * perimeter_ratio
            }
        };

        Evaluated { value, warnings }
    }
}

/// Laminar and turbulent friction constants `(C_fL, C_fT)`.
fn cheng_todreas_constants(x: f64, hd: f64) -> (f64, f64) {
    let c_lam = (-974.6 + 1612.0 * x - 598.5 * x * x) * hd.powf(0.06 - 0.085 * x);
    let log_hd = hd.log10();
    let c_turb = (0.8063 - 0.9022 * log_hd + 0.3526 * log_hd * log_hd)
        * x.powf(9.7)
        * hd.powf(1.78 - 2.0 * x);
    (c_lam, c_turb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fixtures::bundle_61;

    #[test]
    fn cheng_todreas_constants_typical_bundle() {
        let (c_lam, c_turb) = cheng_todreas_constants(1.1375, 25.0);
        assert!((c_lam - 75.3).abs() < 0.5, "C_fL = {c_lam}");
        assert!((c_turb - 0.166).abs() < 0.005, "C_fT = {c_turb}");
    }

    #[test]
    fn turbulent_factor_is_plausible() {
        let g = bundle_61();
        for corr in [
            Friction::ChengTodreasSimple,
            Friction::Novendstern,
            Friction::Rehme,
        ] {
            let f = corr.factor(FlowRegime::Turbulent, &g, 5.0e4);
            assert!(f.value > 0.015 && f.value < 0.04, "{}: {}", corr.name(), f.value);
            assert!(f.warnings.is_empty(), "{}: {:?}", corr.name(), f.warnings);
        }
    }

    #[test]
    fn transition_blend_is_bounded_by_limits() {
        let g = bundle_61();
        let re = 3000.0;
        let regime = FlowRegime::classify(re, &g);
        let lam = Friction::ChengTodreasSimple.factor(FlowRegime::Laminar, &g, re).value;
        let turb = Friction::ChengTodreasSimple.factor(FlowRegime::Turbulent, &g, re).value;
        let blend = Friction::ChengTodreasSimple.factor(regime, &g, re).value;
        assert!(blend >= lam.min(turb));
        assert!(blend <= lam + turb);
    }

    #[test]
    fn novendstern_warns_in_laminar_flow() {
        let g = bundle_61();
        let f = Friction::Novendstern.factor(FlowRegime::Laminar, &g, 500.0);
        assert!(f.value.is_finite());
        assert!(f.warnings.iter().any(|w| w.parameter == "Re"));
    }

    #[test]
    fn tight_lattice_warns_for_cheng_todreas() {
        let mut g = bundle_61();
        g.pin_pitch = 1.01 * g.pin_diameter;
        let f = Friction::ChengTodreasSimple.factor(FlowRegime::Turbulent, &g, 5.0e4);
        assert!(f.warnings.iter().any(|w| w.parameter == "P/D"));
    }
}
