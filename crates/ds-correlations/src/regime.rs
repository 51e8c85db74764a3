//! Flow regime classification.
//!
//! Regime boundaries follow Cheng & Todreas (1986): both the laminar and the
//! turbulent limits shift with the pitch-to-diameter ratio.

use crate::geometry::BundleGeometry;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlowRegime {
    Laminar,
    /// `intermittency` runs from 0 at the laminar limit to 1 at the turbulent limit.
    Transition { intermittency: f64 },
    Turbulent,
}

impl FlowRegime {
    /// Reynolds number below which the bundle flow is laminar.
    pub fn laminar_limit(geometry: &BundleGeometry) -> f64 {
        300.0 * 10f64.powf(1.7 * (geometry.pitch_to_diameter() - 1.0))
    }

    /// Reynolds number above which the bundle flow is fully turbulent.
    pub fn turbulent_limit(geometry: &BundleGeometry) -> f64 {
        10_000.0 * 10f64.powf(0.7 * (geometry.pitch_to_diameter() - 1.0))
    }

    pub fn classify(reynolds: f64, geometry: &BundleGeometry) -> Self {
        let re_l = Self::laminar_limit(geometry);
        let re_t = Self::turbulent_limit(geometry);
        if reynolds <= re_l {
            FlowRegime::Laminar
        } else if reynolds >= re_t {
            FlowRegime::Turbulent
        } else {
            let intermittency = (reynolds / re_l).log10() / (re_t / re_l).log10();
            FlowRegime::Transition { intermittency }
        }
    }

    /// Turbulent weight in `[0, 1]`.
    pub fn intermittency(&self) -> f64 {
        match self {
            FlowRegime::Laminar => 0.0,
            FlowRegime::Transition { intermittency } => *intermittency,
            FlowRegime::Turbulent => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fixtures::bundle_61;

    #[test]
    fn limits_grow_with_pitch() {
        let mut g = bundle_61();
        let re_l = FlowRegime::laminar_limit(&g);
        g.pin_pitch *= 1.1;
        assert!(FlowRegime::laminar_limit(&g) > re_l);
    }

    #[test]
    fn classify_all_regimes() {
        let g = bundle_61();
        assert_eq!(FlowRegime::classify(100.0, &g), FlowRegime::Laminar);
        assert_eq!(FlowRegime::classify(5.0e4, &g), FlowRegime::Turbulent);
        match FlowRegime::classify(3000.0, &g) {
            FlowRegime::Transition { intermittency } => {
                assert!(intermittency > 0.0 && intermittency < 1.0)
            }
            other => panic!("expected transition, got {other:?}"),
        }
    }

    #[test]
    fn intermittency_is_continuous_at_limits() {
        let g = bundle_61();
        let re_t = FlowRegime::turbulent_limit(&g);
        let just_below = FlowRegime::classify(re_t * (1.0 - 1e-9), &g);
        assert!((just_below.intermittency() - 1.0).abs() < 1e-6);
    }
}
