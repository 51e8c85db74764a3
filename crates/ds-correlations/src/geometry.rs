//! Inputs shared by all correlations.

use std::f64::consts::PI;

/// Bundle-level geometry in SI units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BundleGeometry {
    pub pin_diameter: f64,
    pub pin_pitch: f64,
    pub wire_diameter: f64,
    /// Axial lead of the wire wrap.
    pub wire_pitch: f64,
    pub pin_count: usize,
    /// Total coolant flow area.
    pub bundle_area: f64,
    /// Total wetted perimeter (pins, wires and duct).
    pub bundle_wetted_perimeter: f64,
    /// Flow area of one interior subchannel.
    pub interior_area: f64,
    /// Flow area of one edge subchannel.
    pub edge_area: f64,
}

impl BundleGeometry {
    /// P/D
    pub fn pitch_to_diameter(&self) -> f64 {
        self.pin_pitch / self.pin_diameter
    }

    /// H/D
    pub fn lead_to_diameter(&self) -> f64 {
        self.wire_pitch / self.pin_diameter
    }

    pub fn hydraulic_diameter(&self) -> f64 {
        4.0 * self.bundle_area / self.bundle_wetted_perimeter
    }

    /// Tangent of the wire-wrap helix angle.
    pub fn wire_tangent(&self) -> f64 {
        if self.wire_pitch <= 0.0 {
            return 0.0;
        }
        PI * (self.pin_diameter + self.wire_diameter) / self.wire_pitch
    }

    /// Cosine of the wire-wrap helix angle.
    pub fn wire_cosine(&self) -> f64 {
        let tan = self.wire_tangent();
        1.0 / (1.0 + tan * tan).sqrt()
    }
}

/// Local flow state at which a correlation is evaluated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalFlow {
    pub reynolds: f64,
    pub prandtl: f64,
    /// Coolant thermal conductivity [W/m-K].
    pub conductivity: f64,
    /// Hydraulic diameter of the channel being evaluated [m].
    pub hydraulic_diameter: f64,
}

impl LocalFlow {
    pub fn peclet(&self) -> f64 {
        self.reynolds * self.prandtl
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios() {
        let g = fixtures::bundle_61();
        assert!((g.pitch_to_diameter() - 1.1375).abs() < 1e-12);
        assert!((g.lead_to_diameter() - 25.0).abs() < 1e-12);
        assert!((g.hydraulic_diameter() - 3.088e-3).abs() < 1e-5);
        assert!(g.wire_cosine() > 0.98 && g.wire_cosine() < 1.0);
    }

    #[test]
    fn bare_bundle_has_no_helix() {
        let mut g = fixtures::bundle_61();
        g.wire_pitch = 0.0;
        assert_eq!(g.wire_tangent(), 0.0);
        assert_eq!(g.wire_cosine(), 1.0);
    }
}
