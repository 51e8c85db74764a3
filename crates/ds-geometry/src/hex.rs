//! Hexagonal wire-wrapped bundle generator.
//!
//! Pins sit on a triangular lattice of `pin_rings` rings. Interior
//! subchannels are the lattice triangles, edge subchannels lie between two
//! adjacent perimeter pins and the duct, corner subchannels wrap the six
//! corner pins. Pin and wire cross-sections are split among subchannels by
//! the angle each subchannel subtends (1/6 interior, 1/4 edge, 1/6 corner).

use std::collections::BTreeMap;
use std::f64::consts::PI;

use ds_core::{Length, PinId, SubchannelId};

use crate::builder::NetworkBuilder;
use crate::error::{GeometryResult, invalid};
use crate::layout::HexPosition;
use crate::network::{FACES, GapKind, PinGeometry, SubchannelKind, SubchannelNetwork};

const SQRT3: f64 = 1.732_050_807_568_877_2;

/// Dimensions of one ducted pin bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleSpec {
    /// Pin rings including the center pin.
    pub pin_rings: usize,
    pub pin_diameter: Length,
    pub pin_pitch: Length,
    pub wire_diameter: Length,
    /// Axial lead of the wire wrap.
    pub wire_pitch: Length,
    pub duct_inner_flat_to_flat: Length,
    pub duct_wall_thickness: Length,
}

impl BundleSpec {
    pub fn pin_count(&self) -> usize {
        let n = self.pin_rings;
        if n == 0 { 0 } else { 3 * n * (n - 1) + 1 }
    }

    /// Distance from a perimeter pin surface to the duct wall [m].
    pub fn edge_clearance(&self) -> f64 {
        let n = self.pin_rings.saturating_sub(1) as f64;
        self.duct_inner_flat_to_flat.value / 2.0
            - n * self.pin_pitch.value * SQRT3 / 2.0
            - self.pin_diameter.value / 2.0
    }

    pub fn outer_flat_to_flat(&self) -> f64 {
        self.duct_inner_flat_to_flat.value + 2.0 * self.duct_wall_thickness.value
    }

    /// Inner width of one duct face [m].
    pub fn face_length(&self) -> f64 {
        self.duct_inner_flat_to_flat.value / SQRT3
    }

    pub fn pin_geometry(&self) -> PinGeometry {
        PinGeometry {
            diameter: self.pin_diameter.value,
            pitch: self.pin_pitch.value,
            wire_diameter: self.wire_diameter.value,
            wire_pitch: self.wire_pitch.value,
        }
    }

    pub fn validate(&self) -> GeometryResult<()> {
        let d = self.pin_diameter.value;
        let p = self.pin_pitch.value;
        let dw = self.wire_diameter.value;
        let h = self.wire_pitch.value;
        let dims = [
            ("pin diameter", d),
            ("pin pitch", p),
            ("wire diameter", dw),
            ("wire pitch", h),
            ("duct flat-to-flat", self.duct_inner_flat_to_flat.value),
            ("duct wall thickness", self.duct_wall_thickness.value),
        ];
        for (what, value) in dims {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{what} must be finite and >= 0, got {value}")));
            }
        }

        if self.pin_rings < 2 {
            return Err(invalid(format!(
                "bundle needs at least 2 pin rings, got {}",
                self.pin_rings
            )));
        }
        if d <= 0.0 {
            return Err(invalid("pin diameter must be positive"));
        }
        if p <= d {
            return Err(invalid(format!("pin pitch {p} must exceed pin diameter {d}")));
        }
        if dw > p - d + 1e-12 {
            return Err(invalid(format!(
                "wire diameter {dw} does not fit the pin gap {}",
                p - d
            )));
        }
        if dw > 0.0 && h <= 0.0 {
            return Err(invalid("wire-wrapped pins need a positive wire pitch"));
        }
        if self.duct_wall_thickness.value <= 0.0 {
            return Err(invalid("duct wall thickness must be positive"));
        }
        let clearance = self.edge_clearance();
        if clearance <= 0.0 {
            return Err(invalid(format!(
                "pins do not fit inside the duct (edge clearance {clearance})"
            )));
        }
        Ok(())
    }
}

struct Areas {
    interior: (f64, f64),
    edge: (f64, f64),
    corner: (f64, f64),
}

/// `(area, wetted perimeter)` per subchannel kind.
fn subchannel_areas(spec: &BundleSpec) -> Areas {
    let d = spec.pin_diameter.value;
    let p = spec.pin_pitch.value;
    let dw = spec.wire_diameter.value;
    let h = spec.wire_pitch.value;
    let c = d / 2.0 + spec.edge_clearance();

    let cos = if h > 0.0 {
        h / (h * h + (PI * (d + dw)).powi(2)).sqrt()
    } else {
        1.0
    };
    let pin = PI * d * d / 4.0;
    let wire = PI * dw * dw / 4.0;
    let pin_perimeter = PI * d;
    let wire_perimeter = PI * dw / cos;

    Areas {
        interior: (
            SQRT3 / 4.0 * p * p - (pin + wire) / 2.0,
            (pin_perimeter + wire_perimeter) / 2.0,
        ),
        edge: (
            p * c - (pin + wire) / 2.0,
            p + (pin_perimeter + wire_perimeter) / 2.0,
        ),
        corner: (
            c * c / SQRT3 - (pin + wire) / 6.0,
            (pin_perimeter + wire_perimeter) / 6.0 + 2.0 * c / SQRT3,
        ),
    }
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

fn unit(angle_deg: f64) -> [f64; 2] {
    let a = angle_deg.to_radians();
    [a.cos(), a.sin()]
}

fn pair(a: PinId, b: PinId) -> (PinId, PinId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl SubchannelNetwork {
    /// Generate and validate the subchannel network of a hex bundle.
    pub fn build(spec: &BundleSpec) -> GeometryResult<Self> {
        spec.validate()?;

        let p = spec.pin_pitch.value;
        let d = spec.pin_diameter.value;
        let clearance = spec.edge_clearance();
        let c = d / 2.0 + clearance;
        let radius = (spec.pin_rings - 1) as i32;
        let areas = subchannel_areas(spec);

        let mut builder =
            NetworkBuilder::new(spec.pin_geometry()).with_duct_faces(spec.face_length());

        let mut pins = BTreeMap::new();
        let mut xy = Vec::with_capacity(spec.pin_count());
        for pos in HexPosition::within(radius as u32) {
            let at = pos.cartesian(p);
            pins.insert(pos, builder.add_pin(at));
            xy.push(at);
        }
        let pin_at = |pos: HexPosition| {
            pins.get(&pos)
                .copied()
                .ok_or_else(|| invalid(format!("no pin at lattice position {pos:?}")))
        };

        let mut centroids: Vec<[f64; 2]> = Vec::new();
        let mut borders: BTreeMap<(PinId, PinId), Vec<SubchannelId>> = BTreeMap::new();

        // Interior: up and down triangles fully inside the lattice.
        let (e, n, ne) = (
            HexPosition::new(1, 0),
            HexPosition::new(0, 1),
            HexPosition::new(1, 1),
        );
        for q in -radius..=radius {
            for r in -radius..=radius {
                let at = HexPosition::new(q, r);
                for tri in [[at, at + e, at + n], [at + e, at + n, at + ne]] {
                    if tri.iter().any(|v| v.ring() > radius as u32) {
                        continue;
                    }
                    let ids = [pin_at(tri[0])?, pin_at(tri[1])?, pin_at(tri[2])?];
                    let centroid = [
                        ids.iter().map(|i| xy[i.idx()][0]).sum::<f64>() / 3.0,
                        ids.iter().map(|i| xy[i.idx()][1]).sum::<f64>() / 3.0,
                    ];
                    let (area, wp) = areas.interior;
                    let sc = builder.add_subchannel(SubchannelKind::Interior, area, wp, centroid);
                    centroids.push(centroid);
                    for id in ids {
                        builder.add_pin_share(id, sc, 1.0 / 6.0);
                    }
                    for (a, b) in [(0, 1), (1, 2), (0, 2)] {
                        borders.entry(pair(ids[a], ids[b])).or_default().push(sc);
                    }
                }
            }
        }

        // Perimeter sides: side k runs from corner pin k to corner pin k + 1.
        let mut sides: Vec<Vec<SubchannelId>> = Vec::with_capacity(FACES);
        for k in 0..FACES {
            let corner = HexPosition::DIRECTIONS[k].scale(radius);
            let step = HexPosition::DIRECTIONS[(k + 2) % FACES];
            let normal = unit(60.0 * k as f64 + 30.0);
            let mut side = Vec::with_capacity(radius as usize);
            for j in 0..radius {
                let a = pin_at(corner + step.scale(j))?;
                let b = pin_at(corner + step.scale(j + 1))?;
                let (pa, pb) = (xy[a.idx()], xy[b.idx()]);
                let centroid = [
                    (pa[0] + pb[0]) / 2.0 + normal[0] * c / 2.0,
                    (pa[1] + pb[1]) / 2.0 + normal[1] * c / 2.0,
                ];
                let (area, wp) = areas.edge;
                let sc = builder.add_subchannel(SubchannelKind::Edge, area, wp, centroid);
                centroids.push(centroid);
                builder.add_pin_share(a, sc, 0.25);
                builder.add_pin_share(b, sc, 0.25);
                builder.add_wall_contact(sc, k, p);
                borders.entry(pair(a, b)).or_default().push(sc);
                side.push(sc);
            }
            sides.push(side);
        }

        let mut corners = Vec::with_capacity(FACES);
        for k in 0..FACES {
            let pin = pin_at(HexPosition::DIRECTIONS[k].scale(radius))?;
            let radial = unit(60.0 * k as f64);
            let offset = 7.0 * c / (6.0 * SQRT3);
            let at = xy[pin.idx()];
            let centroid = [at[0] + radial[0] * offset, at[1] + radial[1] * offset];
            let (area, wp) = areas.corner;
            let sc = builder.add_subchannel(SubchannelKind::Corner, area, wp, centroid);
            centroids.push(centroid);
            builder.add_pin_share(pin, sc, 1.0 / 6.0);
            builder.add_wall_contact(sc, (k + FACES - 1) % FACES, c / SQRT3);
            builder.add_wall_contact(sc, k, c / SQRT3);
            corners.push(sc);
        }

        // Pin-to-pin gaps between the two subchannels sharing a pin pair.
        for shared in borders.values() {
            if let [a, b] = shared.as_slice() {
                let kind = if *b < sides[0][0] {
                    GapKind::InteriorInterior
                } else {
                    GapKind::InteriorEdge
                };
                let length = distance(centroids[a.idx()], centroids[b.idx()]);
                builder.add_gap(*a, *b, kind, p - d, length);
            }
        }

        // Perimeter gaps along the duct, in swirl order.
        let mut cycle = Vec::with_capacity(FACES * (radius as usize + 1));
        for k in 0..FACES {
            cycle.push(corners[k]);
            cycle.extend(sides[k].iter().copied());
        }
        for j in 0..cycle.len() {
            let (from, to) = (cycle[j], cycle[(j + 1) % cycle.len()]);
            let length = distance(centroids[from.idx()], centroids[to.idx()]);
            builder.add_gap(from, to, GapKind::Perimeter, clearance, length);
        }
        builder.set_perimeter_cycle(cycle);

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_core::mm;

    fn spec(rings: usize) -> BundleSpec {
        BundleSpec {
            pin_rings: rings,
            pin_diameter: mm(8.0),
            pin_pitch: mm(9.1),
            wire_diameter: mm(1.0),
            wire_pitch: mm(200.0),
            duct_inner_flat_to_flat: mm(73.2),
            duct_wall_thickness: mm(3.0),
        }
    }

    #[test]
    fn clearance_for_61_pins() {
        let s = spec(5);
        assert_eq!(s.pin_count(), 61);
        assert!((s.edge_clearance() - 1.0767e-3).abs() < 1e-6);
    }

    #[test]
    fn kind_areas_match_hand_values() {
        let a = subchannel_areas(&spec(5));
        assert!((a.interior.0 - 10.332e-6).abs() < 1e-8, "{}", a.interior.0);
        assert!((a.edge.0 - 20.673e-6).abs() < 1e-8, "{}", a.edge.0);
        assert!((a.corner.0 - 6.372e-6).abs() < 1e-8, "{}", a.corner.0);
    }

    #[test]
    fn gap_kinds_for_61_pins() {
        let net = SubchannelNetwork::build(&spec(5)).unwrap();
        let count = |kind| net.gaps().iter().filter(|g| g.kind == kind).count();
        assert_eq!(count(GapKind::InteriorInterior), 132);
        assert_eq!(count(GapKind::InteriorEdge), 24);
        assert_eq!(count(GapKind::Perimeter), 30);
    }

    #[test]
    fn rejects_bad_dimensions() {
        let mut s = spec(5);
        s.pin_pitch = mm(7.0);
        assert!(SubchannelNetwork::build(&s).is_err());

        let mut s = spec(5);
        s.duct_inner_flat_to_flat = mm(60.0);
        assert!(SubchannelNetwork::build(&s).is_err());

        let mut s = spec(5);
        s.wire_diameter = mm(1.5);
        assert!(SubchannelNetwork::build(&s).is_err());

        assert!(SubchannelNetwork::build(&spec(1)).is_err());
    }
}
