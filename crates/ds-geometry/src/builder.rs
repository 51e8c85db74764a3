//! Incremental subchannel network builder.

use ds_core::{GapId, PinId, SubchannelId};
use ds_correlations::BundleGeometry;

use crate::error::GeometryResult;
use crate::laplacian::ReducedLaplacian;
use crate::network::{
    DuctFace, FACES, Gap, GapKind, GapLink, Pin, PinGeometry, PinShare, Subchannel,
    SubchannelKind, SubchannelNetwork, WallContact,
};
use crate::validate;

/// Builder for a subchannel network.
///
/// Add pins, subchannels, gaps, pin shares and wall contacts, then call
/// `build()` to validate and freeze them into an immutable
/// [`SubchannelNetwork`].
#[derive(Debug)]
pub struct NetworkBuilder {
    pin_geometry: PinGeometry,
    face_length: f64,
    subchannels: Vec<Subchannel>,
    gaps: Vec<Gap>,
    pins: Vec<Pin>,
    shares: Vec<PinShare>,
    contacts: Vec<WallContact>,
    perimeter_cycle: Vec<SubchannelId>,
}

impl NetworkBuilder {
    pub fn new(pin_geometry: PinGeometry) -> Self {
        Self {
            pin_geometry,
            face_length: 0.0,
            subchannels: Vec::new(),
            gaps: Vec::new(),
            pins: Vec::new(),
            shares: Vec::new(),
            contacts: Vec::new(),
            perimeter_cycle: Vec::new(),
        }
    }

    /// Give the network six duct faces of the given inner width.
    pub fn with_duct_faces(mut self, face_length: f64) -> Self {
        self.face_length = face_length;
        self
    }

    pub fn add_pin(&mut self, position: [f64; 2]) -> PinId {
        let id = PinId::from_usize(self.pins.len());
        self.pins.push(Pin { id, position });
        id
    }

    pub fn add_subchannel(
        &mut self,
        kind: SubchannelKind,
        area: f64,
        wetted_perimeter: f64,
        centroid: [f64; 2],
    ) -> SubchannelId {
        let id = SubchannelId::from_usize(self.subchannels.len());
        let hydraulic_diameter = if wetted_perimeter > 0.0 {
            4.0 * area / wetted_perimeter
        } else {
            0.0
        };
        self.subchannels.push(Subchannel {
            id,
            kind,
            area,
            wetted_perimeter,
            hydraulic_diameter,
            centroid,
        });
        id
    }

    pub fn add_gap(
        &mut self,
        from: SubchannelId,
        to: SubchannelId,
        kind: GapKind,
        width: f64,
        length: f64,
    ) -> GapId {
        let id = GapId::from_usize(self.gaps.len());
        self.gaps.push(Gap {
            id,
            from,
            to,
            kind,
            width,
            length,
        });
        id
    }

    pub fn add_pin_share(&mut self, pin: PinId, subchannel: SubchannelId, fraction: f64) {
        self.shares.push(PinShare {
            pin,
            subchannel,
            fraction,
        });
    }

    pub fn add_wall_contact(&mut self, subchannel: SubchannelId, face: usize, length: f64) {
        self.contacts.push(WallContact {
            subchannel,
            face,
            length,
        });
    }

    /// Perimeter subchannels in swirl order; consecutive entries (wrapping)
    /// must share a perimeter gap.
    pub fn set_perimeter_cycle(&mut self, cycle: Vec<SubchannelId>) {
        self.perimeter_cycle = cycle;
    }

    /// Validate and freeze the network.
    pub fn build(self) -> GeometryResult<SubchannelNetwork> {
        validate::validate_parts(&self.subchannels, &self.gaps, self.pins.len())?;
        validate::validate_shares(&self.shares, self.pins.len(), self.subchannels.len())?;
        validate::validate_contacts(&self.contacts, self.subchannels.len())?;
        let perimeter_gaps = validate::perimeter_gaps(&self.perimeter_cycle, &self.gaps)?;

        let (gap_offsets, gap_links) = Self::build_adjacency(self.subchannels.len(), &self.gaps);
        validate::validate_connected(&gap_offsets, &gap_links)?;

        let laplacian = ReducedLaplacian::new(
            self.subchannels.len(),
            self.gaps.iter().map(|g| (g.from.idx(), g.to.idx(), g.width)),
        )?;

        let (pin_share_offsets, pin_shares) = Self::group_shares(self.pins.len(), self.shares);
        let faces = Self::build_faces(self.face_length, &self.contacts);
        let bundle = Self::bundle_geometry(&self.pin_geometry, &self.subchannels, self.pins.len());

        Ok(SubchannelNetwork {
            pin_geometry: self.pin_geometry,
            subchannels: self.subchannels,
            gaps: self.gaps,
            pins: self.pins,
            pin_share_offsets,
            pin_shares,
            gap_offsets,
            gap_links,
            perimeter_cycle: self.perimeter_cycle,
            perimeter_gaps,
            faces,
            laplacian,
            bundle,
        })
    }

    /// For each subchannel, collect its incident gaps (CSR).
    fn build_adjacency(count: usize, gaps: &[Gap]) -> (Vec<usize>, Vec<GapLink>) {
        let mut degree = vec![0usize; count];
        for gap in gaps {
            degree[gap.from.idx()] += 1;
            degree[gap.to.idx()] += 1;
        }

        let mut offsets = Vec::with_capacity(count + 1);
        offsets.push(0);
        for d in &degree {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + d);
        }

        let mut cursor = offsets[..count].to_vec();
        let placeholder = GapLink {
            gap: GapId::from_index(0),
            neighbor: SubchannelId::from_index(0),
            sign: 0.0,
        };
        let mut links = vec![placeholder; offsets[count]];
        for gap in gaps {
            let (a, b) = (gap.from.idx(), gap.to.idx());
            links[cursor[a]] = GapLink {
                gap: gap.id,
                neighbor: gap.to,
                sign: 1.0,
            };
            cursor[a] += 1;
            links[cursor[b]] = GapLink {
                gap: gap.id,
                neighbor: gap.from,
                sign: -1.0,
            };
            cursor[b] += 1;
        }
        (offsets, links)
    }

    fn group_shares(pin_count: usize, mut shares: Vec<PinShare>) -> (Vec<usize>, Vec<PinShare>) {
        shares.sort_by_key(|s| (s.pin, s.subchannel));
        let mut offsets = vec![0usize; pin_count + 1];
        for share in &shares {
            offsets[share.pin.idx() + 1] += 1;
        }
        for i in 0..pin_count {
            offsets[i + 1] += offsets[i];
        }
        (offsets, shares)
    }

    fn build_faces(face_length: f64, contacts: &[WallContact]) -> Vec<DuctFace> {
        if face_length <= 0.0 {
            return Vec::new();
        }
        (0..FACES)
            .map(|index| DuctFace {
                index,
                length: face_length,
                contacts: contacts
                    .iter()
                    .filter(|c| c.face == index)
                    .copied()
                    .collect(),
            })
            .collect()
    }

    fn bundle_geometry(
        pins: &PinGeometry,
        subchannels: &[Subchannel],
        pin_count: usize,
    ) -> BundleGeometry {
        let mean_area = |kind: SubchannelKind| {
            let (sum, n) = subchannels
                .iter()
                .filter(|s| s.kind == kind)
                .fold((0.0, 0usize), |(sum, n), s| (sum + s.area, n + 1));
            (n > 0).then(|| sum / n as f64)
        };
        let interior = mean_area(SubchannelKind::Interior);
        let edge = mean_area(SubchannelKind::Edge);

        BundleGeometry {
            pin_diameter: pins.diameter,
            pin_pitch: pins.pitch,
            wire_diameter: pins.wire_diameter,
            wire_pitch: pins.wire_pitch,
            pin_count,
            bundle_area: subchannels.iter().map(|s| s.area).sum(),
            bundle_wetted_perimeter: subchannels.iter().map(|s| s.wetted_perimeter).sum(),
            interior_area: interior.or(edge).unwrap_or(0.0),
            edge_area: edge.or(interior).unwrap_or(0.0),
        }
    }
}
