//! Subchannel network data structures.

use ds_core::{GapId, PinId, SubchannelId};
use ds_correlations::BundleGeometry;

use crate::laplacian::ReducedLaplacian;

/// Number of duct faces on a hexagonal assembly.
pub const FACES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubchannelKind {
    /// Bounded by three pins.
    Interior,
    /// Bounded by two pins and a duct face.
    Edge,
    /// Bounded by one pin and two duct faces.
    Corner,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subchannel {
    pub id: SubchannelId,
    pub kind: SubchannelKind,
    /// Flow area [m^2].
    pub area: f64,
    /// Wetted perimeter [m].
    pub wetted_perimeter: f64,
    /// Hydraulic diameter `4A/P_w` [m].
    pub hydraulic_diameter: f64,
    /// Centroid in the assembly frame [m].
    pub centroid: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GapKind {
    InteriorInterior,
    InteriorEdge,
    /// Edge-edge or edge-corner along the duct wall; carries the swirl.
    Perimeter,
}

/// Lateral connection between two subchannels.
///
/// Positive cross-flow runs from `from` to `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    pub id: GapId,
    pub from: SubchannelId,
    pub to: SubchannelId,
    pub kind: GapKind,
    /// Gap width [m].
    pub width: f64,
    /// Centroid-to-centroid distance [m].
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub id: PinId,
    pub position: [f64; 2],
}

/// Fraction of one pin's power deposited in one subchannel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinShare {
    pub pin: PinId,
    pub subchannel: SubchannelId,
    pub fraction: f64,
}

/// Length of duct wall a subchannel wets on one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallContact {
    pub subchannel: SubchannelId,
    pub face: usize,
    pub length: f64,
}

/// One inner duct face and the subchannels that touch it.
#[derive(Debug, Clone, PartialEq)]
pub struct DuctFace {
    pub index: usize,
    /// Inner face width [m].
    pub length: f64,
    pub contacts: Vec<WallContact>,
}

impl DuctFace {
    /// Fraction of the face wetted by `contact`.
    pub fn weight(&self, contact: &WallContact) -> f64 {
        if self.length > 0.0 {
            contact.length / self.length
        } else {
            0.0
        }
    }
}

/// A gap seen from one of its two subchannels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapLink {
    pub gap: GapId,
    pub neighbor: SubchannelId,
    /// +1 when the subchannel is the gap's `from` side, -1 otherwise.
    pub sign: f64,
}

/// Pin and wire-wrap dimensions [m].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinGeometry {
    pub diameter: f64,
    pub pitch: f64,
    pub wire_diameter: f64,
    pub wire_pitch: f64,
}

/// Validated, immutable subchannel topology of one assembly.
///
/// Subchannels are ordered interior, edge, corner. Per-subchannel gap
/// adjacency is stored in CSR form, as are the per-pin power shares.
#[derive(Debug, Clone)]
pub struct SubchannelNetwork {
    pub(crate) pin_geometry: PinGeometry,
    pub(crate) subchannels: Vec<Subchannel>,
    pub(crate) gaps: Vec<Gap>,
    pub(crate) pins: Vec<Pin>,

    /// Shares sorted by pin; pin i's shares are `pin_shares[pin_share_offsets[i]..pin_share_offsets[i+1]]`.
    pub(crate) pin_share_offsets: Vec<usize>,
    pub(crate) pin_shares: Vec<PinShare>,

    pub(crate) gap_offsets: Vec<usize>,
    pub(crate) gap_links: Vec<GapLink>,

    pub(crate) perimeter_cycle: Vec<SubchannelId>,
    /// Gap between `perimeter_cycle[j]` and `perimeter_cycle[j + 1]` (wrapping).
    pub(crate) perimeter_gaps: Vec<GapId>,

    pub(crate) faces: Vec<DuctFace>,
    pub(crate) laplacian: ReducedLaplacian,
    pub(crate) bundle: BundleGeometry,
}

impl SubchannelNetwork {
    pub fn subchannels(&self) -> &[Subchannel] {
        &self.subchannels
    }

    pub fn subchannel(&self, id: SubchannelId) -> Option<&Subchannel> {
        self.subchannels.get(id.idx())
    }

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn pin_geometry(&self) -> &PinGeometry {
        &self.pin_geometry
    }

    /// Gaps incident to a subchannel.
    pub fn gaps_of(&self, id: SubchannelId) -> &[GapLink] {
        let i = id.idx();
        match (self.gap_offsets.get(i), self.gap_offsets.get(i + 1)) {
            (Some(&start), Some(&end)) => &self.gap_links[start..end],
            _ => &[],
        }
    }

    /// Power fractions of one pin.
    pub fn shares_of(&self, pin: PinId) -> &[PinShare] {
        let i = pin.idx();
        match (
            self.pin_share_offsets.get(i),
            self.pin_share_offsets.get(i + 1),
        ) {
            (Some(&start), Some(&end)) => &self.pin_shares[start..end],
            _ => &[],
        }
    }

    pub fn pin_shares(&self) -> &[PinShare] {
        &self.pin_shares
    }

    /// Perimeter subchannels in swirl order.
    pub fn perimeter_cycle(&self) -> &[SubchannelId] {
        &self.perimeter_cycle
    }

    /// Gaps crossed by the swirl, aligned with [`Self::perimeter_cycle`].
    pub fn perimeter_gaps(&self) -> &[GapId] {
        &self.perimeter_gaps
    }

    pub fn faces(&self) -> &[DuctFace] {
        &self.faces
    }

    pub fn laplacian(&self) -> &ReducedLaplacian {
        &self.laplacian
    }

    /// Bundle-averaged geometry for correlation evaluation.
    pub fn bundle(&self) -> &BundleGeometry {
        &self.bundle
    }

    pub fn total_area(&self) -> f64 {
        self.subchannels.iter().map(|s| s.area).sum()
    }

    pub fn count(&self, kind: SubchannelKind) -> usize {
        self.subchannels.iter().filter(|s| s.kind == kind).count()
    }
}
