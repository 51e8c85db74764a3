//! Core layout: assemblies on a hexagonal lattice.
//!
//! Positions use axial coordinates `(q, r)`. Face `k` of an assembly looks
//! toward the neighbor at `DIRECTIONS[k]`; the face it meets there is
//! `(k + 3) % 6`. Neighbor links are plain indices into the assembly arena.

use std::collections::HashMap;
use std::ops::Add;

use ds_core::AssemblyId;

use crate::error::{GeometryError, GeometryResult};
use crate::network::FACES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexPosition {
    pub q: i32,
    pub r: i32,
}

impl Add for HexPosition {
    type Output = HexPosition;

    fn add(self, other: HexPosition) -> HexPosition {
        HexPosition::new(self.q + other.q, self.r + other.r)
    }
}

impl HexPosition {
    pub const ORIGIN: HexPosition = HexPosition::new(0, 0);

    /// Unit steps at 0, 60, ..., 300 degrees.
    pub const DIRECTIONS: [HexPosition; 6] = [
        HexPosition::new(1, 0),
        HexPosition::new(0, 1),
        HexPosition::new(-1, 1),
        HexPosition::new(-1, 0),
        HexPosition::new(0, -1),
        HexPosition::new(1, -1),
    ];

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn scale(self, k: i32) -> Self {
        Self::new(self.q * k, self.r * k)
    }

    pub fn neighbor(self, face: usize) -> Self {
        self + Self::DIRECTIONS[face % FACES]
    }

    /// Hex distance from the origin.
    pub fn ring(self) -> u32 {
        self.q
            .unsigned_abs()
            .max(self.r.unsigned_abs())
            .max((self.q + self.r).unsigned_abs())
    }

    /// Planar position for a lattice of the given pitch.
    pub fn cartesian(self, pitch: f64) -> [f64; 2] {
        let q = f64::from(self.q);
        let r = f64::from(self.r);
        [pitch * (q + 0.5 * r), pitch * r * 3f64.sqrt() / 2.0]
    }

    /// Every position with `ring() <= radius`, center first, then ring by ring.
    pub fn within(radius: u32) -> Vec<Self> {
        let mut out = vec![Self::ORIGIN];
        for k in 1..=radius as i32 {
            let mut pos = Self::DIRECTIONS[4].scale(k);
            for step in Self::DIRECTIONS {
                for _ in 0..k {
                    out.push(pos);
                    pos = pos + step;
                }
            }
        }
        out
    }
}

/// Face index seen from the neighbor.
pub const fn opposite(face: usize) -> usize {
    (face + 3) % FACES
}

/// What lies across one duct face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceLink {
    Neighbor { assembly: AssemblyId, face: usize },
    /// Core boundary or unfilled position.
    Periphery,
}

/// Assembly arena positions plus derived neighbor links.
#[derive(Debug, Clone)]
pub struct CoreLayout {
    positions: Vec<HexPosition>,
    links: Vec<[FaceLink; FACES]>,
}

impl CoreLayout {
    /// Link assemblies placed at `positions`; index `i` becomes `AssemblyId` `i`.
    pub fn new(positions: Vec<HexPosition>) -> GeometryResult<Self> {
        let mut index = HashMap::with_capacity(positions.len());
        for (i, pos) in positions.iter().enumerate() {
            if index.insert(*pos, AssemblyId::from_usize(i)).is_some() {
                return Err(GeometryError::DuplicatePosition { q: pos.q, r: pos.r });
            }
        }

        let links = positions
            .iter()
            .map(|pos| {
                let mut faces = [FaceLink::Periphery; FACES];
                for (k, link) in faces.iter_mut().enumerate() {
                    if let Some(&assembly) = index.get(&pos.neighbor(k)) {
                        *link = FaceLink::Neighbor {
                            assembly,
                            face: opposite(k),
                        };
                    }
                }
                faces
            })
            .collect();

        Ok(Self { positions, links })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[HexPosition] {
        &self.positions
    }

    pub fn position(&self, id: AssemblyId) -> Option<HexPosition> {
        self.positions.get(id.idx()).copied()
    }

    pub fn links(&self, id: AssemblyId) -> Option<&[FaceLink; FACES]> {
        self.links.get(id.idx())
    }

    /// Every shared face once, as `(a, face_a, b, face_b)` with `a < b`.
    pub fn face_pairs(&self) -> Vec<(AssemblyId, usize, AssemblyId, usize)> {
        let mut pairs = Vec::new();
        for (i, faces) in self.links.iter().enumerate() {
            let a = AssemblyId::from_usize(i);
            for (k, link) in faces.iter().enumerate() {
                if let FaceLink::Neighbor { assembly, face } = *link {
                    if a < assembly {
                        pairs.push((a, k, assembly, face));
                    }
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_counts_hex_numbers() {
        assert_eq!(HexPosition::within(0).len(), 1);
        assert_eq!(HexPosition::within(1).len(), 7);
        assert_eq!(HexPosition::within(4).len(), 61);
        for (i, pos) in HexPosition::within(4).iter().enumerate() {
            let expected = match i {
                0 => 0,
                1..=6 => 1,
                7..=18 => 2,
                19..=36 => 3,
                _ => 4,
            };
            assert_eq!(pos.ring(), expected, "position {i}: {pos:?}");
        }
    }

    #[test]
    fn directions_are_sixty_degrees_apart() {
        for (k, dir) in HexPosition::DIRECTIONS.iter().enumerate() {
            let [x, y] = dir.cartesian(1.0);
            let angle = y.atan2(x).to_degrees().rem_euclid(360.0);
            assert!((angle - 60.0 * k as f64).abs() < 1e-9);
            assert!(((x * x + y * y).sqrt() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn seven_assembly_core_links() {
        let layout = CoreLayout::new(HexPosition::within(1)).unwrap();
        let center = layout.links(AssemblyId::from_index(0)).unwrap();
        assert!(
            center
                .iter()
                .all(|l| matches!(l, FaceLink::Neighbor { .. }))
        );
        for i in 1..7 {
            let faces = layout.links(AssemblyId::from_index(i)).unwrap();
            let neighbors = faces
                .iter()
                .filter(|l| matches!(l, FaceLink::Neighbor { .. }))
                .count();
            assert_eq!(neighbors, 3);
        }
        assert_eq!(layout.face_pairs().len(), 12);
    }

    #[test]
    fn links_are_mutual() {
        let layout = CoreLayout::new(HexPosition::within(2)).unwrap();
        for (a, fa, b, fb) in layout.face_pairs() {
            assert_eq!(fb, opposite(fa));
            assert_eq!(
                layout.links(b).unwrap()[fb],
                FaceLink::Neighbor {
                    assembly: a,
                    face: fa
                }
            );
        }
    }

    #[test]
    fn unfilled_position_becomes_periphery() {
        let mut positions = HexPosition::within(1);
        let removed = positions.remove(1);
        let layout = CoreLayout::new(positions).unwrap();
        let center = layout.links(AssemblyId::from_index(0)).unwrap();
        let face = HexPosition::DIRECTIONS
            .iter()
            .position(|d| *d == removed)
            .unwrap();
        assert_eq!(center[face], FaceLink::Periphery);
    }

    #[test]
    fn duplicate_position_rejected() {
        let err = CoreLayout::new(vec![HexPosition::ORIGIN, HexPosition::ORIGIN]).unwrap_err();
        assert_eq!(err, GeometryError::DuplicatePosition { q: 0, r: 0 });
    }
}
