//! Heat exchange through duct walls between neighboring assemblies.
//!
//! Works on complete profiles: each face pair exchanges
//! `q' = (T_a - T_b) w / R''` per unit length at every axial step, where
//! `R''` chains the two film resistances, both walls and the
//! inter-assembly gap. The result feeds the next march as a
//! [`DuctBoundary`] per assembly.

use ds_core::AssemblyId;
use ds_geometry::layout::{CoreLayout, FaceLink};
use ds_geometry::network::FACES;
use ds_solver::{AxialMesh, AxialProfile, DuctBoundary};

use crate::config::{DuctMaterials, PeripheryBoundary};

/// Net heat through one duct face over the bundle length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceHeat {
    pub assembly: AssemblyId,
    pub face: usize,
    /// Into the assembly [W].
    pub heat: f64,
    /// Largest linear heat rate magnitude along the face [W/m].
    pub peak_linear_heat_rate: f64,
}

/// Static data of one assembly's duct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuctGeometry {
    /// Width of each face [m].
    pub face_width: f64,
    pub wall_thickness: f64,
}

pub struct DuctCoupler<'a> {
    layout: &'a CoreLayout,
    ducts: &'a [DuctGeometry],
    materials: DuctMaterials,
    periphery: PeripheryBoundary,
}

impl<'a> DuctCoupler<'a> {
    pub fn new(
        layout: &'a CoreLayout,
        ducts: &'a [DuctGeometry],
        materials: DuctMaterials,
        periphery: PeripheryBoundary,
    ) -> Self {
        Self {
            layout,
            ducts,
            materials,
            periphery,
        }
    }

    fn wall(&self, assembly: usize) -> f64 {
        self.ducts[assembly].wall_thickness / self.materials.wall_conductivity
    }

    /// Linear heat rates for the next pass, from the profiles of the last.
    pub fn couple(&self, profiles: &[AxialProfile], mesh: &AxialMesh) -> Vec<DuctBoundary> {
        let steps = mesh.steps();
        let mut rates = vec![vec![[0.0; FACES]; steps]; profiles.len()];

        for step in 0..steps {
            let states: Vec<_> = profiles
                .iter()
                .map(|p| p.face_state(step).unwrap_or(([0.0; FACES], [0.0; FACES])))
                .collect();

            for (a, fa, b, fb) in self.layout.face_pairs() {
                let (ia, ib) = (a.idx(), b.idx());
                let (ta, ha) = (states[ia].0[fa], states[ia].1[fa]);
                let (tb, hb) = (states[ib].0[fb], states[ib].1[fb]);
                if ha <= 0.0 || hb <= 0.0 {
                    continue;
                }
                let resistance = 1.0 / ha
                    + self.wall(ia)
                    + self.materials.gap_width / self.materials.gap_conductivity
                    + self.wall(ib)
                    + 1.0 / hb;
                let width = self.ducts[ia].face_width.min(self.ducts[ib].face_width);
                let q = (tb - ta) * width / resistance;
                rates[ia][step][fa] += q;
                rates[ib][step][fb] -= q;
            }

            for (i, state) in states.iter().enumerate() {
                let Some(links) = self.layout.links(AssemblyId::from_usize(i)) else {
                    continue;
                };
                for (face, link) in links.iter().enumerate() {
                    if *link == FaceLink::Periphery {
                        rates[i][step][face] = self.periphery_rate(i, state.0[face], state.1[face]);
                    }
                }
            }
        }

        rates.into_iter().map(DuctBoundary::from_steps).collect()
    }

    fn periphery_rate(&self, assembly: usize, temperature: f64, htc: f64) -> f64 {
        match self.periphery {
            PeripheryBoundary::Adiabatic => 0.0,
            PeripheryBoundary::FixedHeatRate { linear_heat_rate } => linear_heat_rate,
            PeripheryBoundary::FixedTemperature {
                temperature: sink,
                resistance,
            } => {
                if htc <= 0.0 {
                    return 0.0;
                }
                let total = 1.0 / htc + self.wall(assembly) + resistance;
                (sink - temperature) * self.ducts[assembly].face_width / total
            }
        }
    }
}

/// Blend `computed` into `previous` and report the largest change before
/// blending, relative to the largest flux (floored at 1 W/m).
pub fn relax(
    previous: &[DuctBoundary],
    computed: Vec<DuctBoundary>,
    factor: f64,
) -> (Vec<DuctBoundary>, f64) {
    let mut change: f64 = 0.0;
    let mut scale: f64 = 1.0;
    let relaxed = computed
        .into_iter()
        .zip(previous)
        .map(|(new, old)| {
            let steps = new
                .steps()
                .iter()
                .enumerate()
                .map(|(step, q_new)| {
                    let q_old = old.linear_heat_rate(step);
                    let mut out = [0.0; FACES];
                    for k in 0..FACES {
                        change = change.max((q_new[k] - q_old[k]).abs());
                        scale = scale.max(q_new[k].abs());
                        out[k] = q_old[k] + factor * (q_new[k] - q_old[k]);
                    }
                    out
                })
                .collect();
            DuctBoundary::from_steps(steps)
        })
        .collect();
    (relaxed, change / scale)
}

/// Per-face totals of the boundaries applied to each assembly.
pub fn face_heat(boundaries: &[DuctBoundary], mesh: &AxialMesh) -> Vec<FaceHeat> {
    let mut out = Vec::with_capacity(boundaries.len() * FACES);
    for (i, boundary) in boundaries.iter().enumerate() {
        for face in 0..FACES {
            let (heat, peak) = boundary.steps().iter().enumerate().fold(
                (0.0, 0.0_f64),
                |(heat, peak), (step, q)| {
                    let dz = mesh.step(step).map_or(0.0, |(z0, z1)| z1 - z0);
                    (heat + q[face] * dz, peak.max(q[face].abs()))
                },
            );
            out.push(FaceHeat {
                assembly: AssemblyId::from_usize(i),
                face,
                heat,
                peak_linear_heat_rate: peak,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relax_blends_and_measures_change() {
        let old = vec![DuctBoundary::from_steps(vec![[0.0; FACES]; 2])];
        let new = vec![DuctBoundary::from_steps(vec![[100.0, -50.0, 0.0, 0.0, 0.0, 0.0]; 2])];
        let (relaxed, change) = relax(&old, new, 0.5);
        assert_eq!(relaxed[0].linear_heat_rate(1)[0], 50.0);
        assert_eq!(relaxed[0].linear_heat_rate(1)[1], -25.0);
        assert_eq!(change, 1.0);
    }

    #[test]
    fn relax_of_zero_fluxes_is_zero() {
        let old = vec![DuctBoundary::adiabatic(3)];
        let (_, change) = relax(&old, vec![DuctBoundary::adiabatic(3)], 0.7);
        assert_eq!(change, 0.0);
    }

    #[test]
    fn face_heat_integrates_over_steps() {
        let mesh = AxialMesh::new(1.0, 0.25, &[]).unwrap();
        let boundary = DuctBoundary::from_steps(vec![[4.0, 0.0, 0.0, -8.0, 0.0, 0.0]; 4]);
        let heat = face_heat(&[boundary], &mesh);
        assert_eq!(heat.len(), FACES);
        assert!((heat[0].heat - 4.0).abs() < 1e-12);
        assert!((heat[3].heat + 8.0).abs() < 1e-12);
        assert_eq!(heat[3].peak_linear_heat_rate, 8.0);
    }
}
