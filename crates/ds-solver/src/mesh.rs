//! Axial mesh shared by every assembly in a core.

use tracing::warn;

use crate::error::{MarchResult, invalid_input};

const SNAP: f64 = 1e-12;

/// Strictly increasing axial node heights from 0 to the bundle length.
#[derive(Debug, Clone, PartialEq)]
pub struct AxialMesh {
    z: Vec<f64>,
}

impl AxialMesh {
    /// Split `[0, length]` at every breakpoint, then cut each interval into
    /// equal steps no longer than `step`.
    pub fn new(length: f64, step: f64, breakpoints: &[f64]) -> MarchResult<Self> {
        if !length.is_finite() || length <= 0.0 {
            return Err(invalid_input(format!("bundle length must be positive, got {length}")));
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(invalid_input(format!("axial step must be positive, got {step}")));
        }

        let mut cuts: Vec<f64> = breakpoints
            .iter()
            .copied()
            .filter(|z| z.is_finite() && *z > SNAP * length && *z < length * (1.0 - SNAP))
            .collect();
        cuts.push(0.0);
        cuts.push(length);
        cuts.sort_by(f64::total_cmp);
        cuts.dedup_by(|a, b| (*a - *b).abs() <= SNAP * length);

        let mut z = vec![0.0];
        for pair in cuts.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let n = ((hi - lo) / step * (1.0 - SNAP)).ceil().max(1.0) as usize;
            let dz = (hi - lo) / n as f64;
            z.extend((1..n).map(|i| lo + dz * i as f64));
            z.push(hi);
        }
        Ok(Self { z })
    }

    pub fn nodes(&self) -> &[f64] {
        &self.z
    }

    pub fn steps(&self) -> usize {
        self.z.len() - 1
    }

    pub fn length(&self) -> f64 {
        self.z[self.z.len() - 1]
    }

    /// `(z_start, z_end)` of step `i`.
    pub fn step(&self, i: usize) -> Option<(f64, f64)> {
        Some((*self.z.get(i)?, *self.z.get(i + 1)?))
    }

    pub fn max_step(&self) -> f64 {
        self.z
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(0.0, f64::max)
    }
}

/// Requested step reduced to the explicit-scheme stability limit.
pub fn stable_step(requested: f64, limit: f64) -> f64 {
    if limit.is_finite() && limit > 0.0 && limit < requested {
        warn!(
            requested,
            limit, "axial step reduced to the explicit mixing stability limit"
        );
        limit
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_mesh() {
        let mesh = AxialMesh::new(1.0, 0.01, &[]).unwrap();
        assert_eq!(mesh.steps(), 100);
        assert!((mesh.length() - 1.0).abs() < 1e-15);
        assert!((mesh.max_step() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn lands_on_breakpoints() {
        let mesh = AxialMesh::new(1.0, 0.1, &[0.33, 0.8, 0.8, 2.0]).unwrap();
        for cut in [0.33, 0.8] {
            assert!(mesh.nodes().iter().any(|z| (z - cut).abs() < 1e-15), "{cut}");
        }
        assert!(mesh.nodes().windows(2).all(|w| w[1] > w[0]));
        assert!(mesh.max_step() <= 0.1 + 1e-12);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(AxialMesh::new(0.0, 0.1, &[]).is_err());
        assert!(AxialMesh::new(1.0, -0.1, &[]).is_err());
    }

    #[test]
    fn stability_limit_only_shrinks() {
        assert_eq!(stable_step(0.01, 0.5), 0.01);
        assert_eq!(stable_step(0.01, 0.004), 0.004);
        assert_eq!(stable_step(0.01, f64::INFINITY), 0.01);
    }
}
