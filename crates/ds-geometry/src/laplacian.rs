//! Weighted gap Laplacian used by the diversion cross-flow solve.
//!
//! With gap conductances `c_g` and node-gap incidence `B`, the lateral
//! flows `w = C B^T phi` that satisfy `B w = r` are the `C^-1`-weighted
//! minimum-norm solution when `B C B^T phi = r`. The Laplacian is singular
//! (constant null space), so node 0 is grounded and the remaining block is
//! Cholesky-factored once per network.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};

use crate::error::{GeometryResult, invalid};

#[derive(Debug, Clone)]
pub struct ReducedLaplacian {
    size: usize,
    factor: Option<Cholesky<f64, Dyn>>,
}

impl ReducedLaplacian {
    /// Assemble and factor from `(from, to, conductance)` edges.
    pub fn new(
        size: usize,
        edges: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> GeometryResult<Self> {
        if size == 0 {
            return Err(invalid("gap Laplacian needs at least one subchannel"));
        }
        if size == 1 {
            return Ok(Self { size, factor: None });
        }

        let n = size - 1;
        let mut matrix = DMatrix::<f64>::zeros(n, n);
        for (i, j, c) in edges {
            if i >= size || j >= size {
                return Err(invalid("gap Laplacian edge out of range"));
            }
            if i > 0 {
                matrix[(i - 1, i - 1)] += c;
            }
            if j > 0 {
                matrix[(j - 1, j - 1)] += c;
            }
            if i > 0 && j > 0 {
                matrix[(i - 1, j - 1)] -= c;
                matrix[(j - 1, i - 1)] -= c;
            }
        }

        let factor = Cholesky::new(matrix)
            .ok_or_else(|| invalid("gap Laplacian is not positive definite"))?;
        Ok(Self {
            size,
            factor: Some(factor),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Potentials `phi` with `phi[0] = 0` such that `L phi = rhs` on every
    /// node but the grounded one. `rhs` must sum to zero for the grounded
    /// row to hold as well. Entries missing from a short `rhs` count as zero.
    pub fn solve(&self, rhs: &[f64]) -> Vec<f64> {
        let mut phi = vec![0.0; self.size];
        if let Some(factor) = &self.factor {
            let b = DVector::from_fn(self.size - 1, |row, _| {
                rhs.get(row + 1).copied().unwrap_or(0.0)
            });
            let x = factor.solve(&b);
            for (slot, value) in phi.iter_mut().skip(1).zip(x.iter()) {
                *slot = *value;
            }
        }
        phi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(size: usize, edges: &[(usize, usize, f64)], phi: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; size];
        for &(i, j, c) in edges {
            let w = c * (phi[i] - phi[j]);
            out[i] += w;
            out[j] -= w;
        }
        out
    }

    #[test]
    fn triangle_reproduces_balanced_rhs() {
        let edges = [(0, 1, 1.0), (1, 2, 2.0), (0, 2, 0.5)];
        let lap = ReducedLaplacian::new(3, edges).unwrap();
        let rhs = [0.3, -0.1, -0.2];
        let phi = lap.solve(&rhs);
        assert_eq!(phi[0], 0.0);
        let back = apply(3, &edges, &phi);
        for (a, b) in back.iter().zip(rhs.iter()) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn short_rhs_is_zero_padded() {
        let edges = [(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)];
        let lap = ReducedLaplacian::new(4, edges).unwrap();
        let full = lap.solve(&[-1.0, 1.0, 0.0, 0.0]);
        let short = lap.solve(&[-1.0, 1.0]);
        assert_eq!(short.len(), 4);
        for (a, b) in full.iter().zip(short.iter()) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
        // Node 1 sits one unit of potential above the grounded node.
        assert!((full[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_node_is_trivial() {
        let lap = ReducedLaplacian::new(1, []).unwrap();
        assert_eq!(lap.solve(&[0.0]), vec![0.0]);
    }

    #[test]
    fn isolated_node_is_rejected() {
        assert!(ReducedLaplacian::new(3, [(0, 1, 1.0)]).is_err());
    }
}
