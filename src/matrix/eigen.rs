//! Symmetric eigen decomposition by cyclic Jacobi rotations.
//!
//! The dimensions this crate works with are small (covariance matrices of a handful of traits),
//! so the classic Jacobi method is accurate and more than fast enough.

use itertools::Itertools;
use ndarray::{Array1, Array2};

/// Upper bound on the number of full sweeps over the off-diagonal elements
const MAX_SWEEPS: usize = 100;

/// Relative size of the off-diagonal mass below which the matrix counts as diagonal
const CONVERGENCE: f64 = 1e-24;

/// The eigenvalues and eigenvectors of a symmetric matrix.
#[derive(Clone, Debug)]
pub struct EigenSystem {

    /// Eigenvalues in ascending order
    values: Array1<f64>,

    /// Orthonormal eigenvectors, stored as columns in the order of `values`
    vectors: Array2<f64>

}

impl EigenSystem {

    /// The eigen system of the empty (0 x 0) matrix
    pub fn empty() -> Self {
        EigenSystem { values: Array1::zeros(0), vectors: Array2::zeros((0, 0)) }
    }

    /// Decompose the symmetric matrix `a`.
    ///
    /// Only the symmetric part of `a` is meaningful; callers are expected to pass a symmetric
    /// matrix.
    ///
    /// # Panics
    /// if `a` is not square
    pub fn symmetric(a: &Array2<f64>) -> Self {
        assert!(a.is_square(), "eigen decomposition requires a square matrix");

        let n = a.nrows();
        let mut m = a.to_owned();
        let mut v = Array2::<f64>::eye(n);

        let total: f64 = m.iter().map(|x| x * x).sum();

        for _ in 0..MAX_SWEEPS {
            let off = off_diagonal_mass(&m);
            if off <= CONVERGENCE * total || off == 0.0 {
                break;
            }

            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = m[[p, q]];
                    if apq == 0.0 {
                        continue;
                    }

                    // rotation angle that annihilates m[p, q]
                    let theta = (m[[q, q]] - m[[p, p]]) / (2.0 * apq);
                    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;

                    rotate(&mut m, &mut v, p, q, c, s);
                }
            }
        }

        let order: Vec<usize> = (0..n).sorted_by(|&i, &j| {
            m[[i, i]].partial_cmp(&m[[j, j]]).unwrap_or(std::cmp::Ordering::Equal)
        }).collect();

        let values = Array1::from(order.iter().map(|&i| m[[i, i]]).collect::<Vec<f64>>());
        let mut vectors = Array2::zeros((n, n));
        for (col, &i) in order.iter().enumerate() {
            vectors.column_mut(col).assign(&v.column(i));
        }

        EigenSystem { values, vectors }
    }

    /// The eigenvalues, ascending
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// The eigenvectors as columns, matching `values()`
    pub fn vectors(&self) -> &Array2<f64> {
        &self.vectors
    }

    /// Rebuild `V diag(values) V^t`
    pub fn reconstruct(&self) -> Array2<f64> {
        let scaled = &self.vectors * &self.values;
        scaled.dot(&self.vectors.t())
    }

}

fn off_diagonal_mass(m: &Array2<f64>) -> f64 {
    let n = m.nrows();
    iproduct!(0..n, 0..n).filter(|(i, j)| i != j).map(|(i, j)| m[[i, j]] * m[[i, j]]).sum()
}

/// Apply the rotation `J` in the (p, q) plane: `m <- J^t m J`, `v <- v J`
fn rotate(m: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    let n = m.nrows();

    for k in 0..n {
        let mkp = m[[k, p]];
        let mkq = m[[k, q]];
        m[[k, p]] = c * mkp - s * mkq;
        m[[k, q]] = s * mkp + c * mkq;
    }

    for k in 0..n {
        let mpk = m[[p, k]];
        let mqk = m[[q, k]];
        m[[p, k]] = c * mpk - s * mqk;
        m[[q, k]] = s * mpk + c * mqk;
    }

    for k in 0..n {
        let vkp = v[[k, p]];
        let vkq = v[[k, q]];
        v[[k, p]] = c * vkp - s * vkq;
        v[[k, q]] = s * vkp + c * vkq;
    }
}
