//! Dense numeric matrices.
//!
//! General matrices are plain `ndarray` arrays (`NumericMatrix`); the symmetric matrices that
//! parameterise multivariate Gaussian families are `PrecisionMatrix`es, which cache their eigen
//! decomposition.

use ndarray::{Array1, Array2, Axis};

pub mod eigen;
pub mod precision;

pub use self::eigen::EigenSystem;
pub use self::precision::PrecisionMatrix;

/// A dense matrix of `f64`s
pub type NumericMatrix = Array2<f64>;

/// The outer product `x y^t`
pub fn outer(x: &Array1<f64>, y: &Array1<f64>) -> NumericMatrix {
    let col = x.view().insert_axis(Axis(1));
    let row = y.view().insert_axis(Axis(0));
    col.dot(&row)
}

/// `(m + m^t) / 2`
pub fn symmetrize(m: &NumericMatrix) -> NumericMatrix {
    (m + &m.t()) * 0.5
}

/// `true` if `m` is square and `|m[i,j] - m[j,i]| <= tol` everywhere
pub fn is_symmetric(m: &NumericMatrix, tol: f64) -> bool {
    let n = m.nrows();
    m.is_square() && iproduct!(0..n, 0..n).all(|(i, j)| (m[[i, j]] - m[[j, i]]).abs() <= tol)
}

/// The sum of the diagonal
pub fn trace(m: &NumericMatrix) -> f64 {
    m.diag().sum()
}
