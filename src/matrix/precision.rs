//! Defines the `PrecisionMatrix`: a symmetric matrix with a lazily recomputed eigen system.
//!
//! # Update discipline
//! The elements of a `PrecisionMatrix` can be changed freely with `set`, but every derived
//! quantity (positive definiteness, log determinant, inverse, Gaussian draws) is computed from a
//! cached eigen decomposition. After any mutation the cache is stale, and `update()` has to be
//! called before a derived quantity is read again. Reading one from a stale matrix is a
//! programming error and panics.

use super::eigen::EigenSystem;
use super::{is_symmetric, symmetrize};
use crate::random::RandomNumberGenerator;
use crate::util::{DagmcError, Result};

use ndarray::{Array1, Array2};

use std::fmt;

/// Eigenvalues below this (relative to the largest magnitude) do not count as positive
const EIGEN_TOLERANCE: f64 = 1e-10;

/// Largest asymmetry accepted by `from_array`
const SYMMETRY_TOLERANCE: f64 = 1e-8;

#[derive(Clone)]
pub struct PrecisionMatrix {

    /// The matrix elements. Always symmetric.
    elements: Array2<f64>,

    /// Cached eigen decomposition of `elements`
    eigen: EigenSystem,

    /// Cached inverse. Filled with `NaN` when the matrix is singular.
    inverse: Array2<f64>,

    /// Cached log determinant. `NaN` unless the matrix is positive definite.
    log_det: f64,

    /// `true` if every eigenvalue is positive
    positive: bool,

    /// `true` when the elements changed since the last `update()`
    stale: bool

}

impl PrecisionMatrix {

    /// The `dim` x `dim` identity matrix
    pub fn identity(dim: usize) -> Self {
        PrecisionMatrix::scaled_identity(dim, 1.0)
    }

    /// `kappa` times the identity matrix
    pub fn scaled_identity(dim: usize, kappa: f64) -> Self {
        PrecisionMatrix::from_symmetric(Array2::eye(dim) * kappa)
    }

    /// Build a matrix from its elements.
    ///
    /// # Returns
    /// the updated matrix, or `InvalidParameter` when `elements` is not square or not symmetric
    pub fn from_array(elements: Array2<f64>) -> Result<Self> {
        if !elements.is_square() {
            return Err(DagmcError::InvalidParameter(
                format!("a precision matrix must be square, got shape {:?}", elements.shape())
            ));
        }

        if !is_symmetric(&elements, SYMMETRY_TOLERANCE) {
            return Err(DagmcError::InvalidParameter(String::from("a precision matrix must be symmetric")));
        }

        Ok(PrecisionMatrix::from_symmetric(symmetrize(&elements)))
    }

    /// Internal constructor for elements that are symmetric by construction
    fn from_symmetric(elements: Array2<f64>) -> Self {
        let dim = elements.nrows();
        let mut m = PrecisionMatrix {
            elements,
            eigen: EigenSystem::empty(),
            inverse: Array2::zeros((dim, dim)),
            log_det: f64::NAN,
            positive: false,
            stale: true
        };
        m.update();
        m
    }

    /// The number of rows (and columns)
    pub fn dim(&self) -> usize {
        self.elements.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.elements[[i, j]]
    }

    /// Set the elements (i, j) and (j, i) to `value`. Marks the derived state as stale.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.elements[[i, j]] = value;
        self.elements[[j, i]] = value;
        self.stale = true;
    }

    /// The raw elements. Always valid, regardless of the update state.
    pub fn elements(&self) -> &Array2<f64> {
        &self.elements
    }

    /// Mark the derived state as stale without changing any element
    pub fn touch(&mut self) {
        self.stale = true;
    }

    /// `true` if the derived state reflects the current elements
    pub fn is_updated(&self) -> bool {
        !self.stale
    }

    /// Recompute the eigen system and everything derived from it
    pub fn update(&mut self) {
        let eigen = EigenSystem::symmetric(&self.elements);
        let values = eigen.values();

        let largest = values.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        let positive = values.iter().all(|&v| v > EIGEN_TOLERANCE * largest);
        let singular = values.iter().any(|&v| v.abs() <= EIGEN_TOLERANCE * largest);

        let dim = self.dim();
        self.inverse = if singular {
            Array2::from_elem((dim, dim), f64::NAN)
        } else {
            let inv_values = values.mapv(|v| 1.0 / v);
            let scaled = eigen.vectors() * &inv_values;
            symmetrize(&scaled.dot(&eigen.vectors().t()))
        };

        self.log_det = if positive { values.mapv(f64::ln).sum() } else { f64::NAN };
        self.positive = positive;
        self.eigen = eigen;
        self.stale = false;
    }

    fn assert_updated(&self, what: &str) {
        assert!(!self.stale, "PrecisionMatrix::{} read after a mutation without update()", what);
    }

    /// `true` if all eigenvalues are strictly positive
    pub fn is_positive(&self) -> bool {
        self.assert_updated("is_positive");
        self.positive
    }

    /// The log determinant. `NaN` when the matrix is not positive definite.
    pub fn log_det(&self) -> f64 {
        self.assert_updated("log_det");
        self.log_det
    }

    /// The inverse matrix. Every element is `NaN` when the matrix is singular.
    pub fn inverse(&self) -> &Array2<f64> {
        self.assert_updated("inverse");
        &self.inverse
    }

    pub fn eigenvalues(&self) -> &Array1<f64> {
        self.assert_updated("eigenvalues");
        self.eigen.values()
    }

    pub fn eigenvectors(&self) -> &Array2<f64> {
        self.assert_updated("eigenvectors");
        self.eigen.vectors()
    }

    /// The sum of the diagonal elements
    pub fn trace(&self) -> f64 {
        self.elements.diag().sum()
    }

    /// Draw x ~ N(0, M), treating this matrix as a covariance matrix
    pub fn draw_normal_sample_covariance(&self, rng: &mut RandomNumberGenerator) -> Result<Array1<f64>> {
        self.draw_scaled(rng, |lambda| lambda.sqrt())
    }

    /// Draw x ~ N(0, M^-1), treating this matrix as a precision matrix
    pub fn draw_normal_sample_precision(&self, rng: &mut RandomNumberGenerator) -> Result<Array1<f64>> {
        self.draw_scaled(rng, |lambda| 1.0 / lambda.sqrt())
    }

    /// x = V diag(f(lambda)) z with z ~ N(0, I)
    fn draw_scaled<F>(&self, rng: &mut RandomNumberGenerator, f: F) -> Result<Array1<f64>>
        where F: Fn(f64) -> f64
    {
        self.assert_updated("draw_normal_sample");
        if !self.positive {
            return Err(DagmcError::NotPositiveDefinite);
        }

        let z = rng.standard_normal_vector(self.dim());
        let scaled = self.eigen.values().mapv(f) * z;
        Ok(self.eigen.vectors().dot(&scaled))
    }

}

impl PartialEq for PrecisionMatrix {

    fn eq(&self, other: &PrecisionMatrix) -> bool {
        self.elements == other.elements
    }

}

impl fmt::Debug for PrecisionMatrix {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrecisionMatrix({:?}, updated = {})", self.elements, !self.stale)
    }

}
