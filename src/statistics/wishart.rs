//! Wishart and Inverse-Wishart densities and samplers.
//!
//! Both families are parameterised by a scale matrix and an integer number of degrees of freedom
//! `df`. For each there is a variant whose scale is `kappa * I`, which avoids building the
//! identity matrix and keeps `kappa` a plain real parameter.
//!
//! An Inverse-Wishart draw with scale `S0` is the inverse of a Wishart draw with scale `S0^-1`.
//! Sampling uses that duality directly: `df` zero-mean Gaussian vectors are drawn with precision
//! `S0`, their outer products are summed, and the sum is inverted. Wishart draws use Gaussian
//! vectors with covariance equal to the scale and skip the inversion.
//!
//! Densities are fully normalised and return `NEG_INFINITY` whenever an argument that has to be
//! positive definite is not, so that such states are rejected by the sampler.

use super::ln_multivariate_gamma;
use crate::matrix::{outer, NumericMatrix, PrecisionMatrix};
use crate::random::RandomNumberGenerator;
use crate::util::{DagmcError, Result};

use ndarray::Array1;

use std::f64::consts::LN_2;

/// ln IW(z | scale, df)
pub fn inverse_wishart_ln_pdf(scale: &PrecisionMatrix, df: u64, z: &PrecisionMatrix) -> f64 {
    let dim = z.dim();
    if scale.dim() != dim || !scale.is_positive() {
        return f64::NEG_INFINITY;
    }

    let trace = (scale.elements() * z.inverse()).sum();
    inverse_wishart_kernel(scale.log_det(), trace, df, z)
}

/// ln IW(z | kappa * I, df)
pub fn inverse_wishart_scaled_identity_ln_pdf(kappa: f64, df: u64, z: &PrecisionMatrix) -> f64 {
    if !(kappa > 0.0) {
        return f64::NEG_INFINITY;
    }

    let dim = z.dim() as f64;
    let trace = kappa * z.inverse().diag().sum();
    inverse_wishart_kernel(dim * kappa.ln(), trace, df, z)
}

/// Shared part of both Inverse-Wishart densities, given `ln|scale|` and `tr(scale z^-1)`
fn inverse_wishart_kernel(scale_log_det: f64, trace: f64, df: u64, z: &PrecisionMatrix) -> f64 {
    let dim = z.dim();
    if !valid_degrees_of_freedom(df, dim) || !z.is_positive() {
        return f64::NEG_INFINITY;
    }

    let nu = df as f64;
    let d = dim as f64;

    0.5 * nu * scale_log_det
        - 0.5 * (nu + d + 1.0) * z.log_det()
        - 0.5 * trace
        - 0.5 * nu * d * LN_2
        - ln_multivariate_gamma(0.5 * nu, dim)
}

/// ln W(z | scale, df)
pub fn wishart_ln_pdf(scale: &PrecisionMatrix, df: u64, z: &PrecisionMatrix) -> f64 {
    let dim = z.dim();
    if scale.dim() != dim || !scale.is_positive() {
        return f64::NEG_INFINITY;
    }

    let trace = (scale.inverse() * z.elements()).sum();
    wishart_kernel(scale.log_det(), trace, df, z)
}

/// ln W(z | kappa * I, df)
pub fn wishart_scaled_identity_ln_pdf(kappa: f64, df: u64, z: &PrecisionMatrix) -> f64 {
    if !(kappa > 0.0) {
        return f64::NEG_INFINITY;
    }

    let dim = z.dim() as f64;
    wishart_kernel(dim * kappa.ln(), z.trace() / kappa, df, z)
}

/// Shared part of both Wishart densities, given `ln|scale|` and `tr(scale^-1 z)`
fn wishart_kernel(scale_log_det: f64, trace: f64, df: u64, z: &PrecisionMatrix) -> f64 {
    let dim = z.dim();
    if !valid_degrees_of_freedom(df, dim) || !z.is_positive() {
        return f64::NEG_INFINITY;
    }

    let nu = df as f64;
    let d = dim as f64;

    0.5 * (nu - d - 1.0) * z.log_det()
        - 0.5 * trace
        - 0.5 * nu * d * LN_2
        - 0.5 * nu * scale_log_det
        - ln_multivariate_gamma(0.5 * nu, dim)
}

/// The densities are proper only for df > dim - 1
fn valid_degrees_of_freedom(df: u64, dim: usize) -> bool {
    dim > 0 && df as f64 > dim as f64 - 1.0
}

/// Draw from IW(scale, df)
pub fn inverse_wishart_sample(
    scale: &PrecisionMatrix,
    df: u64,
    rng: &mut RandomNumberGenerator
) -> Result<PrecisionMatrix> {
    let s = scatter(scale.dim(), df, || scale.draw_normal_sample_precision(rng))?;
    invert(s)
}

/// Draw from IW(kappa * I, df)
pub fn inverse_wishart_scaled_identity_sample(
    kappa: f64,
    dim: usize,
    df: u64,
    rng: &mut RandomNumberGenerator
) -> Result<PrecisionMatrix> {
    check_kappa(kappa)?;
    let sd = 1.0 / kappa.sqrt();
    let s = scatter(dim, df, || Ok(rng.standard_normal_vector(dim) * sd))?;
    invert(s)
}

/// Draw from W(scale, df)
pub fn wishart_sample(
    scale: &PrecisionMatrix,
    df: u64,
    rng: &mut RandomNumberGenerator
) -> Result<PrecisionMatrix> {
    let s = scatter(scale.dim(), df, || scale.draw_normal_sample_covariance(rng))?;
    positive_definite(s)
}

/// Draw from W(kappa * I, df)
pub fn wishart_scaled_identity_sample(
    kappa: f64,
    dim: usize,
    df: u64,
    rng: &mut RandomNumberGenerator
) -> Result<PrecisionMatrix> {
    check_kappa(kappa)?;
    let sd = kappa.sqrt();
    let s = scatter(dim, df, || Ok(rng.standard_normal_vector(dim) * sd))?;
    positive_definite(s)
}

fn check_kappa(kappa: f64) -> Result<()> {
    if kappa > 0.0 {
        Ok(())
    } else {
        Err(DagmcError::InvalidParameter(format!("scale factor must be positive, got {}", kappa)))
    }
}

/// Sum of `df` outer products of vectors produced by `draw`
fn scatter<F>(dim: usize, df: u64, mut draw: F) -> Result<NumericMatrix>
    where F: FnMut() -> Result<Array1<f64>>
{
    let mut s = NumericMatrix::zeros((dim, dim));
    for _ in 0..df {
        let x = draw()?;
        s += &outer(&x, &x);
    }
    Ok(s)
}

fn positive_definite(s: NumericMatrix) -> Result<PrecisionMatrix> {
    let m = PrecisionMatrix::from_array(s)?;
    if m.is_positive() {
        Ok(m)
    } else {
        Err(DagmcError::NotPositiveDefinite)
    }
}

fn invert(s: NumericMatrix) -> Result<PrecisionMatrix> {
    let m = positive_definite(s)?;
    PrecisionMatrix::from_array(m.inverse().clone())
}
