//! The multivariate normal distribution.

use super::Distribution;
use crate::random::RandomNumberGenerator;
use crate::util::{DagmcError, Result};
use crate::value::{Value, ValueType};

use std::any::Any;
use std::f64::consts::PI;

/// How the matrix parameter of a `MultivariateNormal` is read
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parameterization {
    Covariance,
    Precision
}

/// N(mean, Sigma) or N(mean, Omega^-1). Parameters: `[mean: Vector, matrix: Matrix]`.
#[derive(Clone, Copy, Debug)]
pub struct MultivariateNormal {
    parameterization: Parameterization
}

impl MultivariateNormal {

    pub fn with_covariance() -> Self {
        MultivariateNormal { parameterization: Parameterization::Covariance }
    }

    pub fn with_precision() -> Self {
        MultivariateNormal { parameterization: Parameterization::Precision }
    }

    pub fn parameterization(&self) -> Parameterization {
        self.parameterization
    }

}

impl Distribution for MultivariateNormal {

    fn name(&self) -> &'static str {
        "MultivariateNormal"
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        vec![ValueType::Vector, ValueType::Matrix]
    }

    fn value_type(&self) -> ValueType {
        ValueType::Vector
    }

    fn ln_pdf(&self, params: &[&Value], value: &Value) -> f64 {
        let mean = params[0].vector();
        let m = params[1].matrix();
        let x = value.vector();

        let dim = x.len();
        if mean.len() != dim || m.dim() != dim || !m.is_positive() {
            return f64::NEG_INFINITY;
        }

        let r = x - mean;
        let (quadratic, half_log_det) = match self.parameterization {
            Parameterization::Covariance => (r.dot(&m.inverse().dot(&r)), -0.5 * m.log_det()),
            Parameterization::Precision => (r.dot(&m.elements().dot(&r)), 0.5 * m.log_det()),
        };

        -0.5 * dim as f64 * (2.0 * PI).ln() + half_log_det - 0.5 * quadratic
    }

    fn sample(&self, params: &[&Value], rng: &mut RandomNumberGenerator) -> Result<Value> {
        let mean = params[0].vector();
        let m = params[1].matrix();
        if mean.len() != m.dim() {
            return Err(DagmcError::InvalidParameter(
                format!("mean of length {} with a {}x{} matrix", mean.len(), m.dim(), m.dim())
            ));
        }

        let noise = match self.parameterization {
            Parameterization::Covariance => m.draw_normal_sample_covariance(rng)?,
            Parameterization::Precision => m.draw_normal_sample_precision(rng)?,
        };
        Ok(Value::Vector(noise + mean))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::matrix::PrecisionMatrix;
    use crate::statistics::normal_ln_pdf;

    #[test]
    fn diagonal_covariance_factorises() {
        let mean = Value::Vector(array![1.0, -1.0]);
        let cov = Value::Matrix(PrecisionMatrix::from_array(array![[4.0, 0.0], [0.0, 0.25]]).unwrap());
        let x = Value::Vector(array![2.0, 0.0]);

        let expected = normal_ln_pdf(2.0, 1.0, 2.0) + normal_ln_pdf(0.0, -1.0, 0.5);
        let actual = MultivariateNormal::with_covariance().ln_pdf(&[&mean, &cov], &x);
        assert!((actual - expected).abs() < 1e-12);
    }

    #[test]
    fn precision_is_inverse_covariance() {
        let mean = Value::Vector(array![0.5, 0.0, -0.5]);
        let cov = PrecisionMatrix::from_array(array![[2.0, 0.3, 0.1], [0.3, 1.0, 0.2], [0.1, 0.2, 1.5]]).unwrap();
        let prec = PrecisionMatrix::from_array(cov.inverse().clone()).unwrap();
        let x = Value::Vector(array![1.0, 2.0, 3.0]);

        let a = MultivariateNormal::with_covariance().ln_pdf(&[&mean, &Value::Matrix(cov)], &x);
        let b = MultivariateNormal::with_precision().ln_pdf(&[&mean, &Value::Matrix(prec)], &x);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn degenerate_covariance_is_impossible() {
        let mean = Value::Vector(array![0.0, 0.0]);
        let cov = Value::Matrix(PrecisionMatrix::from_array(array![[1.0, 1.0], [1.0, 1.0]]).unwrap());
        let x = Value::Vector(array![0.0, 0.0]);

        assert_eq!(f64::NEG_INFINITY, MultivariateNormal::with_covariance().ln_pdf(&[&mean, &cov], &x));
    }

    #[test]
    fn sample_is_centred_on_mean() {
        let mean = Value::Vector(array![3.0, -2.0]);
        let cov = Value::Matrix(PrecisionMatrix::from_array(array![[1.0, 0.5], [0.5, 2.0]]).unwrap());
        let mut rng = RandomNumberGenerator::seeded(4);

        let n = 10_000;
        let mut sum = array![0.0, 0.0];
        for _ in 0..n {
            sum += MultivariateNormal::with_covariance().sample(&[&mean, &cov], &mut rng).unwrap().vector();
        }
        sum /= n as f64;
        assert!((sum[0] - 3.0).abs() < 0.05);
        assert!((sum[1] + 2.0).abs() < 0.06);
    }
}
