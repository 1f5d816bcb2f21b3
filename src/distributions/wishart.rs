//! The Wishart and Inverse-Wishart distributions as node distributions.

use super::Distribution;
use crate::random::RandomNumberGenerator;
use crate::statistics::wishart;
use crate::util::Result;
use crate::value::{Value, ValueType};

use std::any::Any;

/// How the scale of a (Inverse-)Wishart distribution is given
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scale {

    /// The first parameter is the full scale matrix
    Matrix,

    /// The first parameter is a real `kappa`; the scale is `kappa * I` of the given dimension
    ScaledIdentity { dim: usize }
}

impl Scale {

    fn parameter_type(&self) -> ValueType {
        match self {
            Scale::Matrix => ValueType::Matrix,
            Scale::ScaledIdentity { .. } => ValueType::Real,
        }
    }

}

/// IW(scale, df) over symmetric positive definite matrices.
///
/// Parameters: `[scale: Matrix, df: Natural]` or `[kappa: Real, df: Natural]`.
#[derive(Clone, Copy, Debug)]
pub struct InverseWishart {
    scale: Scale
}

impl InverseWishart {

    pub fn new(scale: Scale) -> Self {
        InverseWishart { scale }
    }

    /// Inverse-Wishart with a full scale matrix parameter
    pub fn with_scale_matrix() -> Self {
        InverseWishart::new(Scale::Matrix)
    }

    /// Inverse-Wishart with scale `kappa * I` of dimension `dim`
    pub fn with_scaled_identity(dim: usize) -> Self {
        InverseWishart::new(Scale::ScaledIdentity { dim })
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

}

impl Distribution for InverseWishart {

    fn name(&self) -> &'static str {
        "InverseWishart"
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        vec![self.scale.parameter_type(), ValueType::Natural]
    }

    fn value_type(&self) -> ValueType {
        ValueType::Matrix
    }

    fn ln_pdf(&self, params: &[&Value], value: &Value) -> f64 {
        let z = value.matrix();
        let df = params[1].natural();
        match self.scale {
            Scale::Matrix => wishart::inverse_wishart_ln_pdf(params[0].matrix(), df, z),
            Scale::ScaledIdentity { dim } if dim == z.dim() => {
                wishart::inverse_wishart_scaled_identity_ln_pdf(params[0].real(), df, z)
            },
            Scale::ScaledIdentity { .. } => f64::NEG_INFINITY,
        }
    }

    fn sample(&self, params: &[&Value], rng: &mut RandomNumberGenerator) -> Result<Value> {
        let df = params[1].natural();
        let draw = match self.scale {
            Scale::Matrix => wishart::inverse_wishart_sample(params[0].matrix(), df, rng)?,
            Scale::ScaledIdentity { dim } => {
                wishart::inverse_wishart_scaled_identity_sample(params[0].real(), dim, df, rng)?
            },
        };
        Ok(Value::Matrix(draw))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

}

/// W(scale, df) over symmetric positive definite matrices.
///
/// Parameters: `[scale: Matrix, df: Natural]` or `[kappa: Real, df: Natural]`.
#[derive(Clone, Copy, Debug)]
pub struct Wishart {
    scale: Scale
}

impl Wishart {

    pub fn new(scale: Scale) -> Self {
        Wishart { scale }
    }

    /// Wishart with a full scale matrix parameter
    pub fn with_scale_matrix() -> Self {
        Wishart::new(Scale::Matrix)
    }

    /// Wishart with scale `kappa * I` of dimension `dim`
    pub fn with_scaled_identity(dim: usize) -> Self {
        Wishart::new(Scale::ScaledIdentity { dim })
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

}

impl Distribution for Wishart {

    fn name(&self) -> &'static str {
        "Wishart"
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        vec![self.scale.parameter_type(), ValueType::Natural]
    }

    fn value_type(&self) -> ValueType {
        ValueType::Matrix
    }

    fn ln_pdf(&self, params: &[&Value], value: &Value) -> f64 {
        let z = value.matrix();
        let df = params[1].natural();
        match self.scale {
            Scale::Matrix => wishart::wishart_ln_pdf(params[0].matrix(), df, z),
            Scale::ScaledIdentity { dim } if dim == z.dim() => {
                wishart::wishart_scaled_identity_ln_pdf(params[0].real(), df, z)
            },
            Scale::ScaledIdentity { .. } => f64::NEG_INFINITY,
        }
    }

    fn sample(&self, params: &[&Value], rng: &mut RandomNumberGenerator) -> Result<Value> {
        let df = params[1].natural();
        let draw = match self.scale {
            Scale::Matrix => wishart::wishart_sample(params[0].matrix(), df, rng)?,
            Scale::ScaledIdentity { dim } => {
                wishart::wishart_scaled_identity_sample(params[0].real(), dim, df, rng)?
            },
        };
        Ok(Value::Matrix(draw))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

}
