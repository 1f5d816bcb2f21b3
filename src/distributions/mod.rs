//! Defines the `Distribution` trait - the density and sampler bound to a stochastic node.
//!
//! A distribution is stateless: its parameters are the values of the stochastic node's parents,
//! passed in the order given by `parameter_types()`.

use crate::random::RandomNumberGenerator;
use crate::util::Result;
use crate::value::{Value, ValueType};

use std::any::Any;
use std::fmt;

pub mod multivariate_normal;
pub mod univariate;
pub mod wishart;

pub use self::multivariate_normal::{MultivariateNormal, Parameterization};
pub use self::univariate::{Exponential, Gamma, Normal, Uniform};
pub use self::wishart::{InverseWishart, Scale, Wishart};

pub trait Distribution: fmt::Debug {

    /// The name of the family, used in log messages and errors
    fn name(&self) -> &'static str;

    /// The declared types of the parameters, in order
    fn parameter_types(&self) -> Vec<ValueType>;

    /// The declared type of the random variable
    fn value_type(&self) -> ValueType;

    /// ln p(value | params). Values outside the support and invalid parameters give
    /// `NEG_INFINITY`; this never fails.
    fn ln_pdf(&self, params: &[&Value], value: &Value) -> f64;

    /// Draw a value given the parameters
    fn sample(&self, params: &[&Value], rng: &mut RandomNumberGenerator) -> Result<Value>;

    /// Access to the concrete type, for moves that only work with one family
    fn as_any(&self) -> &dyn Any;

}
