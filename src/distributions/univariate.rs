//! Distributions over a single real number.

use super::Distribution;
use crate::random::RandomNumberGenerator;
use crate::statistics::{ln_gamma, normal_ln_pdf};
use crate::util::{DagmcError, Result};
use crate::value::{Value, ValueType};

use std::any::Any;

/// N(mean, sd^2). Parameters: `[mean: Real, sd: Real]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Normal;

impl Distribution for Normal {

    fn name(&self) -> &'static str {
        "Normal"
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        vec![ValueType::Real, ValueType::Real]
    }

    fn value_type(&self) -> ValueType {
        ValueType::Real
    }

    fn ln_pdf(&self, params: &[&Value], value: &Value) -> f64 {
        normal_ln_pdf(value.real(), params[0].real(), params[1].real())
    }

    fn sample(&self, params: &[&Value], rng: &mut RandomNumberGenerator) -> Result<Value> {
        let (mean, sd) = (params[0].real(), params[1].real());
        if !(sd > 0.0) {
            return Err(DagmcError::InvalidParameter(format!("Normal standard deviation {}", sd)));
        }
        Ok(Value::Real(mean + sd * rng.standard_normal()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

}

/// U(lower, upper). Parameters: `[lower: Real, upper: Real]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uniform;

impl Distribution for Uniform {

    fn name(&self) -> &'static str {
        "Uniform"
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        vec![ValueType::Real, ValueType::Real]
    }

    fn value_type(&self) -> ValueType {
        ValueType::Real
    }

    fn ln_pdf(&self, params: &[&Value], value: &Value) -> f64 {
        let (lower, upper) = (params[0].real(), params[1].real());
        let x = value.real();
        if !(upper > lower) || x < lower || x > upper {
            f64::NEG_INFINITY
        } else {
            -(upper - lower).ln()
        }
    }

    fn sample(&self, params: &[&Value], rng: &mut RandomNumberGenerator) -> Result<Value> {
        let (lower, upper) = (params[0].real(), params[1].real());
        if !(upper > lower) {
            return Err(DagmcError::InvalidParameter(format!("Uniform bounds [{}, {}]", lower, upper)));
        }
        Ok(Value::Real(lower + (upper - lower) * rng.uniform01()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

}

/// Exp(rate). Parameters: `[rate: Real]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Exponential;

impl Distribution for Exponential {

    fn name(&self) -> &'static str {
        "Exponential"
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        vec![ValueType::Real]
    }

    fn value_type(&self) -> ValueType {
        ValueType::Real
    }

    fn ln_pdf(&self, params: &[&Value], value: &Value) -> f64 {
        let rate = params[0].real();
        let x = value.real();
        if !(rate > 0.0) || x < 0.0 {
            f64::NEG_INFINITY
        } else {
            rate.ln() - rate * x
        }
    }

    fn sample(&self, params: &[&Value], rng: &mut RandomNumberGenerator) -> Result<Value> {
        let rate = params[0].real();
        if !(rate > 0.0) {
            return Err(DagmcError::InvalidParameter(format!("Exponential rate {}", rate)));
        }
        rng.exponential(rate).map(Value::Real)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

}

/// Gamma(shape, rate). Parameters: `[shape: Real, rate: Real]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Gamma;

impl Distribution for Gamma {

    fn name(&self) -> &'static str {
        "Gamma"
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        vec![ValueType::Real, ValueType::Real]
    }

    fn value_type(&self) -> ValueType {
        ValueType::Real
    }

    fn ln_pdf(&self, params: &[&Value], value: &Value) -> f64 {
        let (shape, rate) = (params[0].real(), params[1].real());
        let x = value.real();
        if !(shape > 0.0 && rate > 0.0) || x <= 0.0 {
            f64::NEG_INFINITY
        } else {
            shape * rate.ln() - ln_gamma(shape) + (shape - 1.0) * x.ln() - rate * x
        }
    }

    fn sample(&self, params: &[&Value], rng: &mut RandomNumberGenerator) -> Result<Value> {
        let (shape, rate) = (params[0].real(), params[1].real());
        rng.gamma(shape, 1.0 / rate).map(Value::Real)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

}
