//! Defines the `Function` trait - the pure function computed by a deterministic node.

use crate::matrix::PrecisionMatrix;
use crate::value::{Value, ValueType};

use std::fmt;

pub trait Function: fmt::Debug {

    fn name(&self) -> &'static str;

    /// The declared types of the arguments, in order
    fn argument_types(&self) -> Vec<ValueType>;

    /// The declared type of the result
    fn return_type(&self) -> ValueType;

    /// Compute the value from the arguments. The arguments are guaranteed to match
    /// `argument_types()`.
    fn compute(&self, args: &[&Value]) -> Value;

}

/// `a + b` over reals
#[derive(Clone, Copy, Debug, Default)]
pub struct Add;

impl Function for Add {

    fn name(&self) -> &'static str {
        "Add"
    }

    fn argument_types(&self) -> Vec<ValueType> {
        vec![ValueType::Real, ValueType::Real]
    }

    fn return_type(&self) -> ValueType {
        ValueType::Real
    }

    fn compute(&self, args: &[&Value]) -> Value {
        Value::Real(args[0].real() + args[1].real())
    }

}

/// `a * b` over reals
#[derive(Clone, Copy, Debug, Default)]
pub struct Multiply;

impl Function for Multiply {

    fn name(&self) -> &'static str {
        "Multiply"
    }

    fn argument_types(&self) -> Vec<ValueType> {
        vec![ValueType::Real, ValueType::Real]
    }

    fn return_type(&self) -> ValueType {
        ValueType::Real
    }

    fn compute(&self, args: &[&Value]) -> Value {
        Value::Real(args[0].real() * args[1].real())
    }

}

/// `e^a`
#[derive(Clone, Copy, Debug, Default)]
pub struct Exp;

impl Function for Exp {

    fn name(&self) -> &'static str {
        "Exp"
    }

    fn argument_types(&self) -> Vec<ValueType> {
        vec![ValueType::Real]
    }

    fn return_type(&self) -> ValueType {
        ValueType::Real
    }

    fn compute(&self, args: &[&Value]) -> Value {
        Value::Real(args[0].real().exp())
    }

}

/// `kappa * I` as a `dim` x `dim` matrix
#[derive(Clone, Copy, Debug)]
pub struct ScaledIdentity {
    pub dim: usize
}

impl Function for ScaledIdentity {

    fn name(&self) -> &'static str {
        "ScaledIdentity"
    }

    fn argument_types(&self) -> Vec<ValueType> {
        vec![ValueType::Real]
    }

    fn return_type(&self) -> ValueType {
        ValueType::Matrix
    }

    fn compute(&self, args: &[&Value]) -> Value {
        Value::Matrix(PrecisionMatrix::scaled_identity(self.dim, args[0].real()))
    }

}
