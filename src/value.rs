//! Definition of the value module
//!
//! A `Value` is what a node of the model holds: a real number, a count, a vector or a symmetric
//! matrix. Every function and distribution declares the `ValueType`s it consumes and produces, so
//! mismatches are caught while the graph is built rather than while it is evaluated.

use crate::matrix::PrecisionMatrix;

use ndarray::Array1;

use std::fmt;

/// The declared type of a node's value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Real,
    Natural,
    Vector,
    Matrix
}

impl fmt::Display for ValueType {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ValueType::Real => "Real",
            ValueType::Natural => "Natural",
            ValueType::Vector => "Vector",
            ValueType::Matrix => "Matrix",
        };
        write!(f, "{}", name)
    }

}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {

    /// A real number
    Real(f64),

    /// A non-negative integer, e.g. degrees of freedom
    Natural(u64),

    /// A vector of reals
    Vector(Array1<f64>),

    /// A symmetric matrix
    Matrix(PrecisionMatrix)
}

impl Value {

    /// The `ValueType` of this `Value`
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Real(_) => ValueType::Real,
            Value::Natural(_) => ValueType::Natural,
            Value::Vector(_) => ValueType::Vector,
            Value::Matrix(_) => ValueType::Matrix,
        }
    }

    /// # Panics
    /// if this is not a `Value::Real`
    pub fn real(&self) -> f64 {
        match self {
            Value::Real(x) => *x,
            other => panic!("expected a Real value, found {}", other.value_type()),
        }
    }

    /// # Panics
    /// if this is not a `Value::Natural`
    pub fn natural(&self) -> u64 {
        match self {
            Value::Natural(n) => *n,
            other => panic!("expected a Natural value, found {}", other.value_type()),
        }
    }

    /// # Panics
    /// if this is not a `Value::Vector`
    pub fn vector(&self) -> &Array1<f64> {
        match self {
            Value::Vector(v) => v,
            other => panic!("expected a Vector value, found {}", other.value_type()),
        }
    }

    /// # Panics
    /// if this is not a `Value::Matrix`
    pub fn matrix(&self) -> &PrecisionMatrix {
        match self {
            Value::Matrix(m) => m,
            other => panic!("expected a Matrix value, found {}", other.value_type()),
        }
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn types() {
        assert_eq!(ValueType::Real, Value::Real(1.0).value_type());
        assert_eq!(ValueType::Natural, Value::Natural(3).value_type());
        assert_eq!(ValueType::Vector, Value::Vector(array![1.0, 2.0]).value_type());
        assert_eq!(ValueType::Matrix, Value::Matrix(PrecisionMatrix::identity(2)).value_type());
        assert_eq!("Matrix", ValueType::Matrix.to_string());
    }

    #[test]
    fn accessors() {
        assert_eq!(1.5, Value::Real(1.5).real());
        assert_eq!(4, Value::Natural(4).natural());
        assert_eq!(&array![1.0], Value::Vector(array![1.0]).vector());
        assert_eq!(2, Value::Matrix(PrecisionMatrix::identity(2)).matrix().dim());
    }

    #[test]
    #[should_panic]
    fn wrong_accessor() {
        Value::Natural(4).real();
    }
}
