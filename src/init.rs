//! Module containing the initialization routines for the stochastic nodes of a model.

use crate::value::{Value, ValueType};

/// Defines possible ways to initialize a stochastic node.
#[derive(Clone, Debug)]
pub enum Initialization {
    /// A free (latent) variable starting at the given value
    Value(Value),

    /// Observed data. The node is clamped to the given value and never moved.
    Observed(Value)
}

impl Initialization {

    /// The type of the initial value
    pub fn value_type(&self) -> ValueType {
        match self {
            Initialization::Value(v) | Initialization::Observed(v) => v.value_type(),
        }
    }

    /// `true` if the node is clamped to data
    pub fn is_observed(&self) -> bool {
        match self {
            Initialization::Observed(_) => true,
            Initialization::Value(_) => false,
        }
    }

    /// Split into the initial value and the clamped flag
    pub fn into_parts(self) -> (Value, bool) {
        match self {
            Initialization::Value(v) => (v, false),
            Initialization::Observed(v) => (v, true),
        }
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn parts() {
        let init = Initialization::Observed(Value::Real(1.5));
        assert!(init.is_observed());
        assert_eq!(ValueType::Real, init.value_type());
        assert_eq!((Value::Real(1.5), true), init.into_parts());

        let init = Initialization::Value(Value::Natural(3));
        assert!(!init.is_observed());
        assert_eq!((Value::Natural(3), false), init.into_parts());
    }
}
