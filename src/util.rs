//! Defines the `Error` type for the dagmc library

use crate::value::ValueType;

use std::error::Error;
use std::fmt;
use std::result;

pub type Result<T> = result::Result<T, DagmcError>;

#[derive(Clone, Debug, PartialEq)]
pub enum DagmcError {

    /// A node was referenced by a name that is not in the model
    UnknownNode(String),

    /// A node with the given name was added to the model twice
    DuplicateNode(String),

    /// A value of the wrong type was supplied where the declared type was required
    TypeMismatch { node: String, expected: ValueType, found: ValueType },

    /// A function or distribution was given the wrong number of parents
    ArityMismatch { node: String, expected: usize, found: usize },

    /// An operation that only applies to stochastic nodes was given another kind of node
    NotStochastic(String),

    /// An attempt to change the value of an observed node
    ClampedNode(String),

    /// A move was bound to a node whose distribution is not the family it works on
    WrongDistribution { node: String, expected: &'static str },

    /// A conjugate move found no children from which to form sufficient statistics
    NoEligibleChildren(String),

    /// A conjugate move's target has a child whose density it cannot account for
    IneligibleChild { node: String, child: String },

    /// A parameter (weight, tuning value, setting, matrix shape) is outside its domain
    InvalidParameter(String),

    /// A sampler was asked to run without any moves
    NoMoves,

    /// A matrix had to be positive definite and was not
    NotPositiveDefinite,

    /// A general error with the given description
    General(String),

}

impl Error for DagmcError {}

impl fmt::Display for DagmcError {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DagmcError::UnknownNode(name) => write!(f, "No node named '{}' in the model", name),
            DagmcError::DuplicateNode(name) => write!(f, "A node named '{}' already exists", name),
            DagmcError::TypeMismatch { node, expected, found } => {
                write!(f, "Type mismatch at node '{}': expected {}, found {}", node, expected, found)
            },
            DagmcError::ArityMismatch { node, expected, found } => {
                write!(f, "Node '{}' requires {} parents but was given {}", node, expected, found)
            },
            DagmcError::NotStochastic(name) => write!(f, "Node '{}' is not a stochastic node", name),
            DagmcError::ClampedNode(name) => write!(f, "Node '{}' is clamped to observed data", name),
            DagmcError::WrongDistribution { node, expected } => {
                write!(f, "Node '{}' must carry a {} distribution", node, expected)
            },
            DagmcError::NoEligibleChildren(name) => {
                write!(f, "Node '{}' has no children usable for a conjugate update", name)
            },
            DagmcError::IneligibleChild { node, child } => {
                write!(f, "Node '{}' has child '{}', which does not fit its conjugate update", node, child)
            },
            DagmcError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            DagmcError::NoMoves => write!(f, "At least one move is required"),
            DagmcError::NotPositiveDefinite => write!(f, "Encountered a matrix that is not positive definite"),
            DagmcError::General(msg) => write!(f, "{}", msg),
        }
    }

}
