//! An implementation of the builder pattern for assembling a `Model`.

use crate::distributions::Distribution;
use crate::functions::Function;
use crate::init::Initialization;
use crate::util::{DagmcError, Result};
use crate::value::{Value, ValueType};
use super::Model;
use super::node::{DagNode, NodeIndex};

use indexmap::IndexMap;
use tracing::debug;

/// Builds a `Model` one node at a time.
///
/// Nodes must be added in topological order: every parent is named by a node added earlier.
/// Each node is evaluated as it is added, so the built model is clean. The first error
/// encountered is latched and returned by `build`; later additions are ignored.
pub struct ModelBuilder {

    /// The nodes added so far, in topological order
    nodes: IndexMap<String, DagNode>,

    /// The error state of the builder
    err: Option<DagmcError>

}

impl Default for ModelBuilder {
    fn default() -> Self {
        ModelBuilder::new()
    }
}

impl ModelBuilder {

    /// Construct a new `ModelBuilder` representing an empty `Model`
    pub fn new() -> Self {
        ModelBuilder {
            nodes: IndexMap::new(),
            err: None
        }
    }

    /// Add a constant (hyperparameter) node.
    pub fn with_constant(mut self, name: &str, value: Value) -> Self {
        if self.err.is_some() {
            return self;
        }

        if self.nodes.contains_key(name) {
            self.err = Some(DagmcError::DuplicateNode(name.to_string()));
            return self;
        }

        self.insert(name, DagNode::new_constant(value))
    }

    /// Add a deterministic node.
    ///
    /// # Args
    /// * `name`: the unique name of the node
    /// * `function`: computes the node's value from its parents
    /// * `parents`: the names of the arguments, in order. The parents must already be in the model.
    pub fn with_deterministic<F: Function + 'static>(mut self, name: &str, function: F, parents: &[&str]) -> Self {
        if self.err.is_some() {
            return self;
        }

        let parents = match self.resolve(name, parents, &function.argument_types()) {
            Ok(p) => p,
            Err(e) => {
                self.err = Some(e);
                return self;
            }
        };

        let value = function.compute(&self.values(&parents));
        self.insert(name, DagNode::new_deterministic(Box::new(function), parents, value))
    }

    /// Add a stochastic node.
    ///
    /// # Args
    /// * `name`: the unique name of the node
    /// * `distribution`: the distribution of the node given its parents
    /// * `parents`: the names of the distribution's parameters, in order. The parents must
    ///   already be in the model.
    /// * `init`: the initial value, and whether it is observed
    pub fn with_stochastic<D: Distribution + 'static>(
        mut self,
        name: &str,
        distribution: D,
        parents: &[&str],
        init: Initialization
    ) -> Self {
        ///////////////////////////////////////////////////////////////////////
        // 1) if we are in an error state, do nothing
        if self.err.is_some() {
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 2) Check for error conditions
        let parents = match self.resolve(name, parents, &distribution.parameter_types()) {
            Ok(p) => p,
            Err(e) => {
                self.err = Some(e);
                return self;
            }
        };

        if init.value_type() != distribution.value_type() {
            self.err = Some(DagmcError::TypeMismatch {
                node: name.to_string(),
                expected: distribution.value_type(),
                found: init.value_type()
            });
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 3) Score the initial value
        let (value, clamped) = init.into_parts();
        if let Value::Matrix(m) = &value {
            assert!(m.is_updated(), "initial matrix value of '{}' must be updated", name);
        }
        let ln_probability = distribution.ln_pdf(&self.values(&parents), &value);

        ///////////////////////////////////////////////////////////////////////
        // 4) Add to current model
        let node = DagNode::new_stochastic(Box::new(distribution), parents, value, clamped, ln_probability);
        self.insert(name, node)
    }

    /// Complete building the model.
    ///
    /// # Returns
    /// the `Model`, or the first error generated during the building process
    pub fn build(self) -> Result<Model> {
        match self.err {
            Some(e) => Err(e),
            None => {
                debug!(nodes = self.nodes.len(), "built model");
                Ok(Model::from_nodes(self.nodes))
            }
        }
    }

    /// Look up the parents of a new node and check them against the declared parameter types
    fn resolve(&self, name: &str, parents: &[&str], types: &[ValueType]) -> Result<Vec<NodeIndex>> {
        if self.nodes.contains_key(name) {
            return Err(DagmcError::DuplicateNode(name.to_string()));
        }

        if parents.len() != types.len() {
            return Err(DagmcError::ArityMismatch {
                node: name.to_string(),
                expected: types.len(),
                found: parents.len()
            });
        }

        parents.iter()
               .zip(types)
               .map(|(parent, &expected)| {
                   let (index, _, node) = self.nodes
                                              .get_full(*parent)
                                              .ok_or_else(|| DagmcError::UnknownNode(parent.to_string()))?;
                   if node.value_type() != expected {
                       return Err(DagmcError::TypeMismatch {
                           node: name.to_string(),
                           expected,
                           found: node.value_type()
                       });
                   }
                   Ok(NodeIndex(index))
               })
               .collect()
    }

    fn values(&self, parents: &[NodeIndex]) -> Vec<&Value> {
        parents.iter()
               .filter_map(|p| self.nodes.get_index(p.0))
               .map(|(_, node)| node.cached_value())
               .collect()
    }

    fn insert(mut self, name: &str, node: DagNode) -> Self {
        let index = NodeIndex(self.nodes.len());
        for p in node.parents().to_vec() {
            if let Some((_, parent)) = self.nodes.get_index_mut(p.0) {
                if !parent.children.contains(&index) {
                    parent.children.push(index);
                }
            }
        }

        debug!(node = name, index = index.0, "added node");
        self.nodes.insert(name.to_string(), node);
        self
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::distributions::{Normal, Uniform};
    use crate::functions::{Add, Exp};

    #[test]
    fn build_empty() {
        let model = ModelBuilder::new().build().unwrap();
        assert_eq!(0, model.len());
        assert!(model.is_empty());
    }

    #[test]
    fn build_chain() {
        let mut model = ModelBuilder::new()
            .with_constant("zero", Value::Real(0.0))
            .with_constant("one", Value::Real(1.0))
            .with_stochastic("x", Normal, &["zero", "one"], Initialization::Value(Value::Real(0.5)))
            .with_deterministic("sd", Exp, &["x"])
            .with_stochastic("y", Normal, &["x", "sd"], Initialization::Observed(Value::Real(2.0)))
            .build()
            .unwrap();

        assert_eq!(5, model.len());
        let x = model.lookup("x").unwrap();
        let sd = model.lookup("sd").unwrap();
        let y = model.lookup("y").unwrap();

        assert_eq!("sd", model.name(sd));
        assert_eq!(&[sd, y], model.children(x));
        assert_eq!(&[x, sd], model.parents(y));
        assert!(model.is_clamped(y));
        assert!(!model.is_clamped(x));
        assert!((0..model.len()).all(|i| !model.is_dirty(NodeIndex(i))));

        assert_eq!(&Value::Real(0.5_f64.exp()), model.current_value(sd));
        let expected = crate::statistics::normal_ln_pdf(2.0, 0.5, 0.5_f64.exp());
        assert!((model.ln_probability(y) - expected).abs() < 1e-12);
    }

    #[test]
    fn unknown_parent() {
        let model = ModelBuilder::new()
            .with_stochastic("x", Normal, &["m", "s"], Initialization::Value(Value::Real(0.0)))
            .build();
        assert_eq!(Err(DagmcError::UnknownNode(String::from("m"))), model.map(|_| ()));
    }

    #[test]
    fn duplicate_node() {
        let model = ModelBuilder::new()
            .with_constant("a", Value::Real(0.0))
            .with_constant("a", Value::Real(1.0))
            .build();
        assert_eq!(Err(DagmcError::DuplicateNode(String::from("a"))), model.map(|_| ()));
    }

    #[test]
    fn arity_mismatch() {
        let model = ModelBuilder::new()
            .with_constant("a", Value::Real(0.0))
            .with_deterministic("b", Add, &["a"])
            .build();
        let expected = DagmcError::ArityMismatch { node: String::from("b"), expected: 2, found: 1 };
        assert_eq!(Err(expected), model.map(|_| ()));
    }

    #[test]
    fn parent_type_mismatch() {
        let model = ModelBuilder::new()
            .with_constant("n", Value::Natural(3))
            .with_constant("a", Value::Real(1.0))
            .with_stochastic("x", Uniform, &["n", "a"], Initialization::Value(Value::Real(0.0)))
            .build();
        let expected = DagmcError::TypeMismatch {
            node: String::from("x"),
            expected: ValueType::Real,
            found: ValueType::Natural
        };
        assert_eq!(Err(expected), model.map(|_| ()));
    }

    #[test]
    fn initial_value_type_mismatch() {
        let model = ModelBuilder::new()
            .with_constant("a", Value::Real(0.0))
            .with_constant("b", Value::Real(1.0))
            .with_stochastic("x", Uniform, &["a", "b"], Initialization::Value(Value::Natural(0)))
            .build();
        let expected = DagmcError::TypeMismatch {
            node: String::from("x"),
            expected: ValueType::Real,
            found: ValueType::Natural
        };
        assert_eq!(Err(expected), model.map(|_| ()));
    }

    #[test]
    fn first_error_is_latched() {
        let model = ModelBuilder::new()
            .with_constant("a", Value::Real(0.0))
            .with_deterministic("b", Exp, &["missing"])
            .with_constant("a", Value::Real(0.0))
            .build();
        assert_eq!(Err(DagmcError::UnknownNode(String::from("missing"))), model.map(|_| ()));
    }
}
