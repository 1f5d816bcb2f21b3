//! Definition of the nodes of a `Model`.
//!
//! Every node caches its value and, if stochastic, its log-probability. The cache of a node is
//! valid only while the node is clean; a dirty node recomputes on the next read. The first time a
//! node becomes dirty within a proposal it stores its pre-proposal state, which `restore` reverts
//! to and `keep` discards.

use crate::distributions::Distribution;
use crate::functions::Function;
use crate::value::{Value, ValueType};

use std::mem;

/// A handle to a node of a `Model`. Handles are only meaningful for the model that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {

    /// The position of the node in the model's topological order
    pub fn index(&self) -> usize {
        self.0
    }

}

/// The state of a node before the current proposal touched it
#[derive(Clone, Debug)]
pub(crate) struct StoredState {

    /// The previous value, if the value itself changed (or, for deterministic nodes, may change)
    value: Option<Value>,

    /// The previous log-probability of a stochastic node
    ln_probability: f64

}

/// A fixed value, such as a hyperparameter
#[derive(Debug)]
pub struct ConstantNode {
    value: Value
}

/// A node whose value is a function of its parents
#[derive(Debug)]
pub struct DeterministicNode {
    function: Box<dyn Function>,
    value: Value
}

impl DeterministicNode {

    pub fn function(&self) -> &dyn Function {
        self.function.as_ref()
    }

}

/// A random variable, scored by a distribution parameterised by its parents
#[derive(Debug)]
pub struct StochasticNode {
    distribution: Box<dyn Distribution>,
    value: Value,

    /// `true` if the value is observed data
    clamped: bool,

    /// Cached `ln p(value | parents)`
    ln_probability: f64
}

impl StochasticNode {

    pub fn distribution(&self) -> &dyn Distribution {
        self.distribution.as_ref()
    }

    pub fn is_clamped(&self) -> bool {
        self.clamped
    }

}

#[derive(Debug)]
pub enum NodeKind {
    Constant(ConstantNode),
    Deterministic(DeterministicNode),
    Stochastic(StochasticNode)
}

/// A node of the model graph.
#[derive(Debug)]
pub struct DagNode {

    /// The declared type of the node's value
    value_type: ValueType,

    /// The nodes this node reads from, in parameter order
    pub(crate) parents: Vec<NodeIndex>,

    /// The nodes reading from this node. Lookup only.
    pub(crate) children: Vec<NodeIndex>,

    kind: NodeKind,

    /// `true` if the cached value (deterministic) or log-probability (stochastic) is stale
    dirty: bool,

    /// Pre-proposal state; present from the first time the node is dirtied until keep/restore
    stored: Option<StoredState>,

    /// The number of times the cache was recomputed
    recomputations: usize

}

impl DagNode {

    pub(crate) fn new_constant(value: Value) -> Self {
        let value_type = value.value_type();
        DagNode::new(value_type, vec![], NodeKind::Constant(ConstantNode { value }))
    }

    pub(crate) fn new_deterministic(function: Box<dyn Function>, parents: Vec<NodeIndex>, value: Value) -> Self {
        let value_type = function.return_type();
        DagNode::new(value_type, parents, NodeKind::Deterministic(DeterministicNode { function, value }))
    }

    pub(crate) fn new_stochastic(
        distribution: Box<dyn Distribution>,
        parents: Vec<NodeIndex>,
        value: Value,
        clamped: bool,
        ln_probability: f64
    ) -> Self {
        let value_type = distribution.value_type();
        let node = StochasticNode { distribution, value, clamped, ln_probability };
        DagNode::new(value_type, parents, NodeKind::Stochastic(node))
    }

    fn new(value_type: ValueType, parents: Vec<NodeIndex>, kind: NodeKind) -> Self {
        DagNode {
            value_type,
            parents,
            children: vec![],
            kind,
            dirty: false,
            stored: None,
            recomputations: 0
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn parents(&self) -> &[NodeIndex] {
        &self.parents
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// `true` if the node's cache is stale
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// `true` if the node holds a pre-proposal snapshot, i.e. it was touched and is not yet settled
    pub fn is_touched(&self) -> bool {
        self.stored.is_some()
    }

    pub fn is_stochastic(&self) -> bool {
        self.stochastic().is_some()
    }

    pub fn is_deterministic(&self) -> bool {
        match self.kind {
            NodeKind::Deterministic(_) => true,
            _ => false
        }
    }

    pub fn is_clamped(&self) -> bool {
        self.stochastic().map_or(false, |s| s.clamped)
    }

    pub fn stochastic(&self) -> Option<&StochasticNode> {
        match &self.kind {
            NodeKind::Stochastic(s) => Some(s),
            _ => None
        }
    }

    pub fn distribution(&self) -> Option<&dyn Distribution> {
        self.stochastic().map(|s| s.distribution())
    }

    pub fn function(&self) -> Option<&dyn Function> {
        match &self.kind {
            NodeKind::Deterministic(d) => Some(d.function()),
            _ => None
        }
    }

    pub fn recomputations(&self) -> usize {
        self.recomputations
    }

    /// `false` only for a deterministic node whose value is stale. A stochastic node's value is
    /// always current; only its log-probability can be stale.
    pub fn value_is_current(&self) -> bool {
        !(self.dirty && self.is_deterministic())
    }

    /// The cached value, current or not
    pub(crate) fn cached_value(&self) -> &Value {
        match &self.kind {
            NodeKind::Constant(c) => &c.value,
            NodeKind::Deterministic(d) => &d.value,
            NodeKind::Stochastic(s) => &s.value,
        }
    }

    /// The cached log-probability; zero for nodes that are not stochastic
    pub(crate) fn cached_ln_probability(&self) -> f64 {
        self.stochastic().map_or(0.0, |s| s.ln_probability)
    }

    /// The log-probability stored when the node was first touched, if it was
    pub(crate) fn stored_ln_probability(&self) -> Option<f64> {
        self.stored.as_ref().map(|s| s.ln_probability)
    }

    /// Mark the cache stale, snapshotting the current state if this proposal has not yet done so
    pub(crate) fn mark_dirty(&mut self) {
        if self.stored.is_none() {
            self.stored = Some(self.snapshot());
        }
        self.dirty = true;
    }

    fn snapshot(&self) -> StoredState {
        match &self.kind {
            NodeKind::Constant(_) => StoredState { value: None, ln_probability: 0.0 },
            NodeKind::Deterministic(d) => StoredState { value: Some(d.value.clone()), ln_probability: 0.0 },
            NodeKind::Stochastic(s) => StoredState { value: None, ln_probability: s.ln_probability },
        }
    }

    /// Replace the value of a stochastic node, keeping the old value in the snapshot
    pub(crate) fn replace_value(&mut self, value: Value) {
        if let NodeKind::Stochastic(s) = &mut self.kind {
            let old = mem::replace(&mut s.value, value);
            match &mut self.stored {
                None => self.stored = Some(StoredState { value: Some(old), ln_probability: s.ln_probability }),
                Some(stored) if stored.value.is_none() => stored.value = Some(old),
                Some(_) => {}
            }
        }
    }

    pub(crate) fn set_clamped(&mut self, clamped: bool) {
        if let NodeKind::Stochastic(s) = &mut self.kind {
            s.clamped = clamped;
        }
    }

    /// Install a freshly computed value (deterministic) or log-probability (stochastic)
    pub(crate) fn set_value_cache(&mut self, value: Value) {
        if let NodeKind::Deterministic(d) = &mut self.kind {
            d.value = value;
            self.dirty = false;
            self.recomputations += 1;
        }
    }

    pub(crate) fn set_ln_probability_cache(&mut self, ln_probability: f64) {
        if let NodeKind::Stochastic(s) = &mut self.kind {
            s.ln_probability = ln_probability;
            self.dirty = false;
            self.recomputations += 1;
        }
    }

    /// Accept: drop the snapshot. The cache must already be current.
    pub(crate) fn commit(&mut self) {
        self.stored = None;
        self.dirty = false;
    }

    /// Reject: return to the snapshot and drop it
    pub(crate) fn revert(&mut self) {
        if let Some(stored) = self.stored.take() {
            match &mut self.kind {
                NodeKind::Constant(_) => {},
                NodeKind::Deterministic(d) => {
                    if let Some(value) = stored.value {
                        d.value = value;
                    }
                },
                NodeKind::Stochastic(s) => {
                    if let Some(value) = stored.value {
                        s.value = value;
                    }
                    s.ln_probability = stored.ln_probability;
                },
            }
        }
        self.dirty = false;
    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::distributions::Normal;

    #[test]
    fn stochastic_node_accessors() {
        let node = DagNode::new_stochastic(
            Box::new(Normal),
            vec![NodeIndex(0), NodeIndex(1)],
            Value::Real(0.5),
            true,
            -1.25
        );

        assert!(node.is_stochastic());
        assert!(!node.is_deterministic());
        assert!(node.is_clamped());
        assert_eq!("Normal", node.distribution().unwrap().name());
        assert!(node.stochastic().unwrap().is_clamped());
        assert_eq!(&[NodeIndex(0), NodeIndex(1)], node.parents());
        assert_eq!(-1.25, node.cached_ln_probability());
    }

    #[test]
    fn constant_node_is_not_stochastic() {
        let node = DagNode::new_constant(Value::Real(2.0));

        assert!(node.stochastic().is_none());
        assert!(node.distribution().is_none());
        assert!(!node.is_clamped());
        assert_eq!(0.0, node.cached_ln_probability());
    }

    #[test]
    fn revert_restores_the_snapshot() {
        let mut node = DagNode::new_stochastic(Box::new(Normal), vec![], Value::Real(0.5), false, -1.0);

        node.mark_dirty();
        node.replace_value(Value::Real(3.0));
        node.set_ln_probability_cache(-7.0);
        assert!(node.is_touched());
        assert_eq!(Some(-1.0), node.stored_ln_probability());

        node.revert();
        assert!(!node.is_touched());
        assert_eq!(&Value::Real(0.5), node.cached_value());
        assert_eq!(-1.0, node.cached_ln_probability());
    }
}
