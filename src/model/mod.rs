//! Defines a `Model`: a directed acyclic graph of constant, deterministic and stochastic nodes
//! representing the factorization of a joint probability density.
//!
//! # Representation
//! The nodes are held in an `IndexMap` keyed by name, in topological order. Edges are recorded
//! on both ends as `NodeIndex` lists; the child lists are back references used only to find the
//! nodes a change propagates to.
//!
//! # Proposals
//! A proposal changes one or more stochastic nodes with `set_value`, which `touch`es the node and
//! marks all of its descendants dirty. Values and log-probabilities are recomputed lazily on the
//! next read. The proposal is then either committed with `keep` or undone with `restore`, each of
//! which walks exactly the touched part of the graph.

mod builder;
mod node;

pub use self::builder::ModelBuilder;
pub use self::node::{ConstantNode, DagNode, DeterministicNode, NodeIndex, NodeKind, StochasticNode};

use crate::distributions::Distribution;
use crate::random::RandomNumberGenerator;
use crate::util::{DagmcError, Result};
use crate::value::{Value, ValueType};

use indexmap::IndexMap;
use tracing::trace;

/// The change in log-probability caused by a proposal, split by the role of the nodes involved
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProbabilityRatio {

    /// Summed over the free stochastic nodes
    pub prior: f64,

    /// Summed over the clamped (observed) stochastic nodes
    pub likelihood: f64

}

impl ProbabilityRatio {

    /// The heated log posterior ratio
    pub fn heated(&self, prior_heat: f64, likelihood_heat: f64) -> f64 {
        prior_heat * self.prior + likelihood_heat * self.likelihood
    }

}

/// A directed acyclic graph of nodes with cached values and log-probabilities.
#[derive(Debug)]
pub struct Model {

    /// The nodes of the graph, in topological order
    nodes: IndexMap<String, DagNode>

}

impl Model {

    pub(crate) fn from_nodes(nodes: IndexMap<String, DagNode>) -> Self {
        Model { nodes }
    }

    /// Get the number of nodes in the `Model`
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, in topological order
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len()).map(NodeIndex)
    }

    /// Lookup a node in the `Model` based on the name
    pub fn lookup(&self, name: &str) -> Option<NodeIndex> {
        self.nodes.get_index_of(name).map(NodeIndex)
    }

    /// Like `lookup`, but an unknown name is an `UnknownNode` error
    pub fn index(&self, name: &str) -> Result<NodeIndex> {
        self.lookup(name).ok_or_else(|| DagmcError::UnknownNode(name.to_string()))
    }

    /// Lookup a node's name in the `Model`.
    pub fn name(&self, idx: NodeIndex) -> &str {
        self.entry(idx).0
    }

    pub fn node(&self, idx: NodeIndex) -> &DagNode {
        self.entry(idx).1
    }

    fn entry(&self, idx: NodeIndex) -> (&str, &DagNode) {
        match self.nodes.get_index(idx.0) {
            Some((name, node)) => (name.as_str(), node),
            None => panic!("node index {} out of range for a model of {} nodes", idx.0, self.nodes.len()),
        }
    }

    fn node_mut(&mut self, idx: NodeIndex) -> &mut DagNode {
        let len = self.nodes.len();
        match self.nodes.get_index_mut(idx.0) {
            Some((_, node)) => node,
            None => panic!("node index {} out of range for a model of {} nodes", idx.0, len),
        }
    }

    pub fn parents(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.node(idx).parents()
    }

    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.node(idx).children()
    }

    pub fn value_type(&self, idx: NodeIndex) -> ValueType {
        self.node(idx).value_type()
    }

    pub fn is_dirty(&self, idx: NodeIndex) -> bool {
        self.node(idx).is_dirty()
    }

    pub fn is_touched(&self, idx: NodeIndex) -> bool {
        self.node(idx).is_touched()
    }

    pub fn is_stochastic(&self, idx: NodeIndex) -> bool {
        self.node(idx).is_stochastic()
    }

    pub fn is_clamped(&self, idx: NodeIndex) -> bool {
        self.node(idx).is_clamped()
    }

    pub fn distribution(&self, idx: NodeIndex) -> Option<&dyn Distribution> {
        self.node(idx).distribution()
    }

    /// The number of times the node recomputed its value or log-probability
    pub fn recomputations(&self, idx: NodeIndex) -> usize {
        self.node(idx).recomputations()
    }

    /// The current value of a node, recomputing it (and any stale ancestors) if dirty.
    pub fn value(&mut self, idx: NodeIndex) -> &Value {
        self.refresh_value(idx);
        self.node(idx).cached_value()
    }

    /// The current value of a node whose value is known to be clean.
    ///
    /// # Panics
    /// If the node is deterministic and dirty; use `value` instead.
    pub fn current_value(&self, idx: NodeIndex) -> &Value {
        let node = self.node(idx);
        assert!(node.value_is_current(), "value of '{}' read while dirty", self.name(idx));
        node.cached_value()
    }

    /// `ln p(value | parents)` of a stochastic node, recomputed if dirty. Zero for other nodes.
    pub fn ln_probability(&mut self, idx: NodeIndex) -> f64 {
        self.refresh_ln_probability(idx);
        self.node(idx).cached_ln_probability()
    }

    /// The current log-probability of a stochastic node minus the one stored when it was
    /// touched. Zero for nodes that were not touched or are not stochastic.
    pub fn ln_probability_ratio(&mut self, idx: NodeIndex) -> f64 {
        if !self.is_stochastic(idx) {
            return 0.0;
        }

        let current = self.ln_probability(idx);
        match self.node(idx).stored_ln_probability() {
            Some(stored) => current - stored,
            None => 0.0,
        }
    }

    /// Sum the log-probability ratios of every touched stochastic node reachable from `roots`.
    pub fn probability_ratio(&mut self, roots: &[NodeIndex]) -> ProbabilityRatio {
        let mut ratio = ProbabilityRatio::default();
        for idx in self.touched_subgraph(roots) {
            if !self.is_stochastic(idx) {
                continue;
            }

            let r = self.ln_probability_ratio(idx);
            if self.is_clamped(idx) {
                ratio.likelihood += r;
            } else {
                ratio.prior += r;
            }
        }
        ratio
    }

    /// The touched nodes reachable from `roots` through touched nodes, each once, in graph order
    fn touched_subgraph(&self, roots: &[NodeIndex]) -> Vec<NodeIndex> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeIndex> = roots.to_vec();
        while let Some(idx) = stack.pop() {
            if seen[idx.0] || !self.is_touched(idx) {
                continue;
            }
            seen[idx.0] = true;
            stack.extend(self.children(idx).iter().cloned());
        }

        seen.iter()
            .enumerate()
            .filter(|&(_, &s)| s)
            .map(|(i, _)| NodeIndex(i))
            .collect()
    }

    /// Mark a node and all of its descendants dirty, snapshotting each the first time.
    ///
    /// Propagation stops at descendants that are already dirty: their own descendants were
    /// marked when they were.
    pub fn touch(&mut self, idx: NodeIndex) {
        self.node_mut(idx).mark_dirty();

        let mut stack: Vec<NodeIndex> = self.children(idx).to_vec();
        while let Some(child) = stack.pop() {
            let node = self.node_mut(child);
            if node.is_dirty() {
                continue;
            }
            node.mark_dirty();
            stack.extend(node.children.iter().cloned());
        }
    }

    /// Commit the proposal below `idx`: recompute whatever is still dirty and drop the snapshots.
    ///
    /// # Panics
    /// If `idx` was not touched.
    pub fn keep(&mut self, idx: NodeIndex) {
        assert!(self.is_touched(idx), "keep of '{}', which was not touched", self.name(idx));
        self.settle(idx, true);
    }

    /// Undo the proposal below `idx`: revert every touched node to its snapshot.
    ///
    /// # Panics
    /// If `idx` was not touched.
    pub fn restore(&mut self, idx: NodeIndex) {
        assert!(self.is_touched(idx), "restore of '{}', which was not touched", self.name(idx));
        self.settle(idx, false);
    }

    /// `keep` several roots whose touched subtrees may overlap.
    pub fn keep_all(&mut self, roots: &[NodeIndex]) {
        for &root in roots {
            assert!(self.is_touched(root), "keep of '{}', which was not touched", self.name(root));
        }
        for &root in roots {
            self.settle(root, true);
        }
    }

    /// `restore` several roots whose touched subtrees may overlap.
    pub fn restore_all(&mut self, roots: &[NodeIndex]) {
        for &root in roots {
            assert!(self.is_touched(root), "restore of '{}', which was not touched", self.name(root));
        }
        for &root in roots {
            self.settle(root, false);
        }
    }

    fn settle(&mut self, root: NodeIndex, accept: bool) {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if !self.is_touched(idx) {
                continue;
            }

            if accept {
                self.refresh_value(idx);
                self.refresh_ln_probability(idx);
                self.node_mut(idx).commit();
            } else {
                self.node_mut(idx).revert();
            }
            stack.extend(self.children(idx).iter().cloned());
        }
    }

    /// Replace the value of a free stochastic node and touch it.
    ///
    /// # Errors
    /// `NotStochastic`, `ClampedNode`, or `TypeMismatch` if `value` does not have the node's type
    pub fn set_value(&mut self, idx: NodeIndex, value: Value) -> Result<()> {
        if self.is_clamped(idx) {
            return Err(DagmcError::ClampedNode(self.name(idx).to_string()));
        }
        self.replace_value(idx, value)
    }

    /// Clamp a stochastic node to observed data and settle the graph.
    pub fn clamp(&mut self, idx: NodeIndex, data: Value) -> Result<()> {
        self.replace_value(idx, data)?;
        self.node_mut(idx).set_clamped(true);
        self.keep(idx);
        Ok(())
    }

    fn replace_value(&mut self, idx: NodeIndex, value: Value) -> Result<()> {
        let node = self.node(idx);
        if !node.is_stochastic() {
            return Err(DagmcError::NotStochastic(self.name(idx).to_string()));
        }

        if value.value_type() != node.value_type() {
            return Err(DagmcError::TypeMismatch {
                node: self.name(idx).to_string(),
                expected: node.value_type(),
                found: value.value_type()
            });
        }

        if let Value::Matrix(m) = &value {
            assert!(m.is_updated(), "new matrix value of '{}' must be updated", self.name(idx));
        }

        self.node_mut(idx).replace_value(value);
        self.touch(idx);
        Ok(())
    }

    /// Draw a fresh value for a free stochastic node from its distribution and commit it.
    pub fn redraw(&mut self, idx: NodeIndex, rng: &mut RandomNumberGenerator) -> Result<()> {
        let value = self.sample(idx, rng)?;
        self.set_value(idx, value)?;
        self.keep(idx);
        Ok(())
    }

    /// Draw a value for a stochastic node from its distribution given its current parents,
    /// without changing the model.
    pub fn sample(&mut self, idx: NodeIndex, rng: &mut RandomNumberGenerator) -> Result<Value> {
        if !self.is_stochastic(idx) {
            return Err(DagmcError::NotStochastic(self.name(idx).to_string()));
        }

        self.refresh_parents(idx);
        let args = self.parent_values(idx);
        match self.node(idx).distribution() {
            Some(d) => d.sample(&args, rng),
            None => Err(DagmcError::NotStochastic(self.name(idx).to_string())),
        }
    }

    /// The values of a node's parents. The parents must be current.
    pub(crate) fn parent_values(&self, idx: NodeIndex) -> Vec<&Value> {
        self.parents(idx).iter().map(|&p| self.node(p).cached_value()).collect()
    }

    /// Bring the parents of a node up to date
    pub(crate) fn refresh_parents(&mut self, idx: NodeIndex) {
        for p in self.parents(idx).to_vec() {
            self.refresh_value(p);
        }
    }

    fn refresh_value(&mut self, idx: NodeIndex) {
        if self.node(idx).value_is_current() {
            return;
        }

        self.refresh_parents(idx);
        let value = {
            let args = self.parent_values(idx);
            self.node(idx).function().map(|f| f.compute(&args))
        };

        if let Some(value) = value {
            trace!(node = self.name(idx), "recomputed value");
            self.node_mut(idx).set_value_cache(value);
        }
    }

    fn refresh_ln_probability(&mut self, idx: NodeIndex) {
        let node = self.node(idx);
        if !(node.is_stochastic() && node.is_dirty()) {
            return;
        }

        self.refresh_parents(idx);
        let ln_probability = {
            let args = self.parent_values(idx);
            let node = self.node(idx);
            node.distribution().map(|d| d.ln_pdf(&args, node.cached_value()))
        };

        if let Some(ln_probability) = ln_probability {
            self.node_mut(idx).set_ln_probability_cache(ln_probability);
        }
    }

    /// The summed log-probability of all free stochastic nodes
    pub fn ln_prior(&mut self) -> f64 {
        let free: Vec<NodeIndex> = self.indices().filter(|&i| self.is_stochastic(i) && !self.is_clamped(i)).collect();
        free.into_iter().map(|i| self.ln_probability(i)).sum()
    }

    /// The summed log-probability of all clamped stochastic nodes
    pub fn ln_likelihood(&mut self) -> f64 {
        let clamped: Vec<NodeIndex> = self.indices().filter(|&i| self.is_clamped(i)).collect();
        clamped.into_iter().map(|i| self.ln_probability(i)).sum()
    }

    /// The unnormalised log posterior density of the current state
    pub fn ln_posterior(&mut self) -> f64 {
        self.ln_prior() + self.ln_likelihood()
    }

}
