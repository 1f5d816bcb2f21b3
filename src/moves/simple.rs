//! Metropolis-Hastings moves on a single stochastic node.

use super::{check_free_node, check_tuning, check_weight, metropolis_hastings, tune_parameter};
use super::{AcceptanceStatistics, Counters, Move, MoveOutcome};
use crate::model::{Model, NodeIndex};
use crate::random::RandomNumberGenerator;
use crate::util::Result;
use crate::value::{Value, ValueType};

use tracing::{debug, trace};

use std::fmt;

/// Proposes a new value for one node from its current value alone.
pub trait SimpleProposal: fmt::Debug {

    fn name(&self) -> &'static str;

    /// The type of value this proposal works on
    fn value_type(&self) -> ValueType;

    /// Propose a replacement for `current`.
    ///
    /// # Returns
    /// the new value and the log Hastings ratio `ln q(current | new) - ln q(new | current)`
    fn propose(&mut self, current: &Value, rng: &mut RandomNumberGenerator) -> Result<(Value, f64)>;

    fn tuning_parameter(&self) -> Option<f64>;

    fn set_tuning_parameter(&mut self, value: f64);

}

/// A Metropolis-Hastings move of one free stochastic node.
#[derive(Debug)]
pub struct SimpleMove<P: SimpleProposal> {

    name: String,

    /// The single node moved
    nodes: [NodeIndex; 1],

    proposal: P,

    weight: f64,

    counters: Counters

}

impl<P: SimpleProposal> SimpleMove<P> {

    /// Construct a move of `node`.
    ///
    /// # Errors
    /// `NotStochastic` or `ClampedNode` if `node` is not free, `TypeMismatch` if the proposal does
    /// not work on the node's type, and `InvalidParameter` for a non-positive weight.
    pub fn new(model: &Model, node: NodeIndex, proposal: P, weight: f64) -> Result<Self> {
        check_free_node(model, node, proposal.value_type())?;
        check_weight(weight)?;

        let name = format!("{}({})", proposal.name(), model.name(node));
        Ok(SimpleMove { name, nodes: [node], proposal, weight, counters: Counters::default() })
    }

    pub fn proposal(&self) -> &P {
        &self.proposal
    }

}

impl<P: SimpleProposal> Move for SimpleMove<P> {

    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    fn perform(
        &mut self,
        model: &mut Model,
        rng: &mut RandomNumberGenerator,
        prior_heat: f64,
        likelihood_heat: f64
    ) -> Result<MoveOutcome> {
        let node = self.nodes[0];

        //////////////////////////////////////////////////////////////
        // 1) propose and install the new value
        let current = model.value(node).clone();
        let (proposed, ln_hastings_ratio) = self.proposal.propose(&current, rng)?;
        model.set_value(node, proposed)?;

        //////////////////////////////////////////////////////////////
        // 2) score the change over the affected nodes
        let ratio = model.probability_ratio(&self.nodes);
        let accepted = metropolis_hastings(ratio, ln_hastings_ratio, prior_heat, likelihood_heat, rng);

        //////////////////////////////////////////////////////////////
        // 3) settle the graph
        if accepted {
            model.keep_all(&self.nodes);
        } else {
            model.restore_all(&self.nodes);
        }
        self.counters.record(accepted);

        trace!(
            name = self.name.as_str(),
            prior = ratio.prior,
            likelihood = ratio.likelihood,
            hastings = ln_hastings_ratio,
            accepted,
            "simple move"
        );
        Ok(MoveOutcome { accepted, ln_hastings_ratio })
    }

    fn tune(&mut self, target_acceptance: f64) {
        let rate = self.counters.take_batch_rate();
        if let (Some(rate), Some(current)) = (rate, self.proposal.tuning_parameter()) {
            let tuned = tune_parameter(current, rate, target_acceptance);
            debug!(name = self.name.as_str(), rate, from = current, to = tuned, "tuned move");
            self.proposal.set_tuning_parameter(tuned);
        }
    }

    fn statistics(&self) -> AcceptanceStatistics {
        self.counters.total()
    }

    fn reset_statistics(&mut self) {
        self.counters.reset();
    }

    fn tuning_parameter(&self) -> Option<f64> {
        self.proposal.tuning_parameter()
    }

}

/// `x' = x + delta * (u - 1/2)`. Symmetric.
#[derive(Clone, Copy, Debug)]
pub struct SlidingProposal {
    delta: f64
}

impl SlidingProposal {

    /// # Errors
    /// `InvalidParameter` unless `delta` is finite and positive
    pub fn new(delta: f64) -> Result<Self> {
        check_tuning("sliding window", delta)?;
        Ok(SlidingProposal { delta })
    }

}

impl SimpleProposal for SlidingProposal {

    fn name(&self) -> &'static str {
        "Sliding"
    }

    fn value_type(&self) -> ValueType {
        ValueType::Real
    }

    fn propose(&mut self, current: &Value, rng: &mut RandomNumberGenerator) -> Result<(Value, f64)> {
        let shift = self.delta * (rng.uniform01() - 0.5);
        Ok((Value::Real(current.real() + shift), 0.0))
    }

    fn tuning_parameter(&self) -> Option<f64> {
        Some(self.delta)
    }

    fn set_tuning_parameter(&mut self, value: f64) {
        self.delta = value;
    }

}

/// `x' = x * e^(lambda * (u - 1/2))`. The Hastings ratio is the Jacobian `lambda * (u - 1/2)`.
#[derive(Clone, Copy, Debug)]
pub struct ScaleProposal {
    lambda: f64
}

impl ScaleProposal {

    /// # Errors
    /// `InvalidParameter` unless `lambda` is finite and positive
    pub fn new(lambda: f64) -> Result<Self> {
        check_tuning("scale factor", lambda)?;
        Ok(ScaleProposal { lambda })
    }

}

impl SimpleProposal for ScaleProposal {

    fn name(&self) -> &'static str {
        "Scale"
    }

    fn value_type(&self) -> ValueType {
        ValueType::Real
    }

    fn propose(&mut self, current: &Value, rng: &mut RandomNumberGenerator) -> Result<(Value, f64)> {
        let ln_m = self.lambda * (rng.uniform01() - 0.5);
        Ok((Value::Real(current.real() * ln_m.exp()), ln_m))
    }

    fn tuning_parameter(&self) -> Option<f64> {
        Some(self.lambda)
    }

    fn set_tuning_parameter(&mut self, value: f64) {
        self.lambda = value;
    }

}

/// Slides one off-diagonal pair (or one diagonal entry) of a symmetric matrix by
/// `delta * (u - 1/2)`. Symmetric; proposals that leave the positive definite cone have
/// zero density and are rejected.
#[derive(Clone, Copy, Debug)]
pub struct MatrixSlidingProposal {
    delta: f64
}

impl MatrixSlidingProposal {

    /// # Errors
    /// `InvalidParameter` unless `delta` is finite and positive
    pub fn new(delta: f64) -> Result<Self> {
        check_tuning("sliding window", delta)?;
        Ok(MatrixSlidingProposal { delta })
    }

}

impl SimpleProposal for MatrixSlidingProposal {

    fn name(&self) -> &'static str {
        "MatrixSliding"
    }

    fn value_type(&self) -> ValueType {
        ValueType::Matrix
    }

    fn propose(&mut self, current: &Value, rng: &mut RandomNumberGenerator) -> Result<(Value, f64)> {
        let mut m = current.matrix().clone();
        let i = rng.uniform_index(m.dim());
        let j = rng.uniform_index(m.dim());
        let shift = self.delta * (rng.uniform01() - 0.5);

        m.set(i, j, m.get(i, j) + shift);
        m.update();
        Ok((Value::Matrix(m), 0.0))
    }

    fn tuning_parameter(&self) -> Option<f64> {
        Some(self.delta)
    }

    fn set_tuning_parameter(&mut self, value: f64) {
        self.delta = value;
    }

}
