//! Defines Gibbs moves - exact draws from a conjugate full conditional.
//!
//! A Gibbs move never rejects: it replaces the target's value with a draw from its posterior
//! given its children and commits the change.

use super::{check_free_node, check_weight, normal_children, residual_scatter};
use super::{AcceptanceStatistics, Counters, Move, MoveOutcome};
use crate::distributions::{InverseWishart, Parameterization, Scale, Wishart};
use crate::matrix::{self, PrecisionMatrix};
use crate::model::{Model, NodeIndex};
use crate::random::RandomNumberGenerator;
use crate::statistics::wishart;
use crate::util::{DagmcError, Result};
use crate::value::{Value, ValueType};

use ndarray::Array2;
use tracing::{debug, warn};

use std::fmt;

/// Draws the target of a Gibbs move from its full conditional.
pub trait GibbsProposal: fmt::Debug {

    fn name(&self) -> &'static str;

    /// The node redrawn
    fn target(&self) -> NodeIndex;

    /// Draw a new value for the target given the current state of the model. The model is not
    /// changed.
    fn draw(&mut self, model: &mut Model, rng: &mut RandomNumberGenerator) -> Result<Value>;

}

#[derive(Debug)]
pub struct GibbsMove<P: GibbsProposal> {

    name: String,

    proposal: P,

    /// `[target]`
    nodes: [NodeIndex; 1],

    weight: f64,

    counters: Counters,

    /// Set once the heated-chain warning has been logged
    warned: bool

}

impl<P: GibbsProposal> GibbsMove<P> {

    pub fn new(model: &Model, proposal: P, weight: f64) -> Result<Self> {
        check_weight(weight)?;
        let target = proposal.target();
        let name = format!("{}({})", proposal.name(), model.name(target));
        Ok(GibbsMove { name, proposal, nodes: [target], weight, counters: Counters::default(), warned: false })
    }

    pub fn proposal(&self) -> &P {
        &self.proposal
    }

}

impl<P: GibbsProposal> Move for GibbsMove<P> {

    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    /// Draw, set and keep. The heats are not applied: the draw is from the unheated conditional.
    fn perform(
        &mut self,
        model: &mut Model,
        rng: &mut RandomNumberGenerator,
        prior_heat: f64,
        likelihood_heat: f64
    ) -> Result<MoveOutcome> {
        if (prior_heat != 1.0 || likelihood_heat != 1.0) && !self.warned {
            warn!(
                name = self.name.as_str(),
                prior_heat,
                likelihood_heat,
                "Gibbs move used in a heated chain; it samples the unheated conditional"
            );
            self.warned = true;
        }

        let target = self.nodes[0];
        let value = self.proposal.draw(model, rng)?;
        model.set_value(target, value)?;
        model.keep(target);
        self.counters.record(true);

        debug!(name = self.name.as_str(), "gibbs draw");
        Ok(MoveOutcome { accepted: true, ln_hastings_ratio: 0.0 })
    }

    fn tune(&mut self, _target_acceptance: f64) {
        self.counters.take_batch_rate();
    }

    fn statistics(&self) -> AcceptanceStatistics {
        self.counters.total()
    }

    fn reset_statistics(&mut self) {
        self.counters.reset();
    }

    fn tuning_parameter(&self) -> Option<f64> {
        None
    }

}

/// The children and prior of a Wishart-family target, checked at construction
#[derive(Clone, Debug)]
struct Conjugacy {
    target: NodeIndex,
    scale: Scale,
    children: Vec<NodeIndex>
}

impl Conjugacy {

    /// # Args
    /// * `scale`: the target's scale parameterisation, if its distribution is of the right family
    /// * `family`: the name of the family, for the error
    /// * `parameterization`: how the children must use the target
    fn new(
        model: &Model,
        target: NodeIndex,
        scale: Option<Scale>,
        family: &'static str,
        parameterization: Parameterization
    ) -> Result<Self> {
        check_free_node(model, target, ValueType::Matrix)?;

        let scale = scale.ok_or_else(|| DagmcError::WrongDistribution {
            node: model.name(target).to_string(),
            expected: family
        })?;

        let children = normal_children(model, target, parameterization);
        if children.is_empty() {
            return Err(DagmcError::NoEligibleChildren(model.name(target).to_string()));
        }

        // Every child must enter the sufficient statistics, or the draw is not the full conditional
        if let Some(&other) = model.children(target).iter().find(|c| !children.contains(c)) {
            return Err(DagmcError::IneligibleChild {
                node: model.name(target).to_string(),
                child: model.name(other).to_string()
            });
        }

        Ok(Conjugacy { target, scale, children })
    }

    /// The prior scale matrix, the prior degrees of freedom, and the scatter of the children's
    /// residuals
    fn statistics(&self, model: &mut Model) -> (Array2<f64>, u64, Array2<f64>) {
        let dim = model.value(self.target).matrix().dim();
        let scale = model.parents(self.target)[0];
        let df = model.parents(self.target)[1];

        let scale = match self.scale {
            Scale::Matrix => model.value(scale).matrix().elements().clone(),
            Scale::ScaledIdentity { .. } => {
                PrecisionMatrix::scaled_identity(dim, model.value(scale).real()).elements().clone()
            },
        };
        let df = model.value(df).natural();
        (scale, df, residual_scatter(model, &self.children, dim))
    }

}

/// Gibbs update of a covariance matrix `sigma ~ IW(scale, df)` whose children are
/// `x_i ~ N(mu_i, sigma)`. The full conditional is `IW(scale + Σ (x_i - mu_i)(x_i - mu_i)ᵗ, df + n)`.
#[derive(Clone, Debug)]
pub struct ConjugateInverseWishartProposal {
    conjugacy: Conjugacy
}

impl ConjugateInverseWishartProposal {

    /// # Errors
    /// * `WrongDistribution` if the target is not Inverse-Wishart
    /// * `NoEligibleChildren` if no covariance-parameterised multivariate normal uses the target
    /// * `IneligibleChild` if any other node reads the target
    /// * `NotStochastic`, `ClampedNode` or `TypeMismatch` if the target is not a free matrix
    pub fn new(model: &Model, target: NodeIndex) -> Result<Self> {
        let scale = model.distribution(target)
                         .and_then(|d| d.as_any().downcast_ref::<InverseWishart>())
                         .map(|d| d.scale());
        let conjugacy = Conjugacy::new(model, target, scale, "InverseWishart", Parameterization::Covariance)?;
        Ok(ConjugateInverseWishartProposal { conjugacy })
    }

    /// The children contributing to the sufficient statistics
    pub fn children(&self) -> &[NodeIndex] {
        &self.conjugacy.children
    }

}

impl GibbsProposal for ConjugateInverseWishartProposal {

    fn name(&self) -> &'static str {
        "ConjugateInverseWishart"
    }

    fn target(&self) -> NodeIndex {
        self.conjugacy.target
    }

    fn draw(&mut self, model: &mut Model, rng: &mut RandomNumberGenerator) -> Result<Value> {
        let (scale, df, scatter) = self.conjugacy.statistics(model);
        let posterior = PrecisionMatrix::from_array(scale + scatter)?;
        let n = self.conjugacy.children.len() as u64;

        wishart::inverse_wishart_sample(&posterior, df + n, rng).map(Value::Matrix)
    }

}

/// Gibbs update of a precision matrix `omega ~ W(scale, df)` whose children are
/// `x_i ~ N(mu_i, omega^-1)`. The full conditional is
/// `W((scale^-1 + Σ (x_i - mu_i)(x_i - mu_i)ᵗ)^-1, df + n)`.
#[derive(Clone, Debug)]
pub struct ConjugateWishartProposal {
    conjugacy: Conjugacy
}

impl ConjugateWishartProposal {

    /// # Errors
    /// * `WrongDistribution` if the target is not Wishart
    /// * `NoEligibleChildren` if no precision-parameterised multivariate normal uses the target
    /// * `IneligibleChild` if any other node reads the target
    /// * `NotStochastic`, `ClampedNode` or `TypeMismatch` if the target is not a free matrix
    pub fn new(model: &Model, target: NodeIndex) -> Result<Self> {
        let scale = model.distribution(target)
                         .and_then(|d| d.as_any().downcast_ref::<Wishart>())
                         .map(|d| d.scale());
        let conjugacy = Conjugacy::new(model, target, scale, "Wishart", Parameterization::Precision)?;
        Ok(ConjugateWishartProposal { conjugacy })
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.conjugacy.children
    }

}

impl GibbsProposal for ConjugateWishartProposal {

    fn name(&self) -> &'static str {
        "ConjugateWishart"
    }

    fn target(&self) -> NodeIndex {
        self.conjugacy.target
    }

    fn draw(&mut self, model: &mut Model, rng: &mut RandomNumberGenerator) -> Result<Value> {
        let (scale, df, scatter) = self.conjugacy.statistics(model);
        let prior = PrecisionMatrix::from_array(scale)?;
        if !prior.is_positive() {
            return Err(DagmcError::NotPositiveDefinite);
        }

        let posterior = PrecisionMatrix::from_array(prior.inverse() + &scatter)?;
        if !posterior.is_positive() {
            return Err(DagmcError::NotPositiveDefinite);
        }
        let posterior = PrecisionMatrix::from_array(matrix::symmetrize(posterior.inverse()))?;
        let n = self.conjugacy.children.len() as u64;

        wishart::wishart_sample(&posterior, df + n, rng).map(Value::Matrix)
    }

}
