//! Defines the `Move` trait - a strategy that perturbs part of a `Model` and decides whether to
//! keep the perturbation.
//!
//! Three kinds of move are provided:
//! * `SimpleMove`: Metropolis-Hastings on a single free stochastic node
//! * `CompoundMove`: Metropolis-Hastings on several nodes changed together
//! * `GibbsMove`: an exact draw from a conjugate full conditional, always accepted

use crate::distributions::{MultivariateNormal, Parameterization};
use crate::model::{Model, NodeIndex, ProbabilityRatio};
use crate::random::RandomNumberGenerator;
use crate::util::{DagmcError, Result};
use crate::value::ValueType;

use ndarray::Array2;

use std::fmt;

pub mod compound;
pub mod gibbs;
pub mod simple;

pub use self::compound::{CompoundMove, CompoundProposal, ConjugateScaleProposal, UpDownScaleProposal};
pub use self::gibbs::{ConjugateInverseWishartProposal, ConjugateWishartProposal, GibbsMove, GibbsProposal};
pub use self::simple::{MatrixSlidingProposal, ScaleProposal, SimpleMove, SimpleProposal, SlidingProposal};

/// Counts of proposals tried and accepted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcceptanceStatistics {
    pub tried: usize,
    pub accepted: usize
}

impl AcceptanceStatistics {

    /// The fraction of tries that were accepted, if there were any
    pub fn acceptance_rate(&self) -> Option<f64> {
        if self.tried == 0 {
            None
        } else {
            Some(self.accepted as f64 / self.tried as f64)
        }
    }

    fn record(&mut self, accepted: bool) {
        self.tried += 1;
        if accepted {
            self.accepted += 1;
        }
    }

}

/// The result of a single `Move::perform`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveOutcome {
    pub accepted: bool,

    /// The log Hastings ratio of the proposal
    pub ln_hastings_ratio: f64
}

pub trait Move: fmt::Debug {

    fn name(&self) -> &str;

    /// The relative frequency with which a sampler picks this move
    fn weight(&self) -> f64;

    /// The nodes this move changes
    fn nodes(&self) -> &[NodeIndex];

    /// Propose a change to the model and accept or reject it.
    ///
    /// # Args
    /// * `prior_heat`: the power applied to the prior ratio
    /// * `likelihood_heat`: the power applied to the likelihood ratio
    ///
    /// # Returns
    /// whether the change was kept, and the log Hastings ratio of the proposal. On return the
    /// model holds no touched nodes.
    fn perform(
        &mut self,
        model: &mut Model,
        rng: &mut RandomNumberGenerator,
        prior_heat: f64,
        likelihood_heat: f64
    ) -> Result<MoveOutcome>;

    /// Adjust the tuning parameter toward the target acceptance rate, using the tries made since
    /// the previous call.
    fn tune(&mut self, target_acceptance: f64);

    /// Counts over the lifetime of the move
    fn statistics(&self) -> AcceptanceStatistics;

    fn reset_statistics(&mut self);

    /// The current step size, for moves that have one
    fn tuning_parameter(&self) -> Option<f64>;

}

/// Lifetime counts and the counts since the last tune
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Counters {
    total: AcceptanceStatistics,
    since_tune: AcceptanceStatistics
}

impl Counters {

    pub(crate) fn record(&mut self, accepted: bool) {
        self.total.record(accepted);
        self.since_tune.record(accepted);
    }

    pub(crate) fn total(&self) -> AcceptanceStatistics {
        self.total
    }

    /// Take the rate since the last tune and start a new batch
    pub(crate) fn take_batch_rate(&mut self) -> Option<f64> {
        let rate = self.since_tune.acceptance_rate();
        self.since_tune = AcceptanceStatistics::default();
        rate
    }

    pub(crate) fn reset(&mut self) {
        *self = Counters::default();
    }

}

/// The Metropolis-Hastings decision.
///
/// The log-odds are `prior_heat * ratio.prior + likelihood_heat * ratio.likelihood +
/// ln_hastings_ratio`. The proposal is accepted iff `ln(u) < log-odds` with `u ~ U(0, 1)`; a NaN
/// log-odds rejects.
pub fn metropolis_hastings(
    ratio: ProbabilityRatio,
    ln_hastings_ratio: f64,
    prior_heat: f64,
    likelihood_heat: f64,
    rng: &mut RandomNumberGenerator
) -> bool {
    let log_odds = ratio.heated(prior_heat, likelihood_heat) + ln_hastings_ratio;
    rng.uniform01().ln() < log_odds
}

/// The step size after one round of tuning.
///
/// Grows by `1 + (rate - target) / (1 - target)` when the acceptance rate is above the target
/// and shrinks by `2 - rate / target` otherwise, so a single round changes it by at most a factor
/// of two.
///
/// # Args
/// * `current`: the step size
/// * `rate`: the observed acceptance rate, in [0, 1]
/// * `target`: the target acceptance rate, in (0, 1)
pub fn tune_parameter(current: f64, rate: f64, target: f64) -> f64 {
    if rate > target {
        current * (1.0 + (rate - target) / (1.0 - target))
    } else {
        current / (2.0 - rate / target)
    }
}

pub(crate) fn check_weight(weight: f64) -> Result<()> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(DagmcError::InvalidParameter(format!("move weight must be positive, got {}", weight)))
    }
}

pub(crate) fn check_tuning(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DagmcError::InvalidParameter(format!("{} must be finite and positive, got {}", name, value)))
    }
}

/// A free stochastic node of the expected type, or the configuration error saying why not
pub(crate) fn check_free_node(model: &Model, node: NodeIndex, expected: ValueType) -> Result<()> {
    let name = model.name(node).to_string();
    if !model.is_stochastic(node) {
        return Err(DagmcError::NotStochastic(name));
    }
    if model.is_clamped(node) {
        return Err(DagmcError::ClampedNode(name));
    }
    if model.value_type(node) != expected {
        return Err(DagmcError::TypeMismatch { node: name, expected, found: model.value_type(node) });
    }
    Ok(())
}

/// `Σ (x - μ)(x - μ)ᵗ` over `children`, each a multivariate normal whose first parent is its mean
pub(crate) fn residual_scatter(model: &mut Model, children: &[NodeIndex], dim: usize) -> Array2<f64> {
    let mut scatter = Array2::zeros((dim, dim));
    for &child in children {
        let mean = model.parents(child)[0];
        let mean = model.value(mean).vector().clone();
        let r = model.value(child).vector() - &mean;
        scatter += &crate::matrix::outer(&r, &r);
    }
    scatter
}

/// Children of `node` that are covariance-parameterised multivariate normals using `node` as
/// their covariance
pub(crate) fn covariance_children(model: &Model, node: NodeIndex) -> Vec<NodeIndex> {
    normal_children(model, node, Parameterization::Covariance)
}

/// Children of `node` that are multivariate normals with the given parameterisation, using `node`
/// as their matrix parameter
pub(crate) fn normal_children(model: &Model, node: NodeIndex, parameterization: Parameterization) -> Vec<NodeIndex> {
    model.children(node)
         .iter()
         .cloned()
         .filter(|&c| {
             let family = model.distribution(c)
                               .and_then(|d| d.as_any().downcast_ref::<MultivariateNormal>())
                               .map(|mvn| mvn.parameterization());
             family == Some(parameterization) && model.parents(c)[1] == node
         })
         .collect()
}
