//! Metropolis-Hastings moves that change several nodes at once.

use super::{check_free_node, check_tuning, check_weight, covariance_children, metropolis_hastings, residual_scatter};
use super::tune_parameter;
use super::{AcceptanceStatistics, Counters, Move, MoveOutcome};
use crate::distributions::{InverseWishart, Scale};
use crate::matrix::PrecisionMatrix;
use crate::model::{Model, NodeIndex};
use crate::random::RandomNumberGenerator;
use crate::statistics::wishart;
use crate::util::{DagmcError, Result};
use crate::value::{Value, ValueType};

use ndarray::Array2;
use tracing::{debug, trace};

use std::fmt;

/// Proposes new values for a fixed set of nodes together.
pub trait CompoundProposal: fmt::Debug {

    fn name(&self) -> &'static str;

    /// Every node `propose` may set
    fn nodes(&self) -> &[NodeIndex];

    /// Set new values for the nodes with `Model::set_value`.
    ///
    /// # Returns
    /// the log Hastings ratio of the joint proposal
    fn propose(&mut self, model: &mut Model, rng: &mut RandomNumberGenerator) -> Result<f64>;

    fn tuning_parameter(&self) -> Option<f64>;

    fn set_tuning_parameter(&mut self, value: f64);

}

/// A Metropolis-Hastings move of several nodes, accepted or rejected as a whole.
#[derive(Debug)]
pub struct CompoundMove<P: CompoundProposal> {

    proposal: P,

    weight: f64,

    counters: Counters

}

impl<P: CompoundProposal> CompoundMove<P> {

    pub fn new(proposal: P, weight: f64) -> Result<Self> {
        check_weight(weight)?;
        Ok(CompoundMove { proposal, weight, counters: Counters::default() })
    }

    pub fn proposal(&self) -> &P {
        &self.proposal
    }

    /// The proposal's nodes that currently hold a snapshot
    fn touched(&self, model: &Model) -> Vec<NodeIndex> {
        self.proposal.nodes().iter().cloned().filter(|&n| model.is_touched(n)).collect()
    }

}

impl<P: CompoundProposal> Move for CompoundMove<P> {

    fn name(&self) -> &str {
        self.proposal.name()
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn nodes(&self) -> &[NodeIndex] {
        self.proposal.nodes()
    }

    fn perform(
        &mut self,
        model: &mut Model,
        rng: &mut RandomNumberGenerator,
        prior_heat: f64,
        likelihood_heat: f64
    ) -> Result<MoveOutcome> {
        //////////////////////////////////////////////////////////////
        // 1) propose; a failure part way through is undone
        let ln_hastings_ratio = match self.proposal.propose(model, rng) {
            Ok(r) => r,
            Err(e) => {
                let touched = self.touched(model);
                model.restore_all(&touched);
                return Err(e);
            }
        };

        //////////////////////////////////////////////////////////////
        // 2) score the change over the union of the affected nodes
        let touched = self.touched(model);
        let ratio = model.probability_ratio(&touched);
        let accepted = metropolis_hastings(ratio, ln_hastings_ratio, prior_heat, likelihood_heat, rng);

        //////////////////////////////////////////////////////////////
        // 3) settle the graph
        if accepted {
            model.keep_all(&touched);
        } else {
            model.restore_all(&touched);
        }
        self.counters.record(accepted);

        trace!(
            name = self.proposal.name(),
            prior = ratio.prior,
            likelihood = ratio.likelihood,
            hastings = ln_hastings_ratio,
            accepted,
            "compound move"
        );
        Ok(MoveOutcome { accepted, ln_hastings_ratio })
    }

    fn tune(&mut self, target_acceptance: f64) {
        let rate = self.counters.take_batch_rate();
        if let (Some(rate), Some(current)) = (rate, self.proposal.tuning_parameter()) {
            let tuned = tune_parameter(current, rate, target_acceptance);
            debug!(name = self.proposal.name(), rate, from = current, to = tuned, "tuned move");
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

/// Scales the `up` nodes by `m = e^(lambda * (u - 1/2))` and the `down` nodes by `1 / m`.
///
/// The Hastings ratio is the Jacobian, `(n_up - n_down) * ln m`.
#[derive(Clone, Debug)]
pub struct UpDownScaleProposal {
    up: Vec<NodeIndex>,
    down: Vec<NodeIndex>,

    /// `up` followed by `down`
    nodes: Vec<NodeIndex>,

    lambda: f64
}

impl UpDownScaleProposal {

    /// # Errors
    /// if any node is not a free real-valued stochastic node, if a node appears twice, if both
    /// lists are empty, or if `lambda` is negative or not finite
    pub fn new(model: &Model, up: &[NodeIndex], down: &[NodeIndex], lambda: f64) -> Result<Self> {
        check_tuning("scale factor", lambda)?;

        let nodes: Vec<NodeIndex> = up.iter().chain(down).cloned().collect();
        if nodes.is_empty() {
            return Err(DagmcError::InvalidParameter(String::from("up-down scale move without nodes")));
        }

        for (i, &n) in nodes.iter().enumerate() {
            check_free_node(model, n, ValueType::Real)?;
            if nodes[..i].contains(&n) {
                return Err(DagmcError::InvalidParameter(
                    format!("node '{}' given twice to an up-down scale move", model.name(n))
                ));
            }
        }

        Ok(UpDownScaleProposal { up: up.to_vec(), down: down.to_vec(), nodes, lambda })
    }

}

impl CompoundProposal for UpDownScaleProposal {

    fn name(&self) -> &'static str {
        "UpDownScale"
    }

    fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    fn propose(&mut self, model: &mut Model, rng: &mut RandomNumberGenerator) -> Result<f64> {
        let ln_m = self.lambda * (rng.uniform01() - 0.5);
        let m = ln_m.exp();

        for &n in self.up.iter() {
            let x = model.value(n).real();
            model.set_value(n, Value::Real(x * m))?;
        }
        for &n in self.down.iter() {
            let x = model.value(n).real();
            model.set_value(n, Value::Real(x / m))?;
        }

        Ok((self.up.len() as f64 - self.down.len() as f64) * ln_m)
    }

    fn tuning_parameter(&self) -> Option<f64> {
        Some(self.lambda)
    }

    fn set_tuning_parameter(&mut self, value: f64) {
        self.lambda = value;
    }

}

/// Jointly updates `kappa` and a covariance `sigma ~ IW(kappa * I, df)`.
///
/// `kappa` is scaled by `m = e^(lambda * (u - 1/2))` and `sigma` is then redrawn from its
/// conjugate posterior `IW(kappa' * I + S, df + n)` given the multivariate normal children. The
/// redraw is exact only for the new `kappa`, so the Hastings ratio carries the posterior densities
/// of both the old and the new `sigma`:
///
/// `ln m + ln q(sigma | kappa) - ln q(sigma' | kappa')`
///
/// As `lambda` shrinks toward zero the acceptance log-odds vanish: the redraw of `sigma` is fully compensated.
#[derive(Clone, Debug)]
pub struct ConjugateScaleProposal {

    /// `[kappa, sigma]`
    nodes: [NodeIndex; 2],

    /// Multivariate normal children of `sigma`
    children: Vec<NodeIndex>,

    dim: usize,

    lambda: f64

}

impl ConjugateScaleProposal {

    /// # Errors
    /// * `WrongDistribution` unless `sigma` carries a scaled-identity `InverseWishart` whose scale
    ///   parent is `kappa`
    /// * `NoEligibleChildren` if `sigma` is not the covariance of any multivariate normal
    /// * the free node errors of `kappa` and `sigma`
    pub fn new(model: &Model, kappa: NodeIndex, sigma: NodeIndex, lambda: f64) -> Result<Self> {
        check_tuning("scale factor", lambda)?;
        check_free_node(model, kappa, ValueType::Real)?;
        check_free_node(model, sigma, ValueType::Matrix)?;

        let family = model.distribution(sigma)
                          .and_then(|d| d.as_any().downcast_ref::<InverseWishart>())
                          .map(|iw| iw.scale());
        let dim = match family {
            Some(Scale::ScaledIdentity { dim }) if model.parents(sigma)[0] == kappa => dim,
            _ => {
                return Err(DagmcError::WrongDistribution {
                    node: model.name(sigma).to_string(),
                    expected: "scaled-identity InverseWishart over the scale node"
                });
            }
        };

        let children = covariance_children(model, sigma);
        if children.is_empty() {
            return Err(DagmcError::NoEligibleChildren(model.name(sigma).to_string()));
        }

        Ok(ConjugateScaleProposal { nodes: [kappa, sigma], children, dim, lambda })
    }

    /// `(kappa * I + S, df + n)`
    fn posterior(&self, kappa: f64, scatter: &Array2<f64>, df: u64) -> Result<(PrecisionMatrix, u64)> {
        let scale = PrecisionMatrix::scaled_identity(self.dim, kappa).elements() + scatter;
        Ok((PrecisionMatrix::from_array(scale)?, df + self.children.len() as u64))
    }

}

impl CompoundProposal for ConjugateScaleProposal {

    fn name(&self) -> &'static str {
        "ConjugateScale"
    }

    fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    fn propose(&mut self, model: &mut Model, rng: &mut RandomNumberGenerator) -> Result<f64> {
        let [kappa, sigma] = self.nodes;

        //////////////////////////////////////////////////////////////
        // 1) sufficient statistics of sigma's children, before anything moves
        let df = model.parents(sigma)[1];
        let df = model.value(df).natural();
        let scatter = residual_scatter(model, &self.children, self.dim);
        let old_kappa = model.value(kappa).real();
        let old_sigma = model.value(sigma).matrix().clone();

        //////////////////////////////////////////////////////////////
        // 2) scale kappa
        let ln_m = self.lambda * (rng.uniform01() - 0.5);
        let new_kappa = old_kappa * ln_m.exp();
        model.set_value(kappa, Value::Real(new_kappa))?;

        //////////////////////////////////////////////////////////////
        // 3) redraw sigma from its conjugate posterior under the new kappa
        let (new_scale, post_df) = self.posterior(new_kappa, &scatter, df)?;
        let new_sigma = wishart::inverse_wishart_sample(&new_scale, post_df, rng)?;

        let (old_scale, _) = self.posterior(old_kappa, &scatter, df)?;
        let ln_forward = wishart::inverse_wishart_ln_pdf(&new_scale, post_df, &new_sigma);
        let ln_backward = wishart::inverse_wishart_ln_pdf(&old_scale, post_df, &old_sigma);
        model.set_value(sigma, Value::Matrix(new_sigma))?;

        Ok(ln_m + ln_backward - ln_forward)
    }

    fn tuning_parameter(&self) -> Option<f64> {
        Some(self.lambda)
    }

    fn set_tuning_parameter(&mut self, value: f64) {
        self.lambda = value;
    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::distributions::{Distribution, Gamma, MultivariateNormal, Normal};
    use crate::init::Initialization;
    use crate::model::ModelBuilder;

    fn real(x: f64) -> Value {
        Value::Real(x)
    }

    fn data() -> Vec<Value> {
        vec![
            Value::Vector(array![0.5, -1.2]),
            Value::Vector(array![1.5, 0.3]),
            Value::Vector(array![-0.7, 0.8]),
            Value::Vector(array![0.1, 2.0]),
        ]
    }

    /// kappa ~ Gamma(2, 1); sigma ~ IW(kappa I, 4); x_i ~ N(0, sigma) observed
    fn hierarchy() -> Model {
        let mut builder = ModelBuilder::new()
            .with_constant("shape", real(2.0))
            .with_constant("rate", real(1.0))
            .with_stochastic("kappa", Gamma, &["shape", "rate"], Initialization::Value(real(1.5)))
            .with_constant("df", Value::Natural(4))
            .with_stochastic(
                "sigma",
                InverseWishart::with_scaled_identity(2),
                &["kappa", "df"],
                Initialization::Value(Value::Matrix(PrecisionMatrix::identity(2)))
            )
            .with_constant("zero", Value::Vector(array![0.0, 0.0]));

        for (i, x) in data().into_iter().enumerate() {
            builder = builder.with_stochastic(
                &format!("x{}", i),
                MultivariateNormal::with_covariance(),
                &["zero", "sigma"],
                Initialization::Observed(x)
            );
        }
        builder.build().unwrap()
    }

    /// `ln p(X | kappa)` up to terms free of kappa, with sigma integrated out
    fn ln_marginal_likelihood(kappa: f64) -> f64 {
        let (dim, df, n) = (2.0, 4.0, data().len() as f64);
        let mut scatter = Array2::<f64>::zeros((2, 2));
        for x in data() {
            scatter += &crate::matrix::outer(x.vector(), x.vector());
        }
        let post = PrecisionMatrix::from_array(PrecisionMatrix::scaled_identity(2, kappa).elements() + &scatter).unwrap();
        0.5 * df * dim * kappa.ln() - 0.5 * (df + n) * post.log_det()
    }

    fn log_odds(model: &mut Model, proposal: &mut ConjugateScaleProposal, rng: &mut RandomNumberGenerator) -> f64 {
        let r = proposal.propose(model, rng).unwrap();
        let ratio = model.probability_ratio(proposal.nodes());
        ratio.prior + ratio.likelihood + r
    }

    #[test]
    fn negligible_scaling_cancels() {
        let mut model = hierarchy();
        let kappa = model.index("kappa").unwrap();
        let sigma = model.index("sigma").unwrap();
        let mut proposal = ConjugateScaleProposal::new(&model, kappa, sigma, 1e-12).unwrap();
        let mut rng = RandomNumberGenerator::seeded(31);

        for _ in 0..20 {
            let odds = log_odds(&mut model, &mut proposal, &mut rng);
            assert!(odds.abs() < 1e-8, "log-odds {}", odds);
            assert!((model.current_value(kappa).real() - 1.5).abs() < 1e-9);
            model.keep_all(&[kappa, sigma]);
        }
    }

    #[test]
    fn log_odds_match_the_marginal_posterior_of_kappa() {
        let mut model = hierarchy();
        let kappa = model.index("kappa").unwrap();
        let sigma = model.index("sigma").unwrap();
        let mut proposal = ConjugateScaleProposal::new(&model, kappa, sigma, 1.5).unwrap();
        let mut rng = RandomNumberGenerator::seeded(37);
        let gamma = |k: f64| Gamma.ln_pdf(&[&real(2.0), &real(1.0)], &real(k));

        for i in 0..20 {
            let old = model.value(kappa).real();
            let odds = log_odds(&mut model, &mut proposal, &mut rng);
            let new = model.value(kappa).real();

            let expected = gamma(new) - gamma(old) + (new / old).ln()
                + ln_marginal_likelihood(new) - ln_marginal_likelihood(old);
            assert!((odds - expected).abs() < 1e-8, "log-odds {} expected {}", odds, expected);

            if i % 2 == 0 {
                model.keep_all(&[kappa, sigma]);
            } else {
                model.restore_all(&[kappa, sigma]);
                assert_eq!(old, model.current_value(kappa).real());
            }
        }
    }

    #[test]
    fn conjugate_scale_errors() {
        let model = hierarchy();
        let kappa = model.index("kappa").unwrap();
        let x0 = model.index("x0").unwrap();

        let err = ConjugateScaleProposal::new(&model, kappa, x0, 1.0).unwrap_err();
        assert_eq!(DagmcError::ClampedNode(String::from("x0")), err);

        let sigma = model.index("sigma").unwrap();
        assert!(ConjugateScaleProposal::new(&model, kappa, sigma, 0.0).is_err());

        let model = ModelBuilder::new()
            .with_constant("kappa0", real(1.0))
            .with_constant("df", Value::Natural(4))
            .with_stochastic("kappa", Gamma, &["kappa0", "kappa0"], Initialization::Value(real(1.0)))
            .with_stochastic(
                "sigma",
                InverseWishart::with_scaled_identity(2),
                &["kappa", "df"],
                Initialization::Value(Value::Matrix(PrecisionMatrix::identity(2)))
            )
            .build()
            .unwrap();
        let kappa = model.index("kappa").unwrap();
        let sigma = model.index("sigma").unwrap();
        let err = ConjugateScaleProposal::new(&model, kappa, sigma, 1.0).unwrap_err();
        assert_eq!(DagmcError::NoEligibleChildren(String::from("sigma")), err);

        let err = ConjugateScaleProposal::new(&model, kappa, kappa, 1.0).unwrap_err();
        assert!(match err { DagmcError::TypeMismatch { .. } => true, _ => false });
    }

    #[test]
    fn wrong_family() {
        let model = ModelBuilder::new()
            .with_constant("kappa0", real(1.0))
            .with_constant("df", Value::Natural(4))
            .with_stochastic("kappa", Gamma, &["kappa0", "kappa0"], Initialization::Value(real(1.0)))
            .with_stochastic(
                "sigma",
                crate::distributions::Wishart::with_scaled_identity(2),
                &["kappa", "df"],
                Initialization::Value(Value::Matrix(PrecisionMatrix::identity(2)))
            )
            .build()
            .unwrap();
        let kappa = model.index("kappa").unwrap();
        let sigma = model.index("sigma").unwrap();
        let err = ConjugateScaleProposal::new(&model, kappa, sigma, 1.0).unwrap_err();
        assert!(match err { DagmcError::WrongDistribution { .. } => true, _ => false });
    }

    #[test]
    fn up_down_scale() {
        let mut model = ModelBuilder::new()
            .with_constant("zero", real(0.0))
            .with_constant("one", real(1.0))
            .with_stochastic("a", Normal, &["zero", "one"], Initialization::Value(real(2.0)))
            .with_stochastic("b", Normal, &["zero", "one"], Initialization::Value(real(3.0)))
            .with_stochastic("c", Normal, &["zero", "one"], Initialization::Value(real(4.0)))
            .build()
            .unwrap();
        let a = model.index("a").unwrap();
        let b = model.index("b").unwrap();
        let c = model.index("c").unwrap();

        let mut proposal = UpDownScaleProposal::new(&model, &[a, b], &[c], 1.0).unwrap();
        let mut rng = RandomNumberGenerator::seeded(41);
        let r = proposal.propose(&mut model, &mut rng).unwrap();
        let m = model.value(a).real() / 2.0;
        assert!((model.value(b).real() - 3.0 * m).abs() < 1e-12);
        assert!((model.value(c).real() - 4.0 / m).abs() < 1e-12);
        assert!((r - m.ln()).abs() < 1e-12);
        model.restore_all(&[a, b, c]);

        let mut mv = CompoundMove::new(proposal, 1.0).unwrap();
        for _ in 0..100 {
            mv.perform(&mut model, &mut rng, 1.0, 1.0).unwrap();
            assert!(!model.is_touched(a) && !model.is_touched(b) && !model.is_touched(c));
        }
        assert_eq!(100, mv.statistics().tried);

        assert!(UpDownScaleProposal::new(&model, &[a], &[a], 1.0).is_err());
        assert!(UpDownScaleProposal::new(&model, &[], &[], 1.0).is_err());
    }

    #[test]
    fn compound_move_settles_the_graph() {
        let mut model = hierarchy();
        let kappa = model.index("kappa").unwrap();
        let sigma = model.index("sigma").unwrap();
        let proposal = ConjugateScaleProposal::new(&model, kappa, sigma, 1.0).unwrap();
        let mut mv = CompoundMove::new(proposal, 2.0).unwrap();
        let mut rng = RandomNumberGenerator::seeded(43);

        for _ in 0..200 {
            let kappa_before = model.current_value(kappa).clone();
            let sigma_before = model.current_value(sigma).clone();
            let posterior_before = model.ln_posterior();

            let outcome = mv.perform(&mut model, &mut rng, 1.0, 1.0).unwrap();
            for i in model.indices().collect::<Vec<_>>() {
                assert!(!model.is_touched(i));
            }
            if !outcome.accepted {
                assert_eq!(&kappa_before, model.current_value(kappa));
                assert_eq!(&sigma_before, model.current_value(sigma));
                assert_eq!(posterior_before, model.ln_posterior());
            }
        }

        let stats = mv.statistics();
        assert_eq!(200, stats.tried);
        assert!(stats.accepted > 0);
    }
}
