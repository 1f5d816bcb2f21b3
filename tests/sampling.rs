//! Whole-chain checks: every chain here targets a posterior whose moments are known.

extern crate dagmc;
#[macro_use]
extern crate ndarray;

use dagmc::distributions::{Gamma, InverseWishart, MultivariateNormal, Normal};
use dagmc::matrix::{outer, PrecisionMatrix};
use dagmc::moves::{
    CompoundMove, ConjugateInverseWishartProposal, ConjugateScaleProposal, GibbsMove, ScaleProposal, SimpleMove,
    SlidingProposal
};
use dagmc::statistics::wishart::inverse_wishart_sample;
use dagmc::{Initialization, Mcmc, McmcSettings, Model, ModelBuilder, Move, RandomNumberGenerator, Value};

use ndarray::Array2;

fn real(x: f64) -> Value {
    Value::Real(x)
}

fn mean_and_variance(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

#[test]
fn metropolis_hastings_recovers_a_normal() {
    let model = ModelBuilder::new()
        .with_constant("mean", real(3.0))
        .with_constant("sd", real(2.0))
        .with_stochastic("x", Normal, &["mean", "sd"], Initialization::Value(real(0.0)))
        .build()
        .unwrap();
    let x = model.index("x").unwrap();
    let moves: Vec<Box<dyn Move>> = vec![
        Box::new(SimpleMove::new(&model, x, SlidingProposal::new(1.0).unwrap(), 1.0).unwrap())
    ];
    let mut chain = Mcmc::new(model, moves, McmcSettings::default().with_seed(101)).unwrap();

    chain.burnin(5_000).unwrap();
    let mut draws = vec![];
    chain.run(100_000, |model, _| draws.push(model.value(x).real())).unwrap();

    let (mean, var) = mean_and_variance(&draws);
    assert!((mean - 3.0).abs() < 0.15, "mean {}", mean);
    assert!((var - 4.0).abs() < 0.5, "variance {}", var);

    let rate = chain.acceptance_statistics()[0].1.acceptance_rate().unwrap();
    assert!(rate > 0.3 && rate < 0.6, "acceptance rate {}", rate);
}

#[test]
fn normal_mean_posterior() {
    // mu ~ N(0, 10); y_i ~ N(mu, 1)
    let data = [1.2, 0.7, 2.1, 1.5, 0.9];
    let mut builder = ModelBuilder::new()
        .with_constant("zero", real(0.0))
        .with_constant("ten", real(10.0))
        .with_constant("one", real(1.0))
        .with_stochastic("mu", Normal, &["zero", "ten"], Initialization::Value(real(0.0)));
    for (i, &y) in data.iter().enumerate() {
        builder = builder.with_stochastic(&format!("y{}", i), Normal, &["mu", "one"], Initialization::Observed(real(y)));
    }
    let model = builder.build().unwrap();
    let mu = model.index("mu").unwrap();

    let moves: Vec<Box<dyn Move>> = vec![
        Box::new(SimpleMove::new(&model, mu, SlidingProposal::new(1.0).unwrap(), 1.0).unwrap())
    ];
    let mut chain = Mcmc::new(model, moves, McmcSettings::default().with_seed(103)).unwrap();
    chain.burnin(2_000).unwrap();
    let mut draws = vec![];
    chain.run(50_000, |model, _| draws.push(model.value(mu).real())).unwrap();

    let precision = 1.0 / 100.0 + data.len() as f64;
    let expected_mean = data.iter().sum::<f64>() / precision;
    let (mean, var) = mean_and_variance(&draws);
    assert!((mean - expected_mean).abs() < 0.03, "mean {} expected {}", mean, expected_mean);
    assert!((var - 1.0 / precision).abs() < 0.03, "variance {} expected {}", var, 1.0 / precision);
}

fn observations() -> Vec<Value> {
    vec![
        Value::Vector(array![0.5, -1.2]),
        Value::Vector(array![1.5, 0.3]),
        Value::Vector(array![-0.7, 0.8]),
        Value::Vector(array![0.1, 2.0]),
        Value::Vector(array![-1.1, -0.4]),
    ]
}

fn scatter() -> Array2<f64> {
    let mut s = Array2::zeros((2, 2));
    for x in observations() {
        s += &outer(x.vector(), x.vector());
    }
    s
}

#[test]
fn gibbs_matches_direct_sampling() {
    let mut builder = ModelBuilder::new()
        .with_constant("scale", Value::Matrix(PrecisionMatrix::identity(2)))
        .with_constant("df", Value::Natural(4))
        .with_constant("zero", Value::Vector(array![0.0, 0.0]))
        .with_stochastic(
            "sigma",
            InverseWishart::with_scale_matrix(),
            &["scale", "df"],
            Initialization::Value(Value::Matrix(PrecisionMatrix::identity(2)))
        );
    for (i, x) in observations().into_iter().enumerate() {
        builder = builder.with_stochastic(
            &format!("x{}", i),
            MultivariateNormal::with_covariance(),
            &["zero", "sigma"],
            Initialization::Observed(x)
        );
    }
    let model = builder.build().unwrap();
    let sigma = model.index("sigma").unwrap();

    let proposal = ConjugateInverseWishartProposal::new(&model, sigma).unwrap();
    let moves: Vec<Box<dyn Move>> = vec![Box::new(GibbsMove::new(&model, proposal, 1.0).unwrap())];
    let mut chain = Mcmc::new(model, moves, McmcSettings::default().with_seed(107)).unwrap();

    let n = 50_000;
    let mut gibbs = Array2::<f64>::zeros((2, 2));
    chain.run(n, |model, _| gibbs += model.value(sigma).matrix().elements()).unwrap();
    gibbs /= n as f64;

    let stats = chain.acceptance_statistics()[0].1;
    assert_eq!(n, stats.tried);
    assert_eq!(n, stats.accepted);

    let posterior = PrecisionMatrix::from_array(Array2::<f64>::eye(2) + scatter()).unwrap();
    let mut rng = RandomNumberGenerator::seeded(109);
    let mut direct = Array2::<f64>::zeros((2, 2));
    for _ in 0..n {
        direct += inverse_wishart_sample(&posterior, 9, &mut rng).unwrap().elements();
    }
    direct /= n as f64;

    // IW(I + S, 4 + 5) in two dimensions has mean (I + S) / 6
    let exact = (Array2::<f64>::eye(2) + scatter()) / 6.0;
    for ((g, d), e) in gibbs.iter().zip(direct.iter()).zip(exact.iter()) {
        let tol = 0.03 * (1.0 + e.abs());
        assert!((g - e).abs() < tol, "gibbs {} exact {}", g, e);
        assert!((d - e).abs() < tol, "direct {} exact {}", d, e);
    }
}

/// kappa ~ Gamma(2, 1); sigma ~ IW(kappa I, 4); x_i ~ N(0, sigma)
fn hierarchy() -> Model {
    let mut builder = ModelBuilder::new()
        .with_constant("shape", real(2.0))
        .with_constant("rate", real(1.0))
        .with_stochastic("kappa", Gamma, &["shape", "rate"], Initialization::Value(real(1.0)))
        .with_constant("df", Value::Natural(4))
        .with_stochastic(
            "sigma",
            InverseWishart::with_scaled_identity(2),
            &["kappa", "df"],
            Initialization::Value(Value::Matrix(PrecisionMatrix::identity(2)))
        )
        .with_constant("zero", Value::Vector(array![0.0, 0.0]));
    for (i, x) in observations().into_iter().enumerate() {
        builder = builder.with_stochastic(
            &format!("x{}", i),
            MultivariateNormal::with_covariance(),
            &["zero", "sigma"],
            Initialization::Observed(x)
        );
    }
    builder.build().unwrap()
}

/// E[kappa | X] by quadrature over `p(kappa) p(X | kappa)`, sigma integrated out
fn kappa_posterior_mean() -> f64 {
    let (df, n, dim) = (4.0, observations().len() as f64, 2.0);
    let s = scatter();
    let ln_density = |k: f64| {
        let post = PrecisionMatrix::from_array(PrecisionMatrix::scaled_identity(2, k).elements() + &s).unwrap();
        k.ln() - k + 0.5 * df * dim * k.ln() - 0.5 * (df + n) * post.log_det()
    };

    let h = 1e-3;
    let grid: Vec<f64> = (1..40_000).map(|i| i as f64 * h).collect();
    let ln_max = grid.iter().map(|&k| ln_density(k)).fold(f64::NEG_INFINITY, f64::max);
    let (mut z, mut m) = (0.0, 0.0);
    for &k in grid.iter() {
        let w = (ln_density(k) - ln_max).exp();
        z += w;
        m += w * k;
    }
    m / z
}

fn kappa_chain_mean(moves: impl FnOnce(&Model) -> Vec<Box<dyn Move>>, seed: u64) -> f64 {
    let model = hierarchy();
    let kappa = model.index("kappa").unwrap();
    let moves = moves(&model);
    let mut chain = Mcmc::new(model, moves, McmcSettings::default().with_seed(seed)).unwrap();

    chain.burnin(5_000).unwrap();
    let mut draws = vec![];
    chain.run(100_000, |model, _| draws.push(model.value(kappa).real())).unwrap();
    mean_and_variance(&draws).0
}

#[test]
fn scale_and_gibbs_recover_the_hyperparameter() {
    let expected = kappa_posterior_mean();
    let mean = kappa_chain_mean(|model| {
        let kappa = model.index("kappa").unwrap();
        let sigma = model.index("sigma").unwrap();
        vec![
            Box::new(SimpleMove::new(model, kappa, ScaleProposal::new(1.0).unwrap(), 1.0).unwrap()) as Box<dyn Move>,
            Box::new(GibbsMove::new(model, ConjugateInverseWishartProposal::new(model, sigma).unwrap(), 1.0).unwrap()),
        ]
    }, 113);
    assert!((mean - expected).abs() < 0.05 * expected, "mean {} expected {}", mean, expected);
}

#[test]
fn conjugate_scale_move_recovers_the_hyperparameter() {
    let expected = kappa_posterior_mean();
    let mean = kappa_chain_mean(|model| {
        let kappa = model.index("kappa").unwrap();
        let sigma = model.index("sigma").unwrap();
        let proposal = ConjugateScaleProposal::new(model, kappa, sigma, 1.0).unwrap();
        vec![Box::new(CompoundMove::new(proposal, 1.0).unwrap()) as Box<dyn Move>]
    }, 127);
    assert!((mean - expected).abs() < 0.05 * expected, "mean {} expected {}", mean, expected);
}
