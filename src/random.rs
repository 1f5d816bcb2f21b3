//! The random number source consumed by every sampling operation.
//!
//! There is no hidden process-wide generator: a `RandomNumberGenerator` is created (and seeded)
//! by whoever drives the chain and is passed by `&mut` to distributions, matrices and moves.

use crate::util::{DagmcError, Result};

use ndarray::Array1;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Exp, Gamma, StandardNormal};

#[derive(Clone, Debug)]
pub struct RandomNumberGenerator {

    /// The underlying pseudo random generator
    rng: StdRng,

    /// The seed the generator was created from, if it was seeded explicitly
    seed: Option<u64>

}

impl RandomNumberGenerator {

    /// Construct a reproducible generator from `seed`
    pub fn seeded(seed: u64) -> Self {
        RandomNumberGenerator { rng: StdRng::seed_from_u64(seed), seed: Some(seed) }
    }

    /// Construct a generator seeded from operating system entropy
    pub fn from_entropy() -> Self {
        RandomNumberGenerator { rng: StdRng::from_entropy(), seed: None }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Draw from U[0, 1)
    pub fn uniform01(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Draw an index uniformly from `0..n`
    ///
    /// # Panics
    /// if `n == 0`
    pub fn uniform_index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Draw from N(0, 1)
    pub fn standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }

    /// Draw a vector of `n` independent N(0, 1) values
    pub fn standard_normal_vector(&mut self, n: usize) -> Array1<f64> {
        Array1::random_using(n, StandardNormal, &mut self.rng)
    }

    /// Draw from a Gamma distribution with the given shape and scale
    pub fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64> {
        let gamma = Gamma::new(shape, scale).map_err(|e| {
            DagmcError::InvalidParameter(format!("gamma(shape = {}, scale = {}): {}", shape, scale, e))
        })?;

        Ok(self.rng.sample(gamma))
    }

    /// Draw from an Exponential distribution with the given rate
    pub fn exponential(&mut self, rate: f64) -> Result<f64> {
        let exp = Exp::new(rate).map_err(|e| {
            DagmcError::InvalidParameter(format!("exponential(rate = {}): {}", rate, e))
        })?;

        Ok(self.rng.sample(exp))
    }

}
