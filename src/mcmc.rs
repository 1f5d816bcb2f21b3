//! Defines `Mcmc`, a single Markov chain over a `Model`.
//!
//! Every generation picks one move with probability proportional to its weight and performs it.

use crate::config::McmcSettings;
use crate::model::Model;
use crate::moves::{AcceptanceStatistics, Move, MoveOutcome};
use crate::random::RandomNumberGenerator;
use crate::util::{DagmcError, Result};

use tracing::{debug, info, trace};

/// A Markov chain. Owns its model, its moves and its random number generator.
#[derive(Debug)]
pub struct Mcmc {

    model: Model,

    moves: Vec<Box<dyn Move>>,

    settings: McmcSettings,

    rng: RandomNumberGenerator,

    /// The sum of the move weights
    total_weight: f64,

    /// The number of generations performed
    generation: usize

}

impl Mcmc {

    /// Construct a chain.
    ///
    /// # Errors
    /// `NoMoves` if `moves` is empty and `InvalidParameter` for invalid settings or a move with a
    /// non-positive weight
    pub fn new(model: Model, moves: Vec<Box<dyn Move>>, settings: McmcSettings) -> Result<Self> {
        settings.validate()?;

        if moves.is_empty() {
            return Err(DagmcError::NoMoves);
        }

        if let Some(m) = moves.iter().find(|m| !(m.weight().is_finite() && m.weight() > 0.0)) {
            return Err(DagmcError::InvalidParameter(format!("move {} has weight {}", m.name(), m.weight())));
        }

        let total_weight = moves.iter().map(|m| m.weight()).sum();
        let rng = match settings.seed {
            Some(seed) => RandomNumberGenerator::seeded(seed),
            None => RandomNumberGenerator::from_entropy(),
        };

        debug!(moves = moves.len(), total_weight, "constructed chain");
        Ok(Mcmc { model, moves, settings, rng, total_weight, generation: 0 })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    pub fn settings(&self) -> &McmcSettings {
        &self.settings
    }

    pub fn moves(&self) -> &[Box<dyn Move>] {
        &self.moves
    }

    /// The number of generations performed so far
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Pick a move with probability proportional to its weight
    fn choose_move(&mut self) -> usize {
        let mut u = self.rng.uniform01() * self.total_weight;
        for (i, m) in self.moves.iter().enumerate() {
            if u < m.weight() {
                return i;
            }
            u -= m.weight();
        }
        self.moves.len() - 1
    }

    /// Perform one generation: a single weighted choice of move.
    pub fn next_generation(&mut self) -> Result<MoveOutcome> {
        let i = self.choose_move();
        let outcome = self.moves[i].perform(
            &mut self.model,
            &mut self.rng,
            self.settings.prior_heat,
            self.settings.likelihood_heat
        )?;
        self.generation += 1;

        trace!(generation = self.generation, name = self.moves[i].name(), accepted = outcome.accepted, "generation");
        Ok(outcome)
    }

    /// Run `generations` generations, tuning every move after each `tuning_interval` generations.
    /// The acceptance statistics are reset at the end so that they describe only the sampling
    /// that follows.
    pub fn burnin(&mut self, generations: usize) -> Result<()> {
        info!(generations, "starting burn-in");

        let target = self.settings.tuning.target_acceptance;
        for g in 1..=generations {
            self.next_generation()?;
            if g % self.settings.tuning_interval == 0 {
                for m in self.moves.iter_mut() {
                    m.tune(target);
                }
            }
        }

        for m in self.moves.iter_mut() {
            let stats = m.statistics();
            info!(
                name = m.name(),
                tried = stats.tried,
                accepted = stats.accepted,
                tuning = ?m.tuning_parameter(),
                "burn-in finished"
            );
            m.reset_statistics();
        }
        Ok(())
    }

    /// Run `generations` generations without tuning.
    ///
    /// # Args
    /// * `monitor`: called with the model and the generation number after every generation
    pub fn run<F>(&mut self, generations: usize, mut monitor: F) -> Result<()>
        where F: FnMut(&mut Model, usize)
    {
        info!(generations, "starting run");
        for _ in 0..generations {
            self.next_generation()?;
            monitor(&mut self.model, self.generation);
        }
        Ok(())
    }

    /// The lifetime acceptance counts of each move, by name
    pub fn acceptance_statistics(&self) -> Vec<(String, AcceptanceStatistics)> {
        self.moves.iter().map(|m| (m.name().to_string(), m.statistics())).collect()
    }

}
