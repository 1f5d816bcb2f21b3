extern crate indexmap;
#[macro_use]
extern crate itertools;
#[cfg_attr(test, macro_use)]
extern crate ndarray;
extern crate ndarray_rand;
extern crate rand;
extern crate rand_distr;
extern crate tracing;

pub mod config;
pub mod distributions;
pub mod functions;
pub mod init;
pub mod matrix;
pub mod mcmc;
pub mod model;
pub mod moves;
pub mod random;
pub mod statistics;
pub mod util;
pub mod value;

pub use config::{McmcSettings, TuningSettings};
pub use init::Initialization;
pub use matrix::PrecisionMatrix;
pub use mcmc::Mcmc;
pub use model::{Model, ModelBuilder, NodeIndex, ProbabilityRatio};
pub use moves::{AcceptanceStatistics, Move, MoveOutcome};
pub use random::RandomNumberGenerator;
pub use util::{DagmcError, Result};
pub use value::{Value, ValueType};
