//! Closed-form conjugate-prior components for collapsed Gibbs mixture
//! samplers: incrementally-updated per-group sufficient statistics,
//! posterior-predictive scorers, and vectorized scoring across a packed
//! group population.

pub mod error;
pub mod mixture;
pub mod models;
pub mod utils;

pub use error::{Error, Result};
pub use mixture::{CategoricalMixture, Mixture, NormalMixture};
pub use models::{GroupStat, VectorizedScorer};
