//! The packed group-list owner.
//!
//! `Mixture` holds the canonical ordered group population and forwards every
//! lifecycle event to the vectorized scorer in the same call, so the scorer's
//! parallel arrays can never drift out of step with the groups.

use crate::error::Result;
use crate::models::categorical::CategoricalVectorized;
use crate::models::normal::NormalVectorized;
use crate::models::{GroupStat, VectorizedScorer};

/// A Dirichlet-categorical mixture population.
pub type CategoricalMixture = Mixture<CategoricalVectorized>;

/// A normal-inverse-chi-squared mixture population.
pub type NormalMixture = Mixture<NormalVectorized>;

/// Group statistics plus their vectorized scorer, mutated in lockstep.
///
/// Group indices are packed: removal swaps the last group into the vacated
/// slot on both sides in one call, so the two index spaces stay identical by
/// construction.
#[derive(Clone, Debug)]
pub struct Mixture<V: VectorizedScorer> {
    groups: Vec<V::Group>,
    scorer: V,
}

impl<V: VectorizedScorer> Mixture<V> {
    /// An empty population.
    #[must_use]
    pub fn new(hyper: &V::Hyper) -> Self {
        let mut scorer = V::default();
        scorer.resize(hyper, 0);
        Self {
            groups: Vec::new(),
            scorer,
        }
    }

    /// Adopt an existing group population, scoring it from scratch.
    #[must_use]
    pub fn with_groups(hyper: &V::Hyper, groups: Vec<V::Group>) -> Self {
        let mut scorer = V::default();
        scorer.update_all(hyper, &groups);
        Self { groups, scorer }
    }

    #[must_use]
    pub fn groups(&self) -> &[V::Group] {
        &self.groups
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Append an empty group; returns its index.
    pub fn add_group(&mut self, hyper: &V::Hyper) -> usize {
        let index = self.groups.len();
        self.groups.push(V::Group::empty(hyper));
        self.scorer.add_group(hyper);
        self.scorer.update_group(hyper, index, &self.groups[index]);
        index
    }

    /// Packed removal of the group at `index`.
    ///
    /// The former last group takes over `index`; any caller-held indices for
    /// that group are invalidated.
    pub fn remove_group(&mut self, hyper: &V::Hyper, index: usize) {
        self.groups.swap_remove(index);
        self.scorer.remove_group(hyper, index);
    }

    /// Absorb `x` into the group at `index` and refresh its cached terms.
    pub fn add_value(&mut self, hyper: &V::Hyper, index: usize, x: &V::Value) -> Result<()> {
        self.groups[index].observe(hyper, x)?;
        self.scorer
            .update_group_value(hyper, index, &self.groups[index], x);
        Ok(())
    }

    /// Remove `x` from the group at `index` and refresh its cached terms.
    pub fn remove_value(&mut self, hyper: &V::Hyper, index: usize, x: &V::Value) -> Result<()> {
        self.groups[index].forget(hyper, x)?;
        self.scorer
            .update_group_value(hyper, index, &self.groups[index], x);
        Ok(())
    }

    /// Fold the group at `source` into the group at `destination`, then
    /// packed-remove the vacated slot.
    ///
    /// # Panics
    /// If `destination == source`.
    pub fn merge_groups(&mut self, hyper: &V::Hyper, destination: usize, source: usize) {
        assert_ne!(destination, source, "cannot merge a group into itself");
        let removed = self.groups.swap_remove(source);
        self.scorer.remove_group(hyper, source);
        // the removal may have moved the destination into the vacated slot
        let destination = if destination == self.groups.len() {
            source
        } else {
            destination
        };
        self.groups[destination].merge(hyper, &removed);
        self.scorer
            .update_group(hyper, destination, &self.groups[destination]);
    }

    /// Recompute every cached term; required after replacing the
    /// hyperparameters wholesale.
    pub fn update_all(&mut self, hyper: &V::Hyper) {
        self.scorer.update_all(hyper, &self.groups);
    }

    /// Add each group's log posterior-predictive probability of `x` into
    /// `accum` (one slot per group, in packed order).
    pub fn score_value(&self, hyper: &V::Hyper, x: &V::Value, accum: &mut [f64]) -> Result<()> {
        debug_assert_eq!(accum.len(), self.groups.len());
        self.scorer.score_value(hyper, x, accum)
    }

    /// Total evidence of the whole population under `hyper`.
    pub fn score_data(&mut self, hyper: &V::Hyper) -> f64 {
        self.scorer.score_data(hyper, &self.groups)
    }

    /// Total evidence at every point of a hyperparameter grid.
    pub fn score_data_grid(&mut self, hypers: &[V::Hyper], out: &mut [f64]) -> Result<()> {
        self.scorer.score_data_grid(hypers, &self.groups, out)
    }
}
