use crate::error::Result;

pub mod categorical;
pub mod normal;

/// Incrementally-updated sufficient statistics for one group of a conjugate
/// model family.
///
/// A group starts empty, absorbs observations one at a time, and can give
/// them back in any order. All operations are O(1) in the number of
/// observations already absorbed.
pub trait GroupStat: Clone + std::fmt::Debug {
    /// Shared, read-only hyperparameters of the family.
    type Hyper;
    /// The observation type absorbed by the statistic.
    type Value;

    /// A statistic in the empty state.
    fn empty(hyper: &Self::Hyper) -> Self;

    /// Number of observations currently absorbed.
    fn n(&self) -> usize;

    /// Absorb one observation.
    fn observe(&mut self, hyper: &Self::Hyper, x: &Self::Value) -> Result<()>;

    /// Remove one previously absorbed observation.
    fn forget(&mut self, hyper: &Self::Hyper, x: &Self::Value) -> Result<()>;

    /// Absorb another group's statistics.
    fn merge(&mut self, hyper: &Self::Hyper, other: &Self);

    /// Log marginal likelihood of the group's data under the family prior.
    fn ln_m(&self, hyper: &Self::Hyper) -> f64;
}

/// Posterior-predictive scoring terms held in parallel arrays mirroring a
/// packed group population.
///
/// Slot `i` of every array corresponds to group `i` of the owning group
/// list, and every group mutation must be followed by `update_group` (or
/// `update_group_value`) before that group is scored again. `resize` or
/// `update_all` must run before any per-group event so the arrays match the
/// family dimension.
pub trait VectorizedScorer: Default {
    type Hyper;
    type Value;
    type Group: GroupStat<Hyper = Self::Hyper, Value = Self::Value>;

    /// Reallocate every parallel array to `len` slots.
    fn resize(&mut self, hyper: &Self::Hyper, len: usize);

    /// Append one zero-initialized slot to every parallel array.
    fn add_group(&mut self, hyper: &Self::Hyper);

    /// Packed removal: the slot at `index` is replaced by the last slot.
    ///
    /// The former last group changes index; callers must not assume index
    /// stability across removal.
    fn remove_group(&mut self, hyper: &Self::Hyper, index: usize);

    /// Recompute the cached terms at `index` from `group`.
    fn update_group(&mut self, hyper: &Self::Hyper, index: usize, group: &Self::Group);

    /// Refresh only the terms affected by one observed value.
    ///
    /// Falls back to a full `update_group`; families with per-component
    /// term arrays override this with a cheaper path.
    fn update_group_value(
        &mut self,
        hyper: &Self::Hyper,
        index: usize,
        group: &Self::Group,
        _x: &Self::Value,
    ) {
        self.update_group(hyper, index, group);
    }

    /// Recompute every slot from scratch.
    fn update_all(&mut self, hyper: &Self::Hyper, groups: &[Self::Group]);

    /// Number of slots currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add each group's log posterior-predictive probability of `x` into the
    /// caller-provided accumulator.
    ///
    /// The accumulator length must equal `len()`; this is checked with
    /// `debug_assert!` only, to keep the hot path branch-free.
    fn score_value(&self, hyper: &Self::Hyper, x: &Self::Value, accum: &mut [f64]) -> Result<()>;

    /// Total evidence: the summed log marginal likelihood of every group.
    ///
    /// Takes `&mut self` because it seeds a shared scoring cache; two
    /// threads must not share one scorer for evidence queries.
    fn score_data(&mut self, hyper: &Self::Hyper, groups: &[Self::Group]) -> f64;

    /// Total evidence at every point of a hyperparameter grid.
    ///
    /// The first point costs a full scan; each later point pays only for
    /// the components that changed since the previous point.
    fn score_data_grid(
        &mut self,
        hypers: &[Self::Hyper],
        groups: &[Self::Group],
        out: &mut [f64],
    ) -> Result<()>;
}
