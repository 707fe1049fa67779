//! Dirichlet-categorical conjugate family.
//!
//! Observations are category indices in `[0, dim)`; each group keeps one
//! count per category, and every score below is available in closed form.

use itertools::izip;
use rand::Rng;
use rand_distr::{Distribution, Gamma};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{GroupStat, VectorizedScorer};
use crate::utils::ln_gamma;

/// Dirichlet concentration parameters shared by every group of one model.
///
/// The dimension is fixed for the lifetime of the value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CategoricalHyper {
    alphas: Vec<f64>,
}

impl CategoricalHyper {
    /// Create from a vector of concentrations, one per category.
    ///
    /// # Errors
    /// `InvalidHyper` if the vector is empty or any concentration is not
    /// finite and strictly positive.
    pub fn new(alphas: Vec<f64>) -> Result<Self> {
        if alphas.is_empty() {
            return Err(Error::InvalidHyper("concentration vector is empty"));
        }
        if alphas.iter().any(|a| !a.is_finite() || *a <= 0.0) {
            return Err(Error::InvalidHyper(
                "concentrations must be finite and strictly positive",
            ));
        }
        Ok(Self { alphas })
    }

    /// Create without validating; the caller asserts the invariants.
    #[must_use]
    pub fn new_unchecked(alphas: Vec<f64>) -> Self {
        Self { alphas }
    }

    /// A symmetric prior: `dim` categories, all at concentration `alpha`.
    pub fn symmetric(alpha: f64, dim: usize) -> Result<Self> {
        Self::new(vec![alpha; dim])
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.alphas.len()
    }

    #[must_use]
    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    #[must_use]
    pub fn alpha_sum(&self) -> f64 {
        self.alphas.iter().sum()
    }
}

/// Per-group category counts.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoricalStat {
    n: usize,
    counts: Vec<usize>,
}

impl CategoricalStat {
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
}

impl GroupStat for CategoricalStat {
    type Hyper = CategoricalHyper;
    type Value = usize;

    fn empty(hyper: &CategoricalHyper) -> Self {
        Self {
            n: 0,
            counts: vec![0; hyper.dim()],
        }
    }

    fn n(&self) -> usize {
        self.n
    }

    fn observe(&mut self, hyper: &CategoricalHyper, x: &usize) -> Result<()> {
        if *x >= hyper.dim() {
            return Err(Error::OutOfRange {
                value: *x,
                dim: hyper.dim(),
            });
        }
        self.n += 1;
        self.counts[*x] += 1;
        Ok(())
    }

    fn forget(&mut self, hyper: &CategoricalHyper, x: &usize) -> Result<()> {
        if *x >= hyper.dim() {
            return Err(Error::OutOfRange {
                value: *x,
                dim: hyper.dim(),
            });
        }
        if self.counts[*x] == 0 {
            return Err(Error::InvalidOperation(
                "no observations of this category to forget",
            ));
        }
        self.n -= 1;
        self.counts[*x] -= 1;
        Ok(())
    }

    fn merge(&mut self, _hyper: &CategoricalHyper, other: &Self) {
        debug_assert_eq!(self.counts.len(), other.counts.len());
        self.n += other.n;
        for (count, &source) in self.counts.iter_mut().zip(&other.counts) {
            *count += source;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn ln_m(&self, hyper: &CategoricalHyper) -> f64 {
        let mut score = 0.0;
        let mut alpha_sum = 0.0;
        for (&alpha, &count) in hyper.alphas().iter().zip(&self.counts) {
            alpha_sum += alpha;
            score += ln_gamma(alpha + count as f64) - ln_gamma(alpha);
        }
        score + ln_gamma(alpha_sum) - ln_gamma(alpha_sum + self.n as f64)
    }
}

/// Posterior-predictive scorer for one group.
#[derive(Clone, Debug)]
pub struct CategoricalScorer {
    alphas: Vec<f64>,
    alpha_sum: f64,
}

impl CategoricalScorer {
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(hyper: &CategoricalHyper, group: &CategoricalStat) -> Self {
        let mut alphas = Vec::with_capacity(hyper.dim());
        let mut alpha_sum = 0.0;
        for (&alpha, &count) in hyper.alphas().iter().zip(group.counts()) {
            let posterior = alpha + count as f64;
            alpha_sum += posterior;
            alphas.push(posterior);
        }
        Self { alphas, alpha_sum }
    }

    /// Log posterior-predictive probability of observing category `x`.
    pub fn ln_pp(&self, x: usize) -> Result<f64> {
        self.alphas
            .get(x)
            .map(|alpha| (alpha / self.alpha_sum).ln())
            .ok_or(Error::OutOfRange {
                value: x,
                dim: self.alphas.len(),
            })
    }
}

/// Draws categories from one posterior draw of the category weights.
#[derive(Clone, Debug)]
pub struct CategoricalSampler {
    ps: Vec<f64>,
}

impl CategoricalSampler {
    /// Draw one weight vector from the posterior Dirichlet.
    #[allow(clippy::cast_precision_loss)]
    pub fn new<R: Rng + ?Sized>(
        hyper: &CategoricalHyper,
        group: &CategoricalStat,
        rng: &mut R,
    ) -> Self {
        // Normalized Gamma(α'_c, 1) variates are a Dirichlet(α') draw.
        let mut ps: Vec<f64> = hyper
            .alphas()
            .iter()
            .zip(group.counts())
            .map(|(&alpha, &count)| {
                Gamma::new(alpha + count as f64, 1.0)
                    .expect("posterior concentration is positive")
                    .sample(rng)
            })
            .collect();
        let total: f64 = ps.iter().sum();
        for p in &mut ps {
            *p /= total;
        }
        Self { ps }
    }

    /// Draw one category from the held weight vector.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let u: f64 = rng.random();
        let mut acc = 0.0;
        for (category, p) in self.ps.iter().enumerate() {
            acc += p;
            if u <= acc {
                return category;
            }
        }
        self.ps.len() - 1
    }
}

/// Draw one value from the posterior predictive of `group` under `hyper`.
pub fn sample_value<R: Rng + ?Sized>(
    hyper: &CategoricalHyper,
    group: &CategoricalStat,
    rng: &mut R,
) -> usize {
    CategoricalSampler::new(hyper, group, rng).draw(rng)
}

/// Evidence contributions across a whole group population, cached so that a
/// single-concentration perturbation costs O(groups) instead of
/// O(groups × dim).
///
/// State is valid only for the concentrations most recently passed to
/// `init` or `update`.
#[derive(Clone, Debug, Default)]
pub struct CategoricalEvidenceCache {
    alpha_sum: f64,
    // ln Γ(α_c) per category, then ln Γ(Σα) in the trailing slot.
    shared_part: Vec<f64>,
    // accumulated per-category contribution, then the total-count term.
    scores: Vec<f64>,
}

impl CategoricalEvidenceCache {
    /// Full O(groups × dim) scan. Groups with no observations contribute
    /// exactly zero and are skipped.
    #[allow(clippy::cast_precision_loss)]
    pub fn init(&mut self, hyper: &CategoricalHyper, groups: &[CategoricalStat]) {
        let dim = hyper.dim();

        self.shared_part.clear();
        self.shared_part.reserve(dim + 1);
        let mut alpha_sum = 0.0;
        for &alpha in hyper.alphas() {
            alpha_sum += alpha;
            self.shared_part.push(ln_gamma(alpha));
        }
        self.alpha_sum = alpha_sum;
        self.shared_part.push(ln_gamma(alpha_sum));

        self.scores.clear();
        self.scores.resize(dim + 1, 0.0);
        for group in groups {
            if group.n() == 0 {
                continue;
            }
            for (score, &alpha, &count, &shared) in izip!(
                &mut self.scores[..dim],
                hyper.alphas(),
                group.counts(),
                &self.shared_part[..dim],
            ) {
                *score += ln_gamma(alpha + count as f64) - shared;
            }
            self.scores[dim] += self.shared_part[dim] - ln_gamma(alpha_sum + group.n() as f64);
        }
    }

    /// Sum of all cached contributions: O(dim), not O(groups).
    #[must_use]
    pub fn eval(&self) -> f64 {
        self.scores.iter().sum()
    }

    /// Re-derive the cache after `category`'s concentration moved from
    /// `old_alpha` to `new_alpha`: O(groups), touching only the affected
    /// category's contribution and the total-count term.
    #[allow(clippy::cast_precision_loss)]
    pub fn update(
        &mut self,
        category: usize,
        old_alpha: f64,
        new_alpha: f64,
        groups: &[CategoricalStat],
    ) {
        let dim = self.scores.len() - 1;
        self.shared_part[category] = ln_gamma(new_alpha);
        self.alpha_sum += new_alpha - old_alpha;
        self.shared_part[dim] = ln_gamma(self.alpha_sum);

        self.scores[category] = 0.0;
        self.scores[dim] = 0.0;
        for group in groups {
            if group.n() == 0 {
                continue;
            }
            self.scores[category] +=
                ln_gamma(new_alpha + group.counts()[category] as f64) - self.shared_part[category];
            self.scores[dim] +=
                self.shared_part[dim] - ln_gamma(self.alpha_sum + group.n() as f64);
        }
    }
}

/// Parallel per-group scoring arrays for the categorical family.
///
/// One score array per category plus one shift array; a predictive query
/// against every group is a single elementwise pass.
#[derive(Clone, Debug, Default)]
pub struct CategoricalVectorized {
    alpha_sum: f64,
    // scores[c][i] = ln(α_c + counts_c) for group i
    scores: Vec<Vec<f64>>,
    // shift[i] = ln(Σα + n) for group i
    shift: Vec<f64>,
    evidence: CategoricalEvidenceCache,
}

impl VectorizedScorer for CategoricalVectorized {
    type Hyper = CategoricalHyper;
    type Value = usize;
    type Group = CategoricalStat;

    fn resize(&mut self, hyper: &CategoricalHyper, len: usize) {
        self.alpha_sum = hyper.alpha_sum();
        self.scores.resize(hyper.dim(), Vec::new());
        for scores in &mut self.scores {
            scores.clear();
            scores.resize(len, 0.0);
        }
        self.shift.clear();
        self.shift.resize(len, 0.0);
    }

    fn add_group(&mut self, _hyper: &CategoricalHyper) {
        for scores in &mut self.scores {
            scores.push(0.0);
        }
        self.shift.push(0.0);
    }

    fn remove_group(&mut self, _hyper: &CategoricalHyper, index: usize) {
        for scores in &mut self.scores {
            scores.swap_remove(index);
        }
        self.shift.swap_remove(index);
    }

    #[allow(clippy::cast_precision_loss)]
    fn update_group(&mut self, hyper: &CategoricalHyper, index: usize, group: &CategoricalStat) {
        for (scores, &alpha, &count) in izip!(&mut self.scores, hyper.alphas(), group.counts()) {
            scores[index] = (alpha + count as f64).ln();
        }
        self.shift[index] = (self.alpha_sum + group.n() as f64).ln();
    }

    /// O(1) per-event refresh: only the observed category's term and the
    /// shift term depend on the event.
    #[allow(clippy::cast_precision_loss)]
    fn update_group_value(
        &mut self,
        hyper: &CategoricalHyper,
        index: usize,
        group: &CategoricalStat,
        x: &usize,
    ) {
        self.scores[*x][index] = (hyper.alphas()[*x] + group.counts()[*x] as f64).ln();
        self.shift[index] = (self.alpha_sum + group.n() as f64).ln();
    }

    fn update_all(&mut self, hyper: &CategoricalHyper, groups: &[CategoricalStat]) {
        self.resize(hyper, groups.len());
        for (index, group) in groups.iter().enumerate() {
            self.update_group(hyper, index, group);
        }
    }

    fn len(&self) -> usize {
        self.shift.len()
    }

    fn score_value(
        &self,
        _hyper: &CategoricalHyper,
        x: &usize,
        accum: &mut [f64],
    ) -> Result<()> {
        let scores = self.scores.get(*x).ok_or(Error::OutOfRange {
            value: *x,
            dim: self.scores.len(),
        })?;
        debug_assert_eq!(accum.len(), self.shift.len());
        for (acc, &score, &shift) in izip!(accum.iter_mut(), scores, &self.shift) {
            *acc += score - shift;
        }
        Ok(())
    }

    fn score_data(&mut self, hyper: &CategoricalHyper, groups: &[CategoricalStat]) -> f64 {
        self.evidence.init(hyper, groups);
        self.evidence.eval()
    }

    fn score_data_grid(
        &mut self,
        hypers: &[CategoricalHyper],
        groups: &[CategoricalStat],
        out: &mut [f64],
    ) -> Result<()> {
        if out.len() != hypers.len() {
            return Err(Error::SizeMismatch {
                expected: hypers.len(),
                actual: out.len(),
            });
        }
        let Some((first, rest)) = hypers.split_first() else {
            return Ok(());
        };
        for hyper in rest {
            if hyper.dim() != first.dim() {
                return Err(Error::SizeMismatch {
                    expected: first.dim(),
                    actual: hyper.dim(),
                });
            }
        }

        self.evidence.init(first, groups);
        out[0] = self.evidence.eval();
        for (prev, hyper, out) in izip!(hypers.iter(), rest, &mut out[1..]) {
            for (category, (&old_alpha, &new_alpha)) in
                prev.alphas().iter().zip(hyper.alphas()).enumerate()
            {
                if new_alpha != old_alpha {
                    self.evidence.update(category, old_alpha, new_alpha, groups);
                }
            }
            *out = self.evidence.eval();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;
    use rv::data::{CategoricalSuffStat, DataOrSuffStat};
    use rv::dist::{Categorical, Dirichlet};
    use rv::traits::{ConjugatePrior, SuffStat};

    use super::*;

    fn group_with(hyper: &CategoricalHyper, xs: &[usize]) -> CategoricalStat {
        let mut group = CategoricalStat::empty(hyper);
        for x in xs {
            group.observe(hyper, x).unwrap();
        }
        group
    }

    #[test]
    fn empty_group_has_zero_marginal() {
        let hyper = CategoricalHyper::symmetric(1.0, 2).unwrap();
        let group = CategoricalStat::empty(&hyper);
        assert::close(group.ln_m(&hyper), 0.0, 1e-12);
    }

    #[test]
    fn single_observation_tilts_predictive() {
        let hyper = CategoricalHyper::symmetric(1.0, 2).unwrap();
        let group = group_with(&hyper, &[0]);
        let scorer = CategoricalScorer::new(&hyper, &group);
        let ln_p0 = scorer.ln_pp(0).unwrap();
        let ln_p1 = scorer.ln_pp(1).unwrap();
        assert!(ln_p0 > ln_p1);
        // posterior concentration [2, 1] puts mass 2/3 on category 0
        assert::close(ln_p0.exp(), 2.0 / 3.0, 1e-12);
        assert::close(ln_p1.exp(), 1.0 / 3.0, 1e-12);
    }

    #[test]
    fn observe_rejects_out_of_range() {
        let hyper = CategoricalHyper::symmetric(0.5, 3).unwrap();
        let mut group = CategoricalStat::empty(&hyper);
        let err = group.observe(&hyper, &3).unwrap_err();
        assert_eq!(err, Error::OutOfRange { value: 3, dim: 3 });
        // failed observe leaves the statistic untouched
        assert_eq!(group.n(), 0);
    }

    #[test]
    fn forget_rejects_unobserved_category() {
        let hyper = CategoricalHyper::symmetric(0.5, 3).unwrap();
        let mut group = group_with(&hyper, &[1]);
        assert!(matches!(
            group.forget(&hyper, &0),
            Err(Error::InvalidOperation(_))
        ));
        assert_eq!(group.n(), 1);
    }

    #[test]
    fn invalid_concentrations_rejected() {
        assert!(CategoricalHyper::new(vec![]).is_err());
        assert!(CategoricalHyper::new(vec![1.0, 0.0]).is_err());
        assert!(CategoricalHyper::new(vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn ln_pp_is_marginal_ratio() {
        let hyper = CategoricalHyper::new(vec![0.5, 1.5, 2.0]).unwrap();
        let group = group_with(&hyper, &[0, 1, 1, 2]);
        let scorer = CategoricalScorer::new(&hyper, &group);
        for x in 0..3 {
            let mut extended = group.clone();
            extended.observe(&hyper, &x).unwrap();
            assert::close(
                scorer.ln_pp(x).unwrap(),
                extended.ln_m(&hyper) - group.ln_m(&hyper),
                1e-9,
            );
        }
    }

    #[test]
    fn closed_forms_match_rv() {
        let alphas = vec![0.5, 1.5, 2.0];
        let xs = [0usize, 1, 1, 2, 2, 2];

        let hyper = CategoricalHyper::new(alphas.clone()).unwrap();
        let group = group_with(&hyper, &xs);

        let prior = Dirichlet::new(alphas).unwrap();
        let mut stat = CategoricalSuffStat::new(3);
        for x in &xs {
            stat.observe(x);
        }
        let stat = DataOrSuffStat::SuffStat(&stat);

        let rv_ln_m = <Dirichlet as ConjugatePrior<usize, Categorical>>::ln_m(&prior, &stat);
        assert::close(group.ln_m(&hyper), rv_ln_m, 1e-9);

        let scorer = CategoricalScorer::new(&hyper, &group);
        for x in 0..3usize {
            let rv_ln_pp =
                <Dirichlet as ConjugatePrior<usize, Categorical>>::ln_pp(&prior, &x, &stat);
            assert::close(scorer.ln_pp(x).unwrap(), rv_ln_pp, 1e-9);
        }
    }

    #[test]
    fn vectorized_matches_single_group_scorer() {
        let hyper = CategoricalHyper::new(vec![1.0, 0.5, 2.5]).unwrap();
        let groups = vec![
            group_with(&hyper, &[0, 0, 1]),
            CategoricalStat::empty(&hyper),
            group_with(&hyper, &[2, 2, 2, 1]),
        ];

        let mut vectorized = CategoricalVectorized::default();
        vectorized.update_all(&hyper, &groups);

        for x in 0..3usize {
            let mut accum = vec![0.0; groups.len()];
            vectorized.score_value(&hyper, &x, &mut accum).unwrap();
            for (acc, group) in accum.iter().zip(&groups) {
                let expected = CategoricalScorer::new(&hyper, group).ln_pp(x).unwrap();
                assert::close(*acc, expected, 1e-9);
            }
        }
    }

    #[test]
    fn update_group_value_matches_full_update() {
        let hyper = CategoricalHyper::symmetric(0.7, 3).unwrap();
        let mut groups = vec![group_with(&hyper, &[0, 2]), group_with(&hyper, &[1])];

        let mut incremental = CategoricalVectorized::default();
        incremental.update_all(&hyper, &groups);
        let mut full = incremental.clone();

        groups[1].observe(&hyper, &2).unwrap();
        incremental.update_group_value(&hyper, 1, &groups[1], &2);
        full.update_group(&hyper, 1, &groups[1]);

        for x in 0..3usize {
            let mut a = vec![0.0; 2];
            let mut b = vec![0.0; 2];
            incremental.score_value(&hyper, &x, &mut a).unwrap();
            full.score_value(&hyper, &x, &mut b).unwrap();
            assert::close(a, b, 1e-12);
        }
    }

    #[test]
    fn packed_removal_swaps_in_last_group() {
        let hyper = CategoricalHyper::symmetric(1.0, 2).unwrap();
        let mut groups = vec![
            group_with(&hyper, &[0]),
            group_with(&hyper, &[1, 1]),
            group_with(&hyper, &[0, 0, 0]),
        ];

        let mut vectorized = CategoricalVectorized::default();
        vectorized.update_all(&hyper, &groups);
        vectorized.remove_group(&hyper, 0);
        groups.swap_remove(0);

        let mut rebuilt = CategoricalVectorized::default();
        rebuilt.update_all(&hyper, &groups);

        assert_eq!(vectorized.len(), 2);
        for x in 0..2usize {
            let mut a = vec![0.0; 2];
            let mut b = vec![0.0; 2];
            vectorized.score_value(&hyper, &x, &mut a).unwrap();
            rebuilt.score_value(&hyper, &x, &mut b).unwrap();
            assert::close(a, b, 1e-12);
        }
    }

    #[test]
    fn grid_matches_full_rescan() {
        let groups = vec![
            CategoricalStat::empty(&CategoricalHyper::symmetric(1.0, 3).unwrap()),
            group_with(&CategoricalHyper::symmetric(1.0, 3).unwrap(), &[0, 1, 1]),
            group_with(&CategoricalHyper::symmetric(1.0, 3).unwrap(), &[2, 2, 2, 0]),
        ];

        // a line search over component 0, then moves in other components,
        // then a point where two components change at once
        let grid = vec![
            CategoricalHyper::new(vec![1.0, 1.0, 1.0]).unwrap(),
            CategoricalHyper::new(vec![1.5, 1.0, 1.0]).unwrap(),
            CategoricalHyper::new(vec![2.0, 1.0, 1.0]).unwrap(),
            CategoricalHyper::new(vec![2.0, 1.0, 0.7]).unwrap(),
            CategoricalHyper::new(vec![0.5, 2.5, 0.7]).unwrap(),
        ];

        let mut vectorized = CategoricalVectorized::default();
        vectorized.update_all(&grid[0], &groups);
        let mut out = vec![0.0; grid.len()];
        vectorized.score_data_grid(&grid, &groups, &mut out).unwrap();

        for (hyper, &total) in grid.iter().zip(&out) {
            let fresh = CategoricalVectorized::default().score_data(hyper, &groups);
            assert::close(total, fresh, 1e-8);
        }
    }

    #[test]
    fn grid_rejects_output_length_mismatch() {
        let hyper = CategoricalHyper::symmetric(1.0, 2).unwrap();
        let mut vectorized = CategoricalVectorized::default();
        let mut out = vec![0.0; 1];
        let err = vectorized
            .score_data_grid(&[hyper.clone(), hyper], &[], &mut out)
            .unwrap_err();
        assert_eq!(
            err,
            Error::SizeMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn evidence_matches_summed_group_marginals() {
        let hyper = CategoricalHyper::new(vec![0.5, 2.0]).unwrap();
        let groups = vec![
            group_with(&hyper, &[0, 0]),
            group_with(&hyper, &[1]),
            CategoricalStat::empty(&hyper),
        ];
        let direct: f64 = groups.iter().map(|g| g.ln_m(&hyper)).sum();
        let cached = CategoricalVectorized::default().score_data(&hyper, &groups);
        assert::close(cached, direct, 1e-9);
    }

    #[test]
    fn sampler_favors_heavy_category() {
        let hyper = CategoricalHyper::symmetric(1.0, 3).unwrap();
        let mut group = CategoricalStat::empty(&hyper);
        for _ in 0..50 {
            group.observe(&hyper, &2).unwrap();
        }

        let mut rng = Xoshiro256Plus::seed_from_u64(0x1234);
        let sampler = CategoricalSampler::new(&hyper, &group, &mut rng);
        let mut counts = [0usize; 3];
        for _ in 0..1000 {
            counts[sampler.draw(&mut rng)] += 1;
        }
        assert!(counts[2] > counts[0] + counts[1]);
    }

    #[test]
    fn sample_value_stays_in_range() {
        let hyper = CategoricalHyper::symmetric(0.5, 4).unwrap();
        let group = CategoricalStat::empty(&hyper);
        let mut rng = SmallRng::seed_from_u64(0x1234);
        for _ in 0..100 {
            assert!(sample_value(&hyper, &group, &mut rng) < 4);
        }
    }

    proptest! {
        #[test]
        fn observe_forget_conserves_counts(xs in prop::collection::vec(0usize..4, 1..64)) {
            let hyper = CategoricalHyper::symmetric(0.5, 4).unwrap();
            let mut group = CategoricalStat::empty(&hyper);
            for x in &xs {
                group.observe(&hyper, x).unwrap();
            }
            prop_assert_eq!(group.n(), xs.len());
            prop_assert_eq!(group.counts().iter().sum::<usize>(), xs.len());

            for x in xs.iter().rev() {
                group.forget(&hyper, x).unwrap();
            }
            prop_assert_eq!(group.n(), 0);
            prop_assert!(group.counts().iter().all(|&c| c == 0));
        }

        #[test]
        fn merge_matches_direct_accumulation(
            xs in prop::collection::vec(0usize..3, 0..40),
            split in 0usize..40,
        ) {
            let hyper = CategoricalHyper::symmetric(1.5, 3).unwrap();
            let split = split.min(xs.len());

            let mut left = group_with(&hyper, &xs[..split]);
            let right = group_with(&hyper, &xs[split..]);
            left.merge(&hyper, &right);

            let direct = group_with(&hyper, &xs);
            prop_assert_eq!(left, direct);
        }
    }
}
