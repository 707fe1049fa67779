//! Normal conjugate family with a normal-inverse-chi-squared prior.
//!
//! Groups keep Welford-style running statistics (count, mean, scaled second
//! central moment); the posterior predictive is a scaled, shifted Student-t.

use itertools::izip;
use rand::Rng;
use rand_distr::{ChiSquared, Distribution, Normal};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{GroupStat, VectorizedScorer};
use crate::utils::{ln_gamma, ln_gamma_nu};

/// Normal-inverse-chi-squared hyperparameters: prior mean `mu`, prior
/// precision scale `kappa`, prior variance scale `sigmasq`, prior degrees of
/// freedom `nu`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalHyper {
    mu: f64,
    kappa: f64,
    sigmasq: f64,
    nu: f64,
}

impl NormalHyper {
    /// # Errors
    /// `InvalidHyper` unless `mu` is finite and `kappa`, `sigmasq`, `nu` are
    /// finite and strictly positive.
    pub fn new(mu: f64, kappa: f64, sigmasq: f64, nu: f64) -> Result<Self> {
        if !mu.is_finite() {
            return Err(Error::InvalidHyper("mu must be finite"));
        }
        for scale in [kappa, sigmasq, nu] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(Error::InvalidHyper(
                    "kappa, sigmasq, and nu must be finite and strictly positive",
                ));
            }
        }
        Ok(Self {
            mu,
            kappa,
            sigmasq,
            nu,
        })
    }

    /// Create without validating; the caller asserts the invariants.
    #[must_use]
    pub const fn new_unchecked(mu: f64, kappa: f64, sigmasq: f64, nu: f64) -> Self {
        Self {
            mu,
            kappa,
            sigmasq,
            nu,
        }
    }

    #[must_use]
    pub const fn mu(&self) -> f64 {
        self.mu
    }

    #[must_use]
    pub const fn kappa(&self) -> f64 {
        self.kappa
    }

    #[must_use]
    pub const fn sigmasq(&self) -> f64 {
        self.sigmasq
    }

    #[must_use]
    pub const fn nu(&self) -> f64 {
        self.nu
    }

    /// Closed-form conjugate update absorbing a group's statistics.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn posterior(&self, group: &NormalStat) -> Self {
        let n = group.n() as f64;
        let mu_delta = self.mu - group.mean();
        let kappa = self.kappa + n;
        let nu = self.nu + n;
        let mu = (self.kappa * self.mu + n * group.mean()) / kappa;
        let sigmasq = (self.nu * self.sigmasq
            + group.count_times_variance()
            + (n * self.kappa * mu_delta * mu_delta) / kappa)
            / nu;
        Self {
            mu,
            kappa,
            sigmasq,
            nu,
        }
    }
}

impl Default for NormalHyper {
    /// The unit-information reference prior: `mu = 0`, `kappa = sigmasq =
    /// nu = 1`.
    fn default() -> Self {
        Self {
            mu: 0.0,
            kappa: 1.0,
            sigmasq: 1.0,
            nu: 1.0,
        }
    }
}

/// Welford-style running statistics for one group.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalStat {
    n: usize,
    mean: f64,
    count_times_variance: f64,
}

impl NormalStat {
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// The scaled second central moment, `Σ(x − mean)²`.
    #[must_use]
    pub const fn count_times_variance(&self) -> f64 {
        self.count_times_variance
    }
}

impl GroupStat for NormalStat {
    type Hyper = NormalHyper;
    type Value = f64;

    fn empty(_hyper: &NormalHyper) -> Self {
        Self::default()
    }

    fn n(&self) -> usize {
        self.n
    }

    #[allow(clippy::cast_precision_loss)]
    fn observe(&mut self, _hyper: &NormalHyper, x: &f64) -> Result<()> {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.count_times_variance = delta.mul_add(x - self.mean, self.count_times_variance);
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn forget(&mut self, _hyper: &NormalHyper, x: &f64) -> Result<()> {
        if self.n == 0 {
            return Err(Error::InvalidOperation(
                "cannot remove a value from an empty group",
            ));
        }
        let total = self.mean * self.n as f64;
        let delta = x - self.mean;
        self.n -= 1;
        self.mean = if self.n == 0 {
            0.0
        } else {
            (total - x) / self.n as f64
        };
        // The inverse recurrence drifts for tiny groups; a group of size
        // <= 1 has no spread by definition, so pin the accumulator.
        if self.n <= 1 {
            self.count_times_variance = 0.0;
        } else {
            self.count_times_variance -= delta * (x - self.mean);
        }
        Ok(())
    }

    /// Parallel-variance combination: weighted mean shift plus a cross
    /// term, not naive summation.
    #[allow(clippy::cast_precision_loss)]
    fn merge(&mut self, _hyper: &NormalHyper, other: &Self) {
        let total = self.n + other.n;
        if total == 0 {
            return;
        }
        let delta = other.mean - self.mean;
        let source_part = other.n as f64 / total as f64;
        let cross_part = self.n as f64 * source_part;
        self.n = total;
        self.mean = source_part.mul_add(delta, self.mean);
        self.count_times_variance += other.count_times_variance + cross_part * delta * delta;
    }

    #[allow(clippy::cast_precision_loss)]
    fn ln_m(&self, hyper: &NormalHyper) -> f64 {
        let post = hyper.posterior(self);
        ln_gamma(0.5 * post.nu()) - ln_gamma(0.5 * hyper.nu())
            + 0.5 * (hyper.kappa() / post.kappa()).ln()
            + 0.5 * hyper.nu() * (hyper.nu() * hyper.sigmasq()).ln()
            - 0.5 * post.nu() * (post.nu() * post.sigmasq()).ln()
            - 0.5 * self.n as f64 * std::f64::consts::PI.ln()
    }
}

/// Posterior-predictive scorer for one group.
///
/// Precomputes the Student-t terms so each query is one log and one
/// multiply-add.
#[derive(Clone, Copy, Debug)]
pub struct NormalScorer {
    score: f64,
    log_coeff: f64,
    precision: f64,
    mean: f64,
}

impl NormalScorer {
    #[must_use]
    pub fn new(hyper: &NormalHyper, group: &NormalStat) -> Self {
        let post = hyper.posterior(group);
        let lambda = post.kappa() / ((post.kappa() + 1.0) * post.sigmasq());
        Self {
            score: ln_gamma_nu(post.nu())
                + 0.5 * (lambda / (std::f64::consts::PI * post.nu())).ln(),
            log_coeff: -0.5 * post.nu() - 0.5,
            precision: lambda / post.nu(),
            mean: post.mu(),
        }
    }

    /// Log posterior-predictive density at `x`.
    #[must_use]
    pub fn ln_pp(&self, x: f64) -> f64 {
        let delta = x - self.mean;
        self.score + self.log_coeff * (delta * delta).mul_add(self.precision, 1.0).ln()
    }
}

/// Draws values from one posterior draw of `(mu, sigmasq)`.
#[derive(Clone, Copy, Debug)]
pub struct NormalSampler {
    mu: f64,
    sigmasq: f64,
}

impl NormalSampler {
    pub fn new<R: Rng + ?Sized>(hyper: &NormalHyper, group: &NormalStat, rng: &mut R) -> Self {
        let post = hyper.posterior(group);
        // sigmasq ~ scaled inverse chi-squared(post.nu, post.sigmasq)
        let chisq = ChiSquared::new(post.nu())
            .expect("posterior degrees of freedom are positive")
            .sample(rng);
        let sigmasq = post.nu() * post.sigmasq() / chisq;
        let mu = Normal::new(post.mu(), (sigmasq / post.kappa()).sqrt())
            .expect("posterior mean scale is finite")
            .sample(rng);
        Self { mu, sigmasq }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        Normal::new(self.mu, self.sigmasq.sqrt())
            .expect("sampled variance is positive")
            .sample(rng)
    }
}

/// Draw one value from the posterior predictive of `group` under `hyper`.
pub fn sample_value<R: Rng + ?Sized>(
    hyper: &NormalHyper,
    group: &NormalStat,
    rng: &mut R,
) -> f64 {
    NormalSampler::new(hyper, group, rng).draw(rng)
}

/// Parallel per-group Student-t terms for the normal family.
#[derive(Clone, Debug, Default)]
pub struct NormalVectorized {
    score: Vec<f64>,
    log_coeff: Vec<f64>,
    precision: Vec<f64>,
    mean: Vec<f64>,
}

impl VectorizedScorer for NormalVectorized {
    type Hyper = NormalHyper;
    type Value = f64;
    type Group = NormalStat;

    fn resize(&mut self, _hyper: &NormalHyper, len: usize) {
        for terms in [
            &mut self.score,
            &mut self.log_coeff,
            &mut self.precision,
            &mut self.mean,
        ] {
            terms.clear();
            terms.resize(len, 0.0);
        }
    }

    fn add_group(&mut self, _hyper: &NormalHyper) {
        self.score.push(0.0);
        self.log_coeff.push(0.0);
        self.precision.push(0.0);
        self.mean.push(0.0);
    }

    fn remove_group(&mut self, _hyper: &NormalHyper, index: usize) {
        self.score.swap_remove(index);
        self.log_coeff.swap_remove(index);
        self.precision.swap_remove(index);
        self.mean.swap_remove(index);
    }

    fn update_group(&mut self, hyper: &NormalHyper, index: usize, group: &NormalStat) {
        let scorer = NormalScorer::new(hyper, group);
        self.score[index] = scorer.score;
        self.log_coeff[index] = scorer.log_coeff;
        self.precision[index] = scorer.precision;
        self.mean[index] = scorer.mean;
    }

    fn update_all(&mut self, hyper: &NormalHyper, groups: &[NormalStat]) {
        self.resize(hyper, groups.len());
        for (index, group) in groups.iter().enumerate() {
            self.update_group(hyper, index, group);
        }
    }

    fn len(&self) -> usize {
        self.score.len()
    }

    fn score_value(&self, _hyper: &NormalHyper, x: &f64, accum: &mut [f64]) -> Result<()> {
        debug_assert_eq!(accum.len(), self.score.len());
        for (acc, &score, &log_coeff, &precision, &mean) in izip!(
            accum.iter_mut(),
            &self.score,
            &self.log_coeff,
            &self.precision,
            &self.mean,
        ) {
            let delta = x - mean;
            *acc += score + log_coeff * (delta * delta).mul_add(precision, 1.0).ln();
        }
        Ok(())
    }

    fn score_data(&mut self, hyper: &NormalHyper, groups: &[NormalStat]) -> f64 {
        groups.iter().map(|group| group.ln_m(hyper)).sum()
    }

    /// Every scalar component couples into every group's contribution, so a
    /// changed grid point costs one O(groups) rescan; an unchanged point
    /// reuses the previous total.
    fn score_data_grid(
        &mut self,
        hypers: &[NormalHyper],
        groups: &[NormalStat],
        out: &mut [f64],
    ) -> Result<()> {
        if out.len() != hypers.len() {
            return Err(Error::SizeMismatch {
                expected: hypers.len(),
                actual: out.len(),
            });
        }
        let mut prev: Option<(&NormalHyper, f64)> = None;
        for (hyper, out) in hypers.iter().zip(out.iter_mut()) {
            let total = match prev {
                Some((seen, total)) if seen == hyper => total,
                _ => self.score_data(hyper, groups),
            };
            *out = total;
            prev = Some((hyper, total));
        }
        Ok(())
    }
}
