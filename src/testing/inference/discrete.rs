//! Exact tests on the binomial distribution.
//!
//! Tail probabilities are evaluated through `statrs`, which works with the regularized
//! incomplete beta function instead of summing factorial terms, so they stay accurate for
//! any number of trials.

use crate::error::{ProportionError, Result};
use crate::testing::{Alternative, Distribution, Observation, TestResult, TwoSidedMethod};
use statrs::distribution::{Binomial, Discrete, DiscreteCDF};
use statrs::function::beta::checked_beta_reg;

/// Relative tolerance when comparing outcome probabilities for `TwoSidedMethod::MinLikelihood`.
const LIKELIHOOD_TOLERANCE: f64 = 1.0 + 1e-7;

/// Upper bound on bisection steps when inverting the regularized incomplete beta function.
const MAX_BISECTIONS: usize = 200;
/// Relative width at which a Beta quantile bracket is accepted.
const QUANTILE_TOLERANCE: f64 = 1e-12;

/// Performs an exact binomial test of `observation` against the baseline rate `baseline`.
///
/// The statistic of the result is the observed number of successes and the estimate is the
/// observed proportion. `baseline` must already lie in `[0, 1]`; 0 and 1 are handled as
/// degenerate distributions.
pub fn binomial_test(
    observation: Observation,
    baseline: f64,
    alternative: Alternative,
    two_sided: TwoSidedMethod,
) -> Result<TestResult<f64>> {
    let tails = BinomialTails::new(observation, baseline)?;

    let p_value = match alternative {
        Alternative::Greater => tails.upper(),
        Alternative::Less => tails.lower(),
        Alternative::TwoSided => match two_sided {
            TwoSidedMethod::DoubledTail => doubled_tail(tails.upper(), tails.lower()),
            TwoSidedMethod::MinLikelihood => tails.min_likelihood(),
        },
    };

    tracing::trace!(
        successes = observation.successes(),
        trials = observation.trials(),
        baseline,
        %alternative,
        p_value,
        "exact binomial test"
    );

    Ok(TestResult::new(
        observation.successes() as f64,
        p_value.clamp(0.0, 1.0),
        observation.rate(),
        alternative,
        Distribution::Binomial,
    ))
}

/// `min(1, 2 * min(upper, lower))`
pub(crate) fn doubled_tail(upper: f64, lower: f64) -> f64 {
    (2.0 * upper.min(lower)).min(1.0)
}

/// Clopper-Pearson interval for the true success rate.
///
/// Two-sided alternatives get a central interval, one-sided alternatives an interval that is
/// open on the side the alternative points to.
pub fn clopper_pearson_interval(
    observation: Observation,
    confidence_level: f64,
    alternative: Alternative,
) -> Result<(f64, f64)> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(ProportionError::invalid(
            "confidence_level",
            confidence_level,
            "must lie strictly between 0 and 1",
        ));
    }
    let alpha = 1.0 - confidence_level;

    let interval = match alternative {
        Alternative::TwoSided => (
            clopper_pearson_lower(observation, alpha / 2.0)?,
            clopper_pearson_upper(observation, alpha / 2.0)?,
        ),
        Alternative::Greater => (clopper_pearson_lower(observation, alpha)?, 1.0),
        Alternative::Less => (0.0, clopper_pearson_upper(observation, alpha)?),
    };
    Ok(interval)
}

fn clopper_pearson_lower(observation: Observation, alpha: f64) -> Result<f64> {
    let c = observation.successes();
    if c == 0 {
        return Ok(0.0);
    }
    beta_quantile(c as f64, (observation.failures() + 1) as f64, alpha)
}

fn clopper_pearson_upper(observation: Observation, alpha: f64) -> Result<f64> {
    let c = observation.successes();
    if c == observation.trials() {
        return Ok(1.0);
    }
    beta_quantile((c + 1) as f64, observation.failures() as f64, 1.0 - alpha)
}

/// Quantile `q` of Beta(a, b), found by bisection on the regularized incomplete beta function.
///
/// The number of steps is capped, so extreme shapes such as `Beta(3, 1e9)` still return in
/// bounded time; each step narrows the bracket by half until its width is within
/// `QUANTILE_TOLERANCE` of the upper end.
fn beta_quantile(a: f64, b: f64, q: f64) -> Result<f64> {
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for _ in 0..MAX_BISECTIONS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let cdf = checked_beta_reg(a, b, mid).map_err(|_| {
            ProportionError::invalid("c", a, "Beta quantile parameters out of range")
        })?;
        if cdf < q {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= QUANTILE_TOLERANCE * hi {
            break;
        }
    }
    Ok(0.5 * (lo + hi))
}

/// Tail probabilities of one observed count under Binomial(n, p0).
struct BinomialTails {
    observation: Observation,
    baseline: f64,
    dist: Option<Binomial>,
}

impl BinomialTails {
    fn new(observation: Observation, baseline: f64) -> Result<Self> {
        let dist = if baseline > 0.0 && baseline < 1.0 {
            Some(Binomial::new(baseline, observation.trials()).map_err(|_| {
                ProportionError::invalid("p0", baseline, "baseline rate must lie in [0, 1]")
            })?)
        } else {
            None
        };
        Ok(BinomialTails {
            observation,
            baseline,
            dist,
        })
    }

    /// The count a degenerate baseline produces with certainty.
    fn certain_count(&self) -> u64 {
        if self.baseline <= 0.0 {
            0
        } else {
            self.observation.trials()
        }
    }

    /// P(X >= c)
    fn upper(&self) -> f64 {
        let c = self.observation.successes();
        if c == 0 {
            return 1.0;
        }
        match &self.dist {
            Some(dist) => dist.sf(c - 1),
            None => indicator(self.certain_count() >= c),
        }
    }

    /// P(X <= c)
    fn lower(&self) -> f64 {
        let c = self.observation.successes();
        if c == self.observation.trials() {
            return 1.0;
        }
        match &self.dist {
            Some(dist) => dist.cdf(c),
            None => indicator(self.certain_count() <= c),
        }
    }

    /// Total probability of the outcomes that are no more likely than the observed count.
    fn min_likelihood(&self) -> f64 {
        let dist = match &self.dist {
            Some(dist) => dist,
            None => return indicator(self.certain_count() == self.observation.successes()),
        };

        let c = self.observation.successes();
        let n = self.observation.trials();
        let mean = n as f64 * self.baseline;
        let threshold = dist.pmf(c) * LIKELIHOOD_TOLERANCE;

        let c_f = c as f64;
        let p = if c_f == mean {
            1.0
        } else if c_f < mean {
            // pmf is non-increasing on [ceil(mean), n], and ceil(mean) >= 1 here
            let start = mean.ceil() as u64;
            let far_tail = first_index(start, n, |i| dist.pmf(i) <= threshold)
                .map_or(0.0, |ix| dist.sf(ix - 1));
            dist.cdf(c) + far_tail
        } else {
            // pmf is non-decreasing on [0, floor(mean)]
            let end = mean.floor() as u64;
            let far_tail = last_index(0, end, |i| dist.pmf(i) <= threshold)
                .map_or(0.0, |ix| dist.cdf(ix));
            dist.sf(c - 1) + far_tail
        };
        p.min(1.0)
    }
}

fn indicator(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}

/// Smallest `i` in `[lo, hi]` with `pred(i)`, for a predicate that flips from false to true once.
fn first_index(lo: u64, hi: u64, pred: impl Fn(u64) -> bool) -> Option<u64> {
    if lo > hi || !pred(hi) {
        return None;
    }
    let (mut lo, mut hi) = (lo, hi);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Some(lo)
}

/// Largest `i` in `[lo, hi]` with `pred(i)`, for a predicate that flips from true to false once.
fn last_index(lo: u64, hi: u64, pred: impl Fn(u64) -> bool) -> Option<u64> {
    if lo > hi || !pred(lo) {
        return None;
    }
    let (mut lo, mut hi) = (lo, hi);
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if pred(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Some(lo)
}
