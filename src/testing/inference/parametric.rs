//! Tests based on the normal distribution.
//!
//! By the Central Limit Theorem the sample proportion of `n` Bernoulli trials with success rate
//! `p0` is approximately `Normal(p0, p0 (1 - p0) / n)`, and the mean of `n` draws from a
//! population with standard deviation `sigma` is approximately `Normal(mu, sigma^2 / n)`. The
//! functions here turn those approximations into p-values.

use crate::error::{ProportionError, Result};
use crate::testing::inference::discrete::doubled_tail;
use crate::testing::{Alternative, Distribution, Observation, TestResult};
use statrs::distribution::{ContinuousCDF, Normal};

/// Normal-approximation test of an observed proportion against `baseline`.
///
/// `baseline` must lie strictly inside `(0, 1)`, otherwise the null distribution has zero
/// variance. With `continuity_correction` the count is moved half a unit towards the baseline
/// before each tail is evaluated.
///
/// # Returns
///
/// `TestResult` whose statistic is the uncorrected z-score and whose standard error is
/// `sqrt(p0 (1 - p0) / n)`.
pub fn normal_proportion_test(
    observation: Observation,
    baseline: f64,
    alternative: Alternative,
    continuity_correction: bool,
) -> Result<TestResult<f64>> {
    if !(baseline > 0.0 && baseline < 1.0) {
        return Err(ProportionError::invalid(
            "p0",
            baseline,
            "normal approximation needs a baseline strictly between 0 and 1",
        ));
    }

    let n = observation.trials() as f64;
    let c = observation.successes() as f64;
    let std_err = (baseline * (1.0 - baseline) / n).sqrt();
    let z_at = |count: f64| (count / n - baseline) / std_err;
    let correction = if continuity_correction { 0.5 } else { 0.0 };

    let standard = Normal::standard();

    // P(X >= c) and P(X <= c); the tail holding every outcome is exactly 1
    let upper = if observation.successes() == 0 {
        1.0
    } else {
        standard.sf(z_at(c - correction))
    };
    let lower = if observation.successes() == observation.trials() {
        1.0
    } else {
        standard.cdf(z_at(c + correction))
    };

    let p_value = match alternative {
        Alternative::Greater => upper,
        Alternative::Less => lower,
        Alternative::TwoSided => doubled_tail(upper, lower),
    };

    Ok(TestResult::new(
        z_at(c),
        p_value.clamp(0.0, 1.0),
        observation.rate(),
        alternative,
        Distribution::Normal,
    )
    .with_standard_error(std_err))
}

/// One-sample z-test for a mean with known population standard deviation.
///
/// # Arguments
///
/// * `sample_mean` - Mean of the observed sample
/// * `hypothesized_mean` - Population mean under the null hypothesis
/// * `population_sd` - Known population standard deviation
/// * `n` - Sample size
/// * `alternative` - Direction of the alternative hypothesis
///
/// # Returns
///
/// `TestResult` containing the z-score, the p-value and `sigma / sqrt(n)` as standard error.
pub fn z_test_mean(
    sample_mean: f64,
    hypothesized_mean: f64,
    population_sd: f64,
    n: u64,
    alternative: Alternative,
) -> Result<TestResult<f64>> {
    if n == 0 {
        return Err(ProportionError::invalid("n", n, "sample size must be positive"));
    }
    if !sample_mean.is_finite() {
        return Err(ProportionError::invalid("sample_mean", sample_mean, "must be finite"));
    }
    if !hypothesized_mean.is_finite() {
        return Err(ProportionError::invalid(
            "hypothesized_mean",
            hypothesized_mean,
            "must be finite",
        ));
    }
    if !(population_sd.is_finite() && population_sd > 0.0) {
        return Err(ProportionError::invalid(
            "population_sd",
            population_sd,
            "must be finite and positive",
        ));
    }

    let std_err = population_sd / (n as f64).sqrt();
    let z = (sample_mean - hypothesized_mean) / std_err;
    let standard = Normal::standard();

    let p_value = match alternative {
        Alternative::Greater => standard.sf(z),
        Alternative::Less => standard.cdf(z),
        Alternative::TwoSided => (2.0 * standard.sf(z.abs())).min(1.0),
    };

    Ok(
        TestResult::new(z, p_value, sample_mean, alternative, Distribution::Normal)
            .with_standard_error(std_err),
    )
}

/// Wilson score interval for the true rate behind `observation`.
///
/// Used alongside the normal approximation; `Greater` and `Less` give one-sided bounds with
/// the other end pinned at 1 or 0.
pub fn wilson_interval(
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
    let tail = match alternative {
        Alternative::TwoSided => alpha / 2.0,
        Alternative::Greater | Alternative::Less => alpha,
    };
    let z = Normal::standard().inverse_cdf(1.0 - tail);

    let n = observation.trials() as f64;
    let rate = observation.rate();
    let z2_n = z * z / n;
    let center = (rate + z2_n / 2.0) / (1.0 + z2_n);
    let half_width =
        z / (1.0 + z2_n) * (rate * (1.0 - rate) / n + z2_n / (4.0 * n)).sqrt();
    let lower = (center - half_width).clamp(0.0, 1.0);
    let upper = (center + half_width).clamp(0.0, 1.0);

    Ok(match alternative {
        Alternative::TwoSided => (lower, upper),
        Alternative::Greater => (lower, 1.0),
        Alternative::Less => (0.0, upper),
    })
}
