//! Configuration for proportion tests.

use crate::error::{ProportionError, Result};

/// How the p-value of a proportion test is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestMethod {
    /// Exact binomial unless the sample is beyond `exact_limit` and the normal
    /// approximation is valid there.
    #[default]
    Auto,
    Exact,
    NormalApproximation,
}

/// How the two tails are combined for a two-sided alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TwoSidedMethod {
    /// `min(1, 2 * min(P(X >= c), P(X <= c)))`
    #[default]
    DoubledTail,
    /// Sum of the probabilities of all outcomes no more likely than the observed one.
    MinLikelihood,
}

/// Options controlling [`test_proportion_with`](crate::testing::inference::test_proportion_with).
#[derive(Debug, Clone, PartialEq)]
pub struct ProportionTestOptions {
    pub method: TestMethod,
    pub two_sided: TwoSidedMethod,
    /// Shift the observed count by half a unit towards the baseline before
    /// evaluating the normal tail. Ignored by the exact test.
    pub continuity_correction: bool,
    /// Minimum of `n * p0` and `n * (1 - p0)` for the normal approximation to be valid.
    pub min_expected_count: f64,
    /// Largest `n` evaluated exactly when the method is `Auto`. Larger samples switch to the
    /// normal approximation when it is valid; rare-event samples stay exact at any size.
    pub exact_limit: u64,
    /// Coverage of the interval attached to each result.
    pub confidence_level: f64,
}

impl Default for ProportionTestOptions {
    fn default() -> Self {
        ProportionTestOptions {
            method: TestMethod::Auto,
            two_sided: TwoSidedMethod::DoubledTail,
            continuity_correction: false,
            min_expected_count: 5.0,
            exact_limit: 1_000_000,
            confidence_level: 0.95,
        }
    }
}

impl ProportionTestOptions {
    pub fn with_method(mut self, method: TestMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_two_sided(mut self, two_sided: TwoSidedMethod) -> Self {
        self.two_sided = two_sided;
        self
    }

    pub fn with_continuity_correction(mut self, enabled: bool) -> Self {
        self.continuity_correction = enabled;
        self
    }

    pub fn with_min_expected_count(mut self, count: f64) -> Self {
        self.min_expected_count = count;
        self
    }

    pub fn with_exact_limit(mut self, limit: u64) -> Self {
        self.exact_limit = limit;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ProportionError::invalid(
                "confidence_level",
                self.confidence_level,
                "must lie strictly between 0 and 1",
            ));
        }
        if !self.min_expected_count.is_finite() || self.min_expected_count < 0.0 {
            return Err(ProportionError::invalid(
                "min_expected_count",
                self.min_expected_count,
                "must be a finite, non-negative count",
            ));
        }
        Ok(())
    }

    /// Whether `n * p0` and `n * (1 - p0)` both reach `min_expected_count`.
    pub fn normal_approximation_valid(&self, trials: u64, baseline: f64) -> bool {
        let n = trials as f64;
        n * baseline >= self.min_expected_count && n * (1.0 - baseline) >= self.min_expected_count
    }
}
