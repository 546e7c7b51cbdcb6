use crate::error::{ProportionError, Result};
use single_utilities::traits::FloatOps;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub mod correction;
pub mod effect;
pub mod inference;
pub mod options;

pub use options::{ProportionTestOptions, TestMethod, TwoSidedMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alternative {
    TwoSided,
    Less,    // True rate below the baseline
    Greater, // True rate above the baseline
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Alternative::TwoSided => "two-sided",
            Alternative::Less => "less",
            Alternative::Greater => "greater",
        };
        f.write_str(name)
    }
}

impl FromStr for Alternative {
    type Err = ProportionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "two-sided" | "two_sided" | "twosided" => Ok(Alternative::TwoSided),
            "less" => Ok(Alternative::Less),
            "greater" => Ok(Alternative::Greater),
            _ => Err(ProportionError::invalid(
                "alternative",
                s,
                "expected one of `greater`, `less`, `two-sided`",
            )),
        }
    }
}

/// Distribution the p-value of a result was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Binomial,
    Normal,
}

/// A count of successes out of a number of independent binary trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    successes: u64,
    trials: u64,
}

impl Observation {
    /// Create an observation, checking `trials > 0` and `successes <= trials`.
    pub fn new(successes: u64, trials: u64) -> Result<Self> {
        if trials == 0 {
            return Err(ProportionError::invalid(
                "n",
                trials,
                "number of trials must be positive",
            ));
        }
        if successes > trials {
            return Err(ProportionError::invalid(
                "c",
                successes,
                "successes must lie in [0, n]",
            ));
        }
        Ok(Observation { successes, trials })
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn failures(&self) -> u64 {
        self.trials - self.successes
    }

    /// Observed proportion `c / n`.
    pub fn rate(&self) -> f64 {
        self.successes as f64 / self.trials as f64
    }
}

#[derive(Debug, Clone)]
pub struct TestResult<T> {
    /// The test statistic (observed count for exact tests, z-score for normal tests)
    pub statistic: T,
    /// The p-value of the test
    pub p_value: T,
    /// Point estimate under test: the observed proportion, or the sample mean for mean tests
    pub estimate: T,
    /// Alternative hypothesis the p-value was computed for
    pub alternative: Alternative,
    /// Distribution the p-value was computed from
    pub distribution: Distribution,
    /// Confidence interval for the tested parameter (if available)
    pub confidence_interval: Option<(T, T)>,
    /// Effect size measurement
    pub effect_size: Option<T>,
    /// Standard error of the estimate under the null hypothesis
    pub standard_error: Option<T>,
}

impl<T> TestResult<T>
where
    T: FloatOps,
{
    /// Create a new test result with minimal information
    pub fn new(
        statistic: T,
        p_value: T,
        estimate: T,
        alternative: Alternative,
        distribution: Distribution,
    ) -> Self {
        TestResult {
            statistic,
            p_value,
            estimate,
            alternative,
            distribution,
            confidence_interval: None,
            effect_size: None,
            standard_error: None,
        }
    }

    /// Add confidence interval to the result
    pub fn with_confidence_interval(mut self, lower: T, upper: T) -> Self {
        self.confidence_interval = Some((lower, upper));
        self
    }

    /// Add effect size to the result
    pub fn with_effect_size(mut self, effect_size: T) -> Self {
        self.effect_size = Some(effect_size);
        self
    }

    /// Add standard error to the result
    pub fn with_standard_error(mut self, se: T) -> Self {
        self.standard_error = Some(se);
        self
    }

    /// The observed proportion for proportion tests (alias of `estimate`)
    pub fn observed_rate(&self) -> T {
        self.estimate
    }

    /// Check if the result is statistically significant at the given threshold
    pub fn is_significant(&self, alpha: T) -> bool {
        self.p_value < alpha
    }
}

#[derive(Debug, Clone)]
pub struct MultipleTestResults<T> {
    /// Test statistics for each comparison
    pub statistics: Vec<T>,
    /// Raw (unadjusted) p-values
    pub p_values: Vec<T>,
    /// Adjusted p-values (after multiple testing correction)
    pub adjusted_p_values: Option<Vec<T>>,
    /// Effect sizes (if calculated)
    pub effect_sizes: Option<Vec<T>>,
    /// Observed rates of each compared group
    pub estimates: Option<Vec<T>>,
    /// Global metadata about the test
    pub global_metadata: HashMap<String, String>,
}

impl<T> MultipleTestResults<T>
where
    T: FloatOps,
{
    /// Create a new results object from p-values
    pub fn new(statistics: Vec<T>, p_values: Vec<T>) -> Self {
        MultipleTestResults {
            statistics,
            p_values,
            adjusted_p_values: None,
            effect_sizes: None,
            estimates: None,
            global_metadata: HashMap::new(),
        }
    }

    /// Add adjusted p-values to the results
    pub fn with_adjusted_p_values(mut self, adjusted_p_values: Vec<T>) -> Self {
        self.adjusted_p_values = Some(adjusted_p_values);
        self
    }

    /// Add effect sizes to the results
    pub fn with_effect_sizes(mut self, effect_sizes: Vec<T>) -> Self {
        self.effect_sizes = Some(effect_sizes);
        self
    }

    pub fn with_estimates(mut self, estimates: Vec<T>) -> Self {
        self.estimates = Some(estimates);
        self
    }

    /// Add global metadata about the test
    pub fn with_global_metadata(mut self, key: &str, value: &str) -> Self {
        self.global_metadata
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Get indices of significant comparisons at the given threshold
    pub fn significant_indices(&self, alpha: T) -> Vec<usize> {
        let p_values = self.adjusted_p_values.as_ref().unwrap_or(&self.p_values);
        p_values
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| if p < alpha { Some(i) } else { None })
            .collect()
    }

    /// Get the number of significant comparisons at the given threshold
    pub fn num_significant(&self, alpha: T) -> usize {
        self.significant_indices(alpha).len()
    }

    /// Get the top n comparisons by p-value
    pub fn top_features(&self, n: usize) -> Vec<usize> {
        let p_values = self.adjusted_p_values.as_ref().unwrap_or(&self.p_values);

        let mut indices: Vec<usize> = (0..p_values.len()).collect();
        indices.sort_by(|&a, &b| {
            p_values[a]
                .partial_cmp(&p_values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        indices.truncate(n);
        indices
    }
}
