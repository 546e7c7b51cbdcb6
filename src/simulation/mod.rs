//! Simulation of p-values under the null hypothesis.
//!
//! If the null hypothesis is true, a valid test produces p-values that are (approximately)
//! uniformly distributed on `[0, 1]`: a result below `alpha` turns up about `alpha` of the
//! time. For discrete tests such as the exact binomial test the distribution is a step
//! function and the test is conservative, so the rejection rate stays at or below `alpha`.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use single_proportion::simulation::{simulate_null_p_values, PValueSummary, SimulationConfig};
//!
//! let config = SimulationConfig::new(1_000, 0.5).with_replicates(5_000).with_seed(7);
//! let p_values = simulate_null_p_values(&config).unwrap();
//! let summary = PValueSummary::from_p_values(&p_values, 20).unwrap();
//! println!("{:?}", summary.histogram);
//! ```

use crate::error::ProportionError;
use crate::testing::inference::{test_proportion_with, validate_baseline};
use crate::testing::{Alternative, Observation, ProportionTestOptions};
use anyhow::{Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Binomial, Distribution};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::cmp::Ordering;

/// Parameters of a null-hypothesis simulation.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of binary trials per replicate (`n`)
    pub trials: u64,
    /// True success rate, also the rate tested against (`p0`)
    pub baseline: f64,
    pub alternative: Alternative,
    pub replicates: usize,
    pub seed: u64,
    pub options: ProportionTestOptions,
}

impl SimulationConfig {
    pub fn new(trials: u64, baseline: f64) -> Self {
        SimulationConfig {
            trials,
            baseline,
            alternative: Alternative::TwoSided,
            replicates: 1_000,
            seed: 0,
            options: ProportionTestOptions::default(),
        }
    }

    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    pub fn with_replicates(mut self, replicates: usize) -> Self {
        self.replicates = replicates;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_options(mut self, options: ProportionTestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Draw `replicates` counts from Binomial(n, p0) and test each one against p0.
///
/// Replicate `i` draws from its own generator seeded with `seed + i`, so the output is the same
/// for a given seed however rayon schedules the work. P-values are returned in replicate order.
pub fn simulate_null_p_values(config: &SimulationConfig) -> Result<Vec<f64>> {
    if config.replicates == 0 {
        return Err(ProportionError::InsufficientData(
            "simulation needs at least one replicate".to_string(),
        )
        .into());
    }
    // Validate once up front rather than per replicate
    Observation::new(0, config.trials)?;
    let baseline = validate_baseline(config.baseline)?;
    let sampler = Binomial::new(config.trials, baseline).map_err(|_| {
        ProportionError::invalid("p0", baseline, "baseline rate must lie in [0, 1]")
    })?;

    tracing::debug!(
        trials = config.trials,
        baseline,
        replicates = config.replicates,
        seed = config.seed,
        "simulating p-values under the null"
    );

    let p_values = (0..config.replicates)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
            let successes = sampler.sample(&mut rng);
            let observation = Observation::new(successes, config.trials)?;
            test_proportion_with(observation, baseline, config.alternative, &config.options)
                .map(|r| r.p_value)
        })
        .collect::<std::result::Result<Vec<f64>, ProportionError>>()?;

    Ok(p_values)
}

/// Distribution summary of a set of p-values.
#[derive(Debug, Clone)]
pub struct PValueSummary {
    /// Counts over equal-width bins of `[0, 1]`; a p-value of exactly 1 lands in the last bin
    pub histogram: Vec<usize>,
    /// Kolmogorov-Smirnov distance between the empirical distribution and Uniform(0, 1)
    pub ks_statistic: f64,
    sorted: Vec<f64>,
}

impl PValueSummary {
    pub fn from_p_values(p_values: &[f64], bins: usize) -> Result<Self> {
        if p_values.is_empty() {
            return Err(anyhow!("Empty p-value array"));
        }
        if bins == 0 {
            return Err(anyhow!("Histogram needs at least one bin"));
        }
        if let Some((i, p)) = p_values
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }

        let mut histogram = vec![0usize; bins];
        for &p in p_values {
            let bin = ((p * bins as f64) as usize).min(bins - 1);
            histogram[bin] += 1;
        }

        let mut sorted = p_values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let ks_statistic = uniform_ks_distance(&sorted);

        Ok(PValueSummary {
            histogram,
            ks_statistic,
            sorted,
        })
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Fraction of p-values at or below `alpha`.
    pub fn rejection_rate(&self, alpha: f64) -> f64 {
        let below = self.sorted.partition_point(|&p| p <= alpha);
        below as f64 / self.sorted.len() as f64
    }

    pub fn mean(&self) -> f64 {
        self.sorted.iter().sum::<f64>() / self.sorted.len() as f64
    }
}

/// `sup |F_n(x) - x|` for sorted samples on `[0, 1]`.
fn uniform_ks_distance(sorted: &[f64]) -> f64 {
    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let above = (i + 1) as f64 / n - x;
            let below = x - i as f64 / n;
            above.max(below)
        })
        .fold(0.0, f64::max)
}
