use crate::error::{ProportionError, Result};
use crate::testing::correction::{self, CorrectionMethod};
use crate::testing::effect::cohens_h;
use crate::testing::{
    Alternative, Distribution, MultipleTestResults, Observation, ProportionTestOptions,
    TestMethod, TestResult,
};

pub mod discrete;

pub mod parametric;

/// Proportion tests available on an observed count.
pub trait ProportionStatTests {
    /// Exact binomial test against a baseline rate.
    fn binomial_test(&self, baseline: f64, alternative: Alternative) -> Result<TestResult<f64>>;

    /// Normal-approximation z-test against a baseline rate.
    fn z_test(&self, baseline: f64, alternative: Alternative) -> Result<TestResult<f64>>;

    /// Test this observation against the observed rate of `control`.
    fn compare_to(&self, control: &Observation, alternative: Alternative)
    -> Result<TestResult<f64>>;
}

impl ProportionStatTests for Observation {
    fn binomial_test(&self, baseline: f64, alternative: Alternative) -> Result<TestResult<f64>> {
        let options = ProportionTestOptions::default().with_method(TestMethod::Exact);
        test_proportion_with(*self, baseline, alternative, &options)
    }

    fn z_test(&self, baseline: f64, alternative: Alternative) -> Result<TestResult<f64>> {
        let options =
            ProportionTestOptions::default().with_method(TestMethod::NormalApproximation);
        test_proportion_with(*self, baseline, alternative, &options)
    }

    fn compare_to(
        &self,
        control: &Observation,
        alternative: Alternative,
    ) -> Result<TestResult<f64>> {
        ab_test(*control, *self, alternative)
    }
}

/// Test whether `c` successes in `n` trials are consistent with a success rate of `p0`.
///
/// Uses the default [`ProportionTestOptions`]: the exact binomial distribution, with the two-sided
/// p-value taken as twice the smaller tail.
///
/// # Example
///
/// ```
/// use single_proportion::testing::Alternative;
/// use single_proportion::testing::inference::test_proportion;
///
/// let result = test_proportion(10, 50, 0.1, Alternative::Greater).unwrap();
/// assert!((result.observed_rate() - 0.2).abs() < 1e-12);
/// assert!(result.is_significant(0.05));
/// ```
pub fn test_proportion(
    c: u64,
    n: u64,
    p0: f64,
    alternative: Alternative,
) -> Result<TestResult<f64>> {
    let observation = Observation::new(c, n)?;
    test_proportion_with(
        observation,
        p0,
        alternative,
        &ProportionTestOptions::default(),
    )
}

/// Test an observation against a baseline rate with explicit options.
///
/// The result carries an interval for the true rate at `options.confidence_level`, one-sided
/// when the alternative is: Clopper-Pearson when the exact test ran, Wilson score when the
/// normal approximation did.
pub fn test_proportion_with(
    observation: Observation,
    baseline: f64,
    alternative: Alternative,
    options: &ProportionTestOptions,
) -> Result<TestResult<f64>> {
    let baseline = validate_baseline(baseline)?;
    options.validate()?;

    let level = options.confidence_level;
    let (result, (lower, upper)) = match resolve_method(observation, baseline, options)? {
        Distribution::Binomial => (
            discrete::binomial_test(observation, baseline, alternative, options.two_sided)?,
            discrete::clopper_pearson_interval(observation, level, alternative)?,
        ),
        Distribution::Normal => (
            parametric::normal_proportion_test(
                observation,
                baseline,
                alternative,
                options.continuity_correction,
            )?,
            parametric::wilson_interval(observation, level, alternative)?,
        ),
    };

    Ok(result.with_confidence_interval(lower, upper))
}

/// Check that a baseline rate lies in `[0, 1]`.
pub(crate) fn validate_baseline(p0: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&p0) {
        Ok(p0)
    } else {
        Err(ProportionError::invalid(
            "p0",
            p0,
            "baseline rate must lie in [0, 1]",
        ))
    }
}

fn resolve_method(
    observation: Observation,
    baseline: f64,
    options: &ProportionTestOptions,
) -> Result<Distribution> {
    let trials = observation.trials();
    let valid = options.normal_approximation_valid(trials, baseline);

    match options.method {
        TestMethod::Exact => Ok(Distribution::Binomial),
        TestMethod::NormalApproximation if valid => Ok(Distribution::Normal),
        TestMethod::NormalApproximation => Err(ProportionError::invalid(
            "n",
            trials,
            "normal approximation needs n*p0 and n*(1-p0) to reach the minimum expected count",
        )),
        TestMethod::Auto if trials > options.exact_limit && valid => {
            tracing::debug!(
                trials,
                exact_limit = options.exact_limit,
                baseline,
                "sample beyond exact limit, using normal approximation"
            );
            Ok(Distribution::Normal)
        }
        TestMethod::Auto => Ok(Distribution::Binomial),
    }
}

/// A/B test: binomial test of `treatment` against the observed rate of `control`.
///
/// The effect size attached to the result is Cohen's h of the treatment rate over the
/// control rate.
///
/// # Example
///
/// ```
/// use single_proportion::testing::{Alternative, Observation};
/// use single_proportion::testing::inference::ab_test;
///
/// let control = Observation::new(10, 50).unwrap();
/// let treatment = Observation::new(30, 100).unwrap();
/// let result = ab_test(control, treatment, Alternative::Greater).unwrap();
/// assert!((result.p_value - 0.01125).abs() < 1e-3);
/// ```
pub fn ab_test(
    control: Observation,
    treatment: Observation,
    alternative: Alternative,
) -> Result<TestResult<f64>> {
    ab_test_with(
        control,
        treatment,
        alternative,
        &ProportionTestOptions::default(),
    )
}

pub fn ab_test_with(
    control: Observation,
    treatment: Observation,
    alternative: Alternative,
    options: &ProportionTestOptions,
) -> Result<TestResult<f64>> {
    let baseline = control.rate();
    let effect = cohens_h(treatment.rate(), baseline)?;
    let result = test_proportion_with(treatment, baseline, alternative, options)?;
    Ok(result.with_effect_size(effect))
}

/// Compare several variants against one control and correct for multiple testing.
///
/// # Returns
///
/// `MultipleTestResults` in the order of `variants`, with raw and adjusted p-values, Cohen's h
/// per variant and the observed variant rates.
pub fn compare_variants(
    control: Observation,
    variants: &[Observation],
    alternative: Alternative,
    correction_method: CorrectionMethod,
) -> anyhow::Result<MultipleTestResults<f64>> {
    if variants.is_empty() {
        return Err(ProportionError::InsufficientData(
            "at least one variant is required".to_string(),
        )
        .into());
    }

    let results = variants
        .iter()
        .map(|&variant| ab_test(control, variant, alternative))
        .collect::<Result<Vec<_>>>()?;

    let statistics: Vec<_> = results.iter().map(|r| r.statistic).collect();
    let p_values: Vec<_> = results.iter().map(|r| r.p_value).collect();
    let effect_sizes: Vec<_> = results
        .iter()
        .map(|r| r.effect_size.unwrap_or(0.0))
        .collect();
    let estimates: Vec<_> = results.iter().map(|r| r.estimate).collect();

    let adjusted_p_values = correction::adjust_p_values(&p_values, correction_method)?;

    tracing::debug!(
        variants = variants.len(),
        %correction_method,
        %alternative,
        "compared variants against control"
    );

    Ok(MultipleTestResults::new(statistics, p_values)
        .with_adjusted_p_values(adjusted_p_values)
        .with_effect_sizes(effect_sizes)
        .with_estimates(estimates)
        .with_global_metadata("test_type", "binomial")
        .with_global_metadata("correction", &correction_method.to_string())
        .with_global_metadata("alternative", &alternative.to_string())
        .with_global_metadata("control_rate", &control.rate().to_string()))
}
