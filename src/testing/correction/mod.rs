use anyhow::{Result, anyhow};
use std::cmp::Ordering;
use std::fmt;

/// Multiple testing correction methods to control for false positives
/// when several variants are compared against the same control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrectionMethod {
    /// Leave p-values unadjusted
    None,
    Bonferroni,
    #[default]
    Holm,
    Hochberg,
    BenjaminiHochberg,
    BenjaminiYekutieli,
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CorrectionMethod::None => "none",
            CorrectionMethod::Bonferroni => "bonferroni",
            CorrectionMethod::Holm => "holm",
            CorrectionMethod::Hochberg => "hochberg",
            CorrectionMethod::BenjaminiHochberg => "benjamini_hochberg",
            CorrectionMethod::BenjaminiYekutieli => "benjamini_yekutieli",
        };
        f.write_str(name)
    }
}

/// Adjust `p_values` with the given method.
pub fn adjust_p_values(p_values: &[f64], method: CorrectionMethod) -> Result<Vec<f64>> {
    match method {
        CorrectionMethod::None => {
            validate_p_values(p_values)?;
            Ok(p_values.to_vec())
        }
        CorrectionMethod::Bonferroni => bonferroni_correction(p_values),
        CorrectionMethod::Holm => holm_bonferroni_correction(p_values),
        CorrectionMethod::Hochberg => hochberg_correction(p_values),
        CorrectionMethod::BenjaminiHochberg => benjamini_hochberg_correction(p_values),
        CorrectionMethod::BenjaminiYekutieli => benjamini_yekutieli_correction(p_values),
    }
}

fn validate_p_values(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(anyhow!("Empty p-value array"));
    }
    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }
    Ok(())
}

/// Index-value pairs sorted by p-value in ascending order
fn sorted_ascending(p_values: &[f64]) -> Vec<(usize, f64)> {
    let mut indexed: Vec<(usize, f64)> =
        p_values.iter().enumerate().map(|(i, &p)| (i, p)).collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    indexed
}

/// Step-up adjustment shared by the Hochberg and Benjamini procedures: walk from the largest
/// p-value down, keeping a running minimum of `p * factor(rank)`.
fn step_up(p_values: &[f64], factor: impl Fn(usize) -> f64) -> Vec<f64> {
    let sorted = sorted_ascending(p_values);
    let mut adjusted = vec![0.0; sorted.len()];
    let mut current_min: f64 = 1.0;

    for (i, &(orig_idx, p)) in sorted.iter().enumerate().rev() {
        let rank = i + 1;
        current_min = current_min.min((p * factor(rank)).min(1.0));
        adjusted[orig_idx] = current_min;
    }
    adjusted
}

/// Apply Bonferroni correction to p-values
///
/// Bonferroni correction is a simple but conservative method that multiplies
/// each p-value by the number of tests.
///
/// # Example
/// ```
/// use single_proportion::testing::correction::bonferroni_correction;
///
/// let adjusted = bonferroni_correction(&[0.01, 0.03, 0.05]).unwrap();
/// assert!((adjusted[0] - 0.03).abs() < 1e-12);
/// ```
pub fn bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len() as f64;
    Ok(p_values.iter().map(|&p| (p * n).min(1.0)).collect())
}

/// Apply Holm-Bonferroni (step-down) method for controlling family-wise error rate
///
/// The p-value of rank `k` (ascending) is multiplied by `n - k + 1`, and adjusted values are
/// forced to be non-decreasing in rank.
pub fn holm_bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let sorted = sorted_ascending(p_values);

    let mut adjusted = vec![0.0; n];
    let mut current_max: f64 = 0.0;
    for (i, &(orig_idx, p)) in sorted.iter().enumerate() {
        current_max = current_max.max((p * (n - i) as f64).min(1.0));
        adjusted[orig_idx] = current_max;
    }
    Ok(adjusted)
}

/// Apply Hochberg's step-up method for controlling family-wise error rate
///
/// More powerful than Holm's procedure when the tests are independent.
pub fn hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    Ok(step_up(p_values, |rank| (n - rank + 1) as f64))
}

/// Apply Benjamini-Hochberg (BH) procedure for controlling false discovery rate
///
/// The BH procedure controls the expected proportion of false positives among all
/// rejected null hypotheses.
///
/// # Example
/// ```
/// use single_proportion::testing::correction::benjamini_hochberg_correction;
///
/// let adjusted = benjamini_hochberg_correction(&[0.01, 0.03, 0.05]).unwrap();
/// assert!(adjusted.iter().all(|&p| p <= 0.05 + 1e-12));
/// ```
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len() as f64;
    Ok(step_up(p_values, |rank| n / rank as f64))
}

/// Apply Benjamini-Yekutieli (BY) procedure for controlling false discovery rate under dependence
pub fn benjamini_yekutieli_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let c_n: f64 = (1..=n).map(|i| 1.0 / i as f64).sum();
    Ok(step_up(p_values, |rank| c_n * n as f64 / rank as f64))
}
