//! Effect sizes for comparing two proportions.

use crate::error::{ProportionError, Result};

fn check_rate(name: &'static str, rate: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ProportionError::invalid(name, rate, "rate must lie in [0, 1]"))
    }
}

/// Calculate Cohen's h between two proportions.
///
/// `h = 2 asin(sqrt(p1)) - 2 asin(sqrt(p2))`. Conventional thresholds: 0.2 small,
/// 0.5 medium, 0.8 large.
pub fn cohens_h(p1: f64, p2: f64) -> Result<f64> {
    let p1 = check_rate("p1", p1)?;
    let p2 = check_rate("p2", p2)?;
    Ok(2.0 * p1.sqrt().asin() - 2.0 * p2.sqrt().asin())
}

/// Absolute difference `p1 - p2`.
pub fn absolute_lift(p1: f64, p2: f64) -> Result<f64> {
    Ok(check_rate("p1", p1)? - check_rate("p2", p2)?)
}

/// Relative change of `p1` over the reference rate `p2`.
pub fn relative_lift(p1: f64, p2: f64) -> Result<f64> {
    let p1 = check_rate("p1", p1)?;
    let p2 = check_rate("p2", p2)?;
    if p2 == 0.0 {
        return Err(ProportionError::invalid(
            "p2",
            p2,
            "reference rate must be non-zero for a relative lift",
        ));
    }
    Ok((p1 - p2) / p2)
}

/// Qualitative label for an effect size, using Cohen's conventions.
pub fn interpret_effect_size(h: f64) -> &'static str {
    match h.abs() {
        x if x < 0.2 => "negligible",
        x if x < 0.5 => "small",
        x if x < 0.8 => "medium",
        _ => "large",
    }
}
