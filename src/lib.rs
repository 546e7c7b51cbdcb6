//! # single-proportion
//!
//! Hypothesis tests for proportions, part of the single-rust ecosystem.
//!
//! This crate answers one question in several framings: given `c` successes in `n` independent
//! binary trials, how surprising is that result if the true success rate were `p0`? Website
//! conversion rates, classifier accuracy against a baseline and A/B experiments all reduce to it.
//! P-values are computed exactly from the binomial distribution, or through the normal
//! approximation justified by the Central Limit Theorem.
//!
//! ## Core Features
//!
//! - **Binomial Test**: Exact one- and two-sided p-values, with Clopper-Pearson intervals
//! - **Normal Approximation**: z-tests for proportions and for means with known variance
//! - **A/B Testing**: Treatment against control, and multi-variant comparisons with correction
//! - **Multiple Testing Correction**: Bonferroni, Holm, Hochberg, Benjamini-Hochberg/Yekutieli
//! - **Null Simulation**: Reproducible p-value distributions under the null hypothesis
//!
//! ## Quick Start
//!
//! ```
//! use single_proportion::testing::Alternative;
//! use single_proportion::testing::inference::test_proportion;
//!
//! // 83 correct predictions out of 100 against a baseline accuracy of 77%
//! let result = test_proportion(83, 100, 0.77, Alternative::Greater).unwrap();
//! assert!(!result.is_significant(0.05));
//! ```
//!
//! ## Module Organization
//!
//! - **[`testing`]**: Proportion tests, A/B comparisons, effect sizes and multiple testing correction
//! - **[`simulation`]**: P-value distributions under the null hypothesis
//! - **[`error`]**: Error type shared by the tests

pub mod error;
pub mod simulation;
pub mod testing;

pub use error::ProportionError;
pub use testing::inference::{ab_test, test_proportion};
pub use testing::{Alternative, Observation, TestResult};
