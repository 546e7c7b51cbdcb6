use single_proportion::testing::inference::{
    ProportionStatTests, ab_test, test_proportion, test_proportion_with,
};
use single_proportion::testing::{
    Alternative, Distribution, Observation, ProportionTestOptions, TestMethod,
};
use single_proportion::{ProportionError, TestResult};

#[cfg(test)]
mod reference_scenarios {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn website_conversion_against_known_rate() {
        // 10 sign-ups from 50 visitors, historic conversion 10%
        let result = test_proportion(10, 50, 0.1, Alternative::Greater).unwrap();
        assert_relative_eq!(result.observed_rate(), 0.2);
        assert_relative_eq!(result.p_value, 0.0245, epsilon = 1e-4);
        assert!(result.is_significant(0.05));
    }

    #[test]
    fn redesigned_page_against_control_rate() {
        let control = Observation::new(10, 50).unwrap();
        let treatment = Observation::new(30, 100).unwrap();
        let result = ab_test(control, treatment, Alternative::Greater).unwrap();
        assert_relative_eq!(result.observed_rate(), 0.3);
        assert_relative_eq!(result.p_value, 0.01125, epsilon = 1e-4);
    }

    #[test]
    fn classifier_accuracy_against_baseline() {
        let result = test_proportion(83, 100, 0.77, Alternative::Greater).unwrap();
        assert_relative_eq!(result.p_value, 0.09257, epsilon = 1e-4);
        assert!(!result.is_significant(0.05));
        assert!(result.is_significant(0.1));
    }

    #[test]
    fn observing_nothing_is_never_surprisingly_high() {
        let result = test_proportion(0, 10, 0.5, Alternative::Greater).unwrap();
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn observing_everything_is_never_surprisingly_low() {
        let result = test_proportion(10, 10, 0.5, Alternative::Less).unwrap();
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn observed_rate_equal_to_baseline_is_not_significant() {
        let result = test_proportion(50, 100, 0.5, Alternative::TwoSided).unwrap();
        assert_eq!(result.p_value, 1.0);
    }
}

#[cfg(test)]
mod invalid_parameters {
    use super::*;

    fn parameter_of(err: ProportionError) -> &'static str {
        match err {
            ProportionError::InvalidParameter { name, .. } => name,
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn zero_trials() {
        let err = test_proportion(0, 0, 0.5, Alternative::TwoSided).unwrap_err();
        assert_eq!(parameter_of(err), "n");
    }

    #[test]
    fn more_successes_than_trials() {
        let err = test_proportion(11, 10, 0.5, Alternative::TwoSided).unwrap_err();
        assert_eq!(parameter_of(err), "c");
    }

    #[test]
    fn baseline_outside_unit_interval() {
        for p0 in [1.5, -0.1, f64::NAN, f64::INFINITY] {
            let err = test_proportion(3, 10, p0, Alternative::Greater).unwrap_err();
            assert_eq!(parameter_of(err), "p0");
        }
    }

    #[test]
    fn error_message_names_the_parameter() {
        let err = test_proportion(3, 10, 1.5, Alternative::Greater).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("p0"), "unexpected message: {message}");
        assert!(message.contains("1.5"), "unexpected message: {message}");
    }
}

#[cfg(test)]
mod degenerate_baselines {
    use super::*;

    #[test]
    fn zero_baseline() {
        assert_eq!(test_proportion(0, 20, 0.0, Alternative::TwoSided).unwrap().p_value, 1.0);
        assert_eq!(test_proportion(1, 20, 0.0, Alternative::Greater).unwrap().p_value, 0.0);
        assert_eq!(test_proportion(1, 20, 0.0, Alternative::Less).unwrap().p_value, 1.0);
    }

    #[test]
    fn unit_baseline() {
        assert_eq!(test_proportion(20, 20, 1.0, Alternative::TwoSided).unwrap().p_value, 1.0);
        assert_eq!(test_proportion(19, 20, 1.0, Alternative::Less).unwrap().p_value, 0.0);
        assert_eq!(test_proportion(19, 20, 1.0, Alternative::Greater).unwrap().p_value, 1.0);
    }
}

#[cfg(test)]
mod sample_size {
    use super::*;

    #[test]
    fn same_proportion_becomes_more_significant_with_more_trials() {
        let p_values: Vec<f64> = [(2, 10), (4, 20), (8, 40), (16, 80), (32, 160)]
            .iter()
            .map(|&(c, n)| {
                test_proportion(c, n, 0.1, Alternative::Greater)
                    .unwrap()
                    .p_value
            })
            .collect();

        for pair in p_values.windows(2) {
            assert!(pair[1] < pair[0], "p-values not decreasing: {p_values:?}");
        }
    }

    #[test]
    fn two_sided_normal_approximation_shrinks_with_n() {
        let mut previous = 1.0;
        for scale in 1..=6u64 {
            let obs = Observation::new(45 * scale, 100 * scale).unwrap();
            let p = obs.z_test(0.5, Alternative::TwoSided).unwrap().p_value;
            assert!(p < previous);
            previous = p;
        }
    }

    #[test]
    fn exact_and_normal_agree_for_large_samples() {
        let obs = Observation::new(2_550, 5_000).unwrap();
        let exact = obs.binomial_test(0.5, Alternative::TwoSided).unwrap();
        let normal = test_proportion_with(
            obs,
            0.5,
            Alternative::TwoSided,
            &ProportionTestOptions::default()
                .with_method(TestMethod::NormalApproximation)
                .with_continuity_correction(true),
        )
        .unwrap();
        assert_eq!(exact.distribution, Distribution::Binomial);
        assert_eq!(normal.distribution, Distribution::Normal);
        assert!((exact.p_value - normal.p_value).abs() < 5e-3);
    }
}

#[cfg(test)]
mod huge_samples {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    const ALTERNATIVES: [Alternative; 3] =
        [Alternative::Greater, Alternative::Less, Alternative::TwoSided];

    /// Run `test_proportion` on a worker thread and fail if it has not answered within a few
    /// seconds.
    fn bounded(c: u64, n: u64, p0: f64, alternative: Alternative) -> TestResult<f64> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(test_proportion(c, n, p0, alternative));
        });
        rx.recv_timeout(Duration::from_secs(10))
            .unwrap_or_else(|_| panic!("{c} of {n} against {p0} ({alternative}) did not finish"))
            .unwrap()
    }

    fn check_interval(result: &TestResult<f64>) {
        let (lo, hi) = result.confidence_interval.unwrap();
        let rate = result.observed_rate();
        assert!(0.0 <= lo && lo <= rate && rate <= hi && hi <= 1.0, "({lo}, {hi}) vs {rate}");
    }

    #[test]
    fn three_events_in_ten_million() {
        // Mean 2, Poisson limit: P(X >= 3) = 1 - 5 e^-2, P(X <= 3) = 19/3 e^-2
        let expected = [0.323324, 0.857123, 0.646647];
        for (alternative, p) in ALTERNATIVES.into_iter().zip(expected) {
            let result = bounded(3, 10_000_000, 2e-7, alternative);
            assert_eq!(result.distribution, Distribution::Binomial);
            assert_relative_eq!(result.p_value, p, max_relative = 1e-4);
            check_interval(&result);
        }
    }

    #[test]
    fn three_events_in_a_billion() {
        // Mean 1: P(X >= 3) = 1 - 2.5 e^-1, P(X <= 3) = 8/3 e^-1
        let expected = [0.080301, 0.981012, 0.160603];
        for (alternative, p) in ALTERNATIVES.into_iter().zip(expected) {
            let result = bounded(3, 1_000_000_000, 1e-9, alternative);
            assert_eq!(result.distribution, Distribution::Binomial);
            assert_relative_eq!(result.p_value, p, max_relative = 1e-4);
            check_interval(&result);
        }
    }

    #[test]
    fn no_events_in_a_billion() {
        for alternative in ALTERNATIVES {
            let result = bounded(0, 1_000_000_000, 1e-9, alternative);
            assert!((0.0..=1.0).contains(&result.p_value));
            check_interval(&result);
        }
        assert_eq!(bounded(0, 1_000_000_000, 1e-9, Alternative::Greater).p_value, 1.0);
    }

    #[test]
    fn mid_range_count_in_ten_million() {
        // z = 3000 / sqrt(2.5e6) = 1.8974
        let expected = [0.0288898, 0.9711102, 0.0577796];
        for (alternative, p) in ALTERNATIVES.into_iter().zip(expected) {
            let result = bounded(5_003_000, 10_000_000, 0.5, alternative);
            assert_eq!(result.distribution, Distribution::Normal);
            assert_relative_eq!(result.statistic, 1.897367, max_relative = 1e-5);
            assert_relative_eq!(result.p_value, p, max_relative = 1e-4);
            check_interval(&result);
        }
    }

    #[test]
    fn mid_range_count_in_a_billion() {
        // z = 30000 / sqrt(2.1e8) = 2.0702
        let expected = [0.0192170, 0.9807830, 0.0384339];
        for (alternative, p) in ALTERNATIVES.into_iter().zip(expected) {
            let result = bounded(300_030_000, 1_000_000_000, 0.3, alternative);
            assert_eq!(result.distribution, Distribution::Normal);
            assert_relative_eq!(result.p_value, p, max_relative = 1e-4);
            check_interval(&result);
        }
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    fn case() -> impl Strategy<Value = (u64, u64, f64)> {
        (1u64..300, 0.01f64..0.99).prop_flat_map(|(n, p0)| (0..=n, Just(n), Just(p0)))
    }

    proptest! {
        #[test]
        fn p_values_lie_in_unit_interval((c, n, p0) in case()) {
            for alternative in [Alternative::Greater, Alternative::Less, Alternative::TwoSided] {
                let p = test_proportion(c, n, p0, alternative).unwrap().p_value;
                prop_assert!((0.0..=1.0).contains(&p), "p = {} for {:?}", p, alternative);
            }
        }

        #[test]
        fn greater_is_non_increasing_in_successes((c, n, p0) in case()) {
            prop_assume!(c < n);
            let here = test_proportion(c, n, p0, Alternative::Greater).unwrap().p_value;
            let next = test_proportion(c + 1, n, p0, Alternative::Greater).unwrap().p_value;
            prop_assert!(next <= here + 1e-12, "p({}) = {} < p({}) = {}", c, here, c + 1, next);
        }

        #[test]
        fn less_is_non_decreasing_in_successes((c, n, p0) in case()) {
            prop_assume!(c < n);
            let here = test_proportion(c, n, p0, Alternative::Less).unwrap().p_value;
            let next = test_proportion(c + 1, n, p0, Alternative::Less).unwrap().p_value;
            prop_assert!(next + 1e-12 >= here, "p({}) = {} > p({}) = {}", c, here, c + 1, next);
        }

        #[test]
        fn two_sided_shrinks_moving_away_from_the_mean((c, n, p0) in case()) {
            // Past the median on either side a step outward never raises the p-value
            let mean = n as f64 * p0;
            let here = test_proportion(c, n, p0, Alternative::TwoSided).unwrap().p_value;
            if c < n && c as f64 >= mean.ceil() {
                let next = test_proportion(c + 1, n, p0, Alternative::TwoSided).unwrap().p_value;
                prop_assert!(next <= here + 1e-12, "p({}) = {} < p({}) = {}", c, here, c + 1, next);
            }
            if c > 0 && c as f64 <= mean.floor() {
                let next = test_proportion(c - 1, n, p0, Alternative::TwoSided).unwrap().p_value;
                prop_assert!(next <= here + 1e-12, "p({}) = {} < p({}) = {}", c, here, c - 1, next);
            }
        }

        #[test]
        fn two_sided_doubles_the_smaller_tail((c, n, p0) in case()) {
            let greater = test_proportion(c, n, p0, Alternative::Greater).unwrap().p_value;
            let less = test_proportion(c, n, p0, Alternative::Less).unwrap().p_value;
            let two_sided = test_proportion(c, n, p0, Alternative::TwoSided).unwrap().p_value;
            let expected = (2.0 * greater.min(less)).min(1.0);
            prop_assert!((two_sided - expected).abs() < 1e-12);
        }

        #[test]
        fn confidence_interval_brackets_observed_rate((c, n, p0) in case()) {
            let result = test_proportion(c, n, p0, Alternative::TwoSided).unwrap();
            let (lo, hi) = result.confidence_interval.unwrap();
            let rate = result.observed_rate();
            prop_assert!(lo <= rate + 1e-9 && rate <= hi + 1e-9);
        }
    }
}
