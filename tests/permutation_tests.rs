//! Permutation test suites.

mod common;

use approx::assert_relative_eq;
use opls::prelude::*;

#[test]
fn test_target_axis_reproducible_for_fixed_seed() {
    let (x, y) = common::generate_structured(20, 1.0, 31);

    let run = |seed: u64| {
        PermutationTester::new(
            Pls1Regressor::new(),
            KFold::new(4).seed(2),
            Metric::MEAN_SQUARED_ERROR,
            1,
        )
        .n_trials(25)
        .seed(seed)
        .run(&x, &y, PermutationAxis::Target)
        .expect("permutation test should succeed")
    };

    let a = run(42);
    let b = run(42);
    assert_eq!(a, b, "same seed must give bit-identical results");

    let c = run(43);
    assert_ne!(a.null_values, c.null_values, "different seeds must differ");
}

#[test]
fn test_feature_axis_reproducible_for_fixed_seed() {
    let (x, y) = common::generate_structured(20, 1.0, 37);

    let run = || {
        PermutationTester::new(
            Pls1Regressor::new(),
            KFold::new(4).seed(2),
            Metric::MEAN_SQUARED_ERROR,
            1,
        )
        .n_trials(20)
        .seed(7)
        .run(&x, &y, PermutationAxis::Feature)
        .expect("permutation test should succeed")
    };

    assert_eq!(run(), run());
}

#[test]
fn test_strong_signal_reaches_minimum_p_value() {
    // Near-noise-free structure: the observed out-of-fold error is far
    // below anything a permuted target can achieve, so the p-value hits
    // its floor of 1/(N+1).
    let (x, y) = common::generate_structured(24, 0.01, 19);

    let result = PermutationTester::new(
        Pls1Regressor::new(),
        KFold::new(6).seed(4),
        Metric::MEAN_SQUARED_ERROR,
        2,
    )
    .n_trials(19)
    .seed(5)
    .run(&x, &y, PermutationAxis::Target)
    .expect("permutation test should succeed");

    assert_eq!(result.n_trials_completed, 19);
    assert_eq!(result.n_trials_failed, 0);
    assert_eq!(result.observed.len(), 1);
    assert_eq!(result.p_values.len(), 1);
    assert_relative_eq!(result.p_values[0], 1.0 / 20.0, epsilon = 1e-12);
}

#[test]
fn test_p_values_in_unit_interval() {
    let (x, y) = common::generate_structured(18, 2.0, 23);

    for axis in [PermutationAxis::Target, PermutationAxis::Feature] {
        let result = PermutationTester::new(
            Pls1Regressor::new(),
            KFold::new(3).seed(1),
            Metric::Q_SQUARED,
            1,
        )
        .n_trials(30)
        .seed(9)
        .run(&x, &y, axis)
        .expect("permutation test should succeed");

        let floor = 1.0 / (result.n_trials_completed as f64 + 1.0);
        for &p in &result.p_values {
            assert!(p >= floor - 1e-12 && p <= 1.0, "p out of range: {p}");
        }
        assert_eq!(
            result.n_trials_completed + result.n_trials_failed,
            result.n_trials_requested
        );
    }
}

#[test]
fn test_feature_axis_shapes() {
    let (x, y) = common::generate_structured(22, 0.5, 47);

    let result = PermutationTester::new(
        Pls1Regressor::new(),
        KFold::new(4).seed(6),
        Metric::MEAN_SQUARED_ERROR,
        2,
    )
    .n_trials(15)
    .seed(3)
    .run(&x, &y, PermutationAxis::Feature)
    .expect("permutation test should succeed");

    assert_eq!(result.observed.len(), 4);
    assert_eq!(result.p_values.len(), 4);
    for trial in &result.null_values {
        assert_eq!(trial.len(), 4);
    }
    // Loading magnitudes are magnitudes.
    for &v in &result.observed {
        assert!(v >= 0.0);
    }
}

#[test]
fn test_observed_degeneracy_is_an_error() {
    // Rank-3 data cannot support three orthogonal components, and that is
    // an error for the observed pipeline, not a skipped trial.
    let (x, y) = common::generate_low_rank(20, 61);

    let tester = PermutationTester::new(
        Pls1Regressor::new(),
        KFold::new(4).seed(0),
        Metric::MEAN_SQUARED_ERROR,
        3,
    )
    .n_trials(10);

    match tester.run(&x, &y, PermutationAxis::Target) {
        Err(OplsError::DegenerateComponent { .. }) => {}
        other => panic!("expected DegenerateComponent, got {other:?}"),
    }
}
