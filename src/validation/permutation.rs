//! Permutation-based significance testing.
//!
//! Repeats the full fit-and-score pipeline under randomized relabeling to
//! build an empirical null distribution, then reports one-sided p-values
//! with the observed trial included in the denominator — the minimum
//! attainable p-value with N trials is 1/(N+1).

use crate::solvers::{DegeneracyPolicy, Opls, OplsError, Regressor};
use crate::validation::crossval::cross_validated_metric;
use crate::validation::folds::FoldStrategy;
use crate::validation::metrics::Metric;
use faer::{Col, Mat};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

/// Which part of the data is permuted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermutationAxis {
    /// Shuffle y across samples, X fixed. Tests whether the observed
    /// cross-validated metric beats chance association.
    Target,
    /// Shuffle each feature column independently across samples,
    /// destroying inter-feature structure while preserving marginals.
    /// Tests whether each feature's predictive loading is stronger than
    /// under a broken-structure null.
    Feature,
}

/// Result of a permutation test.
///
/// For the target axis all vectors have length 1 (one metric statistic);
/// for the feature axis, length `n_features` (one loading magnitude per
/// feature).
#[derive(Debug, Clone, PartialEq)]
pub struct PermutationResult {
    /// The permuted axis.
    pub axis: PermutationAxis,
    /// Observed (unpermuted) statistic values.
    pub observed: Vec<f64>,
    /// Statistics from each completed null trial, in trial order.
    pub null_values: Vec<Vec<f64>>,
    /// One-sided p-values, one per observed statistic.
    pub p_values: Vec<f64>,
    /// Trials requested.
    pub n_trials_requested: usize,
    /// Trials that produced a statistic.
    pub n_trials_completed: usize,
    /// Trials excluded because the permuted fit degenerated.
    pub n_trials_failed: usize,
}

/// Builds empirical null distributions by re-running the OPLS pipeline
/// under permutation.
///
/// Trials are independent and run on a rayon thread pool; each trial
/// derives its own RNG stream from the caller seed, so results are
/// bit-identical across runs and thread counts.
///
/// # Example
///
/// ```rust,ignore
/// use opls::prelude::*;
///
/// let tester = PermutationTester::new(
///     Pls1Regressor::new(),
///     KFold::new(5).seed(7),
///     Metric::Q_SQUARED,
///     2,
/// )
/// .n_trials(199)
/// .seed(42);
/// let result = tester.run(&x, &y, PermutationAxis::Target)?;
/// println!("p = {}", result.p_values[0]);
/// ```
#[derive(Debug, Clone)]
pub struct PermutationTester<R, F> {
    regressor: R,
    folds: F,
    metric: Metric,
    n_components: usize,
    n_trials: usize,
    seed: u64,
}

impl<R, F> PermutationTester<R, F>
where
    R: Regressor + Sync,
    F: FoldStrategy + Sync,
{
    /// Create a tester for a fixed orthogonal component count.
    pub fn new(regressor: R, folds: F, metric: Metric, n_components: usize) -> Self {
        Self {
            regressor,
            folds,
            metric,
            n_components,
            n_trials: 99,
            seed: 0,
        }
    }

    /// Number of permutation trials. Default is 99, giving a minimum
    /// p-value of 0.01.
    pub fn n_trials(mut self, n_trials: usize) -> Self {
        self.n_trials = n_trials;
        self
    }

    /// Seed for the permutation draws. Default is 0.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run the test along the given axis.
    ///
    /// Fails with `DegenerateComponent` if the *observed* (unpermuted)
    /// pipeline cannot be fit at the configured component count; a
    /// degenerate permuted trial is merely counted as failed and excluded
    /// from the denominator.
    pub fn run(
        &self,
        x: &Mat<f64>,
        y: &Col<f64>,
        axis: PermutationAxis,
    ) -> Result<PermutationResult, OplsError> {
        let partitions = self.folds.folds(x.nrows());
        if partitions.is_empty() {
            return Err(OplsError::InvalidShape {
                reason: "fold strategy produced no folds".into(),
            });
        }

        let observed = self
            .statistic(x, y, axis, &partitions)?
            .ok_or(OplsError::DegenerateComponent {
                requested: self.n_components,
                extracted: 0,
            })?;

        let trials: Vec<Option<Vec<f64>>> = (0..self.n_trials)
            .into_par_iter()
            .map(|trial| {
                let mut rng = StdRng::seed_from_u64(trial_seed(self.seed, trial as u64));
                match axis {
                    PermutationAxis::Target => {
                        let y_perm = permute_target(y, &mut rng);
                        self.statistic(x, &y_perm, axis, &partitions)
                    }
                    PermutationAxis::Feature => {
                        let x_perm = permute_features(x, &mut rng);
                        self.statistic(&x_perm, y, axis, &partitions)
                    }
                }
            })
            .collect::<Result<_, OplsError>>()?;

        let null_values: Vec<Vec<f64>> = trials.into_iter().flatten().collect();
        let n_trials_completed = null_values.len();
        let n_trials_failed = self.n_trials - n_trials_completed;
        debug!(
            "permutation test ({axis:?}): {n_trials_completed} trials completed, {n_trials_failed} failed"
        );

        // One-sided p-value, inclusive of the observed trial.
        let p_values = (0..observed.len())
            .map(|stat| {
                let at_least = null_values
                    .iter()
                    .filter(|trial| self.more_extreme(axis, trial[stat], observed[stat]))
                    .count();
                (1 + at_least) as f64 / (n_trials_completed + 1) as f64
            })
            .collect();

        Ok(PermutationResult {
            axis,
            observed,
            null_values,
            p_values,
            n_trials_requested: self.n_trials,
            n_trials_completed,
            n_trials_failed,
        })
    }

    /// The statistic vector for one dataset: the cross-validated metric
    /// (target axis) or per-feature predictive loading magnitudes
    /// (feature axis). `None` when the fit degenerates.
    fn statistic(
        &self,
        x: &Mat<f64>,
        y: &Col<f64>,
        axis: PermutationAxis,
        partitions: &[(Vec<usize>, Vec<usize>)],
    ) -> Result<Option<Vec<f64>>, OplsError> {
        match axis {
            PermutationAxis::Target => Ok(cross_validated_metric(
                x,
                y,
                self.n_components,
                partitions,
                &self.regressor,
                self.metric,
            )?
            .map(|value| vec![value])),
            PermutationAxis::Feature => {
                let opls = Opls::builder()
                    .n_components(self.n_components)
                    .policy(DegeneracyPolicy::Strict)
                    .build();
                match opls.fit(x, y) {
                    Ok(fitted) => {
                        let loadings = &fitted.predictive().loadings;
                        Ok(Some(loadings.iter().map(|&v| v.abs()).collect()))
                    }
                    Err(OplsError::DegenerateComponent { .. }) => Ok(None),
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn more_extreme(&self, axis: PermutationAxis, null: f64, observed: f64) -> bool {
        match axis {
            PermutationAxis::Target => self
                .metric
                .objective()
                .at_least_as_extreme(null, observed),
            // Loading magnitudes: extreme means at least as large.
            PermutationAxis::Feature => null >= observed,
        }
    }
}

/// Per-trial seed derivation (splitmix64 step), so concurrent trials use
/// independent, order-insensitive RNG streams.
fn trial_seed(seed: u64, trial: u64) -> u64 {
    let mut z = seed.wrapping_add(trial.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn permute_target(y: &Col<f64>, rng: &mut StdRng) -> Col<f64> {
    let n = y.nrows();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    Col::from_fn(n, |i| y[indices[i]])
}

fn permute_features(x: &Mat<f64>, rng: &mut StdRng) -> Mat<f64> {
    let n = x.nrows();
    let p = x.ncols();

    let mut permuted = Mat::zeros(n, p);
    let mut indices: Vec<usize> = (0..n).collect();
    for j in 0..p {
        indices.shuffle(rng);
        for i in 0..n {
            permuted[(i, j)] = x[(indices[i], j)];
        }
    }
    permuted
}
