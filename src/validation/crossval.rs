//! Cross-validated selection of the orthogonal component count.

use crate::solvers::{DegeneracyPolicy, FittedOpls, FittedRegressor, Opls, OplsError, Regressor};
use crate::validation::folds::FoldStrategy;
use crate::validation::metrics::{Metric, Objective};
use faer::{Col, Mat};
use log::debug;

/// Per-candidate record of the search.
///
/// `score` is `None` when the candidate was skipped: some fold ran out of
/// orthogonal structure before reaching this component count, so the
/// candidate could not be evaluated fairly across all folds.
#[derive(Debug, Clone, PartialEq)]
pub struct CvRecord {
    /// Candidate number of orthogonal components.
    pub n_components: usize,
    /// Cross-validated metric value, or `None` if skipped.
    pub score: Option<f64>,
}

/// Outcome of [`CrossValidatedSelector::select_and_fit`].
#[derive(Debug, Clone)]
pub struct SelectionResult {
    /// Final model, refit with the chosen count on the entire dataset.
    pub model: FittedOpls,
    /// The chosen number of orthogonal components.
    pub n_components: usize,
    /// One record per candidate, in ascending component count.
    pub records: Vec<CvRecord>,
}

/// Chooses the orthogonal component count by nested cross-validation.
///
/// For each candidate k, every fold fits its own OPLS model on the
/// training rows only — the deflation parameters are fold-local, so no
/// information about held-out rows leaks into the transform. The
/// downstream regressor is fit on the transformed training rows and
/// predicts the held-out rows; predictions are assembled into one
/// out-of-fold vector and scored with the configured metric.
///
/// # Example
///
/// ```rust,ignore
/// use opls::prelude::*;
///
/// let selector = CrossValidatedSelector::new(
///     Pls1Regressor::new(),
///     KFold::new(5).seed(42),
///     Metric::MEAN_SQUARED_ERROR,
/// )
/// .max_components(5);
/// let selection = selector.select_and_fit(&x, &y)?;
/// ```
#[derive(Debug, Clone)]
pub struct CrossValidatedSelector<R, F> {
    regressor: R,
    folds: F,
    metric: Metric,
    max_components: Option<usize>,
    patience: usize,
}

impl<R, F> CrossValidatedSelector<R, F>
where
    R: Regressor,
    F: FoldStrategy,
{
    /// Create a selector with an open-ended search (no fixed maximum;
    /// the search stops once the metric stops improving for the patience
    /// window, or when a candidate degenerates).
    pub fn new(regressor: R, folds: F, metric: Metric) -> Self {
        Self {
            regressor,
            folds,
            metric,
            max_components: None,
            patience: 2,
        }
    }

    /// Bound the search at `max` components.
    pub fn max_components(mut self, max: usize) -> Self {
        self.max_components = Some(max);
        self
    }

    /// Number of consecutive non-improving candidates tolerated before an
    /// open-ended search stops. Default is 2. Ignored when a maximum is
    /// set.
    pub fn patience(mut self, patience: usize) -> Self {
        self.patience = patience.max(1);
        self
    }

    /// Run the search and refit the winner on the full dataset.
    ///
    /// Selection takes the best cross-validated metric value; on ties the
    /// smallest component count wins (fewer removed components means less
    /// risk of discarding real signal).
    pub fn select_and_fit(&self, x: &Mat<f64>, y: &Col<f64>) -> Result<SelectionResult, OplsError> {
        let n_samples = x.nrows();
        let partitions = self.folds.folds(n_samples);
        if partitions.is_empty() {
            return Err(OplsError::InvalidShape {
                reason: "fold strategy produced no folds".into(),
            });
        }

        let mut records = Vec::new();
        let mut best: Option<f64> = None;
        let mut stale = 0usize;
        let mut k = 1usize;

        loop {
            match self.max_components {
                Some(max) => {
                    if k > max {
                        break;
                    }
                }
                // An open-ended search cannot usefully exceed the feature
                // count; degeneracy normally stops it well before.
                None => {
                    if k > x.ncols() {
                        break;
                    }
                }
            }

            let score =
                cross_validated_metric(x, y, k, &partitions, &self.regressor, self.metric)?;
            debug!(
                "candidate k={k}: {}={score:?}",
                self.metric.name()
            );
            records.push(CvRecord {
                n_components: k,
                score,
            });

            match score {
                Some(value) => {
                    let improved = best
                        .map(|b| self.metric.objective().is_improvement(value, b))
                        .unwrap_or(true);
                    if improved {
                        best = Some(value);
                        stale = 0;
                    } else {
                        stale += 1;
                        if self.max_components.is_none() && stale >= self.patience {
                            break;
                        }
                    }
                }
                // Larger candidates need at least as much orthogonal
                // structure; once one degenerates the open-ended search is
                // done.
                None => {
                    if self.max_components.is_none() {
                        break;
                    }
                }
            }

            k += 1;
        }

        let chosen = pick_best(&records, self.metric.objective()).ok_or(
            OplsError::DegenerateComponent {
                requested: records.first().map(|r| r.n_components).unwrap_or(1),
                extracted: 0,
            },
        )?;
        debug!("selected k={chosen}");

        let model = Opls::builder()
            .n_components(chosen)
            .policy(DegeneracyPolicy::Strict)
            .build()
            .fit(x, y)?;

        Ok(SelectionResult {
            model,
            n_components: chosen,
            records,
        })
    }
}

/// Cross-validated metric for a fixed component count.
///
/// Returns `Ok(None)` when any fold's OPLS fit (or the downstream
/// regressor) degenerates — the candidate is unfairly evaluable and must
/// be skipped, never silently degraded. Other errors propagate.
pub(crate) fn cross_validated_metric<R: Regressor>(
    x: &Mat<f64>,
    y: &Col<f64>,
    n_components: usize,
    partitions: &[(Vec<usize>, Vec<usize>)],
    regressor: &R,
    metric: Metric,
) -> Result<Option<f64>, OplsError> {
    let n_samples = x.nrows();
    if y.nrows() != n_samples {
        return Err(OplsError::InvalidShape {
            reason: format!("X has {n_samples} rows but y has {} elements", y.nrows()),
        });
    }

    let opls = Opls::builder()
        .n_components(n_components)
        .policy(DegeneracyPolicy::Strict)
        .build();

    let mut out_of_fold = Col::zeros(n_samples);

    for (train, test) in partitions {
        let x_train = take_rows(x, train);
        let y_train = take_elems(y, train);
        let x_test = take_rows(x, test);

        let fitted = match opls.fit(&x_train, &y_train) {
            Ok(fitted) => fitted,
            Err(OplsError::DegenerateComponent { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let train_deflated = fitted.transform(&x_train)?;
        let test_deflated = fitted.transform(&x_test)?;

        let predictor = match regressor.fit(&train_deflated, &y_train) {
            Ok(predictor) => predictor,
            Err(OplsError::DegenerateComponent { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        // Held-out predictions keep their original sample positions, so
        // the aggregate is independent of fold evaluation order.
        let predictions = predictor.predict(&test_deflated);
        for (row, &sample) in test.iter().enumerate() {
            out_of_fold[sample] = predictions[row];
        }
    }

    Ok(Some(metric.evaluate(y, &out_of_fold)))
}

/// Best evaluated candidate; ties go to the smallest component count.
pub(crate) fn pick_best(records: &[CvRecord], objective: Objective) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for record in records {
        if let Some(value) = record.score {
            let replace = match best {
                None => true,
                Some((_, incumbent)) => objective.is_improvement(value, incumbent),
            };
            if replace {
                best = Some((record.n_components, value));
            }
        }
    }
    best.map(|(k, _)| k)
}

fn take_rows(x: &Mat<f64>, indices: &[usize]) -> Mat<f64> {
    Mat::from_fn(indices.len(), x.ncols(), |i, j| x[(indices[i], j)])
}

fn take_elems(y: &Col<f64>, indices: &[usize]) -> Col<f64> {
    Col::from_fn(indices.len(), |i| y[indices[i]])
}
