//! Orthogonal Projection to Latent Structures (OPLS).
//!
//! OPLS splits the variation in a descriptor matrix X into a part that
//! covaries with a single target y and a part that is orthogonal to it,
//! then removes the orthogonal part by iterative rank-1 deflation. A
//! single downstream PLS/regression component applied to the deflated
//! matrix recovers essentially all y-covariant structure with reduced
//! noise.
//!
//! # Algorithm
//!
//! Per iteration, on the current residual matrix R (initialized to the
//! column-centered X):
//!
//! 1. `w_y = R'y / ‖R'y‖` — the ordinary single-component PLS weight
//! 2. `t_y = R·w_y`
//! 3. `p = R't_y / (t_y't_y)` — loading that best reconstructs R along `t_y`
//! 4. `w_ortho = p − (w_y'p)·w_y`, then normalized — the part of the
//!    loading orthogonal to the predictive direction
//! 5. `t_ortho = R·w_ortho`, `p_ortho = R't_ortho / (t_ortho't_ortho)`
//! 6. `R ← R − t_ortho·p_ortho'`
//!
//! A vanishing `‖w_ortho‖` means no orthogonal structure remains; whether
//! that is an error or an early stop is governed by [`DegeneracyPolicy`].
//!
//! # References
//!
//! - Trygg, J. & Wold, S. (2002). Orthogonal projections to latent
//!   structures (O-PLS). Journal of Chemometrics, 16(3), 119-128.

use crate::solvers::traits::OplsError;
use crate::utils::{center_columns, center_columns_with, center_vector, sum_of_squares};
use faer::{Col, Mat};

/// How to react when the orthogonal weight vector collapses to zero norm
/// before the requested number of components has been extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegeneracyPolicy {
    /// Return [`OplsError::DegenerateComponent`] reporting how many
    /// components were actually extracted.
    Strict,
    /// Stop early and return the fitted model with the shorter component
    /// sequence; the model reports the achieved count.
    Lenient,
}

/// One extracted orthogonal component.
///
/// Immutable once created; components are owned by the fitted model in
/// extraction order, and later components operate on matrices already
/// deflated by all earlier ones.
#[derive(Debug, Clone)]
pub struct OrthogonalComponent {
    /// Predictive PLS weight on the residual this component was extracted
    /// from (informational; not used by `transform`).
    pub weight_y: Col<f64>,
    /// Unit-norm orthogonal weight vector.
    pub weight_ortho: Col<f64>,
    /// Orthogonal score vector (training-data projection onto the weight).
    pub score_ortho: Col<f64>,
    /// Orthogonal loading vector; `transform` deflates with
    /// `score · loading'`.
    pub loading_ortho: Col<f64>,
}

/// The single predictive PLS component of the fully deflated matrix.
///
/// Computed once, after the last deflation. Its loading vector is the
/// per-feature statistic interrogated by the feature-axis permutation
/// test.
#[derive(Debug, Clone)]
pub struct PredictiveComponent {
    /// Unit-norm predictive weight vector.
    pub weights: Col<f64>,
    /// Predictive score vector on the training data.
    pub scores: Col<f64>,
    /// Predictive loading vector.
    pub loadings: Col<f64>,
}

/// OPLS estimator.
///
/// # Example
///
/// ```rust,ignore
/// use opls::solvers::Opls;
///
/// let fitted = Opls::new(2).fit(&x, &y)?;
/// let deflated = fitted.transform(&x)?;
/// assert!(fitted.score(&x)? <= 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Opls {
    /// Number of orthogonal components to remove
    n_components: usize,
    /// Reaction to running out of orthogonal structure
    policy: DegeneracyPolicy,
    /// Norm threshold below which a direction counts as degenerate
    tolerance: f64,
}

impl Opls {
    /// Create an estimator removing `n_components` orthogonal components,
    /// with the lenient degeneracy policy.
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            policy: DegeneracyPolicy::Lenient,
            tolerance: 1e-10,
        }
    }

    /// Create a builder for configuring the estimator.
    pub fn builder() -> OplsBuilder {
        OplsBuilder::default()
    }

    /// Fit the model: center, extract orthogonal components, deflate.
    ///
    /// The caller's matrices are never mutated; deflation operates on a
    /// working copy. `n_components == 0` is legal and yields a model whose
    /// `transform` only centers.
    pub fn fit(&self, x: &Mat<f64>, y: &Col<f64>) -> Result<FittedOpls, OplsError> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples < 2 {
            return Err(OplsError::InvalidShape {
                reason: format!("need at least 2 samples, got {n_samples}"),
            });
        }
        if y.nrows() != n_samples {
            return Err(OplsError::InvalidShape {
                reason: format!(
                    "X has {n_samples} rows but y has {} elements",
                    y.nrows()
                ),
            });
        }

        let (mut residual, x_means) = center_columns(x);
        let (y_centered, y_mean) = center_vector(y);

        let mut components = Vec::with_capacity(self.n_components);

        for _ in 0..self.n_components {
            match self.extract_component(&residual, &y_centered) {
                Some(component) => {
                    // Deflate: R ← R − t_ortho·p_ortho'
                    for i in 0..n_samples {
                        for j in 0..n_features {
                            residual[(i, j)] -=
                                component.score_ortho[i] * component.loading_ortho[j];
                        }
                    }
                    components.push(component);
                }
                None => match self.policy {
                    DegeneracyPolicy::Strict => {
                        return Err(OplsError::DegenerateComponent {
                            requested: self.n_components,
                            extracted: components.len(),
                        });
                    }
                    DegeneracyPolicy::Lenient => break,
                },
            }
        }

        let predictive = self.predictive_component(&residual, &y_centered);

        Ok(FittedOpls {
            components,
            predictive,
            x_means,
            y_mean,
            n_features,
        })
    }

    /// Fit with the target supplied as an n×m matrix.
    ///
    /// OPLS supports exactly one target column; `m != 1` is an
    /// `InvalidShape` error. Convenience for callers holding matrix-shaped
    /// targets.
    pub fn fit_target_matrix(&self, x: &Mat<f64>, y: &Mat<f64>) -> Result<FittedOpls, OplsError> {
        if y.ncols() != 1 {
            return Err(OplsError::InvalidShape {
                reason: format!("target must have exactly 1 column, got {}", y.ncols()),
            });
        }
        let y_col = Col::from_fn(y.nrows(), |i| y[(i, 0)]);
        self.fit(x, &y_col)
    }

    /// Run one iteration of the deflation loop on the current residual.
    ///
    /// Returns `None` when the orthogonal weight has vanishing norm (no
    /// orthogonal structure left to remove).
    fn extract_component(
        &self,
        residual: &Mat<f64>,
        y_centered: &Col<f64>,
    ) -> Option<OrthogonalComponent> {
        let n = residual.nrows();
        let p = residual.ncols();

        // w_y = R'y / ‖R'y‖
        let mut weight_y = Col::zeros(p);
        for j in 0..p {
            let mut sum = 0.0;
            for i in 0..n {
                sum += residual[(i, j)] * y_centered[i];
            }
            weight_y[j] = sum;
        }
        let wy_norm = weight_y.iter().map(|&v| v * v).sum::<f64>().sqrt();
        if wy_norm < self.tolerance {
            // y no longer covaries with the residual; nothing to protect,
            // nothing orthogonal to it either.
            return None;
        }
        for j in 0..p {
            weight_y[j] /= wy_norm;
        }

        // t_y = R·w_y
        let mut score_y = Col::zeros(n);
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..p {
                sum += residual[(i, j)] * weight_y[j];
            }
            score_y[i] = sum;
        }
        let ty_sq = score_y.iter().map(|&v| v * v).sum::<f64>();
        if ty_sq < self.tolerance {
            return None;
        }

        // p = R't_y / (t_y't_y)
        let mut loading = Col::zeros(p);
        for j in 0..p {
            let mut sum = 0.0;
            for i in 0..n {
                sum += residual[(i, j)] * score_y[i];
            }
            loading[j] = sum / ty_sq;
        }

        // w_ortho = p − (w_y'p)·w_y, normalized
        let mut wp = 0.0;
        for j in 0..p {
            wp += weight_y[j] * loading[j];
        }
        let mut weight_ortho = Col::zeros(p);
        for j in 0..p {
            weight_ortho[j] = loading[j] - wp * weight_y[j];
        }
        let wo_norm = weight_ortho.iter().map(|&v| v * v).sum::<f64>().sqrt();
        if wo_norm < self.tolerance {
            return None;
        }
        for j in 0..p {
            weight_ortho[j] /= wo_norm;
        }

        // t_ortho = R·w_ortho
        let mut score_ortho = Col::zeros(n);
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..p {
                sum += residual[(i, j)] * weight_ortho[j];
            }
            score_ortho[i] = sum;
        }
        let to_sq = score_ortho.iter().map(|&v| v * v).sum::<f64>();
        if to_sq < self.tolerance {
            return None;
        }

        // p_ortho = R't_ortho / (t_ortho't_ortho)
        let mut loading_ortho = Col::zeros(p);
        for j in 0..p {
            let mut sum = 0.0;
            for i in 0..n {
                sum += residual[(i, j)] * score_ortho[i];
            }
            loading_ortho[j] = sum / to_sq;
        }

        Some(OrthogonalComponent {
            weight_y,
            weight_ortho,
            score_ortho,
            loading_ortho,
        })
    }

    /// Single-component PLS triple of the fully deflated matrix.
    ///
    /// Zero vectors when y no longer covaries with the residual.
    fn predictive_component(&self, residual: &Mat<f64>, y_centered: &Col<f64>) -> PredictiveComponent {
        let n = residual.nrows();
        let p = residual.ncols();

        let mut weights = Col::zeros(p);
        for j in 0..p {
            let mut sum = 0.0;
            for i in 0..n {
                sum += residual[(i, j)] * y_centered[i];
            }
            weights[j] = sum;
        }
        let w_norm = weights.iter().map(|&v| v * v).sum::<f64>().sqrt();
        if w_norm < self.tolerance {
            return PredictiveComponent {
                weights: Col::zeros(p),
                scores: Col::zeros(n),
                loadings: Col::zeros(p),
            };
        }
        for j in 0..p {
            weights[j] /= w_norm;
        }

        let mut scores = Col::zeros(n);
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..p {
                sum += residual[(i, j)] * weights[j];
            }
            scores[i] = sum;
        }
        let t_sq = scores.iter().map(|&v| v * v).sum::<f64>();

        let mut loadings = Col::zeros(p);
        if t_sq >= self.tolerance {
            for j in 0..p {
                let mut sum = 0.0;
                for i in 0..n {
                    sum += residual[(i, j)] * scores[i];
                }
                loadings[j] = sum / t_sq;
            }
        }

        PredictiveComponent {
            weights,
            scores,
            loadings,
        }
    }
}

/// A fitted OPLS model.
///
/// Holds the ordered orthogonal component sequence, the training-time
/// centering means, and the predictive component of the deflated matrix.
#[derive(Debug, Clone)]
pub struct FittedOpls {
    components: Vec<OrthogonalComponent>,
    predictive: PredictiveComponent,
    x_means: Col<f64>,
    y_mean: f64,
    n_features: usize,
}

impl FittedOpls {
    /// Number of orthogonal components actually extracted (may be fewer
    /// than requested under the lenient policy).
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// The orthogonal components, in extraction order.
    pub fn components(&self) -> &[OrthogonalComponent] {
        &self.components
    }

    /// The predictive PLS component of the fully deflated training matrix.
    pub fn predictive(&self) -> &PredictiveComponent {
        &self.predictive
    }

    /// Column means of X used for centering.
    pub fn x_means(&self) -> &Col<f64> {
        &self.x_means
    }

    /// Mean of y used for centering.
    pub fn y_mean(&self) -> f64 {
        self.y_mean
    }

    /// Apply the fitted deflation to new data.
    ///
    /// Centers with the *stored* training means (never recomputed — the
    /// transform must not learn anything from the new data's own
    /// distribution), then removes each orthogonal component in extraction
    /// order.
    pub fn transform(&self, x: &Mat<f64>) -> Result<Mat<f64>, OplsError> {
        if x.ncols() != self.n_features {
            return Err(OplsError::ShapeMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }

        let n = x.nrows();
        let p = self.n_features;
        let mut residual = center_columns_with(x, &self.x_means);

        for component in &self.components {
            // t = R·w_ortho; R ← R − t·p_ortho'
            for i in 0..n {
                let mut t = 0.0;
                for j in 0..p {
                    t += residual[(i, j)] * component.weight_ortho[j];
                }
                for j in 0..p {
                    residual[(i, j)] -= t * component.loading_ortho[j];
                }
            }
        }

        Ok(residual)
    }

    /// R²X in the retained-variance convention.
    ///
    /// Ratio of the sum of squares after orthogonal removal to the sum of
    /// squares of the centered input. 1.0 means nothing was removed (always
    /// the case for a 0-component model); lower values mean more orthogonal
    /// variance was isolated and removed. Note this is the *retained*
    /// fraction — comparable tools often report the complement.
    pub fn score(&self, x: &Mat<f64>) -> Result<f64, OplsError> {
        let transformed = self.transform(x)?;
        let centered = center_columns_with(x, &self.x_means);

        let total = sum_of_squares(&centered);
        if total == 0.0 {
            // All-constant input: nothing to remove.
            return Ok(1.0);
        }
        Ok(sum_of_squares(&transformed) / total)
    }
}

/// Builder for `Opls`.
#[derive(Debug, Clone)]
pub struct OplsBuilder {
    n_components: usize,
    policy: DegeneracyPolicy,
    tolerance: f64,
}

impl Default for OplsBuilder {
    fn default() -> Self {
        Self {
            n_components: 1,
            policy: DegeneracyPolicy::Lenient,
            tolerance: 1e-10,
        }
    }
}

impl OplsBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of orthogonal components to remove.
    ///
    /// Default is 1. Zero is legal: the model then only centers.
    pub fn n_components(mut self, n: usize) -> Self {
        self.n_components = n;
        self
    }

    /// Set the degeneracy policy.
    ///
    /// Default is `Lenient` (stop early, report the achieved count).
    pub fn policy(mut self, policy: DegeneracyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the norm tolerance below which a direction is degenerate.
    ///
    /// Default is 1e-10.
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Build the estimator.
    pub fn build(self) -> Opls {
        Opls {
            n_components: self.n_components,
            policy: self.policy,
            tolerance: self.tolerance,
        }
    }
}
