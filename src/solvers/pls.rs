//! Single-component PLS regression.
//!
//! The downstream predictor the validation layer applies to OPLS-deflated
//! data. One latent component is all OPLS leaves behind by construction,
//! so this is deliberately the simplest useful estimator: weight from the
//! X'y covariance, score regression for the y-loading, intercept from the
//! centering means.

use crate::solvers::traits::{FittedRegressor, OplsError, Regressor};
use crate::utils::{center_columns, center_vector};
use faer::{Col, Mat};

/// Single-component PLS regression estimator.
///
/// # Example
///
/// ```rust,ignore
/// use opls::solvers::{Pls1Regressor, Regressor, FittedRegressor};
///
/// let fitted = Pls1Regressor::new().fit(&x, &y)?;
/// let predictions = fitted.predict(&x_new);
/// ```
#[derive(Debug, Clone)]
pub struct Pls1Regressor {
    /// Norm threshold for degenerate covariance detection
    tolerance: f64,
}

impl Pls1Regressor {
    /// Create a new single-component PLS regressor.
    pub fn new() -> Self {
        Self { tolerance: 1e-10 }
    }

    /// Set the tolerance for degenerate covariance detection.
    ///
    /// Default is 1e-10.
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }
}

impl Default for Pls1Regressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Regressor for Pls1Regressor {
    type Fitted = FittedPls1;

    fn fit(&self, x: &Mat<f64>, y: &Col<f64>) -> Result<FittedPls1, OplsError> {
        let n = x.nrows();
        let p = x.ncols();

        if n < 2 {
            return Err(OplsError::InvalidShape {
                reason: format!("need at least 2 samples, got {n}"),
            });
        }
        if y.nrows() != n {
            return Err(OplsError::InvalidShape {
                reason: format!("X has {n} rows but y has {} elements", y.nrows()),
            });
        }

        let (x_centered, x_means) = center_columns(x);
        let (y_centered, y_mean) = center_vector(y);

        // w = X'y / ‖X'y‖
        let mut weights = Col::zeros(p);
        for j in 0..p {
            let mut sum = 0.0;
            for i in 0..n {
                sum += x_centered[(i, j)] * y_centered[i];
            }
            weights[j] = sum;
        }
        let w_norm = weights.iter().map(|&v| v * v).sum::<f64>().sqrt();
        if w_norm < self.tolerance {
            return Err(OplsError::DegenerateComponent {
                requested: 1,
                extracted: 0,
            });
        }
        for j in 0..p {
            weights[j] /= w_norm;
        }

        // t = X·w, q = t'y / t't
        let mut scores = Col::zeros(n);
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..p {
                sum += x_centered[(i, j)] * weights[j];
            }
            scores[i] = sum;
        }
        let t_sq: f64 = scores.iter().map(|&v| v * v).sum();
        if t_sq < self.tolerance {
            return Err(OplsError::DegenerateComponent {
                requested: 1,
                extracted: 0,
            });
        }
        let mut q = 0.0;
        for i in 0..n {
            q += scores[i] * y_centered[i];
        }
        q /= t_sq;

        // ŷ = t·q = X_c·w·q, so b = w·q on centered data
        let coefficients = Col::from_fn(p, |j| weights[j] * q);
        let mut intercept = y_mean;
        for j in 0..p {
            intercept -= x_means[j] * coefficients[j];
        }

        Ok(FittedPls1 {
            coefficients,
            intercept,
            weights,
        })
    }
}

/// A fitted single-component PLS model.
#[derive(Debug, Clone)]
pub struct FittedPls1 {
    /// Regression coefficients on the original (uncentered) scale
    coefficients: Col<f64>,
    /// Intercept term
    intercept: f64,
    /// Unit-norm PLS weight vector
    weights: Col<f64>,
}

impl FittedPls1 {
    /// Regression coefficients (original scale).
    pub fn coefficients(&self) -> &Col<f64> {
        &self.coefficients
    }

    /// Intercept term.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Unit-norm PLS weight vector.
    pub fn weights(&self) -> &Col<f64> {
        &self.weights
    }
}

impl FittedRegressor for FittedPls1 {
    fn predict(&self, x: &Mat<f64>) -> Col<f64> {
        let n = x.nrows();
        let p = x.ncols();

        Col::from_fn(n, |i| {
            let mut pred = self.intercept;
            for j in 0..p {
                pred += x[(i, j)] * self.coefficients[j];
            }
            pred
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recovers_single_factor_relationship() {
        // All columns proportional to one factor; y linear in it.
        let x = Mat::from_fn(20, 2, |i, j| {
            if j == 0 {
                i as f64
            } else {
                2.0 * i as f64
            }
        });
        let y = Col::from_fn(20, |i| 3.0 + 2.0 * i as f64);

        let fitted = Pls1Regressor::new().fit(&x, &y).expect("fit should succeed");
        let preds = fitted.predict(&x);

        for i in 0..20 {
            assert_relative_eq!(preds[i], y[i], epsilon = 1e-8);
        }
    }

    #[test]
    fn test_weight_is_unit_norm() {
        let x = Mat::from_fn(15, 3, |i, j| ((i + 1) * (j + 2)) as f64 % 7.0);
        let y = Col::from_fn(15, |i| (i as f64) * 0.5);

        let fitted = Pls1Regressor::new().fit(&x, &y).expect("fit should succeed");
        let norm: f64 = fitted.weights().iter().map(|&v| v * v).sum::<f64>().sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_target_is_degenerate() {
        let x = Mat::from_fn(10, 2, |i, j| (i * (j + 1)) as f64);
        let y = Col::from_fn(10, |_| 5.0);

        assert!(matches!(
            Pls1Regressor::new().fit(&x, &y),
            Err(OplsError::DegenerateComponent { .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let x = Mat::from_fn(10, 2, |i, j| (i + j) as f64);
        let y = Col::from_fn(5, |i| i as f64);

        assert!(matches!(
            Pls1Regressor::new().fit(&x, &y),
            Err(OplsError::InvalidShape { .. })
        ));
    }
}
