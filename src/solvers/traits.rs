//! Core traits and the error taxonomy.

use faer::{Col, Mat};
use thiserror::Error;

/// Errors that can occur while fitting or applying an OPLS model.
///
/// All failures are deterministic given the same input; nothing in this
/// crate retries. `DegenerateComponent` is the one recoverable variant:
/// under [`DegeneracyPolicy::Lenient`](crate::solvers::DegeneracyPolicy)
/// the fit stops early instead of returning it, and the validation loops
/// treat it as "skip this candidate / count this trial as failed" rather
/// than aborting.
#[derive(Debug, Error)]
pub enum OplsError {
    #[error("invalid input shape: {reason}")]
    InvalidShape { reason: String },

    #[error("feature count mismatch: model was fit with {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("orthogonal structure exhausted: extracted {extracted} of {requested} components")]
    DegenerateComponent { requested: usize, extracted: usize },
}

/// A regression estimator that can be fit to data.
///
/// This is the downstream collaborator of the validation layer: after OPLS
/// deflation, a single-component regressor is fit on the transformed
/// training rows and asked to predict held-out rows. The crate ships
/// [`Pls1Regressor`](crate::solvers::Pls1Regressor); any caller type
/// implementing this pair of traits can be substituted.
pub trait Regressor {
    /// The type of the fitted model.
    type Fitted: FittedRegressor;

    /// Fit the model to the data.
    ///
    /// # Arguments
    /// * `x` - Design matrix of shape (n_samples, n_features)
    /// * `y` - Target vector of length n_samples
    fn fit(&self, x: &Mat<f64>, y: &Col<f64>) -> Result<Self::Fitted, OplsError>;
}

/// A fitted regression model that can make predictions.
pub trait FittedRegressor {
    /// Predict targets for new data.
    ///
    /// # Arguments
    /// * `x` - Design matrix of shape (n_samples, n_features)
    fn predict(&self, x: &Mat<f64>) -> Col<f64>;
}
