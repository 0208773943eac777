//! Orthogonal Projection to Latent Structures (OPLS).
//!
//! OPLS is a supervised preprocessing transform: it removes variation from a
//! descriptor matrix that is statistically orthogonal to a single target
//! signal, so that a downstream one-component regressor sees the y-covariant
//! structure with less noise. This crate provides the deflation algorithm
//! itself plus the validation layer around it: nested cross-validation to
//! choose the number of orthogonal components, and permutation tests that
//! build empirical null distributions for regression metrics and feature
//! loadings.
//!
//! # Example
//!
//! ```rust,ignore
//! use opls::prelude::*;
//!
//! // Remove one orthogonal component and inspect retained variance
//! let fitted = Opls::new(1).fit(&x, &y)?;
//! let deflated = fitted.transform(&x)?;
//! println!("R²X retained = {}", fitted.score(&x)?);
//!
//! // Let cross-validation pick the component count
//! let selector = CrossValidatedSelector::new(
//!     Pls1Regressor::new(),
//!     KFold::new(5).seed(42),
//!     Metric::MEAN_SQUARED_ERROR,
//! )
//! .max_components(5);
//! let selection = selector.select_and_fit(&x, &y)?;
//! println!("chose k = {}", selection.n_components);
//! ```

pub mod solvers;
pub mod utils;
pub mod validation;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::solvers::{
        DegeneracyPolicy, FittedOpls, FittedPls1, FittedRegressor, Opls, OplsError,
        OrthogonalComponent, Pls1Regressor, PredictiveComponent, Regressor,
    };
    pub use crate::validation::{
        CrossValidatedSelector, CvRecord, FoldStrategy, KFold, LeaveOneOut, Metric, Objective,
        PermutationAxis, PermutationResult, PermutationTester, SelectionResult,
    };
}

pub use crate::solvers::{FittedOpls, Opls, OplsError};
pub use crate::validation::{CrossValidatedSelector, PermutationTester};
