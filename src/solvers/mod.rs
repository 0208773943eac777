//! OPLS estimator and the downstream regression collaborator.

mod opls;
mod pls;
mod traits;

pub use opls::{DegeneracyPolicy, FittedOpls, Opls, OplsBuilder, OrthogonalComponent, PredictiveComponent};
pub use pls::{FittedPls1, Pls1Regressor};
pub use traits::{FittedRegressor, OplsError, Regressor};
