//! Model selection and significance testing.

mod crossval;
mod folds;
mod metrics;
mod permutation;

pub use crossval::{CrossValidatedSelector, CvRecord, SelectionResult};
pub use folds::{FoldStrategy, KFold, LeaveOneOut};
pub use metrics::{Metric, Objective};
pub use permutation::{PermutationAxis, PermutationResult, PermutationTester};
