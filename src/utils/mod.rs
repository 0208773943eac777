//! Shared numeric utilities.

mod matrix;

pub use matrix::{center_columns, center_columns_with, center_vector, sum_of_squares};
