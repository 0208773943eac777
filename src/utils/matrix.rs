//! Matrix utility functions.

use faer::{Col, Mat};

/// Center a matrix by subtracting column means.
pub fn center_columns(x: &Mat<f64>) -> (Mat<f64>, Col<f64>) {
    let n_rows = x.nrows();
    let n_cols = x.ncols();

    let mut means = Col::zeros(n_cols);
    let mut centered = Mat::zeros(n_rows, n_cols);

    for j in 0..n_cols {
        let sum: f64 = (0..n_rows).map(|i| x[(i, j)]).sum();
        means[j] = sum / n_rows as f64;

        for i in 0..n_rows {
            centered[(i, j)] = x[(i, j)] - means[j];
        }
    }

    (centered, means)
}

/// Center a matrix using externally supplied column means.
///
/// Used when applying a fitted model to new data: the training-time means
/// are reused so the transform leaks nothing about the new data's own
/// distribution.
pub fn center_columns_with(x: &Mat<f64>, means: &Col<f64>) -> Mat<f64> {
    Mat::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] - means[j])
}

/// Center a vector by subtracting the mean.
pub fn center_vector(y: &Col<f64>) -> (Col<f64>, f64) {
    let n = y.nrows();
    let mean: f64 = y.iter().sum::<f64>() / n as f64;

    let centered = Col::from_fn(n, |i| y[i] - mean);

    (centered, mean)
}

/// Sum of squared entries (squared Frobenius norm).
pub fn sum_of_squares(x: &Mat<f64>) -> f64 {
    let mut total = 0.0;
    for j in 0..x.ncols() {
        for i in 0..x.nrows() {
            total += x[(i, j)] * x[(i, j)];
        }
    }
    total
}
