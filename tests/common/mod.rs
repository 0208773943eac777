//! Common test utilities and data generators.
#![allow(dead_code)] // not every test binary uses every generator

use faer::{Col, Mat};

/// Simple deterministic "random" for reproducibility.
pub fn lcg(state: &mut u64) -> f64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    ((*state >> 33) as f64) / (u32::MAX as f64) * 2.0 - 1.0
}

/// Data with one y-predictive direction and two strong y-orthogonal
/// directions over 4 features, plus optional i.i.d. noise.
///
/// The orthogonal loadings overlap the predictive one, so they pollute a
/// single-component PLS fit until they are deflated away.
pub fn generate_structured(n: usize, noise_std: f64, seed: u64) -> (Mat<f64>, Col<f64>) {
    let p1 = [1.0, 1.0, 1.0, 1.0];
    let p2 = [2.0, -1.0, 0.5, 1.0];
    let p3 = [-1.0, 2.0, 1.0, 0.5];

    let mut state = seed;
    let mut x = Mat::zeros(n, 4);
    let mut y = Col::zeros(n);

    for i in 0..n {
        let t1 = i as f64 - (n as f64 - 1.0) / 2.0;
        let t2 = 20.0 * lcg(&mut state);
        let t3 = 20.0 * lcg(&mut state);

        for j in 0..4 {
            x[(i, j)] =
                t1 * p1[j] + t2 * p2[j] + t3 * p3[j] + noise_std * lcg(&mut state);
        }
        y[i] = t1;
    }

    (x, y)
}

/// Exact rank-3 variant: one predictive plus two orthogonal directions
/// and no noise, so a third orthogonal component is degenerate.
pub fn generate_low_rank(n: usize, seed: u64) -> (Mat<f64>, Col<f64>) {
    generate_structured(n, 0.0, seed)
}

/// Center the columns of a matrix (test-side helper, independent of the
/// crate's own centering).
pub fn centered(x: &Mat<f64>) -> Mat<f64> {
    let n = x.nrows();
    let mut out = x.clone();
    for j in 0..x.ncols() {
        let mean: f64 = (0..n).map(|i| x[(i, j)]).sum::<f64>() / n as f64;
        for i in 0..n {
            out[(i, j)] -= mean;
        }
    }
    out
}
