//! Validation metrics.

use faer::Col;

/// Whether a better metric value is smaller or larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Error-like metrics: smaller is better.
    Minimize,
    /// Explained-variance-like metrics: larger is better.
    Maximize,
}

impl Objective {
    /// True when `candidate` is strictly better than `incumbent`.
    pub fn is_improvement(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Objective::Minimize => candidate < incumbent,
            Objective::Maximize => candidate > incumbent,
        }
    }

    /// True when a null-trial statistic is at least as good as the
    /// observed one. Used for one-sided permutation p-values.
    pub fn at_least_as_extreme(&self, null: f64, observed: f64) -> bool {
        match self {
            Objective::Minimize => null <= observed,
            Objective::Maximize => null >= observed,
        }
    }
}

/// A named validation metric: `(y_true, y_pred) -> value` plus the
/// direction in which the value improves.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    name: &'static str,
    objective: Objective,
    eval: fn(&Col<f64>, &Col<f64>) -> f64,
}

impl Metric {
    /// Mean squared error; minimize.
    pub const MEAN_SQUARED_ERROR: Metric = Metric {
        name: "mse",
        objective: Objective::Minimize,
        eval: mean_squared_error,
    };

    /// Root mean squared error; minimize.
    pub const ROOT_MEAN_SQUARED_ERROR: Metric = Metric {
        name: "rmse",
        objective: Objective::Minimize,
        eval: root_mean_squared_error,
    };

    /// Predictive R² (Q²) from out-of-fold predictions; maximize. May be
    /// negative when predictions are worse than the mean.
    pub const Q_SQUARED: Metric = Metric {
        name: "q2",
        objective: Objective::Maximize,
        eval: q_squared,
    };

    /// Define a custom metric.
    pub const fn new(
        name: &'static str,
        objective: Objective,
        eval: fn(&Col<f64>, &Col<f64>) -> f64,
    ) -> Self {
        Self {
            name,
            objective,
            eval,
        }
    }

    /// Metric name, for logs and reports.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Improvement direction.
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Evaluate the metric.
    pub fn evaluate(&self, y_true: &Col<f64>, y_pred: &Col<f64>) -> f64 {
        (self.eval)(y_true, y_pred)
    }
}

fn mean_squared_error(y_true: &Col<f64>, y_pred: &Col<f64>) -> f64 {
    let n = y_true.nrows();
    let sse: f64 = (0..n).map(|i| (y_true[i] - y_pred[i]).powi(2)).sum();
    sse / n as f64
}

fn root_mean_squared_error(y_true: &Col<f64>, y_pred: &Col<f64>) -> f64 {
    mean_squared_error(y_true, y_pred).sqrt()
}

fn q_squared(y_true: &Col<f64>, y_pred: &Col<f64>) -> f64 {
    let n = y_true.nrows();
    let mean: f64 = y_true.iter().sum::<f64>() / n as f64;

    let tss: f64 = y_true.iter().map(|&v| (v - mean).powi(2)).sum();
    let rss: f64 = (0..n).map(|i| (y_true[i] - y_pred[i]).powi(2)).sum();

    if tss == 0.0 {
        if rss == 0.0 {
            return 1.0;
        }
        return 0.0;
    }
    1.0 - rss / tss
}
