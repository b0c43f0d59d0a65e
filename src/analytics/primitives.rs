//! Stateless numeric primitives used by the correlation engine.
//!
//! These are pure functions that only operate on slices of numeric data.

/// Arithmetic mean of a slice. Returns `f64::NAN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of a slice. Returns `f64::NAN` for an empty slice.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mu = mean(values);
    let variance = values.iter().map(|&value| (value - mu).powi(2)).sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Pearson correlation coefficient of two equally long series.
///
/// Returns `f64::NAN` when the lengths differ, fewer than two observations are
/// available, or either series has zero variance. The result is clamped to
/// [-1, 1] to absorb rounding error.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    (covariance / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}
