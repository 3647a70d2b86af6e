//! Numeric helpers shared by aggregations and analyses
//!
//! Empty input yields NaN rather than an error; NaN values propagate
//! following IEEE-754 semantics.

use metrix_series::Point;
use std::cmp::Ordering;

/// Signed distance from `from` to `to`, widened so extreme timestamps
/// cannot overflow
pub(crate) fn elapsed(from: i64, to: i64) -> i128 {
    i128::from(to) - i128::from(from)
}

/// Plain arithmetic mean
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n - 1) standard deviation
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Nearest-rank percentile, `quantile` in (0, 1]
///
/// Picks the value at rank `ceil(quantile * n)` of the sorted input.
pub fn percentile(values: &[f64], quantile: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_of_sorted(&sorted, quantile)
}

pub(crate) fn percentile_of_sorted(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (quantile * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Least-squares slope of value over timestamp
///
/// Timestamps are taken relative to the first point to keep the sums small.
/// Returns 0.0 when fewer than two distinct timestamps exist.
pub fn linear_regression_slope(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let n = points.len() as f64;
    let base = points[0].timestamp;
    let x = |p: &Point| elapsed(base, p.timestamp) as f64;

    let sum_x: f64 = points.iter().map(x).sum();
    let sum_y: f64 = points.iter().map(|p| p.value).sum();
    let sum_xy: f64 = points.iter().map(|p| x(p) * p.value).sum();
    let sum_xx: f64 = points.iter().map(|p| x(p) * x(p)).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Minimum ignoring NaN, NaN for empty input
pub fn min(values: &[f64]) -> f64 {
    fold_non_nan(values, f64::min)
}

/// Maximum ignoring NaN, NaN for empty input
pub fn max(values: &[f64]) -> f64 {
    fold_non_nan(values, f64::max)
}

fn fold_non_nan(values: &[f64], f: fn(f64, f64) -> f64) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f)
        .unwrap_or(f64::NAN)
}

/// Total order on values, NaN sorted last
pub(crate) fn cmp_values(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}
