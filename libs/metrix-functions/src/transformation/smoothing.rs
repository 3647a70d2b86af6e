//! Moving averages

use crate::sampling::average;
use metrix_series::{MetricTimeSeries, Point};

/// Time-window moving average
///
/// Each window starts at a point and reaches `window` milliseconds forward
/// (inclusive). Output is the mean point of the window; the last window is
/// the first one that reaches the end of the series.
pub(super) fn moving_average(series: &mut MetricTimeSeries, window: i64) {
    if series.len() < 2 {
        return;
    }
    let points = series.sorted_points();
    let n = points.len();

    let mut averaged = Vec::new();
    for (start, point) in points.iter().enumerate() {
        let limit = point.timestamp.saturating_add(window);
        let end = start + points[start..].partition_point(|p| p.timestamp <= limit);
        averaged.extend(average(&points[start..end]));
        if end == n {
            break;
        }
    }
    series.replace(averaged);
}

/// Sample-count moving average
///
/// Emits one point per full window of `samples` points, stamped with the
/// window's last timestamp. Windows shrink to the series length when it is
/// shorter than `samples`.
pub(super) fn simple_moving_average(series: &mut MetricTimeSeries, samples: usize) {
    if series.len() < 2 {
        return;
    }
    let points = series.sorted_points();
    let width = samples.clamp(1, points.len());

    let averaged: Vec<Point> = points
        .windows(width)
        .map(|window| {
            let sum: f64 = window.iter().map(|p| p.value).sum();
            let last = window[width - 1];
            Point::new(last.timestamp, sum / width as f64)
        })
        .collect();
    series.replace(averaged);
}
