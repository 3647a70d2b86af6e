//! Line-based point reduction
//!
//! Walks the sorted series and drops every inner point whose value lies
//! within `tolerance` of the straight line joining the last kept point and
//! the following point. The first and last points always survive.

use crate::stats;
use metrix_series::{MetricTimeSeries, Point};

pub(super) fn vectorize(series: &mut MetricTimeSeries, tolerance: f64) {
    if series.len() < 3 {
        return;
    }
    let points = series.sorted_points();
    let n = points.len();

    let mut kept = Vec::with_capacity(n);
    kept.push(points[0]);
    for i in 1..n - 1 {
        let anchor = kept[kept.len() - 1];
        let expected = interpolate(anchor, points[i + 1], points[i].timestamp);
        let deviation = (points[i].value - expected).abs();
        if deviation.is_nan() || deviation > tolerance {
            kept.push(points[i]);
        }
    }
    kept.push(points[n - 1]);

    series.replace(kept);
}

/// Value of the line through `a` and `b` at `timestamp`
fn interpolate(a: Point, b: Point, timestamp: i64) -> f64 {
    let dt = stats::elapsed(a.timestamp, b.timestamp);
    if dt == 0 {
        return a.value;
    }
    let fraction = stats::elapsed(a.timestamp, timestamp) as f64 / dt as f64;
    a.value + (b.value - a.value) * fraction
}
