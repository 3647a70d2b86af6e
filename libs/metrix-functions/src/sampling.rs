//! Bucket-and-average downsampling
//!
//! Three bucket policies share the same averaging step:
//!
//! | Policy | Bucket key | Output timestamp | Used by |
//! |--------|------------|------------------|---------|
//! | interval | `floor(ts / interval)` | `(key + 1) * interval` | `savgint` |
//! | span | `floor(ts / ceil((end - start) / buckets))` | rounded mean timestamp | `savgbckt` |
//! | window | `window_size` consecutive points, remainder merged into the last window | rounded mean timestamp | `savgwin` |
//!
//! All policies sort the series first and replace its points in a single
//! swap. Values are averaged as `sum / count`; NaN propagates.

use metrix_series::{MetricTimeSeries, Point};
use tracing::trace;

/// Running sum of one bucket
#[derive(Debug, Clone, Copy)]
struct Bucket {
    key: i64,
    count: usize,
    value_sum: f64,
    timestamp_sum: i128,
}

impl Bucket {
    fn new(key: i64, point: Point) -> Self {
        Self {
            key,
            count: 1,
            value_sum: point.value,
            timestamp_sum: i128::from(point.timestamp),
        }
    }

    fn push(&mut self, point: Point) {
        self.count += 1;
        self.value_sum += point.value;
        self.timestamp_sum += i128::from(point.timestamp);
    }

    fn mean_value(&self) -> f64 {
        self.value_sum / self.count as f64
    }

    /// Mean timestamp rounded half up
    fn mean_timestamp(&self) -> i64 {
        let count = self.count as i128;
        let rounded = (2 * self.timestamp_sum + count).div_euclid(2 * count);
        // the mean of i64 values always fits back into i64
        rounded as i64
    }
}

/// Group sorted points into buckets of consecutive equal keys
fn group_by_key<F>(points: impl Iterator<Item = Point>, key: F) -> Vec<Bucket>
where
    F: Fn(&Point) -> i64,
{
    let mut buckets: Vec<Bucket> = Vec::new();
    for point in points {
        let k = key(&point);
        match buckets.last_mut() {
            Some(bucket) if bucket.key == k => bucket.push(point),
            _ => buckets.push(Bucket::new(k, point)),
        }
    }
    buckets
}

/// Mean point of a run of points, `None` when empty
///
/// The timestamp is the mean timestamp rounded half up.
pub(crate) fn average(points: &[Point]) -> Option<Point> {
    let (first, rest) = points.split_first()?;
    let mut bucket = Bucket::new(0, *first);
    for point in rest {
        bucket.push(*point);
    }
    Some(Point::new(bucket.mean_timestamp(), bucket.mean_value()))
}

/// Interval policy: right-closed buckets on `interval` boundaries
///
/// Keeps at most `max_points` buckets, dropping the oldest ones first.
/// `interval` must be positive; constructors enforce it.
pub fn sample_by_interval(series: &mut MetricTimeSeries, interval: i64, max_points: Option<usize>) {
    debug_assert!(interval > 0, "interval must be positive");
    series.sort();

    let buckets = group_by_key(series.points(), |p| p.timestamp.div_euclid(interval));
    let skip = max_points.map_or(0, |max| buckets.len().saturating_sub(max));

    trace!(
        interval,
        buckets = buckets.len(),
        dropped = skip,
        "sample by interval"
    );

    let sampled: Vec<Point> = buckets[skip..]
        .iter()
        .map(|b| {
            Point::new(
                b.key.saturating_add(1).saturating_mul(interval),
                b.mean_value(),
            )
        })
        .collect();
    series.replace(sampled);
}

/// Span policy: split the covered time span into `bucket_count` intervals
///
/// No-op for fewer than two points.
pub fn sample_by_span(series: &mut MetricTimeSeries, bucket_count: usize) {
    series.sort();
    let (Some(start), Some(end)) = (series.start(), series.end()) else {
        return;
    };

    let span = i128::from(end) - i128::from(start);
    let count = bucket_count.max(1) as i128;
    let interval = i64::try_from((span + count - 1) / count)
        .unwrap_or(i64::MAX)
        .max(1);

    let buckets = group_by_key(series.points(), |p| p.timestamp.div_euclid(interval));

    trace!(interval, buckets = buckets.len(), "sample by span");

    let sampled: Vec<Point> = buckets
        .iter()
        .map(|b| Point::new(b.mean_timestamp(), b.mean_value()))
        .collect();
    series.replace(sampled);
}

/// Window policy: fixed-size index windows
///
/// When the window after the current one would run past the end, the
/// remainder is merged into the current window and iteration stops, so the
/// last window holds between `window_size` and `2 * window_size - 1` points.
pub fn sample_by_window(series: &mut MetricTimeSeries, window_size: usize) {
    series.sort();
    let window_size = window_size.max(1);
    let points: Vec<Point> = series.points().collect();
    let n = points.len();

    let mut sampled = Vec::with_capacity(n / window_size + 1);
    let mut start = 0;
    while start < n {
        let mut end = start.saturating_add(window_size);
        if end.saturating_add(window_size) > n {
            end = n;
        }

        sampled.extend(average(&points[start..end]));
        start = end;
    }

    trace!(window_size, windows = sampled.len(), "sample by window");
    series.replace(sampled);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(i64, f64)]) -> MetricTimeSeries {
        MetricTimeSeries::from_points("test", points.iter().map(|&p| Point::from(p)))
    }

    fn pairs(series: &MetricTimeSeries) -> Vec<(i64, f64)> {
        series.points().map(|p| (p.timestamp, p.value)).collect()
    }

    #[test]
    fn test_interval_buckets_are_right_closed() {
        let mut ts = series(&[(0, 1.0), (30_000, 3.0), (65_000, 5.0), (90_000, 7.0)]);
        sample_by_interval(&mut ts, 60_000, None);
        assert_eq!(pairs(&ts), vec![(60_000, 2.0), (120_000, 6.0)]);
    }

    #[test]
    fn test_interval_truncation_keeps_most_recent() {
        let mut ts = series(&[(0, 1.0), (30_000, 3.0), (65_000, 5.0), (90_000, 7.0)]);
        sample_by_interval(&mut ts, 60_000, Some(1));
        assert_eq!(pairs(&ts), vec![(120_000, 6.0)]);
    }

    #[test]
    fn test_interval_floors_negative_timestamps() {
        let mut ts = series(&[(-1, 4.0), (-10, 2.0), (0, 10.0)]);
        sample_by_interval(&mut ts, 10, None);
        // -10 and -1 share key -1, labelled 0; 0 has key 0, labelled 10
        assert_eq!(pairs(&ts), vec![(0, 3.0), (10, 10.0)]);
    }

    #[test]
    fn test_interval_sorts_unsorted_input() {
        let mut ts = series(&[(90_000, 7.0), (0, 1.0), (65_000, 5.0), (30_000, 3.0)]);
        sample_by_interval(&mut ts, 60_000, None);
        assert_eq!(pairs(&ts), vec![(60_000, 2.0), (120_000, 6.0)]);
    }

    #[test]
    fn test_interval_nan_propagates() {
        let mut ts = series(&[(0, f64::NAN), (1, 1.0), (100, 2.0)]);
        sample_by_interval(&mut ts, 100, None);
        assert!(ts.values()[0].is_nan());
        assert_eq!(ts.values()[1], 2.0);
    }

    #[test]
    fn test_span_uses_mean_timestamps() {
        // span 0..=90 into 3 buckets of 30
        let mut ts = series(&[(0, 1.0), (10, 2.0), (40, 3.0), (50, 5.0), (90, 8.0)]);
        sample_by_span(&mut ts, 3);
        assert_eq!(pairs(&ts), vec![(5, 1.5), (45, 4.0), (90, 8.0)]);
    }

    #[test]
    fn test_span_with_identical_timestamps() {
        let mut ts = series(&[(7, 1.0), (7, 3.0)]);
        sample_by_span(&mut ts, 4);
        assert_eq!(pairs(&ts), vec![(7, 2.0)]);
    }

    #[test]
    fn test_window_merges_remainder_into_last_window() {
        let points: Vec<(i64, f64)> = (0..10).map(|i| (i * 10, i as f64)).collect();
        let mut ts = series(&points);
        sample_by_window(&mut ts, 4);
        // windows [0..4) and [4..10): the trailing 2 points join the second window
        assert_eq!(pairs(&ts), vec![(15, 1.5), (65, 6.5)]);
    }

    #[test]
    fn test_window_exact_multiple() {
        let points: Vec<(i64, f64)> = (0..8).map(|i| (i, 1.0)).collect();
        let mut ts = series(&points);
        sample_by_window(&mut ts, 4);
        assert_eq!(ts.len(), 2);
    }

    #[test]
    fn test_window_larger_than_series() {
        let mut ts = series(&[(0, 1.0), (3, 2.0), (4, 6.0)]);
        sample_by_window(&mut ts, 10);
        assert_eq!(pairs(&ts), vec![(2, 3.0)]);
    }

    #[test]
    fn test_mean_timestamp_rounds_half_up() {
        let mut bucket = Bucket::new(0, Point::new(1, 0.0));
        bucket.push(Point::new(2, 0.0));
        assert_eq!(bucket.mean_timestamp(), 2);

        let mut negative = Bucket::new(0, Point::new(-1, 0.0));
        negative.push(Point::new(-2, 0.0));
        assert_eq!(negative.mean_timestamp(), -1);
    }
}
