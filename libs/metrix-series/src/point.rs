//! Single (timestamp, value) sample

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One sample of a metric series
///
/// Points order by timestamp first. Ties fall back to the IEEE total order
/// of the value, and equality uses the same order: `0.0` and `-0.0` differ,
/// a NaN equals a NaN with the same bits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    /// Timestamp, in the series' time unit (milliseconds by convention)
    pub timestamp: i64,
    /// Sample value
    pub value: f64,
}

impl Point {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Point {}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

impl From<(i64, f64)> for Point {
    fn from((timestamp, value): (i64, f64)) -> Self {
        Self::new(timestamp, value)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.timestamp, self.value)
    }
}
