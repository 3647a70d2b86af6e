//! Metric time series container
//!
//! Points are stored column-wise (timestamps and values in parallel vectors)
//! so that functions working on whole arrays can borrow them directly.

use crate::point::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered collection of metric points with opaque metadata
///
/// The container keeps insertion order until [`MetricTimeSeries::sort`] is
/// called. Name and attributes are never interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SeriesRepr", into = "SeriesRepr")]
pub struct MetricTimeSeries {
    name: String,
    attributes: BTreeMap<String, serde_json::Value>,
    timestamps: Vec<i64>,
    values: Vec<f64>,
}

impl MetricTimeSeries {
    /// Create an empty series with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a series from points, keeping their order
    pub fn from_points<I>(name: impl Into<String>, points: I) -> Self
    where
        I: IntoIterator<Item = Point>,
    {
        let mut series = Self::new(name);
        series.add_all(points);
        series
    }

    /// Attach an attribute (builder style)
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut BTreeMap<String, serde_json::Value> {
        &mut self.attributes
    }

    /// Append a point
    pub fn add(&mut self, timestamp: i64, value: f64) {
        self.timestamps.push(timestamp);
        self.values.push(value);
    }

    pub fn add_point(&mut self, point: Point) {
        self.add(point.timestamp, point.value);
    }

    /// Append all points from an iterator
    pub fn add_all<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = Point>,
    {
        let points = points.into_iter();
        let (lower, _) = points.size_hint();
        self.timestamps.reserve(lower);
        self.values.reserve(lower);
        for point in points {
            self.add_point(point);
        }
    }

    /// Remove all points, keeping name and attributes
    pub fn clear(&mut self) {
        self.timestamps.clear();
        self.values.clear();
    }

    /// Replace all points at once
    ///
    /// The new content is built aside and swapped in, so the container is
    /// never observed half rewritten.
    pub fn replace<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = Point>,
    {
        let points = points.into_iter();
        let (lower, _) = points.size_hint();
        let mut timestamps = Vec::with_capacity(lower);
        let mut values = Vec::with_capacity(lower);
        for point in points {
            timestamps.push(point.timestamp);
            values.push(point.value);
        }
        self.timestamps = timestamps;
        self.values = values;
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// All timestamps, in container order
    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    /// All values, in container order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Values for in-place rewriting; timestamps stay untouched
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Point at `index`, if present
    pub fn point(&self, index: usize) -> Option<Point> {
        Some(Point::new(
            *self.timestamps.get(index)?,
            *self.values.get(index)?,
        ))
    }

    /// Lazy iterator over the points in container order
    pub fn points(&self) -> impl ExactSizeIterator<Item = Point> + '_ {
        self.timestamps
            .iter()
            .zip(self.values.iter())
            .map(|(&timestamp, &value)| Point::new(timestamp, value))
    }

    /// Whether timestamps are non-decreasing
    pub fn is_sorted(&self) -> bool {
        self.timestamps.windows(2).all(|w| w[0] <= w[1])
    }

    /// Sort points by timestamp
    ///
    /// Stable: points sharing a timestamp keep their relative order.
    pub fn sort(&mut self) {
        if self.is_sorted() {
            return;
        }
        let sorted = self.sorted_points();
        self.replace(sorted);
    }

    /// Points ordered by timestamp, without touching the container
    pub fn sorted_points(&self) -> Vec<Point> {
        let mut points: Vec<Point> = self.points().collect();
        if !self.is_sorted() {
            points.sort_by_key(|p| p.timestamp);
        }
        points
    }

    /// Timestamp of the first point, defined once the series holds 2+ points
    pub fn start(&self) -> Option<i64> {
        if self.len() < 2 {
            return None;
        }
        self.timestamps.first().copied()
    }

    /// Timestamp of the last point, defined once the series holds 2+ points
    pub fn end(&self) -> Option<i64> {
        if self.len() < 2 {
            return None;
        }
        self.timestamps.last().copied()
    }
}

/// Row-oriented serde form of [`MetricTimeSeries`]
#[derive(Clone, Serialize, Deserialize)]
struct SeriesRepr {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    points: Vec<Point>,
}

impl From<SeriesRepr> for MetricTimeSeries {
    fn from(repr: SeriesRepr) -> Self {
        let mut series = MetricTimeSeries::new(repr.name);
        series.attributes = repr.attributes;
        series.add_all(repr.points);
        series
    }
}

impl From<MetricTimeSeries> for SeriesRepr {
    fn from(series: MetricTimeSeries) -> Self {
        let points = series.points().collect();
        SeriesRepr {
            name: series.name,
            attributes: series.attributes,
            points,
        }
    }
}
