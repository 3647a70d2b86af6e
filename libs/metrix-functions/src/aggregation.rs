//! Aggregations
//!
//! Read-only reductions of a series to one scalar. Empty input yields NaN,
//! except `count` and `sum` (0) and `integral` (0 for fewer than two points).

use crate::args::{Args, FloatArg};
use crate::error::{FunctionError, Result};
use crate::function::{FunctionCategory, FunctionIdentity, FunctionSpec};
use crate::stats;
use metrix_series::{MetricTimeSeries, Point};

/// Statistical aggregation over the values of a series
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Avg,
    Min,
    Max,
    /// Sample standard deviation
    Dev,
    /// Nearest-rank percentile, `percentile` in (0, 1]
    Percentile { percentile: FloatArg },
    Sum,
    Count,
    /// Value at the earliest timestamp
    First,
    /// Value at the latest timestamp
    Last,
    /// max - min
    Range,
    /// |last - first|
    Difference,
    /// last - first
    SignedDifference,
    /// Trapezoidal area under the series, in value x timestamp units
    Integral,
}

const fn spec(name: &'static str, signature: &'static str, description: &'static str) -> FunctionSpec {
    FunctionSpec {
        name,
        category: FunctionCategory::Aggregation,
        signature,
        description,
    }
}

pub(crate) const SPECS: &[FunctionSpec] = &[
    spec("avg", "avg", "Arithmetic mean of the values"),
    spec("min", "min", "Smallest value"),
    spec("max", "max", "Largest value"),
    spec("dev", "dev", "Sample standard deviation"),
    spec("p", "p(percentile)", "Nearest-rank percentile, percentile in (0, 1]"),
    spec("sum", "sum", "Sum of the values"),
    spec("count", "count", "Number of points"),
    spec("first", "first", "Value of the earliest point"),
    spec("last", "last", "Value of the latest point"),
    spec("range", "range", "Difference between largest and smallest value"),
    spec("diff", "diff", "Absolute difference between last and first value"),
    spec("sdiff", "sdiff", "Signed difference last - first"),
    spec("integral", "integral", "Trapezoidal integral over the timestamps"),
];

impl Aggregation {
    /// Build the aggregation registered under `name`
    pub(crate) fn parse(name: &'static str, raw: &[String]) -> Result<Self> {
        let args = Args::new(name, raw);
        if name == "p" {
            args.at_most(1)?;
            let percentile = args.float(0, "percentile")?;
            if !(percentile.get() > 0.0 && percentile.get() <= 1.0) {
                return Err(FunctionError::argument(
                    name,
                    0,
                    raw.first().map(String::as_str),
                    "percentile must be in (0, 1]",
                ));
            }
            return Ok(Self::Percentile { percentile });
        }

        args.at_most(0)?;
        let aggregation = match name {
            "avg" => Self::Avg,
            "min" => Self::Min,
            "max" => Self::Max,
            "dev" => Self::Dev,
            "sum" => Self::Sum,
            "count" => Self::Count,
            "first" => Self::First,
            "last" => Self::Last,
            "range" => Self::Range,
            "diff" => Self::Difference,
            "sdiff" => Self::SignedDifference,
            "integral" => Self::Integral,
            _ => return Err(FunctionError::unknown_function(name)),
        };
        Ok(aggregation)
    }

    /// Reduce the series to one value
    pub fn aggregate(&self, series: &MetricTimeSeries) -> f64 {
        let values = series.values();
        match self {
            Self::Avg => stats::mean(values),
            Self::Min => stats::min(values),
            Self::Max => stats::max(values),
            Self::Dev => stats::sample_std_dev(values),
            Self::Percentile { percentile } => stats::percentile(values, percentile.get()),
            Self::Sum => values.iter().sum(),
            Self::Count => values.len() as f64,
            Self::First => first(series).map_or(f64::NAN, |p| p.value),
            Self::Last => last(series).map_or(f64::NAN, |p| p.value),
            Self::Range => stats::max(values) - stats::min(values),
            Self::Difference => edge_difference(series).abs(),
            Self::SignedDifference => edge_difference(series),
            Self::Integral => integral(&series.sorted_points()),
        }
    }
}

/// Earliest point, first inserted on ties
fn first(series: &MetricTimeSeries) -> Option<Point> {
    series
        .points()
        .reduce(|best, p| if p.timestamp < best.timestamp { p } else { best })
}

/// Latest point, last inserted on ties
fn last(series: &MetricTimeSeries) -> Option<Point> {
    series
        .points()
        .reduce(|best, p| if p.timestamp >= best.timestamp { p } else { best })
}

fn edge_difference(series: &MetricTimeSeries) -> f64 {
    match (first(series), last(series)) {
        (Some(first), Some(last)) => last.value - first.value,
        _ => f64::NAN,
    }
}

fn integral(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| {
            let width = stats::elapsed(w[0].timestamp, w[1].timestamp) as f64;
            (w[0].value + w[1].value) / 2.0 * width
        })
        .sum()
}

impl FunctionIdentity for Aggregation {
    fn query_name(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::Dev => "dev",
            Self::Percentile { .. } => "p",
            Self::Sum => "sum",
            Self::Count => "count",
            Self::First => "first",
            Self::Last => "last",
            Self::Range => "range",
            Self::Difference => "diff",
            Self::SignedDifference => "sdiff",
            Self::Integral => "integral",
        }
    }

    fn arguments(&self) -> Vec<String> {
        match self {
            Self::Percentile { percentile } => vec![format!("percentile={}", percentile)],
            _ => Vec::new(),
        }
    }
}
