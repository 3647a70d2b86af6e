//! Transformations
//!
//! In-place rewrites of a series. Every transformation that depends on order
//! sorts the series first and leaves it sorted. Algorithms that need two
//! points leave shorter series untouched.

mod smoothing;
mod vectorization;

use crate::args::{Args, FloatArg, TimeUnit};
use crate::error::{FunctionError, Result};
use crate::function::{FunctionCategory, FunctionIdentity, FunctionSpec};
use crate::sampling;
use crate::stats;
use metrix_series::{MetricTimeSeries, Point};
use rustc_hash::FxHashSet;

const MILLIS_PER_SECOND: f64 = 1_000.0;

/// Series rewrite
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transformation {
    /// Drop points lying within `tolerance` of the line through their neighbours
    Vectorization { tolerance: FloatArg },
    Divide { value: FloatArg },
    Scale { value: FloatArg },
    /// Keep the `count` smallest values
    Bottom { count: usize },
    /// Keep the `count` largest values
    Top { count: usize },
    /// Time-window moving average
    MovingAverage { amount: i64, unit: TimeUnit },
    /// Sample-count moving average
    SimpleMovingAverage { samples: usize },
    /// Span policy downsampling into `bucket_size` buckets
    SampleAverageBucket { bucket_size: usize },
    /// Index-window policy downsampling
    SampleAverageWindow { window_size: usize },
    /// Per-second rate of change
    Derivative,
    /// Per-second rate of change, negative rates dropped
    NonNegativeDerivative,
    Add { value: FloatArg },
    Subtract { value: FloatArg },
    /// Move every timestamp by `amount` of `unit`
    TimeShift { amount: i64, unit: TimeUnit },
    /// Keep the first point of every distinct value
    Distinct,
    /// Interval policy downsampling
    SampleAverageInterval {
        interval: i64,
        max_points: Option<usize>,
    },
}

const fn spec(name: &'static str, signature: &'static str, description: &'static str) -> FunctionSpec {
    FunctionSpec {
        name,
        category: FunctionCategory::Transformation,
        signature,
        description,
    }
}

pub(crate) const SPECS: &[FunctionSpec] = &[
    spec(
        "vector",
        "vector(tolerance)",
        "Drop points within tolerance of the line between their neighbours",
    ),
    spec("divide", "divide(value)", "Divide every value by a non-zero divisor"),
    spec("scale", "scale(value)", "Multiply every value by a factor"),
    spec("bottom", "bottom(value)", "Keep the k smallest values"),
    spec("top", "top(value)", "Keep the k largest values"),
    spec(
        "movavg",
        "movavg(timeSpan, unit)",
        "Moving average over a sliding time window",
    ),
    spec(
        "smovavg",
        "smovavg(samples)",
        "Moving average over a sliding window of samples",
    ),
    spec(
        "savgbckt",
        "savgbckt(bucketSize)",
        "Average into bucketSize buckets spanning the series",
    ),
    spec(
        "savgwin",
        "savgwin(windowSize)",
        "Average consecutive windows of windowSize points",
    ),
    spec("derivative", "derivative", "Rate of change per second"),
    spec(
        "nnderivative",
        "nnderivative",
        "Non-negative rate of change per second",
    ),
    spec("add", "add(value)", "Add a constant to every value"),
    spec("sub", "sub(value)", "Subtract a constant from every value"),
    spec(
        "timeshift",
        "timeshift(amount, unit)",
        "Shift every timestamp by a signed amount",
    ),
    spec("distinct", "distinct", "Keep the first point of each distinct value"),
    spec(
        "savgint",
        "savgint(interval[, maxPoints])",
        "Average into right-closed buckets of interval, keeping the latest maxPoints",
    ),
];

impl Transformation {
    /// Build the transformation registered under `name`
    pub(crate) fn parse(name: &'static str, raw: &[String]) -> Result<Self> {
        let args = Args::new(name, raw);
        let transformation = match name {
            "vector" => {
                args.at_most(1)?;
                Self::Vectorization {
                    tolerance: args.non_negative_float(0, "tolerance")?,
                }
            },
            "divide" => {
                args.at_most(1)?;
                let value = args.float(0, "value")?;
                if value.get() == 0.0 {
                    return Err(FunctionError::argument(
                        name,
                        0,
                        raw.first().map(String::as_str),
                        "divisor must not be zero",
                    ));
                }
                Self::Divide { value }
            },
            "scale" => {
                args.at_most(1)?;
                Self::Scale {
                    value: args.float(0, "value")?,
                }
            },
            "add" => {
                args.at_most(1)?;
                Self::Add {
                    value: args.float(0, "value")?,
                }
            },
            "sub" => {
                args.at_most(1)?;
                Self::Subtract {
                    value: args.float(0, "value")?,
                }
            },
            "bottom" => {
                args.at_most(1)?;
                Self::Bottom {
                    count: args.count(0, "value")?,
                }
            },
            "top" => {
                args.at_most(1)?;
                Self::Top {
                    count: args.count(0, "value")?,
                }
            },
            "movavg" => {
                args.at_most(2)?;
                let amount = args.positive_integer(0, "timeSpan")?;
                let unit = args.time_unit(1)?;
                if unit.to_millis(amount).is_none() {
                    return Err(FunctionError::argument(
                        name,
                        0,
                        raw.first().map(String::as_str),
                        "timeSpan is too large",
                    ));
                }
                Self::MovingAverage { amount, unit }
            },
            "smovavg" => {
                args.at_most(1)?;
                Self::SimpleMovingAverage {
                    samples: args.count(0, "samples")?,
                }
            },
            "savgbckt" => {
                args.at_most(1)?;
                Self::SampleAverageBucket {
                    bucket_size: args.count(0, "bucketSize")?,
                }
            },
            "savgwin" => {
                args.at_most(1)?;
                Self::SampleAverageWindow {
                    window_size: args.count(0, "windowSize")?,
                }
            },
            "derivative" => {
                args.at_most(0)?;
                Self::Derivative
            },
            "nnderivative" => {
                args.at_most(0)?;
                Self::NonNegativeDerivative
            },
            "timeshift" => {
                args.at_most(2)?;
                let amount = args.integer(0, "amount")?;
                let unit = args.time_unit(1)?;
                if unit.to_millis(amount).is_none() {
                    return Err(FunctionError::argument(
                        name,
                        0,
                        raw.first().map(String::as_str),
                        "amount is too large",
                    ));
                }
                Self::TimeShift { amount, unit }
            },
            "distinct" => {
                args.at_most(0)?;
                Self::Distinct
            },
            "savgint" => {
                args.at_most(2)?;
                let interval = args.positive_integer(0, "interval")?;
                let max_points = args
                    .optional_positive_integer(1, "maxPoints")?
                    .map(|max| usize::try_from(max).unwrap_or(usize::MAX));
                Self::SampleAverageInterval {
                    interval,
                    max_points,
                }
            },
            _ => return Err(FunctionError::unknown_function(name)),
        };
        Ok(transformation)
    }

    /// Rewrite the series in place
    pub fn apply(&self, series: &mut MetricTimeSeries) {
        match self {
            Self::Vectorization { tolerance } => {
                vectorization::vectorize(series, tolerance.get());
            },
            Self::Divide { value } => map_values(series, |v| v / value.get()),
            Self::Scale { value } => map_values(series, |v| v * value.get()),
            Self::Add { value } => map_values(series, |v| v + value.get()),
            Self::Subtract { value } => map_values(series, |v| v - value.get()),
            Self::Bottom { count } => keep_ranked(series, *count, |a, b| a.total_cmp(&b)),
            Self::Top { count } => keep_ranked(series, *count, |a, b| b.total_cmp(&a)),
            Self::MovingAverage { amount, unit } => {
                if let Some(window) = unit.to_millis(*amount) {
                    smoothing::moving_average(series, window);
                }
            },
            Self::SimpleMovingAverage { samples } => {
                smoothing::simple_moving_average(series, *samples);
            },
            Self::SampleAverageBucket { bucket_size } => {
                if series.len() > 1 {
                    sampling::sample_by_span(series, *bucket_size);
                }
            },
            Self::SampleAverageWindow { window_size } => {
                if series.len() > 1 {
                    sampling::sample_by_window(series, *window_size);
                }
            },
            Self::Derivative => derivative(series, false),
            Self::NonNegativeDerivative => derivative(series, true),
            Self::TimeShift { amount, unit } => {
                if let Some(offset) = unit.to_millis(*amount) {
                    let shifted: Vec<Point> = series
                        .points()
                        .map(|p| Point::new(p.timestamp.saturating_add(offset), p.value))
                        .collect();
                    series.replace(shifted);
                }
            },
            Self::Distinct => distinct(series),
            Self::SampleAverageInterval {
                interval,
                max_points,
            } => {
                if series.len() > 1 {
                    sampling::sample_by_interval(series, *interval, *max_points);
                }
            },
        }
    }
}

fn map_values<F>(series: &mut MetricTimeSeries, f: F)
where
    F: Fn(f64) -> f64,
{
    for value in series.values_mut() {
        *value = f(*value);
    }
}

/// Keep the first `count` non-NaN points under `order`, output in time order
///
/// Ties keep the earlier point.
fn keep_ranked<F>(series: &mut MetricTimeSeries, count: usize, order: F)
where
    F: Fn(f64, f64) -> std::cmp::Ordering,
{
    let mut ranked: Vec<Point> = series
        .sorted_points()
        .into_iter()
        .filter(|p| !p.value.is_nan())
        .collect();
    ranked.sort_by(|a, b| order(a.value, b.value));
    ranked.truncate(count);
    ranked.sort_by_key(|p| p.timestamp);
    series.replace(ranked);
}

/// Rate of change per second between consecutive points, at the later point
///
/// Pairs with a non-positive time delta are skipped.
fn derivative(series: &mut MetricTimeSeries, non_negative: bool) {
    if series.len() < 2 {
        return;
    }
    let points = series.sorted_points();
    let rates: Vec<Point> = points
        .windows(2)
        .filter_map(|w| {
            let dt = stats::elapsed(w[0].timestamp, w[1].timestamp);
            if dt <= 0 {
                return None;
            }
            let rate = (w[1].value - w[0].value) / (dt as f64 / MILLIS_PER_SECOND);
            Some(Point::new(w[1].timestamp, rate))
        })
        .filter(|p| !non_negative || p.value >= 0.0)
        .collect();
    series.replace(rates);
}

fn distinct(series: &mut MetricTimeSeries) {
    series.sort();
    let mut seen = FxHashSet::default();
    let kept: Vec<Point> = series
        .points()
        .filter(|p| seen.insert(p.value.to_bits()))
        .collect();
    series.replace(kept);
}

impl FunctionIdentity for Transformation {
    fn query_name(&self) -> &'static str {
        match self {
            Self::Vectorization { .. } => "vector",
            Self::Divide { .. } => "divide",
            Self::Scale { .. } => "scale",
            Self::Bottom { .. } => "bottom",
            Self::Top { .. } => "top",
            Self::MovingAverage { .. } => "movavg",
            Self::SimpleMovingAverage { .. } => "smovavg",
            Self::SampleAverageBucket { .. } => "savgbckt",
            Self::SampleAverageWindow { .. } => "savgwin",
            Self::Derivative => "derivative",
            Self::NonNegativeDerivative => "nnderivative",
            Self::Add { .. } => "add",
            Self::Subtract { .. } => "sub",
            Self::TimeShift { .. } => "timeshift",
            Self::Distinct => "distinct",
            Self::SampleAverageInterval { .. } => "savgint",
        }
    }

    fn arguments(&self) -> Vec<String> {
        match self {
            Self::Vectorization { tolerance } => vec![format!("tolerance={}", tolerance)],
            Self::Divide { value }
            | Self::Scale { value }
            | Self::Add { value }
            | Self::Subtract { value } => vec![format!("value={}", value)],
            Self::Bottom { count } | Self::Top { count } => vec![format!("value={}", count)],
            Self::MovingAverage { amount, unit } => {
                vec![format!("timeSpan={}", amount), format!("unit={}", unit)]
            },
            Self::SimpleMovingAverage { samples } => vec![format!("samples={}", samples)],
            Self::SampleAverageBucket { bucket_size } => {
                vec![format!("bucketSize={}", bucket_size)]
            },
            Self::SampleAverageWindow { window_size } => {
                vec![format!("windowSize={}", window_size)]
            },
            Self::TimeShift { amount, unit } => {
                vec![format!("amount={}", amount), format!("unit={}", unit)]
            },
            Self::SampleAverageInterval {
                interval,
                max_points,
            } => {
                let max_points = max_points.map_or_else(|| "null".to_string(), |m| m.to_string());
                vec![
                    format!("interval={}", interval),
                    format!("maxPoints={}", max_points),
                ]
            },
            Self::Derivative | Self::NonNegativeDerivative | Self::Distinct => Vec::new(),
        }
    }
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

    fn parse(name: &'static str, args: &[&str]) -> Result<Transformation> {
        let raw: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Transformation::parse(name, &raw)
    }

    #[test]
    fn test_arithmetic() {
        let mut ts = series(&[(1, 2.0), (2, 4.0)]);
        parse("scale", &["3"]).unwrap().apply(&mut ts);
        parse("add", &["1"]).unwrap().apply(&mut ts);
        parse("divide", &["2"]).unwrap().apply(&mut ts);
        parse("sub", &["0.5"]).unwrap().apply(&mut ts);
        assert_eq!(pairs(&ts), vec![(1, 3.0), (2, 6.0)]);
    }

    #[test]
    fn test_divide_by_zero_rejected() {
        let err = parse("divide", &["0"]).unwrap_err();
        assert!(matches!(err, FunctionError::ArgumentParse { position: 0, .. }));
    }

    #[test]
    fn test_top_and_bottom_keep_time_order() {
        let points = [(1, 5.0), (2, f64::NAN), (3, 9.0), (4, 1.0), (5, 7.0)];

        let mut top = series(&points);
        Transformation::Top { count: 2 }.apply(&mut top);
        assert_eq!(pairs(&top), vec![(3, 9.0), (5, 7.0)]);

        let mut bottom = series(&points);
        Transformation::Bottom { count: 2 }.apply(&mut bottom);
        assert_eq!(pairs(&bottom), vec![(1, 5.0), (4, 1.0)]);

        let mut all = series(&points);
        Transformation::Top { count: 10 }.apply(&mut all);
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_derivative_per_second() {
        let mut ts = series(&[(2_000, 30.0), (0, 10.0), (1_000, 40.0), (1_000, 50.0)]);
        Transformation::Derivative.apply(&mut ts);
        // sorted: (0,10) (1000,40) (1000,50) (2000,30); the zero-delta pair is skipped
        assert_eq!(pairs(&ts), vec![(1_000, 30.0), (2_000, -20.0)]);
    }

    #[test]
    fn test_non_negative_derivative() {
        let mut ts = series(&[(0, 10.0), (1_000, 40.0), (2_000, 30.0)]);
        Transformation::NonNegativeDerivative.apply(&mut ts);
        assert_eq!(pairs(&ts), vec![(1_000, 30.0)]);
    }

    #[test]
    fn test_timeshift() {
        let mut ts = series(&[(0, 1.0), (1_000, 2.0)]);
        let shift = parse("timeshift", &["-2", "seconds"]).unwrap();
        assert_eq!(shift.arguments(), vec!["amount=-2", "unit=SECONDS"]);
        shift.apply(&mut ts);
        assert_eq!(pairs(&ts), vec![(-2_000, 1.0), (-1_000, 2.0)]);
    }

    #[test]
    fn test_distinct_keeps_first_in_time() {
        let mut ts = series(&[(3, 1.0), (1, 1.0), (2, 2.0), (4, 2.0), (5, 3.0)]);
        Transformation::Distinct.apply(&mut ts);
        assert_eq!(pairs(&ts), vec![(1, 1.0), (2, 2.0), (5, 3.0)]);
    }

    #[test]
    fn test_savgint_arguments() {
        let with_max = parse("savgint", &["60000", "100"]).unwrap();
        assert_eq!(with_max.arguments(), vec!["interval=60000", "maxPoints=100"]);

        let without = parse("savgint", &["60000"]).unwrap();
        assert_eq!(without.arguments(), vec!["interval=60000", "maxPoints=null"]);

        assert!(parse("savgint", &[]).is_err());
        assert!(parse("savgint", &["60000", "0"]).is_err());
        assert!(parse("savgint", &["60000", "1", "2"]).is_err());
    }

    #[test]
    fn test_single_point_untouched_by_sampling() {
        for t in [
            Transformation::SampleAverageInterval {
                interval: 10,
                max_points: None,
            },
            Transformation::SampleAverageBucket { bucket_size: 3 },
            Transformation::SampleAverageWindow { window_size: 3 },
            Transformation::Derivative,
            Transformation::SimpleMovingAverage { samples: 2 },
        ] {
            let mut ts = series(&[(7, 3.0)]);
            t.apply(&mut ts);
            assert_eq!(pairs(&ts), vec![(7, 3.0)], "{:?}", t);
        }
    }

    #[test]
    fn test_movavg_validation() {
        assert!(parse("movavg", &["10", "MINUTES"]).is_ok());
        assert!(parse("movavg", &["0", "MINUTES"]).is_err());
        assert!(parse("movavg", &["10", "weeks"]).is_err());
        assert!(parse("movavg", &["10"]).is_err());
    }

    #[test]
    fn test_every_spec_parses() {
        for spec in SPECS {
            let args: &[&str] = match spec.name {
                "movavg" | "timeshift" => &["1", "SECONDS"],
                "derivative" | "nnderivative" | "distinct" => &[],
                _ => &["2"],
            };
            let t = parse(spec.name, args).unwrap();
            assert_eq!(t.query_name(), spec.name);
        }
    }
}
