//! Analyses
//!
//! Read-only checks that answer a yes/no question about a series. `fastdtw`
//! compares the series against a partner series supplied by the caller.

mod fastdtw;

use crate::args::{Args, FloatArg};
use crate::error::{FunctionError, Result};
use crate::function::{FunctionCategory, FunctionIdentity, FunctionSpec};
use crate::stats;
use metrix_series::MetricTimeSeries;

pub use fastdtw::{fast_dtw, WarpResult};

/// Interquartile multiplier for the outlier fence
const OUTLIER_IQR_FACTOR: f64 = 1.5;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Shape analysis of a series
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Analysis {
    /// Least-squares slope is positive
    Trend,
    /// Some value lies above `q3 + 1.5 * (q3 - q1)`
    Outlier,
    /// Point count per window grows by more than `threshold` between
    /// consecutive windows of `window_minutes`
    Frequency { window_minutes: i64, threshold: usize },
    /// Normalized dynamic time warping cost against a partner series
    FastDtw {
        subquery: String,
        search_radius: usize,
        max_warping_cost: FloatArg,
    },
}

const fn spec(name: &'static str, signature: &'static str, description: &'static str) -> FunctionSpec {
    FunctionSpec {
        name,
        category: FunctionCategory::Analysis,
        signature,
        description,
    }
}

pub(crate) const SPECS: &[FunctionSpec] = &[
    spec("trend", "trend", "True when the linear regression slope is positive"),
    spec(
        "outlier",
        "outlier",
        "True when a value exceeds the upper interquartile fence",
    ),
    spec(
        "frequency",
        "frequency(windowSize, windowThreshold)",
        "True when the point count grows by more than the threshold between windows (minutes)",
    ),
    spec(
        "fastdtw",
        "fastdtw(subquery, searchRadius, maxNormalizedWarpingCost)",
        "True when the normalized FastDTW distance to the partner series is within the cost",
    ),
];

impl Analysis {
    /// Build the analysis registered under `name`
    pub(crate) fn parse(name: &'static str, raw: &[String]) -> Result<Self> {
        let args = Args::new(name, raw);
        match name {
            "trend" => {
                args.at_most(0)?;
                Ok(Self::Trend)
            },
            "outlier" => {
                args.at_most(0)?;
                Ok(Self::Outlier)
            },
            "frequency" => {
                args.at_most(2)?;
                let window_minutes = args.positive_integer(0, "windowSize")?;
                if window_minutes.checked_mul(MILLIS_PER_MINUTE).is_none() {
                    return Err(FunctionError::argument(
                        name,
                        0,
                        raw.first().map(String::as_str),
                        "windowSize is too large",
                    ));
                }
                let threshold = args.non_negative_count(1, "windowThreshold")?;
                Ok(Self::Frequency {
                    window_minutes,
                    threshold,
                })
            },
            "fastdtw" => {
                args.at_most(3)?;
                let subquery = args.text(0, "subquery")?.to_string();
                let search_radius = args.non_negative_count(1, "searchRadius")?;
                let max_warping_cost = args.non_negative_float(2, "maxNormalizedWarpingCost")?;
                Ok(Self::FastDtw {
                    subquery,
                    search_radius,
                    max_warping_cost,
                })
            },
            _ => Err(FunctionError::unknown_function(name)),
        }
    }

    /// Whether the analysis needs a partner series
    pub fn requires_partner(&self) -> bool {
        matches!(self, Self::FastDtw { .. })
    }

    /// Analyze a single series
    ///
    /// Pair analyses answer `false` without a partner.
    pub fn analyze(&self, series: &MetricTimeSeries) -> bool {
        match self {
            Self::Trend => stats::linear_regression_slope(&series.sorted_points()) > 0.0,
            Self::Outlier => has_outlier(series.values()),
            Self::Frequency {
                window_minutes,
                threshold,
            } => frequency_increase(series, window_minutes * MILLIS_PER_MINUTE, *threshold),
            Self::FastDtw { .. } => false,
        }
    }

    /// Analyze a series against a partner
    ///
    /// Single-series analyses ignore the partner.
    pub fn analyze_pair(&self, series: &MetricTimeSeries, partner: &MetricTimeSeries) -> bool {
        match self {
            Self::FastDtw {
                search_radius,
                max_warping_cost,
                ..
            } => {
                let left: Vec<f64> = series.sorted_points().iter().map(|p| p.value).collect();
                let right: Vec<f64> = partner.sorted_points().iter().map(|p| p.value).collect();
                match fast_dtw(&left, &right, *search_radius) {
                    Some(warp) => warp.normalized_distance() <= max_warping_cost.get(),
                    None => false,
                }
            },
            _ => self.analyze(series),
        }
    }
}

fn has_outlier(values: &[f64]) -> bool {
    if values.is_empty() {
        return false;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(stats::cmp_values);
    let q1 = stats::percentile_of_sorted(&sorted, 0.25);
    let q3 = stats::percentile_of_sorted(&sorted, 0.75);
    let fence = q3 + (q3 - q1) * OUTLIER_IQR_FACTOR;
    values.iter().any(|&v| v > fence)
}

/// Count points per fixed window starting at the first timestamp and report
/// whether any window holds more than `threshold` points over its predecessor
fn frequency_increase(series: &MetricTimeSeries, window_millis: i64, threshold: usize) -> bool {
    let points = series.sorted_points();
    let Some(first) = points.first() else {
        return false;
    };

    // (window index, count) for non-empty windows, ascending
    let mut windows: Vec<(i128, usize)> = Vec::new();
    for point in &points {
        let index = stats::elapsed(first.timestamp, point.timestamp) / i128::from(window_millis);
        match windows.last_mut() {
            Some((last, count)) if *last == index => *count += 1,
            _ => windows.push((index, 1)),
        }
    }

    windows.windows(2).any(|pair| {
        let (previous_index, previous_count) = pair[0];
        let (index, count) = pair[1];
        // a gap means the window right before this one was empty
        let previous = if index == previous_index + 1 {
            previous_count
        } else {
            0
        };
        count.saturating_sub(previous) > threshold
    })
}

impl FunctionIdentity for Analysis {
    fn query_name(&self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::Outlier => "outlier",
            Self::Frequency { .. } => "frequency",
            Self::FastDtw { .. } => "fastdtw",
        }
    }

    fn arguments(&self) -> Vec<String> {
        match self {
            Self::Trend | Self::Outlier => Vec::new(),
            Self::Frequency {
                window_minutes,
                threshold,
            } => vec![
                format!("window size={}", window_minutes),
                format!("window threshold={}", threshold),
            ],
            Self::FastDtw {
                subquery,
                search_radius,
                max_warping_cost,
            } => vec![
                format!("subquery={}", subquery),
                format!("search radius={}", search_radius),
                format!("max warping cost={}", max_warping_cost),
                "distance function=EUCLIDEAN".to_string(),
            ],
        }
    }
}
