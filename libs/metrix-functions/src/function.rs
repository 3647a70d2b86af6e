//! Function contract
//!
//! Every function is one variant of the closed set [`MetricFunction`]:
//!
//! - **Aggregation**: reads the series, records one named scalar
//! - **Analysis**: reads the series (and optionally a partner), records a flag
//! - **Transformation**: rewrites the series in place, records its identity
//!
//! Aggregations and analyses only ever see `&MetricTimeSeries`.

use crate::aggregation::Aggregation;
use crate::analysis::Analysis;
use crate::transformation::Transformation;
use crate::value_map::FunctionValueMap;
use metrix_series::{MetricTimeSeries, METRIC};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Identity shared by every function variant
pub trait FunctionIdentity {
    /// Stable name used for registry lookup and result display
    fn query_name(&self) -> &'static str;

    /// Series kind the function applies to
    fn time_series_type(&self) -> &'static str {
        METRIC
    }

    /// Canonical `key=value` rendering of the constructor parameters
    fn arguments(&self) -> Vec<String>;
}

/// Function category, distinguished by side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionCategory {
    Aggregation,
    Analysis,
    Transformation,
}

impl FunctionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregation => "aggregation",
            Self::Analysis => "analysis",
            Self::Transformation => "transformation",
        }
    }
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry describing one query name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub category: FunctionCategory,
    /// Argument signature, e.g. `savgint(interval[, maxPoints])`
    pub signature: &'static str,
    pub description: &'static str,
}

/// A constructed, immutable function instance
///
/// Equality and hashing are structural: same variant and same constructor
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetricFunction {
    Aggregation(Aggregation),
    Analysis(Analysis),
    Transformation(Transformation),
}

impl MetricFunction {
    pub fn category(&self) -> FunctionCategory {
        match self {
            Self::Aggregation(_) => FunctionCategory::Aggregation,
            Self::Analysis(_) => FunctionCategory::Analysis,
            Self::Transformation(_) => FunctionCategory::Transformation,
        }
    }

    /// Execute against the series, recording output into `values`
    pub fn execute(&self, series: &mut MetricTimeSeries, values: &mut FunctionValueMap) {
        self.execute_with_partner(series, None, values);
    }

    /// Execute with an optional partner series for pair analyses
    pub fn execute_with_partner(
        &self,
        series: &mut MetricTimeSeries,
        partner: Option<&MetricTimeSeries>,
        values: &mut FunctionValueMap,
    ) {
        match self {
            Self::Aggregation(aggregation) => {
                let value = aggregation.aggregate(series);
                debug!(function = %self, series = series.name(), value, "aggregation");
                values.add_scalar(self, value);
            },
            Self::Analysis(analysis) => match (analysis.requires_partner(), partner) {
                (true, Some(partner)) => {
                    let flag = analysis.analyze_pair(series, partner);
                    debug!(function = %self, series = series.name(), partner = partner.name(), flag, "pair analysis");
                    values.add_flag(self, flag);
                    values.add_label(self, "partner", partner.name());
                },
                (true, None) => {
                    debug!(function = %self, series = series.name(), "pair analysis without partner");
                    values.add_flag(self, false);
                },
                (false, _) => {
                    let flag = analysis.analyze(series);
                    debug!(function = %self, series = series.name(), flag, "analysis");
                    values.add_flag(self, flag);
                },
            },
            Self::Transformation(transformation) => {
                let before = series.len();
                transformation.apply(series);
                debug!(
                    function = %self,
                    series = series.name(),
                    before,
                    after = series.len(),
                    "transformation"
                );
                values.add_applied(self);
            },
        }
    }
}

impl FunctionIdentity for MetricFunction {
    fn query_name(&self) -> &'static str {
        match self {
            Self::Aggregation(f) => f.query_name(),
            Self::Analysis(f) => f.query_name(),
            Self::Transformation(f) => f.query_name(),
        }
    }

    fn arguments(&self) -> Vec<String> {
        match self {
            Self::Aggregation(f) => f.arguments(),
            Self::Analysis(f) => f.arguments(),
            Self::Transformation(f) => f.arguments(),
        }
    }
}

impl fmt::Display for MetricFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arguments = self.arguments();
        if arguments.is_empty() {
            f.write_str(self.query_name())
        } else {
            write!(f, "{}({})", self.query_name(), arguments.join(","))
        }
    }
}

impl From<Aggregation> for MetricFunction {
    fn from(aggregation: Aggregation) -> Self {
        Self::Aggregation(aggregation)
    }
}

impl From<Analysis> for MetricFunction {
    fn from(analysis: Analysis) -> Self {
        Self::Analysis(analysis)
    }
}

impl From<Transformation> for MetricFunction {
    fn from(transformation: Transformation) -> Self {
        Self::Transformation(transformation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::FloatArg;
    use std::collections::HashSet;

    #[test]
    fn test_display_uses_canonical_arguments() {
        let f = MetricFunction::from(Transformation::SampleAverageInterval {
            interval: 60_000,
            max_points: None,
        });
        assert_eq!(f.to_string(), "savgint(interval=60000,maxPoints=null)");
        assert_eq!(MetricFunction::from(Aggregation::Avg).to_string(), "avg");
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let a = MetricFunction::from(Aggregation::Percentile {
            percentile: FloatArg::new(0.5),
        });
        let b = MetricFunction::from(Aggregation::Percentile {
            percentile: FloatArg::new(0.5),
        });
        let c = MetricFunction::from(Aggregation::Percentile {
            percentile: FloatArg::new(0.9),
        });

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<MetricFunction> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_time_series_type_is_metric() {
        assert_eq!(
            MetricFunction::from(Transformation::Distinct).time_series_type(),
            "metric"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            MetricFunction::from(Analysis::Trend).category(),
            FunctionCategory::Analysis
        );
        assert_eq!(FunctionCategory::Transformation.to_string(), "transformation");
    }
}
