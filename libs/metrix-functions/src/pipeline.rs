//! Query execution
//!
//! A [`FunctionPipeline`] runs its functions strictly in order against one
//! series, so later functions observe earlier transformations. The
//! [`FunctionEngine`] compiles query text into a pipeline through a shared
//! registry and applies the engine limits.

use crate::config::EngineConfig;
use crate::error::{FunctionError, Result};
use crate::function::MetricFunction;
use crate::registry::FunctionRegistry;
use crate::value_map::FunctionValueMap;
use metrix_series::MetricTimeSeries;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered list of functions to execute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionPipeline {
    functions: Vec<MetricFunction>,
}

impl FunctionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, function: impl Into<MetricFunction>) {
        self.functions.push(function.into());
    }

    pub fn functions(&self) -> &[MetricFunction] {
        &self.functions
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Run every function against `series`
    pub fn execute(&self, series: &mut MetricTimeSeries) -> FunctionValueMap {
        self.execute_with_partner(series, None)
    }

    /// Run every function, feeding `partner` to pair analyses
    pub fn execute_with_partner(
        &self,
        series: &mut MetricTimeSeries,
        partner: Option<&MetricTimeSeries>,
    ) -> FunctionValueMap {
        let mut values = FunctionValueMap::new();
        for function in &self.functions {
            function.execute_with_partner(series, partner, &mut values);
        }
        values
    }
}

impl FromIterator<MetricFunction> for FunctionPipeline {
    fn from_iter<I: IntoIterator<Item = MetricFunction>>(iter: I) -> Self {
        Self {
            functions: iter.into_iter().collect(),
        }
    }
}

/// A compiled query: the runnable pipeline plus rejected references
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub pipeline: FunctionPipeline,
    pub rejected: Vec<FunctionError>,
}

/// Result of running a query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub values: FunctionValueMap,
    pub rejected: Vec<FunctionError>,
}

/// Compiles and runs queries against a shared registry
#[derive(Debug, Clone)]
pub struct FunctionEngine {
    registry: Arc<FunctionRegistry>,
    config: EngineConfig,
}

impl FunctionEngine {
    /// Engine over the metric catalog minus the configured disabled names
    pub fn new(config: EngineConfig) -> Self {
        let registry = FunctionRegistry::metric().without(&config.disabled_functions);
        Self::with_registry(Arc::new(registry), config)
    }

    pub fn with_registry(registry: Arc<FunctionRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve every reference in `query`
    ///
    /// Rejected references are collected and skipped, or abort compilation
    /// when `fail_fast` is set.
    pub fn compile(&self, query: &str) -> Result<CompiledQuery> {
        let mut pipeline = FunctionPipeline::new();
        let mut rejected = Vec::new();

        for result in self.registry.parse_query(query) {
            match result {
                Ok(function) => pipeline.push(function),
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    warn!(error = %e, "Skipping function reference");
                    rejected.push(e);
                },
            }
        }

        debug!(
            functions = pipeline.len(),
            rejected = rejected.len(),
            "Compiled query"
        );
        Ok(CompiledQuery { pipeline, rejected })
    }

    pub fn run(&self, query: &str, series: &mut MetricTimeSeries) -> Result<QueryOutcome> {
        self.run_with_partner(query, series, None)
    }

    /// Compile `query` and execute it against `series`
    pub fn run_with_partner(
        &self,
        query: &str,
        series: &mut MetricTimeSeries,
        partner: Option<&MetricTimeSeries>,
    ) -> Result<QueryOutcome> {
        self.check_size(series)?;
        if let Some(partner) = partner {
            self.check_size(partner)?;
        }

        let compiled = self.compile(query)?;
        let values = compiled.pipeline.execute_with_partner(series, partner);
        Ok(QueryOutcome {
            values,
            rejected: compiled.rejected,
        })
    }

    fn check_size(&self, series: &MetricTimeSeries) -> Result<()> {
        match self.config.max_input_points {
            Some(limit) if series.len() > limit => Err(FunctionError::InputTooLarge {
                points: series.len(),
                limit,
            }),
            _ => Ok(()),
        }
    }
}

impl Default for FunctionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::Aggregation;
    use crate::transformation::Transformation;
    use metrix_series::Point;
    use tracing_test::traced_test;

    fn series(points: &[(i64, f64)]) -> MetricTimeSeries {
        MetricTimeSeries::from_points("test", points.iter().map(|&p| Point::from(p)))
    }

    #[test]
    fn test_pipeline_order_matters() {
        let raw = [(0, 1.0), (30_000, 3.0), (65_000, 5.0), (90_000, 7.0)];
        let count = MetricFunction::from(Aggregation::Count);

        let sample_then_count: FunctionPipeline = [
            MetricFunction::from(Transformation::SampleAverageInterval {
                interval: 60_000,
                max_points: None,
            }),
            count.clone(),
        ]
        .into_iter()
        .collect();
        let mut ts = series(&raw);
        let values = sample_then_count.execute(&mut ts);
        assert_eq!(values.scalar(&count), Some(2.0));

        let mut count_only = FunctionPipeline::new();
        count_only.push(Aggregation::Count);
        let mut ts = series(&raw);
        assert_eq!(count_only.execute(&mut ts).scalar(&count), Some(4.0));
    }

    #[test]
    fn test_compile_collects_rejections() {
        let engine = FunctionEngine::default();
        let compiled = engine.compile("avg; savgint(x); nope; max").unwrap();
        assert_eq!(compiled.pipeline.len(), 2);
        assert_eq!(compiled.rejected.len(), 2);
    }

    #[test]
    fn test_fail_fast() {
        let engine = FunctionEngine::new(EngineConfig {
            fail_fast: true,
            ..EngineConfig::default()
        });
        let err = engine.compile("avg; nope; max").unwrap_err();
        assert_eq!(err, FunctionError::unknown_function("nope"));
    }

    #[test]
    fn test_input_limit() {
        let engine = FunctionEngine::new(EngineConfig {
            max_input_points: Some(2),
            ..EngineConfig::default()
        });
        let mut ts = series(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let err = engine.run("avg", &mut ts).unwrap_err();
        assert_eq!(err, FunctionError::InputTooLarge { points: 3, limit: 2 });
    }

    #[test]
    fn test_disabled_functions() {
        let engine = FunctionEngine::new(EngineConfig {
            disabled_functions: vec!["avg".to_string()],
            ..EngineConfig::default()
        });
        let mut ts = series(&[(1, 1.0)]);
        let outcome = engine.run("avg; max", &mut ts).unwrap();
        assert_eq!(outcome.values.len(), 1);
        assert_eq!(
            outcome.rejected,
            vec![FunctionError::unknown_function("avg")]
        );
    }

    #[traced_test]
    #[test]
    fn test_rejected_reference_is_logged() {
        let engine = FunctionEngine::default();
        let compiled = engine.compile("p(2.0); avg").unwrap();
        assert_eq!(compiled.pipeline.len(), 1);
        assert!(logs_contain("Skipping function reference"));
        assert!(logs_contain("percentile must be in (0, 1]"));
    }
}
