//! Query Pipeline Integration Tests
//!
//! End-to-end runs through the engine: query text in, mutated series and
//! collected values out.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use metrix_functions::{
    EngineConfig, FunctionCategory, FunctionEngine, FunctionError, FunctionIdentity,
    FunctionRegistry, OutputValue,
};
use metrix_series::{MetricTimeSeries, Point};
use std::sync::Arc;

fn series(name: &str, points: &[(i64, f64)]) -> MetricTimeSeries {
    MetricTimeSeries::from_points(name, points.iter().map(|&p| Point::from(p)))
}

fn load() -> MetricTimeSeries {
    series(
        "cpu.load",
        &[(0, 1.0), (30_000, 3.0), (65_000, 5.0), (90_000, 7.0)],
    )
}

// ============================================================================
// Ordering and Provenance
// ============================================================================

#[test]
fn test_aggregations_see_sampled_series() {
    let engine = FunctionEngine::default();
    let registry = engine.registry().clone();

    // raw mean is 4.0, the sampled buckets are {1, 3} and {8} with mean 5.0
    let mut ts = series("cpu.load", &[(0, 1.0), (30_000, 3.0), (65_000, 8.0)]);
    let outcome = engine
        .run("avg; savgint(60000); avg; count", &mut ts)
        .unwrap();

    // avg is recorded once; the later execution keeps the latest value
    let avg = registry.parse_call("avg").unwrap();
    assert_eq!(outcome.values.scalar(&avg), Some(5.0));

    let count = registry.parse_call("count").unwrap();
    assert_eq!(outcome.values.scalar(&count), Some(2.0));

    let names: Vec<&str> = outcome.values.iter().map(|(f, _)| f.query_name()).collect();
    assert_eq!(names, vec!["avg", "savgint", "count"]);
}

#[test]
fn test_transformations_record_provenance_even_when_noop() {
    let engine = FunctionEngine::default();
    let mut ts = series("single", &[(5, 1.0)]);
    let outcome = engine.run("savgint(10); derivative", &mut ts).unwrap();

    assert_eq!(ts.len(), 1);
    let applied: Vec<String> = outcome
        .values
        .by_category(FunctionCategory::Transformation)
        .map(|(f, values)| {
            assert_eq!(values[0].value, OutputValue::Applied);
            f.to_string()
        })
        .collect();
    assert_eq!(applied, vec!["savgint(interval=10,maxPoints=null)", "derivative"]);
}

#[test]
fn test_empty_series_does_not_fail() {
    let engine = FunctionEngine::default();
    let mut ts = MetricTimeSeries::new("empty");
    let outcome = engine
        .run(
            "avg; count; trend; outlier; frequency(1,1); vector(0.5); movavg(1,MINUTES); \
             smovavg(3); top(2); distinct; savgbckt(4); savgwin(4); savgint(1000)",
            &mut ts,
        )
        .unwrap();

    assert!(outcome.rejected.is_empty());
    assert!(ts.is_empty());
    let count = FunctionRegistry::metric().parse_call("count").unwrap();
    assert_eq!(outcome.values.scalar(&count), Some(0.0));
}

#[test]
fn test_extreme_timestamps_do_not_overflow() {
    let engine = FunctionEngine::default();
    let extremes = [(i64::MIN, 1.0), (0, 1.5), (i64::MAX, 2.0)];

    let mut ts = series("extremes", &extremes);
    let outcome = engine
        .run("integral; trend; frequency(1,0)", &mut ts)
        .unwrap();
    let registry = engine.registry();
    let integral = outcome
        .values
        .scalar(&registry.parse_call("integral").unwrap())
        .unwrap();
    assert!(integral.is_finite() && integral > 0.0);
    assert_eq!(
        outcome.values.flag(&registry.parse_call("trend").unwrap()),
        Some(true)
    );
    assert_eq!(
        outcome
            .values
            .flag(&registry.parse_call("frequency(1,0)").unwrap()),
        Some(true)
    );

    let mut ts = series("extremes", &extremes);
    engine.run("derivative", &mut ts).unwrap();
    assert_eq!(ts.timestamps(), &[0, i64::MAX]);
    assert!(ts.values().iter().all(|&rate| rate > 0.0));

    // the middle point lies on the line between the extremes
    let mut ts = series("extremes", &extremes);
    engine.run("vector(0.01)", &mut ts).unwrap();
    assert_eq!(ts.timestamps(), &[i64::MIN, i64::MAX]);
}

// ============================================================================
// Pair Analysis
// ============================================================================

#[test]
fn test_fastdtw_with_and_without_partner() {
    let engine = FunctionEngine::default();
    let query = "fastdtw(metric:cpu.load,2,0.5)";

    let base: Vec<(i64, f64)> = (0..60).map(|i| (i * 1_000, (i as f64 / 6.0).sin())).collect();
    let shifted: Vec<(i64, f64)> = (0..60)
        .map(|i| (i * 1_000, ((i + 1) as f64 / 6.0).sin()))
        .collect();
    let partner = series("cpu.load.replica", &shifted);

    let dtw = engine.registry().parse_call(query).unwrap();

    let mut ts = series("cpu.load", &base);
    let paired = engine.run_with_partner(query, &mut ts, Some(&partner)).unwrap();
    assert_eq!(paired.values.flag(&dtw), Some(true));
    assert_eq!(paired.values.label(&dtw, "partner"), Some("cpu.load.replica"));

    let mut ts = series("cpu.load", &base);
    let alone = engine.run(query, &mut ts).unwrap();
    assert_eq!(alone.values.flag(&dtw), Some(false));
    assert_eq!(alone.values.label(&dtw, "partner"), None);
}

// ============================================================================
// Configuration and Errors
// ============================================================================

#[test]
fn test_shared_registry_across_engines() {
    let registry = Arc::new(FunctionRegistry::metric().without(&["outlier"]));
    let lenient = FunctionEngine::with_registry(registry.clone(), EngineConfig::default());
    let strict = FunctionEngine::with_registry(
        registry,
        EngineConfig {
            fail_fast: true,
            ..EngineConfig::default()
        },
    );

    let compiled = lenient.compile("outlier; trend").unwrap();
    assert_eq!(compiled.pipeline.len(), 1);
    assert_eq!(compiled.rejected, vec![FunctionError::unknown_function("outlier")]);

    assert!(matches!(
        strict.compile("outlier; trend"),
        Err(FunctionError::UnknownFunction { .. })
    ));
}

#[test]
fn test_argument_errors_name_position_and_raw_text() {
    let engine = FunctionEngine::default();
    let compiled = engine
        .compile("savgint(60000,abc); savgbckt(); movavg(5,fortnights)")
        .unwrap();

    assert!(compiled.pipeline.is_empty());
    let positions: Vec<(String, usize, Option<String>)> = compiled
        .rejected
        .into_iter()
        .map(|e| match e {
            FunctionError::ArgumentParse {
                function,
                position,
                value,
                ..
            } => (function, position, value),
            other => panic!("unexpected error: {}", other),
        })
        .collect();

    assert_eq!(
        positions,
        vec![
            ("savgint".to_string(), 1, Some("abc".to_string())),
            ("savgbckt".to_string(), 0, None),
            ("movavg".to_string(), 1, Some("fortnights".to_string())),
        ]
    );
}

#[test]
fn test_syntax_errors_are_rejected_per_reference() {
    let engine = FunctionEngine::default();
    let compiled = engine.compile("avg(1)); max").unwrap();
    assert_eq!(compiled.pipeline.len(), 1);
    assert!(matches!(compiled.rejected[0], FunctionError::Syntax { .. }));
}

#[test]
fn test_values_serialize_to_json() {
    let engine = FunctionEngine::default();
    let mut ts = load();
    let outcome = engine.run("savgint(60000,1); max; trend", &mut ts).unwrap();

    let json = serde_json::to_value(&outcome.values).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["function"], "savgint");
    assert_eq!(
        entries[0]["arguments"],
        serde_json::json!(["interval=60000", "maxPoints=1"])
    );
    assert_eq!(entries[1]["values"][0]["value"], 6.0);
    assert_eq!(entries[2]["values"][0]["type"], "flag");
}
