//! metrix-functions - Time series function engine
//!
//! Resolves function references such as `savgint(60000,100)` into immutable
//! function values and runs them in order against a [`MetricTimeSeries`].
//!
//! # Features
//!
//! - **Aggregations**: reduce the series to a named scalar
//! - **Analyses**: answer a yes/no question, optionally against a partner series
//! - **Transformations**: rewrite the series in place (sampling, smoothing, arithmetic)
//!
//! # Example
//!
//! ```rust
//! use metrix_functions::{EngineConfig, FunctionEngine};
//! use metrix_series::MetricTimeSeries;
//!
//! let mut series = MetricTimeSeries::new("cpu.load");
//! series.add(0, 1.0);
//! series.add(30_000, 3.0);
//! series.add(65_000, 5.0);
//! series.add(90_000, 7.0);
//!
//! let engine = FunctionEngine::new(EngineConfig::default());
//! let outcome = engine.run("savgint(60000); count; max", &mut series).unwrap();
//!
//! assert!(outcome.rejected.is_empty());
//! assert_eq!(series.timestamps(), &[60_000, 120_000]);
//! assert_eq!(series.values(), &[2.0, 6.0]);
//!
//! let count = engine.registry().parse_call("count").unwrap();
//! assert_eq!(outcome.values.scalar(&count), Some(2.0));
//! ```
//!
//! # Catalog
//!
//! | Category | Functions |
//! |----------|-----------|
//! | Aggregation | `avg` `min` `max` `dev` `p` `sum` `count` `first` `last` `range` `diff` `sdiff` `integral` |
//! | Analysis | `trend` `outlier` `frequency` `fastdtw` |
//! | Transformation | `vector` `divide` `scale` `bottom` `top` `movavg` `smovavg` `savgbckt` `savgwin` `derivative` `nnderivative` `add` `sub` `timeshift` `distinct` `savgint` |

pub mod aggregation;
pub mod analysis;
pub mod args;
pub mod config;
pub mod error;
pub mod function;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod sampling;
pub mod stats;
pub mod transformation;
pub mod value_map;

// Re-exports for convenience
pub use aggregation::Aggregation;
pub use analysis::Analysis;
pub use args::{FloatArg, TimeUnit};
pub use config::EngineConfig;
pub use error::{FunctionError, Result};
pub use function::{FunctionCategory, FunctionIdentity, FunctionSpec, MetricFunction};
pub use parser::FunctionCall;
pub use pipeline::{CompiledQuery, FunctionEngine, FunctionPipeline, QueryOutcome};
pub use registry::FunctionRegistry;
pub use transformation::Transformation;
pub use value_map::{FunctionValue, FunctionValueMap, OutputValue};
