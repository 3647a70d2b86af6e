//! metrix-series - Metric time series container
//!
//! Provides the data model shared by every metrix function:
//!
//! - [`Point`]: immutable (timestamp, value) sample
//! - [`MetricTimeSeries`]: column-wise point storage with name and attributes
//!
//! # Example
//!
//! ```
//! use metrix_series::{MetricTimeSeries, Point};
//!
//! let mut series = MetricTimeSeries::new("cpu.load");
//! series.add(30_000, 3.0);
//! series.add(0, 1.0);
//! series.sort();
//!
//! assert_eq!(series.start(), Some(0));
//! assert_eq!(series.point(1), Some(Point::new(30_000, 3.0)));
//! ```

pub mod point;
pub mod series;

pub use point::Point;
pub use series::MetricTimeSeries;

/// Series kind handled by this crate
pub const METRIC: &str = "metric";
