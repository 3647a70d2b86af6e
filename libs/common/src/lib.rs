//! Shared infrastructure for metrix tools
//!
//! - `config`: layered configuration loading (defaults, file, environment)
//! - `logging`: tracing subscriber bootstrap
//! - `error`: common error type

pub mod config;
pub mod error;
pub mod logging;

pub use config::{load_config, load_config_from_file};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
