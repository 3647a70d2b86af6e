//! Tool configuration
//!
//! ```toml
//! [logging]
//! level = "warn"
//! format = "compact"
//!
//! [engine]
//! fail_fast = false
//! max_input_points = 1000000
//! disabled_functions = ["fastdtw"]
//! ```
//!
//! Every key can be overridden with `METRIX_<SECTION>__<KEY>`, e.g.
//! `METRIX_ENGINE__FAIL_FAST=true`.

use std::path::Path;

use anyhow::{Context, Result};
use common::LoggingConfig;
use metrix_functions::EngineConfig;
use serde::{Deserialize, Serialize};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "METRIX";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        common::load_config(path, prefix).with_context(|| match path {
            Some(path) => format!("Failed to load config from {}", path.display()),
            None => "Failed to load config".to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use common::LogFormat;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::load_with_prefix(None, "METRIX_TEST_DEFAULTS").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.logging.level, "info");
        assert!(!config.engine.fail_fast);
    }

    #[test]
    fn test_file_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[logging]\nformat = \"json\"\n\n[engine]\nmax_input_points = 50\ndisabled_functions = [\"fastdtw\"]"
        )
        .unwrap();

        let config = AppConfig::load_with_prefix(Some(file.path()), "METRIX_TEST_FILE").unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.engine.max_input_points, Some(50));
        assert_eq!(config.engine.disabled_functions, vec!["fastdtw".to_string()]);
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("METRIX_TEST_ENV_ENGINE__FAIL_FAST", "true");
        let config = AppConfig::load_with_prefix(None, "METRIX_TEST_ENV").unwrap();
        std::env::remove_var("METRIX_TEST_ENV_ENGINE__FAIL_FAST");

        assert!(config.engine.fail_fast);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = AppConfig::load_with_prefix(Some(Path::new("/nonexistent/metrix.yaml")), "X");
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("/nonexistent/metrix.yaml"));
    }
}
