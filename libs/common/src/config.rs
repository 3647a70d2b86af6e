//! Layered configuration loading
//!
//! Priority (highest to lowest):
//! 1. Environment variables (`<PREFIX>_KEY`, nested keys joined with `__`)
//! 2. Config file (format chosen by extension: toml, yaml/yml, json)
//! 3. `Default` values of the target type

use crate::{Error, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tracing::debug;

/// Load `T` from defaults, an optional file and prefixed environment variables
///
/// A file that is given but missing is an error; use `None` to skip the file
/// layer.
pub fn load_config<T>(path: Option<&Path>, env_prefix: &str) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    let mut figment = Figment::from(Serialized::defaults(T::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        figment = figment.merge(file_provider(path)?);
        debug!(path = %path.display(), "Loaded config file");
    }

    figment = figment.merge(Env::prefixed(&format!("{}_", env_prefix)).split("__"));

    figment
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))
}

/// Load `T` from a single file, without defaults or environment
pub fn load_config_from_file<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    file_provider(path.as_ref())?
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load configuration from file: {}", e)))
}

fn file_provider(path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Config("Config file must have an extension".to_string()))?;

    match extension {
        "toml" => Ok(Figment::new().merge(Toml::file(path))),
        "yaml" | "yml" => Ok(Figment::new().merge(Yaml::file(path))),
        "json" => Ok(Figment::new().merge(Json::file(path))),
        _ => Err(Error::Config(format!(
            "Unsupported config file format: {}",
            extension
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Inner {
        limit: Option<usize>,
        names: Vec<String>,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        level: String,
        strict: bool,
        inner: Inner,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                level: "info".to_string(),
                strict: false,
                inner: Inner::default(),
            }
        }
    }

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let config: Sample = load_config(None, "COMMON_TEST_DEFAULTS").unwrap();
        assert_eq!(config, Sample::default());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let file = write_file(
            ".toml",
            "strict = true\n[inner]\nlimit = 10\nnames = [\"avg\"]\n",
        );
        let config: Sample = load_config(Some(file.path()), "COMMON_TEST_TOML").unwrap();
        assert!(config.strict);
        assert_eq!(config.level, "info");
        assert_eq!(config.inner.limit, Some(10));
        assert_eq!(config.inner.names, vec!["avg".to_string()]);
    }

    #[test]
    fn test_yaml_and_json_files() {
        let yaml = write_file(".yaml", "level: debug\n");
        let config: Sample = load_config_from_file(yaml.path()).unwrap();
        assert_eq!(config.level, "debug");

        let json = write_file(".json", r#"{"strict": true}"#);
        let config: Sample = load_config_from_file(json.path()).unwrap();
        assert!(config.strict);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_file(".toml", "level = \"warn\"\n");
        std::env::set_var("COMMON_TEST_ENV_LEVEL", "trace");
        std::env::set_var("COMMON_TEST_ENV_INNER__LIMIT", "5");

        let config: Sample = load_config(Some(file.path()), "COMMON_TEST_ENV").unwrap();
        assert_eq!(config.level, "trace");
        assert_eq!(config.inner.limit, Some(5));

        std::env::remove_var("COMMON_TEST_ENV_LEVEL");
        std::env::remove_var("COMMON_TEST_ENV_INNER__LIMIT");
    }

    #[test]
    fn test_missing_and_unsupported_files() {
        let missing = load_config::<Sample>(Some(Path::new("/nonexistent/metrix.toml")), "X");
        assert!(matches!(missing, Err(Error::Config(_))));

        let ini = write_file(".ini", "level=debug");
        let unsupported = load_config::<Sample>(Some(ini.path()), "X");
        assert!(matches!(unsupported, Err(Error::Config(msg)) if msg.contains("Unsupported")));
    }
}
