//! Logging bootstrap for metrix tools
//!
//! Console output goes to stderr so that stdout stays free for command
//! results. An optional log file is written through a non-blocking appender.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::{Error, Result};

/// Console/file output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output
    Pretty,
    /// `timestamp [LEVEL] message fields`
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Logging settings, usually a `[logging]` section of the tool config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `warn,metrix_functions=debug`
    pub level: String,
    pub format: LogFormat,
    /// Also append events to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "\x1b[35m", // magenta
        Level::DEBUG => "\x1b[34m", // blue
        Level::INFO => "\x1b[32m",  // green
        Level::WARN => "\x1b[33m",  // yellow
        Level::ERROR => "\x1b[31m", // red
    }
}

/// Event formatter that outputs `timestamp [LEVEL] message`
///
/// Example output: `2026-10-17T08:12:03.402117Z [WARN] Skipping function reference error=...`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = event.metadata().level();
        if writer.has_ansi_escapes() {
            write!(writer, "{}{}\x1b[0m ", level_color(level), format_level(level))?;
        } else {
            write!(writer, "{} ", format_level(level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Build the level filter; a set `RUST_LOG` wins over the configured level
fn build_filter(level: &str, env: Option<String>) -> Result<EnvFilter> {
    let directive = env
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| level.to_string());

    EnvFilter::try_new(&directive)
        .map_err(|e| Error::Logging(format!("Invalid log level '{}': {}", directive, e)))
}

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

fn console_layer<S>(format: LogFormat) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .event_format(BracketedLevelFormat)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    }
}

/// Install the global subscriber
///
/// Returns the file appender guard when a log file is configured; keep it
/// alive until exit so buffered events are flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(&config.level, std::env::var("RUST_LOG").ok())?;

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| {
                    Error::Logging(format!("Log file path has no file name: {}", path.display()))
                })?
                .to_os_string();
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&dir)?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            let layer = if config.format == LogFormat::Json {
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .boxed()
            } else {
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(BracketedLevelFormat)
                    .boxed()
            };
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(config.format))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Logging(format!("Failed to install subscriber: {}", e)))?;

    Ok(guard)
}
