//! Structured logging setup using tracing
//!
//! Log records go to a single append-only file (text or JSON lines). A stderr
//! layer can be enabled for interactive runs.

use crate::config::LoggingConfig;
use crate::domain::{ReporterError, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Guard that must be kept alive for the duration of the program
/// to ensure logs are flushed properly
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            _file_guard: file_guard,
        }
    }
}

/// Initialize the logging system based on configuration
///
/// # Arguments
///
/// * `log_level_str` - Log level as a string (trace, debug, info, warn, error)
/// * `config` - Logging configuration
/// * `log_dir` - Directory receiving `config.file_name`
///
/// # Returns
///
/// A `LoggingGuard` that must be kept alive for the duration of the program
///
/// # Example
///
/// ```no_run
/// use reporter::logging::init_logging;
/// use reporter::config::LoggingConfig;
/// use std::path::Path;
///
/// let config = LoggingConfig::default();
/// let _guard = init_logging("info", &config, Path::new("/opt/reporter"))
///     .expect("Failed to initialize logging");
/// ```
pub fn init_logging(
    log_level_str: &str,
    config: &LoggingConfig,
    log_dir: &Path,
) -> Result<LoggingGuard> {
    let log_level = parse_log_level(log_level_str)?;
    let make_filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("reporter={}", log_level)))
    };

    let mut layers = Vec::new();

    if config.console_enabled {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(make_filter());
        layers.push(console_layer.boxed());
    }

    let file_guard = if config.local_enabled {
        std::fs::create_dir_all(log_dir).map_err(|e| {
            ReporterError::Configuration(format!(
                "Failed to create log directory {}: {}",
                log_dir.display(),
                e
            ))
        })?;

        // Rotation::NEVER appends to one file across runs
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(config.file_name.as_str())
            .build(log_dir)
            .map_err(|e| {
                ReporterError::Configuration(format!(
                    "Failed to open log file {}: {}",
                    log_dir.join(&config.file_name).display(),
                    e
                ))
            })?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = if config.format == "json" {
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_writer(non_blocking)
                .with_filter(make_filter())
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(non_blocking)
                .with_filter(make_filter())
                .boxed()
        };

        layers.push(file_layer);
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| ReporterError::Configuration(format!("Failed to install logger: {e}")))?;

    tracing::debug!(
        local_enabled = config.local_enabled,
        log_dir = %log_dir.display(),
        file_name = %config.file_name,
        format = %config.format,
        "Logging initialized"
    );

    Ok(LoggingGuard::new(file_guard))
}

/// Parse log level from string
fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(ReporterError::Configuration(format!(
            "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
            level_str
        ))),
    }
}
