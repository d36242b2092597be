//! Logging and observability
//!
//! Structured logging with:
//! - A single append-only log file (text or JSON lines)
//! - Configurable log levels, `RUST_LOG` taking precedence
//! - Milestone and failure macros shared by the report runner
//!
//! # Example
//!
//! ```no_run
//! use reporter::logging::init_logging;
//! use reporter::config::LoggingConfig;
//! use std::path::Path;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config, Path::new(".")).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a pipeline milestone for a report job
///
/// Trailing arguments are forwarded to `tracing::info!`, so extra fields go
/// before the message.
///
/// # Example
///
/// ```no_run
/// use reporter::log_milestone;
/// use reporter::domain::{JobStage, ReportName};
///
/// let report = ReportName::new("sv").unwrap();
/// log_milestone!(report, JobStage::Querying, rows = 10, "Rows fetched");
/// ```
#[macro_export]
macro_rules! log_milestone {
    ($report:expr, $stage:expr, $($arg:tt)+) => {
        tracing::info!(
            report = %$report,
            stage = %$stage,
            $($arg)+
        )
    };
}

/// Log a failed report job with its full diagnostic chain
///
/// # Example
///
/// ```no_run
/// use reporter::log_job_failure;
/// use reporter::domain::{JobStage, ReportName, ReporterError};
///
/// let report = ReportName::new("sv").unwrap();
/// let error = ReporterError::transfer("permission denied");
/// log_job_failure!(report, JobStage::Uploading, &error);
/// ```
#[macro_export]
macro_rules! log_job_failure {
    ($report:expr, $stage:expr, $error:expr) => {
        tracing::error!(
            report = %$report,
            stage = %$stage,
            error = %$error.diagnostic(),
            "Report job failed"
        )
    };
}
