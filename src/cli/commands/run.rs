//! Run command implementation
//!
//! This module implements the `run` command (also the default when no
//! subcommand is given): generate and deliver every configured report once.

use crate::adapters::postgresql::PostgresConnector;
use crate::adapters::sftp::SftpConnector;
use crate::config::{parse_report_names, read_config, validate_config, ReporterConfig};
use crate::core::report::ReportRunner;
use crate::logging::init_logging;
use clap::Args;
use std::path::Path;
use std::sync::Arc;

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Override report name(s) to run (comma-separated, order preserved)
    #[arg(long)]
    pub report: Option<String>,
}

impl RunArgs {
    /// Execute the run command
    ///
    /// Returns 0 once the run has finished, whatever the outcome of the
    /// individual reports. Configuration problems return 2 and a logging
    /// setup failure returns 5, both before any report runs.
    pub async fn execute(&self, config_path: &Path, log_level: Option<&str>) -> anyhow::Result<i32> {
        let config = match self.prepare_config(config_path, log_level) {
            Ok(config) => config,
            Err(message) => {
                eprintln!("Configuration error: {message}");
                return Ok(2);
            }
        };

        let _logging_guard = match init_logging(
            &config.application.log_level,
            &config.logging,
            &config.log_dir(),
        ) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Failed to initialize logging: {e}");
                return Ok(5);
            }
        };

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            config_path = %config_path.display(),
            "Reporter starting"
        );

        let database = match PostgresConnector::new(&config.database) {
            Ok(connector) => Arc::new(connector),
            Err(e) => {
                tracing::error!(error = %e, "Invalid database configuration");
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };
        let transfer = Arc::new(SftpConnector::new(&config.transfer));

        let runner = ReportRunner::new(config, database, transfer);
        let summary = runner.run_all(chrono::Local::now().date_naive()).await;

        if !summary.is_successful() {
            tracing::warn!(
                failed = summary.failed(),
                "Run finished with failed reports; see the records above"
            );
        }

        Ok(0)
    }

    /// Load the configuration, apply command-line overrides and validate once
    fn prepare_config(
        &self,
        config_path: &Path,
        log_level: Option<&str>,
    ) -> Result<ReporterConfig, String> {
        let mut config = read_config(config_path).map_err(|e| e.to_string())?;

        if let Some(level) = log_level {
            config.application.log_level = level.to_string();
        }

        if let Some(reports) = &self.report {
            config.reports.names = parse_report_names(reports)?;
        }

        validate_config(&config).map_err(|e| e.to_string())?;
        Ok(config)
    }
}
