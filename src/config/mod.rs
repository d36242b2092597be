//! Configuration management for the reporter.
//!
//! The reporter reads a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `REPORTER_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation once everything has been merged
//!
//! The result is an immutable [`ReporterConfig`] built once at startup.
//!
//! # Example Configuration
//!
//! ```toml
//! [reports]
//! names = ["sv"]
//!
//! [database]
//! connection_string = "${REPORTER_DB_URL}"
//!
//! [transfer]
//! host = "sftp.example.com"
//! username = "reports"
//! password = "${REPORTER_SFTP_PASSWORD}"
//! destination_root = "./reports"
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use reporter::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("reporter.toml")?;
//! println!("Reports: {:?}", config.reports.names);
//! println!("Queries: {}", config.query_dir().display());
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{
    default_config_path, load_config, parse_report_names, read_config, validate_config,
};
pub use schema::{
    ApplicationConfig, DatabaseConfig, LoggingConfig, OutputConfig, ReporterConfig, ReportsConfig,
    TransferConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
