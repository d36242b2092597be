// Reporter - Scheduled database report delivery
// Copyright (c) 2025 Reporter Contributors
// Licensed under the MIT License

//! # Reporter - Scheduled database report delivery
//!
//! Reporter is a batch job that turns named SQL queries into compressed
//! delimited-text reports and delivers them to an SFTP server.
//!
//! ## Overview
//!
//! For every configured report name, once per run and in order:
//! - **Extract** rows with the query in `{query_dir}/{name}.sql`
//! - **Write** them to `rprt_{name}{YYYYMMDD}.csv` under a header row
//! - **Archive** the file into a single-entry `rprt_{name}{YYYYMMDD}.tar.gz`
//! - **Deliver** the archive to `{destination_root}/` over SFTP
//!
//! A failing report is logged with the stage it reached and never stops the
//! reports after it.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Report pipeline (runner, tabular writer, archiver, summary)
//! - [`adapters`] - External integrations (PostgreSQL, SFTP)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reporter::adapters::postgresql::PostgresConnector;
//! use reporter::adapters::sftp::SftpConnector;
//! use reporter::config::load_config;
//! use reporter::core::report::ReportRunner;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("reporter.toml")?;
//!
//!     let database = Arc::new(PostgresConnector::new(&config.database)?);
//!     let transfer = Arc::new(SftpConnector::new(&config.transfer));
//!     let runner = ReportRunner::new(config, database, transfer);
//!
//!     let summary = runner.run_all(chrono::Local::now().date_naive()).await;
//!     println!("Delivered {} of {} reports", summary.succeeded(), summary.outcomes.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Reporter uses the [`domain::ReporterError`] type for all errors:
//!
//! ```rust,no_run
//! use reporter::domain::ReporterError;
//!
//! fn example() -> Result<(), ReporterError> {
//!     let config = reporter::config::load_config("reporter.toml")?;
//!     println!("{} reports configured", config.reports.names.len());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
