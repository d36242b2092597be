//! Core business logic for the reporter.
//!
//! # Modules
//!
//! - [`report`] - Report job orchestration, tabular output and archiving
//!
//! # Report Workflow
//!
//! For every configured report name, in order:
//!
//! 1. **Read Query**: Load `{query_dir}/{name}.sql`
//! 2. **Query**: Open a database session and execute the query verbatim
//! 3. **Write**: Stream rows into `rprt_{name}{YYYYMMDD}.csv` under a header row
//! 4. **Archive**: Compress the file into a single-entry `.tar.gz`
//! 5. **Clean Up**: Remove the uncompressed file
//! 6. **Upload**: Deliver the archive over SFTP
//! 7. **Report**: Log the run summary
//!
//! # Example
//!
//! ```rust,no_run
//! use reporter::adapters::postgresql::PostgresConnector;
//! use reporter::adapters::sftp::SftpConnector;
//! use reporter::config::load_config;
//! use reporter::core::report::ReportRunner;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("reporter.toml")?;
//!
//! let database = Arc::new(PostgresConnector::new(&config.database)?);
//! let transfer = Arc::new(SftpConnector::new(&config.transfer));
//! let runner = ReportRunner::new(config, database, transfer);
//!
//! let summary = runner.run_all(chrono::Local::now().date_naive()).await;
//! println!("Succeeded: {}", summary.succeeded());
//! println!("Failed: {}", summary.failed());
//! # Ok(())
//! # }
//! ```

pub mod report;
