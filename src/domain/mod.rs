//! Domain models and types for the reporter.
//!
//! The domain layer provides:
//! - **Report model** ([`ReportName`], [`ReportJob`], [`JobStage`])
//! - **Error types** ([`ReporterError`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use reporter::domain::{ReportJob, ReportName};
//! use chrono::NaiveDate;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let job = ReportJob::new(
//!     ReportName::new("sv")?,
//!     NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
//!     Path::new("sql"),
//!     Path::new("reports"),
//!     "./reports",
//! );
//! assert_eq!(job.file_stem(), "rprt_sv20190101");
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod report;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::ReporterError;
pub use report::{JobStage, ReportJob, ReportName};
pub use result::Result;
