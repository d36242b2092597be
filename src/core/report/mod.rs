//! Report pipeline
//!
//! - [`runner`] - Per-report job loop with failure isolation
//! - [`tabular`] - Delimited text writer for query results
//! - [`archive`] - Single-entry tar.gz archives with checksums
//! - [`summary`] - Job outcomes and the run summary

pub mod archive;
pub mod runner;
pub mod summary;
pub mod tabular;

pub use archive::{create_archive, ArchiveInfo};
pub use runner::ReportRunner;
pub use summary::{JobOutcome, RunSummary};
pub use tabular::{TabularOptions, TabularWriter};
