//! Run summary and reporting
//!
//! This module defines structures for recording job outcomes and logging the
//! end-of-run summary.

use crate::domain::{JobStage, ReportName, ReporterError};
use std::time::Duration;

/// Outcome of a single report job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Report name
    pub report: ReportName,

    /// Terminal stage (`Done` or `Failed`)
    pub stage: JobStage,

    /// Stage in which the job failed
    pub failed_at: Option<JobStage>,

    /// Diagnostic message (error plus source chain)
    pub error: Option<String>,

    /// Data rows written to the tabular file
    pub rows: Option<u64>,

    /// Size of the archive in bytes
    pub archive_bytes: Option<u64>,

    /// SHA-256 of the archive, hex encoded
    pub checksum: Option<String>,

    /// Wall time spent on the job
    pub duration: Duration,
}

impl JobOutcome {
    /// Create an outcome for a job that has not finished yet
    pub fn new(report: ReportName) -> Self {
        Self {
            report,
            stage: JobStage::Pending,
            failed_at: None,
            error: None,
            rows: None,
            archive_bytes: None,
            checksum: None,
            duration: Duration::ZERO,
        }
    }

    /// Record that the job entered `stage`
    pub fn advance(&mut self, stage: JobStage) {
        debug_assert!(!self.stage.is_terminal());
        self.stage = stage;
    }

    /// Mark the job as completed
    pub fn succeed(mut self, duration: Duration) -> Self {
        self.stage = JobStage::Done;
        self.duration = duration;
        self
    }

    /// Mark the job as failed in `stage`
    pub fn fail(mut self, stage: JobStage, error: &ReporterError, duration: Duration) -> Self {
        self.stage = JobStage::Failed;
        self.failed_at = Some(stage);
        self.error = Some(error.diagnostic());
        self.duration = duration;
        self
    }

    /// Check if the job reached `Done`
    pub fn is_success(&self) -> bool {
        self.stage == JobStage::Done
    }
}

/// Summary of one run over the configured reports
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Job outcomes in execution order
    pub outcomes: Vec<JobOutcome>,

    /// Duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Create a new empty run summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a job outcome
    pub fn push(&mut self, outcome: JobOutcome) {
        self.outcomes.push(outcome);
    }

    /// Number of jobs that completed
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of jobs that failed
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Check if every job completed
    pub fn is_successful(&self) -> bool {
        self.failed() == 0
    }

    /// Total data rows written across all jobs
    pub fn total_rows(&self) -> u64 {
        self.outcomes.iter().filter_map(|o| o.rows).sum()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total = self.outcomes.len(),
            succeeded = self.succeeded(),
            failed = self.failed(),
            rows = self.total_rows(),
            duration_secs = self.duration.as_secs(),
            "Report run completed"
        );

        for outcome in self.outcomes.iter().filter(|o| !o.is_success()) {
            tracing::warn!(
                report = %outcome.report,
                stage = %outcome.failed_at.unwrap_or(JobStage::Failed),
                message = outcome.error.as_deref().unwrap_or_default(),
                "Report failed"
            );
        }
    }
}
