//! Report runner - drives each configured report through the pipeline
//!
//! A job reads its query, streams the result into a local tabular file,
//! compresses it, removes the uncompressed file and uploads the archive. Every
//! job is its own failure boundary: an error is logged with the stage it
//! happened in and the runner moves on to the next report.

use crate::adapters::database::{DatabaseConnector, DatabaseSession};
use crate::adapters::transfer::TransferConnector;
use crate::config::ReporterConfig;
use crate::core::report::archive::create_archive;
use crate::core::report::summary::{JobOutcome, RunSummary};
use crate::core::report::tabular::{TabularOptions, TabularWriter};
use crate::domain::{JobStage, ReportJob, ReportName, ReporterError, Result};
use crate::{log_job_failure, log_milestone};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Report runner
pub struct ReportRunner {
    config: ReporterConfig,
    database: Arc<dyn DatabaseConnector>,
    transfer: Arc<dyn TransferConnector>,
    query_dir: PathBuf,
    output_dir: PathBuf,
    options: TabularOptions,
}

impl ReportRunner {
    /// Create a new report runner
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `database` - Opens one database session per job
    /// * `transfer` - Opens one transfer session per job
    pub fn new(
        config: ReporterConfig,
        database: Arc<dyn DatabaseConnector>,
        transfer: Arc<dyn TransferConnector>,
    ) -> Self {
        let query_dir = config.query_dir();
        let output_dir = config.output_dir();
        let options = TabularOptions::from(&config.output);

        Self {
            config,
            database,
            transfer,
            query_dir,
            output_dir,
            options,
        }
    }

    /// Run every configured report once, in configured order
    ///
    /// Never short-circuits: a failed report is recorded and the next one
    /// still runs.
    pub async fn run_all(&self, run_date: NaiveDate) -> RunSummary {
        let start_time = Instant::now();
        let mut summary = RunSummary::new();

        tracing::info!(
            reports = self.config.reports.names.len(),
            run_date = %run_date,
            database = %self.database.describe(),
            endpoint = %self.transfer.describe(),
            "Starting report run"
        );

        for name in &self.config.reports.names {
            summary.push(self.run_job(name, run_date).await);
        }

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        summary
    }

    /// Run a single report job
    ///
    /// The returned outcome is informational; errors are logged here and do
    /// not propagate.
    pub async fn run_job(&self, name: &ReportName, run_date: NaiveDate) -> JobOutcome {
        let start_time = Instant::now();
        let job = ReportJob::new(
            name.clone(),
            run_date,
            &self.query_dir,
            &self.output_dir,
            &self.config.transfer.destination_root,
        );
        let mut outcome = JobOutcome::new(name.clone());

        log_milestone!(name, JobStage::Pending, file_stem = job.file_stem(), "Starting report job");

        match self.execute(&job, &mut outcome).await {
            Ok(()) => {
                let outcome = outcome.succeed(start_time.elapsed());
                log_milestone!(
                    name,
                    JobStage::Done,
                    rows = outcome.rows.unwrap_or_default(),
                    duration_ms = outcome.duration.as_millis() as u64,
                    "Report generated and delivered successfully"
                );
                outcome
            }
            Err(error) => {
                let stage = outcome.stage;
                log_job_failure!(name, stage, &error);
                outcome.fail(stage, &error, start_time.elapsed())
            }
        }
    }

    async fn execute(&self, job: &ReportJob, outcome: &mut JobOutcome) -> Result<()> {
        let report = job.name();

        outcome.advance(JobStage::ReadingQuery);
        log_milestone!(
            report,
            JobStage::ReadingQuery,
            path = %job.query_path().display(),
            "Reading query file"
        );
        let query = read_query(job.query_path()).await?;
        log_milestone!(report, JobStage::ReadingQuery, query = %query, "Got query");

        outcome.advance(JobStage::Querying);
        let mut session = self.database.connect().await?;
        log_milestone!(
            report,
            JobStage::Querying,
            database = %self.database.describe(),
            "Database session opened"
        );
        let rows = self
            .write_result(job, session.as_mut(), &query, outcome)
            .await?;
        session.close().await?;
        outcome.rows = Some(rows);
        log_milestone!(
            report,
            JobStage::WritingLocal,
            rows,
            path = %job.tabular_path().display(),
            "Tabular file written"
        );

        outcome.advance(JobStage::Archiving);
        log_milestone!(
            report,
            JobStage::Archiving,
            path = %job.archive_path().display(),
            "Compressing tabular file"
        );
        let archive = create_archive(job.tabular_path(), job.archive_path()).await?;
        log_milestone!(
            report,
            JobStage::Archiving,
            bytes = archive.bytes,
            checksum = %archive.sha256,
            "Archive created"
        );
        outcome.archive_bytes = Some(archive.bytes);
        outcome.checksum = Some(archive.sha256);

        outcome.advance(JobStage::CleaningUp);
        tokio::fs::remove_file(job.tabular_path())
            .await
            .map_err(|e| ReporterError::local_io(job.tabular_path(), e))?;
        log_milestone!(
            report,
            JobStage::CleaningUp,
            path = %job.tabular_path().display(),
            "Tabular file removed"
        );

        outcome.advance(JobStage::Uploading);
        log_milestone!(
            report,
            JobStage::Uploading,
            destination = job.remote_path(),
            endpoint = %self.transfer.describe(),
            "Uploading archive"
        );
        let mut transfer = self.transfer.connect().await?;
        let bytes = transfer.put(job.archive_path(), job.remote_path()).await?;
        transfer.close().await?;
        log_milestone!(
            report,
            JobStage::Uploading,
            bytes,
            destination = job.remote_path(),
            "Archive uploaded"
        );

        Ok(())
    }

    /// Execute the query and stream its result into the tabular file
    ///
    /// The cursor borrows the session and is dropped before returning, so the
    /// caller can close the session before archiving.
    async fn write_result(
        &self,
        job: &ReportJob,
        session: &mut dyn DatabaseSession,
        query: &str,
        outcome: &mut JobOutcome,
    ) -> Result<u64> {
        let report = job.name();
        let fetch_size = self.config.database.fetch_size;

        let mut cursor = session.execute(query, fetch_size).await?;
        log_milestone!(
            report,
            JobStage::Querying,
            columns = cursor.columns().len(),
            fetch_size,
            "Query has been executed"
        );

        outcome.advance(JobStage::WritingLocal);
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ReporterError::local_io(&self.output_dir, e))?;

        let mut writer = TabularWriter::create(job.tabular_path(), self.options)?;
        writer.write_header(cursor.columns())?;
        while let Some(batch) = cursor.next_batch().await? {
            for row in &batch {
                writer.write_row(row)?;
            }
            tracing::debug!(report = %report, rows = writer.rows(), "Batch written");
        }
        drop(cursor);

        writer.finish()
    }
}

/// Read the whole query resource
async fn read_query(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ReporterError::ResourceNotFound(path.to_path_buf())
        } else {
            ReporterError::ResourceRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}
