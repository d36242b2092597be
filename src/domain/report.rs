//! Report job model
//!
//! A [`ReportJob`] is built at the start of every loop iteration from the report
//! name, the run date and the configured directories. It carries every path the
//! pipeline touches so the runner never has to derive names on its own.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix shared by every generated file name
pub const FILE_PREFIX: &str = "rprt_";

/// Extension of the query resource
pub const QUERY_EXTENSION: &str = "sql";

/// Extension of the tabular output file
pub const TABULAR_EXTENSION: &str = "csv";

/// Extension of the archive file
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// Report name newtype wrapper
///
/// Selects the query resource (`{name}.sql`) and the output naming. Because the
/// name becomes part of local and remote file names it may not contain path
/// separators.
///
/// # Examples
///
/// ```
/// use reporter::domain::report::ReportName;
/// use std::str::FromStr;
///
/// let name = ReportName::from_str("sv").unwrap();
/// assert_eq!(name.as_str(), "sv");
/// assert!(ReportName::from_str("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportName(String);

impl ReportName {
    /// Creates a new ReportName from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(ReportName)` if the name is valid, `Err` otherwise
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Report name cannot be empty".to_string());
        }
        if name.contains('/') || name.contains('\\') {
            return Err(format!(
                "Report name '{name}' cannot contain path separators"
            ));
        }
        if name == "." || name == ".." {
            return Err(format!("Report name '{name}' is not a valid file name"));
        }
        Ok(Self(name))
    }

    /// Returns the report name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReportName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ReportName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ReportName> for String {
    fn from(name: ReportName) -> Self {
        name.0
    }
}

impl AsRef<str> for ReportName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stage of a single report job
///
/// Jobs move forward through the stages in declaration order. `Failed` can be
/// entered from any non-terminal stage; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Job built, nothing done yet
    Pending,
    /// Reading the query resource
    ReadingQuery,
    /// Connecting to the database and executing the query
    Querying,
    /// Streaming rows into the tabular file
    WritingLocal,
    /// Compressing the tabular file
    Archiving,
    /// Removing the tabular file
    CleaningUp,
    /// Delivering the archive to the remote endpoint
    Uploading,
    /// All steps succeeded
    Done,
    /// A step failed
    Failed,
}

impl JobStage {
    /// Returns true for `Done` and `Failed`
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStage::Done | JobStage::Failed)
    }

    /// Returns the stage label used in log records
    pub fn as_str(self) -> &'static str {
        match self {
            JobStage::Pending => "pending",
            JobStage::ReadingQuery => "reading_query",
            JobStage::Querying => "querying",
            JobStage::WritingLocal => "writing_local",
            JobStage::Archiving => "archiving",
            JobStage::CleaningUp => "cleaning_up",
            JobStage::Uploading => "uploading",
            JobStage::Done => "done",
            JobStage::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One full pass of the pipeline for a single report name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportJob {
    name: ReportName,
    file_stem: String,
    query_path: PathBuf,
    tabular_path: PathBuf,
    archive_path: PathBuf,
    remote_path: String,
}

impl ReportJob {
    /// Builds the job for `name` on `run_date`
    ///
    /// # Arguments
    ///
    /// * `name` - Report name
    /// * `run_date` - Calendar date embedded in the output file names
    /// * `query_dir` - Directory holding `{name}.sql`
    /// * `output_dir` - Directory receiving the tabular and archive files
    /// * `destination_root` - Remote directory receiving the archive
    pub fn new(
        name: ReportName,
        run_date: NaiveDate,
        query_dir: &Path,
        output_dir: &Path,
        destination_root: &str,
    ) -> Self {
        let file_stem = Self::file_stem_for(&name, run_date);
        let query_path = query_dir.join(format!("{}.{QUERY_EXTENSION}", name.as_str()));
        let tabular_path = output_dir.join(format!("{file_stem}.{TABULAR_EXTENSION}"));
        let archive_name = format!("{file_stem}.{ARCHIVE_EXTENSION}");
        let archive_path = output_dir.join(&archive_name);
        let remote_path = remote_join(destination_root, &archive_name);

        Self {
            name,
            file_stem,
            query_path,
            tabular_path,
            archive_path,
            remote_path,
        }
    }

    /// Computes `rprt_{name}{YYYYMMDD}`
    ///
    /// Two runs on the same date with the same name yield the same stem.
    pub fn file_stem_for(name: &ReportName, run_date: NaiveDate) -> String {
        format!("{FILE_PREFIX}{}{}", name.as_str(), run_date.format("%Y%m%d"))
    }

    /// Report name
    pub fn name(&self) -> &ReportName {
        &self.name
    }

    /// File-name stem shared by the tabular and archive files
    pub fn file_stem(&self) -> &str {
        &self.file_stem
    }

    /// Path of the query resource
    pub fn query_path(&self) -> &Path {
        &self.query_path
    }

    /// Path of the local tabular file
    pub fn tabular_path(&self) -> &Path {
        &self.tabular_path
    }

    /// Path of the local archive file
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Remote destination of the archive
    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }
}

/// Joins a remote directory and a file name with `/`, whatever the local OS
fn remote_join(root: &str, file_name: &str) -> String {
    if root.is_empty() {
        return file_name.to_string();
    }
    format!("{}/{}", root.trim_end_matches('/'), file_name)
}
