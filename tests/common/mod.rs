//! In-memory database and transfer doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use reporter::adapters::database::{DatabaseConnector, DatabaseSession, RowCursor, TextRow};
use reporter::adapters::transfer::{TransferConnector, TransferSession};
use reporter::config::ReporterConfig;
use reporter::domain::{ReportName, ReporterError, Result};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
}

pub fn row(values: &[Option<&str>]) -> TextRow {
    values.iter().map(|v| v.map(str::to_string)).collect()
}

/// Temp home directory with `sql/` populated from `(report, query)` pairs
pub fn home_with_queries(queries: &[(&str, &str)]) -> TempDir {
    let home = TempDir::new().unwrap();
    let sql_dir = home.path().join("sql");
    std::fs::create_dir_all(&sql_dir).unwrap();
    for (name, query) in queries {
        std::fs::write(sql_dir.join(format!("{name}.sql")), query).unwrap();
    }
    home
}

pub fn config_for(home: &Path, names: &[&str], fetch_size: u32) -> ReporterConfig {
    let mut config = ReporterConfig::default();
    config.application.home_dir = home.to_path_buf();
    config.reports.names = names.iter().map(|n| ReportName::new(*n).unwrap()).collect();
    config.database.fetch_size = fetch_size;
    config
}

/// Canned answer for one query text
#[derive(Clone)]
pub enum QueryResult {
    Rows {
        columns: Vec<String>,
        rows: Vec<TextRow>,
    },
    /// Execution succeeds, then fetching fails once `rows` are delivered
    FailAfter {
        columns: Vec<String>,
        rows: Vec<TextRow>,
        message: String,
    },
    Fail(String),
}

impl QueryResult {
    pub fn rows(columns: &[&str], rows: Vec<TextRow>) -> Self {
        QueryResult::Rows {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn fail_after(columns: &[&str], rows: Vec<TextRow>, message: &str) -> Self {
        QueryResult::FailAfter {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            message: message.to_string(),
        }
    }
}

/// Called when a cursor reports the end of its result
pub type ExhaustedHook = Arc<dyn Fn() + Send + Sync>;

/// Database double answering by exact query text
#[derive(Clone, Default)]
pub struct MockDatabase {
    results: Arc<HashMap<String, QueryResult>>,
    refuse_connections: bool,
    on_exhausted: Option<ExhaustedHook>,
    pub events: Arc<Mutex<Vec<String>>>,
    released: Arc<AtomicUsize>,
}

impl MockDatabase {
    pub fn new(results: Vec<(&str, QueryResult)>) -> Self {
        Self {
            results: Arc::new(
                results
                    .into_iter()
                    .map(|(query, result)| (query.to_string(), result))
                    .collect(),
            ),
            refuse_connections: false,
            on_exhausted: None,
            events: Arc::default(),
            released: Arc::default(),
        }
    }

    /// Runs `hook` every time a cursor of this database is exhausted
    pub fn on_exhausted(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_exhausted = Some(Arc::new(hook));
        self
    }

    pub fn unreachable() -> Self {
        Self {
            refuse_connections: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Sessions dropped so far, whether closed or abandoned
    pub fn sessions_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseConnector for MockDatabase {
    async fn connect(&self) -> Result<Box<dyn DatabaseSession>> {
        self.events.lock().unwrap().push("connect".to_string());
        if self.refuse_connections {
            return Err(ReporterError::connection("database is down"));
        }
        Ok(Box::new(MockSession {
            results: Arc::clone(&self.results),
            on_exhausted: self.on_exhausted.clone(),
            events: Arc::clone(&self.events),
            released: Arc::clone(&self.released),
        }))
    }

    fn describe(&self) -> String {
        "postgresql://***@mock:5432/test".to_string()
    }
}

struct MockSession {
    results: Arc<HashMap<String, QueryResult>>,
    on_exhausted: Option<ExhaustedHook>,
    events: Arc<Mutex<Vec<String>>>,
    released: Arc<AtomicUsize>,
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DatabaseSession for MockSession {
    async fn execute<'s>(
        &'s mut self,
        query: &'s str,
        fetch_size: u32,
    ) -> Result<Box<dyn RowCursor + 's>> {
        self.events
            .lock()
            .unwrap()
            .push(format!("execute:{}", query.trim()));
        let (columns, rows, failure) = match self.results.get(query.trim()) {
            Some(QueryResult::Rows { columns, rows }) => (columns, rows, None),
            Some(QueryResult::FailAfter {
                columns,
                rows,
                message,
            }) => (columns, rows, Some(message.clone())),
            Some(QueryResult::Fail(message)) => {
                return Err(ReporterError::query(message.clone()));
            }
            None => {
                return Err(ReporterError::query(format!(
                    "relation for query '{}' does not exist",
                    query.trim()
                )));
            }
        };
        Ok(Box::new(MockCursor {
            columns: columns.clone(),
            rows: rows.iter().cloned().collect(),
            fetch_size: fetch_size as usize,
            failure,
            on_exhausted: self.on_exhausted.clone(),
            events: Arc::clone(&self.events),
        }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.events.lock().unwrap().push("close".to_string());
        Ok(())
    }
}

struct MockCursor {
    columns: Vec<String>,
    rows: VecDeque<TextRow>,
    fetch_size: usize,
    failure: Option<String>,
    on_exhausted: Option<ExhaustedHook>,
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl RowCursor for MockCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_batch(&mut self) -> Result<Option<Vec<TextRow>>> {
        if self.rows.is_empty() {
            if let Some(message) = &self.failure {
                return Err(ReporterError::query(message.clone()));
            }
            if let Some(hook) = &self.on_exhausted {
                hook();
            }
            return Ok(None);
        }
        let take = self.fetch_size.min(self.rows.len());
        let batch: Vec<TextRow> = self.rows.drain(..take).collect();
        self.events
            .lock()
            .unwrap()
            .push(format!("batch:{}", batch.len()));
        Ok(Some(batch))
    }
}

/// One recorded upload: remote path and the bytes that were sent
#[derive(Debug, Clone)]
pub struct Upload {
    pub remote: String,
    pub content: Vec<u8>,
}

/// Transfer double recording uploads in memory
#[derive(Clone, Default)]
pub struct MockTransfer {
    refuse_connections: bool,
    reject_uploads: bool,
    pub uploads: Arc<Mutex<Vec<Upload>>>,
    pub sessions_closed: Arc<Mutex<usize>>,
}

impl MockTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            reject_uploads: true,
            ..Self::default()
        }
    }

    /// Fails every `connect`, as a server rejecting the credentials would
    pub fn refusing() -> Self {
        Self {
            refuse_connections: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferConnector for MockTransfer {
    async fn connect(&self) -> Result<Box<dyn TransferSession>> {
        if self.refuse_connections {
            return Err(ReporterError::connection(
                "Authentication as 'reports' on mock-sftp:22 failed",
            )
            .with_source("Username/PublicKey combination invalid"));
        }
        Ok(Box::new(self.clone()))
    }

    fn describe(&self) -> String {
        "mock-sftp:22".to_string()
    }
}

#[async_trait]
impl TransferSession for MockTransfer {
    async fn put(&mut self, local: &Path, remote: &str) -> Result<u64> {
        if self.reject_uploads {
            return Err(ReporterError::transfer(format!(
                "Failed to create remote file {remote}"
            ))
            .with_source("permission denied"));
        }
        let content = std::fs::read(local).map_err(|e| ReporterError::local_io(local, e))?;
        let bytes = content.len() as u64;
        self.uploads.lock().unwrap().push(Upload {
            remote: remote.to_string(),
            content,
        });
        Ok(bytes)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        *self.sessions_closed.lock().unwrap() += 1;
        Ok(())
    }
}
