//! Database abstraction traits
//!
//! The report runner only needs three things from a database: open a session,
//! execute a query verbatim and walk the result in batches. Values arrive
//! already rendered as text so the runner never sees driver types.

use crate::domain::Result;
use async_trait::async_trait;

/// One result row: column values in result order, `None` for SQL NULL
pub type TextRow = Vec<Option<String>>;

/// Opens database sessions
///
/// A fresh session is opened for every report job and never shared.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    /// Open a new session
    ///
    /// # Errors
    ///
    /// Returns `ReporterError::Connection` if the database is unreachable or
    /// rejects the credentials.
    async fn connect(&self) -> Result<Box<dyn DatabaseSession>>;

    /// Human-readable target for log records (credentials redacted)
    fn describe(&self) -> String;
}

/// An open database session
///
/// Dropping the session releases it; [`DatabaseSession::close`] does the same
/// and waits for the release to finish.
#[async_trait]
pub trait DatabaseSession: Send {
    /// Execute `query` verbatim and return a cursor over its result
    ///
    /// # Arguments
    ///
    /// * `query` - Query text, no parameters
    /// * `fetch_size` - Rows fetched per round trip
    ///
    /// # Errors
    ///
    /// Returns `ReporterError::QueryExecution` if the database rejects the query.
    async fn execute<'s>(
        &'s mut self,
        query: &'s str,
        fetch_size: u32,
    ) -> Result<Box<dyn RowCursor + 's>>;

    /// Close the session
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Forward-only cursor over a query result
#[async_trait]
pub trait RowCursor: Send {
    /// Ordered column names, available before any row is fetched
    fn columns(&self) -> &[String];

    /// Fetch the next batch of at most `fetch_size` rows
    ///
    /// Returns `Ok(None)` once the result is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `ReporterError::QueryExecution` if fetching fails.
    async fn next_batch(&mut self) -> Result<Option<Vec<TextRow>>>;
}
