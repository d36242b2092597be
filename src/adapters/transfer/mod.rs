//! Remote transfer abstraction
//!
//! A transfer session is opened after the archive exists and closed right after
//! the upload, so it never sits idle while a slow query runs.

use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;

/// Opens transfer sessions to the configured endpoint
#[async_trait]
pub trait TransferConnector: Send + Sync {
    /// Connect and authenticate
    ///
    /// # Errors
    ///
    /// Returns `ReporterError::Connection` if the endpoint is unreachable or
    /// authentication fails.
    async fn connect(&self) -> Result<Box<dyn TransferSession>>;

    /// `host:port` of the endpoint, for log records
    fn describe(&self) -> String;
}

/// An authenticated transfer session
#[async_trait]
pub trait TransferSession: Send {
    /// Upload `local` to `remote`, replacing any existing file
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `ReporterError::Transfer` if the remote write fails.
    async fn put(&mut self, local: &Path, remote: &str) -> Result<u64>;

    /// Close the session
    async fn close(self: Box<Self>) -> Result<()>;
}
