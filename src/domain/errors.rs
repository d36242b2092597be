//! Domain error types
//!
//! This module defines the error hierarchy for the reporter.
//! All errors are domain-specific and don't expose third-party types.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed underlying cause carried by adapter errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main reporter error type
///
/// Every failure inside a report job is expressed as one of these variants so the
/// job boundary can log it and move on to the next report.
#[derive(Debug, Error)]
pub enum ReporterError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The query resource for a report does not exist
    #[error("Query resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    /// The query resource exists but could not be read
    #[error("Failed to read query resource {}: {source}", path.display())]
    ResourceRead {
        /// Path of the query resource
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Database or transfer endpoint unreachable, or authentication failed
    #[error("Connection error: {message}")]
    Connection {
        /// What was being attempted
        message: String,
        /// Driver or transport error, when there is one
        #[source]
        source: Option<BoxError>,
    },

    /// Malformed query or database-side failure while executing or fetching
    #[error("Query execution error: {message}")]
    QueryExecution {
        /// What was being attempted
        message: String,
        /// Driver error, when there is one
        #[source]
        source: Option<BoxError>,
    },

    /// Write or delete of a local tabular or archive file failed
    #[error("Local I/O error on {}: {source}", path.display())]
    LocalIo {
        /// Path of the local artifact
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Archive creation failed
    #[error("Archive error: {message}")]
    Archive {
        /// What was being attempted
        message: String,
        /// Underlying I/O error, when there is one
        #[source]
        source: Option<BoxError>,
    },

    /// Upload to the remote endpoint failed
    #[error("Transfer error: {message}")]
    Transfer {
        /// What was being attempted
        message: String,
        /// Transport error, when there is one
        #[source]
        source: Option<BoxError>,
    },
}

impl ReporterError {
    /// Wraps an I/O error raised while touching a local artifact
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReporterError::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Connection failure without an underlying cause
    pub fn connection(message: impl Into<String>) -> Self {
        ReporterError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Query failure without an underlying cause
    pub fn query(message: impl Into<String>) -> Self {
        ReporterError::QueryExecution {
            message: message.into(),
            source: None,
        }
    }

    /// Archive failure without an underlying cause
    pub fn archive(message: impl Into<String>) -> Self {
        ReporterError::Archive {
            message: message.into(),
            source: None,
        }
    }

    /// Transfer failure without an underlying cause
    pub fn transfer(message: impl Into<String>) -> Self {
        ReporterError::Transfer {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause to a connection, query, archive or
    /// transfer error
    ///
    /// The other variants already own their cause and are returned unchanged.
    ///
    /// ```
    /// use reporter::domain::ReporterError;
    ///
    /// let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
    /// let err = ReporterError::connection("Failed to reach files:22").with_source(io);
    /// assert!(err.diagnostic().ends_with("caused by: refused"));
    /// ```
    pub fn with_source(self, cause: impl Into<BoxError>) -> Self {
        let cause = Some(cause.into());
        match self {
            ReporterError::Connection { message, .. } => ReporterError::Connection {
                message,
                source: cause,
            },
            ReporterError::QueryExecution { message, .. } => ReporterError::QueryExecution {
                message,
                source: cause,
            },
            ReporterError::Archive { message, .. } => ReporterError::Archive {
                message,
                source: cause,
            },
            ReporterError::Transfer { message, .. } => ReporterError::Transfer {
                message,
                source: cause,
            },
            other => other,
        }
    }

    /// Renders the error followed by its full `source()` chain, one cause per line
    ///
    /// A cause whose text already ends the previous line is not repeated.
    pub fn diagnostic(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !out.ends_with(&text) {
                out.push_str("\n  caused by: ");
                out.push_str(&text);
            }
            source = cause.source();
        }
        out
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ReporterError {
    fn from(err: toml::de::Error) -> Self {
        ReporterError::Configuration(format!("TOML parse error: {err}"))
    }
}
