//! PostgreSQL client implementation
//!
//! Every report job gets its own connection. The query runs inside a read
//! transaction behind a server-side cursor, and rows are pulled `fetch_size`
//! at a time with `FETCH` over the simple query protocol, so every value
//! arrives in PostgreSQL's own text output format.

use super::values::{declare_statement, fetch_statement, query_body, rows_from_messages};
use crate::adapters::database::{DatabaseConnector, DatabaseSession, RowCursor, TextRow};
use crate::config::DatabaseConfig;
use crate::domain::{ReporterError, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::config::{Host, SslMode};
use tokio_postgres::{Client, NoTls, Transaction};

/// Opens PostgreSQL sessions for report jobs
pub struct PostgresConnector {
    pg_config: tokio_postgres::Config,
    use_tls: bool,
    statement_timeout_seconds: u64,
}

impl PostgresConnector {
    /// Create a connector from configuration
    ///
    /// Nothing is opened here; the connection string is only parsed.
    ///
    /// # Errors
    ///
    /// Returns `ReporterError::Configuration` if the connection string or SSL
    /// mode is invalid.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                ReporterError::Configuration(format!(
                    "Invalid PostgreSQL connection string: {}",
                    e
                ))
            })?;

        pg_config.application_name(&config.application_name);
        pg_config.ssl_mode(parse_ssl_mode(&config.ssl_mode)?);
        if config.connect_timeout_seconds > 0 {
            pg_config.connect_timeout(Duration::from_secs(config.connect_timeout_seconds));
        }

        Ok(Self {
            pg_config,
            use_tls: config.ssl_mode != "disable",
            statement_timeout_seconds: config.statement_timeout_seconds,
        })
    }

    /// Connection target without credentials
    pub fn connection_string_safe(&self) -> String {
        let hosts: Vec<String> = self
            .pg_config
            .get_hosts()
            .iter()
            .map(|host| match host {
                Host::Tcp(name) => name.clone(),
                #[cfg(unix)]
                Host::Unix(path) => path.display().to_string(),
            })
            .collect();
        let port = self.pg_config.get_ports().first().copied().unwrap_or(5432);
        let dbname = self.pg_config.get_dbname().unwrap_or_default();

        format!("postgresql://***@{}:{}/{}", hosts.join(","), port, dbname)
    }

    async fn open_client(&self) -> Result<(Client, JoinHandle<()>)> {
        if self.use_tls {
            let connector = native_tls::TlsConnector::builder().build().map_err(|e| {
                ReporterError::connection("Failed to build TLS connector").with_source(e)
            })?;
            let tls = postgres_native_tls::MakeTlsConnector::new(connector);
            let (client, connection) = self
                .pg_config
                .connect(tls)
                .await
                .map_err(|e| connection_error(&self.connection_string_safe(), e))?;
            Ok((client, drive_connection(connection)))
        } else {
            let (client, connection) = self
                .pg_config
                .connect(NoTls)
                .await
                .map_err(|e| connection_error(&self.connection_string_safe(), e))?;
            Ok((client, drive_connection(connection)))
        }
    }
}

#[async_trait]
impl DatabaseConnector for PostgresConnector {
    async fn connect(&self) -> Result<Box<dyn DatabaseSession>> {
        let (client, connection) = self.open_client().await?;

        if self.statement_timeout_seconds > 0 {
            let timeout_query = format!(
                "SET statement_timeout = {}",
                self.statement_timeout_seconds * 1000
            );
            client.batch_execute(&timeout_query).await.map_err(|e| {
                ReporterError::connection("Failed to set statement timeout").with_source(e)
            })?;
        }

        tracing::debug!(target_db = %self.connection_string_safe(), "PostgreSQL session opened");

        Ok(Box::new(PostgresSession { client, connection }))
    }

    fn describe(&self) -> String {
        self.connection_string_safe()
    }
}

/// A single PostgreSQL connection owned by one job
struct PostgresSession {
    client: Client,
    connection: JoinHandle<()>,
}

#[async_trait]
impl DatabaseSession for PostgresSession {
    async fn execute<'s>(
        &'s mut self,
        query: &'s str,
        fetch_size: u32,
    ) -> Result<Box<dyn RowCursor + 's>> {
        let transaction = self.client.transaction().await.map_err(|e| {
            ReporterError::query("Failed to open transaction").with_source(e)
        })?;

        // column names come from the statement description, so they are
        // known even when the result is empty
        let body = query_body(query);
        let statement = transaction
            .prepare(body)
            .await
            .map_err(|e| ReporterError::query("Failed to prepare query").with_source(e))?;
        let columns = statement
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect();
        drop(statement);

        transaction
            .batch_execute(&declare_statement(body))
            .await
            .map_err(|e| ReporterError::query("Failed to open result cursor").with_source(e))?;

        let fetch_size = fetch_size.max(1);
        Ok(Box::new(PostgresCursor {
            transaction,
            fetch: fetch_statement(fetch_size),
            columns,
            fetch_size: fetch_size as usize,
            exhausted: false,
        }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let PostgresSession { client, connection } = *self;
        drop(client);
        connection.await.map_err(|e| {
            ReporterError::connection("PostgreSQL connection task failed").with_source(e)
        })
    }
}

/// Server-side cursor; the transaction rolls back when dropped
struct PostgresCursor<'s> {
    transaction: Transaction<'s>,
    fetch: String,
    columns: Vec<String>,
    fetch_size: usize,
    exhausted: bool,
}

#[async_trait]
impl<'s> RowCursor for PostgresCursor<'s> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_batch(&mut self) -> Result<Option<Vec<TextRow>>> {
        if self.exhausted {
            return Ok(None);
        }

        let messages = self
            .transaction
            .simple_query(&self.fetch)
            .await
            .map_err(|e| ReporterError::query("Failed to fetch rows").with_source(e))?;
        let rows = rows_from_messages(messages)?;

        if rows.len() < self.fetch_size {
            self.exhausted = true;
        }
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows))
    }
}

fn drive_connection<F>(connection: F) -> JoinHandle<()>
where
    F: Future<Output = std::result::Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(error = %e, "PostgreSQL connection closed with error");
        }
    })
}

fn parse_ssl_mode(mode: &str) -> Result<SslMode> {
    match mode {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        other => Err(ReporterError::Configuration(format!(
            "Invalid ssl_mode '{}'. Must be one of: disable, prefer, require",
            other
        ))),
    }
}

fn connection_error(target: &str, error: tokio_postgres::Error) -> ReporterError {
    ReporterError::connection(format!("Failed to connect to {}", target)).with_source(error)
}
