//! SFTP client implementation

use crate::adapters::transfer::{TransferConnector, TransferSession};
use crate::config::TransferConfig;
use crate::domain::{ReporterError, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use ssh2::{Session, Sftp};
use std::fs::File;
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Opens password-authenticated SFTP sessions
pub struct SftpConnector {
    config: TransferConfig,
}

impl SftpConnector {
    /// Create a connector; no network activity happens until [`connect`]
    ///
    /// [`connect`]: TransferConnector::connect
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl TransferConnector for SftpConnector {
    async fn connect(&self) -> Result<Box<dyn TransferSession>> {
        let config = self.config.clone();
        let inner = tokio::task::spawn_blocking(move || SftpInner::open(&config))
            .await
            .map_err(|e| ReporterError::connection("SFTP connect task failed").with_source(e))??;

        tracing::debug!(endpoint = %self.config.endpoint(), "SFTP session opened");

        Ok(Box::new(SftpSession { inner: Some(inner) }))
    }

    fn describe(&self) -> String {
        self.config.endpoint()
    }
}

/// Blocking half of the session, moved in and out of the blocking pool
struct SftpInner {
    session: Session,
    sftp: Sftp,
}

impl SftpInner {
    fn open(config: &TransferConfig) -> Result<Self> {
        let endpoint = config.endpoint();
        let timeout = (config.timeout_seconds > 0)
            .then(|| Duration::from_secs(config.timeout_seconds));
        let tcp = connect_tcp(&config.host, config.port, timeout).map_err(|e| {
            ReporterError::connection(format!("Failed to reach {}", endpoint)).with_source(e)
        })?;

        let mut session = Session::new()
            .map_err(|e| ReporterError::connection("Failed to create SSH session").with_source(e))?;
        session.set_tcp_stream(tcp);
        if let Some(timeout) = timeout {
            session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        }

        session.handshake().map_err(|e| {
            ReporterError::connection(format!("SSH handshake with {} failed", endpoint))
                .with_source(e)
        })?;
        session
            .userauth_password(&config.username, config.password.expose_secret().as_ref())
            .map_err(|e| {
                ReporterError::connection(format!(
                    "Authentication as '{}' on {} failed",
                    config.username, endpoint
                ))
                .with_source(e)
            })?;
        if !session.authenticated() {
            return Err(ReporterError::connection(format!(
                "Server {} did not accept the credentials for '{}'",
                endpoint, config.username
            )));
        }

        let sftp = session
            .sftp()
            .map_err(|e| ReporterError::connection("Failed to start SFTP subsystem").with_source(e))?;

        Ok(Self { session, sftp })
    }

    fn put(&self, local: &Path, remote: &str) -> Result<u64> {
        let mut source = File::open(local).map_err(|e| ReporterError::local_io(local, e))?;
        let mut target = self.sftp.create(Path::new(remote)).map_err(|e| {
            ReporterError::transfer(format!("Failed to create remote file {}", remote)).with_source(e)
        })?;

        let bytes = std::io::copy(&mut source, &mut target).map_err(|e| {
            ReporterError::transfer(format!("Failed to write remote file {}", remote)).with_source(e)
        })?;
        target.flush().map_err(|e| {
            ReporterError::transfer(format!("Failed to flush remote file {}", remote)).with_source(e)
        })?;

        Ok(bytes)
    }

    fn close(self) -> Result<()> {
        let SftpInner { session, sftp } = self;
        drop(sftp);
        session
            .disconnect(None, "report delivered", None)
            .map_err(|e| ReporterError::transfer("Failed to close SSH session").with_source(e))
    }
}

fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> std::io::Result<TcpStream> {
    let Some(timeout) = timeout else {
        return TcpStream::connect((host, port));
    };

    let mut last_error = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} resolved to no addresses", host),
        )
    }))
}

/// Async wrapper around [`SftpInner`]
struct SftpSession {
    inner: Option<SftpInner>,
}

#[async_trait]
impl TransferSession for SftpSession {
    async fn put(&mut self, local: &Path, remote: &str) -> Result<u64> {
        let inner = self
            .inner
            .take()
            .ok_or_else(|| ReporterError::transfer("SFTP session is closed"))?;
        let local: PathBuf = local.to_path_buf();
        let remote = remote.to_string();

        let (inner, result) = tokio::task::spawn_blocking(move || {
            let result = inner.put(&local, &remote);
            (inner, result)
        })
        .await
        .map_err(|e| ReporterError::transfer("SFTP upload task failed").with_source(e))?;

        self.inner = Some(inner);
        result
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        match self.inner.take() {
            Some(inner) => tokio::task::spawn_blocking(move || inner.close())
                .await
                .map_err(|e| ReporterError::transfer("SFTP close task failed").with_source(e))?,
            None => Ok(()),
        }
    }
}
