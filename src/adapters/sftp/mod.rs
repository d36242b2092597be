//! SFTP integration
//!
//! Implements the transfer seam with `ssh2`. libssh2 is blocking, so every
//! session call runs on tokio's blocking pool.

pub mod client;

pub use client::SftpConnector;
