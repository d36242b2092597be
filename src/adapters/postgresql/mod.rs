//! PostgreSQL integration
//!
//! Implements the database seam with tokio-postgres: one connection per job,
//! cursor-based batched fetching with values in the server's text format.

pub mod client;
pub mod values;

pub use client::PostgresConnector;
