//! Database abstraction layer
//!
//! Trait seam between the report runner and the database client, so the
//! pipeline can be driven by PostgreSQL in production and by in-memory doubles
//! in tests.

pub mod traits;

pub use traits::{DatabaseConnector, DatabaseSession, RowCursor, TextRow};
