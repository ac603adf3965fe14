//! Storage layer for the retrieval index.
//!
//! Provides persistent storage for the indexed lab corpus using `SQLite`.
//! The storage layer handles buffers, chunks, and metadata with proper
//! transaction support.

pub mod schema;
pub mod sqlite;
pub mod traits;

pub use schema::{CURRENT_SCHEMA_VERSION, SCHEMA_SQL};
pub use sqlite::SqliteStorage;
pub use traits::Storage;
