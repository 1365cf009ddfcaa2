//! Storage layer
//!
//! SQLite-backed embedded store for the code graph: neurons, synapses, the
//! indexed-file manifest, and the query log.

mod migrations;
mod sqlite;

pub use migrations::{Migration, CURRENT_SCHEMA_VERSION, MIGRATIONS};
pub use sqlite::{Result, Store, StoreError, StoreStats};
