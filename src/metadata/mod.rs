//! Physical schema and query execution.
//!
//! The engine talks to a store through two narrow traits:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Backend                           │
//! │  ┌──────────────────────────┬───────────────────────────┐│
//! │  │  MetadataProvider        │  QueryExecutor            ││
//! │  │  - has_table()           │  - dialect()              ││
//! │  │  - load_table()          │  - count()                ││
//! │  │                          │  - fetch()                ││
//! │  └──────────────────────────┴───────────────────────────┘│
//! └──────────────────────────────────────────────────────────┘
//!              │                              │
//!              ▼                              ▼
//!      TableCache (per cube)        SQL text for the dialect
//! ```
//!
//! [`SqliteBackend`] is the bundled implementation; [`StaticMetadata`]
//! serves declared tables without a database.
//!
//! # Example
//!
//! ```ignore
//! use babbage::metadata::{MetadataProvider, SqliteBackend};
//!
//! let backend = SqliteBackend::open_in_memory()?;
//! backend.execute_batch("CREATE TABLE cra (_id INTEGER PRIMARY KEY, amount REAL)")?;
//! let table = backend.load_table("cra")?;
//! assert_eq!(table.primary_key, vec!["_id"]);
//! ```

mod cache;
mod provider;
mod sqlite;

pub use cache::TableCache;
pub use provider::{
    Backend, ColumnMetadata, MetadataProvider, QueryExecutor, Row, StaticMetadata, TableMetadata,
};
pub use sqlite::SqliteBackend;
