//! # Babbage
//!
//! An embeddable analytical cube engine. A cube is a declarative model
//! (measures, dimensions, hierarchies) laid over a star schema; requests in a
//! compact query language are compiled to join-correct SQL and the rows are
//! shaped into aggregate cells, fact listings or dimension members.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Model spec (JSON: dimensions, measures, ...)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model]
//! ┌─────────────────────────────────────────────────────────┐
//! │    Model: memoized concepts, resolver, binder            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!   query strings ──▶ [dsl: parse + validate]
//!                          │
//!                          ▼ [planner stages]
//! ┌─────────────────────────────────────────────────────────┐
//! │  cuts → fields/drilldowns → aggregates → order → page    │
//! │               + join restriction                         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql]
//! ┌─────────────────────────────────────────────────────────┐
//! │          dialect-aware SQL, run by a Backend             │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod cube;
pub mod dsl;
pub mod error;
pub mod metadata;
pub mod model;
pub mod planner;
pub mod sql;

pub use sql::dialect;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

pub use catalog::{CachingJsonCubeCatalog, CubeCatalog, JsonCubeCatalog};
pub use cube::{AggregateResult, Cube, FactsResult, MembersResult, QueryParams};
pub use dialect::Dialect;
pub use error::{BabbageError, BabbageResult, ErrorContext};
pub use metadata::{Backend, SqliteBackend};
pub use model::Model;
