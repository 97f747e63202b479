//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible for everything a cube query emits:
//! - ANSI identifier quoting (`"`)
//! - `DATE '...'` literals
//! - NULLS FIRST/LAST

use super::helpers;
use super::SqlDialect;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)

    fn is_postgres_compatible(&self) -> bool {
        true
    }
}
