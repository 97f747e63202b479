//! PostgreSQL SQL dialect.
//!
//! - ANSI identifier quoting (`"`)
//! - `DATE '...'` literals
//! - Nulls sort as the largest value, so descending orders put them first
//!   unless NULLS LAST is given

use super::helpers;
use super::SqlDialect;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)

    fn is_postgres_compatible(&self) -> bool {
        true
    }
}
