//! SQLite SQL dialect.
//!
//! - ANSI identifier quoting (`"`)
//! - Dates are stored as ISO text, so date literals are plain strings
//! - NULLS FIRST/LAST since 3.30, nulls already sort first ascending

use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_date_literal(&self, date: &str) -> String {
        helpers::quote_string_single(date)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)
}
