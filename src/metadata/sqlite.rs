//! SQLite backend over `rusqlite`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use base64::Engine as _;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use serde_json::{Number, Value};
use tracing::debug;

use super::provider::{
    missing_table, ColumnMetadata, MetadataProvider, QueryExecutor, Row, TableMetadata,
};
use crate::error::{BabbageError, BabbageResult};
use crate::query::Query;
use crate::sql::dialect::{Dialect, SqlDialect};

/// A single SQLite connection shared behind a mutex.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> BabbageResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> BabbageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a script of `;`-separated statements, e.g. a fixture.
    pub fn execute_batch(&self, sql: &str) -> BabbageResult<()> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> BabbageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| BabbageError::Backend("sqlite connection mutex poisoned".into()))
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}

impl MetadataProvider for SqliteBackend {
    fn has_table(&self, name: &str) -> BabbageResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn load_table(&self, name: &str) -> BabbageResult<TableMetadata> {
        let conn = self.lock()?;
        let pragma = format!(
            "PRAGMA table_info({})",
            Dialect::Sqlite.quote_identifier(name)
        );
        let mut stmt = conn.prepare(&pragma)?;

        // (cid, name, type, notnull, dflt_value, pk)
        let mut keyed = Vec::new();
        let mut columns = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let column: String = row.get(1)?;
            let data_type: String = row.get(2)?;
            let not_null: i64 = row.get(3)?;
            let pk: i64 = row.get(5)?;
            if pk > 0 {
                keyed.push((pk, column.clone()));
            }
            columns.push(ColumnMetadata {
                name: column,
                data_type,
                nullable: not_null == 0 && pk == 0,
            });
        }

        if columns.is_empty() {
            return Err(missing_table(name));
        }

        keyed.sort();
        Ok(TableMetadata {
            name: name.to_string(),
            columns,
            primary_key: keyed.into_iter().map(|(_, c)| c).collect(),
        })
    }
}

impl QueryExecutor for SqliteBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn count(&self, query: &Query) -> BabbageResult<u64> {
        let sql = query.to_sql(Dialect::Sqlite);
        debug!(%sql, "count");
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn fetch(&self, query: &Query) -> BabbageResult<Vec<Row>> {
        let sql = query.to_sql(Dialect::Sqlite);
        debug!(%sql, "fetch");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut out = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (i, name) in names.iter().enumerate() {
                record.insert(name.clone(), to_json(row.get_ref(i)?));
            }
            out.push(record);
        }
        Ok(out)
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
    }
}
