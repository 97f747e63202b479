//! Schema-accessor and execution traits.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BabbageError, BabbageResult, ErrorContext};
use crate::query::Query;
use crate::Dialect;

/// One result row, keyed by output column label.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Reflected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    /// Declared type as reported by the database, e.g. `INTEGER`.
    #[serde(default)]
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
        }
    }
}

/// Reflected table: its columns and primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    pub columns: Vec<ColumnMetadata>,
    #[serde(default)]
    pub primary_key: Vec<String>,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_column(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(ColumnMetadata::new(name, data_type));
        self
    }

    /// Add a column and mark it as (part of) the primary key.
    #[must_use = "builders have no effect until used"]
    pub fn with_primary_key(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(ColumnMetadata {
            name: name.into(),
            data_type: data_type.into(),
            nullable: false,
        });
        self.primary_key.push(name.into());
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Read access to the physical schema.
pub trait MetadataProvider: Send + Sync {
    fn has_table(&self, name: &str) -> BabbageResult<bool>;

    /// Reflect a table. Missing tables are a binding error.
    fn load_table(&self, name: &str) -> BabbageResult<TableMetadata>;
}

/// Runs generated queries.
pub trait QueryExecutor: Send + Sync {
    /// Dialect the generated SQL must be rendered in.
    fn dialect(&self) -> Dialect;

    /// Run a single-row, single-column count query.
    fn count(&self, query: &Query) -> BabbageResult<u64>;

    /// Run a query and return all rows.
    fn fetch(&self, query: &Query) -> BabbageResult<Vec<Row>>;
}

/// Everything a cube needs from its store.
pub trait Backend: MetadataProvider + QueryExecutor {
    fn metadata(&self) -> &dyn MetadataProvider;
}

impl<T: MetadataProvider + QueryExecutor> Backend for T {
    fn metadata(&self) -> &dyn MetadataProvider {
        self
    }
}

pub(crate) fn missing_table(name: &str) -> BabbageError {
    BabbageError::binding(
        format!("Table does not exist: {name}"),
        ErrorContext::new().with_table(name),
    )
}

/// Table definitions held in memory.
///
/// Useful when the schema is known up front, and for planning queries
/// without a live connection.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    tables: HashMap<String, TableMetadata>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }
}

impl MetadataProvider for StaticMetadata {
    fn has_table(&self, name: &str) -> BabbageResult<bool> {
        Ok(self.tables.contains_key(name))
    }

    fn load_table(&self, name: &str) -> BabbageResult<TableMetadata> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| missing_table(name))
    }
}
