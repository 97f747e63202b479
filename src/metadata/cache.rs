//! Per-cube table reflection cache.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::provider::{missing_table, MetadataProvider, TableMetadata};
use crate::error::BabbageResult;

/// Reflected tables, keyed by name.
///
/// Entries are never invalidated. Two threads may reflect the same table at
/// once; both results are equal and the later insert simply wins.
#[derive(Default)]
pub struct TableCache {
    tables: DashMap<String, Arc<TableMetadata>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a table, reflecting it through `provider` on first use.
    pub fn get(
        &self,
        provider: &dyn MetadataProvider,
        name: &str,
    ) -> BabbageResult<Arc<TableMetadata>> {
        if let Some(table) = self.tables.get(name) {
            return Ok(Arc::clone(table.value()));
        }

        // No lock is held while reflecting.
        if !provider.has_table(name)? {
            return Err(missing_table(name));
        }
        let table = Arc::new(provider.load_table(name)?);
        debug!(table = name, columns = table.columns.len(), "reflected table");
        self.tables.insert(name.to_string(), Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl std::fmt::Debug for TableCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableCache")
            .field("tables", &self.tables.len())
            .finish()
    }
}
