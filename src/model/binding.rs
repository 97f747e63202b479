//! Binding concepts to physical columns.
//!
//! A concept's declared column is either `column` (on the fact table) or
//! `table.column`. Binding reflects the table through the cube's
//! [`TableCache`], checks the column exists, and produces a labelled
//! expression ready for projection.

use std::sync::Arc;

use crate::error::{BabbageError, BabbageResult, ErrorContext};
use crate::expr::{self, Expr, ExprExt};
use crate::metadata::{MetadataProvider, TableCache, TableMetadata};
use crate::query::SelectExpr;

use super::concept::{Aggregate, Concept};
use super::Model;

/// A concept bound to its physical table and column.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundColumn {
    pub table: String,
    pub column: String,
    /// Output label: the ref the caller used.
    pub label: String,
    /// Column expression, wrapped in a function for aggregates.
    pub expr: Expr,
}

impl BoundColumn {
    /// The expression projected under its label.
    pub fn select_expr(&self) -> SelectExpr {
        self.expr.clone().alias(&self.label)
    }
}

/// Resolves concepts of one model against one physical schema.
#[derive(Clone, Copy)]
pub struct Binder<'a> {
    model: &'a Model,
    tables: &'a TableCache,
    provider: &'a dyn MetadataProvider,
}

impl<'a> Binder<'a> {
    pub fn new(model: &'a Model, tables: &'a TableCache, provider: &'a dyn MetadataProvider) -> Self {
        Self {
            model,
            tables,
            provider,
        }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn fact_table(&self) -> &'a str {
        self.model.fact_table()
    }

    /// Reflect a table, failing with a binding error when it is absent.
    pub fn table(&self, name: &str) -> BabbageResult<Arc<TableMetadata>> {
        self.tables.get(self.provider, name)
    }

    /// Bind `concept`, labelling the output with `label`.
    pub fn bind(&self, concept: Concept<'_>, label: &str) -> BabbageResult<BoundColumn> {
        match concept {
            Concept::Attribute(a) => self.bind_column(&a.column, &a.reference, label),
            Concept::Measure(m) => self.bind_column(&m.column, &m.name, label),
            Concept::Dimension(d) => {
                let key = d.key_attribute();
                self.bind_column(&key.column, &key.reference, &key.reference)
            }
            Concept::Aggregate(a) => self.bind_aggregate(a, label),
        }
    }

    /// Bind the concept named by `reference`, labelled with that ref.
    pub fn bind_ref(&self, reference: &str) -> BabbageResult<BoundColumn> {
        let concept = self.model.concept(reference)?;
        self.bind(concept, reference)
    }

    fn bind_aggregate(&self, aggregate: &Aggregate, label: &str) -> BabbageResult<BoundColumn> {
        let inner = match &aggregate.measure {
            Some(measure) => {
                let concept = self.model.concept(measure)?;
                self.bind(concept, measure)?
            }
            None => self.fact_primary_key()?,
        };
        Ok(BoundColumn {
            expr: aggregate.function.apply(inner.expr),
            label: label.to_string(),
            ..inner
        })
    }

    /// The fact table's single primary-key column.
    pub fn fact_primary_key(&self) -> BabbageResult<BoundColumn> {
        let fact = self.fact_table();
        let table = self.table(fact)?;
        match table.primary_key.as_slice() {
            [column] => Ok(BoundColumn {
                table: fact.to_string(),
                column: column.clone(),
                label: column.clone(),
                expr: expr::table_col(fact, column),
            }),
            keys => Err(BabbageError::binding(
                format!(
                    "Fact table must have exactly one primary key column, {fact} has {}",
                    keys.len()
                ),
                ErrorContext::new().with_table(fact),
            )),
        }
    }

    fn bind_column(&self, declared: &str, reference: &str, label: &str) -> BabbageResult<BoundColumn> {
        let (table_name, column) = match declared.split_once('.') {
            Some((table, column)) => (table, column),
            None => (self.fact_table(), declared),
        };

        let table = self.table(table_name).map_err(|err| match err {
            BabbageError::Binding { message, context } => BabbageError::Binding {
                message,
                context: context.with_ref(reference),
            },
            other => other,
        })?;

        if !table.has_column(column) {
            return Err(BabbageError::binding(
                format!("Column does not exist: {table_name}.{column}"),
                ErrorContext::new()
                    .with_table(table_name)
                    .with_column(column)
                    .with_ref(reference),
            ));
        }

        Ok(BoundColumn {
            table: table_name.to_string(),
            column: column.to_string(),
            label: label.to_string(),
            expr: expr::table_col(table_name, column),
        })
    }
}

impl std::fmt::Debug for Binder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("fact_table", &self.fact_table())
            .field("tables", &self.tables)
            .finish()
    }
}
