//! Join restriction: derive `FROM` and star joins from recorded bindings.
//!
//! ```text
//!             ┌──────────┐
//!   regions ──┤   cra    ├── cofog_tbl
//!   id = region_id       cofog_id = id
//!             └──────────┘
//! ```
//!
//! Every non-fact table is reached from the fact table through exactly one
//! equality predicate taken from its dimension's `join_column`, so the join
//! count equals the number of distinct dimension tables referenced. A table
//! that cannot be tied to the fact table this way is a binding error, never
//! an implicit cross join.

use tracing::debug;

use super::QueryContext;
use crate::error::{BabbageError, BabbageResult, ErrorContext};
use crate::model::{Binder, Dimension};
use crate::sql::expr::{table_col, Expr, ExprExt};
use crate::sql::query::TableRef;

/// Resolves join predicates for one model.
pub struct JoinBuilder<'a> {
    binder: &'a Binder<'a>,
}

impl<'a> JoinBuilder<'a> {
    pub fn new(binder: &'a Binder<'a>) -> Self {
        Self { binder }
    }

    /// Replace `FROM` and joins of `ctx` with the minimal star join.
    pub fn restrict(&self, ctx: QueryContext) -> BabbageResult<QueryContext> {
        let fact = self.binder.fact_table();
        let tables: Vec<String> = ctx.tables().into_iter().map(String::from).collect();

        let mut ctx = ctx.map_query(|mut q| {
            q.joins.clear();
            q
        });

        match tables.as_slice() {
            [] => return Ok(ctx.map_query(|q| q.from(TableRef::new(fact)))),
            [only] => return Ok(ctx.map_query(|q| q.from(TableRef::new(only)))),
            _ => {}
        }

        ctx = ctx.map_query(|q| q.from(TableRef::new(fact)));
        let bindings = ctx.bindings.clone();
        for binding in bindings.iter().filter(|b| b.table != fact) {
            let dimension = self.owning_dimension(&binding.reference, &binding.table)?;
            let (table, predicate) = self.join_predicate(dimension, &binding.table)?;
            debug!(dimension = %dimension.name, table = %table, "joining dimension table");
            ctx = ctx.map_query(|q| q.join_on(&table, predicate));
        }

        Ok(ctx)
    }

    fn owning_dimension(&self, reference: &str, table: &str) -> BabbageResult<&'a Dimension> {
        let model = self.binder.model();
        let concept = model.concept(reference)?;
        model.dimension_of(concept).ok_or_else(|| {
            BabbageError::binding(
                format!(
                    "{reference} is bound to {table}, which is not the fact table and not a dimension table"
                ),
                ErrorContext::new().with_table(table).with_ref(reference),
            )
        })
    }

    fn join_predicate(&self, dimension: &Dimension, table: &str) -> BabbageResult<(String, Expr)> {
        let key = self.binder.bind_ref(&dimension.key_attribute().reference)?;
        if key.table != table {
            return Err(BabbageError::binding(
                format!(
                    "Attributes must be of same table as their dimension key: {} is keyed on {}, not {table}",
                    dimension.name, key.table
                ),
                ErrorContext::new()
                    .with_table(table)
                    .with_ref(dimension.name.as_str()),
            ));
        }

        let resolved = dimension.join_column.as_ref().and_then(|jc| jc.resolve());
        let Some((fact_column, dimension_column)) = resolved else {
            let declared = dimension
                .join_column
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "nothing".into());
            return Err(BabbageError::binding(
                format!(
                    "Dimension {} is stored in {table} but declares join_column {declared}",
                    dimension.name
                ),
                ErrorContext::new()
                    .with_table(table)
                    .with_ref(dimension.name.as_str()),
            ));
        };
        let dimension_column = dimension_column.unwrap_or(key.column.as_str());

        let fact = self.binder.fact_table();
        self.require_column(fact, fact_column, dimension)?;
        self.require_column(table, dimension_column, dimension)?;

        Ok((
            table.to_string(),
            table_col(fact, fact_column).eq(table_col(table, dimension_column)),
        ))
    }

    fn require_column(&self, table: &str, column: &str, dimension: &Dimension) -> BabbageResult<()> {
        if self.binder.table(table)?.has_column(column) {
            return Ok(());
        }
        Err(BabbageError::binding(
            format!(
                "Join column {table}.{column} of dimension {} does not exist",
                dimension.name
            ),
            ErrorContext::new()
                .with_table(table)
                .with_column(column)
                .with_ref(dimension.name.as_str()),
        ))
    }
}

/// Restrict `ctx` to an explicit star join over its bindings.
pub fn restrict(ctx: QueryContext, binder: &Binder<'_>) -> BabbageResult<QueryContext> {
    JoinBuilder::new(binder).restrict(ctx)
}
