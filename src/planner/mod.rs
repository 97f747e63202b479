//! Query planning - turns parsed query strings into SQL against a model.
//!
//! A cube request is answered by threading one [`QueryContext`] through a
//! fixed sequence of stages, each of which adds one clause and reports what
//! it did:
//!
//! ```text
//!   cuts ──► fields / drilldowns ──► aggregates ──► ordering ──► pagination
//!    │              │                    │             │
//!    └──────────────┴──── bindings ──────┴─────────────┘
//!                            │
//!                            ▼
//!                   join_builder::restrict
//!                (FROM + INNER JOIN per table)
//! ```
//!
//! Stages never emit FROM or JOIN themselves. They record which physical
//! table every bound concept lives in, and [`join_builder::restrict`] derives
//! the join set from those bindings once the projection is final.

pub mod aggregates;
pub mod cuts;
pub mod drilldowns;
pub mod fields;
pub mod join_builder;
pub mod ordering;
pub mod pagination;

pub use aggregates::aggregates;
pub use cuts::{cuts, CutInfo};
pub use drilldowns::drilldowns;
pub use fields::fields;
pub use join_builder::restrict;
pub use ordering::{ordering, OrderInfo};
pub use pagination::{paginate, PageInfo, DEFAULT_PAGE_MAX};

use crate::model::BoundColumn;
use crate::sql::expr::Expr;
use crate::sql::query::Query;

/// A concept bound during planning and the table it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub table: String,
    pub reference: String,
}

/// The grouping key of a distinct (members) listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DistinctKey {
    pub label: String,
    pub expr: Expr,
}

/// The query under construction plus what the stages learned so far.
#[derive(Debug, Clone, Default)]
#[must_use = "planner stages return a new context"]
pub struct QueryContext {
    pub query: Query,
    pub bindings: Vec<Binding>,
    /// Set by distinct field selection; ordering is restricted to it.
    pub distinct_key: Option<DistinctKey>,
    /// Set once aggregate columns are projected.
    pub aggregated: bool,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the table a bound concept came from.
    pub fn bind(&mut self, bound: &BoundColumn, reference: &str) {
        let binding = Binding {
            table: bound.table.clone(),
            reference: reference.to_string(),
        };
        if !self.bindings.contains(&binding) {
            self.bindings.push(binding);
        }
    }

    /// Record `table` without binding a concept from it. Counting variants
    /// use this to stay on the fact table when only dimension columns are cut.
    pub fn bind_table(&mut self, table: &str) {
        let binding = Binding {
            table: table.to_string(),
            reference: table.to_string(),
        };
        if !self.bindings.contains(&binding) {
            self.bindings.push(binding);
        }
    }

    /// Output names of the current projection, in order.
    pub fn projected(&self) -> impl Iterator<Item = &str> {
        self.query.select.iter().filter_map(|s| s.output_name())
    }

    pub fn is_projected(&self, label: &str) -> bool {
        self.projected().any(|p| p == label)
    }

    /// Distinct tables touched by bindings, in first-bound order.
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        for binding in &self.bindings {
            if !tables.contains(&binding.table.as_str()) {
                tables.push(&binding.table);
            }
        }
        tables
    }

    pub fn map_query(mut self, f: impl FnOnce(Query) -> Query) -> Self {
        self.query = f(self.query);
        self
    }
}
