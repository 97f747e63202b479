//! The cube: a model bound to a backend, answering the three public queries.
//!
//! Every operation parses its query strings against the model, assembles
//! one [`QueryContext`] per query variant from the planner stages, restricts
//! each variant to an explicit star join and runs it:
//!
//! ```text
//!              ┌────────── count ──────────┐
//! cuts ──┬─────┤                           ├──► total_*_count
//!        │     └───────────────────────────┘
//!        ├──── summary (aggregate only) ──────► summary
//!        └──── data: stages + order + page ──► cells / data
//! ```
//!
//! Counts and data come from separate round trips, so they are not
//! snapshot-consistent with each other.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::dsl::{self, Cut, Ref};
use crate::error::{BabbageError, BabbageResult, ErrorContext};
use crate::metadata::{Backend, Row, TableCache};
use crate::model::{Binder, Model};
use crate::planner::{self, CutInfo, OrderInfo, QueryContext, DEFAULT_PAGE_MAX};
use crate::sql::dialect::{Dialect, DialectCapabilities};
use crate::sql::expr::{count_star, lit_int};
use crate::sql::query::SelectExpr;

// =============================================================================
// Parameters
// =============================================================================

/// Query strings and paging for one request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "builders have no effect until used"]
pub struct QueryParams {
    pub aggregates: Option<String>,
    pub drilldowns: Option<String>,
    pub cuts: Option<String>,
    pub fields: Option<String>,
    pub order: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub page_max: Option<u64>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregates(mut self, aggregates: impl Into<String>) -> Self {
        self.aggregates = Some(aggregates.into());
        self
    }

    pub fn drilldowns(mut self, drilldowns: impl Into<String>) -> Self {
        self.drilldowns = Some(drilldowns.into());
        self
    }

    pub fn cuts(mut self, cuts: impl Into<String>) -> Self {
        self.cuts = Some(cuts.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn page_max(mut self, page_max: u64) -> Self {
        self.page_max = Some(page_max);
        self
    }
}

// =============================================================================
// Results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub total_cell_count: u64,
    pub cells: Vec<Row>,
    pub summary: Row,
    pub cell: Vec<CutInfo>,
    pub aggregates: Vec<String>,
    pub attributes: Vec<String>,
    pub order: Vec<OrderInfo>,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembersResult {
    pub total_member_count: u64,
    pub data: Vec<Row>,
    pub cell: Vec<CutInfo>,
    pub fields: Vec<String>,
    pub order: Vec<OrderInfo>,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactsResult {
    pub total_fact_count: u64,
    pub data: Vec<Row>,
    pub cell: Vec<CutInfo>,
    pub fields: Vec<String>,
    pub order: Vec<OrderInfo>,
    pub page: u64,
    pub page_size: u64,
}

// =============================================================================
// Cube
// =============================================================================

/// A named model over a backend.
///
/// Queries take `&self` and share nothing but the table reflection cache,
/// so a cube can serve concurrent requests.
pub struct Cube {
    name: String,
    model: Model,
    backend: Arc<dyn Backend>,
    tables: TableCache,
    dialect: Dialect,
    capabilities: DialectCapabilities,
    page_max: u64,
}

impl Cube {
    pub fn new(name: impl Into<String>, model: Model, backend: Arc<dyn Backend>) -> Self {
        let dialect = backend.dialect();
        Self {
            name: name.into(),
            model,
            backend,
            tables: TableCache::new(),
            dialect,
            capabilities: dialect.capabilities(),
            page_max: DEFAULT_PAGE_MAX,
        }
    }

    /// Default upper bound on `page_size` for requests that set none.
    pub fn with_page_max(mut self, page_max: u64) -> Self {
        self.page_max = page_max;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    fn binder(&self) -> Binder<'_> {
        Binder::new(&self.model, &self.tables, self.backend.metadata())
    }

    fn page_max(&self, params: &QueryParams) -> u64 {
        params.page_max.unwrap_or(self.page_max)
    }

    // -------------------------------------------------------------------------
    // Execution
    // -------------------------------------------------------------------------

    fn count(&self, ctx: QueryContext, binder: &Binder<'_>) -> BabbageResult<u64> {
        let query = planner::restrict(ctx, binder)?.query.into_count();
        debug!(cube = %self.name, sql = %query.to_sql(self.dialect), "count query");
        self.backend.count(&query)
    }

    fn fetch(&self, ctx: QueryContext, binder: &Binder<'_>) -> BabbageResult<Vec<Row>> {
        let query = planner::restrict(ctx, binder)?.query;
        if query.limit_value() == Some(0) {
            return Ok(Vec::new());
        }
        debug!(cube = %self.name, sql = %query.to_sql(self.dialect), "data query");
        self.backend.fetch(&query)
    }

    fn with_cuts(&self, binder: &Binder<'_>, cuts: &[Cut]) -> BabbageResult<(QueryContext, Vec<CutInfo>)> {
        planner::cuts(QueryContext::new(), binder, cuts)
    }

    // -------------------------------------------------------------------------
    // Public operations
    // -------------------------------------------------------------------------

    /// Aggregate cells grouped by `drilldowns`, plus a grand-total summary.
    pub fn aggregate(&self, params: &QueryParams) -> BabbageResult<AggregateResult> {
        let cuts = dsl::cuts(&self.model, params.cuts.as_deref())?;
        let drilldowns = dsl::drilldowns(&self.model, params.drilldowns.as_deref())?;
        let aggregates = dsl::aggregates(&self.model, params.aggregates.as_deref())?;
        let order = dsl::ordering(&self.model, params.order.as_deref())?;
        let binder = self.binder();

        // One row per cell, each reduced to a constant.
        let (ctx, _) = self.with_cuts(&binder, &cuts)?;
        let (mut ctx, _) = planner::drilldowns(ctx, &binder, &drilldowns)?;
        let marker = if drilldowns.is_empty() { count_star() } else { lit_int(1) };
        ctx.query.select = vec![SelectExpr::new(marker)];
        ctx.bind_table(binder.fact_table());
        let total_cell_count = self.count(ctx, &binder)?;

        let (ctx, _) = self.with_cuts(&binder, &cuts)?;
        let (ctx, _) = planner::aggregates(ctx, &binder, &aggregates)?;
        let summary = self
            .fetch(ctx.map_query(|q| q.limit(1)), &binder)?
            .into_iter()
            .next()
            .unwrap_or_default();

        let (ctx, cell) = self.with_cuts(&binder, &cuts)?;
        let (ctx, attributes) = planner::drilldowns(ctx, &binder, &drilldowns)?;
        let (ctx, aggregate_info) = planner::aggregates(ctx, &binder, &aggregates)?;
        let (ctx, order_info) = planner::ordering(ctx, &binder, &order, self.capabilities)?;
        let (ctx, page) =
            planner::paginate(ctx, params.page, params.page_size, self.page_max(params));
        let cells = self.fetch(ctx, &binder)?;

        Ok(AggregateResult {
            total_cell_count,
            cells,
            summary,
            cell,
            aggregates: aggregate_info,
            attributes,
            order: order_info,
            page: page.page,
            page_size: page.page_size,
        })
    }

    /// Distinct members of the dimension or attribute `reference`.
    pub fn members(&self, reference: &str, params: &QueryParams) -> BabbageResult<MembersResult> {
        let fields: Vec<Ref> = dsl::drilldowns(&self.model, Some(reference))?;
        if fields.len() != 1 {
            return Err(BabbageError::query(
                format!("Members are listed for exactly one ref, not {reference:?}"),
                ErrorContext::new()
                    .with_construct("drilldown")
                    .with_ref(reference),
            ));
        }
        let cuts = dsl::cuts(&self.model, params.cuts.as_deref())?;
        let order = dsl::ordering(&self.model, params.order.as_deref())?;
        let binder = self.binder();

        let (ctx, cell) = self.with_cuts(&binder, &cuts)?;
        let (ctx, field_info) = planner::fields(ctx, &binder, &fields, true)?;
        let total_member_count = self.count(ctx.clone(), &binder)?;

        let (ctx, order_info) = planner::ordering(ctx, &binder, &order, self.capabilities)?;
        let (ctx, page) =
            planner::paginate(ctx, params.page, params.page_size, self.page_max(params));
        let data = self.fetch(ctx, &binder)?;

        Ok(MembersResult {
            total_member_count,
            data,
            cell,
            fields: field_info,
            order: order_info,
            page: page.page,
            page_size: page.page_size,
        })
    }

    /// Individual fact rows.
    pub fn facts(&self, params: &QueryParams) -> BabbageResult<FactsResult> {
        let cuts = dsl::cuts(&self.model, params.cuts.as_deref())?;
        let fields = dsl::fields(&self.model, params.fields.as_deref())?;
        let order = dsl::ordering(&self.model, params.order.as_deref())?;
        let binder = self.binder();

        let (mut ctx, cell) = self.with_cuts(&binder, &cuts)?;
        ctx.bind_table(binder.fact_table());
        let counted = ctx.clone().map_query(|q| q.column(lit_int(1)));
        let total_fact_count = self.count(counted, &binder)?;

        let (ctx, field_info) = planner::fields(ctx, &binder, &fields, false)?;
        let (ctx, order_info) = planner::ordering(ctx, &binder, &order, self.capabilities)?;
        let (ctx, page) =
            planner::paginate(ctx, params.page, params.page_size, self.page_max(params));
        let data = self.fetch(ctx, &binder)?;

        Ok(FactsResult {
            total_fact_count,
            data,
            cell,
            fields: field_info,
            order: order_info,
            page: page.page,
            page_size: page.page_size,
        })
    }

    /// Count the members of every dimension and store them in the model.
    pub fn compute_cardinalities(&mut self) -> BabbageResult<()> {
        let names: Vec<String> = self.model.dimensions().iter().map(|d| d.name.clone()).collect();
        for name in names {
            let members = self.members(&name, &QueryParams::new().page_size(0))?;
            self.model.set_cardinality(&name, members.total_member_count)?;
            info!(
                cube = %self.name,
                dimension = %name,
                cardinality = members.total_member_count,
                class = ?self.model.dimension(&name).and_then(|d| d.cardinality_class()),
                "computed cardinality"
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for Cube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cube")
            .field("name", &self.name)
            .field("fact_table", &self.model.fact_table())
            .field("dialect", &self.dialect)
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}
