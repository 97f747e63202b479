//! Tests composing planner stages and running the result on SQLite.

use babbage::dsl;
use babbage::metadata::{QueryExecutor, TableCache};
use babbage::model::{Binder, Model};
use babbage::planner::{self, OrderInfo, PageInfo, QueryContext};
use babbage::sql::Dialect;
use babbage::{BabbageResult, SqliteBackend};
use serde_json::{json, Value};

struct Fixture {
    model: Model,
    backend: SqliteBackend,
    tables: TableCache,
}

impl Fixture {
    fn new() -> Self {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .execute_batch(include_str!("../fixtures/sql/cra.sql"))
            .unwrap();
        Self {
            model: Model::from_json(include_str!("../fixtures/models/cra.json")).unwrap(),
            backend,
            tables: TableCache::new(),
        }
    }

    fn binder(&self) -> Binder<'_> {
        Binder::new(&self.model, &self.tables, &self.backend)
    }

    fn count(&self, ctx: &QueryContext) -> u64 {
        self.backend.count(&ctx.query.clone().into_count()).unwrap()
    }
}

fn sqlite() -> babbage::sql::DialectCapabilities {
    Dialect::Sqlite.capabilities()
}

fn as_f64(row: &babbage::metadata::Row, key: &str) -> f64 {
    row[key].as_f64().unwrap()
}

#[test]
fn test_fact_listing_pipeline() {
    let fixture = Fixture::new();
    let binder = fixture.binder();
    let model = &fixture.model;

    let cut_refs = dsl::cuts(model, Some(r#"cofog1:"4""#)).unwrap();
    let field_refs = dsl::fields(model, Some("cofog1.name,amount")).unwrap();
    let order = dsl::ordering(model, Some("amount:desc")).unwrap();

    let (ctx, cut_info) = planner::cuts(QueryContext::new(), &binder, &cut_refs).unwrap();
    let (ctx, fields) = planner::fields(ctx, &binder, &field_refs, false).unwrap();
    let (ctx, order_info) = planner::ordering(ctx, &binder, &order, sqlite()).unwrap();
    let ctx = planner::restrict(ctx, &binder).unwrap();
    assert_eq!(fixture.count(&ctx), 12);

    let (ctx, page) = planner::paginate(ctx, Some(2), Some(5), planner::DEFAULT_PAGE_MAX);
    let rows = fixture.backend.fetch(&ctx.query).unwrap();

    assert_eq!(fields, vec!["cofog1.name", "amount"]);
    assert_eq!(page, PageInfo { page: 2, page_size: 5 });
    assert_eq!(order_info, vec![OrderInfo("amount".into(), dsl::SortDirection::Desc)]);
    assert_eq!(
        serde_json::to_value(&cut_info).unwrap(),
        json!([{"ref": "cofog1", "operator": ":", "value": "4"}])
    );

    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r["cofog1.name"] == "4"));
    let amounts: Vec<f64> = rows.iter().map(|r| as_f64(r, "amount")).collect();
    assert!(amounts.windows(2).all(|w| w[0] >= w[1]), "{amounts:?}");

    let sql = ctx.query.to_sql(Dialect::Sqlite);
    assert!(sql.contains("LIMIT 5 OFFSET 5"), "{sql}");
}

#[test]
fn test_aggregation_pipeline() {
    let fixture = Fixture::new();
    let binder = fixture.binder();
    let model = &fixture.model;

    let cut_refs = dsl::cuts(model, Some("time.year:2010")).unwrap();
    let drilldown_refs = dsl::drilldowns(model, Some("cofog1")).unwrap();
    let aggregate_refs = dsl::aggregates(model, Some("amount.sum|_count")).unwrap();
    let order = dsl::ordering(model, Some("amount.sum:desc")).unwrap();

    let (ctx, _) = planner::cuts(QueryContext::new(), &binder, &cut_refs).unwrap();
    let (ctx, attributes) = planner::drilldowns(ctx, &binder, &drilldown_refs).unwrap();
    let (ctx, aggregates) = planner::aggregates(ctx, &binder, &aggregate_refs).unwrap();
    let (ctx, _) = planner::ordering(ctx, &binder, &order, sqlite()).unwrap();
    let ctx = planner::restrict(ctx, &binder).unwrap();

    assert_eq!(attributes, vec!["cofog1.name", "cofog1.label"]);
    assert_eq!(aggregates, vec!["amount.sum", "_count"]);
    assert_eq!(fixture.count(&ctx), 4);

    let rows = fixture.backend.fetch(&ctx.query).unwrap();
    assert_eq!(rows.len(), 4);
    let sums: Vec<f64> = rows.iter().map(|r| as_f64(r, "amount.sum")).collect();
    assert!(sums.windows(2).all(|w| w[0] >= w[1]), "{sums:?}");
    let facts: i64 = rows.iter().map(|r| r["_count"].as_i64().unwrap()).sum();
    assert_eq!(facts, 15);
}

#[test]
fn test_default_ordering_sorts_every_projected_column() {
    let fixture = Fixture::new();
    let binder = fixture.binder();
    let refs = dsl::drilldowns(&fixture.model, Some("region")).unwrap();

    let (ctx, _) = planner::drilldowns(QueryContext::new(), &binder, &refs).unwrap();
    let (ctx, info) = planner::ordering(ctx, &binder, &[], sqlite()).unwrap();
    assert!(info.is_empty());
    assert_eq!(ctx.query.order_by.len(), 2);

    let ctx = planner::restrict(ctx, &binder).unwrap();
    let rows = fixture.backend.fetch(&ctx.query).unwrap();
    let codes: Vec<&str> = rows.iter().map(|r| r["region.code"].as_str().unwrap()).collect();
    assert_eq!(codes, vec!["E", "N", "S"]);
}

#[test]
fn test_distinct_listing_orders_by_projected_columns_only() {
    let fixture = Fixture::new();
    let binder = fixture.binder();
    let model = &fixture.model;
    let refs = dsl::fields(model, Some("cofog1")).unwrap();

    let listing = |order: &str| -> BabbageResult<QueryContext> {
        let order = dsl::ordering(model, Some(order))?;
        let (ctx, _) = planner::fields(QueryContext::new(), &binder, &refs, true)?;
        let (ctx, _) = planner::ordering(ctx, &binder, &order, sqlite())?;
        planner::restrict(ctx, &binder)
    };

    let ctx = listing("cofog1.label:desc").unwrap();
    let rows = fixture.backend.fetch(&ctx.query).unwrap();
    assert_eq!(rows.len(), 4);
    let labels: Vec<String> = rows
        .iter()
        .map(|r| r["cofog1.label"].as_str().unwrap().to_string())
        .collect();
    let mut sorted = labels.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(labels, sorted);

    let ctx = listing("cofog1.name:desc").unwrap();
    let rows = fixture.backend.fetch(&ctx.query).unwrap();
    assert_eq!(rows[0]["cofog1.name"], "4");

    let err = listing("amount").unwrap_err();
    assert!(err.is_query());
    assert!(err.to_string().contains("not part of the listing"), "{err}");
}

#[test]
fn test_aggregate_order_needs_aggregation() {
    let fixture = Fixture::new();
    let binder = fixture.binder();
    let refs = dsl::fields(&fixture.model, Some("cofog1")).unwrap();
    let order = dsl::ordering(&fixture.model, Some("amount.sum")).unwrap();

    let (ctx, _) = planner::fields(QueryContext::new(), &binder, &refs, false).unwrap();
    let err = planner::ordering(ctx, &binder, &order, sqlite()).unwrap_err();
    assert!(err.is_query());
    assert!(err.to_string().contains("aggregates only sort aggregations"), "{err}");
    assert_eq!(err.context().unwrap().construct.as_deref(), Some("order"));
}

#[test]
fn test_null_cut_and_set_cut() {
    let fixture = Fixture::new();
    let binder = fixture.binder();
    let model = &fixture.model;

    let facts = |cut: &str| -> u64 {
        let cut_refs = dsl::cuts(model, Some(cut)).unwrap();
        let fields = dsl::fields(model, Some("amount")).unwrap();
        let (ctx, _) = planner::cuts(QueryContext::new(), &binder, &cut_refs).unwrap();
        let (ctx, _) = planner::fields(ctx, &binder, &fields, false).unwrap();
        let ctx = planner::restrict(ctx, &binder).unwrap();
        fixture.count(&ctx)
    };

    assert_eq!(facts("cap_or_cur.code:"), 0);
    assert_eq!(facts("time.year:2010;2012"), 24);
    assert_eq!(facts(r#"cofog1:"4"|cap_or_cur:CAP"#), 6);
    assert_eq!(facts("region.code:N"), 12);
}

#[test]
fn test_cut_type_mismatch() {
    let fixture = Fixture::new();
    let binder = fixture.binder();
    let cut_refs = dsl::cuts(&fixture.model, Some("time.year:abc")).unwrap();

    let err = planner::cuts(QueryContext::new(), &binder, &cut_refs).unwrap_err();
    assert!(err.is_query());
    assert!(
        err.to_string()
            .contains("parsed as type 'string' for cut time.year of type 'integer'"),
        "{err}"
    );
}

#[test]
fn test_pages_beyond_the_end_are_empty() {
    let fixture = Fixture::new();
    let binder = fixture.binder();
    let fields = dsl::fields(&fixture.model, Some("amount")).unwrap();

    let (ctx, _) = planner::fields(QueryContext::new(), &binder, &fields, false).unwrap();
    let ctx = planner::restrict(ctx, &binder).unwrap();
    let (ctx, page) = planner::paginate(ctx, Some(100), Some(10), 20);
    assert_eq!(page.offset(), 990);
    assert!(fixture.backend.fetch(&ctx.query).unwrap().is_empty());

    let value: Value = serde_json::to_value(page).unwrap();
    assert_eq!(value, json!({"page": 100, "page_size": 10}));
}
