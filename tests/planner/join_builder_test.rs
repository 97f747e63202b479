//! Tests for star-join restriction over the cra fixture schema.

use babbage::dsl;
use babbage::metadata::TableCache;
use babbage::model::{Binder, Model};
use babbage::planner::{self, QueryContext};
use babbage::sql::Dialect;
use babbage::SqliteBackend;
use sqlparser::dialect::{
    DuckDbDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::Parser;

struct Fixture {
    model: Model,
    backend: SqliteBackend,
    tables: TableCache,
}

impl Fixture {
    fn new(model: &str) -> Self {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .execute_batch(include_str!("../fixtures/sql/cra.sql"))
            .unwrap();
        Self {
            model: Model::from_json(model).unwrap(),
            backend,
            tables: TableCache::new(),
        }
    }

    fn cra() -> Self {
        Self::new(include_str!("../fixtures/models/cra.json"))
    }

    fn binder(&self) -> Binder<'_> {
        Binder::new(&self.model, &self.tables, &self.backend)
    }

    /// Drill down by `drilldowns`, sum the amount and restrict.
    fn plan(&self, drilldowns: &str) -> babbage::BabbageResult<QueryContext> {
        let binder = self.binder();
        let refs = dsl::drilldowns(&self.model, Some(drilldowns))?;
        let aggregates = dsl::aggregates(&self.model, Some("amount.sum"))?;
        let (ctx, _) = planner::drilldowns(QueryContext::new(), &binder, &refs)?;
        let (ctx, _) = planner::aggregates(ctx, &binder, &aggregates)?;
        planner::restrict(ctx, &binder)
    }
}

fn assert_parses(sql: &str, dialect: Dialect) {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
    };
    if let Err(e) = Parser::parse_sql(&*parser_dialect, sql) {
        panic!("invalid SQL for {dialect:?}: {e}\n{sql}");
    }
}

#[test]
fn test_two_dimension_tables_two_predicates() {
    let fixture = Fixture::cra();
    let ctx = fixture.plan("cap_or_cur|region").unwrap();

    assert_eq!(ctx.query.joins.len(), 2);
    let predicates: usize = ctx.query.joins.iter().map(|j| j.on.conjuncts().len()).sum();
    assert_eq!(predicates, 2);

    insta::assert_snapshot!(ctx.query.to_sql(Dialect::Sqlite), @r#"
    SELECT
      "cap_or_cur"."code" AS "cap_or_cur.code",
      "cap_or_cur"."label" AS "cap_or_cur.label",
      "regions"."code" AS "region.code",
      "regions"."name" AS "region.name",
      SUM("cra"."amount") AS "amount.sum"
    FROM "cra"
    INNER JOIN "cap_or_cur" ON "cra"."cap_or_cur" = "cap_or_cur"."code"
    INNER JOIN "regions" ON "cra"."region" = "regions"."code"
    GROUP BY "cap_or_cur"."code", "cap_or_cur"."label", "regions"."code", "regions"."name"
    "#);
}

#[test]
fn test_many_columns_of_one_table_one_predicate() {
    let fixture = Fixture::cra();
    let ctx = fixture.plan("region.name|region.code|region").unwrap();

    assert_eq!(ctx.query.joins.len(), 1);
    assert_eq!(ctx.query.joins[0].table.table, "regions");
    assert_eq!(ctx.query.joins[0].on.conjuncts().len(), 1);
}

#[test]
fn test_fact_columns_need_no_join() {
    let fixture = Fixture::cra();
    let ctx = fixture.plan("cofog1|time").unwrap();
    assert!(ctx.query.joins.is_empty());
    assert_eq!(ctx.query.from.as_ref().unwrap().table, "cra");
}

#[test]
fn test_restricted_sql_parses_in_every_dialect() {
    let fixture = Fixture::cra();
    let ctx = fixture.plan("cap_or_cur|region|cofog1").unwrap();
    for dialect in [
        Dialect::Sqlite,
        Dialect::Postgres,
        Dialect::DuckDb,
        Dialect::MySql,
        Dialect::TSql,
    ] {
        assert_parses(&ctx.query.to_sql(dialect), dialect);
    }
}

#[test]
fn test_missing_join_column_is_binding_error() {
    let fixture = Fixture::new(include_str!("../fixtures/models/cra_broken.json"));
    assert!(fixture.plan("cofog1").is_ok());

    let err = fixture.plan("cap_or_cur").unwrap_err();
    assert!(err.is_binding(), "{err}");
    assert_eq!(err.http_status(), 500);
    let ctx = err.context().unwrap();
    assert_eq!(ctx.table.as_deref(), Some("cra"));
    assert_eq!(ctx.column.as_deref(), Some("no_such_column"));
    assert_eq!(ctx.reference.as_deref(), Some("cap_or_cur"));
}

#[test]
fn test_undeclared_join_column_is_binding_error() {
    let fixture = Fixture::new(
        r#"{
            "fact_table": "cra",
            "dimensions": {
                "region": {
                    "attributes": {"code": {"column": "regions.code", "type": "string"}},
                    "key_attribute": "code"
                }
            },
            "measures": {"amount": {"column": "amount", "type": "float"}}
        }"#,
    );
    let err = fixture.plan("region").unwrap_err();
    assert!(err.is_binding());
    assert!(err.to_string().contains("join_column"), "{err}");
}

#[test]
fn test_attribute_off_its_key_table_is_binding_error() {
    let fixture = Fixture::new(
        r#"{
            "fact_table": "cra",
            "dimensions": {
                "region": {
                    "attributes": {
                        "code": {"column": "region", "type": "string"},
                        "name": {"column": "regions.name", "type": "string"}
                    },
                    "key_attribute": "code",
                    "join_column": "region"
                }
            },
            "measures": {"amount": {"column": "amount", "type": "float"}}
        }"#,
    );
    let err = fixture.plan("region.name").unwrap_err();
    assert!(err.is_binding());
    assert!(
        err.to_string().contains("Attributes must be of same table as their dimension key"),
        "{err}"
    );
}
