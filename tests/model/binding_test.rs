//! Tests for binding concepts against a reflected SQLite schema.

use babbage::expr::{count, sum, table_col};
use babbage::metadata::{MetadataProvider, TableCache};
use babbage::model::{Binder, Model};
use babbage::SqliteBackend;

fn cra() -> Model {
    Model::from_json(include_str!("../fixtures/models/cra.json")).unwrap()
}

fn backend() -> SqliteBackend {
    let backend = SqliteBackend::open_in_memory().unwrap();
    backend
        .execute_batch(include_str!("../fixtures/sql/cra.sql"))
        .unwrap();
    backend
}

#[test]
fn test_reflects_fixture_tables() {
    let backend = backend();
    let cra = backend.load_table("cra").unwrap();
    assert_eq!(cra.primary_key, vec!["_id"]);
    assert!(cra.has_column("cofog1_label"));
    assert!(backend.has_table("regions").unwrap());
    assert!(!backend.has_table("nope").unwrap());
}

#[test]
fn test_binds_fact_and_dimension_columns() {
    let model = cra();
    let backend = backend();
    let tables = TableCache::new();
    let binder = Binder::new(&model, &tables, &backend);

    let name = binder.bind_ref("cofog1.name").unwrap();
    assert_eq!((name.table.as_str(), name.column.as_str()), ("cra", "cofog1_name"));

    let region = binder.bind_ref("region.name").unwrap();
    assert_eq!((region.table.as_str(), region.column.as_str()), ("regions", "name"));

    let total = binder.bind_ref("amount.sum").unwrap();
    assert_eq!(total.expr, sum(table_col("cra", "amount")));

    let facts = binder.bind_ref("_count").unwrap();
    assert_eq!(facts.expr, count(table_col("cra", "_id")));

    // cra and regions were reflected once each
    assert_eq!(tables.len(), 2);
}

#[test]
fn test_missing_table_is_binding_error() {
    let model = Model::from_json(
        r#"{
            "fact_table": "cra",
            "dimensions": {
                "x": {"attributes": {"y": {"column": "nowhere.y"}}, "key_attribute": "y"}
            }
        }"#,
    )
    .unwrap();
    let backend = backend();
    let tables = TableCache::new();
    let binder = Binder::new(&model, &tables, &backend);

    let err = binder.bind_ref("x.y").unwrap_err();
    assert!(err.is_binding());
    assert_eq!(err.context().unwrap().table.as_deref(), Some("nowhere"));
    assert_eq!(err.http_status(), 500);
}

#[test]
fn test_unknown_ref_is_query_error() {
    let model = cra();
    let backend = backend();
    let tables = TableCache::new();
    let binder = Binder::new(&model, &tables, &backend);

    let err = binder.bind_ref("cofog9").unwrap_err();
    assert!(err.is_query());
    assert_eq!(err.http_status(), 400);
}
