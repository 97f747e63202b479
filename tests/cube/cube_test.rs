//! End-to-end tests of the three cube operations over the cra fixture.

use std::collections::HashSet;
use std::sync::Arc;

use babbage::model::CardinalityClass;
use babbage::{Cube, Model, QueryParams, SqliteBackend};
use serde_json::json;

fn backend() -> Arc<SqliteBackend> {
    let backend = SqliteBackend::open_in_memory().unwrap();
    backend
        .execute_batch(include_str!("../fixtures/sql/cra.sql"))
        .unwrap();
    Arc::new(backend)
}

fn cube_from(model: &str) -> Cube {
    Cube::new("cra", Model::from_json(model).unwrap(), backend())
}

fn cra() -> Cube {
    cube_from(include_str!("../fixtures/models/cra.json"))
}

// =============================================================================
// Facts
// =============================================================================

#[test]
fn test_all_facts() {
    let cube = cra();
    let result = cube.facts(&QueryParams::new()).unwrap();

    assert_eq!(result.total_fact_count, 36);
    assert_eq!(result.data.len(), 36);
    assert_eq!(result.page, 1);
    assert_eq!(result.fields.len(), 10);
    assert_eq!(result.fields[0], "cofog1.name");
    assert_eq!(result.fields[9], "amount");
    assert!(result.cell.is_empty());
    assert!(result.order.is_empty());
}

#[test]
fn test_facts_cut() {
    let cube = cra();
    let result = cube
        .facts(&QueryParams::new().cuts(r#"cofog1:"4""#))
        .unwrap();
    assert_eq!(result.total_fact_count, 12);
    assert_eq!(result.data.len(), 12);
    assert_eq!(
        serde_json::to_value(&result.cell).unwrap(),
        json!([{"ref": "cofog1", "operator": ":", "value": "4"}])
    );
}

#[test]
fn test_facts_cut_on_dimension_table_counts_facts() {
    let cube = cra();
    let result = cube
        .facts(&QueryParams::new().fields("region.name").cuts("region.code:N"))
        .unwrap();
    assert_eq!(result.total_fact_count, 12);
    assert_eq!(result.data.len(), 12);
    assert!(result.data.iter().all(|r| r["region.name"] == "North"));
}

#[test]
fn test_facts_date_cut() {
    let cube = cra();
    let result = cube
        .facts(&QueryParams::new().fields("spent.on,amount").cuts("spent.on:2010-01-15"))
        .unwrap();
    assert_eq!(result.total_fact_count, 2);
    assert!(result.data.iter().all(|r| r["spent.on"] == "2010-01-15"));
}

#[test]
fn test_output_keys_follow_the_requested_ref() {
    let cube = cra();

    let by_alias = cube
        .facts(&QueryParams::new().fields("spent.on").page_size(1))
        .unwrap();
    assert_eq!(by_alias.fields, vec!["spent.on"]);
    assert!(by_alias.data[0].contains_key("spent.on"));
    assert!(!by_alias.data[0].contains_key("spending.on"));

    let by_ref = cube
        .facts(&QueryParams::new().fields("spending.on").page_size(1))
        .unwrap();
    assert_eq!(by_ref.fields, vec!["spending.on"]);
    assert!(by_ref.data[0].contains_key("spending.on"));
    assert!(!by_ref.data[0].contains_key("spent.on"));

    let by_dimension = cube
        .facts(&QueryParams::new().fields("spent").page_size(1))
        .unwrap();
    assert_eq!(by_dimension.fields, vec!["spending.on"]);

    let cells = cube
        .aggregate(&QueryParams::new().drilldowns("spent.on").aggregates("amount.sum"))
        .unwrap();
    assert_eq!(cells.attributes, vec!["spent.on"]);
    assert!(cells.cells.iter().all(|c| c.contains_key("spent.on")));

    let cells = cube
        .aggregate(&QueryParams::new().drilldowns("spending.on").aggregates("amount.sum"))
        .unwrap();
    assert_eq!(cells.attributes, vec!["spending.on"]);
    assert!(cells.cells.iter().all(|c| c.contains_key("spending.on")));
    assert!(cells.cells.iter().all(|c| !c.contains_key("spent.on")));
}

#[test]
fn test_facts_pages_are_disjoint() {
    let cube = cra();
    let page = |n: u64| {
        cube.facts(
            &QueryParams::new()
                .fields("amount")
                .cuts("time.year:2010")
                .page(n)
                .page_size(10),
        )
        .unwrap()
    };
    let first = page(1);
    let second = page(2);

    assert_eq!(first.total_fact_count, 15);
    assert_eq!(first.data.len(), 10);
    assert_eq!(second.data.len(), 5);
    assert_eq!(second.page, 2);

    let amounts = |rows: &[babbage::metadata::Row]| -> HashSet<i64> {
        rows.iter()
            .map(|r| r["amount"].as_f64().unwrap() as i64)
            .collect()
    };
    let a = amounts(&first.data);
    let b = amounts(&second.data);
    assert!(a.is_disjoint(&b));
    assert_eq!(a.union(&b).count(), 15);
}

#[test]
fn test_facts_ordering() {
    let cube = cra();
    let result = cube
        .facts(&QueryParams::new().fields("amount").order("amount:desc").page_size(3))
        .unwrap();
    let amounts: Vec<f64> = result.data.iter().map(|r| r["amount"].as_f64().unwrap()).collect();
    assert_eq!(amounts, vec![360.0, 350.0, 340.0]);
    assert_eq!(serde_json::to_value(&result.order).unwrap(), json!([["amount", "desc"]]));
}

#[test]
fn test_page_size_is_clamped_to_page_max() {
    let cube = cra().with_page_max(20);
    let result = cube.facts(&QueryParams::new().page_size(100)).unwrap();
    assert_eq!(result.page_size, 20);
    assert_eq!(result.data.len(), 20);

    let result = cube
        .facts(&QueryParams::new().page_size(100).page_max(5))
        .unwrap();
    assert_eq!(result.page_size, 5);
}

#[test]
fn test_huge_page_is_past_the_end() {
    let cube = cra();
    let result = cube
        .facts(
            &QueryParams::new()
                .fields("amount")
                .order("amount:desc")
                .page(u64::MAX / 5)
                .page_size(10),
        )
        .unwrap();
    assert_eq!(result.total_fact_count, 36);
    assert_eq!(result.page, u64::MAX / 5);
    assert!(result.data.is_empty());

    let cells = cube
        .aggregate(&QueryParams::new().drilldowns("cofog1").page(u64::MAX).page_size(2))
        .unwrap();
    assert_eq!(cells.total_cell_count, 4);
    assert!(cells.cells.is_empty());
}

// =============================================================================
// Aggregate
// =============================================================================

#[test]
fn test_aggregate_drilldown() {
    let cube = cra();
    let result = cube
        .aggregate(&QueryParams::new().drilldowns("cofog1"))
        .unwrap();

    assert_eq!(result.total_cell_count, 4);
    assert_eq!(result.cells.len(), 4);
    for cell in &result.cells {
        assert!(cell.contains_key("amount.sum"));
        assert!(!cell.contains_key("amount"));
    }
    assert_eq!(result.attributes, vec!["cofog1.name", "cofog1.label"]);
    assert_eq!(result.aggregates[0], "_count");
    assert_eq!(result.summary["amount.sum"], json!(6660.0));
    assert_eq!(result.summary["_count"], json!(36));
}

#[test]
fn test_aggregate_order_by_aggregate() {
    let cube = cra();
    let result = cube
        .aggregate(
            &QueryParams::new()
                .drilldowns("cofog1")
                .aggregates("amount.sum")
                .order("amount.sum:desc"),
        )
        .unwrap();
    assert_eq!(result.cells[0]["cofog1.name"], "4");
    assert_eq!(result.cells[0]["amount.sum"], json!(3660.0));
    assert_eq!(result.cells[3]["cofog1.name"], "1");
}

#[test]
fn test_aggregate_star_join() {
    let cube = cra();
    let result = cube
        .aggregate(
            &QueryParams::new()
                .drilldowns("cap_or_cur|region")
                .aggregates("amount.sum"),
        )
        .unwrap();
    assert_eq!(result.total_cell_count, 6);
    let total: f64 = result.cells.iter().map(|c| c["amount.sum"].as_f64().unwrap()).sum();
    assert_eq!(total, 6660.0);

    let capital = cube
        .aggregate(&QueryParams::new().aggregates("amount.sum").cuts("cap_or_cur:CAP"))
        .unwrap();
    assert_eq!(capital.total_cell_count, 1);
    assert_eq!(capital.summary["amount.sum"], json!(3240.0));
}

#[test]
fn test_aggregate_paginates_cells() {
    let cube = cra();
    let result = cube
        .aggregate(&QueryParams::new().drilldowns("cofog2").page(2).page_size(3))
        .unwrap();
    assert_eq!(result.total_cell_count, 8);
    assert_eq!(result.cells.len(), 3);
    assert_eq!(result.cells[0]["cofog2.name"], "2.2");
}

// =============================================================================
// Members
// =============================================================================

#[test]
fn test_members_page() {
    let cube = cra();
    let result = cube
        .members("cofog1", &QueryParams::new().page_size(2))
        .unwrap();
    assert_eq!(result.total_member_count, 4);
    assert_eq!(result.data.len(), 2);
    assert_eq!(result.page, 1);
    assert_eq!(result.page_size, 2);
    assert_eq!(result.data[0]["cofog1.name"], "1");
    assert_eq!(result.data[0]["cofog1.label"], "General public services");
}

#[test]
fn test_members_with_cut() {
    let cube = cra();
    let result = cube
        .members("cofog2", &QueryParams::new().cuts(r#"cofog1:"4""#))
        .unwrap();
    assert_eq!(result.total_member_count, 2);
    let names: Vec<&str> = result
        .data
        .iter()
        .map(|r| r["cofog2.name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["4.1", "4.2"]);
}

#[test]
fn test_members_rejects_measures() {
    let cube = cra();
    let err = cube.members("amount", &QueryParams::new()).unwrap_err();
    assert!(err.is_query());
}

#[test]
fn test_members_take_exactly_one_ref() {
    let cube = cra();
    for reference in ["cofog1|cofog2", ""] {
        let err = cube.members(reference, &QueryParams::new()).unwrap_err();
        assert!(err.is_query(), "{err}");
        assert_eq!(err.http_status(), 400);
    }

    let repeated = cube.members("cofog1|cofog1", &QueryParams::new()).unwrap();
    assert_eq!(repeated.total_member_count, 4);
}

#[test]
fn test_compute_cardinalities() {
    let mut cube = cra();
    cube.compute_cardinalities().unwrap();

    let cofog1 = cube.model().dimension("cofog1").unwrap();
    assert_eq!(cofog1.cardinality, Some(4));
    assert_eq!(cofog1.cardinality_class(), Some(CardinalityClass::Tiny));
    assert_eq!(cube.model().dimension("time").unwrap().cardinality, Some(3));
    assert_eq!(cube.model().to_json()["dimensions"]["cofog2"]["cardinality_class"], "low");
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_invalid_refs_are_query_errors() {
    let cube = cra();
    let cases = [
        QueryParams::new().cuts(r#"nosuchref:"4""#),
        QueryParams::new().fields("nosuchref"),
        QueryParams::new().order("nosuchref"),
    ];
    for params in &cases {
        let err = cube.facts(params).unwrap_err();
        assert!(err.is_query(), "{err}");
        assert_eq!(err.http_status(), 400);
    }

    let err = cube
        .aggregate(&QueryParams::new().drilldowns("amount"))
        .unwrap_err();
    assert!(err.is_query());
}

#[test]
fn test_cut_on_aggregate_is_query_error() {
    let cube = cra();
    for cuts in ["amount.sum:5", "_count:1"] {
        let err = cube.facts(&QueryParams::new().cuts(cuts)).unwrap_err();
        assert!(err.is_query(), "{err}");
        assert_eq!(err.http_status(), 400);
    }
    let err = cube
        .aggregate(&QueryParams::new().cuts("amount.sum:5"))
        .unwrap_err();
    assert!(err.is_query(), "{err}");
}

#[test]
fn test_cut_type_mismatch_is_query_error() {
    let cube = cra();
    let err = cube
        .facts(&QueryParams::new().cuts("time.year:abc"))
        .unwrap_err();
    assert!(err.is_query());
    assert!(err.to_string().starts_with("Query error: Invalid value"), "{err}");
}

#[test]
fn test_broken_join_column_is_binding_error() {
    let cube = cube_from(include_str!("../fixtures/models/cra_broken.json"));

    assert_eq!(cube.facts(&QueryParams::new().fields("cofog1")).unwrap().total_fact_count, 36);

    let failing = [
        QueryParams::new().fields("cap_or_cur"),
        QueryParams::new().cuts("cap_or_cur:CAP"),
    ];
    for params in &failing {
        let err = cube.facts(params).unwrap_err();
        assert!(err.is_binding(), "{err}");
        assert_eq!(err.http_status(), 500);
    }

    let err = cube
        .aggregate(&QueryParams::new().drilldowns("cap_or_cur"))
        .unwrap_err();
    assert!(err.is_binding());
}
