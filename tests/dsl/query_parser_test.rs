//! Tests for the query mini-language: parsing, formatting and validation.

use babbage::dsl::{self, format_cuts, parser, CutValue, Literal, SortDirection};
use babbage::model::Model;

fn cra() -> Model {
    Model::from_json(include_str!("../fixtures/models/cra.json")).unwrap()
}

#[test]
fn test_formatted_cuts_reparse_to_the_same_cuts() {
    let inputs = [
        r#"cofog1:"4""#,
        "time.year:2010;2011",
        "spent.on:2010-01-15|region.code:N",
        r#"cofog1.label:"Public order; and \"safety\"""#,
        "cap_or_cur.code:",
    ];
    for input in inputs {
        let parsed = parser::parse_cuts(Some(input)).unwrap();
        let formatted = format_cuts(&parsed);
        let reparsed = parser::parse_cuts(Some(&formatted)).unwrap();

        let values = |cuts: &[dsl::Cut]| -> Vec<(String, CutValue)> {
            cuts.iter()
                .map(|c| (c.reference.value.clone(), c.value.clone()))
                .collect()
        };
        assert_eq!(values(&parsed), values(&reparsed), "{input} -> {formatted}");
        assert_eq!(format_cuts(&reparsed), formatted);
    }
}

#[test]
fn test_values_are_typed_by_lexical_form() {
    let cuts = parser::parse_cuts(Some(r#"a:"2010"|b:2010|c:2010-01-15|d:North"#)).unwrap();
    assert_eq!(cuts[0].value.values()[0], Literal::String("2010".into()));
    assert_eq!(cuts[1].value.values()[0], Literal::Integer(2010));
    assert!(matches!(cuts[2].value.values()[0], Literal::Date(_)));
    assert_eq!(cuts[3].value.values()[0], Literal::String("North".into()));
}

#[test]
fn test_validated_entry_points() {
    let model = cra();

    let cuts = dsl::cuts(&model, Some(r#"cofog1:"4"|time.year:2010"#)).unwrap();
    assert_eq!(cuts.len(), 2);

    let drilldowns = dsl::drilldowns(&model, Some("cofog1|region|cofog1")).unwrap();
    let refs: Vec<&str> = drilldowns.iter().map(|d| d.value.as_str()).collect();
    assert_eq!(refs, vec!["cofog1", "region"]);

    let order = dsl::ordering(&model, Some("amount.sum:desc,cofog1")).unwrap();
    assert_eq!(order[0].direction, SortDirection::Desc);
    assert_eq!(order[1].direction, SortDirection::Asc);

    assert!(dsl::fields(&model, None).unwrap().is_empty());
    assert!(dsl::aggregates(&model, Some("  ")).unwrap().is_empty());
}

#[test]
fn test_semantic_errors_name_construct_and_position() {
    let model = cra();

    let err = dsl::drilldowns(&model, Some("cofog1|amount")).unwrap_err();
    assert!(err.is_query());
    let ctx = err.context().unwrap();
    assert_eq!(ctx.construct.as_deref(), Some("drilldown"));
    assert_eq!(ctx.position, Some(7));
    assert_eq!(ctx.reference.as_deref(), Some("amount"));

    let err = dsl::aggregates(&model, Some("amount")).unwrap_err();
    assert_eq!(err.context().unwrap().construct.as_deref(), Some("aggregate"));

    let err = dsl::cuts(&model, Some("foo:bar")).unwrap_err();
    assert_eq!(err.context().unwrap().construct.as_deref(), Some("cut"));

    let err = dsl::ordering(&model, Some("amount,nope:desc")).unwrap_err();
    assert_eq!(err.context().unwrap().position, Some(7));
}

#[test]
fn test_syntax_errors_are_query_errors() {
    let model = cra();
    let err = dsl::cuts(&model, Some("cofog1")).unwrap_err();
    assert!(err.is_query());
    assert!(err.to_string().starts_with("Query error: Cannot parse cut"), "{err}");

    assert!(dsl::ordering(&model, Some("amount:up")).unwrap_err().is_query());
    assert!(dsl::fields(&model, Some("amount,")).unwrap_err().is_query());
}
