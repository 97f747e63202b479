//! Tests for the concept model against the cra fixture.

use babbage::model::{CardinalityClass, ConceptKind, DataType, Model};

fn cra() -> Model {
    Model::from_json(include_str!("../fixtures/models/cra.json")).unwrap()
}

#[test]
fn test_dimensions_in_declaration_order() {
    let model = cra();
    let names: Vec<&str> = model.dimensions().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["cofog1", "cofog2", "cap_or_cur", "region", "time", "spent"]);
}

#[test]
fn test_every_concept_resolves_by_its_ref() {
    let model = cra();
    for concept in model.concepts() {
        let found = model.get(concept.reference()).unwrap();
        assert_eq!(found, concept, "{concept}");
    }
    assert!(model.contains("amount.max"));
    assert!(!model.contains("amount.median"));
}

#[test]
fn test_kinds() {
    let model = cra();
    assert_eq!(model.get("cofog1").unwrap().kind(), ConceptKind::Dimension);
    assert_eq!(model.get("cofog1.label").unwrap().kind(), ConceptKind::Attribute);
    assert_eq!(model.get("amount").unwrap().kind(), ConceptKind::Measure);
    assert_eq!(model.get("amount.sum").unwrap().kind(), ConceptKind::Aggregate);
    assert_eq!(model.get("_count").unwrap().kind(), ConceptKind::Aggregate);
    assert!(model.get("cofog3").is_none());
}

#[test]
fn test_aggregates_follow_measure_functions() {
    let model = cra();
    let refs: Vec<&str> = model.aggregates().iter().map(|a| a.reference.as_str()).collect();
    assert_eq!(
        refs,
        vec!["_count", "amount.sum", "amount.avg", "amount.min", "amount.max"]
    );
    assert_eq!(model.get("amount.sum").unwrap().label(), "Amount");
    assert_eq!(model.get("_count").unwrap().label(), "Count");
}

#[test]
fn test_dimension_delegates_to_key_attribute() {
    let model = cra();
    let time = model.get("time").unwrap();
    assert_eq!(time.datatype(), Some(DataType::Integer));
    assert_eq!(time.column(), Some("year"));

    let spent = model.get("spent").unwrap();
    assert_eq!(spent.datatype(), Some(DataType::Date));
}

#[test]
fn test_hierarchy_override_keeps_dimension_alias() {
    let model = cra();
    let on = model.get("spending.on").unwrap();
    assert_eq!(on.kind(), ConceptKind::Attribute);
    assert_eq!(on.alias(), Some("spent.on"));
    assert_eq!(model.get("spent.on").unwrap(), on);
    assert!(model.get("spending").is_none());
}

#[test]
fn test_match_expands_dimensions_only() {
    let model = cra();
    let refs = |r: &str| -> Vec<String> {
        model
            .match_ref(r)
            .iter()
            .map(|c| c.reference().to_string())
            .collect()
    };
    assert_eq!(refs("region"), vec!["region.code", "region.name"]);
    assert_eq!(refs("region.name"), vec!["region.name"]);
    assert_eq!(refs("amount"), vec!["amount"]);
    assert!(refs("nope").is_empty());
}

#[test]
fn test_hierarchies() {
    let model = cra();
    let cofog = &model.hierarchies()[0];
    assert_eq!(cofog.name, "cofog");
    assert_eq!(cofog.levels, vec!["cofog1", "cofog2"]);
}

#[test]
fn test_model_description() {
    let mut model = cra();
    model.set_cardinality("cofog1", 4).unwrap();
    let desc = model.to_json();

    assert_eq!(desc["fact_table"], "cra");
    assert_eq!(desc["dimensions"]["cofog1"]["key_ref"], "cofog1.name");
    assert_eq!(desc["dimensions"]["cofog1"]["label_ref"], "cofog1.label");
    assert_eq!(desc["dimensions"]["cofog1"]["cardinality_class"], "tiny");
    assert_eq!(desc["dimensions"]["region"]["cardinality_class"], serde_json::Value::Null);
    assert_eq!(desc["dimensions"]["region"]["attributes"]["code"]["ref"], "region.code");
    assert_eq!(desc["aggregates"]["amount.avg"]["measure"], "amount");
    assert_eq!(desc["hierarchies"]["cofog"]["levels"][1], "cofog2");
}

#[test]
fn test_cardinality_classes() {
    assert_eq!(CardinalityClass::classify(None), None);
    assert_eq!(CardinalityClass::classify(Some(0)), None);
    assert_eq!(CardinalityClass::classify(Some(7)), Some(CardinalityClass::Tiny));
    assert_eq!(CardinalityClass::classify(Some(8)), Some(CardinalityClass::Low));
    assert_eq!(CardinalityClass::classify(Some(50)), Some(CardinalityClass::Low));
    assert_eq!(CardinalityClass::classify(Some(1000)), Some(CardinalityClass::Medium));
    assert_eq!(CardinalityClass::classify(Some(1001)), Some(CardinalityClass::High));
}

#[test]
fn test_invalid_models_are_rejected() {
    let err = Model::from_json(r#"{"fact_table": "t", "dimensions": {"d": {"attributes": {}, "key_attribute": "x"}}}"#)
        .unwrap_err();
    assert!(err.to_string().contains("no attribute x"), "{err}");

    assert!(Model::from_json("not json").is_err());
}
