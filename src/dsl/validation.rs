//! Semantic checks of parsed queries against a model.
//!
//! Parsing never looks at the model; this pass does, and turns every
//! problem into a query error naming the construct, its offset and the ref.

use std::fmt;

use super::ast::{Cut, Ordering, Ref};
use super::Diagnostic;
use crate::error::{BabbageError, BabbageResult, ErrorContext};
use crate::model::{ConceptKind, Model};

/// Which sub-language a ref came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    Cut,
    Field,
    Drilldown,
    Aggregate,
    Order,
}

impl Construct {
    pub fn as_str(&self) -> &'static str {
        match self {
            Construct::Cut => "cut",
            Construct::Field => "field",
            Construct::Drilldown => "drilldown",
            Construct::Aggregate => "aggregate",
            Construct::Order => "order",
        }
    }

    /// Concept kinds a ref in this position may resolve to.
    fn accepts(&self, kind: ConceptKind) -> bool {
        match self {
            Construct::Order => true,
            Construct::Cut => kind != ConceptKind::Aggregate,
            Construct::Field => matches!(
                kind,
                ConceptKind::Measure | ConceptKind::Dimension | ConceptKind::Attribute
            ),
            Construct::Drilldown => {
                matches!(kind, ConceptKind::Dimension | ConceptKind::Attribute)
            }
            Construct::Aggregate => kind == ConceptKind::Aggregate,
        }
    }
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a ref that is unknown or of the wrong kind.
pub fn invalid(construct: Construct, reference: &Ref) -> BabbageError {
    BabbageError::query(
        format!(
            "Invalid {construct} at offset {}: {:?}",
            reference.position(),
            reference.value
        ),
        ErrorContext::new()
            .with_construct(construct.as_str())
            .at(reference.position())
            .with_ref(reference.value.as_str()),
    )
}

/// Error for a query string that does not parse.
pub fn syntax_error(construct: Construct, diagnostics: Vec<Diagnostic>) -> BabbageError {
    let position = diagnostics.first().map(|d| d.span.start).unwrap_or(0);
    let detail = diagnostics
        .iter()
        .map(|d| d.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    BabbageError::query(
        format!("Cannot parse {construct}: {detail}"),
        ErrorContext::new()
            .with_construct(construct.as_str())
            .at(position),
    )
}

fn check(model: &Model, construct: Construct, reference: &Ref) -> BabbageResult<()> {
    match model.get(&reference.value) {
        Some(concept) if construct.accepts(concept.kind()) => Ok(()),
        _ => Err(invalid(construct, reference)),
    }
}

pub fn validate_cuts(model: &Model, cuts: &[Cut]) -> BabbageResult<()> {
    cuts.iter()
        .try_for_each(|c| check(model, Construct::Cut, &c.reference))
}

pub fn validate_refs(model: &Model, construct: Construct, refs: &[Ref]) -> BabbageResult<()> {
    refs.iter().try_for_each(|r| check(model, construct, r))
}

pub fn validate_ordering(model: &Model, ordering: &[Ordering]) -> BabbageResult<()> {
    ordering
        .iter()
        .try_for_each(|o| check(model, Construct::Order, &o.reference))
}
