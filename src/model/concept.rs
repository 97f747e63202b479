//! Concepts: the named, queryable parts of a model.
//!
//! Concepts are built once when the [`Model`](super::Model) is constructed.
//! [`Concept`] is a borrowed, closed view over the four kinds so callers can
//! dispatch with an exhaustive `match` instead of probing types.

use std::fmt;

use super::spec::JoinColumn;
use super::types::{AggregateFunction, CardinalityClass, DataType};

/// Kind tag of a [`Concept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConceptKind {
    Dimension,
    Attribute,
    Measure,
    Aggregate,
}

impl fmt::Display for ConceptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConceptKind::Dimension => "dimension",
            ConceptKind::Attribute => "attribute",
            ConceptKind::Measure => "measure",
            ConceptKind::Aggregate => "aggregate",
        })
    }
}

/// A concrete column-backed property of a dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    /// `<hierarchy>.<name>`
    pub reference: String,
    /// `<dimension>.<name>`, set only when the hierarchy prefix differs.
    pub alias: Option<String>,
    /// Physical column, optionally qualified as `table.column`.
    pub column: String,
    pub datatype: Option<DataType>,
    /// Name of the owning dimension.
    pub dimension: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub attributes: Vec<Attribute>,
    pub join_column: Option<JoinColumn>,
    pub cardinality: Option<u64>,
    pub(crate) key_attribute: usize,
    pub(crate) label_attribute: usize,
}

impl Dimension {
    pub fn reference(&self) -> &str {
        &self.name
    }

    pub fn key_attribute(&self) -> &Attribute {
        &self.attributes[self.key_attribute]
    }

    /// Attribute used for display; falls back to the key attribute.
    pub fn label_attribute(&self) -> &Attribute {
        &self.attributes[self.label_attribute]
    }

    /// A dimension is typed and stored like its key attribute.
    pub fn datatype(&self) -> Option<DataType> {
        self.key_attribute().datatype
    }

    pub fn cardinality_class(&self) -> Option<CardinalityClass> {
        CardinalityClass::classify(self.cardinality)
    }

    /// Attributes with the key attribute first, the rest in declaration order.
    pub fn attributes_key_first(&self) -> impl Iterator<Item = &Attribute> {
        std::iter::once(self.key_attribute()).chain(
            self.attributes
                .iter()
                .enumerate()
                .filter(move |(i, _)| *i != self.key_attribute)
                .map(|(_, a)| a),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub column: String,
    pub datatype: Option<DataType>,
    pub aggregates: Vec<AggregateFunction>,
}

/// An aggregate function applied to a measure, or `_count` over the fact
/// table's primary key when `measure` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub reference: String,
    pub label: String,
    pub function: AggregateFunction,
    /// Ref of the aggregated measure.
    pub measure: Option<String>,
}

impl Aggregate {
    pub(crate) fn count() -> Self {
        Self {
            reference: "_count".into(),
            label: "Count".into(),
            function: AggregateFunction::Count,
            measure: None,
        }
    }

    pub(crate) fn over(measure: &Measure, function: AggregateFunction) -> Self {
        Self {
            reference: format!("{}.{}", measure.name, function),
            label: measure.label.clone(),
            function,
            measure: Some(measure.name.clone()),
        }
    }
}

/// Descriptive grouping of dimensions into ordered levels.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    pub name: String,
    pub label: String,
    pub levels: Vec<String>,
}

/// Borrowed view of any concept in a model.
#[derive(Debug, Clone, Copy)]
pub enum Concept<'a> {
    Dimension(&'a Dimension),
    Attribute(&'a Attribute),
    Measure(&'a Measure),
    Aggregate(&'a Aggregate),
}

impl<'a> Concept<'a> {
    pub fn kind(&self) -> ConceptKind {
        match self {
            Concept::Dimension(_) => ConceptKind::Dimension,
            Concept::Attribute(_) => ConceptKind::Attribute,
            Concept::Measure(_) => ConceptKind::Measure,
            Concept::Aggregate(_) => ConceptKind::Aggregate,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Concept::Dimension(d) => &d.name,
            Concept::Attribute(a) => &a.name,
            Concept::Measure(m) => &m.name,
            Concept::Aggregate(a) => a.function.as_str(),
        }
    }

    pub fn label(&self) -> &'a str {
        match self {
            Concept::Dimension(d) => &d.label,
            Concept::Attribute(a) => &a.label,
            Concept::Measure(m) => &m.label,
            Concept::Aggregate(a) => &a.label,
        }
    }

    pub fn description(&self) -> Option<&'a str> {
        match self {
            Concept::Dimension(d) => d.description.as_deref(),
            Concept::Attribute(a) => a.description.as_deref(),
            Concept::Measure(m) => m.description.as_deref(),
            Concept::Aggregate(_) => None,
        }
    }

    pub fn reference(&self) -> &'a str {
        match self {
            Concept::Dimension(d) => &d.name,
            Concept::Attribute(a) => &a.reference,
            Concept::Measure(m) => &m.name,
            Concept::Aggregate(a) => &a.reference,
        }
    }

    pub fn alias(&self) -> Option<&'a str> {
        match self {
            Concept::Attribute(a) => a.alias.as_deref(),
            _ => None,
        }
    }

    /// Declared physical column; a dimension answers with its key's column.
    pub fn column(&self) -> Option<&'a str> {
        match self {
            Concept::Dimension(d) => Some(&d.key_attribute().column),
            Concept::Attribute(a) => Some(&a.column),
            Concept::Measure(m) => Some(&m.column),
            Concept::Aggregate(_) => None,
        }
    }

    pub fn datatype(&self) -> Option<DataType> {
        match self {
            Concept::Dimension(d) => d.datatype(),
            Concept::Attribute(a) => a.datatype,
            Concept::Measure(m) => m.datatype,
            Concept::Aggregate(_) => None,
        }
    }

    /// Whether `reference` names this concept, by ref or by alias.
    pub fn matches(&self, reference: &str) -> bool {
        self.reference() == reference || self.alias() == Some(reference)
    }

    /// Output label when selected through `requested`: the requested ref if
    /// it names this concept directly, otherwise the concept's own ref.
    pub fn label_for(&self, requested: &str) -> String {
        if self.matches(requested) {
            requested.to_string()
        } else {
            self.reference().to_string()
        }
    }
}

impl PartialEq for Concept<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.reference() == other.reference()
    }
}

impl fmt::Display for Concept<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}({})>", self.kind(), self.reference())
    }
}
