//! Serde representation of a cube model document.
//!
//! A model is a JSON object:
//!
//! ```json
//! {
//!   "fact_table": "cra",
//!   "dimensions": {
//!     "cofog1": {
//!       "attributes": {"name": {"column": "cofog1_name", "type": "string"}},
//!       "key_attribute": "name",
//!       "join_column": ["cofog1_id", "id"]
//!     }
//!   },
//!   "measures": {"amount": {"column": "amount", "aggregates": ["sum"]}},
//!   "hierarchies": {"cofog": {"levels": ["cofog1", "cofog2"]}}
//! }
//! ```
//!
//! Object keys keep their document order: dimensions, attributes and
//! measures are enumerated in the order they were declared.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::Serializer;
use serde::Serialize;

use super::types::{AggregateFunction, DataType};

/// An ordered `name -> T` map as declared in the model document.
pub type Named<T> = Vec<(String, T)>;

/// Top-level model document.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct ModelSpec {
    pub fact_table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "ordered")]
    pub dimensions: Named<DimensionSpec>,
    #[serde(default, with = "ordered")]
    pub measures: Named<MeasureSpec>,
    #[serde(default, with = "ordered")]
    pub hierarchies: Named<HierarchySpec>,
}

impl ModelSpec {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct DimensionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "ordered")]
    pub attributes: Named<AttributeSpec>,
    pub key_attribute: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_column: Option<JoinColumn>,
    /// Prefix used in attribute refs instead of the dimension name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct AttributeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub column: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<DataType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct MeasureSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub column: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<DataType>,
    #[serde(default = "default_aggregates")]
    pub aggregates: Vec<AggregateFunction>,
}

fn default_aggregates() -> Vec<AggregateFunction> {
    vec![AggregateFunction::Sum]
}

#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct HierarchySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub levels: Vec<String>,
}

/// How a dimension table joins onto the fact table.
///
/// `Columns` is the general form: `[fact_column, dimension_column]`. A bare
/// string names the fact column and joins it against the dimension's key
/// column. Arity is checked when the join is built, not at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum JoinColumn {
    Column(String),
    Columns(Vec<String>),
}

impl JoinColumn {
    /// Split into `(fact_column, dimension_column)`; `None` for the
    /// dimension side means "the key attribute's column".
    pub fn resolve(&self) -> Option<(&str, Option<&str>)> {
        match self {
            JoinColumn::Column(fact) => Some((fact.as_str(), None)),
            JoinColumn::Columns(cols) => match cols.as_slice() {
                [fact, dim] => Some((fact.as_str(), Some(dim.as_str()))),
                _ => None,
            },
        }
    }
}

impl fmt::Display for JoinColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinColumn::Column(c) => write!(f, "{c}"),
            JoinColumn::Columns(cols) => write!(f, "[{}]", cols.join(", ")),
        }
    }
}

/// (De)serialize a JSON object as a `Vec<(String, T)>` in document order.
mod ordered {
    use super::*;

    pub fn serialize<S, T>(entries: &Named<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Named<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }

    struct OrderedVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
        type Value = Named<T>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, T>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }
    }
}
