//! The logical model of a cube.
//!
//! A [`Model`] is parsed once from a [`ModelSpec`] into memoized concept
//! collections plus a reference index:
//!
//! ```text
//! ModelSpec (JSON)
//!     │
//!     ▼ Model::new
//! ┌──────────────────────────────────────────────────────┐
//! │ measures     [amount]                                │
//! │ dimensions   [cofog1 → attributes [name, label]]     │
//! │ aggregates   [_count, amount.sum]                    │
//! │ hierarchies  [cofog → levels [cofog1, cofog2]]       │
//! │ index        ref/alias → slot                        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups ([`Model::get`], [`Model::match_ref`]) go through the index and
//! never rescan the spec.

pub mod binding;
pub mod concept;
pub mod spec;
pub mod types;

pub use binding::{Binder, BoundColumn};
pub use concept::{Aggregate, Attribute, Concept, ConceptKind, Dimension, Hierarchy, Measure};
pub use spec::{
    AttributeSpec, DimensionSpec, HierarchySpec, JoinColumn, MeasureSpec, ModelSpec, Named,
};
pub use types::{AggregateFunction, CardinalityClass, DataType};

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};

use crate::error::{BabbageError, BabbageResult, ErrorContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Dimension(usize),
    Attribute(usize, usize),
    Measure(usize),
    Aggregate(usize),
}

/// A cube's logical schema. Read-only once built, except for
/// [`rebuild`](Model::rebuild) and [`set_cardinality`](Model::set_cardinality).
#[derive(Debug, Clone)]
pub struct Model {
    spec: ModelSpec,
    dimensions: Vec<Dimension>,
    measures: Vec<Measure>,
    aggregates: Vec<Aggregate>,
    hierarchies: Vec<Hierarchy>,
    index: HashMap<String, Slot>,
}

impl Model {
    /// Build a model, checking its structural invariants.
    pub fn new(spec: ModelSpec) -> BabbageResult<Self> {
        let measures: Vec<Measure> = spec
            .measures
            .iter()
            .map(|(name, m)| Measure {
                name: name.clone(),
                label: m.label.clone().unwrap_or_else(|| name.clone()),
                description: m.description.clone(),
                column: m.column.clone(),
                datatype: m.datatype,
                aggregates: m.aggregates.clone(),
            })
            .collect();

        let dimensions = spec
            .dimensions
            .iter()
            .map(|(name, d)| build_dimension(name, d))
            .collect::<BabbageResult<Vec<_>>>()?;

        let mut aggregates = vec![Aggregate::count()];
        for measure in &measures {
            for function in &measure.aggregates {
                aggregates.push(Aggregate::over(measure, *function));
            }
        }

        let hierarchies = build_hierarchies(&spec, &dimensions)?;

        let mut model = Self {
            spec,
            dimensions,
            measures,
            aggregates,
            hierarchies,
            index: HashMap::new(),
        };
        model.index = model.build_index()?;
        Ok(model)
    }

    pub fn from_json(text: &str) -> BabbageResult<Self> {
        Self::new(ModelSpec::from_json(text)?)
    }

    pub fn from_value(value: Value) -> BabbageResult<Self> {
        Self::new(serde_json::from_value(value)?)
    }

    /// Replace the spec and recompute every concept.
    pub fn rebuild(&mut self, spec: ModelSpec) -> BabbageResult<()> {
        *self = Self::new(spec)?;
        Ok(())
    }

    fn build_index(&self) -> BabbageResult<HashMap<String, Slot>> {
        let mut index = HashMap::new();
        let mut insert = |key: &str, slot: Slot| -> BabbageResult<()> {
            if index.insert(key.to_string(), slot).is_some() {
                return Err(BabbageError::Model(format!("Duplicate reference: {key}")));
            }
            Ok(())
        };

        for (i, m) in self.measures.iter().enumerate() {
            insert(&m.name, Slot::Measure(i))?;
        }
        for (i, d) in self.dimensions.iter().enumerate() {
            insert(&d.name, Slot::Dimension(i))?;
            for (j, a) in d.attributes.iter().enumerate() {
                insert(&a.reference, Slot::Attribute(i, j))?;
                if let Some(alias) = &a.alias {
                    insert(alias, Slot::Attribute(i, j))?;
                }
            }
        }
        for (i, a) in self.aggregates.iter().enumerate() {
            insert(&a.reference, Slot::Aggregate(i))?;
        }
        Ok(index)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn fact_table(&self) -> &str {
        &self.spec.fact_table
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    /// `_count` first, then one aggregate per (measure, function) in
    /// declaration order.
    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    pub fn hierarchies(&self) -> &[Hierarchy] {
        &self.hierarchies
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.dimensions.iter().flat_map(|d| d.attributes.iter())
    }

    /// Every concept: measures, each dimension followed by its attributes,
    /// then aggregates.
    pub fn concepts(&self) -> impl Iterator<Item = Concept<'_>> {
        let measures = self.measures.iter().map(Concept::Measure);
        let dimensions = self.dimensions.iter().flat_map(|d| {
            std::iter::once(Concept::Dimension(d)).chain(d.attributes.iter().map(Concept::Attribute))
        });
        let aggregates = self.aggregates.iter().map(Concept::Aggregate);
        measures.chain(dimensions).chain(aggregates)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// The concept whose ref or alias is `reference`.
    pub fn get(&self, reference: &str) -> Option<Concept<'_>> {
        let slot = self.index.get(reference)?;
        Some(match *slot {
            Slot::Dimension(i) => Concept::Dimension(&self.dimensions[i]),
            Slot::Attribute(i, j) => Concept::Attribute(&self.dimensions[i].attributes[j]),
            Slot::Measure(i) => Concept::Measure(&self.measures[i]),
            Slot::Aggregate(i) => Concept::Aggregate(&self.aggregates[i]),
        })
    }

    /// Like [`get`](Model::get), failing when nothing matches.
    pub fn concept(&self, reference: &str) -> BabbageResult<Concept<'_>> {
        self.get(reference).ok_or_else(|| {
            BabbageError::query(
                format!("No such reference: {reference}"),
                ErrorContext::new().with_ref(reference),
            )
        })
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.index.contains_key(reference)
    }

    /// Expand a ref into bindable concepts.
    ///
    /// A dimension expands to its attributes, key attribute first. Any other
    /// concept is returned alone; unknown refs yield an empty list.
    pub fn match_ref(&self, reference: &str) -> Vec<Concept<'_>> {
        match self.get(reference) {
            Some(Concept::Dimension(d)) => d.attributes_key_first().map(Concept::Attribute).collect(),
            Some(concept) => vec![concept],
            None => Vec::new(),
        }
    }

    /// The dimension owning `concept`: an attribute's dimension, or the
    /// dimension itself.
    pub fn dimension_of(&self, concept: Concept<'_>) -> Option<&Dimension> {
        match concept {
            Concept::Dimension(d) => self.dimension(&d.name),
            Concept::Attribute(a) => self.dimension(&a.dimension),
            Concept::Measure(_) | Concept::Aggregate(_) => None,
        }
    }

    // =========================================================================
    // Cardinality
    // =========================================================================

    /// Record a dimension's member count.
    pub fn set_cardinality(&mut self, dimension: &str, cardinality: u64) -> BabbageResult<()> {
        let dim = self
            .dimensions
            .iter_mut()
            .find(|d| d.name == dimension)
            .ok_or_else(|| {
                BabbageError::query(
                    format!("No such dimension: {dimension}"),
                    ErrorContext::new().with_ref(dimension),
                )
            })?;
        dim.cardinality = Some(cardinality);
        if let Some((_, spec)) = self.spec.dimensions.iter_mut().find(|(n, _)| n == dimension) {
            spec.cardinality = Some(cardinality);
        }
        Ok(())
    }

    // =========================================================================
    // Description
    // =========================================================================

    /// Describe the model for API consumers: the spec enriched with refs,
    /// key/label attributes, cardinality classes, aggregates and hierarchies.
    pub fn to_json(&self) -> Value {
        let measures: Map<String, Value> = self
            .measures
            .iter()
            .map(|m| {
                let mut data = spec_object(self.spec.measures.iter().find(|(n, _)| *n == m.name));
                data.insert("ref".into(), json!(m.name));
                data.insert("label".into(), json!(m.label));
                (m.name.clone(), Value::Object(data))
            })
            .collect();

        let dimensions: Map<String, Value> = self
            .dimensions
            .iter()
            .map(|d| (d.name.clone(), self.describe_dimension(d)))
            .collect();

        let aggregates: Map<String, Value> = self
            .aggregates
            .iter()
            .map(|a| {
                let mut data = Map::new();
                data.insert("ref".into(), json!(a.reference));
                data.insert("label".into(), json!(a.label));
                data.insert("function".into(), json!(a.function));
                if let Some(measure) = &a.measure {
                    data.insert("measure".into(), json!(measure));
                }
                (a.reference.clone(), Value::Object(data))
            })
            .collect();

        let hierarchies: Map<String, Value> = self
            .hierarchies
            .iter()
            .map(|h| {
                let data = json!({"ref": h.name, "label": h.label, "levels": h.levels});
                (h.name.clone(), data)
            })
            .collect();

        let mut out = Map::new();
        out.insert("fact_table".into(), json!(self.spec.fact_table));
        if let Some(label) = &self.spec.label {
            out.insert("label".into(), json!(label));
        }
        if let Some(description) = &self.spec.description {
            out.insert("description".into(), json!(description));
        }
        out.insert("measures".into(), Value::Object(measures));
        out.insert("dimensions".into(), Value::Object(dimensions));
        out.insert("aggregates".into(), Value::Object(aggregates));
        out.insert("hierarchies".into(), Value::Object(hierarchies));
        Value::Object(out)
    }

    fn describe_dimension(&self, d: &Dimension) -> Value {
        let mut data = spec_object(self.spec.dimensions.iter().find(|(n, _)| *n == d.name));
        let key = d.key_attribute();
        let label = d.label_attribute();
        let attributes: Map<String, Value> = d
            .attributes
            .iter()
            .map(|a| {
                let mut attr = Map::new();
                attr.insert("ref".into(), json!(a.reference));
                attr.insert("label".into(), json!(a.label));
                attr.insert("column".into(), json!(a.column));
                if let Some(dt) = a.datatype {
                    attr.insert("type".into(), json!(dt));
                }
                if let Some(desc) = &a.description {
                    attr.insert("description".into(), json!(desc));
                }
                (a.name.clone(), Value::Object(attr))
            })
            .collect();

        data.insert("ref".into(), json!(d.name));
        data.insert("label".into(), json!(d.label));
        data.insert("key_attribute".into(), json!(key.name));
        data.insert("key_ref".into(), json!(key.reference));
        data.insert("label_attribute".into(), json!(label.name));
        data.insert("label_ref".into(), json!(label.reference));
        data.insert("cardinality".into(), json!(d.cardinality));
        data.insert("cardinality_class".into(), json!(d.cardinality_class()));
        data.insert("attributes".into(), Value::Object(attributes));
        Value::Object(data)
    }
}

fn spec_object<T: serde::Serialize>(entry: Option<&(String, T)>) -> Map<String, Value> {
    match entry.map(|(_, spec)| serde_json::to_value(spec)) {
        Some(Ok(Value::Object(map))) => map,
        _ => Map::new(),
    }
}

fn build_dimension(name: &str, spec: &DimensionSpec) -> BabbageResult<Dimension> {
    let prefix = spec.hierarchy.as_deref().unwrap_or(name);
    let attributes: Vec<Attribute> = spec
        .attributes
        .iter()
        .map(|(attr_name, a)| Attribute {
            name: attr_name.clone(),
            label: a.label.clone().unwrap_or_else(|| attr_name.clone()),
            description: a.description.clone(),
            reference: format!("{prefix}.{attr_name}"),
            alias: (prefix != name).then(|| format!("{name}.{attr_name}")),
            column: a.column.clone(),
            datatype: a.datatype,
            dimension: name.to_string(),
        })
        .collect();

    let position = |attr: &str, role: &str| {
        attributes
            .iter()
            .position(|a| a.name == attr)
            .ok_or_else(|| {
                BabbageError::Model(format!(
                    "Dimension {name} has no attribute {attr} (its {role})"
                ))
            })
    };

    let key_attribute = position(&spec.key_attribute, "key_attribute")?;
    let label_attribute = match &spec.label_attribute {
        Some(label) => position(label, "label_attribute")?,
        None => key_attribute,
    };

    Ok(Dimension {
        name: name.to_string(),
        label: spec.label.clone().unwrap_or_else(|| name.to_string()),
        description: spec.description.clone(),
        attributes,
        join_column: spec.join_column.clone(),
        cardinality: spec.cardinality,
        key_attribute,
        label_attribute,
    })
}

fn build_hierarchies(spec: &ModelSpec, dimensions: &[Dimension]) -> BabbageResult<Vec<Hierarchy>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut hierarchies = Vec::with_capacity(spec.hierarchies.len());
    for (name, h) in &spec.hierarchies {
        for level in &h.levels {
            if !dimensions.iter().any(|d| &d.name == level) {
                return Err(BabbageError::Model(format!(
                    "Hierarchy {name} names unknown dimension {level}"
                )));
            }
            if !seen.insert(level.as_str()) {
                return Err(BabbageError::Model(format!(
                    "Dimension {level} belongs to more than one hierarchy"
                )));
            }
        }
        hierarchies.push(Hierarchy {
            name: name.clone(),
            label: h.label.clone().unwrap_or_else(|| name.clone()),
            levels: h.levels.clone(),
        });
    }
    Ok(hierarchies)
}
