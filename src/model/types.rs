//! Small value types shared by the model: column datatypes, aggregate
//! functions and cardinality classes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sql::expr::{self, Expr};

/// Declared datatype of an attribute or measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Decimal => "decimal",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL aggregate function a measure may be summarised with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Count => "count",
        }
    }

    /// Wrap `arg` in this function.
    pub fn apply(&self, arg: Expr) -> Expr {
        match self {
            AggregateFunction::Sum => expr::sum(arg),
            AggregateFunction::Avg => expr::avg(arg),
            AggregateFunction::Min => expr::min(arg),
            AggregateFunction::Max => expr::max(arg),
            AggregateFunction::Count => expr::count(arg),
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size bucket of a dimension's member count, used for UI hinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardinalityClass {
    Tiny,
    Low,
    Medium,
    High,
}

impl CardinalityClass {
    /// Bucket a member count. Unknown or zero counts have no class.
    pub fn classify(cardinality: Option<u64>) -> Option<Self> {
        match cardinality? {
            0 => None,
            1..=7 => Some(CardinalityClass::Tiny),
            8..=50 => Some(CardinalityClass::Low),
            51..=1000 => Some(CardinalityClass::Medium),
            _ => Some(CardinalityClass::High),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardinalityClass::Tiny => "tiny",
            CardinalityClass::Low => "low",
            CardinalityClass::Medium => "medium",
            CardinalityClass::High => "high",
        }
    }
}

impl fmt::Display for CardinalityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
