//! Syntax trees for the five query sub-languages.
//!
//! The parser produces these without consulting the model; refs are only
//! checked later by [`validation`](super::validation).

use std::fmt;

use chrono::NaiveDate;
use serde::ser::Serializer;
use serde::Serialize;

use super::span::Spanned;
use crate::model::DataType;

/// A reference token: `.`-separated name segments.
pub type Ref = Spanned<String>;

/// A typed cut value, recognised by its lexical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// Double-quoted, or any bare text that is not an integer or date.
    String(String),
    Integer(i64),
    /// Bare `YYYY-MM-DD`.
    Date(NaiveDate),
}

impl Literal {
    /// Classify a bare (unquoted) value.
    pub fn from_bare(text: &str) -> Self {
        let text = text.trim();
        if let Ok(n) = text.parse::<i64>() {
            return Literal::Integer(n);
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Literal::Date(date);
        }
        Literal::String(text.to_string())
    }

    /// Model datatype this literal was parsed as.
    pub fn datatype(&self) -> DataType {
        match self {
            Literal::String(_) => DataType::String,
            Literal::Integer(_) => DataType::Integer,
            Literal::Date(_) => DataType::Date,
        }
    }
}

/// Renders in cut syntax: strings are quoted so re-parsing keeps their type.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            Literal::Integer(n) => write!(f, "{n}"),
            Literal::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Literal::String(s) => serializer.serialize_str(s),
            Literal::Integer(n) => serializer.serialize_i64(*n),
            Literal::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
        }
    }
}

/// Right-hand side of a cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CutValue {
    /// `ref:` with nothing after the colon.
    Null,
    /// One or more `;`-separated values, matched with `IN`.
    Set(Vec<Literal>),
}

impl CutValue {
    pub fn values(&self) -> &[Literal] {
        match self {
            CutValue::Null => &[],
            CutValue::Set(values) => values,
        }
    }
}

/// A single value is reported as a scalar, several as a list.
impl Serialize for CutValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CutValue::Null => serializer.serialize_none(),
            CutValue::Set(values) => match values.as_slice() {
                [single] => single.serialize(serializer),
                many => serializer.collect_seq(many),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutOperator {
    /// The only operator the language has; written `:`.
    In,
}

impl CutOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            CutOperator::In => ":",
        }
    }
}

/// `ref:value[;value...]`
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    pub reference: Ref,
    pub operator: CutOperator,
    pub value: CutValue,
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.reference.value, self.operator.as_str())?;
        for (i, v) in self.value.values().iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// `ref[:asc|desc]`
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub reference: Ref,
    pub direction: SortDirection,
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.reference.value, self.direction.as_str())
    }
}

/// Join cuts back into a query string.
pub fn format_cuts(cuts: &[Cut]) -> String {
    cuts.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}
