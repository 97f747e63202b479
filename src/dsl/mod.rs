//! The query mini-language.
//!
//! Five small sub-languages describe a request:
//!
//! - **cuts**: `cofog1:"4"|year:2015;2016` filters
//! - **fields**: `cofog1.name,amount` columns of a fact listing
//! - **drilldowns**: `cofog1|year` grouping columns
//! - **aggregates**: `amount.sum|_count` aggregate columns
//! - **ordering**: `amount.sum:desc,cofog1.name` sort order
//!
//! Each goes through two passes: [`parser`] turns text into the [`ast`]
//! types without knowing the model, then [`validation`] checks every ref
//! against the model. Both report failures as query errors.
//!
//! # Example
//!
//! ```ignore
//! use babbage::dsl;
//!
//! let cuts = dsl::cuts(&model, Some(r#"cofog1:"4""#))?;
//! assert_eq!(cuts[0].reference.value, "cofog1");
//! ```

pub mod ast;
pub mod parser;
pub mod span;
pub mod validation;

pub use ast::*;
pub use span::{Span, Spanned};
pub use validation::Construct;

use crate::error::BabbageResult;
use crate::model::Model;

/// A syntax error with its location in the query string.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {} (at {:?})", self.message, self.span)
    }
}

impl std::error::Error for Diagnostic {}

/// Parse and validate cuts.
pub fn cuts(model: &Model, input: Option<&str>) -> BabbageResult<Vec<Cut>> {
    let cuts = parser::parse_cuts(input)
        .map_err(|d| validation::syntax_error(Construct::Cut, d))?;
    validation::validate_cuts(model, &cuts)?;
    Ok(cuts)
}

/// Parse and validate fields: measures, dimensions or attributes.
pub fn fields(model: &Model, input: Option<&str>) -> BabbageResult<Vec<Ref>> {
    let fields = parser::parse_fields(input)
        .map_err(|d| validation::syntax_error(Construct::Field, d))?;
    validation::validate_refs(model, Construct::Field, &fields)?;
    Ok(fields)
}

/// Parse and validate drilldowns, dropping repeated refs.
pub fn drilldowns(model: &Model, input: Option<&str>) -> BabbageResult<Vec<Ref>> {
    let drilldowns = parser::parse_drilldowns(input)
        .map_err(|d| validation::syntax_error(Construct::Drilldown, d))?;
    validation::validate_refs(model, Construct::Drilldown, &drilldowns)?;

    let mut unique: Vec<Ref> = Vec::with_capacity(drilldowns.len());
    for drilldown in drilldowns {
        if !unique.iter().any(|d| d.value == drilldown.value) {
            unique.push(drilldown);
        }
    }
    Ok(unique)
}

/// Parse and validate aggregate refs.
pub fn aggregates(model: &Model, input: Option<&str>) -> BabbageResult<Vec<Ref>> {
    let aggregates = parser::parse_aggregates(input)
        .map_err(|d| validation::syntax_error(Construct::Aggregate, d))?;
    validation::validate_refs(model, Construct::Aggregate, &aggregates)?;
    Ok(aggregates)
}

/// Parse and validate an ordering.
pub fn ordering(model: &Model, input: Option<&str>) -> BabbageResult<Vec<Ordering>> {
    let ordering = parser::parse_ordering(input)
        .map_err(|d| validation::syntax_error(Construct::Order, d))?;
    validation::validate_ordering(model, &ordering)?;
    Ok(ordering)
}
