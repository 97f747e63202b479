//! Cuts: `WHERE` filters from `ref:value` pairs.
//!
//! Each cut binds its ref, type-checks every literal against the concept's
//! declared datatype, and becomes either `IS NULL` or an `IN` list. Several
//! cuts are ANDed together.

use serde::Serialize;
use tracing::debug;

use super::QueryContext;
use crate::dsl::{Cut, CutValue, Literal};
use crate::error::{BabbageError, BabbageResult, ErrorContext};
use crate::model::{Binder, DataType};
use crate::sql::expr::{self, Expr, ExprExt};

/// How a cut is reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutInfo {
    #[serde(rename = "ref")]
    pub reference: String,
    pub operator: &'static str,
    pub value: CutValue,
}

impl From<&Cut> for CutInfo {
    fn from(cut: &Cut) -> Self {
        Self {
            reference: cut.reference.value.clone(),
            operator: cut.operator.as_str(),
            value: cut.value.clone(),
        }
    }
}

fn literal_expr(literal: &Literal) -> Expr {
    match literal {
        Literal::String(s) => expr::lit_str(s),
        Literal::Integer(n) => expr::lit_int(*n),
        Literal::Date(d) => expr::lit_date(&d.format("%Y-%m-%d").to_string()),
    }
}

fn check_type(cut: &Cut, literal: &Literal, expected: Option<DataType>) -> BabbageResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let parsed = literal.datatype();
    let widened = parsed == DataType::Integer && matches!(expected, DataType::Float | DataType::Decimal);
    if parsed == expected || widened {
        return Ok(());
    }
    Err(BabbageError::query(
        format!(
            "Invalid value {literal} parsed as type '{parsed}' for cut {} of type '{expected}'",
            cut.reference.value
        ),
        ErrorContext::new()
            .with_construct("cut")
            .at(cut.reference.position())
            .with_ref(cut.reference.value.as_str()),
    ))
}

/// Apply `cuts` as filters.
pub fn cuts(
    mut ctx: QueryContext,
    binder: &Binder<'_>,
    cuts: &[Cut],
) -> BabbageResult<(QueryContext, Vec<CutInfo>)> {
    let mut info = Vec::with_capacity(cuts.len());

    for cut in cuts {
        let concept = binder.model().concept(&cut.reference.value)?;
        for literal in cut.value.values() {
            check_type(cut, literal, concept.datatype())?;
        }

        let bound = binder.bind(concept, &cut.reference.value)?;
        ctx.bind(&bound, &cut.reference.value);

        let condition = match &cut.value {
            CutValue::Null => bound.expr.is_null(),
            CutValue::Set(values) => bound.expr.in_list(values.iter().map(literal_expr).collect()),
        };
        debug!(cut = %cut, "applying cut");
        ctx = ctx.map_query(|q| q.filter(condition));
        info.push(CutInfo::from(cut));
    }

    Ok((ctx, info))
}
