//! Ordering: `ORDER BY` from `ref:direction` pairs.

use serde::Serialize;

use super::QueryContext;
use crate::dsl::{Ordering, SortDirection};
use crate::error::{BabbageError, BabbageResult, ErrorContext};
use crate::model::{Binder, ConceptKind};
use crate::sql::dialect::DialectCapabilities;
use crate::sql::expr::{self, Expr};
use crate::sql::query::{OrderByExpr, SortDir};

/// One applied sort key, reported as a `[ref, direction]` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderInfo(pub String, pub SortDirection);

fn order_by(expr: Expr, direction: SortDirection, caps: DialectCapabilities) -> OrderByExpr {
    let dir = match direction {
        SortDirection::Asc => SortDir::Asc,
        SortDirection::Desc => SortDir::Desc,
    };
    let order = OrderByExpr::new(expr, dir);
    if caps.nulls_last {
        order.nulls_last()
    } else {
        order
    }
}

fn unorderable(ordering: &Ordering, reason: &str) -> BabbageError {
    BabbageError::query(
        format!("Cannot order by {}: {reason}", ordering.reference.value),
        ErrorContext::new()
            .with_construct("order")
            .at(ordering.reference.position())
            .with_ref(ordering.reference.value.as_str()),
    )
}

/// Apply `ordering`; with no ordering, sort ascending by every projected column.
///
/// The reported info only lists explicitly requested keys.
pub fn ordering(
    mut ctx: QueryContext,
    binder: &Binder<'_>,
    ordering: &[Ordering],
    caps: DialectCapabilities,
) -> BabbageResult<(QueryContext, Vec<OrderInfo>)> {
    if ordering.is_empty() {
        let defaults: Vec<OrderByExpr> = ctx
            .projected()
            .map(|name| order_by(expr::col(name), SortDirection::Asc, caps))
            .collect();
        return Ok((ctx.map_query(|q| q.order_by(defaults)), Vec::new()));
    }

    let mut info = Vec::with_capacity(ordering.len());
    for order in ordering {
        let reference = order.reference.value.as_str();
        let concept = binder.model().concept(reference)?;
        let bound = binder.bind(concept, reference)?;

        let sort_expr = match &ctx.distinct_key {
            Some(key) if key.expr == bound.expr => bound.expr,
            Some(_) if ctx.is_projected(reference) => expr::col(reference),
            Some(_) => return Err(unorderable(order, "not part of the listing")),
            None if concept.kind() == ConceptKind::Aggregate && !ctx.aggregated => {
                return Err(unorderable(order, "aggregates only sort aggregations"));
            }
            None => {
                ctx.bind(&bound, reference);
                bound.expr
            }
        };

        ctx = ctx.map_query(|q| q.add_order_by(order_by(sort_expr, order.direction, caps)));
        info.push(OrderInfo(reference.to_string(), order.direction));
    }

    Ok((ctx, info))
}
