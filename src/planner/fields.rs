//! Fields: the projected columns of fact and member listings.

use tracing::debug;

use super::{DistinctKey, QueryContext};
use crate::dsl::Ref;
use crate::error::BabbageResult;
use crate::model::{Binder, Concept};
use crate::sql::expr::{self, ExprExt};

/// Project `fields`, or every attribute and measure when none are given.
///
/// With `distinct`, the first projected column becomes the grouping key
/// and every other column is reduced with `MAX` so each key yields one row.
pub fn fields(
    mut ctx: QueryContext,
    binder: &Binder<'_>,
    fields: &[Ref],
    distinct: bool,
) -> BabbageResult<(QueryContext, Vec<String>)> {
    let model = binder.model();

    let mut selected: Vec<(Concept<'_>, String)> = Vec::new();
    if fields.is_empty() {
        selected.extend(model.attributes().map(|a| (Concept::Attribute(a), a.reference.clone())));
        selected.extend(model.measures().iter().map(|m| (Concept::Measure(m), m.name.clone())));
    } else {
        for field in fields {
            for concept in model.match_ref(&field.value) {
                selected.push((concept, concept.label_for(&field.value)));
            }
        }
    }

    let mut info: Vec<String> = Vec::with_capacity(selected.len());
    for (concept, label) in selected {
        if info.contains(&label) {
            continue;
        }
        let bound = binder.bind(concept, &label)?;
        ctx.bind(&bound, &label);

        if distinct && ctx.distinct_key.is_none() {
            ctx.distinct_key = Some(DistinctKey {
                label: label.clone(),
                expr: bound.expr.clone(),
            });
            let key = bound.expr.clone();
            ctx = ctx.map_query(|q| q.column(bound.select_expr()).add_group_by(key));
        } else if distinct {
            let reduced = expr::max(bound.expr).alias(&label);
            ctx = ctx.map_query(|q| q.column(reduced));
        } else {
            ctx = ctx.map_query(|q| q.column(bound.select_expr()));
        }
        info.push(label);
    }

    debug!(fields = ?info, distinct, "projected fields");
    Ok((ctx, info))
}
