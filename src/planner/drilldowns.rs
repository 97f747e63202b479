//! Drilldowns: grouping columns of an aggregation.

use super::QueryContext;
use crate::dsl::Ref;
use crate::error::BabbageResult;
use crate::model::Binder;

/// Project and group by every attribute `drilldowns` resolve to.
///
/// A dimension drills down by all of its attributes, key first.
pub fn drilldowns(
    mut ctx: QueryContext,
    binder: &Binder<'_>,
    drilldowns: &[Ref],
) -> BabbageResult<(QueryContext, Vec<String>)> {
    let mut info: Vec<String> = Vec::new();

    for drilldown in drilldowns {
        for concept in binder.model().match_ref(&drilldown.value) {
            let label = concept.label_for(&drilldown.value);
            if info.contains(&label) || ctx.is_projected(&label) {
                continue;
            }
            let bound = binder.bind(concept, &label)?;
            ctx.bind(&bound, &label);

            let group = bound.expr.clone();
            ctx = ctx.map_query(|q| q.column(bound.select_expr()).add_group_by(group));
            info.push(label);
        }
    }

    Ok((ctx, info))
}
