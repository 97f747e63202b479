//! Aggregates: the computed columns of an aggregation.

use super::QueryContext;
use crate::dsl::Ref;
use crate::error::BabbageResult;
use crate::model::{Binder, Concept};

/// Project `aggregates`, or every aggregate of the model when none are given.
pub fn aggregates(
    mut ctx: QueryContext,
    binder: &Binder<'_>,
    aggregates: &[Ref],
) -> BabbageResult<(QueryContext, Vec<String>)> {
    let model = binder.model();
    let selected: Vec<Concept<'_>> = if aggregates.is_empty() {
        model.aggregates().iter().map(Concept::Aggregate).collect()
    } else {
        aggregates
            .iter()
            .map(|r| model.concept(&r.value))
            .collect::<BabbageResult<_>>()?
    };

    let mut info: Vec<String> = Vec::with_capacity(selected.len());
    for concept in selected {
        let label = concept.reference().to_string();
        if info.contains(&label) {
            continue;
        }
        let bound = binder.bind(concept, &label)?;
        ctx.bind(&bound, &label);
        ctx = ctx.map_query(|q| q.column(bound.select_expr()));
        info.push(label);
    }

    ctx.aggregated = true;
    Ok((ctx, info))
}
