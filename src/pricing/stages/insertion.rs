//! Positional insertion of synthetic items.

use super::StageContext;
use crate::domain::ProductKind;
use crate::error::PipelineResult;
use crate::model::EstimateLineItem;

/// Drops previously synthesized items of `kind` so a re-run starts clean.
pub(super) fn strip_kind(items: &[EstimateLineItem], kind: ProductKind) -> Vec<EstimateLineItem> {
    items
        .iter()
        .filter(|item| item.kind() != kind)
        .cloned()
        .collect()
}

/// Inserts each synthetic item right after the last item of any row above
/// its anchor position, or at the front when there is none.
///
/// All indices are resolved against `base` first and applied bottom-up so
/// earlier insertions never shift later ones.
pub(super) fn insert_after_preceding(
    mut base: Vec<EstimateLineItem>,
    synthetic: Vec<(usize, EstimateLineItem)>,
    context: &StageContext<'_>,
) -> PipelineResult<Vec<EstimateLineItem>> {
    let positions = base
        .iter()
        .map(|item| context.item_position(item))
        .collect::<PipelineResult<Vec<_>>>()?;

    let mut placed: Vec<(usize, usize, EstimateLineItem)> = synthetic
        .into_iter()
        .map(|(anchor, item)| {
            let index = positions
                .iter()
                .rposition(|position| *position < anchor)
                .map_or(0, |last| last + 1);
            (index, anchor, item)
        })
        .collect();

    placed.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
    for (index, _, item) in placed {
        base.insert(index, item);
    }
    Ok(base)
}
