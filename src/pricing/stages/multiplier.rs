//! Multiplier stage: retroactive quantity rescaling.

use super::{Stage, StageContext, ensure_finite, log_stage, numeric_field};
use crate::domain::{FieldName, ProductKind};
use crate::error::PipelineResult;
use crate::model::EstimateLineItem;
use crate::pricing::directory::Checkpoint;
use crate::pricing::format::round2;
use tracing::trace;

/// Coefficient slots of a Multiplier row, applied in this order.
pub const MULTIPLIER_SLOTS: [(Checkpoint, FieldName); 3] = [
    (Checkpoint::Divider, FieldName::Field2),
    (Checkpoint::Subtotal, FieldName::Field3),
    (Checkpoint::Estimate, FieldName::Field4),
];

const DEFAULT_COEFFICIENT: f64 = 1.0;

/// Scales the quantity of every regular item above a Multiplier row, once
/// per slot whose coefficient is not 1. Multiplier rows apply top-down, so
/// a lower one sees the quantities an upper one already scaled.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiplierStage;

impl Stage for MultiplierStage {
    fn name(&self) -> &'static str {
        "multiplier"
    }

    fn apply(
        &self,
        items: &[EstimateLineItem],
        context: &StageContext<'_>,
    ) -> PipelineResult<Vec<EstimateLineItem>> {
        let mut out = items.to_vec();
        for (position, row) in context.rows_of_kind(ProductKind::Multiplier) {
            for (checkpoint, field) in MULTIPLIER_SLOTS {
                let coefficient = numeric_field(row, field)?.unwrap_or(DEFAULT_COEFFICIENT);
                if coefficient == DEFAULT_COEFFICIENT {
                    continue;
                }
                let window = context.window(position, checkpoint);
                trace!(row_id = %row.row_id, ?checkpoint, coefficient, start = window.start(), "scaling window");
                for item in out.iter_mut() {
                    if item.kind() != ProductKind::Regular
                        || !window.contains(context.item_position(item)?)
                    {
                        continue;
                    }
                    item.quantity *= coefficient;
                    item.extended_price = ensure_finite(
                        self.name(),
                        &row.row_id,
                        round2(item.unit_price * item.quantity),
                    )?;
                }
            }
        }
        log_stage(self.name(), items.len(), out.len());
        Ok(out)
    }
}
