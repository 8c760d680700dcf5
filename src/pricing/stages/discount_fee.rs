//! Discount/Fee stage: one synthetic Discount or Surcharge line per row.

use super::insertion::{insert_after_preceding, strip_kind};
use super::{Stage, StageContext, ensure_finite, log_stage, memo, numeric_field};
use crate::domain::{FieldName, ProductKind};
use crate::error::PipelineResult;
use crate::model::{EstimateLineItem, Row};
use crate::pricing::directory::Checkpoint;
use crate::pricing::format::{format_currency, format_percent, round2};

/// `(checkpoint, percent field, flat field)` pairs of a Discount/Fee row.
pub const DISCOUNT_FEE_PAIRS: [(Checkpoint, FieldName, FieldName); 3] = [
    (Checkpoint::Divider, FieldName::Field2, FieldName::Field3),
    (Checkpoint::Subtotal, FieldName::Field4, FieldName::Field5),
    (Checkpoint::Estimate, FieldName::Field6, FieldName::Field7),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountFeeStage;

impl Stage for DiscountFeeStage {
    fn name(&self) -> &'static str {
        "discount_fee"
    }

    fn apply(
        &self,
        items: &[EstimateLineItem],
        context: &StageContext<'_>,
    ) -> PipelineResult<Vec<EstimateLineItem>> {
        let base = strip_kind(items, ProductKind::DiscountFee);
        let mut synthetic = Vec::new();
        for (position, row) in context.rows_of_kind(ProductKind::DiscountFee) {
            if let Some(item) = self.synthesize(row, position, &base, context)? {
                synthetic.push((position, item));
            }
        }
        let out = insert_after_preceding(base, synthetic, context)?;
        log_stage(self.name(), items.len(), out.len());
        Ok(out)
    }
}

impl DiscountFeeStage {
    /// Windows are summed over `base`, which holds no Discount/Fee lines,
    /// so adjustments never compound on each other.
    fn synthesize(
        &self,
        row: &Row,
        position: usize,
        base: &[EstimateLineItem],
        context: &StageContext<'_>,
    ) -> PipelineResult<Option<EstimateLineItem>> {
        let mut total = 0.0;
        let mut lines: Vec<String> = memo(row).map(str::to_string).into_iter().collect();
        let mut active = false;

        for (checkpoint, percent_field, flat_field) in DISCOUNT_FEE_PAIRS {
            let percent = numeric_field(row, percent_field)?.unwrap_or(0.0);
            let flat = numeric_field(row, flat_field)?.unwrap_or(0.0);
            if percent == 0.0 && flat == 0.0 {
                continue;
            }
            active = true;

            let window = context.window(position, checkpoint);
            let window_subtotal = context.window_total(base, &window)?;
            let percent_amount = window_subtotal * percent / 100.0;
            total += percent_amount + flat;
            lines.push(pair_line(checkpoint, percent, flat, window_subtotal, percent_amount));
        }

        if !active {
            return Ok(None);
        }
        let amount = ensure_finite(self.name(), &row.row_id, round2(total))?;
        Ok(Some(EstimateLineItem {
            row_id: row.row_id.clone(),
            product_type_id: row.product_type_id,
            item_name: if total < 0.0 { "Discount" } else { "Surcharge" }.to_string(),
            calculation_display: lines.join("\n"),
            unit_price: amount,
            quantity: 1.0,
            extended_price: amount,
        }))
    }
}

/// `Divider: 10% of $20.00 = $2.00, $25.00 flat`
fn pair_line(
    checkpoint: Checkpoint,
    percent: f64,
    flat: f64,
    window_subtotal: f64,
    percent_amount: f64,
) -> String {
    let mut parts = Vec::with_capacity(2);
    if percent != 0.0 {
        parts.push(format!(
            "{} of {} = {}",
            format_percent(percent),
            format_currency(window_subtotal),
            format_currency(percent_amount)
        ));
    }
    if flat != 0.0 {
        parts.push(format!("{} flat", format_currency(flat)));
    }
    let body = parts.join(", ");
    match checkpoint.label() {
        Some(label) => format!("{label} {body}"),
        None => body,
    }
}
