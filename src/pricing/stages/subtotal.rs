//! Subtotal stage: display-only section summaries.

use super::insertion::{insert_after_preceding, strip_kind};
use super::{Stage, StageContext, ensure_finite, log_stage, memo};
use crate::domain::ProductKind;
use crate::error::PipelineResult;
use crate::model::{EstimateLineItem, Row};
use crate::pricing::directory::Checkpoint;
use crate::pricing::format::{aligned_lines, format_currency, format_percent};

/// Sums the section above each Subtotal row. Dividers do not split a
/// section; only the previous Subtotal row does.
///
/// The synthetic line carries zero amounts, so it never reaches the
/// estimate total.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubtotalStage;

impl Stage for SubtotalStage {
    fn name(&self) -> &'static str {
        "subtotal"
    }

    fn apply(
        &self,
        items: &[EstimateLineItem],
        context: &StageContext<'_>,
    ) -> PipelineResult<Vec<EstimateLineItem>> {
        let base = strip_kind(items, ProductKind::Subtotal);
        let mut synthetic = Vec::new();
        for (position, row) in context.rows_of_kind(ProductKind::Subtotal) {
            let window = context.window(position, Checkpoint::Subtotal);
            let section_subtotal = context.window_total(&base, &window)?;
            synthetic.push((position, self.summary(row, section_subtotal, context.tax_rate)?));
        }
        let out = insert_after_preceding(base, synthetic, context)?;
        log_stage(self.name(), items.len(), out.len());
        Ok(out)
    }
}

impl SubtotalStage {
    fn summary(&self, row: &Row, section_subtotal: f64, tax_rate: f64) -> PipelineResult<EstimateLineItem> {
        let section_tax = section_subtotal * tax_rate;
        let section_total = ensure_finite(self.name(), &row.row_id, section_subtotal + section_tax)?;

        let mut lines: Vec<String> = memo(row).map(str::to_string).into_iter().collect();
        lines.extend(aligned_lines(&[
            ("Subtotal:".to_string(), format_currency(section_subtotal)),
            (
                format!("Tax ({}):", format_percent(tax_rate * 100.0)),
                format_currency(section_tax),
            ),
            ("Section Total:".to_string(), format_currency(section_total)),
        ]));

        Ok(EstimateLineItem {
            row_id: row.row_id.clone(),
            product_type_id: row.product_type_id,
            item_name: String::new(),
            calculation_display: lines.join("\n"),
            unit_price: 0.0,
            quantity: 0.0,
            extended_price: 0.0,
        })
    }
}
