//! Special-item post-processing chain.
//!
//! Each stage borrows the full item list produced by the previous stage and
//! returns a new one. A stage that fails hands its input through unchanged;
//! see [`PostProcessingChain::run`].

mod discount_fee;
mod insertion;
mod multiplier;
mod passthrough;
mod subtotal;

pub use discount_fee::{DISCOUNT_FEE_PAIRS, DiscountFeeStage};
pub use multiplier::{MULTIPLIER_SLOTS, MultiplierStage};
pub use passthrough::{AssemblyStage, DividerStage, EmptyRowStage};
pub use subtotal::SubtotalStage;

use super::directory::{Checkpoint, RowDirectory, Window};
use crate::domain::{FieldName, FieldValue, ProductKind, RowId};
use crate::error::{PipelineError, PipelineResult};
use crate::model::{EstimateLineItem, Row};
use crate::recovery::{FallbackExecutor, PassDiagnostics};
use tracing::debug;

/// Free-text memo of Multiplier, Discount/Fee and Subtotal rows.
pub const MEMO_FIELD: FieldName = FieldName::Field1;

/// One step of the chain.
pub trait Stage: Send + Sync {
    /// Stable name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        items: &[EstimateLineItem],
        context: &StageContext<'_>,
    ) -> PipelineResult<Vec<EstimateLineItem>>;
}

/// Read-only view of the sheet shared by every stage of a pass.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub directory: &'a RowDirectory,
    pub rows: &'a [Row],
    pub tax_rate: f64,
}

impl<'a> StageContext<'a> {
    pub fn new(directory: &'a RowDirectory, rows: &'a [Row], tax_rate: f64) -> Self {
        Self {
            directory,
            rows,
            tax_rate,
        }
    }

    /// Rows of one kind with their positions, top-down.
    pub fn rows_of_kind(&self, kind: ProductKind) -> impl Iterator<Item = (usize, &'a Row)> + 'a {
        let rows = self.rows;
        self.directory
            .rows_of_kind(kind)
            .filter_map(move |(_, meta)| rows.get(meta.position).map(|row| (meta.position, row)))
    }

    pub fn window(&self, position: usize, checkpoint: Checkpoint) -> Window {
        self.directory.window(position, checkpoint)
    }

    /// Position of the row an item belongs to.
    pub fn item_position(&self, item: &EstimateLineItem) -> PipelineResult<usize> {
        self.directory
            .position(&item.row_id)
            .ok_or_else(|| PipelineError::UnknownRow(item.row_id.clone()))
    }

    /// Sum of `extended_price` over the items whose rows sit in `window`.
    pub fn window_total(&self, items: &[EstimateLineItem], window: &Window) -> PipelineResult<f64> {
        let mut total = 0.0;
        for item in items {
            if window.contains(self.item_position(item)?) {
                total += item.extended_price;
            }
        }
        Ok(total)
    }
}

/// Reads a numeric slot of a control row. Blank slots yield `None`.
pub(crate) fn numeric_field(row: &Row, field: FieldName) -> PipelineResult<Option<f64>> {
    let Some(cell) = row.field(field) else {
        return Ok(None);
    };
    match cell.value {
        FieldValue::Empty => Ok(None),
        FieldValue::Number(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(PipelineError::InvalidFieldValue {
            row_id: row.row_id.clone(),
            field,
            raw: cell.raw.clone(),
        }),
    }
}

pub(crate) fn memo(row: &Row) -> Option<&str> {
    row.field(MEMO_FIELD).and_then(|cell| cell.text())
}

pub(crate) fn ensure_finite(stage: &'static str, row_id: &RowId, amount: f64) -> PipelineResult<f64> {
    if amount.is_finite() {
        Ok(amount)
    } else {
        Err(PipelineError::NonFiniteAmount {
            stage,
            row_id: row_id.clone(),
        })
    }
}

/// Ordered list of stages.
pub struct PostProcessingChain {
    stages: Vec<Box<dyn Stage>>,
}

impl PostProcessingChain {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Empty-Row, Assembly, Divider, Multiplier, Discount/Fee, Subtotal.
    pub fn standard() -> Self {
        let mut chain = Self::new();
        chain
            .push(Box::new(EmptyRowStage))
            .push(Box::new(AssemblyStage))
            .push(Box::new(DividerStage))
            .push(Box::new(MultiplierStage))
            .push(Box::new(DiscountFeeStage))
            .push(Box::new(SubtotalStage));
        chain
    }

    pub fn push(&mut self, stage: Box<dyn Stage>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Threads `items` through every stage. Failures are recorded in
    /// `diagnostics` and never abort the chain.
    pub fn run(
        &self,
        items: Vec<EstimateLineItem>,
        context: &StageContext<'_>,
        diagnostics: &mut PassDiagnostics,
    ) -> Vec<EstimateLineItem> {
        self.stages.iter().fold(items, |items, stage| {
            let outcome =
                FallbackExecutor::new(stage.name(), |input: &[EstimateLineItem]| {
                    stage.apply(input, context)
                })
                .execute(items);
            if let Some(error) = &outcome.error {
                diagnostics.add_stage_fallback(stage.name(), error);
            }
            outcome.items
        })
    }
}

impl Default for PostProcessingChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for PostProcessingChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostProcessingChain")
            .field("stages", &self.stage_names())
            .finish()
    }
}

pub(crate) fn log_stage(name: &'static str, before: usize, after: usize) {
    debug!(stage = name, before, after, "stage output");
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::ProductTypeId;

    pub const SIGN: ProductTypeId = ProductTypeId(3);

    /// One regular item with quantity 1.
    pub fn item(row_id: &str, price: f64) -> EstimateLineItem {
        EstimateLineItem {
            row_id: RowId::from(row_id),
            product_type_id: SIGN,
            item_name: format!("Item {row_id}"),
            calculation_display: String::new(),
            unit_price: price,
            quantity: 1.0,
            extended_price: price,
        }
    }
}
