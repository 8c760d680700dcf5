//! Validation producer for the numeric slots of special control rows.
//!
//! Regular product rows are validated by their own calculators upstream;
//! this module only covers the rows the post-processing chain reads.

use super::input_guards::validate_numeric_range;
use super::tracker::{CellValidationEntry, StructureErrorEntry, ValidationStateTracker};
use crate::domain::{FieldName, FieldValue, ProductKind};
use crate::model::Row;
use crate::pricing::stages::{DISCOUNT_FEE_PAIRS, MULTIPLIER_SLOTS};
use tracing::debug;

pub const RULE_MULTIPLIER_NEEDS_ROWS: &str = "multiplier_requires_preceding_rows";

/// Percentages beyond this magnitude are accepted but flagged.
pub const PERCENT_WARNING_LIMIT: f64 = 100.0;

/// Counts of what [`validate_special_rows`] reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldRuleReport {
    pub errors: usize,
    pub warnings: usize,
    pub structure_errors: usize,
}

/// Checks Multiplier and Discount/Fee rows and records findings in the
/// tracker. The blocking flag is recomputed before returning.
pub fn validate_special_rows(rows: &[Row], tracker: &mut ValidationStateTracker) -> FieldRuleReport {
    let mut report = FieldRuleReport::default();
    let mut batch = tracker.batch();

    for (position, row) in rows.iter().enumerate() {
        let numeric_fields: Vec<FieldName> = match row.kind() {
            ProductKind::Multiplier => {
                if position == 0 {
                    batch.set_structure_error(
                        row.row_id.clone(),
                        StructureErrorEntry::new(
                            "Multiplier has no rows above it to apply to",
                            RULE_MULTIPLIER_NEEDS_ROWS,
                        ),
                    );
                    report.structure_errors += 1;
                }
                MULTIPLIER_SLOTS.iter().map(|(_, field)| *field).collect()
            }
            ProductKind::DiscountFee => DISCOUNT_FEE_PAIRS
                .iter()
                .flat_map(|(_, percent, flat)| [*percent, *flat])
                .collect(),
            _ => continue,
        };

        for field in numeric_fields {
            let Some(cell) = row.field(field) else {
                continue;
            };
            match &cell.value {
                FieldValue::Empty | FieldValue::Number(_) => {}
                FieldValue::Text(_) | FieldValue::Option(_) => {
                    batch.set_cell_error(
                        row.row_id.clone(),
                        field,
                        CellValidationEntry::new("Value must be a number")
                            .expected("number")
                            .value(cell.raw.clone()),
                    );
                    report.errors += 1;
                }
            }
        }

        if row.kind() == ProductKind::DiscountFee {
            for (_, percent_field, _) in DISCOUNT_FEE_PAIRS {
                let Some(FieldValue::Number(percent)) = row.field(percent_field).map(|c| &c.value)
                else {
                    continue;
                };
                if validate_numeric_range(
                    "percent",
                    *percent,
                    -PERCENT_WARNING_LIMIT,
                    PERCENT_WARNING_LIMIT,
                )
                .is_err()
                {
                    batch.set_cell_warning(
                        row.row_id.clone(),
                        percent_field,
                        CellValidationEntry::new("Percentage is beyond ±100%")
                            .expected("percent between -100 and 100")
                            .value(percent.to_string()),
                    );
                    report.warnings += 1;
                }
            }
        }
    }

    drop(batch);
    debug!(
        errors = report.errors,
        warnings = report.warnings,
        structure_errors = report.structure_errors,
        "special row validation finished"
    );
    report
}
