//! Row pricing invocation: turns calculator results into line items.
//!
//! Rows are priced strictly in directory order. The "UL already charged in
//! this section" flag is threaded through [`PricingState`] and reset by
//! every Subtotal row.

use super::calculator::{AsyncCalculatorRegistry, CalculatorRegistry};
use super::directory::RowDirectory;
use super::format::round2;
use crate::domain::ProductKind;
use crate::error::PipelineError;
use crate::model::{CalculationResult, CalculationStatus, EstimateLineItem, PricingContext, Row};
use crate::recovery::PassDiagnostics;
use tracing::{debug, error, warn};

/// Sequential accumulator for one pricing loop.
#[derive(Debug, Default)]
struct PricingState {
    ul_in_section: bool,
    items: Vec<EstimateLineItem>,
}

impl PricingState {
    /// Returns the row to price, or `None` when the row is a control row or
    /// missing from the snapshot.
    fn next_row<'a>(&mut self, rows: &'a [Row], position: usize) -> Option<&'a Row> {
        let row = rows.get(position)?;
        match row.kind() {
            ProductKind::Regular => Some(row),
            ProductKind::Subtotal => {
                if self.ul_in_section {
                    debug!(row_id = %row.row_id, "subtotal closes UL section");
                }
                self.ul_in_section = false;
                None
            }
            _ => None,
        }
    }

    fn accept(&mut self, row: &Row, result: CalculationResult, diagnostics: &mut PassDiagnostics) {
        match result.status {
            CalculationStatus::Pending => {
                debug!(row_id = %row.row_id, "calculation pending");
                diagnostics.add_pending_row();
            }
            CalculationStatus::Error(message) => {
                let err = PipelineError::CalculatorFailed {
                    row_id: row.row_id.clone(),
                    product_type_id: row.product_type_id,
                    message,
                };
                warn!(code = %err.code(), category = err.code().category(), error = %err, "row skipped");
                diagnostics.add_row_failure(&err);
            }
            CalculationStatus::Completed if violates_contract(&result) => {
                let err = PipelineError::CalculatorContract {
                    row_id: row.row_id.clone(),
                    product_type_id: row.product_type_id,
                };
                error!(
                    code = %err.code(),
                    category = err.code().category(),
                    quantity = result.quantity,
                    error = %err,
                    "calculator contract violated, row skipped"
                );
                diagnostics.add_row_failure(&err);
            }
            CalculationStatus::Completed => {
                let quantity = result.quantity;
                for component in result.components {
                    if component.is_ul() {
                        self.ul_in_section = true;
                    }
                    self.items.push(EstimateLineItem {
                        row_id: row.row_id.clone(),
                        product_type_id: row.product_type_id,
                        extended_price: round2(component.price * quantity),
                        item_name: component.name,
                        calculation_display: component.calculation_display.unwrap_or_default(),
                        unit_price: component.price,
                        quantity,
                    });
                }
                diagnostics.add_priced_row();
            }
        }
    }
}

/// A completed result must carry components and yield finite money for
/// every one of them.
fn violates_contract(result: &CalculationResult) -> bool {
    let quantity = result.quantity;
    result.components.is_empty()
        || !quantity.is_finite()
        || result
            .components
            .iter()
            .any(|component| !component.price.is_finite() || !(component.price * quantity).is_finite())
}

/// Prices every row of the directory with the synchronous registry.
pub fn price_rows(
    rows: &[Row],
    directory: &RowDirectory,
    registry: &CalculatorRegistry,
    context: &PricingContext,
    diagnostics: &mut PassDiagnostics,
) -> Vec<EstimateLineItem> {
    let mut state = PricingState::default();
    for (_, meta) in directory.iter() {
        let Some(row) = state.next_row(rows, meta.position) else {
            continue;
        };
        let Some(calculator) = registry.get(row.product_type_id) else {
            debug!(row_id = %row.row_id, product_type_id = %row.product_type_id, "no calculator registered");
            continue;
        };
        let result = calculator.calculate(row, context, state.ul_in_section);
        state.accept(row, result, diagnostics);
    }
    state.items
}

/// Same as [`price_rows`], awaiting each calculator before the next row.
pub async fn price_rows_async(
    rows: &[Row],
    directory: &RowDirectory,
    registry: &AsyncCalculatorRegistry,
    context: &PricingContext,
    diagnostics: &mut PassDiagnostics,
) -> Vec<EstimateLineItem> {
    let mut state = PricingState::default();
    for (_, meta) in directory.iter() {
        let Some(row) = state.next_row(rows, meta.position) else {
            continue;
        };
        let Some(calculator) = registry.get(row.product_type_id) else {
            debug!(row_id = %row.row_id, product_type_id = %row.product_type_id, "no calculator registered");
            continue;
        };
        let result = calculator.calculate(row, context, state.ul_in_section).await;
        state.accept(row, result, diagnostics);
    }
    state.items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductTypeId;
    use crate::model::Component;
    use std::sync::Arc;

    const SIGN: ProductTypeId = ProductTypeId(3);

    fn registry() -> CalculatorRegistry {
        let mut registry = CalculatorRegistry::new();
        registry.register(
            SIGN,
            Arc::new(|row: &Row, _: &PricingContext, ul: bool| match row.row_id.as_str() {
                "empty" => CalculationResult::completed(1.0, Vec::new()),
                "broken" => CalculationResult::error("missing dimensions"),
                "later" => CalculationResult::pending(),
                _ if ul => CalculationResult::completed(2.0, vec![Component::new("Sign", 10.005)]),
                _ => CalculationResult::completed(
                    2.0,
                    vec![
                        Component::new("Sign", 10.005),
                        Component::ul_listing("UL Listing", 5.0),
                    ],
                ),
            }),
        );
        registry
    }

    fn price(rows: &[Row]) -> (Vec<EstimateLineItem>, PassDiagnostics) {
        let directory = RowDirectory::from_rows(rows);
        let mut diagnostics = PassDiagnostics::new();
        let items = price_rows(
            rows,
            &directory,
            &registry(),
            &PricingContext::default(),
            &mut diagnostics,
        );
        (items, diagnostics)
    }

    #[test]
    fn components_become_items() {
        let (items, diagnostics) = price(&[Row::new("a", SIGN)]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_name, "Sign");
        assert_eq!(items[0].extended_price, 20.01);
        assert_eq!(items[1].extended_price, 10.0);
        assert_eq!(diagnostics.rows_priced, 1);
    }

    #[test]
    fn ul_flag_is_scoped_to_section() {
        let (items, _) = price(&[
            Row::new("a", SIGN),
            Row::new("b", SIGN),
            Row::new("sub", ProductTypeId::SUBTOTAL),
            Row::new("c", SIGN),
        ]);
        let per_row = |id: &str| items.iter().filter(|i| i.row_id.as_str() == id).count();
        assert_eq!(per_row("a"), 2);
        assert_eq!(per_row("b"), 1);
        assert_eq!(per_row("c"), 2);
    }

    #[test]
    fn contract_violation_skips_row() {
        let (items, diagnostics) = price(&[Row::new("empty", SIGN), Row::new("a", SIGN)]);
        assert!(items.iter().all(|i| i.row_id.as_str() == "a"));
        assert_eq!(diagnostics.row_failures.len(), 1);
        assert_eq!(
            diagnostics.row_failures[0].code,
            crate::error::ErrorCode::CalculatorContract
        );
    }

    #[test]
    fn error_and_pending_contribute_nothing() {
        let (items, diagnostics) = price(&[Row::new("broken", SIGN), Row::new("later", SIGN)]);
        assert!(items.is_empty());
        assert_eq!(diagnostics.rows_pending, 1);
        assert_eq!(diagnostics.row_failures.len(), 1);
    }

    #[test]
    fn special_and_unregistered_rows_are_not_priced() {
        let (items, diagnostics) = price(&[
            Row::new("div", ProductTypeId::DIVIDER),
            Row::new("x", ProductTypeId(99)),
        ]);
        assert!(items.is_empty());
        assert!(diagnostics.is_clean());
        assert_eq!(diagnostics.rows_priced, 0);
    }
}
