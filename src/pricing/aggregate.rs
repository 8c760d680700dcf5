//! Final aggregation into subtotal, tax and total.

use super::format::round2;
use crate::domain::ProductKind;
use crate::model::{EstimateLineItem, EstimatePreviewData, PricingContext};

/// Builds the preview. Subtotal lines are display-only and never summed;
/// tax and total are each rounded on their own.
pub fn aggregate(items: Vec<EstimateLineItem>, context: &PricingContext) -> EstimatePreviewData {
    let subtotal = round2(
        items
            .iter()
            .filter(|item| item.kind() != ProductKind::Subtotal)
            .map(|item| item.extended_price)
            .sum(),
    );
    let tax_amount = round2(subtotal * context.tax_rate);
    EstimatePreviewData {
        items,
        subtotal,
        tax_amount,
        total: round2(subtotal + tax_amount),
        ..EstimatePreviewData::empty(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProductTypeId, RowId};

    fn line(row_id: &str, product_type_id: ProductTypeId, extended_price: f64) -> EstimateLineItem {
        EstimateLineItem {
            row_id: RowId::from(row_id),
            product_type_id,
            item_name: String::new(),
            calculation_display: String::new(),
            unit_price: extended_price,
            quantity: 1.0,
            extended_price,
        }
    }

    #[test]
    fn subtotal_lines_are_excluded() {
        let context = PricingContext {
            tax_rate: 0.13,
            customer_id: Some(7),
            customer_name: Some("Acme".to_string()),
            ..PricingContext::default()
        };
        let mut subtotal_line = line("sub", ProductTypeId::SUBTOTAL, 0.0);
        subtotal_line.extended_price = 999.0;
        let preview = aggregate(
            vec![
                line("a", ProductTypeId(3), 100.0),
                subtotal_line,
                line("df", ProductTypeId::DISCOUNT_FEE, -10.0),
            ],
            &context,
        );

        assert_eq!(preview.subtotal, 90.0);
        assert_eq!(preview.tax_amount, 11.7);
        assert_eq!(preview.total, 101.7);
        assert_eq!(preview.items.len(), 3);
        assert_eq!(preview.customer_id, Some(7));
        assert_eq!(preview.customer_name.as_deref(), Some("Acme"));
        assert_eq!(preview.tax_rate, 0.13);
    }

    #[test]
    fn tax_is_rounded_before_total() {
        let context = PricingContext {
            tax_rate: 0.05,
            ..PricingContext::default()
        };
        let preview = aggregate(vec![line("a", ProductTypeId(3), 0.3)], &context);
        assert_eq!(preview.tax_amount, 0.02);
        assert_eq!(preview.total, 0.32);
    }
}
