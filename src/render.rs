//! Plain-text rendering of a preview.

use crate::domain::{ProductKind, RowId};
use crate::model::{EstimatePreviewData, Row};
use crate::pricing::format::{aligned_lines, format_currency, format_percent};
use std::collections::HashMap;
use std::fmt::Write as _;

const NAME_WIDTH: usize = 32;

/// Renders items as a fixed-width table followed by the totals block.
/// Breakdown text is indented under its item.
pub fn render_text(preview: &EstimatePreviewData, rows: &[Row]) -> String {
    let numbers: HashMap<&RowId, &str> = rows
        .iter()
        .map(|row| (&row.row_id, row.display_number.as_str()))
        .collect();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<5} {:<NAME_WIDTH$} {:>10} {:>12} {:>12}",
        "#", "Item", "Qty", "Unit", "Extended"
    );
    for item in &preview.items {
        let number = numbers.get(&item.row_id).copied().unwrap_or("");
        if item.kind() == ProductKind::Subtotal {
            let _ = writeln!(out, "{:<5}", number);
        } else {
            let _ = writeln!(
                out,
                "{:<5} {:<NAME_WIDTH$} {:>10} {:>12} {:>12}",
                number,
                truncate(&item.item_name, NAME_WIDTH),
                format_quantity(item.quantity),
                format_currency(item.unit_price),
                format_currency(item.extended_price)
            );
        }
        for line in item.calculation_display.lines() {
            let _ = writeln!(out, "      {line}");
        }
    }

    out.push('\n');
    let totals = aligned_lines(&[
        ("Subtotal:".to_string(), format_currency(preview.subtotal)),
        (
            format!("Tax ({}):", format_percent(preview.tax_rate * 100.0)),
            format_currency(preview.tax_amount),
        ),
        ("Total:".to_string(), format_currency(preview.total)),
    ]);
    for line in totals {
        let _ = writeln!(out, "{line}");
    }
    out
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{quantity:.0}")
    } else {
        format!("{quantity:.2}")
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductTypeId;
    use crate::model::{EstimateLineItem, PricingContext};
    use crate::pricing::aggregate;

    #[test]
    fn renders_items_and_totals() {
        let rows = vec![
            Row::new("a", ProductTypeId(3)).with_display_number("1"),
            Row::new("sub", ProductTypeId::SUBTOTAL).with_display_number("2"),
        ];
        let items = vec![
            EstimateLineItem {
                row_id: RowId::from("a"),
                product_type_id: ProductTypeId(3),
                item_name: "Channel letters".to_string(),
                calculation_display: "12 letters @ $100.00".to_string(),
                unit_price: 100.0,
                quantity: 2.0,
                extended_price: 200.0,
            },
            EstimateLineItem {
                row_id: RowId::from("sub"),
                product_type_id: ProductTypeId::SUBTOTAL,
                item_name: String::new(),
                calculation_display: "Subtotal: $200.00".to_string(),
                unit_price: 0.0,
                quantity: 0.0,
                extended_price: 0.0,
            },
        ];
        let context = PricingContext {
            tax_rate: 0.13,
            ..PricingContext::default()
        };
        let text = render_text(&aggregate(items, &context), &rows);

        assert!(text.contains("Channel letters"));
        assert!(text.contains("      12 letters @ $100.00"));
        assert!(text.contains("Tax (13%): $26.00"));
        assert!(text.contains("Total:     $226.00"));
    }

    #[test]
    fn long_names_are_cut() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
