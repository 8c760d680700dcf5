//! Money rounding and the text used in `calculation_display`.

/// Rounds to cents, halves toward positive infinity.
///
/// Every stored money figure goes through this; sums are rounded per term
/// where the totals require it, never only once at the end.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0 + 0.5).floor() / 100.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// `$1,234.50`, `-$2.00`.
pub fn format_currency(value: f64) -> String {
    let rounded = round2(value);
    let cents = (rounded.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${whole}.{:02}", cents % 100)
}

/// `13%`, `7.25%`, `-10%`. At most four decimals.
pub fn format_percent(percent: f64) -> String {
    let mut text = format!("{:.4}", percent);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text == "-0" {
        text = "0".to_string();
    }
    format!("{text}%")
}

/// Pads labels to a common width so the amounts line up.
pub fn aligned_lines(rows: &[(String, String)]) -> Vec<String> {
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, value)| format!("{label:<width$} {value}"))
        .collect()
}

fn group_thousands(mut whole: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if whole < 1000 {
            groups.push(whole.to_string());
            break;
        }
        groups.push(format!("{:03}", whole % 1000));
        whole /= 1000;
    }
    groups.reverse();
    groups.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_halves_up() {
        assert_eq!(round2(2.125), 2.13);
        assert_eq!(round2(-2.125), -2.12);
        assert_eq!(round2(3.0000000000000004), 3.0);
        assert_eq!(round2(-0.001), 0.0);
        assert!(round2(-0.001).is_sign_positive());
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(30.0), "$30.00");
        assert_eq!(format_currency(-2.0), "-$2.00");
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn percent_trims_zeros() {
        assert_eq!(format_percent(13.0), "13%");
        assert_eq!(format_percent(7.25), "7.25%");
        assert_eq!(format_percent(-10.0), "-10%");
        assert_eq!(format_percent(0.0), "0%");
    }

    #[test]
    fn labels_are_padded() {
        let lines = aligned_lines(&[
            ("Subtotal:".to_string(), "$30.00".to_string()),
            ("Section Total:".to_string(), "$33.00".to_string()),
        ]);
        assert_eq!(lines[0], "Subtotal:      $30.00");
        assert_eq!(lines[1], "Section Total: $33.00");
    }
}
