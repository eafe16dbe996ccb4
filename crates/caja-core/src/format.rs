//! # Change Formatting
//!
//! Human-readable summaries of a breakdown for receipts and the cashier
//! screen.

use crate::breakdown::CashBreakdown;

/// Shown when a breakdown holds nothing.
pub const NO_CHANGE_LABEL: &str = "Sin cambio";

/// Renders a breakdown as `"<count>x$<value>"` entries joined by `", "`.
///
/// Entries follow natural field order (bills, then coins) and skip empty
/// slots. Whole face values print without decimals, fractional ones with
/// exactly two.
///
/// ## Example
/// ```rust
/// use caja_core::{format_change_breakdown, CashBreakdown, Denomination};
///
/// let change = CashBreakdown::empty()
///     .with(Denomination::Peso1, 3)
///     .with(Denomination::Centavos50, 2);
/// assert_eq!(format_change_breakdown(&change), "3x$1, 2x$0.50");
///
/// assert_eq!(format_change_breakdown(&CashBreakdown::empty()), "Sin cambio");
/// ```
pub fn format_change_breakdown(change_breakdown: &CashBreakdown) -> String {
    let parts: Vec<String> = change_breakdown
        .non_zero()
        .map(|(denomination, count)| {
            format!("{}x${}", count, denomination.value().face_label())
        })
        .collect();

    if parts.is_empty() {
        NO_CHANGE_LABEL.to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::denomination::Denomination;

    #[test]
    fn test_empty_breakdown() {
        assert_eq!(format_change_breakdown(&CashBreakdown::empty()), "Sin cambio");
    }

    #[test]
    fn test_natural_order_not_value_order() {
        // $20 coin is listed after every bill, even the $1 bill
        let change = CashBreakdown::empty()
            .with(Denomination::Peso20, 1)
            .with(Denomination::Ones, 2)
            .with(Denomination::Hundreds, 2)
            .with(Denomination::Centavos10, 1);

        assert_eq!(
            format_change_breakdown(&change),
            "2x$100, 2x$1, 1x$20, 1x$0.10"
        );
    }

    #[test]
    fn test_large_bills() {
        let change = CashBreakdown::empty().with(Denomination::Thousands, 12);
        assert_eq!(format_change_breakdown(&change), "12x$1000");
    }
}
