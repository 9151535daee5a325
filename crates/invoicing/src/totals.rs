//! Derived invoice figures.
//!
//! Nothing here is cached or persisted: totals are recomputed from the items
//! and tax rate whenever they are read. Rounding happens only when formatting.

use serde::Serialize;

use crate::invoice::InvoiceItem;

/// Subtotal, tax and total of one invoice at full precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl Totals {
    pub fn compute(items: &[InvoiceItem], tax_rate: f64) -> Self {
        let subtotal = subtotal(items);
        let tax = tax(subtotal, tax_rate);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

/// `Σ quantity × price`; zero for an empty slice.
pub fn subtotal(items: &[InvoiceItem]) -> f64 {
    items.iter().map(InvoiceItem::amount).sum()
}

/// `subtotal × tax_rate / 100`.
pub fn tax(subtotal: f64, tax_rate: f64) -> f64 {
    subtotal * (tax_rate / 100.0)
}

pub fn total(items: &[InvoiceItem], tax_rate: f64) -> f64 {
    Totals::compute(items, tax_rate).total
}

/// Round half away from zero to two decimals, for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `"USD 137.50"`.
pub fn format_money(currency: &str, value: f64) -> String {
    format!("{currency} {:.2}", round2(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(quantity: f64, price: f64) -> InvoiceItem {
        InvoiceItem::new("line", quantity, price)
    }

    #[test]
    fn worked_example() {
        let items = vec![item(2.0, 50.0), item(1.0, 25.0)];
        let totals = Totals::compute(&items, 10.0);
        assert_eq!(totals.subtotal, 125.0);
        assert_eq!(totals.tax, 12.5);
        assert_eq!(totals.total, 137.5);
        assert_eq!(format_money("USD", totals.total), "USD 137.50");
    }

    #[test]
    fn empty_items_are_all_zero() {
        assert_eq!(Totals::compute(&[], 25.0), Totals::default());
    }

    #[test]
    fn negative_lines_reduce_the_subtotal() {
        let items = vec![item(1.0, 100.0), item(-1.0, 30.0)];
        assert_eq!(subtotal(&items), 70.0);
    }

    #[test]
    fn formatting_rounds_but_values_keep_precision() {
        let items = vec![item(3.0, 0.3333)];
        let totals = Totals::compute(&items, 0.0);
        assert!((totals.subtotal - 0.9999).abs() < 1e-12);
        assert_eq!(format_money("EUR", totals.subtotal), "EUR 1.00");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// total = subtotal × (1 + r/100) for non-negative rates.
        #[test]
        fn total_is_subtotal_scaled_by_rate(
            lines in prop::collection::vec((-1_000i32..1_000i32, 0u32..100_000u32), 0..20),
            rate in 0u32..10_000u32,
        ) {
            let items: Vec<InvoiceItem> = lines
                .iter()
                .map(|(q, cents)| item(*q as f64, *cents as f64 / 100.0))
                .collect();
            let rate = rate as f64 / 100.0;

            let totals = Totals::compute(&items, rate);
            let expected = totals.subtotal * (1.0 + rate / 100.0);
            let tolerance = 1e-9 * expected.abs().max(1.0);
            prop_assert!((totals.total - expected).abs() <= tolerance);
        }

        /// Summation does not depend on item order.
        #[test]
        fn subtotal_is_order_independent(
            lines in prop::collection::vec((0u32..500u32, 0u32..10_000u32), 0..15),
        ) {
            let items: Vec<InvoiceItem> = lines
                .iter()
                .map(|(q, cents)| item(*q as f64, *cents as f64 / 100.0))
                .collect();
            let mut reversed = items.clone();
            reversed.reverse();

            let a = subtotal(&items);
            let b = subtotal(&reversed);
            prop_assert!((a - b).abs() <= 1e-6 * a.abs().max(1.0));
        }
    }
}
