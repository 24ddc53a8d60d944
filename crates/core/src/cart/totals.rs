//! Derived totals over cart items.
//!
//! Pure and exact: no rounding happens here.

use rust_decimal::Decimal;

use super::CartItem;
use crate::types::{Price, Product};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Unit price after applying the product's discount percentage.
///
/// The percentage is clamped to `[0, 100]`, so the result never exceeds the
/// list price and never goes negative.
#[must_use]
pub fn effective_unit_price(product: &Product) -> Decimal {
    let discount = product.discount_percentage.clamp(Decimal::ZERO, ONE_HUNDRED);
    product.price * (Decimal::ONE - discount / ONE_HUNDRED)
}

/// Aggregates over a cart snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    /// Sum of list price times quantity.
    pub subtotal: Decimal,
    /// Sum of discounted price times quantity.
    pub total: Decimal,
    /// `subtotal - total`.
    pub savings: Decimal,
    /// Sum of quantities.
    pub unit_count: u64,
}

impl CartTotals {
    /// Compute totals for a list of items.
    #[must_use]
    pub fn compute(items: &[CartItem]) -> Self {
        let (subtotal, total, unit_count) = items.iter().fold(
            (Decimal::ZERO, Decimal::ZERO, 0_u64),
            |(subtotal, total, units), item| {
                let quantity = Decimal::from(item.quantity);
                (
                    subtotal + item.product.price * quantity,
                    total + effective_unit_price(&item.product) * quantity,
                    units + u64::from(item.quantity),
                )
            },
        );

        Self {
            subtotal,
            total,
            savings: subtotal - total,
            unit_count,
        }
    }

    #[must_use]
    pub const fn subtotal_price(&self) -> Price {
        Price::idr(self.subtotal)
    }

    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::idr(self.total)
    }

    #[must_use]
    pub const fn savings_price(&self) -> Price {
        Price::idr(self.savings)
    }

    /// Whether any discount applies to the cart.
    #[must_use]
    pub fn has_savings(&self) -> bool {
        self.savings > Decimal::ZERO
    }
}

impl CartItem {
    /// Discounted unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        effective_unit_price(&self.product) * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::product;
    use super::*;

    #[test]
    fn test_effective_price_applies_percentage() {
        assert_eq!(effective_unit_price(&product(100, 100, 10)), Decimal::new(90, 0));
        assert_eq!(effective_unit_price(&product(1, 50, 0)), Decimal::new(50, 0));
    }

    #[test]
    fn test_effective_price_keeps_fractions() {
        let mut p = product(1, 0, 0);
        p.price = Decimal::new(999, 2);
        p.discount_percentage = Decimal::new(717, 2);
        // 9.99 * (1 - 0.0717) = 9.273717
        assert_eq!(effective_unit_price(&p), Decimal::new(9_273_717, 6));
    }

    #[test]
    fn test_effective_price_clamps_out_of_range_discount() {
        let mut p = product(1, 80, 0);
        p.discount_percentage = Decimal::new(150, 0);
        assert_eq!(effective_unit_price(&p), Decimal::ZERO);

        p.discount_percentage = Decimal::new(-5, 0);
        assert_eq!(effective_unit_price(&p), Decimal::new(80, 0));
    }

    #[test]
    fn test_totals_for_mixed_cart() {
        let items = vec![
            CartItem { product: product(1, 100, 10), quantity: 2 },
            CartItem { product: product(2, 50, 0), quantity: 1 },
        ];

        let totals = CartTotals::compute(&items);
        assert_eq!(totals.subtotal, Decimal::new(250, 0));
        assert_eq!(totals.total, Decimal::new(230, 0));
        assert_eq!(totals.savings, Decimal::new(20, 0));
        assert_eq!(totals.unit_count, 3);
        assert!(totals.has_savings());
    }

    #[test]
    fn test_totals_for_empty_cart() {
        let totals = CartTotals::compute(&[]);
        assert_eq!(totals, CartTotals::default());
        assert!(!totals.has_savings());
    }

    #[test]
    fn test_line_total() {
        let item = CartItem { product: product(1, 100, 10), quantity: 3 };
        assert_eq!(item.line_total(), Decimal::new(270, 0));
    }
}
