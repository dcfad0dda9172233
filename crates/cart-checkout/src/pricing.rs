//! Order Totals
//!
//! Deterministic from the cart and the pricing rules alone. Rounding happens
//! once, at the total: half away from zero to 2 decimals.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use cart_core::{Cart, CartLine};

use crate::config::PricingRules;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,

    /// Unrounded `subtotal × tax_rate`
    pub tax: Decimal,

    pub shipping: Decimal,

    /// `subtotal + tax + shipping`, rounded to cents
    pub total: Decimal,
}

pub fn compute_totals(cart: &Cart, rules: &PricingRules) -> OrderTotals {
    let subtotal = cart.total_price();
    let tax = subtotal * rules.tax_rate;
    let shipping = if subtotal > rules.free_shipping_threshold {
        Decimal::ZERO
    } else {
        rules.flat_shipping_fee
    };
    let total = (subtotal + tax + shipping).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    OrderTotals {
        subtotal,
        tax,
        shipping,
        total,
    }
}

/// Order assembled for one checkout attempt; never persisted
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub item_count: u32,
}

impl Order {
    pub fn from_cart(cart: &Cart, rules: &PricingRules) -> Self {
        let totals = compute_totals(cart, rules);
        Self {
            items: cart.lines().to_vec(),
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping: totals.shipping,
            total: totals.total,
            item_count: cart.item_count(),
        }
    }

    /// Free-text description for the payment page
    pub fn description(&self) -> String {
        let titles: Vec<String> = self
            .items
            .iter()
            .map(|line| {
                if line.quantity > 1 {
                    format!("{} x{}", line.title, line.quantity)
                } else {
                    line.title.clone()
                }
            })
            .collect();

        let noun = if self.item_count == 1 { "course" } else { "courses" };
        format!("{} {noun}: {}", self.item_count, titles.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cart_of;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_fee_below_threshold() {
        let cart = cart_of(&[("a", dec!(25)), ("b", dec!(15))]);
        let totals = compute_totals(&cart, &PricingRules::default());

        assert_eq!(totals.subtotal, dec!(40.00));
        assert_eq!(totals.tax, dec!(3.20));
        assert_eq!(totals.shipping, dec!(5.99));
        assert_eq!(totals.total, dec!(49.19));
    }

    #[test]
    fn test_free_shipping_only_above_threshold() {
        let at = compute_totals(&cart_of(&[("a", dec!(50))]), &PricingRules::default());
        assert_eq!(at.shipping, dec!(5.99));

        let above = compute_totals(&cart_of(&[("a", dec!(50.01))]), &PricingRules::default());
        assert_eq!(above.shipping, Decimal::ZERO);
        assert_eq!(above.total, dec!(54.01));
    }

    #[test]
    fn test_rounds_once_at_total() {
        // Per-line tax would be 0.0008 each and round to zero;
        // 3 × 0.01 × 1.08 = 0.0324 -> total 6.0224 -> 6.02
        let cart = cart_of(&[("a", dec!(0.01)), ("b", dec!(0.01)), ("c", dec!(0.01))]);
        let totals = compute_totals(&cart, &PricingRules::default());
        assert_eq!(totals.tax, dec!(0.0024));
        assert_eq!(totals.total, dec!(6.02));

        let cart = cart_of(&[("a", dec!(10.125))]);
        let rules = PricingRules {
            tax_rate: Decimal::ZERO,
            free_shipping_threshold: Decimal::ZERO,
            flat_shipping_fee: Decimal::ZERO,
        };
        assert_eq!(compute_totals(&cart, &rules).total, dec!(10.13));
    }

    #[test]
    fn test_order_from_cart() {
        let cart = cart_of(&[("a", dec!(25)), ("a", dec!(25)), ("b", dec!(15))]);
        let order = Order::from_cart(&cart, &PricingRules::default());

        assert_eq!(order.item_count, 3);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.subtotal, dec!(65));
        assert_eq!(order.shipping, Decimal::ZERO);
        assert_eq!(order.description(), "3 courses: Course a x2, Course b");
    }
}
