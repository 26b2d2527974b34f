//! Money arithmetic shared by the catalog, cart and checkout.
//!
//! `discount` on a product is a percentage in `0..=100`. Checkout charges the list
//! `price`; the discounted price is a display value only.

use rust_decimal::{Decimal, RoundingStrategy};

pub fn discounted_price(price: Decimal, discount_percent: Decimal) -> Decimal {
    let percent = discount_percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let reduced = price - price * percent / Decimal::ONE_HUNDRED;
    round_money(reduced)
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

pub fn order_total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(unit_price, quantity)| line_total(unit_price, quantity))
        .sum()
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    #[test]
    fn discount_is_a_percentage() {
        assert_eq!(discounted_price(dec(50, 0), dec(10, 0)), dec(4500, 2));
        assert_eq!(discounted_price(dec(1999, 2), dec(15, 0)), dec(1699, 2));
    }

    #[test]
    fn zero_discount_keeps_price() {
        assert_eq!(discounted_price(dec(20, 0), Decimal::ZERO), dec(2000, 2));
    }

    #[test]
    fn out_of_range_discount_is_clamped() {
        assert_eq!(discounted_price(dec(20, 0), dec(150, 0)), Decimal::ZERO);
        assert_eq!(discounted_price(dec(20, 0), dec(-5, 0)), dec(2000, 2));
    }

    #[test]
    fn order_total_uses_list_price_times_quantity() {
        // 2 x 50.00 + 1 x 20.00
        let total = order_total([(dec(5000, 2), 2), (dec(2000, 2), 1)]);
        assert_eq!(total, dec(120, 0));
    }

    #[test]
    fn empty_order_totals_zero() {
        assert_eq!(order_total(Vec::new()), Decimal::ZERO);
    }
}
