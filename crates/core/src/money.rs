//! Money rounding.
//!
//! Amounts are carried as `rust_decimal::Decimal` and rounded to cents, half-up,
//! whenever they are stored. Intermediate products (quantity × price, basis × rate)
//! stay unrounded until that point.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places stored for any money amount.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Round a money amount to cents, half-up (away from zero on a tie).
///
/// The result always carries exactly two decimal places so the serialized form
/// is stable (`130.00`, never `130`).
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_DECIMAL_PLACES);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ties_round_up() {
        assert_eq!(round_money(dec!(0.005)), dec!(0.01));
        assert_eq!(round_money(dec!(2.675)), dec!(2.68));
        assert_eq!(round_money(dec!(0.004)), dec!(0.00));
    }

    #[test]
    fn exact_cents_are_untouched() {
        assert_eq!(round_money(dec!(99.75)), dec!(99.75));
        assert_eq!(round_money(dec!(130)), dec!(130));
    }

    #[test]
    fn scale_is_always_two() {
        assert_eq!(round_money(dec!(130)).to_string(), "130.00");
        assert_eq!(round_money(dec!(0.1)).to_string(), "0.10");
    }

    proptest! {
        /// Rounding is idempotent and never moves a value by more than half a cent.
        #[test]
        fn rounding_is_stable(raw in -10_000_000i64..10_000_000i64) {
            let value = Decimal::new(raw, 4);
            let once = round_money(value);
            prop_assert_eq!(round_money(once), once);
            prop_assert!((once - value).abs() <= dec!(0.005));
        }
    }
}
