//! Property-based tests for currency operations.
//!
//! - Rounding is idempotent for every currency precision
//! - Equal allocation always sums to the original total

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocation::AllocationUtil;
use super::rules::CurrencyRules;

/// Currencies covering every precision in the table, plus unknown and absent.
const CURRENCIES: &[Option<&str>] = &[
    Some("USD"),
    Some("JPY"),
    Some("KWD"),
    Some("CLF"),
    Some("XXY"),
    None,
];

/// Strategy to generate decimal values with up to 10 fractional digits.
fn any_value() -> impl Strategy<Value = Decimal> {
    (-10_000_000_000_000i64..10_000_000_000_000i64, 0u32..=10)
        .prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

/// Strategy to pick a currency.
fn any_currency() -> impl Strategy<Value = Option<&'static str>> {
    prop::sample::select(CURRENCIES)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Rounding twice equals rounding once.
    #[test]
    fn prop_round_is_idempotent(value in any_value(), currency in any_currency()) {
        let once = CurrencyRules::round(value, currency);
        let twice = CurrencyRules::round(once, currency);
        prop_assert_eq!(once, twice);
    }

    /// Rounded values never carry more digits than the currency allows.
    #[test]
    fn prop_round_respects_precision(value in any_value(), currency in any_currency()) {
        let rounded = CurrencyRules::round(value, currency);
        prop_assert!(rounded.scale() <= CurrencyRules::decimal_places(currency));
    }

    /// Converting to minor units and back equals rounding.
    #[test]
    fn prop_minor_units_round_trip_equals_round(
        value in any_value(),
        currency in any_currency(),
    ) {
        let minor = CurrencyRules::to_minor_units(value, currency);
        let back = CurrencyRules::from_minor_units(minor, currency);
        prop_assert_eq!(back, CurrencyRules::round(value, currency));
    }

    /// Allocations sum exactly to the total and differ by at most one unit.
    #[test]
    fn prop_allocate_equal_minor_conserves_total(
        total in 0i128..100_000_000_000,
        count in 1usize..200,
    ) {
        let parts = AllocationUtil::allocate_equal_minor(total, count);
        prop_assert_eq!(parts.len(), count);
        prop_assert_eq!(parts.iter().sum::<i128>(), total);

        let max = parts.iter().copied().max().unwrap_or_default();
        let min = parts.iter().copied().min().unwrap_or_default();
        prop_assert!(max - min <= 1);
        prop_assert!(parts.windows(2).all(|w| w[0] >= w[1]));
    }

    /// Decimal allocation sums to the rounded total.
    #[test]
    fn prop_allocate_equal_conserves_rounded_total(
        value in any_value(),
        count in 1usize..50,
        places in 0u32..=4,
    ) {
        let parts = AllocationUtil::allocate_equal(value, count, places);
        let expected = super::rules::round_dp(value, places);
        prop_assert_eq!(parts.iter().copied().sum::<Decimal>(), expected);
    }
}
