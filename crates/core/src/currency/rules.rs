//! Currency rules: minor-unit precision and rounding.
//!
//! All rounding uses `RoundingStrategy::MidpointAwayFromZero` (2.345 → 2.35,
//! -2.345 → -2.35) so that presentation and minor-unit conversion agree.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use splitzies_shared::types::{DEFAULT_MINOR_UNITS, minor_unit_digits};

/// Rounding strategy shared by every money operation.
pub const MONEY_ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Currency rules for precision and rounding.
///
/// Unknown or absent currency codes silently use two decimal places.
pub struct CurrencyRules;

impl CurrencyRules {
    /// Number of minor-unit digits for a currency.
    ///
    /// # Example
    ///
    /// ```
    /// use splitzies_core::currency::CurrencyRules;
    ///
    /// assert_eq!(CurrencyRules::decimal_places(Some("USD")), 2);
    /// assert_eq!(CurrencyRules::decimal_places(Some("JPY")), 0);
    /// assert_eq!(CurrencyRules::decimal_places(Some("KWD")), 3);
    /// assert_eq!(CurrencyRules::decimal_places(None), 2);
    /// ```
    #[must_use]
    pub fn decimal_places(currency: Option<&str>) -> u32 {
        currency.map_or(DEFAULT_MINOR_UNITS, minor_unit_digits)
    }

    /// Round a value to the currency's minor-unit precision.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use splitzies_core::currency::CurrencyRules;
    ///
    /// let noisy = dec!(12.950000762939453);
    /// assert_eq!(CurrencyRules::round(noisy, Some("USD")), dec!(12.95));
    /// ```
    #[must_use]
    pub fn round(value: Decimal, currency: Option<&str>) -> Decimal {
        round_dp(value, Self::decimal_places(currency))
    }

    /// Convert a major-unit value to integer minor units, rounding first.
    ///
    /// `10.005 USD` becomes `1001`; `1500 JPY` stays `1500`.
    #[must_use]
    pub fn to_minor_units(value: Decimal, currency: Option<&str>) -> i128 {
        scale_to_minor(value, Self::decimal_places(currency))
    }

    /// Convert integer minor units back to a major-unit value.
    #[must_use]
    pub fn from_minor_units(minor: i128, currency: Option<&str>) -> Decimal {
        scale_from_minor(minor, Self::decimal_places(currency))
    }
}

/// Round a value to `decimal_places` with the money rounding strategy.
#[must_use]
pub fn round_dp(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, MONEY_ROUNDING)
}

/// Scale a value to integer units of `10^-decimal_places`, rounding first.
///
/// The rounded mantissa is at most 96 bits, so every currency precision fits an
/// `i128`. Wider precisions saturate.
#[must_use]
pub fn scale_to_minor(value: Decimal, decimal_places: u32) -> i128 {
    let rounded = round_dp(value, decimal_places);
    let missing_digits = decimal_places.saturating_sub(rounded.scale());
    rounded
        .mantissa()
        .saturating_mul(10i128.saturating_pow(missing_digits))
}

/// Build a decimal from integer units of `10^-decimal_places`.
///
/// Values outside the `Decimal` range saturate.
#[must_use]
pub fn scale_from_minor(minor: i128, decimal_places: u32) -> Decimal {
    Decimal::try_from_i128_with_scale(minor, decimal_places).unwrap_or(if minor < 0 {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}
