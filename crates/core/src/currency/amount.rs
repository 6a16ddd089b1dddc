//! Monetary amount paired with an optional currency.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use splitzies_shared::types::CurrencyCode;

use super::rules::CurrencyRules;

/// A monetary value and the currency it is presented in.
///
/// The only externally observable form is [`Amount::format`], which is also
/// the serialized form: a decimal string with exactly the currency's
/// minor-unit digits (`"22.00"`, `"1500"` for JPY, `"1.250"` for KWD).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    /// Unrounded value.
    pub value: Decimal,
    /// Currency code, absent means the two-decimal default.
    pub currency: Option<CurrencyCode>,
}

impl Amount {
    /// Creates a new amount.
    #[must_use]
    pub fn new(value: Decimal, currency: Option<CurrencyCode>) -> Self {
        Self { value, currency }
    }

    /// Value rounded to the currency's precision.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        CurrencyRules::round(self.value, self.currency_str())
    }

    /// Presentation string with the currency's fixed number of digits.
    #[must_use]
    pub fn format(&self) -> String {
        let places = usize::try_from(CurrencyRules::decimal_places(self.currency_str()))
            .unwrap_or_default();
        format!("{:.places$}", self.rounded())
    }

    fn currency_str(&self) -> Option<&str> {
        self.currency.as_ref().map(CurrencyCode::as_str)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn code(raw: &str) -> Option<CurrencyCode> {
        CurrencyCode::parse(raw)
    }

    #[rstest]
    #[case(dec!(22), "USD", "22.00")]
    #[case(dec!(12.950000762939453), "USD", "12.95")]
    #[case(dec!(1499.6), "JPY", "1500")]
    #[case(dec!(1.25), "KWD", "1.250")]
    #[case(dec!(0.5), "CLF", "0.5000")]
    #[case(dec!(7), "ZZZ", "7.00")]
    fn test_format(#[case] value: Decimal, #[case] currency: &str, #[case] expected: &str) {
        assert_eq!(Amount::new(value, code(currency)).format(), expected);
    }

    #[test]
    fn test_format_without_currency() {
        assert_eq!(Amount::new(dec!(3.333), None).format(), "3.33");
        assert_eq!(Amount::new(dec!(0), None).to_string(), "0.00");
    }

    #[test]
    fn test_serializes_as_string() {
        let amount = Amount::new(dec!(3.4), code("USD"));
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"3.40\"");
    }
}
