//! Reconciliation of raw extraction output into canonical items.
//!
//! This stage never fails. Items that cannot be repaired are dropped:
//! - blank names
//! - neither price present
//! - a derived or given price that is zero or negative at storage precision
//! - a price too large for the money columns
//!
//! Missing or non-positive quantities become 1. A currency that is not a
//! three-letter code is dropped.

use chrono::{DateTime, Datelike, NaiveDate};
use rust_decimal::Decimal;
use splitzies_shared::types::CurrencyCode;

use super::types::{NormalizedReceipt, RawExtraction, RawLineItem};
use crate::receipt::{ItemDraft, MAX_STORED_AMOUNT, derive_prices, to_stored_amount};

/// Date layouts accepted from receipts, tried in order.
///
/// chrono's `%Y` takes any number of digits, so a match on a `%Y` layout only
/// counts when the year has four digits (see [`parse_receipt_date`]).
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m/%d/%y", "%d.%m.%Y"];

/// Normalize a whole extraction.
#[must_use]
pub fn normalize(raw: RawExtraction) -> NormalizedReceipt {
    let receipt_date = non_blank(raw.receipt_date.as_deref())
        .and_then(parse_receipt_date)
        .or_else(|| non_blank(raw.date.as_deref()).and_then(parse_receipt_date));

    NormalizedReceipt {
        items: normalize_items(raw.items),
        currency: raw
            .currency
            .as_deref()
            .and_then(CurrencyCode::parse)
            .filter(CurrencyCode::is_well_formed),
        receipt_date,
        title: non_blank(raw.title.as_deref()).map(str::to_string),
        tax: raw.tax.and_then(to_stored_amount).filter(|t| *t >= Decimal::ZERO),
        tip: raw.tip.and_then(to_stored_amount).filter(|t| *t >= Decimal::ZERO),
    }
}

/// Normalize line items, dropping the ones that cannot be repaired.
#[must_use]
pub fn normalize_items(items: Vec<RawLineItem>) -> Vec<ItemDraft> {
    items.into_iter().filter_map(normalize_item).collect()
}

/// Normalize one line item.
#[must_use]
pub fn normalize_item(raw: RawLineItem) -> Option<ItemDraft> {
    let name = non_blank(raw.name.as_deref())?.to_string();

    let quantity = match raw.quantity {
        Some(q) if q >= 1 => i32::try_from(q).ok()?,
        _ => 1,
    };

    let given_total = match raw.total_price {
        Some(p) => Some(to_stored_amount(p)?),
        None => None,
    };
    let given_unit = match raw.price_per_item {
        Some(p) => Some(to_stored_amount(p)?),
        None => None,
    };

    let (total_price, price_per_item) = derive_prices(quantity, given_total, given_unit)?;
    let storable = |p: Decimal| p > Decimal::ZERO && p <= MAX_STORED_AMOUNT;
    if !storable(total_price) || !storable(price_per_item) {
        return None;
    }

    Some(ItemDraft {
        name,
        quantity,
        total_price,
        price_per_item,
    })
}

/// Parse a receipt date in one of the common layouts, or an RFC 3339 timestamp.
///
/// Two-digit years (`03/01/26`) resolve through `%y` into 1970..=2069.
#[must_use]
pub fn parse_receipt_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .find(|date| date.year() >= 1000)
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn raw(name: &str, qty: Option<i64>, total: Option<Decimal>, unit: Option<Decimal>) -> RawLineItem {
        RawLineItem {
            name: Some(name.to_string()),
            quantity: qty,
            total_price: total,
            price_per_item: unit,
        }
    }

    #[test]
    fn test_missing_quantity_defaults_to_one() {
        let item = normalize_item(raw("Tea", None, Some(dec!(3)), None)).unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.price_per_item, dec!(3));
    }

    #[rstest]
    #[case(Some(0))]
    #[case(Some(-4))]
    fn test_non_positive_quantity_is_clamped(#[case] qty: Option<i64>) {
        let item = normalize_item(raw("Tea", qty, None, Some(dec!(2.5)))).unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.total_price, dec!(2.5));
    }

    #[test]
    fn test_derives_total_from_unit_price() {
        let item = normalize_item(raw("Beer", Some(2), None, Some(dec!(3.50)))).unwrap();
        assert_eq!(item.total_price, dec!(7.00));
    }

    #[test]
    fn test_derives_unit_price_from_total() {
        let item = normalize_item(raw("Wings", Some(3), Some(dec!(10)), None)).unwrap();
        assert_eq!(item.price_per_item, dec!(3.3333));
    }

    #[test]
    fn test_both_prices_trusted() {
        let item = normalize_item(raw("Combo", Some(2), Some(dec!(9)), Some(dec!(5)))).unwrap();
        assert_eq!(item.total_price, dec!(9));
        assert_eq!(item.price_per_item, dec!(5));
    }

    #[rstest]
    #[case(raw("   ", None, Some(dec!(1)), None))]
    #[case(raw("Tea", None, None, None))]
    #[case(raw("Tea", None, Some(dec!(0)), None))]
    #[case(raw("Discount", None, Some(dec!(-2)), None))]
    #[case(raw("Tea", None, Some(dec!(4)), Some(dec!(0))))]
    #[case(raw("Tea", Some(5_000_000_000), Some(dec!(4)), None))]
    #[case(raw("Tea", None, Some(dec!(0.00001)), None))]
    #[case(raw("Tea", Some(3), Some(dec!(0.0001)), None))]
    #[case(raw("Tea", None, Some(dec!(10000000000)), None))]
    #[case(raw("Tea", Some(2), None, Some(dec!(6000000000))))]
    fn test_dropped_items(#[case] item: RawLineItem) {
        assert!(normalize_item(item).is_none());
    }

    #[test]
    fn test_nameless_item_dropped() {
        let item = RawLineItem {
            total_price: Some(dec!(1)),
            ..RawLineItem::default()
        };
        assert!(normalize_item(item).is_none());
    }

    #[test]
    fn test_given_prices_are_rounded_to_storage_precision() {
        let item = normalize_item(raw("Tea", None, Some(dec!(2.00005)), None)).unwrap();
        assert_eq!(item.total_price, dec!(2.0001));
        assert_eq!(item.price_per_item, dec!(2.0001));
    }

    #[test]
    fn test_name_is_trimmed() {
        let item = normalize_item(raw("  Fries\t", None, Some(dec!(2)), None)).unwrap();
        assert_eq!(item.name, "Fries");
    }

    #[test]
    fn test_normalize_metadata() {
        let result = normalize(RawExtraction {
            items: vec![raw("Tea", None, Some(dec!(3)), None), raw("", None, None, None)],
            currency: Some(" eur ".to_string()),
            receipt_date: Some("  ".to_string()),
            date: Some("2026-03-01".to_string()),
            title: Some("  Cafe Luna ".to_string()),
            tax: Some(dec!(-1)),
            tip: Some(dec!(2)),
        });

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.currency.as_ref().map(CurrencyCode::as_str), Some("EUR"));
        assert_eq!(result.receipt_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(result.title.as_deref(), Some("Cafe Luna"));
        assert_eq!(result.tax, None);
        assert_eq!(result.tip, Some(dec!(2)));
    }

    #[test]
    fn test_unstorable_tax_and_tip_are_dropped() {
        let result = normalize(RawExtraction {
            tax: Some(dec!(10000000000)),
            tip: Some(dec!(1.00004)),
            ..RawExtraction::default()
        });
        assert_eq!(result.tax, None);
        assert_eq!(result.tip, Some(dec!(1.0000)));
    }

    #[rstest]
    #[case(" usd ", Some("USD"))]
    #[case("xyz", Some("XYZ"))]
    #[case("Rupiah", None)]
    #[case("$", None)]
    fn test_normalize_currency(#[case] raw_code: &str, #[case] expected: Option<&str>) {
        let result = normalize(RawExtraction {
            currency: Some(raw_code.to_string()),
            ..RawExtraction::default()
        });
        assert_eq!(result.currency.as_ref().map(CurrencyCode::as_str), expected);
    }

    #[test]
    fn test_normalize_empty() {
        let result = normalize(RawExtraction::default());
        assert_eq!(result, NormalizedReceipt::default());
    }

    #[rstest]
    #[case("2026-03-01", Some((2026, 3, 1)))]
    #[case("2026/03/01", Some((2026, 3, 1)))]
    #[case("03/01/2026", Some((2026, 3, 1)))]
    #[case("03/01/26", Some((2026, 3, 1)))]
    #[case("12/31/25", Some((2025, 12, 31)))]
    #[case(" 7/4/99 ", Some((1999, 7, 4)))]
    #[case("26-03-01", None)]
    #[case("01.03.26", None)]
    #[case("01.03.2026", Some((2026, 3, 1)))]
    #[case("2026-03-01T18:30:00Z", Some((2026, 3, 1)))]
    #[case("yesterday", None)]
    fn test_parse_receipt_date(#[case] raw: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let expected = expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assert_eq!(parse_receipt_date(raw), expected);
    }

    #[test]
    fn test_unparseable_receipt_date_falls_back_to_date() {
        let result = normalize(RawExtraction {
            receipt_date: Some("March-ish".to_string()),
            date: Some("2026/02/14".to_string()),
            ..RawExtraction::default()
        });
        assert_eq!(result.receipt_date, NaiveDate::from_ymd_opt(2026, 2, 14));
    }
}
