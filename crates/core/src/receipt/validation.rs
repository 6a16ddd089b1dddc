//! Item validation and price derivation.
//!
//! An item must satisfy `total_price == price_per_item * quantity`. When only
//! one price is known, the other is derived and rounded to
//! [`MAX_MINOR_UNITS`] digits so it stores exactly. When both are known they
//! are trusted as given.
//!
//! Money columns are `NUMERIC(14,4)`: given prices are rounded to
//! [`MAX_MINOR_UNITS`] digits before any check, and anything above
//! [`MAX_STORED_AMOUNT`] is rejected.

use rust_decimal::Decimal;
use splitzies_shared::types::MAX_MINOR_UNITS;

use super::error::ReceiptError;
use super::types::ItemDraft;
use crate::currency::round_dp;

/// Largest value a `NUMERIC(14,4)` money column holds: `9999999999.9999`.
pub const MAX_STORED_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 4);

/// Round a money value to storage precision.
///
/// Returns `None` when its magnitude does not fit the money columns.
#[must_use]
pub fn to_stored_amount(value: Decimal) -> Option<Decimal> {
    let rounded = round_dp(value, MAX_MINOR_UNITS);
    (rounded.abs() <= MAX_STORED_AMOUNT).then_some(rounded)
}

/// Fill in whichever price is missing.
///
/// Returns `None` when both prices are absent or the arithmetic overflows.
/// `quantity` must be positive.
#[must_use]
pub fn derive_prices(
    quantity: i32,
    total_price: Option<Decimal>,
    price_per_item: Option<Decimal>,
) -> Option<(Decimal, Decimal)> {
    let qty = Decimal::from(quantity);
    match (total_price, price_per_item) {
        (Some(total), Some(unit)) => Some((total, unit)),
        (Some(total), None) => {
            let unit = total.checked_div(qty)?;
            Some((total, round_dp(unit, MAX_MINOR_UNITS)))
        }
        (None, Some(unit)) => {
            let total = unit.checked_mul(qty)?;
            Some((round_dp(total, MAX_MINOR_UNITS), unit))
        }
        (None, None) => None,
    }
}

/// Validate a manually entered item and derive its missing price.
///
/// Rules:
/// - `name` must not be blank (it is trimmed)
/// - `quantity` must be a positive 32-bit integer
/// - at least one price must be present and positive, none may be negative
///
/// # Errors
///
/// Returns `ReceiptError::Validation` naming the offending field.
pub fn validate_item(
    name: &str,
    quantity: i64,
    total_price: Option<Decimal>,
    price_per_item: Option<Decimal>,
) -> Result<ItemDraft, ReceiptError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ReceiptError::validation("name", "name is required"));
    }

    let quantity = i32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| ReceiptError::validation("quantity", "quantity must be a positive integer"))?;

    let total_price = total_price
        .map(|p| stored_price("total_price", p))
        .transpose()?;
    let price_per_item = price_per_item
        .map(|p| stored_price("price_per_item", p))
        .transpose()?;

    if total_price.is_none() && price_per_item.is_none() {
        return Err(ReceiptError::validation(
            "total_price",
            "either total_price or price_per_item is required",
        ));
    }
    if total_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(ReceiptError::validation(
            "total_price",
            "total_price must not be negative",
        ));
    }
    if price_per_item.is_some_and(|p| p < Decimal::ZERO) {
        return Err(ReceiptError::validation(
            "price_per_item",
            "price_per_item must not be negative",
        ));
    }
    let any_positive = [total_price, price_per_item]
        .into_iter()
        .flatten()
        .any(|p| p > Decimal::ZERO);
    if !any_positive {
        let field = if total_price.is_some() {
            "total_price"
        } else {
            "price_per_item"
        };
        return Err(ReceiptError::validation(field, "price must be positive"));
    }

    let (total_price, price_per_item) = derive_prices(quantity, total_price, price_per_item)
        .filter(|(total, unit)| *total <= MAX_STORED_AMOUNT && *unit <= MAX_STORED_AMOUNT)
        .ok_or_else(|| ReceiptError::validation("total_price", "price is out of range"))?;

    Ok(ItemDraft {
        name: name.to_string(),
        quantity,
        total_price,
        price_per_item,
    })
}

fn stored_price(field: &str, value: Decimal) -> Result<Decimal, ReceiptError> {
    to_stored_amount(value)
        .ok_or_else(|| ReceiptError::validation(field, format!("{field} is out of range")))
}

/// Validate a participant display name.
///
/// The name is stored verbatim; only blank names are rejected.
///
/// # Errors
///
/// Returns `ReceiptError::Validation` for a blank name.
pub fn validate_participant_name(name: &str) -> Result<(), ReceiptError> {
    if name.trim().is_empty() {
        return Err(ReceiptError::validation("name", "name is required"));
    }
    Ok(())
}

/// Validate an optional non-negative money field.
///
/// # Errors
///
/// Returns `ReceiptError::Validation` when the value is negative or too
/// large to store.
pub fn validate_non_negative(field: &str, value: Option<Decimal>) -> Result<(), ReceiptError> {
    match value {
        Some(v) if v < Decimal::ZERO => Err(ReceiptError::validation(
            field,
            format!("{field} must not be negative"),
        )),
        Some(v) if v > MAX_STORED_AMOUNT => Err(ReceiptError::validation(
            field,
            format!("{field} is out of range"),
        )),
        _ => Ok(()),
    }
}
