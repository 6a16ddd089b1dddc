//! Currency codes and their ISO 4217 minor-unit precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are always `rust_decimal::Decimal`; this module only knows how many
//! fractional digits each currency carries.

use serde::{Deserialize, Serialize};

/// Minor-unit digits used when a currency is absent or not in the table.
pub const DEFAULT_MINOR_UNITS: u32 = 2;

/// Widest minor unit of any known currency.
pub const MAX_MINOR_UNITS: u32 = 4;

const ZERO_DIGIT: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "UYI", "VND",
    "VUV", "XAF", "XOF", "XPF",
];

const THREE_DIGIT: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

const FOUR_DIGIT: &[&str] = &["CLF", "UYW"];

/// A normalized (trimmed, upper-case) ISO 4217 currency code.
///
/// Any non-blank code is accepted. Codes outside the minor-unit table fall back
/// to [`DEFAULT_MINOR_UNITS`] rather than being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses a currency code, returning `None` for blank input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for a three-letter alphabetic code.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 3 && self.0.bytes().all(|b| b.is_ascii_uppercase())
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| "Currency code must not be blank".to_string())
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Returns the ISO 4217 minor-unit digits for a currency code.
///
/// The lookup is case-insensitive and ignores surrounding whitespace. Unknown
/// codes return [`DEFAULT_MINOR_UNITS`].
#[must_use]
pub fn minor_unit_digits(code: &str) -> u32 {
    let code = code.trim().to_ascii_uppercase();
    if ZERO_DIGIT.contains(&code.as_str()) {
        0
    } else if THREE_DIGIT.contains(&code.as_str()) {
        3
    } else if FOUR_DIGIT.contains(&code.as_str()) {
        4
    } else {
        DEFAULT_MINOR_UNITS
    }
}
