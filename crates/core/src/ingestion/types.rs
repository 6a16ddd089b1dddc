//! Untrusted extraction output and its normalized form.
//!
//! OCR text parsing and LLM extraction produce loosely typed data: prices may
//! be numbers, numeric strings with currency symbols, or garbage. Decoding is
//! lenient so a single bad field never rejects the whole payload.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use splitzies_shared::types::{CurrencyCode, ReceiptId};

use crate::receipt::{ItemDraft, NewReceipt};

/// A line item as reported by OCR parsing or the LLM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawLineItem {
    /// Item name, possibly blank.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// Quantity, possibly missing or non-positive.
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<i64>,
    /// Total price for all units.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_price: Option<Decimal>,
    /// Unit price.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price_per_item: Option<Decimal>,
}

/// Whole-receipt extraction result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawExtraction {
    /// Candidate line items.
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<RawLineItem>,
    /// Currency code.
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    /// Receipt date, preferred over `date`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub receipt_date: Option<String>,
    /// Alternative key some models use for the receipt date.
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    /// Merchant name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    /// Tax amount.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub tax: Option<Decimal>,
    /// Tip amount.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub tip: Option<Decimal>,
}

impl RawExtraction {
    /// Extraction carrying only line items and no metadata.
    #[must_use]
    pub fn from_items(items: Vec<RawLineItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }
}

/// Canonical items and metadata ready to enter the receipt aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedReceipt {
    /// Valid items.
    pub items: Vec<ItemDraft>,
    /// Currency code.
    pub currency: Option<CurrencyCode>,
    /// Receipt date.
    pub receipt_date: Option<NaiveDate>,
    /// Title.
    pub title: Option<String>,
    /// Tax amount.
    pub tax: Option<Decimal>,
    /// Tip amount.
    pub tip: Option<Decimal>,
}

/// Pipeline stages that may degrade without failing an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedStage {
    /// No OCR engine configured.
    OcrUnavailable,
    /// OCR request failed.
    OcrFailed,
    /// OCR returned no text.
    OcrEmpty,
    /// No extractor configured; the text parser was used.
    ExtractionUnavailable,
    /// Extraction failed; the text parser was used.
    ExtractionFailed,
}

impl std::fmt::Display for DegradedStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OcrUnavailable => "ocr_unavailable",
            Self::OcrFailed => "ocr_failed",
            Self::OcrEmpty => "ocr_empty",
            Self::ExtractionUnavailable => "extraction_unavailable",
            Self::ExtractionFailed => "extraction_failed",
        };
        f.write_str(s)
    }
}

/// Output of the image ingestion pipeline.
#[derive(Debug, Clone)]
pub struct IngestedReceipt {
    /// Receipt ready to be persisted.
    pub receipt: NewReceipt,
    /// Stages that degraded.
    pub degraded: Vec<DegradedStage>,
}

impl IngestedReceipt {
    /// ID the image was stored under.
    #[must_use]
    pub fn receipt_id(&self) -> ReceiptId {
        self.receipt.id
    }
}

/// Parse a price out of free text such as `"$1,234.50"`, `"12,50 €"` or `"-3"`.
///
/// Returns `None` when no number can be recovered.
#[must_use]
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match (kept.rfind('.'), kept.rfind(',')) {
        // "1.234,56": comma is the decimal separator
        (Some(dot), Some(comma)) if comma > dot => kept.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => kept.replace(',', ""),
        // "12,50": a lone comma followed by one or two digits
        (None, Some(comma)) if kept.len() - comma <= 3 && kept.matches(',').count() == 1 => {
            kept.replace(',', ".")
        }
        _ => kept.replace(',', ""),
    };

    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let s = n.to_string();
            Decimal::from_str(&s)
                .or_else(|_| Decimal::from_scientific(&s))
                .ok()
        }
        Value::String(s) => parse_price(s),
        _ => None,
    }
}

fn lenient_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(decimal_from_value(&value))
}

fn lenient_quantity<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| decimal_from_value(&value).and_then(|q| q.trunc().to_i64())),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_items<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RawLineItem>, D::Error> {
    let value = Value::deserialize(d)?;
    let Value::Array(entries) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<RawLineItem>(entry).ok())
        .collect())
}
