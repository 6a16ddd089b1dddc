//! Line-based receipt text parser.
//!
//! Used when no extractor is configured or the extractor fails. It only
//! recognises lines that end in a price and carry some lettered name; totals,
//! payment lines and headers are skipped by keyword.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::types::{RawLineItem, parse_price};

/// Lines opening with one of these words are never items.
static SKIP_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(sub\s*-?\s*total|total|tax|vat|amount|balance|change|cash|card|visa|mastercard|receipt|thank|visit|date|time|tip|gratuity)\b",
    )
    .ok()
});

/// `[qty] name [qty] [symbol] price`, where the name holds at least one letter.
static ITEM_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<lead>\d{1,3})\s*[xX]?\s+)?(?P<name>.*?\pL.*?)\s+(?:(?P<qty>\d{1,3})\s*[xX@]?\s+)?[$€£¥]?\s*(?P<price>\d[\d,]*(?:\.\d{1,2})?)\s*$",
    )
    .ok()
});

/// Parse item candidates out of raw OCR text.
///
/// Each candidate carries its trailing price as `total_price`; the unit price
/// is left for the normalizer to derive.
#[must_use]
pub fn parse_receipt_text(text: &str) -> Vec<RawLineItem> {
    let (Some(skip), Some(item)) = (SKIP_LINE.as_ref(), ITEM_LINE.as_ref()) else {
        return Vec::new();
    };

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !skip.is_match(line))
        .filter_map(|line| {
            let caps = item.captures(line)?;
            let price = parse_price(caps.name("price")?.as_str())?;
            if price <= Decimal::ZERO {
                return None;
            }
            let quantity = caps
                .name("lead")
                .or_else(|| caps.name("qty"))
                .and_then(|q| q.as_str().parse::<i64>().ok());

            Some(RawLineItem {
                name: Some(caps.name("name")?.as_str().trim().to_string()),
                quantity,
                total_price: Some(price),
                price_per_item: None,
            })
        })
        .collect()
}

/// Cut a JSON object out of an LLM reply.
///
/// Strips Markdown code fences and any prose around the outermost braces.
/// Returns the trimmed input when no object is found.
#[must_use]
pub fn clean_json_payload(reply: &str) -> &str {
    let mut cleaned = reply.trim();
    for fence in ["```json", "```JSON", "```"] {
        if let Some(rest) = cleaned.strip_prefix(fence) {
            cleaned = rest;
            break;
        }
    }
    cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &cleaned[start..=end],
        _ => cleaned,
    }
}
