//! Receipt aggregate domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use splitzies_shared::types::{
    AssignmentId, CurrencyCode, ItemId, ParticipantId, ReceiptId,
};

use crate::split::BillSplit;

/// A receipt and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt ID.
    pub id: ReceiptId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Public URL of the source image.
    pub image_url: Option<String>,
    /// Raw OCR text.
    pub ocr_text: Option<String>,
    /// Currency the receipt is priced in.
    pub currency: Option<CurrencyCode>,
    /// Date printed on the receipt.
    pub receipt_date: Option<NaiveDate>,
    /// Merchant or user supplied title.
    pub title: Option<String>,
    /// Tax amount.
    pub tax: Option<Decimal>,
    /// Tip amount.
    pub tip: Option<Decimal>,
}

impl Receipt {
    /// Currency code as a string slice, if set.
    #[must_use]
    pub fn currency_code(&self) -> Option<&str> {
        self.currency.as_ref().map(CurrencyCode::as_str)
    }
}

/// A line item of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item ID.
    pub id: ItemId,
    /// Owning receipt.
    pub receipt_id: ReceiptId,
    /// Display name.
    pub name: String,
    /// Quantity, always positive.
    pub quantity: i32,
    /// Total price for all units.
    pub total_price: Decimal,
    /// Price of a single unit.
    pub price_per_item: Decimal,
}

/// A person sharing a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant ID.
    pub id: ParticipantId,
    /// Owning receipt.
    pub receipt_id: ReceiptId,
    /// Display name, stored verbatim.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Link between a participant and an item.
///
/// At most one exists per (participant, item) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assignment ID.
    pub id: AssignmentId,
    /// Assigned participant.
    pub participant_id: ParticipantId,
    /// Assigned item.
    pub item_id: ItemId,
    /// Custom owed amount; absent means the equal split applies.
    pub custom_amount: Option<Decimal>,
    /// First-assignment timestamp, which fixes the split order.
    pub created_at: DateTime<Utc>,
}

/// A validated item that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    /// Trimmed name.
    pub name: String,
    /// Positive quantity.
    pub quantity: i32,
    /// Total price.
    pub total_price: Decimal,
    /// Unit price.
    pub price_per_item: Decimal,
}

/// Input for creating a receipt together with its items.
#[derive(Debug, Clone, Default)]
pub struct NewReceipt {
    /// Pre-generated ID (the storage key is derived from it for uploads).
    pub id: ReceiptId,
    /// Public URL of the source image.
    pub image_url: Option<String>,
    /// Raw OCR text.
    pub ocr_text: Option<String>,
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
    /// Validated items.
    pub items: Vec<ItemDraft>,
}

/// Partial update of receipt metadata. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptDetailsPatch {
    /// New currency code.
    pub currency: Option<CurrencyCode>,
    /// New receipt date.
    pub receipt_date: Option<NaiveDate>,
    /// New title.
    pub title: Option<String>,
    /// New tax amount.
    pub tax: Option<Decimal>,
    /// New tip amount.
    pub tip: Option<Decimal>,
}

impl ReceiptDetailsPatch {
    /// Returns true when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.currency.is_none()
            && self.receipt_date.is_none()
            && self.title.is_none()
            && self.tax.is_none()
            && self.tip.is_none()
    }

    /// Applies the patch to a receipt.
    pub fn apply_to(&self, receipt: &mut Receipt) {
        if let Some(currency) = &self.currency {
            receipt.currency = Some(currency.clone());
        }
        if let Some(date) = self.receipt_date {
            receipt.receipt_date = Some(date);
        }
        if let Some(title) = &self.title {
            receipt.title = Some(title.clone());
        }
        if let Some(tax) = self.tax {
            receipt.tax = Some(tax);
        }
        if let Some(tip) = self.tip {
            receipt.tip = Some(tip);
        }
    }
}

/// Everything needed to render a receipt with its computed split.
#[derive(Debug, Clone)]
pub struct ReceiptSummary {
    /// The receipt.
    pub receipt: Receipt,
    /// Participants in creation order.
    pub participants: Vec<Participant>,
    /// Items in ID order.
    pub items: Vec<Item>,
    /// Assignments in split order.
    pub assignments: Vec<Assignment>,
    /// Split computed from the snapshot above.
    pub split: BillSplit,
}
