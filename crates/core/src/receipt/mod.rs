//! Receipt aggregate: receipts, items, participants and assignments.

pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod tests;

pub use error::ReceiptError;
pub use service::{ReceiptRepository, ReceiptService};
pub use types::{
    Assignment, Item, ItemDraft, NewReceipt, Participant, Receipt, ReceiptDetailsPatch,
    ReceiptSummary,
};
pub use validation::{MAX_STORED_AMOUNT, derive_prices, to_stored_amount, validate_item};
