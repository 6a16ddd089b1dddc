//! Receipt error types.

use splitzies_shared::types::{ItemId, ParticipantId, ReceiptId};
use thiserror::Error;

/// Receipt-related errors.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Input failed validation.
    #[error("{field}: {message}")]
    Validation {
        /// Offending input field.
        field: String,
        /// Human readable message.
        message: String,
    },

    /// Receipt not found.
    #[error("Receipt not found: {0}")]
    ReceiptNotFound(ReceiptId),

    /// Participant not found.
    #[error("User not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// Item not found.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// Participant and item belong to different receipts.
    #[error("User {participant_id} and item {item_id} belong to different receipts")]
    CrossReceipt {
        /// The participant.
        participant_id: ParticipantId,
        /// The item.
        item_id: ItemId,
    },

    /// Persistence failure.
    #[error("Repository error: {0}")]
    Repository(String),
}

impl ReceiptError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<ReceiptError> for splitzies_shared::AppError {
    fn from(err: ReceiptError) -> Self {
        match err {
            ReceiptError::Validation { field, message } => Self::Validation {
                field: Some(field),
                message,
            },
            ReceiptError::Repository(msg) => Self::Database(msg),
            other => Self::NotFound(other.to_string()),
        }
    }
}
