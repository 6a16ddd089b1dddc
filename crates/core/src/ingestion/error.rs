//! Ingestion error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Failure of an OCR or extraction call.
///
/// These never fail an upload; the pipeline records them as degraded stages.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Nothing to send.
    #[error("input is empty")]
    EmptyInput,

    /// Transport failure or timeout.
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success HTTP status.
    #[error("service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The service answered without usable content.
    #[error("empty response")]
    EmptyResponse,

    /// The response could not be decoded.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl ExtractionError {
    const MAX_BODY: usize = 512;

    /// Create a status error, keeping at most the first 512 bytes of the body.
    #[must_use]
    pub fn status(status: u16, body: &str) -> Self {
        let mut end = body.len().min(Self::MAX_BODY);
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        Self::Status {
            status,
            body: body[..end].to_string(),
        }
    }
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidPayload(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

/// Hard ingestion failures. Only the image upload can fail an ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The image could not be stored.
    #[error("failed to store receipt image: {0}")]
    Upload(#[from] StorageError),
}
