//! Image ingestion pipeline: upload, OCR, extraction, normalization.
//!
//! Only the upload is allowed to fail the request. Every later stage degrades
//! to less data and is reported in [`IngestedReceipt::degraded`].

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use splitzies_shared::types::ReceiptId;
use tracing::{debug, info, warn};

use super::error::{ExtractionError, IngestionError};
use super::normalize::normalize;
use super::text_parser::parse_receipt_text;
use super::types::{DegradedStage, IngestedReceipt, RawExtraction};
use crate::receipt::NewReceipt;
use crate::storage::StorageError;

/// Stores receipt images and returns their public URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `data` for `receipt_id`.
    async fn upload(
        &self,
        receipt_id: ReceiptId,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StorageError>;

    /// Remove the image stored for `receipt_id`. Removing a missing image succeeds.
    async fn remove(&self, receipt_id: ReceiptId, content_type: &str) -> Result<(), StorageError>;
}

/// Turns an image into text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognise the text in `image`.
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError>;
}

/// Turns OCR text into structured receipt data.
#[async_trait]
pub trait ReceiptExtractor: Send + Sync {
    /// Extract items and metadata from `text`.
    async fn extract(&self, text: &str) -> Result<RawExtraction, ExtractionError>;
}

/// Image ingestion service.
#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn ImageStore>,
    ocr: Option<Arc<dyn OcrEngine>>,
    extractor: Option<Arc<dyn ReceiptExtractor>>,
}

impl std::fmt::Debug for IngestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionService")
            .field("ocr", &self.ocr.is_some())
            .field("extractor", &self.extractor.is_some())
            .finish_non_exhaustive()
    }
}

impl IngestionService {
    /// Create a pipeline that only stores images.
    #[must_use]
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self {
            store,
            ocr: None,
            extractor: None,
        }
    }

    /// Attach an OCR engine.
    #[must_use]
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Attach an extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn ReceiptExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Store an image and derive a receipt from it.
    ///
    /// The returned receipt is not persisted yet.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::Upload`] when the image cannot be stored.
    pub async fn ingest_image(
        &self,
        data: Bytes,
        content_type: &str,
    ) -> Result<IngestedReceipt, IngestionError> {
        let receipt_id = ReceiptId::new();
        let image_url = self
            .store
            .upload(receipt_id, content_type, data.clone())
            .await?;
        debug!(receipt_id = %receipt_id, %image_url, "Receipt image stored");

        let mut degraded = Vec::new();
        let ocr_text = self.recognize(receipt_id, &data, &mut degraded).await;
        let raw = match ocr_text.as_deref() {
            Some(text) => self.extract(receipt_id, text, &mut degraded).await,
            None => RawExtraction::default(),
        };

        let normalized = normalize(raw);
        info!(
            receipt_id = %receipt_id,
            item_count = normalized.items.len(),
            degraded = degraded.len(),
            "Receipt image ingested"
        );

        Ok(IngestedReceipt {
            receipt: NewReceipt {
                id: receipt_id,
                image_url: Some(image_url),
                ocr_text,
                currency: normalized.currency,
                receipt_date: normalized.receipt_date,
                title: normalized.title,
                tax: normalized.tax,
                tip: normalized.tip,
                items: normalized.items,
            },
            degraded,
        })
    }

    /// Remove the stored image of a receipt that was never persisted.
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn discard(&self, receipt_id: ReceiptId, content_type: &str) {
        match self.store.remove(receipt_id, content_type).await {
            Ok(()) => debug!(receipt_id = %receipt_id, "Orphaned receipt image removed"),
            Err(e) => warn!(receipt_id = %receipt_id, error = %e, "Failed to remove orphaned receipt image"),
        }
    }

    async fn recognize(
        &self,
        receipt_id: ReceiptId,
        data: &[u8],
        degraded: &mut Vec<DegradedStage>,
    ) -> Option<String> {
        let Some(ocr) = &self.ocr else {
            warn!(receipt_id = %receipt_id, "OCR not configured, storing image only");
            degraded.push(DegradedStage::OcrUnavailable);
            return None;
        };

        match ocr.recognize(data).await {
            Ok(text) if text.trim().is_empty() => {
                warn!(receipt_id = %receipt_id, "OCR returned no text");
                degraded.push(DegradedStage::OcrEmpty);
                None
            }
            Ok(text) => Some(text),
            Err(e) => {
                warn!(receipt_id = %receipt_id, error = %e, "OCR failed");
                degraded.push(DegradedStage::OcrFailed);
                None
            }
        }
    }

    async fn extract(
        &self,
        receipt_id: ReceiptId,
        text: &str,
        degraded: &mut Vec<DegradedStage>,
    ) -> RawExtraction {
        let Some(extractor) = &self.extractor else {
            warn!(receipt_id = %receipt_id, "Extractor not configured, parsing OCR text");
            degraded.push(DegradedStage::ExtractionUnavailable);
            return RawExtraction::from_items(parse_receipt_text(text));
        };

        match extractor.extract(text).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(receipt_id = %receipt_id, error = %e, "Extraction failed, parsing OCR text");
                degraded.push(DegradedStage::ExtractionFailed);
                RawExtraction::from_items(parse_receipt_text(text))
            }
        }
    }
}
