//! Storage service implementation using Apache OpenDAL.

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{Operator, services};
use splitzies_shared::types::ReceiptId;
use tracing::{debug, info};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use crate::ingestion::ImageStore;

/// Storage service for receipt images.
#[derive(Debug, Clone)]
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        info!(
            provider = config.provider.name(),
            bucket = config.provider.bucket(),
            "Storage initialized"
        );
        Ok(Self { operator, config })
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let mut builder = services::S3::default()
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                if !endpoint.is_empty() {
                    builder = builder.endpoint(endpoint);
                }
                Operator::new(builder).map(|b| b.finish())
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => Operator::new(
                services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container),
            )
            .map(|b| b.finish()),
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                Operator::new(services::Fs::default().root(root)).map(|b| b.finish())
            }
        };

        operator.map_err(|e| StorageError::configuration(e.to_string()))
    }

    /// Check an upload against the size limit and accepted image types.
    ///
    /// # Errors
    ///
    /// Returns an error if file size or content type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Storage key for a receipt image: `receipts/{receipt_id}.{ext}`.
    #[must_use]
    pub fn object_key(receipt_id: ReceiptId, content_type: &str) -> String {
        format!("receipts/{receipt_id}.{}", extension_for(content_type))
    }

    /// Public URL of a stored object.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.config.public_base_url.trim_end_matches('/'))
    }

    /// Validate and store a receipt image, returning its public URL.
    ///
    /// A blank content type is treated as `image/jpeg`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for oversized or non-image uploads, or an
    /// operation error when the write fails.
    pub async fn upload_receipt_image(
        &self,
        receipt_id: ReceiptId,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StorageError> {
        let content_type = normalize_content_type(content_type);
        let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
        self.validate_upload(&content_type, size)?;

        let key = Self::object_key(receipt_id, &content_type);
        self.operator
            .write_with(&key, data)
            .content_type(&content_type)
            .await?;
        debug!(receipt_id = %receipt_id, %key, size, "Receipt image written");

        Ok(self.public_url(&key))
    }

    /// Delete an object. Deleting a missing object succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }
}

#[async_trait]
impl ImageStore for StorageService {
    async fn upload(
        &self,
        receipt_id: ReceiptId,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StorageError> {
        self.upload_receipt_image(receipt_id, content_type, data)
            .await
    }

    async fn remove(&self, receipt_id: ReceiptId, content_type: &str) -> Result<(), StorageError> {
        let key = Self::object_key(receipt_id, &normalize_content_type(content_type));
        self.delete(&key).await
    }
}

fn normalize_content_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence.is_empty() {
        StorageConfig::DEFAULT_CONTENT_TYPE.to_string()
    } else {
        essence
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match normalize_content_type(content_type).as_str() {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}
