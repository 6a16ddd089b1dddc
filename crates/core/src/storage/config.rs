//! Storage configuration types.

use serde::{Deserialize, Serialize};
use splitzies_shared::config::StorageSettings;
use std::path::PathBuf;

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, Google Cloud Storage interop
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Build a provider from application settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown provider name or a
    /// missing bucket/container.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = match settings.provider.trim().to_ascii_lowercase().as_str() {
            "s3" | "r2" | "gcs" => Self::S3 {
                endpoint: settings.endpoint.clone(),
                bucket: settings.bucket.clone(),
                access_key_id: settings.access_key_id.clone(),
                secret_access_key: settings.secret_access_key.clone(),
                region: settings.region.clone(),
            },
            "azure" | "azure_blob" | "azblob" => Self::AzureBlob {
                account: settings.account.clone(),
                access_key: settings.access_key.clone(),
                container: settings.bucket.clone(),
            },
            "local" | "fs" => Self::LocalFs {
                root: PathBuf::from(&settings.root),
            },
            other => {
                return Err(StorageError::configuration(format!(
                    "unknown storage provider '{other}'"
                )));
            }
        };

        if !matches!(provider, Self::LocalFs { .. }) && settings.bucket.trim().is_empty() {
            return Err(StorageError::configuration("storage bucket is required"));
        }
        Ok(provider)
    }

    /// Provider name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Bucket or container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::AzureBlob { container, .. } => container,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Public URL prefix for stored objects.
    pub public_base_url: String,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Allowed MIME types for upload.
    pub allowed_mime_types: Vec<String>,
}

impl StorageConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Content type assumed when the client sends none.
    pub const DEFAULT_CONTENT_TYPE: &'static str = "image/jpeg";

    /// Create a new storage config with default limits.
    #[must_use]
    pub fn new(provider: StorageProvider, public_base_url: impl Into<String>) -> Self {
        Self {
            provider,
            public_base_url: public_base_url.into(),
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: Self::default_mime_types(),
        }
    }

    /// Build a config from application settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the provider is invalid.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = StorageProvider::from_settings(settings)?;
        let max_file_size = u64::try_from(settings.max_file_size).unwrap_or(u64::MAX);
        Ok(Self::new(provider, settings.public_base_url.clone()).with_max_file_size(max_file_size))
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Image types accepted for receipts.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        ["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Check if a MIME type is allowed.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(mime_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> StorageSettings {
        StorageSettings {
            provider: provider.to_string(),
            bucket: "receipts".to_string(),
            endpoint: "https://account.r2.cloudflarestorage.com".to_string(),
            region: "auto".to_string(),
            access_key_id: "id".to_string(),
            secret_access_key: "secret".to_string(),
            account: "splitzies".to_string(),
            access_key: "key".to_string(),
            root: "./uploads".to_string(),
            public_base_url: "https://img.example.com".to_string(),
            max_file_size: 1024,
        }
    }

    #[test]
    fn test_s3_from_settings() {
        let provider = StorageProvider::from_settings(&settings("R2")).unwrap();
        assert_eq!(provider.name(), "s3");
        assert_eq!(provider.bucket(), "receipts");
    }

    #[test]
    fn test_azure_from_settings() {
        let provider = StorageProvider::from_settings(&settings("azure_blob")).unwrap();
        assert_eq!(provider.name(), "azure_blob");
        assert_eq!(provider.bucket(), "receipts");
    }

    #[test]
    fn test_local_does_not_need_bucket() {
        let mut s = settings("local");
        s.bucket = String::new();
        let provider = StorageProvider::from_settings(&s).unwrap();
        assert_eq!(provider.name(), "local");
    }

    #[test]
    fn test_bucket_required_for_remote() {
        let mut s = settings("s3");
        s.bucket = "  ".to_string();
        assert!(matches!(
            StorageProvider::from_settings(&s),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn test_unknown_provider() {
        assert!(matches!(
            StorageProvider::from_settings(&settings("ftp")),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_from_settings() {
        let config = StorageConfig::from_settings(&settings("local")).unwrap();
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.public_base_url, "https://img.example.com");
    }

    #[test]
    fn test_mime_type_validation() {
        let config = StorageConfig::new(StorageProvider::LocalFs { root: "./t".into() }, "");
        assert_eq!(config.max_file_size, StorageConfig::DEFAULT_MAX_FILE_SIZE);
        assert!(config.is_mime_type_allowed("image/png"));
        assert!(config.is_mime_type_allowed("image/JPG"));
        assert!(!config.is_mime_type_allowed("application/pdf"));
        assert!(!config.is_mime_type_allowed("text/html"));
    }
}
