//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Object storage for receipt images. Image upload is disabled without it.
    #[serde(default)]
    pub storage: Option<StorageSettings>,
    /// OCR service. Uploaded receipts keep zero items without it.
    #[serde(default)]
    pub ocr: Option<OcrConfig>,
    /// LLM extraction service. The regex text parser is used without it.
    #[serde(default)]
    pub extraction: Option<ExtractionConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending migrations on startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Object storage settings.
///
/// `provider` is one of `s3`, `azblob` or `fs`; the remaining fields are read
/// according to the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend name.
    pub provider: String,
    /// Bucket (S3) or container (Azure) name.
    #[serde(default)]
    pub bucket: String,
    /// S3 endpoint URL.
    #[serde(default)]
    pub endpoint: String,
    /// S3 region.
    #[serde(default = "default_region")]
    pub region: String,
    /// S3 access key id.
    #[serde(default)]
    pub access_key_id: String,
    /// S3 secret access key.
    #[serde(default)]
    pub secret_access_key: String,
    /// Azure storage account.
    #[serde(default)]
    pub account: String,
    /// Azure access key.
    #[serde(default)]
    pub access_key: String,
    /// Root directory for the local filesystem backend.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Public URL prefix returned for uploaded objects.
    pub public_base_url: String,
    /// Upload size limit in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_storage_root() -> String {
    "./uploads".to_string()
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024
}

/// OCR service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// API key.
    pub api_key: String,
    /// Annotate endpoint.
    #[serde(default = "default_ocr_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ocr_endpoint() -> String {
    "https://vision.googleapis.com/v1/images:annotate".to_string()
}

/// LLM extraction configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// API key.
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// API base endpoint.
    #[serde(default = "default_extraction_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_extraction_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SPLITZIES").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Returns the `host:port` the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
