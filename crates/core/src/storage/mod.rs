//! Object storage for receipt images using Apache OpenDAL.
//!
//! Supported backends:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, Google Cloud Storage interop
//! - Azure Blob Storage
//! - Local filesystem (development only)
//!
//! Images are stored under `receipts/{receipt_id}.{ext}` and exposed through
//! a configured public base URL.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::StorageService;
