//! Core business logic for Splitzies.
//!
//! This crate holds the receipt-splitting domain with no database or web
//! server dependencies. The outbound HTTP clients used for OCR and extraction
//! live here behind traits so the pipeline can be tested without them.
//!
//! # Modules
//!
//! - `currency` - Minor-unit rules, rounding and formatting
//! - `split` - Bill-split allocator
//! - `receipt` - Receipt aggregate, validation and service
//! - `ingestion` - Image upload, OCR, extraction and normalization
//! - `storage` - Object storage for receipt images

pub mod currency;
pub mod ingestion;
pub mod receipt;
pub mod split;
pub mod storage;
