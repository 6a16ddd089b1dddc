//! Receipt ingestion: image upload, OCR, structured extraction and
//! normalization into receipt items.
//!
//! ```text
//! image ─► ImageStore ─► OcrEngine ─► ReceiptExtractor ─► normalize ─► NewReceipt
//!                            │               │ (fails)
//!                            │               └──► parse_receipt_text
//!                            └─ (fails) ─► no items
//! ```

pub mod error;
pub mod gemini;
pub mod normalize;
pub mod pipeline;
pub mod text_parser;
pub mod types;
pub mod vision;

pub use error::{ExtractionError, IngestionError};
pub use gemini::GeminiExtractor;
pub use normalize::{normalize, normalize_items, parse_receipt_date};
pub use pipeline::{ImageStore, IngestionService, OcrEngine, ReceiptExtractor};
pub use text_parser::{clean_json_payload, parse_receipt_text};
pub use types::{
    DegradedStage, IngestedReceipt, NormalizedReceipt, RawExtraction, RawLineItem, parse_price,
};
pub use vision::VisionOcrClient;
