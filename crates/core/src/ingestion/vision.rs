//! Google Cloud Vision OCR client.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::prelude::BASE64_STANDARD;
use serde::Deserialize;
use serde_json::json;
use splitzies_shared::config::OcrConfig;
use tracing::debug;

use super::error::ExtractionError;
use super::pipeline::OcrEngine;

/// OCR engine backed by the Vision `images:annotate` endpoint.
#[derive(Debug, Clone)]
pub struct VisionOcrClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

impl VisionOcrClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(config: &OcrConfig) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl OcrEngine for VisionOcrClient {
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError> {
        if image.is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let body = json!({
            "requests": [{
                "image": { "content": BASE64_STANDARD.encode(image) },
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }],
            }]
        });

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ExtractionError::status(status.as_u16(), &text));
        }

        let decoded: AnnotateResponse = response.json().await?;
        let text = annotation_text(decoded)?;
        debug!(chars = text.len(), "Vision OCR completed");
        Ok(text)
    }
}

fn annotation_text(response: AnnotateResponse) -> Result<String, ExtractionError> {
    let first = response
        .responses
        .into_iter()
        .next()
        .ok_or(ExtractionError::EmptyResponse)?;

    if let Some(err) = first.error.filter(|e| e.code != 0) {
        return Err(ExtractionError::status(err.code, &err.message));
    }

    first
        .full_text_annotation
        .map(|a| a.text)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            first
                .text_annotations
                .into_iter()
                .next()
                .map(|a| a.description)
        })
        .ok_or(ExtractionError::EmptyResponse)
}
