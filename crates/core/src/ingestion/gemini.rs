//! Gemini-backed receipt extractor.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use splitzies_shared::config::ExtractionConfig;
use tracing::debug;

use super::error::ExtractionError;
use super::pipeline::ReceiptExtractor;
use super::text_parser::clean_json_payload;
use super::types::RawExtraction;

const INSTRUCTIONS: &str = "\
Read the receipt text below and answer with a single JSON object, no prose:
{\"items\":[{\"name\":string,\"quantity\":integer,\"total_price\":number|null,\"price_per_item\":number|null}],
 \"currency\":string|null,\"receipt_date\":string|null,\"title\":string|null,\"tax\":number|null,\"tip\":number|null}
- items holds purchased line items only. Leave out subtotals, totals, tax, tip, payments, change and headers.
- quantity defaults to 1. Use null for a price that is not printed.
- name is a readable product name, e.g. \"Chicken Sandwich\" for \"CHKN SNDWCH\".
- title is the merchant name.
- currency is an ISO 4217 code, inferred from symbols or location when not printed, otherwise null.
- receipt_date uses YYYY-MM-DD.
- tax and tip are the printed amounts, otherwise null.

Receipt text:
";

/// Extractor calling the Generative Language `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiExtractor {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiExtractor {
    /// Build an extractor from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ReceiptExtractor for GeminiExtractor {
    async fn extract(&self, text: &str) -> Result<RawExtraction, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": format!("{INSTRUCTIONS}{text}") }] }],
            "generationConfig": {
                "temperature": 0.1,
                "topP": 0.95,
                "maxOutputTokens": 2048,
                "responseMimeType": "application/json",
            }
        });

        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ExtractionError::status(status.as_u16(), &text));
        }

        let decoded: GenerateResponse = response.json().await?;
        let reply = reply_text(decoded)?;
        debug!(chars = reply.len(), "Extraction reply received");
        parse_reply(&reply)
    }
}

fn reply_text(response: GenerateResponse) -> Result<String, ExtractionError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(ExtractionError::EmptyResponse)
    } else {
        Ok(text)
    }
}

fn parse_reply(reply: &str) -> Result<RawExtraction, ExtractionError> {
    Ok(serde_json::from_str(clean_json_payload(reply))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config(endpoint: &str) -> ExtractionConfig {
        ExtractionConfig {
            api_key: "key".to_string(),
            model: "gemini-test".to_string(),
            endpoint: endpoint.to_string(),
            timeout_secs: 1,
        }
    }

    #[test]
    fn test_url_joins_model() {
        let extractor = GeminiExtractor::new(&config("https://example.test/v1beta/")).unwrap();
        assert_eq!(
            extractor.url,
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"items\":"},{"text":"[]}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(reply_text(response).unwrap(), r#"{"items":[]}"#);
    }

    #[test]
    fn test_reply_text_empty() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            reply_text(response),
            Err(ExtractionError::EmptyResponse)
        ));
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "```json\n{\"items\":[{\"name\":\"Nachos\",\"quantity\":1,\"total_price\":11.5,\"price_per_item\":null}],\"currency\":\"USD\",\"title\":\"Taco Town\",\"tax\":0.92,\"tip\":null}\n```";
        let raw = parse_reply(reply).unwrap();
        assert_eq!(raw.items.len(), 1);
        assert_eq!(raw.items[0].total_price, Some(dec!(11.5)));
        assert_eq!(raw.title.as_deref(), Some("Taco Town"));
        assert_eq!(raw.tax, Some(dec!(0.92)));
    }

    #[test]
    fn test_parse_garbage_reply() {
        assert!(matches!(
            parse_reply("I could not read this receipt."),
            Err(ExtractionError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_text_rejected_without_request() {
        let extractor = GeminiExtractor::new(&config("http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            extractor.extract("   ").await,
            Err(ExtractionError::EmptyInput)
        ));
    }
}
