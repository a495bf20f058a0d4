//! Imprint text extraction via Google Cloud Vision
//!
//! Sends the PNG-encoded sketch to the `images:annotate` endpoint and reads
//! the first text annotation. A sketch with no recognizable text is a normal
//! outcome and yields an empty imprint, never an error.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors reported by the OCR collaborator
///
/// None of these abort a search; the pipeline degrades to an empty imprint
/// and surfaces the message as a non-blocking warning.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR request failed: {0}")]
    Transport(String),
    #[error("OCR service returned status {0}")]
    Status(u16),
    #[error("OCR response could not be parsed: {0}")]
    Malformed(String),
    #[error("OCR service error: {0}")]
    Service(String),
}

/// Text extraction collaborator
#[async_trait]
pub trait OcrClient: Send + Sync {
    /// Extract the primary text annotation from a PNG-encoded image.
    /// Returns an empty string when no text is detected.
    async fn extract_text(&self, png: &[u8]) -> Result<String, OcrError>;
}

/// Google Cloud Vision OCR client
pub struct GoogleVisionOcr {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleVisionOcr {
    /// Create a client for the given annotation endpoint and API key
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl OcrClient for GoogleVisionOcr {
    async fn extract_text(&self, png: &[u8]) -> Result<String, OcrError> {
        let body = serde_json::json!({
            "requests": [{
                "image": { "content": BASE64.encode(png) },
                "features": [{ "type": "TEXT_DETECTION" }],
            }]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| OcrError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::Status(status.as_u16()));
        }

        let annotate: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| OcrError::Malformed(e.to_string()))?;

        let result = annotate.responses.into_iter().next().unwrap_or_default();
        if let Some(error) = result.error {
            return Err(OcrError::Service(
                error.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let imprint = result
            .text_annotations
            .into_iter()
            .next()
            .map(|a| normalize_imprint(&a.description))
            .unwrap_or_default();

        debug!("OCR extracted imprint: {:?}", imprint);
        Ok(imprint)
    }
}

/// Collapse all whitespace runs (newlines included) to single spaces and trim
pub fn normalize_imprint(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResult {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<ServiceStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ServiceStatus {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_imprint_collapses_newlines() {
        assert_eq!(normalize_imprint("ABC\n123"), "ABC 123");
    }

    #[test]
    fn test_normalize_imprint_trims_and_collapses_runs() {
        assert_eq!(normalize_imprint("  TY \t 500 \n"), "TY 500");
        assert_eq!(normalize_imprint(""), "");
        assert_eq!(normalize_imprint(" \n\t "), "");
    }

    #[test]
    fn test_annotate_response_decodes_primary_text() {
        let json = r#"{
            "responses": [{
                "textAnnotations": [
                    { "description": "TY\n500", "locale": "en" },
                    { "description": "TY" }
                ]
            }]
        }"#;

        let parsed: AnnotateResponse = serde_json::from_str(json).unwrap();
        let first = parsed.responses.into_iter().next().unwrap();
        assert_eq!(first.text_annotations[0].description, "TY\n500");
        assert!(first.error.is_none());
    }

    #[test]
    fn test_annotate_response_decodes_empty_and_error() {
        let empty: AnnotateResponse = serde_json::from_str(r#"{"responses":[{}]}"#).unwrap();
        assert!(empty.responses[0].text_annotations.is_empty());

        let failed: AnnotateResponse = serde_json::from_str(
            r#"{"responses":[{"error":{"code":7,"message":"permission denied"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            failed.responses[0].error.as_ref().unwrap().message.as_deref(),
            Some("permission denied")
        );
    }
}
