//! Copy generation provider adapter
//!
//! Turns an analysis description (plus optional transcript and scene
//! breakdown) into headline/description ad copy via the Anthropic
//! Messages API. This adapter only runs after a successful analysis, and
//! its failures are never fatal to the request.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use adlens_common::AdCopy;

/// Default model for copy generation
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Default max tokens for copy generation responses
const DEFAULT_COPY_MAX_TOKENS: u32 = 1024;

/// Errors that can occur during copy generation
#[derive(Debug, Error, Clone)]
pub enum CopyError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("API request failed: {0}")]
    ApiRequest(String),

    #[error("API response error: {status} {body}")]
    ApiResponse { status: u16, body: String },

    #[error("failed to parse API response: {0}")]
    ParseResponse(String),
}

/// Uniform interface to the copy-generation service
#[async_trait]
pub trait CopyGenerator: Send + Sync {
    /// Generate headline/description ad copy from an analysis
    ///
    /// # Arguments
    /// * `description` - The analysis description, verbatim
    /// * `transcript` - Video transcript, when one was produced
    /// * `scenes` - Ordered scene summaries; empty for images
    async fn generate(
        &self,
        description: &str,
        transcript: Option<&str>,
        scenes: &[String],
    ) -> Result<AdCopy, CopyError>;
}

/// Anthropic-backed copy generator
pub struct ClaudeCopyGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeCopyGenerator {
    /// Create a new copy generator
    ///
    /// # Errors
    /// Returns `NotConfigured` for an empty API key, or `ApiRequest` if
    /// the HTTP client cannot be built.
    pub fn new(api_key: String) -> Result<Self, CopyError> {
        if api_key.trim().is_empty() {
            return Err(CopyError::NotConfigured(
                "Anthropic API key must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| CopyError::ApiRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            max_tokens: DEFAULT_COPY_MAX_TOKENS,
        })
    }

    /// Set a custom base URL (e.g., for proxy or testing)
    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set a custom model
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Set custom max tokens for responses
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl CopyGenerator for ClaudeCopyGenerator {
    async fn generate(
        &self,
        description: &str,
        transcript: Option<&str>,
        scenes: &[String],
    ) -> Result<AdCopy, CopyError> {
        let prompt = build_prompt(description, transcript, scenes);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": prompt,
            }]
        });

        let url = format!("{}/v1/messages", self.base_url);

        debug!(model = %self.model, "Requesting ad copy generation");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CopyError::ApiRequest(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            return Err(CopyError::ApiResponse {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let resp_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CopyError::ParseResponse(format!("failed to read JSON: {e}")))?;

        let text = extract_message_text(&resp_body)?;
        parse_ad_copy(&text)
    }
}

/// Compose the copy-generation prompt from the analysis pieces
fn build_prompt(description: &str, transcript: Option<&str>, scenes: &[String]) -> String {
    let mut prompt = String::from(
        "You are an advertising copywriter. Based on the media analysis below, \
         write ad copy. Respond with a JSON object only, no prose, with exactly \
         two string fields: \"headline\" (short and attention-grabbing) and \
         \"description\" (one or two sentences of marketing copy).\n\n",
    );

    prompt.push_str("Description: ");
    prompt.push_str(description);
    prompt.push('\n');

    if let Some(transcript) = transcript {
        prompt.push_str("Transcript: ");
        prompt.push_str(transcript);
        prompt.push('\n');
    }

    if !scenes.is_empty() {
        prompt.push_str("Scenes:\n");
        for (idx, scene) in scenes.iter().enumerate() {
            prompt.push_str(&format!("{}. {scene}\n", idx + 1));
        }
    }

    prompt
}

/// Extract text from a Messages API response
fn extract_message_text(response: &serde_json::Value) -> Result<String, CopyError> {
    let content = response
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| CopyError::ParseResponse("response missing 'content' array".to_string()))?;

    for block in content {
        if block.get("type").and_then(|t| t.as_str()) == Some("text") {
            if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                return Ok(text.to_string());
            }
        }
    }

    Err(CopyError::ParseResponse(
        "no text content block in response".to_string(),
    ))
}

#[derive(Deserialize)]
struct CopyPayload {
    headline: String,
    description: String,
}

/// Parse the model's JSON payload into an [`AdCopy`]
fn parse_ad_copy(text: &str) -> Result<AdCopy, CopyError> {
    let trimmed = text.trim();
    let json = if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else {
        trimmed
    };

    let payload: CopyPayload = serde_json::from_str(json)
        .map_err(|e| CopyError::ParseResponse(format!("unusable payload: {e}")))?;

    if payload.headline.trim().is_empty() || payload.description.trim().is_empty() {
        return Err(CopyError::ParseResponse(
            "provider returned empty ad copy fields".to_string(),
        ));
    }

    Ok(AdCopy {
        headline: payload.headline,
        description: payload.description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_rejects_empty_key() {
        assert!(ClaudeCopyGenerator::new(String::new()).is_err());
        assert!(ClaudeCopyGenerator::new("  ".to_string()).is_err());
    }

    #[test]
    fn test_generator_builder() {
        let generator = ClaudeCopyGenerator::new("test-key".to_string())
            .unwrap()
            .with_base_url("https://proxy.example.com/".to_string())
            .with_model("claude-test".to_string())
            .with_max_tokens(512);

        assert_eq!(generator.base_url, "https://proxy.example.com");
        assert_eq!(generator.model, "claude-test");
        assert_eq!(generator.max_tokens, 512);
    }

    #[test]
    fn test_build_prompt_description_only() {
        let prompt = build_prompt("A mug on a desk", None, &[]);
        assert!(prompt.contains("Description: A mug on a desk"));
        assert!(!prompt.contains("Transcript:"));
        assert!(!prompt.contains("Scenes:"));
    }

    #[test]
    fn test_build_prompt_with_transcript_and_scenes() {
        let scenes = vec!["intro".to_string(), "demo".to_string()];
        let prompt = build_prompt("A product demo", Some("Hello world"), &scenes);
        assert!(prompt.contains("Transcript: Hello world"));
        assert!(prompt.contains("1. intro"));
        assert!(prompt.contains("2. demo"));
    }

    #[test]
    fn test_extract_message_text() {
        let response = serde_json::json!({
            "content": [
                {"type": "text", "text": "{\"headline\": \"H\", \"description\": \"D\"}"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });

        let text = extract_message_text(&response).unwrap();
        assert!(text.contains("headline"));
    }

    #[test]
    fn test_extract_message_text_missing_content() {
        assert!(extract_message_text(&serde_json::json!({})).is_err());
        assert!(extract_message_text(&serde_json::json!({"content": []})).is_err());
    }

    #[test]
    fn test_parse_ad_copy() {
        let copy =
            parse_ad_copy(r#"{"headline": "Meet the Demo", "description": "See it in action."}"#)
                .unwrap();
        assert_eq!(copy.headline, "Meet the Demo");
        assert_eq!(copy.description, "See it in action.");
    }

    #[test]
    fn test_parse_ad_copy_fenced() {
        let copy = parse_ad_copy("```json\n{\"headline\": \"H\", \"description\": \"D\"}\n```")
            .unwrap();
        assert_eq!(copy.headline, "H");
    }

    #[test]
    fn test_parse_ad_copy_rejects_empty_fields() {
        assert!(parse_ad_copy(r#"{"headline": "", "description": "D"}"#).is_err());
        assert!(parse_ad_copy(r#"{"headline": "H", "description": " "}"#).is_err());
        assert!(parse_ad_copy("not json").is_err());
    }
}
