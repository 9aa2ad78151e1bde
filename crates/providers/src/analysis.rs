//! Media analysis provider adapter
//!
//! Sends a staged media file to the Google Generative Language API as an
//! inline base64 block with a kind-specific prompt, and parses the JSON
//! payload the model returns into an [`AnalysisResult`]. Any failure here
//! is fatal to the request: there is no result without a base analysis.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use adlens_common::{AnalysisResult, MediaKind};

/// Default model for media analysis
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Errors that can occur during media analysis
#[derive(Debug, Error, Clone)]
pub enum AnalysisError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("media data is empty")]
    EmptyData,

    #[error("API request failed: {0}")]
    ApiRequest(String),

    #[error("API response error: {status} {body}")]
    ApiResponse { status: u16, body: String },

    #[error("failed to parse API response: {0}")]
    ParseResponse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Uniform interface to the primary media-understanding service
///
/// Implementations return the base analysis only; the enrichment field is
/// always unset and belongs to the copy-generation step.
#[async_trait]
pub trait MediaAnalyzer: Send + Sync {
    /// Analyze a staged media file
    ///
    /// # Arguments
    /// * `media` - Path to the staged file
    /// * `mime_type` - Declared MIME type of the upload
    /// * `kind` - Pipeline kind derived from the MIME type
    async fn analyze(
        &self,
        media: &Path,
        mime_type: &str,
        kind: MediaKind,
    ) -> Result<AnalysisResult, AnalysisError>;
}

/// Gemini-backed media analyzer
///
/// Uses `models/{model}:generateContent` with an `inline_data` content
/// part carrying the media bytes.
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiAnalyzer {
    /// Create a new analyzer
    ///
    /// # Errors
    /// Returns `NotConfigured` for an empty API key, or `ApiRequest` if
    /// the HTTP client cannot be built.
    pub fn new(api_key: String) -> Result<Self, AnalysisError> {
        if api_key.trim().is_empty() {
            return Err(AnalysisError::NotConfigured(
                "Gemini API key must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            // Video analysis of larger uploads can legitimately take minutes
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| AnalysisError::ApiRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
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
}

#[async_trait]
impl MediaAnalyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        media: &Path,
        mime_type: &str,
        kind: MediaKind,
    ) -> Result<AnalysisResult, AnalysisError> {
        if MediaKind::from_mime(mime_type) != Some(kind) {
            return Err(AnalysisError::UnsupportedMediaType(mime_type.to_string()));
        }

        let data = tokio::fs::read(media)
            .await
            .map_err(|e| AnalysisError::Io(format!("failed to read {}: {e}", media.display())))?;
        if data.is_empty() {
            return Err(AnalysisError::EmptyData);
        }

        let b64 = base64::engine::general_purpose::STANDARD.encode(&data);
        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": mime_type,
                            "data": b64,
                        }
                    },
                    {
                        "text": prompt_for(kind),
                    }
                ]
            }]
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        debug!(model = %self.model, kind = kind.as_str(), "Sending media to analysis provider");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::ApiRequest(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            return Err(AnalysisError::ApiResponse {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let resp_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::ParseResponse(format!("failed to read JSON: {e}")))?;

        let text = extract_candidate_text(&resp_body)?;
        parse_analysis_payload(&text, kind)
    }
}

/// Prompt sent alongside the media, selected by kind
fn prompt_for(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Video => {
            "Analyze this advertisement video. Respond with a JSON object only, \
             no prose, with these fields: \"description\" (a thorough summary of \
             the video), \"transcript\" (all spoken words, empty string if none), \
             \"scenes\" (an ordered array of one-sentence scene summaries)."
        }
        MediaKind::Image => {
            "Analyze this advertisement image. Respond with a JSON object only, \
             no prose, with these fields: \"description\" (a thorough description \
             of the image), \"adCopy\" (an array of short ad copy lines suggested \
             by the image), \"visualElements\" (an array of the notable visual \
             elements)."
        }
    }
}

/// Extract the first candidate's text from a `generateContent` response
fn extract_candidate_text(response: &serde_json::Value) -> Result<String, AnalysisError> {
    let parts = response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            AnalysisError::ParseResponse("response missing candidate content parts".to_string())
        })?;

    for part in parts {
        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            return Ok(text.to_string());
        }
    }

    Err(AnalysisError::ParseResponse(
        "no text part in provider response".to_string(),
    ))
}

/// Strip a markdown code fence the model may wrap its JSON in
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[derive(Deserialize)]
struct VideoPayload {
    description: String,
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    scenes: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagePayload {
    description: String,
    #[serde(default)]
    ad_copy: Option<Vec<String>>,
    #[serde(default)]
    visual_elements: Option<Vec<String>>,
}

/// Parse the model's JSON payload into the kind-matching result
fn parse_analysis_payload(text: &str, kind: MediaKind) -> Result<AnalysisResult, AnalysisError> {
    let json = strip_code_fences(text);

    let result = match kind {
        MediaKind::Video => {
            let payload: VideoPayload = serde_json::from_str(json)
                .map_err(|e| AnalysisError::ParseResponse(format!("unusable payload: {e}")))?;
            let transcript = payload.transcript.filter(|t| !t.trim().is_empty());
            AnalysisResult::video(payload.description, transcript, payload.scenes)
        }
        MediaKind::Image => {
            let payload: ImagePayload = serde_json::from_str(json)
                .map_err(|e| AnalysisError::ParseResponse(format!("unusable payload: {e}")))?;
            AnalysisResult::image(payload.description, payload.ad_copy, payload.visual_elements)
        }
    };

    if result.description.trim().is_empty() {
        return Err(AnalysisError::ParseResponse(
            "provider returned an empty description".to_string(),
        ));
    }

    Ok(result)
}
