//! Gemini vision provider.
//!
//! Sends the prompt and the captured image as two parts of a single
//! `generateContent` call. The API key travels in the `key` query parameter
//! and is never written to the request body or to logs.

use super::{ImageAnalyzer, ProviderError};
use crate::dtos::AnalysisRequest;
use async_trait::async_trait;
use axum::body::Bytes;
use metrics::counter;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;

/// Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for image understanding.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default transport timeout for one upstream call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Returned to the client when the upstream error carries no message.
pub const FALLBACK_ERROR_MESSAGE: &str = "API request failed";

/// Gemini provider configuration.
#[derive(Debug)]
pub struct GeminiConfig {
    /// `None` when `GEMINI_API_KEY` is unset or empty.
    pub api_key: Option<SecretString>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::new),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Gemini image analysis provider.
pub struct GeminiVisionProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiVisionProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// URL of the `generateContent` method, without the credential.
    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn api_key(&self) -> Result<&SecretString, ProviderError> {
        self.config.api_key.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured("Gemini API key not configured".to_string())
        })
    }
}

#[async_trait]
impl ImageAnalyzer for GeminiVisionProvider {
    fn ensure_configured(&self) -> Result<(), ProviderError> {
        self.api_key().map(|_| ())
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Bytes, ProviderError> {
        let api_key = self.api_key()?;
        let body = GenerateContentRequest::for_analysis(request);

        tracing::debug!(
            model = %self.config.model,
            prompt_len = request.prompt.len(),
            image_len = request.image.len(),
            mime_type = %request.inline_image().mime_type,
            "Sending request to Gemini API"
        );

        // reqwest errors carry the URL; strip it so the key never reaches a log line.
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key.expose_secret().as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                counter!("gemini_requests_total", "outcome" => "network_error").increment(1);
                ProviderError::Network(e.without_url().to_string())
            })?;

        let status = response.status();
        let payload = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            counter!("gemini_requests_total", "outcome" => "api_error").increment(1);
            let message = upstream_error_message(&payload)
                .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());

            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // Relayed verbatim, but only once we know it is JSON.
        serde_json::from_slice::<serde::de::IgnoredAny>(&payload).map_err(|e| {
            counter!("gemini_requests_total", "outcome" => "invalid_response").increment(1);
            ProviderError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        counter!("gemini_requests_total", "outcome" => "success").increment(1);
        Ok(payload)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.ensure_configured()
    }
}

/// Pull `error.message` out of a Gemini error body.
pub(crate) fn upstream_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Gemini API Request Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn for_analysis(request: &'a AnalysisRequest) -> Self {
        let image = request.inline_image();
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: &request.prompt,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type,
                            data: image.data,
                        },
                    },
                ],
            }],
        }
    }
}
