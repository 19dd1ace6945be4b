/*!
 * Gemini client for the Google Generative Language API.
 *
 * Uses structured output: each request carries a response schema and asks
 * for `application/json`, so well-behaved replies decode directly. Safety
 * blocks are reported in the API envelope (`promptFeedback.blockReason` or
 * a `SAFETY` finish reason) and surface as `ProviderError::ContentFiltered`
 * so the fallback flow can escalate instead of retrying in place.
 */

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::translation::prompts::TranslationPayload;

/// Gemini client
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// Model name, e.g. `gemini-2.0-flash`
    model: String,
    /// API key for authentication
    api_key: String,
    /// Service endpoint URL
    endpoint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            model: model.into(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request(&self, payload: &TranslationPayload) -> GenerateRequest {
        let mut parts = vec![Part::Text(payload.prompt.clone())];
        if let Some(image) = &payload.image {
            parts.push(Part::InlineData(InlineData {
                mime_type: "image/png".to_string(),
                data: BASE64.encode(image),
            }));
        }

        GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: payload.response_schema.clone(),
            },
        }
    }
}

#[async_trait]
impl Provider for Gemini {
    async fn generate(&self, payload: &TranslationPayload) -> Result<String, ProviderError> {
        let request = self.build_request(payload);
        debug!(
            "Calling Gemini model {} ({} prompt chars, image: {})",
            self.model,
            payload.prompt.len(),
            payload.image.is_some()
        );

        let response = self
            .client
            .post(self.api_url())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthenticationError(error_text),
                429 => ProviderError::RateLimitExceeded(error_text),
                code => ProviderError::ApiError { status_code: code, message: error_text },
            });
        }

        let decoded = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Undecodable API envelope: {}", e)))?;

        if let Some(reason) = decoded
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(ProviderError::ContentFiltered(format!("prompt blocked: {}", reason)));
        }

        let candidate = decoded.candidates.into_iter().next();
        if let Some(reason) = candidate
            .as_ref()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|reason| reason.eq_ignore_ascii_case("safety"))
        {
            return Err(ProviderError::ContentFiltered(format!("finish reason: {}", reason)));
        }

        // An envelope with no text is a valid transport result; the parser
        // classifies it as an empty response.
        let text = candidate
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let payload = TranslationPayload {
            prompt: "Reply with the JSON object {\"ok\": true}".to_string(),
            image: None,
            response_schema: serde_json::json!({
                "type": "object",
                "properties": { "ok": { "type": "boolean" } },
                "required": ["ok"]
            }),
        };
        self.generate(&payload).await.map(|_| ())
    }
}
