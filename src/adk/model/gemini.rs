// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{GenerationConfig, Model};
use crate::adk::error::{MeteoError, ModelError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const PROVIDER: &str = "Gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model identifiers offered to users
pub const KNOWN_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-1.5-pro", "gemini-2.0-flash-exp"];

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl GeminiModel {
    /// Create a new GeminiModel
    ///
    /// The key is sent in the `x-goog-api-key` header, never in the URL,
    /// so request URLs are safe to log.
    pub fn new(
        api_key: impl Into<String>,
        model_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MeteoError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(MeteoError::config("a Google API key is required"));
        }
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model_name: model_name.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (proxies, regional hosts)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request_body(prompt: &str, config: &GenerationConfig) -> Value {
        let mut generation = json!({});
        if let Some(t) = config.temperature {
            generation["temperature"] = json!(t);
        }
        if let Some(max) = config.max_output_tokens {
            generation["maxOutputTokens"] = json!(max);
        }
        if let Some(p) = config.top_p {
            generation["topP"] = json!(p);
        }
        if let Some(k) = config.top_k {
            generation["topK"] = json!(k);
        }
        if !config.stop_sequences.is_empty() {
            generation["stopSequences"] = json!(config.stop_sequences);
        }

        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": generation
        })
    }
}

#[async_trait]
impl Model for GeminiModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model_name
        );
        let body = Self::request_body(prompt, config);

        log::debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_error(status, &text));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("Gemini response: {}", resp_json);

        extract_text(&resp_json)
    }
}

/// Map a non-success response to the error taxonomy
pub fn classify_error(status: u16, body: &str) -> ModelError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    let invalid_key = body.contains("API_KEY_INVALID") || body.contains("API key not valid");
    if status == 401 || status == 403 || invalid_key {
        return ModelError::Authentication {
            provider: PROVIDER.to_string(),
            message,
        };
    }
    if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        return ModelError::QuotaExceeded {
            provider: PROVIDER.to_string(),
            message,
        };
    }
    ModelError::Api {
        provider: PROVIDER.to_string(),
        status,
        message,
    }
}

/// Concatenate the text parts of the first candidate
pub fn extract_text(resp_json: &Value) -> Result<String, ModelError> {
    if let Some(reason) = resp_json["promptFeedback"]["blockReason"].as_str() {
        return Err(ModelError::Blocked {
            provider: PROVIDER.to_string(),
            reason: reason.to_string(),
        });
    }

    let candidate = resp_json["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| ModelError::InvalidResponse("no candidates in response".to_string()))?;

    if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
        log::debug!("Gemini finish reason: {}", finish_reason);
        if finish_reason == "SAFETY" {
            return Err(ModelError::Blocked {
                provider: PROVIDER.to_string(),
                reason: "safety filters".to_string(),
            });
        }
    }

    let parts = candidate["content"]["parts"].as_array().ok_or_else(|| {
        log::error!("No parts in candidate: {}", candidate);
        ModelError::InvalidResponse("no content parts in candidate".to_string())
    })?;

    // Thinking models may interleave thought parts; only the visible text
    // is a continuation of the prompt.
    let text: String = parts
        .iter()
        .filter(|p| !p["thought"].as_bool().unwrap_or(false))
        .filter_map(|p| p["text"].as_str())
        .collect();

    Ok(text)
}
