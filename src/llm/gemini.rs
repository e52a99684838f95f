//! Gemini completion provider over the generateContent REST API.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};
use crate::llm::{classify_status, PROVIDER_GEMINI};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client.
pub struct GeminiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Point the client at a non-default endpoint (tests use a mock server).
    pub fn with_base_url(
        api_key: SecretString,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    fn build_body(&self, request: &CompletionRequest) -> Value {
        let mut parts = vec![serde_json::json!({ "text": request.user_text() })];
        for image in &request.images {
            parts.push(serde_json::json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": image.data_base64,
                }
            }));
        }

        let mut body = serde_json::json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "responseMimeType": "application/json",
            },
        });

        if let Some(system) = request.system_text() {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
        }
        if let Some(t) = request.temperature {
            body["generationConfig"]["temperature"] = serde_json::json!(t);
        }
        if let Some(m) = request.max_tokens {
            body["generationConfig"]["maxOutputTokens"] = serde_json::json!(m);
        }
        body
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = self.build_body(&request);

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER_GEMINI.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(PROVIDER_GEMINI, status.as_u16(), body));
        }

        let payload: Value = resp.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER_GEMINI.to_string(),
            reason: e.to_string(),
        })?;

        parse_response(&payload)
    }
}

/// Extract text + usage from a generateContent payload.
fn parse_response(payload: &Value) -> Result<CompletionResponse, LlmError> {
    let candidate = payload
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER_GEMINI.to_string(),
            reason: "no candidates in response".to_string(),
        })?;

    let content: String = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if content.is_empty() {
        return Err(LlmError::InvalidResponse {
            provider: PROVIDER_GEMINI.to_string(),
            reason: "candidate had no text parts".to_string(),
        });
    }

    let finish_reason = match candidate.get("finishReason").and_then(|f| f.as_str()) {
        Some("STOP") | None => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::MaxTokens,
        Some(_) => FinishReason::Other,
    };

    let input_tokens = payload
        .pointer("/usageMetadata/promptTokenCount")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;
    let output_tokens = payload
        .pointer("/usageMetadata/candidatesTokenCount")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    debug!(input_tokens, output_tokens, "Gemini completion");

    Ok(CompletionResponse {
        content,
        input_tokens,
        output_tokens,
        finish_reason,
    })
}
