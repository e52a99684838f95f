//! Anthropic completion provider over the Messages REST API.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};
use crate::llm::{classify_status, PROVIDER_ANTHROPIC};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Anthropic Messages API client.
pub struct AnthropicProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl AnthropicProvider {
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
        let mut content = Vec::new();
        for image in &request.images {
            content.push(serde_json::json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": image.mime_type,
                    "data": image.data_base64,
                }
            }));
        }
        content.push(serde_json::json!({ "type": "text", "text": request.user_text() }));

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": [{ "role": "user", "content": content }],
        });

        if let Some(system) = request.system_text() {
            body["system"] = serde_json::json!(system);
        }
        if let Some(t) = request.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        body
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_body(&request);

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER_ANTHROPIC.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(PROVIDER_ANTHROPIC, status.as_u16(), body));
        }

        let payload: Value = resp.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER_ANTHROPIC.to_string(),
            reason: e.to_string(),
        })?;

        parse_response(&payload)
    }
}

/// Extract text + usage from a Messages API payload.
fn parse_response(payload: &Value) -> Result<CompletionResponse, LlmError> {
    let content: String = payload
        .get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if content.is_empty() {
        return Err(LlmError::InvalidResponse {
            provider: PROVIDER_ANTHROPIC.to_string(),
            reason: "no text blocks in response".to_string(),
        });
    }

    let finish_reason = match payload.get("stop_reason").and_then(|s| s.as_str()) {
        Some("end_turn") | None => FinishReason::Stop,
        Some("max_tokens") => FinishReason::MaxTokens,
        Some(_) => FinishReason::Other,
    };

    let input_tokens = payload
        .pointer("/usage/input_tokens")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;
    let output_tokens = payload
        .pointer("/usage/output_tokens")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    debug!(input_tokens, output_tokens, "Anthropic completion");

    Ok(CompletionResponse {
        content,
        input_tokens,
        output_tokens,
        finish_reason,
    })
}
