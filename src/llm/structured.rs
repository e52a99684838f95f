//! Structured (schema-shaped JSON) completions.
//!
//! Flows describe their output shape in the prompt and deserialize the reply
//! into a typed DTO. Models occasionally wrap JSON in markdown fences or
//! surrounding prose, so extraction strips those before parsing. A reply that
//! still fails to parse is a terminal `InvalidResponse` — never retried.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, LlmProvider};
use crate::llm::retry::call_with_retry;

/// Run a completion through the retry wrapper and parse the reply as `T`.
pub async fn generate_json<T: DeserializeOwned>(
    llm: &Arc<dyn LlmProvider>,
    retry: &RetryConfig,
    request: CompletionRequest,
) -> Result<T, LlmError> {
    let response = call_with_retry(retry, || llm.complete(request.clone())).await?;

    let json_str = extract_json(&response.content);
    serde_json::from_str(json_str).map_err(|e| {
        warn!(
            error = %e,
            reply = %response.content.chars().take(300).collect::<String>(),
            "Model reply did not match the expected JSON shape"
        );
        LlmError::InvalidResponse {
            provider: llm.model_name().to_string(),
            reason: format!("reply did not match expected JSON shape: {e}"),
        }
    })
}

/// Extract a JSON object or array from model output that may contain markdown
/// fences or extra text.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    // Already bare JSON.
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    // Fenced code block, with or without a language tag.
    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let after = &trimmed[start + fence.len()..];
            if let Some(end) = after.find("```") {
                let inner = after[..end].trim();
                if inner.starts_with('{') || inner.starts_with('[') {
                    return inner;
                }
            }
        }
    }

    // Widest object/array span in surrounding prose.
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if end > start {
                return &trimmed[start..=end];
            }
        }
    }

    trimmed
}
