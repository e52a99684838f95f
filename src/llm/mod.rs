//! LLM integration for Farm Assist.
//!
//! Supports:
//! - **Gemini**: generateContent REST API (default)
//! - **Anthropic**: Messages REST API
//!
//! Both clients speak plain HTTP via reqwest so the retry wrapper can
//! classify responses by status code. The `LlmProvider` trait is the seam the
//! flows and tests program against.

mod anthropic;
mod gemini;
pub mod provider;
pub mod retry;
pub mod structured;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use provider::*;
pub use retry::call_with_retry;
pub use structured::{extract_json, generate_json};

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::LlmError;

pub(crate) const PROVIDER_GEMINI: &str = "gemini";
pub(crate) const PROVIDER_ANTHROPIC: &str = "anthropic";

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
    Anthropic,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: SecretString,
    pub model: String,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Arc<dyn LlmProvider> {
    match config.backend {
        LlmBackend::Gemini => {
            tracing::info!(model = %config.model, "Using Gemini");
            Arc::new(GeminiProvider::new(
                config.api_key.clone(),
                &config.model,
            ))
        }
        LlmBackend::Anthropic => {
            tracing::info!(model = %config.model, "Using Anthropic");
            Arc::new(AnthropicProvider::new(
                config.api_key.clone(),
                &config.model,
            ))
        }
    }
}

/// Map a non-success HTTP status from a provider to an `LlmError` class.
///
/// 429 and the overload-class 5xx codes are retryable; 401/403 is an auth
/// failure; anything else is terminal.
pub(crate) fn classify_status(provider: &str, status: u16, body: String) -> LlmError {
    match status {
        429 => LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after: Some(Duration::from_secs(1)),
        },
        500 | 502 | 503 | 504 | 529 => LlmError::Overloaded {
            provider: provider.to_string(),
            status,
        },
        401 | 403 => LlmError::AuthFailed {
            provider: provider.to_string(),
        },
        _ => LlmError::Http {
            provider: provider.to_string(),
            status,
            body,
        },
    }
}
