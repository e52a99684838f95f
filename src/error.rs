//! Error types for Farm Assist.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {key}. {hint}")]
    MissingEnvVar { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
///
/// `Overloaded` and `RateLimited` are the only retryable classes; everything
/// else is terminal and surfaces immediately.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} overloaded (status {status})")]
    Overloaded { provider: String, status: u16 },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} returned status {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether the retry wrapper may attempt this call again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Overloaded { .. } | LlmError::RateLimited { .. }
        )
    }
}

/// Flow-level errors (prompt → provider → typed result).
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Invalid input: {0:?}")]
    Validation(Vec<crate::validate::ValidationError>),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Weather/geocoding API errors.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Weather request failed: {0}")]
    RequestFailed(String),

    #[error("Weather API returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected weather payload: {0}")]
    InvalidPayload(String),

    #[error("No location found for ({lat}, {lon})")]
    LocationNotFound { lat: f64, lon: f64 },
}

/// Identity service errors, mapped from provider error codes.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("No account exists for this email")]
    UserNotFound,

    #[error("An account already exists for this email")]
    EmailTaken,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Auth request failed: {0}")]
    RequestFailed(String),

    #[error("Auth service returned status {status}: {code}")]
    Http { status: u16, code: String },
}

/// Document store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {path}")]
    NotFound { path: String },

    #[error("Store request failed: {0}")]
    RequestFailed(String),

    #[error("Store returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
