//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::LlmBackend;

/// Retry policy for provider calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first call).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Full service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// LLM backend to use.
    pub backend: LlmBackend,
    /// Provider API key.
    pub api_key: SecretString,
    /// Model identifier for the chosen backend.
    pub model: String,
    /// HTTP bind port.
    pub port: u16,
    /// Retry policy for provider calls.
    pub retry: RetryConfig,
    /// Identity service endpoint + key, if configured.
    pub auth: Option<AuthConfig>,
    /// Document store endpoint, if configured.
    pub store_url: Option<String>,
}

/// Identity service configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub base_url: String,
    pub api_key: SecretString,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `FARM_ASSIST_API_KEY`. Everything else has defaults or is
    /// optional (auth and store integrations are disabled when unset).
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match std::env::var("FARM_ASSIST_BACKEND").as_deref() {
            Ok("anthropic") => LlmBackend::Anthropic,
            Ok("gemini") | Err(_) => LlmBackend::Gemini,
            Ok(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "FARM_ASSIST_BACKEND".to_string(),
                    message: format!("unknown backend '{other}' (expected gemini or anthropic)"),
                });
            }
        };

        let api_key =
            std::env::var("FARM_ASSIST_API_KEY").map_err(|_| ConfigError::MissingEnvVar {
                key: "FARM_ASSIST_API_KEY".to_string(),
                hint: "Set it to your Gemini or Anthropic API key".to_string(),
            })?;

        let model = std::env::var("FARM_ASSIST_MODEL").unwrap_or_else(|_| {
            match backend {
                LlmBackend::Gemini => "gemini-2.0-flash",
                LlmBackend::Anthropic => "claude-sonnet-4-20250514",
            }
            .to_string()
        });

        let port = parse_env("FARM_ASSIST_PORT", 8080u16)?;

        let retry = RetryConfig {
            max_attempts: parse_env("FARM_ASSIST_RETRY_ATTEMPTS", 3u32)?,
            base_delay: Duration::from_millis(parse_env("FARM_ASSIST_RETRY_BASE_MS", 1000u64)?),
        };

        let auth = match (
            std::env::var("FARM_ASSIST_AUTH_URL"),
            std::env::var("FARM_ASSIST_AUTH_KEY"),
        ) {
            (Ok(base_url), Ok(key)) => Some(AuthConfig {
                base_url,
                api_key: SecretString::from(key),
            }),
            (Ok(_), Err(_)) => {
                return Err(ConfigError::MissingEnvVar {
                    key: "FARM_ASSIST_AUTH_KEY".to_string(),
                    hint: "Required when FARM_ASSIST_AUTH_URL is set".to_string(),
                });
            }
            _ => None,
        };

        let store_url = std::env::var("FARM_ASSIST_STORE_URL").ok();

        Ok(Self {
            backend,
            api_key: SecretString::from(api_key),
            model,
            port,
            retry,
            auth,
            store_url,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("could not parse '{raw}'"),
        }),
        Err(_) => Ok(default),
    }
}
