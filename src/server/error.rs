//! Error → HTTP response mapping.
//!
//! Every failure is logged with its internal detail, then converted to a
//! user-facing message that deliberately carries none of that detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use crate::error::{AuthError, FlowError, LlmError, StoreError, WeatherError};
use crate::validate::ValidationError;

/// An API-level error ready to be rendered as a response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Field-scoped errors for 422 responses, surfaced inline by the UI.
    pub field_errors: Vec<ValidationError>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            field_errors: Vec::new(),
        }
    }

    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Please fix the highlighted fields".to_string(),
            field_errors: errors,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = if self.field_errors.is_empty() {
            serde_json::json!({ "error": self.message })
        } else {
            serde_json::json!({ "error": self.message, "errors": self.field_errors })
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match &err {
            // Overload-class failures arrive here only after the retry
            // wrapper has exhausted its attempts.
            LlmError::Overloaded { .. } | LlmError::RateLimited { .. } => {
                warn!(error = %err, "Provider still overloaded after retries");
                Self::unavailable("The assistant is busy right now. Please try again in a moment.")
            }
            LlmError::RequestFailed { .. } => {
                error!(error = %err, "Could not reach the provider");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "Could not reach the assistant. Please check your connection and try again.",
                )
            }
            _ => {
                error!(error = %err, "Provider call failed");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "Something went wrong while generating a response. Please try again.",
                )
            }
        }
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Validation(errors) => Self::validation(errors),
            FlowError::Llm(e) => e.into(),
            FlowError::Store(e) => e.into(),
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        match &err {
            WeatherError::LocationNotFound { .. } => {
                warn!(error = %err, "Reverse geocode found nothing");
                Self::not_found("No location found for these coordinates")
            }
            _ => {
                error!(error = %err, "Weather lookup failed");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "Weather service is unavailable right now. Please try again.",
                )
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::InvalidCredentials | AuthError::UserNotFound => {
                warn!(error = %err, "Sign-in rejected");
                Self::new(StatusCode::UNAUTHORIZED, err.to_string())
            }
            AuthError::EmailTaken => Self::new(StatusCode::CONFLICT, err.to_string()),
            AuthError::WeakPassword(_) => Self::validation(vec![ValidationError::new(
                "password",
                err.to_string(),
            )]),
            _ => {
                error!(error = %err, "Auth service call failed");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "Sign-in is unavailable right now. Please try again.",
                )
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound { .. } => Self::not_found("Record not found"),
            _ => {
                error!(error = %err, "Document store call failed");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "Your saved data is unavailable right now. Please try again.",
                )
            }
        }
    }
}
