//! Feature flows — one request/response adapter per feature.
//!
//! A flow is a request DTO, a prompt template, and a typed response parsed
//! from the model's JSON reply. Every flow validates its input before any
//! network call and routes the provider call through the bounded-retry
//! wrapper.

pub mod diagnose;
pub mod guidance;
pub mod market;
pub mod schemes;
pub mod weather_advice;

/// Language the model should answer in when the request doesn't name one.
pub const DEFAULT_LANGUAGE: &str = "English";

pub(crate) fn language_or_default(language: Option<&str>) -> &str {
    match language {
        Some(l) if !l.trim().is_empty() => l,
        _ => DEFAULT_LANGUAGE,
    }
}

/// Shared tail instruction: answer with bare JSON only.
pub(crate) const JSON_ONLY: &str =
    "Respond with ONLY the JSON object. No markdown, no commentary, no extra text.";
