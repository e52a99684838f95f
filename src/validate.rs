//! Field-level input validation.
//!
//! Every flow validates its request before any network call. Errors carry the
//! offending field name so the UI can surface them inline next to the field.

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// A validation error scoped to a single input field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulates field errors across a request's checks.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a non-empty (post-trim) string field.
    pub fn require(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors
                .push(ValidationError::new(field, "This field is required"));
        }
        self
    }

    /// Require latitude in [-90, 90] and longitude in [-180, 180].
    pub fn coordinates(&mut self, lat: f64, lon: f64) -> &mut Self {
        if !(-90.0..=90.0).contains(&lat) || !lat.is_finite() {
            self.errors.push(ValidationError::new(
                "latitude",
                "Latitude must be between -90 and 90",
            ));
        }
        if !(-180.0..=180.0).contains(&lon) || !lon.is_finite() {
            self.errors.push(ValidationError::new(
                "longitude",
                "Longitude must be between -180 and 180",
            ));
        }
        self
    }

    /// Require a base64 image data URL (`data:image/<fmt>;base64,<payload>`).
    pub fn image_data_url(&mut self, field: &str, value: &str) -> &mut Self {
        if !data_url_pattern().is_match(value) {
            self.errors.push(ValidationError::new(
                field,
                "Photo must be a base64 image data URL",
            ));
        }
        self
    }

    /// Require a strictly positive quantity (e.g. land area in acres).
    pub fn positive(&mut self, field: &str, value: f64) -> &mut Self {
        if !(value > 0.0) || !value.is_finite() {
            self.errors
                .push(ValidationError::new(field, "Must be a positive number"));
        }
        self
    }

    /// Require a sowing date that is not in the future.
    pub fn not_future_date(&mut self, field: &str, date: NaiveDate) -> &mut Self {
        if date > Utc::now().date_naive() {
            self.errors
                .push(ValidationError::new(field, "Date cannot be in the future"));
        }
        self
    }

    /// Consume the validator: `Ok(())` if no rule failed.
    pub fn finish(&mut self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

fn data_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^data:image/(png|jpe?g|webp|heic);base64,[A-Za-z0-9+/=]+$")
            .expect("data URL pattern is valid")
    })
}
