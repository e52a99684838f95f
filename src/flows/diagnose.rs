//! Crop disease diagnosis from a photo.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RetryConfig;
use crate::error::FlowError;
use crate::llm::{generate_json, ChatMessage, CompletionRequest, ImagePart, LlmProvider};
use crate::validate::Validator;

use super::{language_or_default, JSON_ONLY};

/// Diagnosis request: a photo plus what the farmer observed.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnoseRequest {
    pub crop_name: String,
    /// What the farmer sees on the plant, in their own words.
    pub description: String,
    /// Base64 data URL (`data:image/...;base64,...`) of the affected plant.
    pub photo: String,
    pub region: Option<String>,
    pub language: Option<String>,
}

/// How far the problem has progressed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

/// Typed diagnosis result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnosis {
    pub disease: String,
    /// Model confidence, 0.0–1.0.
    pub confidence: f32,
    pub severity: Severity,
    pub symptoms: Vec<String>,
    pub organic_treatment: Vec<String>,
    pub chemical_treatment: Vec<String>,
    pub prevention: Vec<String>,
}

impl DiagnoseRequest {
    fn validate(&self) -> Result<(), FlowError> {
        let mut v = Validator::new();
        v.require("crop_name", &self.crop_name)
            .require("description", &self.description)
            .image_data_url("photo", &self.photo);
        v.finish().map_err(FlowError::Validation)
    }
}

pub(crate) fn system_prompt(language: &str) -> String {
    format!(
        "You are an experienced plant pathologist advising smallholder farmers. \
         Examine the photo and the farmer's description and identify the most \
         likely disease or pest. Prefer treatments that are affordable and \
         locally available; always list organic options first. Answer in {language}.\n\n\
         Output a JSON object with exactly these fields:\n\
         - \"disease\": name of the disease or pest (or \"Healthy\" if none)\n\
         - \"confidence\": number 0.0-1.0\n\
         - \"severity\": one of \"low\", \"moderate\", \"high\"\n\
         - \"symptoms\": array of observed symptoms\n\
         - \"organic_treatment\": array of organic treatment steps\n\
         - \"chemical_treatment\": array of chemical treatment steps\n\
         - \"prevention\": array of prevention tips\n\n\
         {JSON_ONLY}"
    )
}

pub(crate) fn user_prompt(request: &DiagnoseRequest) -> String {
    let mut prompt = format!(
        "Crop: {}\nFarmer's observation: {}",
        request.crop_name.trim(),
        request.description.trim()
    );
    if let Some(region) = request.region.as_deref().filter(|r| !r.trim().is_empty()) {
        prompt.push_str(&format!("\nRegion: {}", region.trim()));
    }
    prompt.push_str("\nThe photo of the affected plant is attached.");
    prompt
}

/// Run the diagnosis flow.
pub async fn run(
    llm: &Arc<dyn LlmProvider>,
    retry: &RetryConfig,
    request: DiagnoseRequest,
) -> Result<Diagnosis, FlowError> {
    request.validate()?;

    let image = ImagePart::from_data_url(&request.photo).ok_or_else(|| {
        FlowError::Validation(vec![crate::validate::ValidationError::new(
            "photo",
            "Photo must be a base64 image data URL",
        )])
    })?;

    let language = language_or_default(request.language.as_deref()).to_string();
    let completion = CompletionRequest::new(vec![
        ChatMessage::system(system_prompt(&language)),
        ChatMessage::user(user_prompt(&request)),
    ])
    .with_images(vec![image])
    .with_temperature(0.2)
    .with_max_tokens(1024);

    let diagnosis: Diagnosis = generate_json(llm, retry, completion).await?;
    info!(
        crop = %request.crop_name,
        disease = %diagnosis.disease,
        confidence = diagnosis.confidence,
        "Diagnosis complete"
    );
    Ok(diagnosis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DiagnoseRequest {
        DiagnoseRequest {
            crop_name: "Tomato".to_string(),
            description: "Yellow spots on lower leaves, spreading upward".to_string(),
            photo: "data:image/jpeg;base64,aGVsbG8=".to_string(),
            region: Some("Karnataka".to_string()),
            language: None,
        }
    }

    #[test]
    fn prompt_embeds_request_fields() {
        let prompt = user_prompt(&request());
        assert!(prompt.contains("Tomato"));
        assert!(prompt.contains("Yellow spots"));
        assert!(prompt.contains("Karnataka"));
    }

    #[test]
    fn system_prompt_names_language() {
        assert!(system_prompt("Hindi").contains("Answer in Hindi"));
    }

    #[test]
    fn validation_rejects_plain_url_photo() {
        let mut req = request();
        req.photo = "https://example.com/leaf.jpg".to_string();
        let err = req.validate().unwrap_err();
        match err {
            FlowError::Validation(errors) => assert_eq!(errors[0].field, "photo"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn diagnosis_parses_from_model_shape() {
        let json = r#"{
            "disease": "Early blight",
            "confidence": 0.86,
            "severity": "moderate",
            "symptoms": ["Concentric rings on leaves"],
            "organic_treatment": ["Neem oil spray every 7 days"],
            "chemical_treatment": ["Mancozeb 75% WP, 2g per litre"],
            "prevention": ["Rotate crops", "Avoid overhead watering"]
        }"#;
        let diagnosis: Diagnosis = serde_json::from_str(json).unwrap();
        assert_eq!(diagnosis.disease, "Early blight");
        assert_eq!(diagnosis.severity, Severity::Moderate);
        assert_eq!(diagnosis.prevention.len(), 2);
    }
}
