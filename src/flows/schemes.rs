//! Government scheme recommendations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RetryConfig;
use crate::error::FlowError;
use crate::llm::{generate_json, ChatMessage, CompletionRequest, LlmProvider};
use crate::validate::Validator;

use super::{language_or_default, JSON_ONLY};

/// Scheme lookup request.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemesRequest {
    pub state: String,
    pub crop_name: Option<String>,
    pub land_size_acres: Option<f64>,
    /// Farmer category, e.g. "small and marginal", "tenant".
    pub category: Option<String>,
    pub language: Option<String>,
}

/// A single recommended scheme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scheme {
    pub name: String,
    pub benefit: String,
    pub eligibility: String,
    pub how_to_apply: String,
    pub link: Option<String>,
}

/// Typed scheme list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemeList {
    pub schemes: Vec<Scheme>,
}

impl SchemesRequest {
    fn validate(&self) -> Result<(), FlowError> {
        let mut v = Validator::new();
        v.require("state", &self.state);
        if let Some(size) = self.land_size_acres {
            v.positive("land_size_acres", size);
        }
        v.finish().map_err(FlowError::Validation)
    }
}

pub(crate) fn system_prompt(language: &str) -> String {
    format!(
        "You are an advisor on Indian government agricultural schemes (central \
         and state). Recommend the schemes most relevant to the farmer's \
         situation, most relevant first. Only include schemes that actually \
         exist; give official portal links where you know them. Answer in \
         {language}.\n\n\
         Output a JSON object with exactly this field:\n\
         - \"schemes\": array of objects with \"name\", \"benefit\", \
         \"eligibility\", \"how_to_apply\", and \"link\" (string or null)\n\n\
         {JSON_ONLY}"
    )
}

pub(crate) fn user_prompt(request: &SchemesRequest) -> String {
    let mut prompt = format!("State: {}", request.state.trim());
    if let Some(crop) = request.crop_name.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\nCrop: {}", crop.trim()));
    }
    if let Some(size) = request.land_size_acres {
        prompt.push_str(&format!("\nLand holding: {size} acres"));
    }
    if let Some(category) = request.category.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\nFarmer category: {}", category.trim()));
    }
    prompt
}

/// Run the schemes flow.
pub async fn run(
    llm: &Arc<dyn LlmProvider>,
    retry: &RetryConfig,
    request: SchemesRequest,
) -> Result<SchemeList, FlowError> {
    request.validate()?;

    let language = language_or_default(request.language.as_deref()).to_string();
    let completion = CompletionRequest::new(vec![
        ChatMessage::system(system_prompt(&language)),
        ChatMessage::user(user_prompt(&request)),
    ])
    .with_temperature(0.2)
    .with_max_tokens(1536);

    let list: SchemeList = generate_json(llm, retry, completion).await?;
    info!(
        state = %request.state,
        schemes = list.schemes.len(),
        "Scheme recommendations generated"
    );
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_list_parses_with_null_link() {
        let json = r#"{
            "schemes": [
                {
                    "name": "PM-KISAN",
                    "benefit": "Rs 6000 per year income support",
                    "eligibility": "All landholding farmer families",
                    "how_to_apply": "Register on the PM-KISAN portal",
                    "link": "https://pmkisan.gov.in"
                },
                {
                    "name": "State seed subsidy",
                    "benefit": "50% subsidy on certified seed",
                    "eligibility": "Small and marginal farmers",
                    "how_to_apply": "Apply at the local Raitha Samparka Kendra",
                    "link": null
                }
            ]
        }"#;
        let list: SchemeList = serde_json::from_str(json).unwrap();
        assert_eq!(list.schemes.len(), 2);
        assert!(list.schemes[1].link.is_none());
    }

    #[test]
    fn prompt_includes_land_size_and_category() {
        let request = SchemesRequest {
            state: "Karnataka".to_string(),
            crop_name: Some("Ragi".to_string()),
            land_size_acres: Some(1.5),
            category: Some("small and marginal".to_string()),
            language: None,
        };
        let prompt = user_prompt(&request);
        assert!(prompt.contains("1.5 acres"));
        assert!(prompt.contains("small and marginal"));
        assert!(prompt.contains("Ragi"));
    }

    #[test]
    fn negative_land_size_fails_validation() {
        let request = SchemesRequest {
            state: "Karnataka".to_string(),
            crop_name: None,
            land_size_acres: Some(-2.0),
            category: None,
            language: None,
        };
        assert!(matches!(
            request.validate(),
            Err(FlowError::Validation(errors)) if errors[0].field == "land_size_acres"
        ));
    }
}
