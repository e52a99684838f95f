//! Season-long crop guidance: ordered growth stages with tasks and tips.
//!
//! Generated plans are cached in the document store per crop record, so a
//! farmer re-opening the crop view does not trigger another provider call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RetryConfig;
use crate::error::FlowError;
use crate::llm::{generate_json, ChatMessage, CompletionRequest, LlmProvider};
use crate::store::DocumentStore;
use crate::validate::Validator;

use super::{language_or_default, JSON_ONLY};

/// Guidance request.
#[derive(Debug, Clone, Deserialize)]
pub struct GuidanceRequest {
    pub crop_name: String,
    pub region: String,
    /// Growing season, e.g. "Kharif", "Rabi", "Summer".
    pub season: String,
    pub language: Option<String>,
}

/// One growth stage in the plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuidanceStage {
    pub name: String,
    pub duration_days: u32,
    pub tasks: Vec<String>,
    pub tips: Vec<String>,
}

/// A full season plan for a crop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropGuidance {
    pub crop_name: String,
    /// Stages in lifecycle order; durations drive the timeline lookup.
    pub stages: Vec<GuidanceStage>,
}

impl GuidanceRequest {
    fn validate(&self) -> Result<(), FlowError> {
        let mut v = Validator::new();
        v.require("crop_name", &self.crop_name)
            .require("region", &self.region)
            .require("season", &self.season);
        v.finish().map_err(FlowError::Validation)
    }
}

pub(crate) fn system_prompt(language: &str) -> String {
    format!(
        "You are an agronomist writing a season plan for a farmer. Break the \
         crop's lifecycle into 4-7 ordered growth stages covering sowing to \
         harvest. Durations are typical days for the crop and region. Tasks \
         are concrete actions; tips are shorter reminders. Answer in \
         {language}.\n\n\
         Output a JSON object with exactly these fields:\n\
         - \"crop_name\": the crop\n\
         - \"stages\": array of objects with \"name\", \"duration_days\" \
         (whole number), \"tasks\" (array), \"tips\" (array)\n\n\
         {JSON_ONLY}"
    )
}

pub(crate) fn user_prompt(request: &GuidanceRequest) -> String {
    format!(
        "Crop: {}\nRegion: {}\nSeason: {}",
        request.crop_name.trim(),
        request.region.trim(),
        request.season.trim()
    )
}

/// Run the guidance flow without caching.
pub async fn run(
    llm: &Arc<dyn LlmProvider>,
    retry: &RetryConfig,
    request: GuidanceRequest,
) -> Result<CropGuidance, FlowError> {
    request.validate()?;

    let language = language_or_default(request.language.as_deref()).to_string();
    let completion = CompletionRequest::new(vec![
        ChatMessage::system(system_prompt(&language)),
        ChatMessage::user(user_prompt(&request)),
    ])
    .with_temperature(0.2)
    .with_max_tokens(2048);

    let guidance: CropGuidance = generate_json(llm, retry, completion).await?;
    info!(
        crop = %request.crop_name,
        stages = guidance.stages.len(),
        "Guidance plan generated"
    );
    Ok(guidance)
}

/// Guidance for a stored crop, served from the cache when possible.
///
/// Returns the plan and whether it came from the cache.
pub async fn for_crop(
    llm: &Arc<dyn LlmProvider>,
    retry: &RetryConfig,
    store: &Arc<dyn DocumentStore>,
    uid: &str,
    land_id: &str,
    crop_id: &str,
    request: GuidanceRequest,
) -> Result<(CropGuidance, bool), FlowError> {
    if let Some(cached) = store.get_guidance(uid, land_id, crop_id).await? {
        info!(uid, crop_id, "Serving cached guidance plan");
        return Ok((cached, true));
    }

    let guidance = run(llm, retry, request).await?;
    store.put_guidance(uid, land_id, crop_id, &guidance).await?;
    Ok((guidance, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::error::LlmError;
    use crate::llm::{CompletionResponse, FinishReason};

    /// Counts calls and always returns the same two-stage plan.
    struct CountingLlm {
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmProvider for CountingLlm {
        fn model_name(&self) -> &str {
            "counting"
        }
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompletionResponse {
                content: r#"{
                    "crop_name": "rice",
                    "stages": [
                        {"name": "Nursery", "duration_days": 25, "tasks": ["Prepare seedbed"], "tips": []},
                        {"name": "Transplanting", "duration_days": 10, "tasks": ["Transplant seedlings"], "tips": ["Keep 2-3 cm water"]}
                    ]
                }"#
                .to_string(),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    fn request() -> GuidanceRequest {
        GuidanceRequest {
            crop_name: "rice".to_string(),
            region: "West Bengal".to_string(),
            season: "Kharif".to_string(),
            language: None,
        }
    }

    #[test]
    fn prompt_embeds_crop_region_season() {
        let prompt = user_prompt(&request());
        assert!(prompt.contains("rice"));
        assert!(prompt.contains("West Bengal"));
        assert!(prompt.contains("Kharif"));
    }

    #[tokio::test]
    async fn second_lookup_hits_cache() {
        let counting = Arc::new(CountingLlm {
            calls: AtomicU32::new(0),
        });
        let llm: Arc<dyn LlmProvider> = counting.clone();
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let retry = RetryConfig::default();

        let (first, cached) =
            for_crop(&llm, &retry, &store, "u1", "l1", "c1", request())
                .await
                .unwrap();
        assert!(!cached);
        assert_eq!(first.stages.len(), 2);

        let (second, cached) =
            for_crop(&llm, &retry, &store, "u1", "l1", "c1", request())
                .await
                .unwrap();
        assert!(cached);
        assert_eq!(second, first);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

        // Different crop id misses the cache.
        let (_, cached) = for_crop(&llm, &retry, &store, "u1", "l1", "c2", request())
            .await
            .unwrap();
        assert!(!cached);
    }

    #[tokio::test]
    async fn missing_season_fails_validation() {
        let mut req = request();
        req.season = String::new();
        assert!(matches!(
            req.validate(),
            Err(FlowError::Validation(errors)) if errors[0].field == "season"
        ));
    }
}
