//! Farming advisory from a weather snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RetryConfig;
use crate::error::FlowError;
use crate::llm::{generate_json, ChatMessage, CompletionRequest, LlmProvider};
use crate::validate::Validator;
use crate::weather::{CurrentConditions, DailyForecast};

use super::{language_or_default, JSON_ONLY};

/// Weather advisory request: a conditions snapshot plus the crop context.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherAdviceRequest {
    pub crop_name: String,
    pub growth_stage: Option<String>,
    pub location_name: Option<String>,
    pub current: CurrentConditions,
    #[serde(default)]
    pub forecast: Vec<DailyForecast>,
    pub language: Option<String>,
}

/// Typed weather advisory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherAdvice {
    /// Main advisory paragraph.
    pub advisory: String,
    /// Urgent warnings (e.g. hail, heat wave), empty when none.
    pub alerts: Vec<String>,
    pub spraying_recommendation: String,
    pub irrigation_advice: String,
}

impl WeatherAdviceRequest {
    fn validate(&self) -> Result<(), FlowError> {
        let mut v = Validator::new();
        v.require("crop_name", &self.crop_name);
        v.finish().map_err(FlowError::Validation)
    }
}

pub(crate) fn system_prompt(language: &str) -> String {
    format!(
        "You are an agronomist giving weather-based advice to a farmer. Use \
         the provided conditions and forecast; do not invent weather data. Be \
         specific about timing (today, tomorrow, this week). Answer in \
         {language}.\n\n\
         Output a JSON object with exactly these fields:\n\
         - \"advisory\": main advisory paragraph\n\
         - \"alerts\": array of urgent warnings (empty if none)\n\
         - \"spraying_recommendation\": when (not) to spray and why\n\
         - \"irrigation_advice\": whether and how much to irrigate\n\n\
         {JSON_ONLY}"
    )
}

pub(crate) fn user_prompt(request: &WeatherAdviceRequest) -> String {
    let mut prompt = format!("Crop: {}", request.crop_name.trim());
    if let Some(stage) = request
        .growth_stage
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        prompt.push_str(&format!("\nGrowth stage: {}", stage.trim()));
    }
    if let Some(location) = request
        .location_name
        .as_deref()
        .filter(|l| !l.trim().is_empty())
    {
        prompt.push_str(&format!("\nLocation: {}", location.trim()));
    }

    let c = &request.current;
    prompt.push_str(&format!(
        "\nCurrent conditions: {} — {:.1}C, humidity {:.0}%, wind {:.1} km/h, \
         precipitation {:.1} mm",
        c.condition, c.temperature_c, c.humidity_pct, c.wind_speed_kmh, c.precipitation_mm
    ));

    if !request.forecast.is_empty() {
        prompt.push_str("\nForecast:");
        for day in &request.forecast {
            prompt.push_str(&format!(
                "\n- {}: {} — {:.1}C to {:.1}C, rain chance {:.0}%",
                day.date, day.condition, day.min_temp_c, day.max_temp_c, day.rain_probability_pct
            ));
        }
    }
    prompt
}

/// Run the weather advisory flow.
pub async fn run(
    llm: &Arc<dyn LlmProvider>,
    retry: &RetryConfig,
    request: WeatherAdviceRequest,
) -> Result<WeatherAdvice, FlowError> {
    request.validate()?;

    let language = language_or_default(request.language.as_deref()).to_string();
    let completion = CompletionRequest::new(vec![
        ChatMessage::system(system_prompt(&language)),
        ChatMessage::user(user_prompt(&request)),
    ])
    .with_temperature(0.3)
    .with_max_tokens(1024);

    let advice: WeatherAdvice = generate_json(llm, retry, completion).await?;
    info!(
        crop = %request.crop_name,
        alerts = advice.alerts.len(),
        "Weather advisory generated"
    );
    Ok(advice)
}
