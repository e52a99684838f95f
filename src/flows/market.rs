//! Market price report for a crop.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RetryConfig;
use crate::error::FlowError;
use crate::llm::{generate_json, ChatMessage, CompletionRequest, LlmProvider};
use crate::validate::Validator;

use super::{language_or_default, JSON_ONLY};

/// Market price request.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketRequest {
    pub crop_name: String,
    pub state: String,
    /// Specific mandi/market; omitted means the state's major markets.
    pub market: Option<String>,
    pub language: Option<String>,
}

/// One market's quote for the crop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketQuote {
    pub market: String,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub modal_price: Decimal,
    /// Pricing unit, e.g. "INR per quintal".
    pub unit: String,
}

/// Price trend direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

/// Typed market report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketReport {
    pub crop_name: String,
    pub quotes: Vec<MarketQuote>,
    pub trend: Trend,
    pub advice: String,
}

impl MarketRequest {
    fn validate(&self) -> Result<(), FlowError> {
        let mut v = Validator::new();
        v.require("crop_name", &self.crop_name)
            .require("state", &self.state);
        v.finish().map_err(FlowError::Validation)
    }
}

pub(crate) fn system_prompt(language: &str) -> String {
    format!(
        "You are an agricultural market analyst. Report typical current mandi \
         prices for the requested crop, a short trend assessment, and practical \
         advice on whether to sell now or hold. Answer in {language}.\n\n\
         Output a JSON object with exactly these fields:\n\
         - \"crop_name\": the crop\n\
         - \"quotes\": array of objects with \"market\", \"min_price\", \
         \"max_price\", \"modal_price\" (numbers), \"unit\"\n\
         - \"trend\": one of \"rising\", \"falling\", \"stable\"\n\
         - \"advice\": 2-3 sentences of selling advice\n\n\
         {JSON_ONLY}"
    )
}

pub(crate) fn user_prompt(request: &MarketRequest) -> String {
    let mut prompt = format!(
        "Crop: {}\nState: {}",
        request.crop_name.trim(),
        request.state.trim()
    );
    if let Some(market) = request.market.as_deref().filter(|m| !m.trim().is_empty()) {
        prompt.push_str(&format!("\nMarket: {}", market.trim()));
    }
    prompt
}

/// Run the market price flow.
pub async fn run(
    llm: &Arc<dyn LlmProvider>,
    retry: &RetryConfig,
    request: MarketRequest,
) -> Result<MarketReport, FlowError> {
    request.validate()?;

    let language = language_or_default(request.language.as_deref()).to_string();
    let completion = CompletionRequest::new(vec![
        ChatMessage::system(system_prompt(&language)),
        ChatMessage::user(user_prompt(&request)),
    ])
    .with_temperature(0.3)
    .with_max_tokens(1024);

    let report: MarketReport = generate_json(llm, retry, completion).await?;
    info!(
        crop = %request.crop_name,
        quotes = report.quotes.len(),
        trend = ?report.trend,
        "Market report generated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn report_parses_numeric_prices() {
        let json = r#"{
            "crop_name": "Onion",
            "quotes": [
                {
                    "market": "Bengaluru",
                    "min_price": 1200,
                    "max_price": 1850.50,
                    "modal_price": 1500,
                    "unit": "INR per quintal"
                }
            ],
            "trend": "rising",
            "advice": "Prices are firming up; holding for a week may pay off."
        }"#;
        let report: MarketReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.quotes[0].max_price, dec!(1850.50));
        assert_eq!(report.quotes[0].modal_price, dec!(1500));
        assert_eq!(report.trend, Trend::Rising);
    }

    #[test]
    fn prompt_includes_optional_market() {
        let request = MarketRequest {
            crop_name: "Onion".to_string(),
            state: "Karnataka".to_string(),
            market: Some("Hubballi".to_string()),
            language: None,
        };
        let prompt = user_prompt(&request);
        assert!(prompt.contains("Hubballi"));
        assert!(prompt.contains("Karnataka"));
    }

    #[test]
    fn blank_state_fails_validation() {
        let request = MarketRequest {
            crop_name: "Onion".to_string(),
            state: " ".to_string(),
            market: None,
            language: None,
        };
        assert!(matches!(
            request.validate(),
            Err(FlowError::Validation(errors)) if errors[0].field == "state"
        ));
    }
}
