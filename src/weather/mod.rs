//! Weather and reverse-geocoding HTTP clients.
//!
//! Consumes an Open-Meteo style forecast API and a reverse-geocoding API as
//! opaque services. Base URLs are overridable so tests can point the client
//! at a mock server.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::WeatherError;

const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com";
const DEFAULT_GEOCODE_URL: &str = "https://api.bigdatacloud.net";

/// Current conditions at a point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    pub precipitation_mm: f64,
    pub weather_code: u16,
    /// Human-readable condition mapped from the WMO weather code.
    pub condition: String,
}

/// One day of forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub rain_probability_pct: f64,
    pub condition: String,
}

/// Reverse-geocoded place name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub region: String,
    pub country: String,
}

/// Client for the weather and geocoding services.
pub struct WeatherClient {
    http: reqwest::Client,
    forecast_url: String,
    geocode_url: String,
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherClient {
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_FORECAST_URL, DEFAULT_GEOCODE_URL)
    }

    pub fn with_base_urls(
        forecast_url: impl Into<String>,
        geocode_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            forecast_url: forecast_url.into().trim_end_matches('/').to_string(),
            geocode_url: geocode_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch current conditions for a coordinate pair.
    pub async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions, WeatherError> {
        let url = format!(
            "{}/v1/forecast?latitude={lat}&longitude={lon}\
             &current=temperature_2m,relative_humidity_2m,precipitation,weather_code,wind_speed_10m",
            self.forecast_url
        );
        let payload = self.get_json(&url).await?;
        parse_current(&payload)
    }

    /// Fetch a short daily forecast.
    pub async fn forecast(
        &self,
        lat: f64,
        lon: f64,
        days: u8,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        let url = format!(
            "{}/v1/forecast?latitude={lat}&longitude={lon}\
             &daily=temperature_2m_max,temperature_2m_min,precipitation_probability_max,weather_code\
             &forecast_days={days}&timezone=auto",
            self.forecast_url
        );
        let payload = self.get_json(&url).await?;
        parse_forecast(&payload)
    }

    /// Resolve a coordinate pair to the nearest locality name.
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Location, WeatherError> {
        let url = format!(
            "{}/data/reverse-geocode-client?latitude={lat}&longitude={lon}&localityLanguageCode=en",
            self.geocode_url
        );
        let payload = self.get_json(&url).await?;

        let name = payload
            .get("city")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| payload.get("locality").and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            return Err(WeatherError::LocationNotFound { lat, lon });
        }

        Ok(Location {
            name,
            region: str_field(&payload, "principalSubdivision"),
            country: str_field(&payload, "countryName"),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, WeatherError> {
        debug!(url, "weather request");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WeatherError::Http {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| WeatherError::InvalidPayload(e.to_string()))
    }
}

fn str_field(payload: &Value, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn num_field(current: &Value, key: &str) -> Result<f64, WeatherError> {
    current
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| WeatherError::InvalidPayload(format!("missing numeric field '{key}'")))
}

fn parse_current(payload: &Value) -> Result<CurrentConditions, WeatherError> {
    let current = payload
        .get("current")
        .ok_or_else(|| WeatherError::InvalidPayload("missing 'current' block".to_string()))?;

    let weather_code = num_field(current, "weather_code")? as u16;
    Ok(CurrentConditions {
        temperature_c: num_field(current, "temperature_2m")?,
        humidity_pct: num_field(current, "relative_humidity_2m")?,
        wind_speed_kmh: num_field(current, "wind_speed_10m")?,
        precipitation_mm: num_field(current, "precipitation")?,
        weather_code,
        condition: describe_weather_code(weather_code).to_string(),
    })
}

fn parse_forecast(payload: &Value) -> Result<Vec<DailyForecast>, WeatherError> {
    let daily = payload
        .get("daily")
        .ok_or_else(|| WeatherError::InvalidPayload("missing 'daily' block".to_string()))?;

    let dates = daily
        .get("time")
        .and_then(|v| v.as_array())
        .ok_or_else(|| WeatherError::InvalidPayload("missing 'daily.time'".to_string()))?;

    let arr = |key: &str| daily.get(key).and_then(|v| v.as_array()).cloned().unwrap_or_default();
    let maxs = arr("temperature_2m_max");
    let mins = arr("temperature_2m_min");
    let rains = arr("precipitation_probability_max");
    let codes = arr("weather_code");

    let mut out = Vec::with_capacity(dates.len());
    for (i, date) in dates.iter().enumerate() {
        let date = date
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .ok_or_else(|| WeatherError::InvalidPayload("bad date in 'daily.time'".to_string()))?;
        let code = codes.get(i).and_then(|v| v.as_f64()).unwrap_or(0.0) as u16;
        out.push(DailyForecast {
            date,
            max_temp_c: maxs.get(i).and_then(|v| v.as_f64()).unwrap_or(0.0),
            min_temp_c: mins.get(i).and_then(|v| v.as_f64()).unwrap_or(0.0),
            rain_probability_pct: rains.get(i).and_then(|v| v.as_f64()).unwrap_or(0.0),
            condition: describe_weather_code(code).to_string(),
        });
    }
    Ok(out)
}

/// Map a WMO weather code to a short description.
pub fn describe_weather_code(code: u16) -> &'static str {
    match code {
        0 => "Clear sky",
        1..=3 => "Partly cloudy",
        45 | 48 => "Fog",
        51..=57 => "Drizzle",
        61..=67 => "Rain",
        71..=77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95..=99 => "Thunderstorm",
        _ => "Unknown",
    }
}
