//! Request handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use crate::auth::UserIdentity;
use crate::flows::{diagnose, guidance, market, schemes, weather_advice};
use crate::store::{CropRecord, LandRecord};
use crate::timeline;
use crate::validate::{ValidationError, Validator};

use super::{ApiError, AppState};

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ── Flows ───────────────────────────────────────────────────────────────

pub async fn diagnose(
    State(state): State<AppState>,
    Json(request): Json<diagnose::DiagnoseRequest>,
) -> Result<Json<diagnose::Diagnosis>, ApiError> {
    let result = diagnose::run(&state.llm, &state.retry, request).await?;
    Ok(Json(result))
}

pub async fn market(
    State(state): State<AppState>,
    Json(request): Json<market::MarketRequest>,
) -> Result<Json<market::MarketReport>, ApiError> {
    let result = market::run(&state.llm, &state.retry, request).await?;
    Ok(Json(result))
}

pub async fn schemes(
    State(state): State<AppState>,
    Json(request): Json<schemes::SchemesRequest>,
) -> Result<Json<schemes::SchemeList>, ApiError> {
    let result = schemes::run(&state.llm, &state.retry, request).await?;
    Ok(Json(result))
}

pub async fn weather_advice(
    State(state): State<AppState>,
    Json(request): Json<weather_advice::WeatherAdviceRequest>,
) -> Result<Json<weather_advice::WeatherAdvice>, ApiError> {
    let result = weather_advice::run(&state.llm, &state.retry, request).await?;
    Ok(Json(result))
}

pub async fn guidance(
    State(state): State<AppState>,
    Json(request): Json<guidance::GuidanceRequest>,
) -> Result<Json<guidance::CropGuidance>, ApiError> {
    let result = guidance::run(&state.llm, &state.retry, request).await?;
    Ok(Json(result))
}

// ── Weather ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lon: f64,
    pub days: Option<u8>,
}

pub async fn weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut v = Validator::new();
    v.coordinates(query.lat, query.lon);
    v.finish().map_err(ApiError::validation)?;

    let days = query.days.unwrap_or(5).clamp(1, 14);
    let current = state.weather.current(query.lat, query.lon).await?;
    let forecast = state.weather.forecast(query.lat, query.lon, days).await?;

    // A nameless coordinate is not worth failing the whole response over.
    let location = match state.weather.reverse_geocode(query.lat, query.lon).await {
        Ok(location) => Some(location),
        Err(crate::error::WeatherError::LocationNotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(Json(serde_json::json!({
        "location": location,
        "current": current,
        "forecast": forecast,
    })))
}

// ── Auth ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

fn require_auth(state: &AppState) -> Result<&crate::auth::AuthClient, ApiError> {
    state
        .auth
        .as_deref()
        .ok_or_else(|| ApiError::unavailable("Sign-in is not configured on this server"))
}

fn validate_credentials(body: &CredentialsBody) -> Result<(), ApiError> {
    let mut v = Validator::new();
    v.require("email", &body.email).require("password", &body.password);
    if !body.email.trim().is_empty() && !body.email.contains('@') {
        return Err(ApiError::validation(vec![ValidationError::new(
            "email",
            "Enter a valid email address",
        )]));
    }
    v.finish().map_err(ApiError::validation)
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<UserIdentity>, ApiError> {
    validate_credentials(&body)?;
    let identity = require_auth(&state)?
        .sign_in(body.email.trim(), &body.password)
        .await?;
    Ok(Json(identity))
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<(StatusCode, Json<UserIdentity>), ApiError> {
    validate_credentials(&body)?;
    let identity = require_auth(&state)?
        .sign_up(body.email.trim(), &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(identity)))
}

pub async fn sign_in_anonymous(
    State(state): State<AppState>,
) -> Result<Json<UserIdentity>, ApiError> {
    let identity = require_auth(&state)?.sign_in_anonymous().await?;
    Ok(Json(identity))
}

// ── Lands and crops ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub uid: String,
}

fn require_uid(query: &UserQuery) -> Result<&str, ApiError> {
    let uid = query.uid.trim();
    if uid.is_empty() {
        return Err(ApiError::validation(vec![ValidationError::new(
            "uid",
            "This field is required",
        )]));
    }
    Ok(uid)
}

pub async fn list_lands(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<LandRecord>>, ApiError> {
    let uid = require_uid(&query)?;
    Ok(Json(state.store.list_lands(uid).await?))
}

#[derive(Debug, Deserialize)]
pub struct LandBody {
    pub name: String,
    pub area_acres: f64,
    pub soil_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub async fn create_land(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
    Json(body): Json<LandBody>,
) -> Result<(StatusCode, Json<LandRecord>), ApiError> {
    let uid = require_uid(&query)?;

    let mut v = Validator::new();
    v.require("name", &body.name)
        .require("soil_type", &body.soil_type)
        .positive("area_acres", body.area_acres);
    if let (Some(lat), Some(lon)) = (body.latitude, body.longitude) {
        v.coordinates(lat, lon);
    }
    v.finish().map_err(ApiError::validation)?;

    let mut land = LandRecord::new(body.name.trim(), body.area_acres, body.soil_type.trim());
    land.latitude = body.latitude;
    land.longitude = body.longitude;

    state.store.put_land(uid, &land).await?;
    info!(uid, land_id = %land.id, "Land recorded");
    Ok((StatusCode::CREATED, Json(land)))
}

pub async fn list_crops(
    State(state): State<AppState>,
    Path(land_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<CropRecord>>, ApiError> {
    let uid = require_uid(&query)?;
    Ok(Json(state.store.list_crops(uid, &land_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CropBody {
    pub crop_name: String,
    pub variety: Option<String>,
    pub sowing_date: NaiveDate,
}

pub async fn create_crop(
    State(state): State<AppState>,
    Path(land_id): Path<String>,
    Query(query): Query<UserQuery>,
    Json(body): Json<CropBody>,
) -> Result<(StatusCode, Json<CropRecord>), ApiError> {
    let uid = require_uid(&query)?;

    let mut v = Validator::new();
    v.require("crop_name", &body.crop_name)
        .not_future_date("sowing_date", body.sowing_date);
    v.finish().map_err(ApiError::validation)?;

    if state.store.get_land(uid, &land_id).await?.is_none() {
        return Err(ApiError::not_found("Land not found"));
    }

    let mut crop = CropRecord::new(body.crop_name.trim(), body.sowing_date);
    crop.variety = body.variety.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    state.store.put_crop(uid, &land_id, &crop).await?;
    info!(uid, land_id, crop_id = %crop.id, "Crop recorded");
    Ok((StatusCode::CREATED, Json(crop)))
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub uid: String,
    pub region: Option<String>,
    pub season: Option<String>,
    pub language: Option<String>,
}

pub async fn crop_timeline(
    State(state): State<AppState>,
    Path((land_id, crop_id)): Path<(String, String)>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = query.uid.trim();
    if uid.is_empty() {
        return Err(ApiError::validation(vec![ValidationError::new(
            "uid",
            "This field is required",
        )]));
    }

    let crop = state
        .store
        .get_crop(uid, &land_id, &crop_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Crop not found"))?;

    let request = guidance::GuidanceRequest {
        crop_name: crop.crop_name.clone(),
        region: query.region.unwrap_or_else(|| "India".to_string()),
        season: query.season.unwrap_or_else(|| "the current season".to_string()),
        language: query.language,
    };
    let (plan, cached) = guidance::for_crop(
        &state.llm,
        &state.retry,
        &state.store,
        uid,
        &land_id,
        &crop_id,
        request,
    )
    .await?;

    let position = timeline::position(&plan, crop.sowing_date, Utc::now().date_naive())
        .ok_or_else(|| {
            ApiError::validation(vec![ValidationError::new(
                "sowing_date",
                "Sowing date is in the future",
            )])
        })?;

    Ok(Json(serde_json::json!({
        "crop": crop,
        "cached": cached,
        "position": position,
        "stages": plan.stages,
    })))
}
