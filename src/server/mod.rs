//! HTTP surface: shared state and router assembly.

mod error;
mod routes;

pub use error::ApiError;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::auth::AuthClient;
use crate::config::RetryConfig;
use crate::llm::LlmProvider;
use crate::store::DocumentStore;
use crate::weather::WeatherClient;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmProvider>,
    pub retry: RetryConfig,
    pub weather: Arc<WeatherClient>,
    /// `None` when no identity service is configured.
    pub auth: Option<Arc<AuthClient>>,
    pub store: Arc<dyn DocumentStore>,
}

/// Build the application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        // Flows
        .route("/api/flows/diagnose", post(routes::diagnose))
        .route("/api/flows/market", post(routes::market))
        .route("/api/flows/schemes", post(routes::schemes))
        .route("/api/flows/weather-advice", post(routes::weather_advice))
        .route("/api/flows/guidance", post(routes::guidance))
        // Weather
        .route("/api/weather", get(routes::weather))
        // Auth
        .route("/api/auth/sign-in", post(routes::sign_in))
        .route("/api/auth/sign-up", post(routes::sign_up))
        .route("/api/auth/anonymous", post(routes::sign_in_anonymous))
        // Lands and crops
        .route(
            "/api/lands",
            get(routes::list_lands).post(routes::create_land),
        )
        .route(
            "/api/lands/{land_id}/crops",
            get(routes::list_crops).post(routes::create_crop),
        )
        .route(
            "/api/lands/{land_id}/crops/{crop_id}/timeline",
            get(routes::crop_timeline),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
