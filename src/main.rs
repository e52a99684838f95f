use std::sync::Arc;

use farm_assist::auth::AuthClient;
use farm_assist::config::AppConfig;
use farm_assist::llm::{create_provider, LlmConfig};
use farm_assist::server::{app_router, AppState};
use farm_assist::store::{DocumentStore, MemoryStore, RestDocumentStore};
use farm_assist::weather::WeatherClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    eprintln!("🌾 Farm Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({:?})", config.model, config.backend);
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!(
        "   Retry: {} attempts, base delay {:?}",
        config.retry.max_attempts, config.retry.base_delay
    );

    let llm = create_provider(&LlmConfig {
        backend: config.backend,
        api_key: config.api_key.clone(),
        model: config.model.clone(),
    });

    let auth = match &config.auth {
        Some(auth_config) => {
            eprintln!("   Auth: {}", auth_config.base_url);
            Some(Arc::new(AuthClient::new(auth_config)))
        }
        None => {
            eprintln!("   Auth: disabled");
            None
        }
    };

    let store: Arc<dyn DocumentStore> = match &config.store_url {
        Some(url) => {
            eprintln!("   Store: {url}");
            Arc::new(RestDocumentStore::new(url.clone()))
        }
        None => {
            eprintln!("   Store: in-memory (records are lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState {
        llm,
        retry: config.retry,
        weather: Arc::new(WeatherClient::new()),
        auth,
        store,
    };

    let app = app_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Farm Assist server started");
    axum::serve(listener, app).await?;

    Ok(())
}
