use std::sync::Arc;

use anyhow::Context;
use biomecode_core::config::LayeredConfig;
use biomecode_engine::{EarthEngine, MemoryEngine, RestEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use biomecode_api::{create_router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "biomecode_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let layered = LayeredConfig::load().context("Failed to load configuration")?;
    let config = ApiConfig::from_layered(&layered);

    tracing::info!(
        port = config.port,
        cors_origins = ?config.cors_origins,
        remote = config.uses_remote_engine(),
        "Starting BiomeCode API server"
    );

    // Select the engine based on the presence of service-account settings
    let engine: Arc<dyn EarthEngine> = match &config.remote {
        Some(settings) => match RestEngine::from_settings(settings) {
            Ok(engine) => {
                tracing::info!(
                    project_id = %settings.project_id,
                    api_url = %settings.api_url,
                    "Using Earth Engine REST API"
                );
                Arc::new(engine)
            }
            Err(e) => {
                tracing::error!("Failed to initialise Earth Engine: {}", e);
                tracing::error!(
                    "Remediation:\n\
                    1. Ensure EE_KEY_PATH points to a readable service-account JSON key\n\
                    2. Verify EE_PROJECT_ID names a Cloud project registered for Earth Engine\n\
                    3. Set EE_SA_EMAIL if the key file has no client_email"
                );
                return Err(e).context("Earth Engine initialisation failed");
            }
        },
        None => {
            tracing::info!(
                "Using in-memory engine with fixture data (set EE_PROJECT_ID and EE_KEY_PATH \
                for Earth Engine)"
            );
            Arc::new(MemoryEngine::with_fixtures())
        }
    };

    let state = Arc::new(AppState::new(engine));
    let app = create_router(state).layer(config.cors_layer());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
