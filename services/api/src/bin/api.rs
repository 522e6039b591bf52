//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FileStore, MemoryStore, PgKeyValueStore, RetryingStore},
    config::{Config, StorageBackend},
    error::ApiError,
    web::{router, ApiDoc, AppState},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use school_office_core::ports::{Clock, KeyValueStore, SystemClock};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Opens the configured backend, wrapped so transient failures are retried.
async fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>, ApiError> {
    let store: Arc<dyn KeyValueStore> = match &config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on restart.");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::File(dir) => {
            info!("Using file storage in {}", dir.display());
            Arc::new(FileStore::open(dir.clone()).await.map_err(|e| {
                ApiError::Internal(format!("Could not open the data directory: {}", e))
            })?)
        }
        StorageBackend::Postgres(url) => {
            info!("Connecting to database...");
            let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let db = PgKeyValueStore::new(pool);
            info!("Running database migrations...");
            db.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db)
        }
    };
    Ok(Arc::new(RetryingStore::new(store, config.retry.clone())))
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open Storage & Load the Collections ---
    let store = open_store(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let app_state = Arc::new(AppState::load(store, clock).await?);

    // --- 3. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
