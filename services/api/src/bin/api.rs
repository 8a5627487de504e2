//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{BackendClient, DbStorage, FileStorage},
    config::{Config, StorageBackend},
    error::ApiError,
    web::{self, state::AppState, ApiDoc},
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use recurring_core::{KeyValueStorage, MemoryStorage, RecurringScheduler, SystemClock};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open Storage ---
    let storage: Arc<dyn KeyValueStorage> = match &config.storage {
        StorageBackend::File(path) => {
            info!("Using file storage at {}", path.display());
            Arc::new(FileStorage::new(path.clone()))
        }
        StorageBackend::Postgres { database_url } => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_storage = DbStorage::new(db_pool);
            info!("Running database migrations...");
            db_storage.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_storage)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; recurring expenses are lost on restart");
            Arc::new(MemoryStorage::new())
        }
    };

    // --- 3. Initialize the Backend Client & Scheduler ---
    let backend = Arc::new(BackendClient::new(
        config.backend_url.clone(),
        config.backend_token.clone(),
        config.backend_timeout,
    )?);
    let scheduler = Arc::new(RecurringScheduler::new(
        storage,
        backend.clone(),
        Arc::new(SystemClock),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        scheduler: scheduler.clone(),
        payment_methods: backend,
        config: config.clone(),
    });

    // --- 5. Deferred Due Check ---
    // Runs shortly after startup so it does not compete with serving the first requests.
    let delay = config.auto_check_delay;
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match scheduler.pending().await {
            Ok(check) if !check.due.is_empty() => info!(
                "{} recurring expenses are due (prompt pending: {})",
                check.due.len(),
                check.should_prompt
            ),
            Ok(_) => info!("No recurring expenses are due"),
            Err(e) => warn!("Startup due check failed: {}", e),
        }
    });

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
