//! Splitzies API Server
//!
//! Main entry point for the receipt-splitting service.

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use splitzies_api::{AppState, create_router};
use splitzies_core::ingestion::{GeminiExtractor, IngestionService, VisionOcrClient};
use splitzies_core::storage::{StorageConfig, StorageService};
use splitzies_db::{connect_with, migration::Migrator};
use splitzies_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "splitzies=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Connect to database
    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    if config.database.run_migrations {
        Migrator::up(&db, None).await?;
        info!("Database migrations applied");
    }

    // Create application state
    let mut state = AppState::new(db);
    match build_ingestion(&config)? {
        Some(ingestion) => state = state.with_ingestion(ingestion),
        None => warn!("Object storage is not configured, image upload is disabled"),
    }

    // Create router
    let mut app = create_router(state);
    if let Some(root) = local_upload_root(&config) {
        info!(root = %root, "Serving uploaded images from /uploads");
        app = app.nest_service("/uploads", ServeDir::new(root));
    }

    // Start server
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wire storage, OCR and extraction into the ingestion pipeline.
///
/// Returns `None` without object storage; OCR and extraction are optional.
fn build_ingestion(config: &AppConfig) -> anyhow::Result<Option<IngestionService>> {
    let Some(settings) = &config.storage else {
        return Ok(None);
    };
    let storage = StorageService::from_config(StorageConfig::from_settings(settings)?)?;
    let mut ingestion = IngestionService::new(Arc::new(storage));

    match &config.ocr {
        Some(ocr) => {
            ingestion = ingestion.with_ocr(Arc::new(VisionOcrClient::new(ocr)?));
            info!(endpoint = %ocr.endpoint, "OCR enabled");
        }
        None => warn!("OCR is not configured, uploaded receipts will have no items"),
    }

    match &config.extraction {
        Some(extraction) => {
            ingestion = ingestion.with_extractor(Arc::new(GeminiExtractor::new(extraction)?));
            info!(model = %extraction.model, "Receipt extraction enabled");
        }
        None => info!("Receipt extraction is not configured, using the text parser"),
    }

    Ok(Some(ingestion))
}

/// Root directory of the local filesystem backend, when that backend is used.
fn local_upload_root(config: &AppConfig) -> Option<String> {
    config
        .storage
        .as_ref()
        .filter(|s| matches!(s.provider.trim().to_ascii_lowercase().as_str(), "fs" | "local"))
        .map(|s| s.root.clone())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
