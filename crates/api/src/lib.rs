//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for receipts, participants and assignments
//! - Request/response types per endpoint
//! - Error to HTTP response mapping

pub mod error;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use sea_orm::DatabaseConnection;
use splitzies_core::ingestion::IngestionService;
use splitzies_core::receipt::ReceiptService;
use splitzies_db::ReceiptRepository;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Largest accepted request body: a 10 MiB image plus multipart framing.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024 + 64 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Image ingestion pipeline; image upload is disabled without it.
    pub ingestion: Option<IngestionService>,
}

impl AppState {
    /// State without image ingestion.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db: Arc::new(db),
            ingestion: None,
        }
    }

    /// Enable image upload.
    #[must_use]
    pub fn with_ingestion(mut self, ingestion: IngestionService) -> Self {
        self.ingestion = Some(ingestion);
        self
    }

    /// Receipt service over the shared connection.
    #[must_use]
    pub fn receipts(&self) -> ReceiptService<ReceiptRepository> {
        ReceiptService::new(Arc::new(ReceiptRepository::new((*self.db).clone())))
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
