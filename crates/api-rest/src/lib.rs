//! # API REST
//!
//! REST API implementation for OSS.
//!
//! Handles:
//! - HTTP endpoints with axum (upload, fetch, health)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (multipart parsing, JSON envelopes, CORS, body limits)
//!
//! Uses `api-shared` for wire types and `oss-files` for storage. Store I/O is synchronous and
//! runs on tokio's blocking pool so slow disks never stall the async workers.

#![warn(rust_2018_idioms)]

pub mod error;
mod handlers;
mod openapi;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use oss_core::{CoreConfig, CoreResult};
use oss_files::BlobStore;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;
pub use openapi::ApiDoc;

/// Multipart field that carries the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Application state for the REST API server
///
/// Shared by every request handler. The store is opened once at startup; handlers only clone
/// the handle.
#[derive(Clone, Debug)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    store: BlobStore,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, store: BlobStore) -> Self {
        Self { cfg, store }
    }

    /// Opens the configured blob store and wraps it with the configuration.
    ///
    /// # Errors
    /// Returns an error if the storage root cannot be created or opened.
    pub fn from_config(cfg: Arc<CoreConfig>) -> CoreResult<Self> {
        let store = cfg.open_store()?;
        Ok(Self::new(cfg, store))
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }
}

/// Assemble the application router with all routes and middleware.
///
/// `/api/v1/images/*` are aliases kept for clients of the original image service.
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.cfg.max_upload_bytes();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/files/:filename", get(handlers::get_file))
        .route("/api/v1/images/upload", post(handlers::upload))
        .route("/api/v1/images/:filename", get(handlers::get_file))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
