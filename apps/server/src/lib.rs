//! clipdex-server library: HTTP API over one catalog.
//!
//! The catalog is loaded on the first request and kept for the life of the
//! process; playback URLs are signed per row and cached for half their validity.

use std::sync::Arc;

use axum::Router;
use clipdex_core::{CatalogSource, MediaResolver, ObjectStore};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogSource>,
    pub resolver: Arc<MediaResolver>,
}

impl AppState {
    /// State serving `catalog_object` from `store`.
    pub fn new(store: Arc<dyn ObjectStore>, catalog_object: impl Into<String>) -> Self {
        Self {
            catalog: Arc::new(CatalogSource::new(store.clone(), catalog_object)),
            resolver: Arc::new(MediaResolver::new(store)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/videos", get(api::list_videos))
        .route("/api/catalog/reload", post(api::reload_catalog))
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
