use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{catalog, handlers, import};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Catalog (imported manga records)
        .route("/catalog", get(catalog::list_catalog))
        .route("/catalog/stats", get(catalog::get_stats))
        .route("/catalog/{external_id}", get(catalog::get_entry))
        // Import control
        .route("/import/info", get(import::get_info))
        .route("/import/status", get(import::get_status))
        .route("/import/start", post(import::start))
        .route("/import/multipass", post(import::start_multipass))
        .route("/import/resume", post(import::resume))
        .route("/import/stop", post(import::stop))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
