//! Catalog API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use mangawatch_core::{CatalogListQuery, CatalogRecord, CatalogStats};

use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CatalogListResponse {
    pub entries: Vec<CatalogRecord>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/catalog
///
/// List imported manga records, paged by surrogate key.
pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogListQuery>,
) -> Result<Json<CatalogListResponse>, impl IntoResponse> {
    let catalog = state.catalog();

    let entries = match catalog.list(&query) {
        Ok(entries) => entries,
        Err(e) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    };

    match catalog.count() {
        Ok(total) => Ok(Json(CatalogListResponse { entries, total })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// GET /api/v1/catalog/stats
///
/// Get catalog statistics.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogStats>, impl IntoResponse> {
    match state.catalog().stats() {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// GET /api/v1/catalog/{external_id}
///
/// Get a single record by its MangaDex UUID.
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<Json<CatalogRecord>, impl IntoResponse> {
    match state.catalog().find_by_external_id(&external_id) {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Record not found: {}", external_id),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
