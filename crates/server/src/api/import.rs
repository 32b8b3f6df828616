//! Import control API handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use mangawatch_core::{ImportError, ImportStatus, PassFilter};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartParams {
    #[serde(default)]
    pub max_records: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ResumeParams {
    pub cursor: String,
    #[serde(default)]
    pub max_records: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ImportStartedResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub acknowledged: bool,
}

#[derive(Debug, Serialize)]
pub struct ImportInfoResponse {
    /// Records the remote reports for the handled content ratings.
    pub remote_total: u64,
    /// Records currently in the local catalog.
    pub local_total: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn import_error_response(e: ImportError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        ImportError::AlreadyRunning => StatusCode::CONFLICT,
        ImportError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/import/info
///
/// Compare remote availability against the local catalog.
pub async fn get_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ImportInfoResponse>, impl IntoResponse> {
    let remote_total = match state.source().total_available(&PassFilter::default_ratings()).await {
        Ok(total) => total,
        Err(e) => {
            return Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    };

    match state.catalog().count() {
        Ok(local_total) => Ok(Json(ImportInfoResponse {
            remote_total,
            local_total,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// GET /api/v1/import/status
///
/// Live counters for the current run plus the last finished result.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ImportStatus> {
    Json(state.import_manager().status().await)
}

/// POST /api/v1/import/start
///
/// Kick off a single-pass import. 409 if a run is already in flight.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StartParams>,
) -> Result<(StatusCode, Json<ImportStartedResponse>), impl IntoResponse> {
    match state.import_manager().start(params.max_records) {
        Ok(()) => Ok((
            StatusCode::ACCEPTED,
            Json(ImportStartedResponse {
                message: "Import started".to_string(),
            }),
        )),
        Err(e) => Err(import_error_response(e)),
    }
}

/// POST /api/v1/import/multipass
///
/// Kick off a multipass import over every rating and demographic segment.
pub async fn start_multipass(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ImportStartedResponse>), impl IntoResponse> {
    match state.import_manager().start_multipass() {
        Ok(()) => Ok((
            StatusCode::ACCEPTED,
            Json(ImportStartedResponse {
                message: "Multipass import started".to_string(),
            }),
        )),
        Err(e) => Err(import_error_response(e)),
    }
}

/// POST /api/v1/import/resume
///
/// Resume an import from a previously reported cursor.
pub async fn resume(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResumeParams>,
) -> Result<(StatusCode, Json<ImportStartedResponse>), impl IntoResponse> {
    match state
        .import_manager()
        .resume(&params.cursor, params.max_records)
    {
        Ok(()) => Ok((
            StatusCode::ACCEPTED,
            Json(ImportStartedResponse {
                message: format!("Import resumed from {}", params.cursor),
            }),
        )),
        Err(e) => Err(import_error_response(e)),
    }
}

/// POST /api/v1/import/stop
///
/// Signal the running import to wind down. Acknowledged is false when
/// nothing was running.
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<StopResponse> {
    Json(StopResponse {
        acknowledged: state.import_manager().stop(),
    })
}
