use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use farefinder_core::{NormalizedFlightOffer, SearchParams};
use farefinder_search::{SearchError, SearchSession, SessionSnapshot};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub offers: Vec<NormalizedFlightOffer>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/{id}", get(get_session).delete(end_session))
        .route("/v1/sessions/{id}/search", post(search))
        .route("/v1/sessions/{id}/retry", post(retry))
        .route("/v1/sessions/{id}/results", delete(clear))
}

async fn session(state: &AppState, id: Uuid) -> Result<Arc<SearchSession>, AppError> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFoundError(format!("Session {} not found", id)))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/sessions
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreatedResponse>), AppError> {
    let session = state.sessions.create().await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionCreatedResponse {
            session_id: session.id(),
        }),
    ))
}

/// GET /v1/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = session(&state, id).await?;
    Ok(Json(session.snapshot().await))
}

/// DELETE /v1/sessions/{id}
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFoundError(format!("Session {} not found", id)))
    }
}

/// POST /v1/sessions/{id}/search
/// Provider failures come back as error statuses; the same error is in the
/// session snapshot.
pub async fn search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(params): Json<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let session = session(&state, id).await?;
    let offers = session.search(params).await?;
    Ok(Json(SearchResponse { offers }))
}

/// POST /v1/sessions/{id}/retry
/// Re-runs the latest search and returns the resulting snapshot. A provider
/// failure is reported inside the snapshot rather than as an error status.
pub async fn retry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = session(&state, id).await?;
    match session.retry().await {
        Some(Err(err @ SearchError::Validation(_))) => return Err(err.into()),
        Some(_) | None => {}
    }
    Ok(Json(session.snapshot().await))
}

/// DELETE /v1/sessions/{id}/results
pub async fn clear(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = session(&state, id).await?;
    session.clear().await;
    Ok(Json(session.snapshot().await))
}
