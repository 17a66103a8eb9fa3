use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use farefinder_core::{Airline, AirlineDirectory, ProviderError};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Anything that went wrong behind the airline lookup, collapsed into one
/// generic failure for callers.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Airline service unavailable")]
    Upstream(#[source] ProviderError),
}

/// Single pass-through call to the airline directory. No retry, no history.
pub struct AirlineLookup {
    directory: Arc<dyn AirlineDirectory>,
}

impl AirlineLookup {
    pub fn new(directory: Arc<dyn AirlineDirectory>) -> Self {
        Self { directory }
    }

    pub async fn list(&self) -> Result<Vec<Airline>, ServiceError> {
        self.directory.list_airlines().await.map_err(|e| {
            tracing::error!("Airline lookup failed: {}", e);
            ServiceError::Upstream(e)
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AirlinesResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airlines: Option<Vec<Airline>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/airlines", get(list_airlines))
}

/// GET /v1/airlines
pub async fn list_airlines(State(state): State<AppState>) -> (StatusCode, Json<AirlinesResponse>) {
    match state.airlines.list().await {
        Ok(airlines) => (
            StatusCode::OK,
            Json(AirlinesResponse {
                success: true,
                airlines: Some(airlines),
                error: None,
            }),
        ),
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(AirlinesResponse {
                success: false,
                airlines: None,
                error: Some(err.to_string()),
            }),
        ),
    }
}
