use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use farefinder_core::{ErrorKind, ProviderError};
use farefinder_search::SearchError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    NotFoundError(String),
    ValidationError(String),
    ProviderError(ProviderError),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::ProviderError(err) => {
                let status = match err.kind() {
                    ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                    ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                    ErrorKind::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                    ErrorKind::UnknownProviderError => StatusCode::BAD_GATEWAY,
                };
                (status, json!({ "error": err.to_string(), "kind": err.kind() }))
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(e) => AppError::ValidationError(e.to_string()),
            SearchError::Provider(e) => AppError::ProviderError(e),
            SearchError::NoProviders => AppError::InternalServerError(err.to_string()),
        }
    }
}
