use farefinder_core::ProviderError;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub fn client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::ProviderUnavailable(format!("http client setup: {}", e)))
}

/// Transport failures (connect, timeout, broken body) mean the provider could
/// not be reached.
pub fn transport_error(provider: &str, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::ProviderUnavailable(format!("{}: request timed out", provider))
    } else {
        ProviderError::ProviderUnavailable(format!("{}: {}", provider, err))
    }
}

/// Map a non-success status to the failure taxonomy.
pub fn status_error(provider: &str, status: StatusCode, body: &str) -> ProviderError {
    let detail = error_detail(body).unwrap_or_else(|| status.to_string());
    let message = format!("{}: {}", provider, detail);

    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited(message)
    } else if status.is_server_error() {
        ProviderError::ProviderUnavailable(message)
    } else if status.is_client_error() {
        ProviderError::InvalidRequest(message)
    } else {
        ProviderError::UnknownProviderError(format!("{}: unexpected status {}", provider, status))
    }
}

/// Read a response as JSON, classifying failures along the way.
pub async fn read_json<T: DeserializeOwned>(provider: &str, response: Response) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, e))?;

    if !status.is_success() {
        tracing::debug!(provider, %status, "Provider returned error status");
        return Err(status_error(provider, status, &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::UnknownProviderError(format!("{}: undecodable response: {}", provider, e))
    })
}

/// Pull a human-readable message out of the common error envelopes:
/// `{"errors":[{"detail":..}]}`, `{"error":{"message":..}}`, `{"error_description":..}`.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let first_error = value.get("errors").and_then(|e| e.get(0));
    let candidates = [
        first_error.and_then(|e| e.get("detail")),
        first_error.and_then(|e| e.get("title")),
        value.get("error").and_then(|e| e.get("message")),
        value.get("error_description"),
    ];

    let detail = candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::to_string);
    detail
}
