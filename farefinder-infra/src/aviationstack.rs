use async_trait::async_trait;
use farefinder_core::{Airline, AirlineDirectory, ProviderError, Secret};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::app_config::AviationStackConfig;
use crate::http;

pub const PROVIDER_TAG: &str = "aviationstack";

/// Airline reference data from the AviationStack `airlines` endpoint.
pub struct AviationStackDirectory {
    client: reqwest::Client,
    base_url: String,
    access_key: Secret,
}

impl AviationStackDirectory {
    pub fn new(config: &AviationStackConfig, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http::client(timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
        })
    }
}

#[async_trait]
impl AirlineDirectory for AviationStackDirectory {
    async fn list_airlines(&self) -> Result<Vec<Airline>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/airlines", self.base_url))
            .query(&[("access_key", self.access_key.expose())])
            .send()
            .await
            .map_err(|e| http::transport_error(PROVIDER_TAG, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| http::transport_error(PROVIDER_TAG, e))?;

        // Errors may arrive with a 200 status, so the envelope wins over the status.
        let parsed: Option<AirlinesResponse> = serde_json::from_str(&body).ok();
        if let Some(error) = parsed.as_ref().and_then(|r| r.error.as_ref()) {
            return Err(error.classify());
        }
        if !status.is_success() {
            return Err(http::status_error(PROVIDER_TAG, status, &body));
        }

        let parsed = parsed.ok_or_else(|| {
            ProviderError::UnknownProviderError(format!("{}: undecodable response", PROVIDER_TAG))
        })?;

        let airlines: Vec<Airline> = parsed
            .data
            .into_iter()
            .filter_map(AirlineEntry::into_airline)
            .collect();
        debug!("{} listed {} airlines", PROVIDER_TAG, airlines.len());
        Ok(airlines)
    }
}

#[derive(Debug, Deserialize)]
struct AirlinesResponse {
    #[serde(default)]
    data: Vec<AirlineEntry>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct AirlineEntry {
    iata_code: Option<String>,
    airline_name: Option<String>,
}

impl AirlineEntry {
    fn into_airline(self) -> Option<Airline> {
        let code = self.iata_code?.trim().to_string();
        if code.is_empty() {
            return None;
        }
        let name = self
            .airline_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| code.clone());
        Some(Airline { code, name })
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    message: String,
}

impl ApiError {
    fn classify(&self) -> ProviderError {
        let message = format!("{}: {} ({})", PROVIDER_TAG, self.message, self.code);
        match self.code.as_str() {
            "usage_limit_reached" | "rate_limit_reached" => ProviderError::RateLimited(message),
            "invalid_access_key" | "missing_access_key" | "inactive_user" => {
                ProviderError::ProviderUnavailable(message)
            }
            _ => ProviderError::UnknownProviderError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farefinder_core::ErrorKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn directory_answering(template: ResponseTemplate) -> (MockServer, AviationStackDirectory) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/airlines"))
            .and(query_param("access_key", "key-1"))
            .respond_with(template)
            .mount(&server)
            .await;
        let config = AviationStackConfig {
            base_url: server.uri(),
            access_key: Secret::from("key-1"),
        };
        let directory = AviationStackDirectory::new(&config, Duration::from_secs(2)).unwrap();
        (server, directory)
    }

    #[tokio::test]
    async fn test_airlines_are_listed() {
        let body = r#"{
            "pagination": {"offset": 0, "limit": 100, "count": 3, "total": 3},
            "data": [
                {"airline_name": "Garuda Indonesia", "iata_code": "GA", "icao_code": "GIA"},
                {"airline_name": "Private owner", "iata_code": null},
                {"airline_name": "", "iata_code": "JT"}
            ]
        }"#;
        let (_server, directory) = directory_answering(ResponseTemplate::new(200).set_body_string(body)).await;

        let airlines = directory.list_airlines().await.unwrap();
        assert_eq!(
            airlines,
            vec![
                Airline { code: "GA".into(), name: "Garuda Indonesia".into() },
                Airline { code: "JT".into(), name: "JT".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_error_envelope_with_ok_status() {
        let body = r#"{"error":{"code":"usage_limit_reached","message":"Your monthly usage limit has been reached."}}"#;
        let (_server, directory) = directory_answering(ResponseTemplate::new(200).set_body_string(body)).await;

        let err = directory.list_airlines().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn test_invalid_key_is_unavailable() {
        let body = r#"{"error":{"code":"invalid_access_key","message":"You have not supplied a valid API Access Key."}}"#;
        let (_server, directory) = directory_answering(ResponseTemplate::new(401).set_body_string(body)).await;

        let err = directory.list_airlines().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    }

    #[tokio::test]
    async fn test_plain_server_error() {
        let (_server, directory) = directory_answering(ResponseTemplate::new(502)).await;
        let err = directory.list_airlines().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    }

    #[tokio::test]
    async fn test_garbage_body() {
        let (_server, directory) =
            directory_answering(ResponseTemplate::new(200).set_body_string("<html></html>")).await;
        let err = directory.list_airlines().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownProviderError);
    }
}
