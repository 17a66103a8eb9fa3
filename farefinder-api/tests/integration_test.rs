use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate};
use farefinder_api::{airlines::AirlineLookup, app, sessions::SessionRegistry, AppState};
use farefinder_core::{Airline, AirlineDirectory, FlightProvider, ProviderError};
use farefinder_search::stub::{sample_offer, StubProvider};
use farefinder_search::FixedClock;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct StubDirectory(Result<Vec<Airline>, ProviderError>);

#[async_trait]
impl AirlineDirectory for StubDirectory {
    async fn list_airlines(&self) -> Result<Vec<Airline>, ProviderError> {
        self.0.clone()
    }
}

fn test_app(provider: StubProvider, directory: StubDirectory) -> Router {
    let providers: Vec<Arc<dyn FlightProvider>> = vec![Arc::new(provider)];
    let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let sessions = SessionRegistry::new(providers, Duration::minutes(30))
        .unwrap()
        .with_clock(Arc::new(FixedClock(today)));

    app(AppState {
        sessions: Arc::new(sessions),
        airlines: Arc::new(AirlineLookup::new(Arc::new(directory))),
    })
}

fn no_airlines() -> StubDirectory {
    StubDirectory(Ok(vec![]))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = call(app, "POST", "/v1/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["sessionId"].as_str().unwrap().to_string()
}

fn cgk_dps() -> Value {
    json!({
        "origin": "cgk",
        "destination": "DPS",
        "departureDate": "2024-06-01",
        "passengers": 1
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app(StubProvider::new("stub"), no_airlines());
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_search_flow() {
    let provider = StubProvider::returning(
        "stub",
        vec![sample_offer("stub", "1", "1250000.50"), sample_offer("stub", "2", "980000")],
    );
    let app = test_app(provider, no_airlines());
    let id = new_session(&app).await;

    let (status, body) = call(&app, "GET", &format!("/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Idle");
    assert_eq!(body["loading"], false);
    assert_eq!(body["history"], json!([]));

    let (status, body) = call(&app, "POST", &format!("/v1/sessions/{}/search", id), Some(cgk_dps())).await;
    assert_eq!(status, StatusCode::OK);
    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 2);
    assert_eq!(offers[0]["price"]["total"], "1250000.50");

    let (_, snapshot) = call(&app, "GET", &format!("/v1/sessions/{}", id), None).await;
    assert_eq!(snapshot["status"], "Succeeded");
    assert_eq!(snapshot["results"].as_array().unwrap().len(), 2);
    assert!(snapshot.get("error").is_none());
    assert_eq!(snapshot["history"][0]["origin"], "CGK");
}

#[tokio::test]
async fn test_validation_error_leaves_session_untouched() {
    let app = test_app(StubProvider::new("stub"), no_airlines());
    let id = new_session(&app).await;

    let mut params = cgk_dps();
    params["destination"] = json!("CGK");
    let (status, body) = call(&app, "POST", &format!("/v1/sessions/{}/search", id), Some(params)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, snapshot) = call(&app, "GET", &format!("/v1/sessions/{}", id), None).await;
    assert_eq!(snapshot["status"], "Idle");
    assert_eq!(snapshot["history"], json!([]));
}

#[tokio::test]
async fn test_provider_errors_map_to_status() {
    let provider = StubProvider::failing("stub", ProviderError::RateLimited("slow down".to_string()));
    let app = test_app(provider, no_airlines());
    let id = new_session(&app).await;

    let (status, body) = call(&app, "POST", &format!("/v1/sessions/{}/search", id), Some(cgk_dps())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["kind"], "RateLimited");

    let (_, snapshot) = call(&app, "GET", &format!("/v1/sessions/{}", id), None).await;
    assert_eq!(snapshot["status"], "Failed");
    assert_eq!(snapshot["error"]["kind"], "RateLimited");
    assert_eq!(snapshot["results"], json!([]));
    assert_eq!(snapshot["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_retry_and_clear() {
    let provider = StubProvider::failing("stub", ProviderError::ProviderUnavailable("down".to_string()))
        .then(Ok(vec![sample_offer("stub", "1", "100")]));
    let app = test_app(provider, no_airlines());
    let id = new_session(&app).await;

    // Nothing to retry yet
    let (status, snapshot) = call(&app, "POST", &format!("/v1/sessions/{}/retry", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["status"], "Idle");

    let (status, _) = call(&app, "POST", &format!("/v1/sessions/{}/search", id), Some(cgk_dps())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, snapshot) = call(&app, "POST", &format!("/v1/sessions/{}/retry", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["status"], "Succeeded");
    assert_eq!(snapshot["results"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["history"].as_array().unwrap().len(), 2);

    let (status, snapshot) = call(&app, "DELETE", &format!("/v1/sessions/{}/results", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["status"], "Idle");
    assert_eq!(snapshot["results"], json!([]));
    // Clearing keeps history
    assert_eq!(snapshot["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_and_ended_sessions() {
    let app = test_app(StubProvider::new("stub"), no_airlines());

    let missing = uuid::Uuid::new_v4();
    let (status, _) = call(&app, "GET", &format!("/v1/sessions/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "POST", &format!("/v1/sessions/{}/search", missing), Some(cgk_dps())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = new_session(&app).await;
    let (status, _) = call(&app, "DELETE", &format!("/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", &format!("/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_airlines_success() {
    let directory = StubDirectory(Ok(vec![Airline {
        code: "GA".to_string(),
        name: "Garuda Indonesia".to_string(),
    }]));
    let app = test_app(StubProvider::new("stub"), directory);

    let (status, body) = call(&app, "GET", "/v1/airlines", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["airlines"][0]["code"], "GA");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_airlines_failure_is_generic() {
    let directory = StubDirectory(Err(ProviderError::ProviderUnavailable(
        "invalid_access_key".to_string(),
    )));
    let app = test_app(StubProvider::new("stub"), directory);

    let (status, body) = call(&app, "GET", "/v1/airlines", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Airline service unavailable");
    assert!(body.get("airlines").is_none());
}
