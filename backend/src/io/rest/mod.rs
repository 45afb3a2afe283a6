//! # REST API
//!
//! axum handlers grouped by resource. Each `*_apis` module exposes a
//! `router()` that is nested under `/api` by [`api_router`].
//!
//! Domain errors become JSON bodies of the form `{"error": "..."}`:
//! missing resources are 404, rejected requests are 400 and storage
//! failures are 500.

pub mod collection_point_apis;
pub mod mappers;
pub mod simulation_apis;
pub mod transaction_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Router,
};
use chrono::{SecondsFormat, Utc};
use shared::{ErrorResponse, HealthResponse};
use tracing::{error, warn};

use crate::domain::DomainError;
use crate::AppState;

/// Routes mounted under `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/points", collection_point_apis::router())
        .nest("/transactions", transaction_apis::router())
        .nest("/simulation", simulation_apis::router())
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Convert a domain error into its HTTP response
pub fn error_response(e: DomainError) -> Response {
    let status = match &e {
        DomainError::NotFound(_) | DomainError::TransactionNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::AlreadyRunning(_)
        | DomainError::NotRunning(_)
        | DomainError::Inactive(_)
        | DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {:#}", e);
        "Internal server error".to_string()
    } else {
        warn!("Request rejected: {}", e);
        e.to_string()
    };

    (status, Json(ErrorResponse::new(message))).into_response()
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::domain::DEFAULT_TICK_INTERVAL;
    use crate::storage::MemoryStore;
    use crate::{create_router, AppState};

    /// Router over a fresh in-memory store, plus the state behind it
    pub fn test_app() -> (Router, AppState) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), store, DEFAULT_TICK_INTERVAL);
        let config = AppConfig::from_lookup(|_| None).expect("Default config should be valid");
        (create_router(state.clone(), &config), state)
    }

    /// Send one request and return the status with the raw body
    pub async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = app.clone().oneshot(request).await.expect("Request failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("Failed to read body");
        (status, bytes.to_vec())
    }

    pub fn parse<T: DeserializeOwned>(body: &[u8]) -> T {
        serde_json::from_slice(body).expect("Response body should be valid JSON")
    }

    /// Create a point through the API and return its id
    pub async fn create_point(app: &Router, id: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/points",
            Some(serde_json::json!({
                "id": id,
                "referenceName": format!("Counter {}", id),
                "vpa": format!("{}@okaxis", id.to_lowercase()),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", String::from_utf8_lossy(&body));
        let response: shared::PointResponse = parse(&body);
        response.point.id
    }
}
