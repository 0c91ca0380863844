//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use messenger_server::config::Settings;
use messenger_server::domain::{DeliveryError, ServerEvent, SessionTransport, UserId};
use messenger_server::startup::{build_router, AppState};

/// Test application over the in-memory backend
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application with fresh in-memory stores
    pub fn new() -> Self {
        let settings = Settings::in_memory().expect("default settings are valid");
        let state = AppState::in_memory(settings.clone());
        Self {
            router: build_router(state.clone(), &settings),
            state,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a request with a JSON body
    pub async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json("POST", uri, body).await
    }

    /// Make a bodiless request with the given method
    pub async fn call(&self, method: &str, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Create a user through the API and return their id
    pub async fn create_user(&self, username: &str) -> UserId {
        let (status, body) = self
            .post_json(
                "/api/v1/users",
                serde_json::json!({ "username": username, "fullname": format!("{} Test", username) }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().parse().unwrap()
    }
}

/// Session transport that records delivered events
#[derive(Debug, Default)]
pub struct RecordingTransport {
    events: Mutex<Vec<ServerEvent>>,
    closed: Mutex<bool>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ServerEvent> {
        self.events.lock().clone()
    }

    pub fn categories(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(ServerEvent::category).collect()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}

impl SessionTransport for RecordingTransport {
    fn send(&self, event: &ServerEvent) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn close(&self) {
        *self.closed.lock() = true;
    }
}
