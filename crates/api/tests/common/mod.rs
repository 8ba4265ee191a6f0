#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use wardwatch_api::config::ServerConfig;
use wardwatch_api::router::build_app_router;
use wardwatch_api::state::AppState;
use wardwatch_api::ws::WsManager;
use wardwatch_core::store::InMemoryPatientStore;
use wardwatch_core::thresholds::ThresholdTable;
use wardwatch_events::EventBus;
use wardwatch_worker::TriageMonitor;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryPatientStore>,
    pub monitor: Arc<TriageMonitor>,
    pub event_bus: Arc<EventBus>,
}

/// Build the full application router over an in-memory store, with the same
/// middleware stack production uses.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(InMemoryPatientStore::new());
    let event_bus = Arc::new(EventBus::default());
    let monitor = Arc::new(
        TriageMonitor::new(store.clone(), ThresholdTable::default())
            .with_event_bus(Arc::clone(&event_bus)),
    );

    let state = AppState {
        store: store.clone(),
        monitor: Arc::clone(&monitor),
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::clone(&event_bus),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        monitor,
        event_bus,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
