use super::*;
use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::store::MemoryStore;
use crate::types::{FetchOutcome, FetchRequest};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tower::ServiceExt;


/// Stub fetcher with a fixed outcome and optional artificial latency
struct StubFetcher {
    delay: Option<Duration>,
    fail: bool,
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn execute(
        &self,
        _request: &FetchRequest,
    ) -> std::result::Result<FetchOutcome, FetchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(FetchError::InvalidMethod("BROKEN".to_string()));
        }
        Ok(FetchOutcome {
            http_status: "200 OK".to_string(),
            headers: HashMap::new(),
            content_length: Some(42),
        })
    }
}

/// Helper to build a test router over an in-memory store and the given fetcher
fn test_app_with_fetcher(fetcher: Arc<dyn Fetcher>) -> (Router, Arc<TaskService>) {
    let config = Arc::new(Config::default());
    let service = Arc::new(TaskService::new(
        Arc::new(MemoryStore::new()),
        fetcher,
        &config,
    ));
    (create_router(service.clone(), config), service)
}

/// Helper to build a test router with an immediately-succeeding stub fetcher
fn test_app() -> (Router, Arc<TaskService>) {
    test_app_with_fetcher(Arc::new(StubFetcher {
        delay: None,
        fail: false,
    }))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let mut config = Config::default();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let service = Arc::new(TaskService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StubFetcher {
            delay: None,
            fail: false,
        }),
        &config,
    ));

    let api_handle = tokio::spawn({
        let config = config.clone();
        async move { start_api_server(service, config).await }
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    api_handle.abort();

    // The test passes if we got here without panicking
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _service) = test_app();

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = Config::default();
    config.api.cors_enabled = false;
    let config = Arc::new(config);
    let service = Arc::new(TaskService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StubFetcher {
            delay: None,
            fail: false,
        }),
        &config,
    ));
    let app = create_router(service, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be absent when CORS is disabled"
    );
}
