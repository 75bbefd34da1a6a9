//! Tests for router construction and the server lifecycle.

use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use serial_test::serial;
use std::fs;
use tower::ServiceExt;

fn state_from(contents: &str) -> AppState {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(&path, contents).unwrap();
    AppState::new(Settings::load(&path).unwrap())
}

fn default_state() -> AppState {
    state_from("")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Router
// ============================================================================

#[tokio::test]
#[serial]
async fn test_health_returns_success_envelope() {
    let app = create_router(default_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Success");
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["environment"], "local");
}

#[tokio::test]
#[serial]
async fn test_unknown_route_returns_404() {
    let app = create_router(default_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/no-such-route")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_basic_auth_rejects_missing_credentials() {
    let app = state_from("BASIC_AUTH_USER=admin\nBASIC_AUTH_PASS=secret\n");
    let app = create_router(app);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_basic_auth_accepts_valid_credentials() {
    let state = state_from("BASIC_AUTH_USER=admin\nBASIC_AUTH_PASS=secret\n");
    let app = create_router(state);

    // base64("admin:secret")
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("authorization", "Basic YWRtaW46c2VjcmV0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn test_get_only_rejects_other_methods() {
    let state = state_from("HTTP_GET_ONLY=true\n");
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Method Not Allowed");
    assert_eq!(body["code"], 405);
}

#[tokio::test]
#[serial]
async fn test_server_header_applied_when_configured() {
    let state = state_from("HTTP_SERVER_HEADER=visitd\n");
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers().get(header::SERVER).unwrap(), "visitd");
}

#[tokio::test]
#[serial]
async fn test_request_id_echoed_in_response() {
    let state = state_from("MW_REQUESTID_ENABLED=true\n");
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "test-correlation-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-correlation-id"
    );
}

/// A concurrency setting of zero means unlimited, not a zero-permit
/// semaphore that would stall every request.
#[tokio::test]
#[serial]
async fn test_zero_concurrency_does_not_stall_requests() {
    let state = state_from("HTTP_CONCURRENCY=0\n");
    let app = create_router(state);

    let response = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        app.oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        ),
    )
    .await
    .expect("request should complete when the concurrency limit is unset")
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// A body limit of zero means unlimited, not reject-every-body.
#[tokio::test]
#[serial]
async fn test_zero_body_limit_accepts_request_bodies() {
    let state = state_from("HTTP_BODY_LIMIT=0\n");
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("content-length", "11")
                .body(Body::from("hello world"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// A positive body limit still rejects oversized bodies.
#[tokio::test]
#[serial]
async fn test_body_limit_rejects_oversized_bodies() {
    let state = state_from("HTTP_BODY_LIMIT=5\n");
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("content-length", "11")
                .body(Body::from("hello world"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Serving stops cleanly when the shutdown future resolves.
#[tokio::test]
#[serial]
async fn test_serve_with_shutdown_completes() {
    let state = default_state();
    let app = create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve_with_shutdown(listener, app, async {
        let _ = rx.await;
    }));

    tx.send(()).unwrap();
    let result = server.await.unwrap();
    assert!(result.is_ok());
}

/// Binding a port that is already taken surfaces as `BindFailed`.
#[tokio::test]
#[serial]
async fn test_start_server_reports_bind_failure() {
    let holder = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = holder.local_addr().unwrap().port();

    let state = state_from(&format!("SERVER_HOST=127.0.0.1\nSERVER_PORT={port}\n"));
    let result = start_server(state).await;

    match result {
        Err(ServiceError::BindFailed { address, .. }) => {
            assert_eq!(address, format!("127.0.0.1:{port}"));
        }
        other => panic!("expected BindFailed, got {other:?}"),
    }
}
