//! Exercises the full axum router to confirm malformed/type-mismatched
//! request bodies route through `AppError::Validation` and the
//! `{error, code, request_id}` envelope (§7), rather than axum's default
//! plain-text `JsonRejection` response. Grounded in the teacher's
//! `tests/auth_integration_test.rs` `tower::ServiceExt::oneshot` harness.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use kitchensync::entities::user::Role;
use kitchensync::handlers::build_router;
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("response body is valid json")
}

/// spec.md §4.3.1: "booleans are not integers" — a `qty`/`menu_item_id`
/// typed as a JSON boolean must fail `VALIDATION`, not axum's bare
/// `JsonRejection` text response.
#[tokio::test]
async fn type_mismatched_body_fails_validation_with_envelope() {
    let db = common::setup_db().await;
    let state = common::test_app_state(db);
    let token = common::bearer_token(&state, 1, Role::Online);
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/reservations")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(
            r#"{"items":[{"menu_item_id": true, "qty": 1}]}"#,
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION");
    assert!(body["error"].is_string());
    assert!(body["request_id"].is_string());
}

/// Malformed (not-even-valid-JSON) bodies must also fail `VALIDATION` with
/// the standard envelope rather than axum's default rejection body.
#[tokio::test]
async fn malformed_body_fails_validation_with_envelope() {
    let db = common::setup_db().await;
    let state = common::test_app_state(db);
    let token = common::bearer_token(&state, 1, Role::Online);
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/reservations")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from("not json at all"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION");
    assert!(body["request_id"].is_string());
}

/// The request id echoed back on a validation failure matches the
/// caller-supplied `X-Request-Id`, per §7.
#[tokio::test]
async fn validation_failure_echoes_caller_request_id() {
    let db = common::setup_db().await;
    let state = common::test_app_state(db);
    let token = common::bearer_token(&state, 1, Role::Foh);
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/reservations")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("x-request-id", "test-request-id-123")
        .body(Body::from(r#"{"items": []}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("test-request-id-123")
    );

    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION");
    assert_eq!(body["request_id"], "test-request-id-123");
}
