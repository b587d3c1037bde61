// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the gateway REST API against real SQLite storage.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use parlor_chat::{ChatFanout, ChatService};
use parlor_config::model::{ChatConfig, ServerConfig, StorageConfig};
use parlor_core::ChatStorage;
use parlor_gateway::{GatewayState, build_router};
use parlor_storage::SqliteStorage;
use tower::ServiceExt;

const CUSTOMER_TOKEN: &str = "cust-tok";
const ADMIN_TOKEN: &str = "admin-tok";

async fn test_router() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("api.db");
    let storage = SqliteStorage::new(StorageConfig {
        database_path: db_path.to_string_lossy().into_owned(),
        wal_mode: true,
    });
    storage.initialize().await.unwrap();
    let storage: Arc<dyn ChatStorage> = Arc::new(storage);

    let fanout = Arc::new(ChatFanout::new());
    let service = Arc::new(ChatService::new(
        storage,
        fanout.clone(),
        &ChatConfig::default(),
    ));

    let config = ServerConfig {
        customer_token: Some(CUSTOMER_TOKEN.to_string()),
        admin_token: Some(ADMIN_TOKEN.to_string()),
        ..ServerConfig::default()
    };
    (build_router(GatewayState::new(service, fanout, &config)), dir)
}

fn customer_request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {CUSTOMER_TOKEN}"))
        .header("x-user-id", "cust-1")
        .header("content-type", "application/json");
    builder
        .body(body.map_or(Body::empty(), |b| Body::from(b.to_string())))
        .unwrap()
}

fn admin_request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
        .header("x-user-id", "admin-1")
        .header("content-type", "application/json");
    builder
        .body(body.map_or(Body::empty(), |b| Body::from(b.to_string())))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_needs_no_auth() {
    let (router, _dir) = test_router().await;
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn customer_routes_reject_missing_and_wrong_tokens() {
    let (router, _dir) = test_router().await;

    let no_auth = Request::post("/v1/chat/messages")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"body": "hi"}"#))
        .unwrap();
    let response = router.clone().oneshot(no_auth).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The admin token does not open customer routes.
    let wrong = Request::post("/v1/chat/messages")
        .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
        .header("x-user-id", "cust-1")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"body": "hi"}"#))
        .unwrap();
    let response = router.oneshot(wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_body_is_a_bad_request() {
    let (router, _dir) = test_router().await;
    let response = router
        .oneshot(customer_request(
            "POST",
            "/v1/chat/messages",
            Some(r#"{"body": "   "}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_filter_is_a_bad_request() {
    let (router, _dir) = test_router().await;
    let response = router
        .oneshot(admin_request(
            "GET",
            "/v1/admin/sessions?filter=bogus",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_conversation_lifecycle_over_rest() {
    let (router, _dir) = test_router().await;

    // Customer opens the conversation.
    let response = router
        .clone()
        .oneshot(customer_request(
            "POST",
            "/v1/chat/messages",
            Some(r#"{"body": "Hello, my order is missing"}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let message = json_body(response).await;
    let session_id = message["session_id"].as_str().unwrap().to_string();
    assert_eq!(message["sender_role"], "customer");
    assert_eq!(message["seq"], 1);

    // It shows up in the unreplied queue with one unread message.
    let response = router
        .clone()
        .oneshot(admin_request(
            "GET",
            "/v1/admin/sessions?filter=unreplied",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = json_body(response).await;
    assert_eq!(page["pagination"]["total"], 1);
    assert_eq!(page["sessions"][0]["unread_count"], 1);
    assert_eq!(page["sessions"][0]["status"], "pending");

    // Admin replies; the session opens and moves to the replied queue.
    let response = router
        .clone()
        .oneshot(admin_request(
            "POST",
            &format!("/v1/admin/sessions/{session_id}/messages"),
            Some(r#"{"body": "Looking into it now"}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let reply = json_body(response).await;
    let reply_id = reply["id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(admin_request(
            "GET",
            &format!("/v1/admin/sessions/{session_id}"),
            None,
        ))
        .await
        .unwrap();
    let detail = json_body(response).await;
    assert_eq!(detail["session"]["status"], "open");
    assert_eq!(detail["session"]["admin_id"], "admin-1");
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);

    // Customer sees both messages and marks the reply read.
    let response = router
        .clone()
        .oneshot(customer_request("GET", "/v1/chat/messages", None))
        .await
        .unwrap();
    let transcript = json_body(response).await;
    assert_eq!(transcript.as_array().unwrap().len(), 2);

    let response = router
        .clone()
        .oneshot(customer_request("POST", "/v1/chat/read", Some("{}")))
        .await
        .unwrap();
    let marked = json_body(response).await;
    assert_eq!(marked["updated"], 1);

    // Moderation: soft-delete the reply, list the trash, restore it.
    let response = router
        .clone()
        .oneshot(admin_request(
            "DELETE",
            &format!("/v1/admin/sessions/{session_id}/messages/{reply_id}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .clone()
        .oneshot(admin_request(
            "GET",
            &format!("/v1/admin/sessions/{session_id}/deleted-messages"),
            None,
        ))
        .await
        .unwrap();
    let trash = json_body(response).await;
    assert_eq!(trash.as_array().unwrap().len(), 1);

    let response = router
        .clone()
        .oneshot(admin_request(
            "POST",
            &format!("/v1/admin/sessions/{session_id}/messages/{reply_id}/restore"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Close into the trash queue, restore back to open.
    let response = router
        .clone()
        .oneshot(admin_request(
            "POST",
            &format!("/v1/admin/sessions/{session_id}/close"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .clone()
        .oneshot(admin_request("GET", "/v1/admin/sessions?filter=deleted", None))
        .await
        .unwrap();
    let trash_queue = json_body(response).await;
    assert_eq!(trash_queue["pagination"]["total"], 1);

    let response = router
        .clone()
        .oneshot(admin_request(
            "POST",
            &format!("/v1/admin/sessions/{session_id}/restore"),
            None,
        ))
        .await
        .unwrap();
    let restored = json_body(response).await;
    assert_eq!(restored["status"], "open");

    // Permanent deletion removes the session for good.
    let response = router
        .clone()
        .oneshot(admin_request(
            "DELETE",
            &format!("/v1/admin/sessions/{session_id}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(admin_request(
            "GET",
            &format!("/v1/admin/sessions/{session_id}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn replying_to_a_closed_session_conflicts() {
    let (router, _dir) = test_router().await;

    let response = router
        .clone()
        .oneshot(customer_request(
            "POST",
            "/v1/chat/messages",
            Some(r#"{"body": "Hello"}"#),
        ))
        .await
        .unwrap();
    let message = json_body(response).await;
    let session_id = message["session_id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(customer_request("POST", "/v1/chat/close", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(admin_request(
            "POST",
            &format!("/v1/admin/sessions/{session_id}/messages"),
            Some(r#"{"body": "too late"}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (router, _dir) = test_router().await;
    let response = router
        .oneshot(admin_request("GET", "/v1/admin/sessions/ghost", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
