// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Customer routes resolve the caller from the `x-user-id` header; admin
//! routes name sessions by id in the path. Mutating operations run under
//! the configured request timeout and report 504 when it elapses, so
//! clients can decide whether to retry.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use parlor_chat::triage::TriageFilter;
use parlor_core::ChatError;
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Wrapper mapping [`ChatError`] onto HTTP statuses.
pub struct ApiError(pub ChatError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ChatError::NotFound { .. } => StatusCode::NOT_FOUND,
            ChatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ChatError::Conflict(_) => StatusCode::CONFLICT,
            ChatError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError(err)
    }
}

/// Runs a mutating service call under the gateway's bounded timeout.
async fn bounded<T, F>(state: &GatewayState, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ChatError>>,
{
    match tokio::time::timeout(state.request_timeout, fut).await {
        Ok(result) => result.map_err(ApiError),
        Err(_) => Err(ApiError(ChatError::Timeout {
            duration: state.request_timeout,
        })),
    }
}

/// Resolves the caller identity from the `x-user-id` header.
fn user_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            ApiError(ChatError::InvalidInput(
                "missing x-user-id header".to_string(),
            ))
        })
}

// --- Customer handlers ---

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

/// Request body for marking replies read.
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub message_ids: Option<Vec<String>>,
}

/// Response for read-marking operations.
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// POST /v1/chat/messages
pub async fn post_customer_message(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<SendMessageRequest>,
) -> Result<Response, ApiError> {
    let customer_id = user_id(&headers)?;
    let message = bounded(
        &state,
        state.service.send_customer_message(&customer_id, &body.body),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(message)).into_response())
}

/// GET /v1/chat/messages
pub async fn get_customer_messages(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let customer_id = user_id(&headers)?;
    let messages = state.service.list_customer_messages(&customer_id).await?;
    Ok(Json(messages).into_response())
}

/// POST /v1/chat/read
pub async fn post_customer_read(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let customer_id = user_id(&headers)?;
    let updated = bounded(
        &state,
        state
            .service
            .mark_admin_replies_read(&customer_id, body.message_ids.as_deref()),
    )
    .await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// POST /v1/chat/close
pub async fn post_customer_close(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let customer_id = user_id(&headers)?;
    bounded(&state, state.service.close_customer_chat(&customer_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Admin handlers ---

/// Query parameters for the triage listing.
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

/// GET /v1/admin/sessions
pub async fn get_sessions(
    State(state): State<GatewayState>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Response, ApiError> {
    let filter = match query.filter.as_deref() {
        Some(raw) => TriageFilter::from_str(raw).map_err(|_| {
            ApiError(ChatError::InvalidInput(format!(
                "unknown filter `{raw}` (expected all, unreplied, replied, deleted)"
            )))
        })?,
        None => TriageFilter::default(),
    };
    let page = state
        .service
        .list_sessions(filter, query.page, query.limit)
        .await?;
    Ok(Json(page).into_response())
}

/// GET /v1/admin/sessions/{id}
pub async fn get_session_detail(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let detail = state.service.get_session_detail(&session_id).await?;
    Ok(Json(detail).into_response())
}

/// POST /v1/admin/sessions/{id}/messages
pub async fn post_admin_message(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SendMessageRequest>,
) -> Result<Response, ApiError> {
    let admin_id = user_id(&headers)?;
    let message = bounded(
        &state,
        state
            .service
            .send_admin_message(&session_id, &admin_id, &body.body),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(message)).into_response())
}

/// POST /v1/admin/sessions/{id}/read
pub async fn post_session_read(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let updated = bounded(&state, state.service.mark_session_read(&session_id)).await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// POST /v1/admin/sessions/{id}/unread
pub async fn post_session_unread(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    bounded(&state, state.service.mark_session_unread(&session_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/admin/sessions/{id}/messages/{message_id}
pub async fn delete_message(
    State(state): State<GatewayState>,
    Path((session_id, message_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let admin_id = user_id(&headers)?;
    bounded(
        &state,
        state
            .service
            .soft_delete_message(&session_id, &message_id, &admin_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/admin/sessions/{id}/messages/{message_id}/restore
pub async fn restore_message(
    State(state): State<GatewayState>,
    Path((session_id, message_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    bounded(
        &state,
        state.service.restore_message(&session_id, &message_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/admin/sessions/{id}/deleted-messages
pub async fn get_deleted_messages(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let messages = state.service.list_deleted_messages(&session_id).await?;
    Ok(Json(messages).into_response())
}

/// POST /v1/admin/sessions/{id}/close
pub async fn post_session_close(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    bounded(&state, state.service.close_session(&session_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Response for a session restore.
#[derive(Debug, Serialize)]
pub struct RestoreSessionResponse {
    pub status: parlor_core::SessionStatus,
}

/// POST /v1/admin/sessions/{id}/restore
pub async fn post_session_restore(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Json<RestoreSessionResponse>, ApiError> {
    let status = bounded(&state, state.service.restore_session(&session_id)).await?;
    Ok(Json(RestoreSessionResponse { status }))
}

/// DELETE /v1/admin/sessions/{id}
pub async fn delete_session(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    bounded(
        &state,
        state.service.permanently_delete_session(&session_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Public handlers ---

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
