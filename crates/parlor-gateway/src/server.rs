// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use parlor_chat::{ChatFanout, ChatService};
use parlor_config::model::ServerConfig;
use parlor_core::ChatError;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{AuthConfig, admin_auth, customer_auth};
use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The chat service every handler routes through.
    pub service: Arc<ChatService>,
    /// Live delivery registry, shared with the service.
    pub fanout: Arc<ChatFanout>,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Bounded timeout for mutating requests.
    pub request_timeout: Duration,
    /// Process start time for uptime reporting.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(
        service: Arc<ChatService>,
        fanout: Arc<ChatFanout>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            service,
            fanout,
            auth: AuthConfig {
                customer_token: config.customer_token.clone(),
                admin_token: config.admin_token.clone(),
            },
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            start_time: Instant::now(),
        }
    }
}

/// Builds the gateway router: public health, authenticated customer and
/// admin APIs, and the WebSocket endpoint.
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let customer_routes = Router::new()
        .route(
            "/v1/chat/messages",
            post(handlers::post_customer_message).get(handlers::get_customer_messages),
        )
        .route("/v1/chat/read", post(handlers::post_customer_read))
        .route("/v1/chat/close", post(handlers::post_customer_close))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            customer_auth,
        ))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/v1/admin/sessions", get(handlers::get_sessions))
        .route(
            "/v1/admin/sessions/{id}",
            get(handlers::get_session_detail).delete(handlers::delete_session),
        )
        .route(
            "/v1/admin/sessions/{id}/messages",
            post(handlers::post_admin_message),
        )
        .route(
            "/v1/admin/sessions/{id}/read",
            post(handlers::post_session_read),
        )
        .route(
            "/v1/admin/sessions/{id}/unread",
            post(handlers::post_session_unread),
        )
        .route(
            "/v1/admin/sessions/{id}/messages/{message_id}",
            delete(handlers::delete_message),
        )
        .route(
            "/v1/admin/sessions/{id}/messages/{message_id}/restore",
            post(handlers::restore_message),
        )
        .route(
            "/v1/admin/sessions/{id}/deleted-messages",
            get(handlers::get_deleted_messages),
        )
        .route(
            "/v1/admin/sessions/{id}/close",
            post(handlers::post_session_close),
        )
        .route(
            "/v1/admin/sessions/{id}/restore",
            post(handlers::post_session_restore),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            admin_auth,
        ))
        .with_state(state.clone());

    // WebSocket route (auth happens during the handshake, not via middleware).
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(customer_routes)
        .merge(admin_routes)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the gateway HTTP/WebSocket server.
///
/// Serves until the cancellation token fires, then shuts down gracefully.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), ChatError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ChatError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| ChatError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_config::model::ChatConfig;

    #[test]
    fn gateway_state_is_clone() {
        let fanout = Arc::new(ChatFanout::new());
        let storage: Arc<dyn parlor_core::ChatStorage> = Arc::new(
            parlor_storage::SqliteStorage::new(parlor_config::model::StorageConfig {
                database_path: "unused.db".to_string(),
                wal_mode: true,
            }),
        );
        let service = Arc::new(ChatService::new(
            storage,
            fanout.clone(),
            &ChatConfig::default(),
        ));
        let state = GatewayState::new(service, fanout, &ServerConfig::default());
        let _cloned = state.clone();
        assert_eq!(state.request_timeout, Duration::from_secs(5));
    }
}
