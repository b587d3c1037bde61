// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler for live chat delivery.
//!
//! Clients connect with `/ws?role=customer|admin&user_id=...&token=...`
//! (auth happens during the handshake, not via middleware). Customers are
//! joined to their own room; admins join the session-list room and may
//! watch individual sessions.
//!
//! Client -> Server (JSON):
//! ```json
//! {"type": "send_message", "body": "Hello"}
//! {"type": "send_message", "session_id": "…", "body": "Hi"}   // admin
//! {"type": "watch_session", "session_id": "…"}                 // admin
//! {"type": "unwatch_session", "session_id": "…"}               // admin
//! ```
//!
//! Server -> Client events are the fanout's `new_customer_message`,
//! `new_admin_message`, and `delivery_error` payloads. Delivery is
//! best-effort: a client that was disconnected re-fetches the transcript
//! over REST on reconnect.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::server::GatewayState;

/// Connection parameters presented during the handshake.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub role: WsRole,
    pub user_id: String,
    #[serde(default)]
    pub token: Option<String>,
}

/// Which side of the conversation this socket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WsRole {
    Customer,
    Admin,
}

/// WebSocket command from a client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand {
    SendMessage {
        body: String,
        #[serde(default)]
        session_id: Option<String>,
    },
    WatchSession {
        session_id: String,
    },
    UnwatchSession {
        session_id: String,
    },
}

/// WebSocket upgrade handler.
///
/// Validates the role-scoped bearer before upgrading, then spawns the
/// socket loop.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<GatewayState>,
) -> Response {
    let authorized = match params.role {
        WsRole::Customer => state.auth.check_customer(params.token.as_deref()),
        WsRole::Admin => state.auth.check_admin(params.token.as_deref()),
    };
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if params.user_id.trim().is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

/// Handle an individual WebSocket connection.
///
/// Spawns a sender task forwarding fanout payloads to the socket, then
/// reads commands from the client until it disconnects.
async fn handle_socket(socket: WebSocket, state: GatewayState, params: WsParams) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let conn_id = uuid::Uuid::new_v4().to_string();

    let (tx, mut rx) = mpsc::channel::<String>(64);
    state.fanout.register(&conn_id, tx);
    match params.role {
        WsRole::Customer => state.fanout.join_customer(&params.user_id, &conn_id),
        WsRole::Admin => state.fanout.join_admin_list(&conn_id),
    }
    tracing::debug!(
        conn_id = conn_id.as_str(),
        user_id = params.user_id.as_str(),
        role = ?params.role,
        "websocket connected"
    );

    // Forward fanout payloads to the socket.
    let sender_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // Read commands from the client.
    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let text_str: &str = &text;
                let command: WsCommand = match serde_json::from_str(text_str) {
                    Ok(command) => command,
                    Err(e) => {
                        state
                            .fanout
                            .notify_delivery_error(&conn_id, &format!("malformed payload: {e}"));
                        continue;
                    }
                };
                handle_command(&state, &params, &conn_id, command).await;
            }
            Message::Close(_) => break,
            _ => {} // Ignore binary, ping (handled by the protocol layer)
        }
    }

    // Cleanup.
    state.fanout.unregister(&conn_id);
    sender_task.abort();
    tracing::debug!(conn_id = conn_id.as_str(), "websocket disconnected");
}

/// Dispatches one client command through the chat service.
///
/// Failures never tear down the socket; they come back to the sender alone
/// as a `delivery_error` event. The underlying write, when one happened,
/// has already committed and been fanned out.
async fn handle_command(
    state: &GatewayState,
    params: &WsParams,
    conn_id: &str,
    command: WsCommand,
) {
    let result = match (params.role, command) {
        (WsRole::Customer, WsCommand::SendMessage { body, .. }) => state
            .service
            .send_customer_message(&params.user_id, &body)
            .await
            .map(drop),
        (WsRole::Admin, WsCommand::SendMessage { body, session_id }) => match session_id {
            Some(session_id) => state
                .service
                .send_admin_message(&session_id, &params.user_id, &body)
                .await
                .map(drop),
            None => Err(parlor_core::ChatError::InvalidInput(
                "admin send_message requires session_id".to_string(),
            )),
        },
        (WsRole::Admin, WsCommand::WatchSession { session_id }) => {
            state.fanout.watch_session(&session_id, conn_id);
            Ok(())
        }
        (WsRole::Admin, WsCommand::UnwatchSession { session_id }) => {
            state.fanout.unwatch_session(&session_id, conn_id);
            Ok(())
        }
        (WsRole::Customer, WsCommand::WatchSession { .. })
        | (WsRole::Customer, WsCommand::UnwatchSession { .. }) => Err(
            parlor_core::ChatError::InvalidInput("customers cannot watch sessions".to_string()),
        ),
    };

    if let Err(e) = result {
        state.fanout.notify_delivery_error(conn_id, &e.to_string());
    }
}
