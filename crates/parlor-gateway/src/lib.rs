// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Parlor support-chat service.
//!
//! REST handlers cover the customer and admin operation surfaces; the
//! `/ws` endpoint delivers live events through the injected
//! [`parlor_chat::ChatFanout`]. Authentication is bearer-token per scope,
//! fail-closed.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::AuthConfig;
pub use server::{GatewayState, build_router, start_server};
