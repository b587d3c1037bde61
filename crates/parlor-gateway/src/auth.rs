// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication for the gateway.
//!
//! Customer and admin routes carry separate tokens. When a scope has no
//! token configured, every request to it is rejected (fail-closed). Token
//! issuance itself lives outside this service; callers present whatever
//! bearer their auth layer minted.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Authentication configuration for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token for customer routes.
    pub customer_token: Option<String>,
    /// Expected bearer token for admin routes.
    pub admin_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "customer_token",
                &self.customer_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "admin_token",
                &self.admin_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl AuthConfig {
    /// Validates a presented bearer against the customer scope.
    pub fn check_customer(&self, bearer: Option<&str>) -> bool {
        check_scope(self.customer_token.as_deref(), bearer)
    }

    /// Validates a presented bearer against the admin scope.
    pub fn check_admin(&self, bearer: Option<&str>) -> bool {
        check_scope(self.admin_token.as_deref(), bearer)
    }
}

fn check_scope(expected: Option<&str>, presented: Option<&str>) -> bool {
    match (expected, presented) {
        (Some(expected), Some(presented)) => expected == presented,
        // No token configured for the scope: fail-closed.
        _ => false,
    }
}

/// Middleware guarding customer routes.
pub async fn customer_auth(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth.customer_token.is_none() {
        tracing::error!("no customer token configured -- rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    }
    if auth.check_customer(bearer_from(&request)) {
        return Ok(next.run(request).await);
    }
    Err(StatusCode::UNAUTHORIZED)
}

/// Middleware guarding admin routes.
pub async fn admin_auth(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth.admin_token.is_none() {
        tracing::error!("no admin token configured -- rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    }
    if auth.check_admin(bearer_from(&request)) {
        return Ok(next.run(request).await);
    }
    Err(StatusCode::UNAUTHORIZED)
}

fn bearer_from(request: &Request) -> Option<&str> {
    request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
