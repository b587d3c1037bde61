// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parlor support-chat service.

use thiserror::Error;

/// The primary error type used across all Parlor crates.
///
/// Variants map onto caller-visible outcomes: `NotFound` and `InvalidInput`
/// are terminal for the request, `Timeout` is retryable, and `Delivery` is
/// advisory only (the underlying write has already committed).
#[derive(Debug, Error)]
pub enum ChatError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A session or message id did not resolve.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Empty or oversized message body, malformed id.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation is not defined for the session's current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A live-delivery publish could not reach a subscriber. Never fails the
    /// underlying write; surfaced to the sender as an advisory event.
    #[error("delivery failure: {0}")]
    Delivery(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Shorthand for a missing session.
    pub fn session_not_found(id: impl Into<String>) -> Self {
        ChatError::NotFound {
            entity: "session",
            id: id.into(),
        }
    }

    /// Shorthand for a missing message.
    pub fn message_not_found(id: impl Into<String>) -> Self {
        ChatError::NotFound {
            entity: "message",
            id: id.into(),
        }
    }
}
