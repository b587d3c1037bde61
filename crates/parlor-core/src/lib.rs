// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parlor support-chat service.
//!
//! This crate provides the error taxonomy, domain types, and the storage
//! trait that the persistence and service crates implement and consume.

pub mod error;
pub mod storage;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ChatError;
pub use storage::ChatStorage;
pub use types::{
    ChatMessage, ChatSession, SenderRole, SessionStatus, SessionUpdate, StampChange, TriageRow,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_error_has_all_variants() {
        let _config = ChatError::Config("test".into());
        let _storage = ChatError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _not_found = ChatError::session_not_found("s1");
        let _invalid = ChatError::InvalidInput("empty body".into());
        let _conflict = ChatError::Conflict("session closed".into());
        let _delivery = ChatError::Delivery("socket gone".into());
        let _timeout = ChatError::Timeout {
            duration: std::time::Duration::from_secs(5),
        };
        let _internal = ChatError::Internal("test".into());
    }

    #[test]
    fn not_found_messages_name_the_entity() {
        let err = ChatError::session_not_found("abc");
        assert_eq!(err.to_string(), "session not found: abc");

        let err = ChatError::message_not_found("m-1");
        assert_eq!(err.to_string(), "message not found: m-1");
    }
}
