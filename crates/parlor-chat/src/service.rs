// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat service: every customer- and admin-facing operation.
//!
//! All writes resolve the session, run the event through the state machine,
//! and hand the resulting patch to storage together with the ledger change.
//! Live-delivery publishes happen after the commit and never affect its
//! outcome.

use std::sync::Arc;

use parlor_config::model::ChatConfig;
use parlor_core::types::{
    ChatMessage, ChatSession, SenderRole, SessionStatus, SessionUpdate, StampChange,
};
use parlor_core::{ChatError, ChatStorage};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock;
use crate::fanout::ChatFanout;
use crate::transition::{SessionEvent, transition};
use crate::triage::{self, TriageFilter, TriagePage};

/// A session plus its visible transcript, as rendered to admins.
#[derive(Debug, serde::Serialize)]
pub struct SessionDetail {
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}

/// Coordinates the session store, the state machine, and the live fanout.
pub struct ChatService {
    storage: Arc<dyn ChatStorage>,
    fanout: Arc<ChatFanout>,
    max_body_len: usize,
}

impl ChatService {
    pub fn new(
        storage: Arc<dyn ChatStorage>,
        fanout: Arc<ChatFanout>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            storage,
            fanout,
            max_body_len: config.max_body_len,
        }
    }

    /// Trims and bounds a message body before it reaches the state machine.
    fn validate_body(&self, body: &str) -> Result<String, ChatError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(ChatError::InvalidInput(
                "message body must not be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > self.max_body_len {
            return Err(ChatError::InvalidInput(format!(
                "message body exceeds {} characters",
                self.max_body_len
            )));
        }
        Ok(trimmed.to_string())
    }

    fn build_message(
        session_id: &str,
        sender_id: &str,
        sender_role: SenderRole,
        body: String,
    ) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            seq: 0,
            sender_id: sender_id.to_string(),
            sender_role,
            body,
            read: false,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
            created_at: clock::now(),
        }
    }

    // --- Customer operations ---

    /// Appends a customer message, lazily creating the session.
    ///
    /// A customer with no pending/open session gets a fresh `Pending` one
    /// containing this message; otherwise the existing session is reused,
    /// never duplicated.
    pub async fn send_customer_message(
        &self,
        customer_id: &str,
        body: &str,
    ) -> Result<ChatMessage, ChatError> {
        let body = self.validate_body(body)?;

        let (session_id, mut message) = match self.storage.find_active_session(customer_id).await? {
            Some(session) => {
                let update = transition(session.status, &SessionEvent::CustomerMessage)?;
                let mut message =
                    Self::build_message(&session.id, customer_id, SenderRole::Customer, body);
                message.seq = self.storage.append_message(&message, &update).await?;
                (session.id, message)
            }
            None => {
                let now = clock::now();
                let session = ChatSession {
                    id: Uuid::new_v4().to_string(),
                    customer_id: customer_id.to_string(),
                    admin_id: None,
                    status: SessionStatus::Pending,
                    viewed: false,
                    viewed_at: None,
                    last_customer_message_at: Some(now.clone()),
                    created_at: now.clone(),
                    updated_at: now,
                };
                let mut message =
                    Self::build_message(&session.id, customer_id, SenderRole::Customer, body);
                self.storage
                    .create_session_with_message(&session, &message)
                    .await?;
                message.seq = 1;
                info!(
                    session_id = session.id.as_str(),
                    customer_id, "session created by first customer message"
                );
                (session.id, message)
            }
        };

        self.fanout
            .publish_customer_message(&session_id, customer_id, &message);
        Ok(message)
    }

    /// The customer's visible transcript, from their most recent session
    /// (closed sessions included so history survives a close).
    pub async fn list_customer_messages(
        &self,
        customer_id: &str,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        match self.storage.find_latest_session(customer_id).await? {
            Some(session) => self.storage.list_visible_messages(&session.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Marks admin replies as read by the customer, all of them or an
    /// explicit id set. Returns the number of newly read messages.
    pub async fn mark_admin_replies_read(
        &self,
        customer_id: &str,
        message_ids: Option<&[String]>,
    ) -> Result<u64, ChatError> {
        let session = self
            .storage
            .find_latest_session(customer_id)
            .await?
            .ok_or_else(|| ChatError::session_not_found(customer_id))?;
        self.storage
            .mark_messages_read(
                &session.id,
                SenderRole::Admin,
                message_ids,
                &SessionUpdate::default(),
            )
            .await
    }

    /// Closes the customer's active session.
    pub async fn close_customer_chat(&self, customer_id: &str) -> Result<(), ChatError> {
        let session = self
            .storage
            .find_active_session(customer_id)
            .await?
            .ok_or_else(|| ChatError::session_not_found(customer_id))?;
        let update = transition(session.status, &SessionEvent::Close)?;
        self.storage.apply_session_update(&session.id, &update).await
    }

    // --- Admin operations ---

    /// Appends an admin reply, transitioning the session to `Open` and
    /// claiming it for the sender.
    pub async fn send_admin_message(
        &self,
        session_id: &str,
        admin_id: &str,
        body: &str,
    ) -> Result<ChatMessage, ChatError> {
        let body = self.validate_body(body)?;
        let session = self.require_session(session_id).await?;
        let update = transition(
            session.status,
            &SessionEvent::AdminMessage {
                admin_id: admin_id.to_string(),
            },
        )?;

        let mut message = Self::build_message(session_id, admin_id, SenderRole::Admin, body);
        message.seq = self.storage.append_message(&message, &update).await?;

        self.fanout
            .publish_admin_message(session_id, &session.customer_id, &message);
        Ok(message)
    }

    /// One page of the requested triage queue.
    pub async fn list_sessions(
        &self,
        filter: TriageFilter,
        page: u64,
        limit: u64,
    ) -> Result<TriagePage, ChatError> {
        let rows = self.storage.list_triage(filter.is_closed_queue()).await?;
        Ok(triage::project(rows, filter, page, limit))
    }

    /// A session with its visible transcript.
    pub async fn get_session_detail(&self, session_id: &str) -> Result<SessionDetail, ChatError> {
        let session = self.require_session(session_id).await?;
        let messages = self.storage.list_visible_messages(session_id).await?;
        Ok(SessionDetail { session, messages })
    }

    /// Admin reads the session: customer messages become read and the
    /// session is flagged viewed. Returns the number of newly read messages.
    pub async fn mark_session_read(&self, session_id: &str) -> Result<u64, ChatError> {
        self.storage
            .mark_messages_read(
                session_id,
                SenderRole::Customer,
                None,
                &SessionUpdate {
                    viewed: Some(true),
                    viewed_at: StampChange::SetNow,
                    ..SessionUpdate::default()
                },
            )
            .await
    }

    /// Flags the session unviewed again, clearing the viewed stamp.
    pub async fn mark_session_unread(&self, session_id: &str) -> Result<(), ChatError> {
        self.storage
            .apply_session_update(
                session_id,
                &SessionUpdate {
                    viewed: Some(false),
                    viewed_at: StampChange::Clear,
                    ..SessionUpdate::default()
                },
            )
            .await
    }

    /// Hides a message from the transcript; it stays addressable for
    /// restore until the retention purger removes it.
    pub async fn soft_delete_message(
        &self,
        session_id: &str,
        message_id: &str,
        admin_id: &str,
    ) -> Result<(), ChatError> {
        self.require_session(session_id).await?;
        self.storage
            .soft_delete_message(session_id, message_id, admin_id)
            .await?;
        debug!(session_id, message_id, admin_id, "message soft-deleted");
        Ok(())
    }

    /// Puts a soft-deleted message back at its original chronological position.
    pub async fn restore_message(
        &self,
        session_id: &str,
        message_id: &str,
    ) -> Result<(), ChatError> {
        self.require_session(session_id).await?;
        self.storage.restore_message(session_id, message_id).await
    }

    /// The session's trash: soft-deleted messages awaiting restore or purge.
    pub async fn list_deleted_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.require_session(session_id).await?;
        self.storage.list_deleted_messages(session_id).await
    }

    /// Closes a session, moving it to the trash queue.
    pub async fn close_session(&self, session_id: &str) -> Result<(), ChatError> {
        let session = self.require_session(session_id).await?;
        let update = transition(session.status, &SessionEvent::Close)?;
        self.storage.apply_session_update(session_id, &update).await?;
        info!(session_id, "session closed");
        Ok(())
    }

    /// Restores a closed session: `Open` when an admin message survives in
    /// the ledger, otherwise back to `Pending`. Returns the new status.
    pub async fn restore_session(&self, session_id: &str) -> Result<SessionStatus, ChatError> {
        let session = self.require_session(session_id).await?;
        let has_admin_message = self.storage.has_admin_message(session_id).await?;
        let update = transition(
            session.status,
            &SessionEvent::Restore { has_admin_message },
        )?;
        self.storage.apply_session_update(session_id, &update).await?;
        let status = update.status.unwrap_or(session.status);
        info!(session_id, status = %status, "session restored");
        Ok(status)
    }

    /// Removes the session and its entire ledger. Irreversible.
    pub async fn permanently_delete_session(&self, session_id: &str) -> Result<(), ChatError> {
        self.storage.delete_session(session_id).await?;
        info!(session_id, "session permanently deleted");
        Ok(())
    }

    async fn require_session(&self, session_id: &str) -> Result<ChatSession, ChatError> {
        self.storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| ChatError::session_not_found(session_id))
    }
}
