// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage trait for session and message persistence backends.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::{ChatMessage, ChatSession, SenderRole, SessionUpdate, TriageRow};

/// Persistence seam for the session store and message ledger.
///
/// All mutation goes through this trait so the status patch computed by the
/// state machine and the ledger change derived from the same event commit
/// together. Implementations must apply the `SessionUpdate` passed to
/// [`append_message`](ChatStorage::append_message) and
/// [`mark_messages_read`](ChatStorage::mark_messages_read) in the same
/// transaction as the message write.
#[async_trait]
pub trait ChatStorage: Send + Sync {
    /// Opens the backend and runs any pending migrations.
    async fn initialize(&self) -> Result<(), ChatError>;

    /// Flushes pending writes and releases connections.
    async fn close(&self) -> Result<(), ChatError>;

    /// Inserts a new session together with its first message, atomically.
    async fn create_session_with_message(
        &self,
        session: &ChatSession,
        message: &ChatMessage,
    ) -> Result<(), ChatError>;

    /// Fetches a session by id.
    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>, ChatError>;

    /// Finds the customer's non-closed session, if any. When the
    /// one-active-session invariant has been violated by a race, the most
    /// recently updated session is returned as canonical.
    async fn find_active_session(
        &self,
        customer_id: &str,
    ) -> Result<Option<ChatSession>, ChatError>;

    /// Finds the customer's most recent session regardless of status.
    async fn find_latest_session(
        &self,
        customer_id: &str,
    ) -> Result<Option<ChatSession>, ChatError>;

    /// Appends a message to the session's ledger and applies the session
    /// patch in one transaction. Returns the assigned sequence number.
    async fn append_message(
        &self,
        message: &ChatMessage,
        update: &SessionUpdate,
    ) -> Result<i64, ChatError>;

    /// Applies a session patch on its own (close, restore, viewed flips).
    async fn apply_session_update(
        &self,
        session_id: &str,
        update: &SessionUpdate,
    ) -> Result<(), ChatError>;

    /// Messages with `deleted = false`, in chronological (sequence) order.
    async fn list_visible_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, ChatError>;

    /// Messages with `deleted = true`, in chronological (sequence) order.
    async fn list_deleted_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, ChatError>;

    /// Marks a message deleted. Re-deleting an already-deleted message
    /// overwrites `deleted_at`/`deleted_by` rather than failing.
    async fn soft_delete_message(
        &self,
        session_id: &str,
        message_id: &str,
        deleted_by: &str,
    ) -> Result<(), ChatError>;

    /// Clears the deleted flag and its audit fields.
    async fn restore_message(&self, session_id: &str, message_id: &str)
    -> Result<(), ChatError>;

    /// Sets `read = true` on unread messages authored by `sender_role`,
    /// optionally limited to an explicit id set, and applies the session
    /// patch in the same transaction. Returns the number of flipped rows.
    async fn mark_messages_read(
        &self,
        session_id: &str,
        sender_role: SenderRole,
        message_ids: Option<&[String]>,
        update: &SessionUpdate,
    ) -> Result<u64, ChatError>;

    /// Whether the session's ledger contains any admin message, deleted or
    /// not. Drives the reaper predicate and the restore target state.
    async fn has_admin_message(&self, session_id: &str) -> Result<bool, ChatError>;

    /// Projection rows for the admin triage view: closed sessions when
    /// `closed` is true, otherwise pending/open sessions. Only sessions with
    /// at least one stored message are returned.
    async fn list_triage(&self, closed: bool) -> Result<Vec<TriageRow>, ChatError>;

    /// Ids of pending sessions with no admin message whose last customer
    /// activity (falling back to the newest message timestamp) predates
    /// `cutoff`.
    async fn list_stale_pending(&self, cutoff: &str) -> Result<Vec<String>, ChatError>;

    /// Permanently removes messages soft-deleted before `cutoff`. Returns
    /// the number of purged rows; running twice with no new deletions in
    /// between deletes nothing the second time.
    async fn purge_deleted_before(&self, cutoff: &str) -> Result<u64, ChatError>;

    /// Removes a session and all of its messages atomically.
    async fn delete_session(&self, session_id: &str) -> Result<(), ChatError>;
}
