// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Parlor workspace.
//!
//! Timestamps are RFC 3339 UTC strings with millisecond precision, matching
//! what SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` produces. The
//! format sorts lexicographically, which the reaper and purger rely on.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a chat session.
///
/// Transitions are monotonic (`Pending -> Open -> Closed`) except for the
/// explicit restore path out of `Closed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Customer has written, no admin has replied yet.
    Pending,
    /// At least one admin reply has been appended.
    Open,
    /// Closed by an admin, the customer, or the inactivity reaper.
    Closed,
}

/// Which side of the conversation authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    Customer,
    Admin,
}

/// A support conversation between one customer and (eventually) an admin.
///
/// At most one non-closed session exists per customer at a time. Sessions
/// are only ever created as a side effect of the first customer message,
/// never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub customer_id: String,
    /// Set on the first admin reply; the last admin to reply owns the field.
    pub admin_id: Option<String>,
    pub status: SessionStatus,
    /// True once an admin has read the session since the last customer activity.
    pub viewed: bool,
    pub viewed_at: Option<String>,
    /// Drives the inactivity reaper; updated on every customer message.
    pub last_customer_message_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One message inside a session's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    /// Monotonic per-session sequence number; insertion order is the sort
    /// key since creation timestamps can collide at millisecond granularity.
    pub seq: i64,
    pub sender_id: String,
    pub sender_role: SenderRole,
    pub body: String,
    /// For customer messages: an admin has read it. For admin messages: the
    /// customer has read it. Each message has exactly one other party.
    pub read: bool,
    pub deleted: bool,
    pub deleted_at: Option<String>,
    pub deleted_by: Option<String>,
    pub created_at: String,
}

/// How a nullable timestamp column should change when a patch is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StampChange {
    /// Leave the stored value untouched.
    #[default]
    Keep,
    /// Stamp with the storage backend's current time.
    SetNow,
    /// Null the column out.
    Clear,
}

/// Patch on a session row, produced by the state machine and applied in the
/// same transaction as the write that triggered it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub status: Option<SessionStatus>,
    pub viewed: Option<bool>,
    pub viewed_at: StampChange,
    pub admin_id: Option<String>,
    pub last_customer_message_at: StampChange,
}

impl SessionUpdate {
    /// True when the patch changes nothing beyond `updated_at`.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.viewed.is_none()
            && self.viewed_at == StampChange::Keep
            && self.admin_id.is_none()
            && self.last_customer_message_at == StampChange::Keep
    }
}

/// One row of the admin triage projection: a session plus the derived
/// counters the list view renders.
#[derive(Debug, Clone, Serialize)]
pub struct TriageRow {
    #[serde(flatten)]
    pub session: ChatSession,
    /// All stored messages, deleted included.
    pub message_count: i64,
    /// Messages with `deleted = false`.
    pub visible_count: i64,
    /// Visible customer messages not yet read by an admin.
    pub unread_count: i64,
    pub last_visible_role: Option<SenderRole>,
    pub last_visible_at: Option<String>,
    pub last_visible_body: Option<String>,
}
