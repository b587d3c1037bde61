// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure session state machine.
//!
//! Every mutating operation funnels its event through [`transition`] so the
//! status change and the derived flags come from one place. The function
//! returns the patch to apply; it never touches storage itself.

use parlor_core::ChatError;
use parlor_core::types::{SessionStatus, SessionUpdate, StampChange};

/// An event that can change a session's state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The owning customer appended a message.
    CustomerMessage,
    /// An admin appended a message; the sender becomes the owning admin.
    AdminMessage { admin_id: String },
    /// An admin, the customer, or the reaper closes the session.
    Close,
    /// An admin restores a closed session out of the trash. The target state
    /// depends on whether any admin message survives in the ledger; when all
    /// were purged past retention, the session degrades to pending.
    Restore { has_admin_message: bool },
}

/// Computes the patch for `event` against a session in `current` state.
///
/// Events with no defined transition for the current state (replying to or
/// closing a closed session, restoring a live one) are rejected with
/// [`ChatError::Conflict`]. A customer message against a closed session is
/// also a conflict here; the caller handles that case by creating a fresh
/// session instead.
pub fn transition(
    current: SessionStatus,
    event: &SessionEvent,
) -> Result<SessionUpdate, ChatError> {
    match (current, event) {
        (SessionStatus::Pending | SessionStatus::Open, SessionEvent::CustomerMessage) => {
            Ok(SessionUpdate {
                status: Some(current),
                viewed: Some(false),
                viewed_at: StampChange::Keep,
                admin_id: None,
                last_customer_message_at: StampChange::SetNow,
            })
        }
        (SessionStatus::Closed, SessionEvent::CustomerMessage) => Err(ChatError::Conflict(
            "cannot append a customer message to a closed session".to_string(),
        )),

        (
            SessionStatus::Pending | SessionStatus::Open,
            SessionEvent::AdminMessage { admin_id },
        ) => Ok(SessionUpdate {
            status: Some(SessionStatus::Open),
            viewed: Some(true),
            viewed_at: StampChange::SetNow,
            admin_id: Some(admin_id.clone()),
            last_customer_message_at: StampChange::Keep,
        }),
        (SessionStatus::Closed, SessionEvent::AdminMessage { .. }) => Err(ChatError::Conflict(
            "cannot reply to a closed session".to_string(),
        )),

        (SessionStatus::Pending | SessionStatus::Open, SessionEvent::Close) => {
            Ok(SessionUpdate {
                status: Some(SessionStatus::Closed),
                ..SessionUpdate::default()
            })
        }
        (SessionStatus::Closed, SessionEvent::Close) => Err(ChatError::Conflict(
            "session is already closed".to_string(),
        )),

        (SessionStatus::Closed, SessionEvent::Restore { has_admin_message }) => {
            let status = if *has_admin_message {
                SessionStatus::Open
            } else {
                SessionStatus::Pending
            };
            Ok(SessionUpdate {
                status: Some(status),
                ..SessionUpdate::default()
            })
        }
        (SessionStatus::Pending | SessionStatus::Open, SessionEvent::Restore { .. }) => {
            Err(ChatError::Conflict("session is not closed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_message_keeps_pending_and_flags_unviewed() {
        let update = transition(SessionStatus::Pending, &SessionEvent::CustomerMessage).unwrap();
        assert_eq!(update.status, Some(SessionStatus::Pending));
        assert_eq!(update.viewed, Some(false));
        assert_eq!(update.last_customer_message_at, StampChange::SetNow);
        assert!(update.admin_id.is_none());
    }

    #[test]
    fn customer_message_keeps_open_session_open() {
        let update = transition(SessionStatus::Open, &SessionEvent::CustomerMessage).unwrap();
        assert_eq!(update.status, Some(SessionStatus::Open));
        assert_eq!(update.viewed, Some(false));
    }

    #[test]
    fn admin_message_opens_session_and_claims_it() {
        for current in [SessionStatus::Pending, SessionStatus::Open] {
            let update = transition(
                current,
                &SessionEvent::AdminMessage {
                    admin_id: "admin-1".to_string(),
                },
            )
            .unwrap();
            assert_eq!(update.status, Some(SessionStatus::Open));
            assert_eq!(update.viewed, Some(true));
            assert_eq!(update.viewed_at, StampChange::SetNow);
            assert_eq!(update.admin_id.as_deref(), Some("admin-1"));
            assert_eq!(update.last_customer_message_at, StampChange::Keep);
        }
    }

    #[test]
    fn close_is_defined_for_live_sessions_only() {
        for current in [SessionStatus::Pending, SessionStatus::Open] {
            let update = transition(current, &SessionEvent::Close).unwrap();
            assert_eq!(update.status, Some(SessionStatus::Closed));
            // Close changes nothing but the status.
            assert!(update.viewed.is_none());
            assert_eq!(update.viewed_at, StampChange::Keep);
        }

        let err = transition(SessionStatus::Closed, &SessionEvent::Close).unwrap_err();
        assert!(matches!(err, ChatError::Conflict(_)));
    }

    #[test]
    fn restore_targets_open_when_an_admin_message_survives() {
        let update = transition(
            SessionStatus::Closed,
            &SessionEvent::Restore {
                has_admin_message: true,
            },
        )
        .unwrap();
        assert_eq!(update.status, Some(SessionStatus::Open));
    }

    #[test]
    fn restore_degrades_to_pending_without_admin_messages() {
        let update = transition(
            SessionStatus::Closed,
            &SessionEvent::Restore {
                has_admin_message: false,
            },
        )
        .unwrap();
        assert_eq!(update.status, Some(SessionStatus::Pending));
    }

    #[test]
    fn undefined_transitions_conflict() {
        assert!(matches!(
            transition(SessionStatus::Closed, &SessionEvent::CustomerMessage),
            Err(ChatError::Conflict(_))
        ));
        assert!(matches!(
            transition(
                SessionStatus::Closed,
                &SessionEvent::AdminMessage {
                    admin_id: "a".to_string()
                }
            ),
            Err(ChatError::Conflict(_))
        ));
        assert!(matches!(
            transition(
                SessionStatus::Open,
                &SessionEvent::Restore {
                    has_admin_message: true
                }
            ),
            Err(ChatError::Conflict(_))
        ));
    }
}
