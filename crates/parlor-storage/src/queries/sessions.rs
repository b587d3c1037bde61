// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD and projection queries.

use parlor_core::ChatError;
use parlor_core::types::{SenderRole, SessionUpdate, StampChange};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

use crate::database::{Database, map_tr_err};
use crate::models::{
    ChatMessage, ChatSession, MESSAGE_COLS, SESSION_COLS, TriageRow, parse_enum,
    session_from_row,
};

/// Translates a [`SessionUpdate`] into SET clauses plus their bind values.
///
/// `updated_at` is always stamped. The returned clauses use sequential `?`
/// placeholders, so any trailing WHERE parameters must be appended after the
/// returned values.
pub(crate) fn patch_clauses(update: &SessionUpdate) -> (Vec<&'static str>, Vec<Value>) {
    let mut sets: Vec<&'static str> =
        vec!["updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')"];
    let mut vals: Vec<Value> = Vec::new();

    if let Some(status) = update.status {
        sets.push("status = ?");
        vals.push(Value::from(status.to_string()));
    }
    if let Some(viewed) = update.viewed {
        sets.push("viewed = ?");
        vals.push(Value::from(viewed));
    }
    match update.viewed_at {
        StampChange::SetNow => sets.push("viewed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')"),
        StampChange::Clear => sets.push("viewed_at = NULL"),
        StampChange::Keep => {}
    }
    if let Some(admin_id) = &update.admin_id {
        sets.push("admin_id = ?");
        vals.push(Value::from(admin_id.clone()));
    }
    match update.last_customer_message_at {
        StampChange::SetNow => {
            sets.push("last_customer_message_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')");
        }
        StampChange::Clear => sets.push("last_customer_message_at = NULL"),
        StampChange::Keep => {}
    }

    (sets, vals)
}

/// Insert a new session together with its first message, atomically.
pub async fn create_with_message(
    db: &Database,
    session: &ChatSession,
    message: &ChatMessage,
) -> Result<(), ChatError> {
    let session = session.clone();
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                &format!("INSERT INTO sessions ({SESSION_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                params![
                    session.id,
                    session.customer_id,
                    session.admin_id,
                    session.status.to_string(),
                    session.viewed,
                    session.viewed_at,
                    session.last_customer_message_at,
                    session.created_at,
                    session.updated_at,
                ],
            )?;
            tx.execute(
                &format!("INSERT INTO messages ({MESSAGE_COLS}) VALUES (?1, ?2, 1, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
                params![
                    message.id,
                    session.id,
                    message.sender_id,
                    message.sender_role.to_string(),
                    message.body,
                    message.read,
                    message.deleted,
                    message.deleted_at,
                    message.deleted_by,
                    message.created_at,
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by ID.
pub async fn get(db: &Database, id: &str) -> Result<Option<ChatSession>, ChatError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            use rusqlite::OptionalExtension;
            let mut stmt = conn
                .prepare(&format!("SELECT {SESSION_COLS} FROM sessions WHERE id = ?1"))?;
            let session = stmt.query_row(params![id], session_from_row).optional()?;
            Ok(session)
        })
        .await
        .map_err(map_tr_err)
}

/// Find the customer's non-closed session.
///
/// There should never be more than one; if a race ever produces two, the
/// most recently updated one is returned as canonical.
pub async fn find_active(
    db: &Database,
    customer_id: &str,
) -> Result<Option<ChatSession>, ChatError> {
    find_for_customer(db, customer_id, false).await
}

/// Find the customer's most recent session regardless of status.
pub async fn find_latest(
    db: &Database,
    customer_id: &str,
) -> Result<Option<ChatSession>, ChatError> {
    find_for_customer(db, customer_id, true).await
}

async fn find_for_customer(
    db: &Database,
    customer_id: &str,
    include_closed: bool,
) -> Result<Option<ChatSession>, ChatError> {
    let customer_id = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            use rusqlite::OptionalExtension;
            let sql = if include_closed {
                format!(
                    "SELECT {SESSION_COLS} FROM sessions WHERE customer_id = ?1
                     ORDER BY updated_at DESC LIMIT 1"
                )
            } else {
                format!(
                    "SELECT {SESSION_COLS} FROM sessions
                     WHERE customer_id = ?1 AND status IN ('pending', 'open')
                     ORDER BY updated_at DESC LIMIT 1"
                )
            };
            let mut stmt = conn.prepare(&sql)?;
            let session = stmt
                .query_row(params![customer_id], session_from_row)
                .optional()?;
            Ok(session)
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a session patch on its own (close, restore, viewed flips).
pub async fn apply_update(
    db: &Database,
    session_id: &str,
    update: &SessionUpdate,
) -> Result<(), ChatError> {
    let id = session_id.to_string();
    let update = update.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            let (sets, mut vals) = patch_clauses(&update);
            let sql = format!("UPDATE sessions SET {} WHERE id = ?", sets.join(", "));
            vals.push(Value::from(id));
            let n = conn.execute(&sql, params_from_iter(vals))?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(ChatError::session_not_found(session_id));
    }
    Ok(())
}

/// Projection rows for the admin triage view.
///
/// Returns closed sessions when `closed` is true, otherwise pending/open
/// sessions, each with derived counters computed by correlated subqueries
/// over the session's ledger (O(messages-in-session) per row). Only sessions
/// with at least one stored message qualify; sessions are never created
/// empty, so this guards against nothing but manual tampering.
pub async fn list_triage(db: &Database, closed: bool) -> Result<Vec<TriageRow>, ChatError> {
    db.connection()
        .call(move |conn| {
            let status_filter = if closed {
                "s.status = 'closed'"
            } else {
                "s.status IN ('pending', 'open')"
            };
            let sql = format!(
                "SELECT s.id, s.customer_id, s.admin_id, s.status, s.viewed, s.viewed_at,
                        s.last_customer_message_at, s.created_at, s.updated_at,
                        (SELECT COUNT(*) FROM messages m WHERE m.session_id = s.id),
                        (SELECT COUNT(*) FROM messages m
                          WHERE m.session_id = s.id AND m.deleted = 0),
                        (SELECT COUNT(*) FROM messages m
                          WHERE m.session_id = s.id AND m.deleted = 0
                            AND m.sender_role = 'customer' AND m.read = 0),
                        (SELECT m.sender_role FROM messages m
                          WHERE m.session_id = s.id AND m.deleted = 0
                          ORDER BY m.seq DESC LIMIT 1),
                        (SELECT m.created_at FROM messages m
                          WHERE m.session_id = s.id AND m.deleted = 0
                          ORDER BY m.seq DESC LIMIT 1),
                        (SELECT m.body FROM messages m
                          WHERE m.session_id = s.id AND m.deleted = 0
                          ORDER BY m.seq DESC LIMIT 1)
                 FROM sessions s
                 WHERE {status_filter}
                   AND EXISTS (SELECT 1 FROM messages m WHERE m.session_id = s.id)
                 ORDER BY s.updated_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| {
                let last_role: Option<String> = row.get(12)?;
                Ok(TriageRow {
                    session: session_from_row(row)?,
                    message_count: row.get(9)?,
                    visible_count: row.get(10)?,
                    unread_count: row.get(11)?,
                    last_visible_role: match last_role {
                        Some(raw) => Some(parse_enum::<SenderRole>(12, &raw)?),
                        None => None,
                    },
                    last_visible_at: row.get(13)?,
                    last_visible_body: row.get(14)?,
                })
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)
}

/// Ids of pending sessions eligible for the inactivity reaper.
///
/// A session qualifies when it has no admin message at all and its last
/// customer activity (falling back to the newest message timestamp) is
/// older than `cutoff`.
pub async fn list_stale_pending(db: &Database, cutoff: &str) -> Result<Vec<String>, ChatError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id FROM sessions s
                 WHERE s.status = 'pending'
                   AND NOT EXISTS (SELECT 1 FROM messages m
                                    WHERE m.session_id = s.id AND m.sender_role = 'admin')
                   AND COALESCE(s.last_customer_message_at,
                                (SELECT MAX(m.created_at) FROM messages m
                                  WHERE m.session_id = s.id)) < ?1
                 ORDER BY s.updated_at ASC",
            )?;
            let rows = stmt.query_map(params![cutoff], |row| row.get(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?);
            }
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a session and all of its messages atomically.
pub async fn delete(db: &Database, session_id: &str) -> Result<(), ChatError> {
    let id = session_id.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM messages WHERE session_id = ?1", params![id])?;
            let n = tx.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(ChatError::session_not_found(session_id));
    }
    Ok(())
}
