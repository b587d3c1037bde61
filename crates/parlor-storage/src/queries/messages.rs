// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message ledger operations: append, soft delete, restore, purge, reads.

use parlor_core::ChatError;
use parlor_core::types::{SenderRole, SessionUpdate};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

use crate::database::{Database, map_tr_err};
use crate::models::{ChatMessage, MESSAGE_COLS, message_from_row};
use crate::queries::sessions::patch_clauses;

/// Append a message to the session's ledger and apply the session patch in
/// the same transaction. The sequence number is assigned here, so existing
/// messages are never reordered. Returns the assigned sequence number.
pub async fn append_with_update(
    db: &Database,
    message: &ChatMessage,
    update: &SessionUpdate,
) -> Result<i64, ChatError> {
    let message = message.clone();
    let update = update.clone();
    let session_id = message.session_id.clone();

    let seq = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let (sets, mut vals) = patch_clauses(&update);
            let sql = format!("UPDATE sessions SET {} WHERE id = ?", sets.join(", "));
            vals.push(Value::from(message.session_id.clone()));
            let n = tx.execute(&sql, params_from_iter(vals))?;
            if n == 0 {
                return Ok(None);
            }

            let seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE session_id = ?1",
                params![message.session_id],
                |row| row.get(0),
            )?;
            tx.execute(
                &format!(
                    "INSERT INTO messages ({MESSAGE_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    message.id,
                    message.session_id,
                    seq,
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
            Ok(Some(seq))
        })
        .await
        .map_err(map_tr_err)?;

    seq.ok_or_else(|| ChatError::session_not_found(session_id))
}

/// Messages with `deleted = false`, in chronological (sequence) order.
pub async fn list_visible(db: &Database, session_id: &str) -> Result<Vec<ChatMessage>, ChatError> {
    list_by_deleted(db, session_id, false).await
}

/// Messages with `deleted = true`, in chronological (sequence) order.
pub async fn list_deleted(db: &Database, session_id: &str) -> Result<Vec<ChatMessage>, ChatError> {
    list_by_deleted(db, session_id, true).await
}

async fn list_by_deleted(
    db: &Database,
    session_id: &str,
    deleted: bool,
) -> Result<Vec<ChatMessage>, ChatError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLS} FROM messages
                 WHERE session_id = ?1 AND deleted = ?2
                 ORDER BY seq ASC"
            ))?;
            let rows = stmt.query_map(params![session_id, deleted], message_from_row)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a message deleted and stamp the audit fields.
///
/// Re-deleting an already-deleted message overwrites `deleted_at` and
/// `deleted_by` rather than failing; restore-until-purged addressing is
/// unaffected either way.
pub async fn soft_delete(
    db: &Database,
    session_id: &str,
    message_id: &str,
    deleted_by: &str,
) -> Result<(), ChatError> {
    let sid = session_id.to_string();
    let mid = message_id.to_string();
    let by = deleted_by.to_string();

    let changed = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "UPDATE messages
                 SET deleted = 1,
                     deleted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     deleted_by = ?3
                 WHERE session_id = ?1 AND id = ?2",
                params![sid, mid, by],
            )?;
            if n > 0 {
                tx.execute(
                    "UPDATE sessions
                     SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                    params![sid],
                )?;
            }
            tx.commit()?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(ChatError::message_not_found(message_id));
    }
    Ok(())
}

/// Clear the deleted flag and its audit fields.
pub async fn restore(db: &Database, session_id: &str, message_id: &str) -> Result<(), ChatError> {
    let sid = session_id.to_string();
    let mid = message_id.to_string();

    let changed = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "UPDATE messages
                 SET deleted = 0, deleted_at = NULL, deleted_by = NULL
                 WHERE session_id = ?1 AND id = ?2",
                params![sid, mid],
            )?;
            if n > 0 {
                tx.execute(
                    "UPDATE sessions
                     SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                    params![sid],
                )?;
            }
            tx.commit()?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(ChatError::message_not_found(message_id));
    }
    Ok(())
}

/// Set `read = true` on unread messages authored by `sender_role`,
/// optionally limited to an explicit id set, applying the session patch in
/// the same transaction. Returns the number of flipped rows.
pub async fn mark_read(
    db: &Database,
    session_id: &str,
    sender_role: SenderRole,
    message_ids: Option<&[String]>,
    update: &SessionUpdate,
) -> Result<u64, ChatError> {
    let sid = session_id.to_string();
    let role = sender_role.to_string();
    let ids = message_ids.map(<[String]>::to_vec);
    let update = update.clone();

    let count = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let (sets, mut vals) = patch_clauses(&update);
            let sql = format!("UPDATE sessions SET {} WHERE id = ?", sets.join(", "));
            vals.push(Value::from(sid.clone()));
            let n = tx.execute(&sql, params_from_iter(vals))?;
            if n == 0 {
                return Ok(None);
            }

            let flipped = match ids {
                Some(ids) => {
                    let placeholders =
                        ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
                    let sql = format!(
                        "UPDATE messages SET read = 1
                         WHERE session_id = ? AND sender_role = ? AND read = 0
                           AND id IN ({placeholders})"
                    );
                    let mut vals = vec![Value::from(sid.clone()), Value::from(role.clone())];
                    vals.extend(ids.into_iter().map(Value::from));
                    tx.execute(&sql, params_from_iter(vals))?
                }
                None => tx.execute(
                    "UPDATE messages SET read = 1
                     WHERE session_id = ?1 AND sender_role = ?2 AND read = 0",
                    params![sid, role],
                )?,
            };
            tx.commit()?;
            Ok(Some(flipped as u64))
        })
        .await
        .map_err(map_tr_err)?;

    count.ok_or_else(|| ChatError::session_not_found(session_id))
}

/// Whether the session's ledger contains any admin message, deleted or not.
pub async fn has_admin_message(db: &Database, session_id: &str) -> Result<bool, ChatError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM messages
                  WHERE session_id = ?1 AND sender_role = 'admin')",
                params![session_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
        .map_err(map_tr_err)
}

/// Permanently remove messages soft-deleted before `cutoff`.
///
/// A plain conditional DELETE: running it again with no new deletions in
/// between removes nothing.
pub async fn purge_deleted_before(db: &Database, cutoff: &str) -> Result<u64, ChatError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "DELETE FROM messages
                 WHERE deleted = 1 AND deleted_at IS NOT NULL AND deleted_at < ?1",
                params![cutoff],
            )?;
            Ok(n as u64)
        })
        .await
        .map_err(map_tr_err)
}
