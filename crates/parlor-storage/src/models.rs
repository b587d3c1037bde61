// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite and the domain types.
//!
//! The canonical types are defined in `parlor-core::types` for use across
//! crate boundaries. This module re-exports them and provides the row
//! mappers shared by the query modules.

pub use parlor_core::types::{ChatMessage, ChatSession, SenderRole, SessionStatus, TriageRow};

/// Column list matching [`session_from_row`].
pub(crate) const SESSION_COLS: &str =
    "id, customer_id, admin_id, status, viewed, viewed_at, last_customer_message_at, \
     created_at, updated_at";

/// Column list matching [`message_from_row`].
pub(crate) const MESSAGE_COLS: &str =
    "id, session_id, seq, sender_id, sender_role, body, read, deleted, deleted_at, \
     deleted_by, created_at";

pub(crate) fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatSession> {
    Ok(ChatSession {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        admin_id: row.get(2)?,
        status: parse_enum(3, &row.get::<_, String>(3)?)?,
        viewed: row.get(4)?,
        viewed_at: row.get(5)?,
        last_customer_message_at: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub(crate) fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.get(0)?,
        session_id: row.get(1)?,
        seq: row.get(2)?,
        sender_id: row.get(3)?,
        sender_role: parse_enum(4, &row.get::<_, String>(4)?)?,
        body: row.get(5)?,
        read: row.get(6)?,
        deleted: row.get(7)?,
        deleted_at: row.get(8)?,
        deleted_by: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Parses a strum-backed enum column, converting parse failures into the
/// rusqlite conversion error so they surface as storage errors.
pub(crate) fn parse_enum<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = strum::ParseError>,
{
    raw.parse().map_err(|e: strum::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
