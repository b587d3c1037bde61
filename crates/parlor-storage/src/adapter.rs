// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ChatStorage trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use parlor_config::model::StorageConfig;
use parlor_core::types::{ChatMessage, ChatSession, SenderRole, SessionUpdate, TriageRow};
use parlor_core::{ChatError, ChatStorage};

use crate::database::Database;
use crate::queries;

/// SQLite-backed session store and message ledger.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`ChatStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ChatError> {
        self.db.get().ok_or_else(|| ChatError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl ChatStorage for SqliteStorage {
    async fn initialize(&self) -> Result<(), ChatError> {
        let db =
            Database::open_with_options(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ChatError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ChatError> {
        self.db()?.close().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn create_session_with_message(
        &self,
        session: &ChatSession,
        message: &ChatMessage,
    ) -> Result<(), ChatError> {
        queries::sessions::create_with_message(self.db()?, session, message).await
    }

    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>, ChatError> {
        queries::sessions::get(self.db()?, id).await
    }

    async fn find_active_session(
        &self,
        customer_id: &str,
    ) -> Result<Option<ChatSession>, ChatError> {
        queries::sessions::find_active(self.db()?, customer_id).await
    }

    async fn find_latest_session(
        &self,
        customer_id: &str,
    ) -> Result<Option<ChatSession>, ChatError> {
        queries::sessions::find_latest(self.db()?, customer_id).await
    }

    async fn append_message(
        &self,
        message: &ChatMessage,
        update: &SessionUpdate,
    ) -> Result<i64, ChatError> {
        queries::messages::append_with_update(self.db()?, message, update).await
    }

    async fn apply_session_update(
        &self,
        session_id: &str,
        update: &SessionUpdate,
    ) -> Result<(), ChatError> {
        queries::sessions::apply_update(self.db()?, session_id, update).await
    }

    async fn list_visible_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        queries::messages::list_visible(self.db()?, session_id).await
    }

    async fn list_deleted_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        queries::messages::list_deleted(self.db()?, session_id).await
    }

    async fn soft_delete_message(
        &self,
        session_id: &str,
        message_id: &str,
        deleted_by: &str,
    ) -> Result<(), ChatError> {
        queries::messages::soft_delete(self.db()?, session_id, message_id, deleted_by).await
    }

    async fn restore_message(
        &self,
        session_id: &str,
        message_id: &str,
    ) -> Result<(), ChatError> {
        queries::messages::restore(self.db()?, session_id, message_id).await
    }

    async fn mark_messages_read(
        &self,
        session_id: &str,
        sender_role: SenderRole,
        message_ids: Option<&[String]>,
        update: &SessionUpdate,
    ) -> Result<u64, ChatError> {
        queries::messages::mark_read(self.db()?, session_id, sender_role, message_ids, update)
            .await
    }

    async fn has_admin_message(&self, session_id: &str) -> Result<bool, ChatError> {
        queries::messages::has_admin_message(self.db()?, session_id).await
    }

    async fn list_triage(&self, closed: bool) -> Result<Vec<TriageRow>, ChatError> {
        queries::sessions::list_triage(self.db()?, closed).await
    }

    async fn list_stale_pending(&self, cutoff: &str) -> Result<Vec<String>, ChatError> {
        queries::sessions::list_stale_pending(self.db()?, cutoff).await
    }

    async fn purge_deleted_before(&self, cutoff: &str) -> Result<u64, ChatError> {
        queries::messages::purge_deleted_before(self.db()?, cutoff).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ChatError> {
        queries::sessions::delete(self.db()?, session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_core::types::SessionStatus;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    fn make_session(id: &str) -> ChatSession {
        ChatSession {
            id: id.to_string(),
            customer_id: "cust-1".to_string(),
            admin_id: None,
            status: SessionStatus::Pending,
            viewed: false,
            viewed_at: None,
            last_customer_message_at: Some("2026-01-01T00:00:00.000Z".to_string()),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn make_msg(id: &str, session_id: &str, role: SenderRole) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            session_id: session_id.to_string(),
            seq: 0,
            sender_id: "u1".to_string(),
            sender_role: role,
            body: "hello there".to_string(),
            read: false,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
            created_at: "2026-01-01T00:00:01.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        let result = storage.initialize().await;
        assert!(result.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        let result = storage.get_session("s1").await;
        assert!(result.is_err(), "queries should fail before initialize");
    }

    #[tokio::test]
    async fn full_session_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        // Create the session with its first message.
        let session = make_session("s1");
        let first = make_msg("m1", "s1", SenderRole::Customer);
        storage
            .create_session_with_message(&session, &first)
            .await
            .unwrap();

        // The customer now has an active session.
        let active = storage.find_active_session("cust-1").await.unwrap();
        assert_eq!(active.unwrap().id, "s1");

        // Admin reply flips the session open.
        let reply = make_msg("m2", "s1", SenderRole::Admin);
        let update = SessionUpdate {
            status: Some(SessionStatus::Open),
            viewed: Some(true),
            viewed_at: parlor_core::StampChange::SetNow,
            admin_id: Some("admin-1".to_string()),
            last_customer_message_at: parlor_core::StampChange::Keep,
        };
        let seq = storage.append_message(&reply, &update).await.unwrap();
        assert_eq!(seq, 2);

        let session = storage.get_session("s1").await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Open);
        assert_eq!(session.admin_id.as_deref(), Some("admin-1"));
        assert!(storage.has_admin_message("s1").await.unwrap());

        // Soft delete, then restore.
        storage
            .soft_delete_message("s1", "m2", "admin-1")
            .await
            .unwrap();
        assert_eq!(storage.list_visible_messages("s1").await.unwrap().len(), 1);
        assert_eq!(storage.list_deleted_messages("s1").await.unwrap().len(), 1);
        storage.restore_message("s1", "m2").await.unwrap();
        assert_eq!(storage.list_visible_messages("s1").await.unwrap().len(), 2);

        // Close, then delete outright.
        storage
            .apply_session_update(
                "s1",
                &SessionUpdate {
                    status: Some(SessionStatus::Closed),
                    ..SessionUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(storage.list_triage(true).await.unwrap().len(), 1);

        storage.delete_session("s1").await.unwrap();
        assert!(storage.get_session("s1").await.unwrap().is_none());

        storage.close().await.unwrap();
    }
}
