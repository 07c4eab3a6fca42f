// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ChatStore trait.

use async_trait::async_trait;

use amora_core::{
    AmoraError, ChatMessage, ChatStore, ConnectionId, Group, UserProfile, Username,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed chat store.
///
/// Wraps a [`Database`] handle and delegates all operations to the typed
/// query modules. Cloneable; all clones share the single writer thread.
#[derive(Clone)]
pub struct SqliteChatStore {
    db: Database,
}

impl SqliteChatStore {
    /// Open (or create) the store at `path` and run migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, AmoraError> {
        let db = Database::open(path, wal_mode).await?;
        Ok(Self { db })
    }

    /// Checkpoint and release. Called on graceful shutdown.
    pub async fn close(&self) -> Result<(), AmoraError> {
        self.db.close().await
    }
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn get_user(&self, username: &Username) -> Result<Option<UserProfile>, AmoraError> {
        queries::users::get_user(&self.db, username).await
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), AmoraError> {
        queries::users::upsert_user(&self.db, profile).await
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<(), AmoraError> {
        queries::messages::insert_message(&self.db, message).await
    }

    async fn message_thread(
        &self,
        a: &Username,
        b: &Username,
    ) -> Result<Vec<ChatMessage>, AmoraError> {
        queries::messages::message_thread(&self.db, a, b).await
    }

    async fn mark_thread_read(
        &self,
        reader: &Username,
        counterpart: &Username,
    ) -> Result<u64, AmoraError> {
        queries::messages::mark_thread_read(&self.db, reader, counterpart).await
    }

    async fn save_group(&self, group: &Group) -> Result<(), AmoraError> {
        queries::groups::save_group(&self.db, group).await
    }

    async fn load_group(&self, name: &str) -> Result<Option<Group>, AmoraError> {
        queries::groups::load_group(&self.db, name).await
    }

    async fn group_for_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<Group>, AmoraError> {
        queries::groups::group_for_connection(&self.db, connection_id).await
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) -> Result<(), AmoraError> {
        queries::groups::remove_connection(&self.db, connection_id).await
    }
}
