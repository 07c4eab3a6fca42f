// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence collaborator trait.

use async_trait::async_trait;

use crate::error::AmoraError;
use crate::types::{ChatMessage, ConnectionId, Group, UserProfile, Username};

/// The persistence contract consumed by the realtime subsystem.
///
/// Implementations must be all-or-nothing per call: a returned error means
/// nothing was applied. Group membership written through `save_group` is
/// durable metadata and must be removable per connection on disconnect.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Look up a user profile by normalized username.
    async fn get_user(&self, username: &Username) -> Result<Option<UserProfile>, AmoraError>;

    /// Insert or update a user profile.
    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), AmoraError>;

    /// Persist a message.
    async fn save_message(&self, message: &ChatMessage) -> Result<(), AmoraError>;

    /// The full thread between two users, oldest first.
    async fn message_thread(
        &self,
        a: &Username,
        b: &Username,
    ) -> Result<Vec<ChatMessage>, AmoraError>;

    /// Mark every unread message sent by `counterpart` to `reader` as read,
    /// in a single batched write. Returns the number of messages marked.
    async fn mark_thread_read(
        &self,
        reader: &Username,
        counterpart: &Username,
    ) -> Result<u64, AmoraError>;

    /// Persist a group and its current connection membership.
    async fn save_group(&self, group: &Group) -> Result<(), AmoraError>;

    /// Load a group by name, including its connections.
    async fn load_group(&self, name: &str) -> Result<Option<Group>, AmoraError>;

    /// Find the group that owns a connection, if any.
    async fn group_for_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<Group>, AmoraError>;

    /// Remove a single connection from whatever group holds it. Removing an
    /// untracked connection is a no-op.
    async fn remove_connection(&self, connection_id: &ConnectionId) -> Result<(), AmoraError>;
}
